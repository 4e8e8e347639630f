//! Filepath: src/infra/utils.rs
//! Utility helpers organized by small, focused structs.
//! All functions are associated fns to keep call sites
//! ergonomic, testable, and discoverable.

// Tree-sitter types for node helpers
use tree_sitter::Node;

/// Qualified-name helpers
pub struct NameUtils;

impl NameUtils
{
    /// Join name parts with the given separator into a String
    pub fn join(
        parts: &[&str],
        sep: char,
    ) -> String
    {
        // Pre-allocate with a simple heuristic
        let mut out = String::with_capacity(
            parts
                .iter()
                .map(|p| p.len() + 1)
                .sum(),
        );

        // Push non-empty parts with separator
        for p in parts
            .iter()
            .filter(|p| !p.is_empty())
        {
            if !out.is_empty()
            {
                out.push(sep);
            }

            out.push_str(p);
        }

        // Return the constructed string
        out
    }

    /// Last `.`-separated segment of a dotted name
    pub fn last_segment(name: &str) -> &str
    {
        name.rsplit('.')
            .next()
            .unwrap_or(name)
    }

    /// Collapse runs of whitespace into single spaces and
    /// drop whitespace around `<`, `>`, `,`, `[`, `]`, `.`
    pub fn collapse_ws(text: &str) -> String
    {
        let mut out = String::with_capacity(text.len());
        let mut pending_space = false;

        for ch in text.chars()
        {
            if ch.is_whitespace()
            {
                pending_space = true;
                continue;
            }

            // Emit a single space only between two word characters
            if pending_space
                && let Some(prev) = out.chars().last()
                && (prev.is_alphanumeric() || prev == '_' || prev == '?')
                && (ch.is_alphanumeric() || ch == '_' || ch == '@')
            {
                out.push(' ');
            }

            // Keep ", " readable inside type arguments
            if ch == ',' && !out.is_empty()
            {
                out.push_str(", ");
                pending_space = false;
                continue;
            }

            pending_space = false;
            out.push(ch);
        }

        out
    }

    /// Remove every `<...>` type-argument section, honoring nesting
    pub fn strip_type_arguments(text: &str) -> String
    {
        let mut out = String::with_capacity(text.len());
        let mut depth = 0usize;

        for ch in text.chars()
        {
            match ch
            {
                '<' => depth += 1,
                '>' => depth = depth.saturating_sub(1),
                _ if depth == 0 && !ch.is_whitespace() => out.push(ch),
                _ =>
                {}
            }
        }

        out
    }
}

/// Common Tree-sitter node helpers
pub struct TsNodeUtils;

impl TsNodeUtils
{
    /// Collect the named children of `node` in source order
    pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>>
    {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .collect()
    }

    /// First named child whose kind is one of `kinds`
    pub fn first_named_of<'t>(
        node: Node<'t>,
        kinds: &[&str],
    ) -> Option<Node<'t>>
    {
        Self::named_children(node)
            .into_iter()
            .find(|c| kinds.contains(&c.kind()))
    }

    /// Extract text of a child field if present
    pub fn field_text<'a>(
        node: Node,
        field: &str,
        bytes: &'a [u8],
    ) -> Option<&'a str>
    {
        // Locate the child by field name
        let child = node.child_by_field_name(field)?;

        // Convert to utf8 text
        child
            .utf8_text(bytes)
            .ok()
    }

    /// Node text, or the empty string on invalid UTF-8
    pub fn text<'a>(
        node: Node,
        bytes: &'a [u8],
    ) -> &'a str
    {
        node.utf8_text(bytes)
            .unwrap_or("")
    }

    /// Next named sibling that is not a comment
    pub fn next_significant_sibling<'t>(node: Node<'t>) -> Option<Node<'t>>
    {
        let mut cur = node.next_named_sibling();
        while let Some(n) = cur
        {
            if !matches!(n.kind(), "line_comment" | "block_comment")
            {
                return Some(n);
            }
            cur = n.next_named_sibling();
        }
        None
    }

    /// True when `pred` holds for `node` or any descendant
    pub fn any_in_subtree(
        node: Node,
        pred: &mut dyn FnMut(Node) -> bool,
    ) -> bool
    {
        if pred(node)
        {
            return true;
        }

        for c in Self::named_children(node)
        {
            if Self::any_in_subtree(c, &mut *pred)
            {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn join_skips_empty_parts()
    {
        assert_eq!(NameUtils::join(&["", "Outer", "Inner"], '$'), "Outer$Inner");
        assert_eq!(NameUtils::join(&["com.x", "A"], '.'), "com.x.A");
    }

    #[test]
    fn last_segment_of_dotted_name()
    {
        assert_eq!(NameUtils::last_segment("java.lang.String"), "String");
        assert_eq!(NameUtils::last_segment("String"), "String");
    }

    #[test]
    fn collapse_ws_normalizes_type_text()
    {
        assert_eq!(NameUtils::collapse_ws("Map< String ,\n  List<Integer> >"), "Map<String, List<Integer>>");
        assert_eq!(NameUtils::collapse_ws("final  int"), "final int");
    }

    #[test]
    fn strip_type_arguments_handles_nesting()
    {
        assert_eq!(NameUtils::strip_type_arguments("Map<String, List<Integer>>"), "Map");
        assert_eq!(NameUtils::strip_type_arguments("Outer<T>.Inner<U>"), "Outer.Inner");
    }
}
