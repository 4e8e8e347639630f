//! Filepath: src/core/matcher.rs
//! Long-name matching: locate the declaration a JVM-style long name
//! such as `com.x.Outer$1.run(I[Ljava/lang/String;)V` refers to.
//!
//! The search is one top-down walk over the `Item` tree. The unmatched
//! suffix travels down as a `Cursor` (copied per call), and each nesting
//! level keeps its own anonymous-class ordinal on the stack of the
//! recursive call that owns it.

use tracing::{debug, warn};

use crate::core::descriptor::{DescriptorError, ParameterType, parse_parameters};
use crate::parsers::java_parser::{DeclId, DeclKind, FormalParam, Item, SourceTree};

/// Reasons a long name yields no declaration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError
{
    /// The long name does not start with the file's package
    #[error("long name '{long_name}' does not belong to package '{package}'")]
    PackageMismatch
    {
        long_name: String,
        package: String,
    },

    /// Nothing in the file matches
    #[error("no declaration matches '{0}'")]
    NameNotFound(String),

    /// The parameter descriptor could not be decoded
    #[error(transparent)]
    MalformedDescriptor(#[from] DescriptorError),
}

/// A successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch
{
    /// Outermost enclosing declaration of whatever matched
    pub decl: DeclId,

    /// Source-level signature of `decl`, e.g. `run(int, String[])`
    pub signature: String,
}

/// Matches long names against one parsed file
pub struct NameMatcher<'t>
{
    tree: &'t SourceTree,
}

/// Remaining suffix plus whether the walk passed a type it could not consume
#[derive(Clone, Copy)]
struct Cursor<'a>
{
    rest: &'a str,
    weak: bool,
}

/// Accumulated candidates for one search
struct Search<'t>
{
    tree: &'t SourceTree,
    parsed: Option<Vec<ParameterType>>,
    found: Vec<(DeclId, bool)>,
}

impl<'t> NameMatcher<'t>
{
    pub fn new(tree: &'t SourceTree) -> Self
    {
        Self { tree }
    }

    /// Find the declaration named by `long_name`.
    ///
    /// First match in traversal order wins. A match reached only by
    /// walking through a type the name did not mention ranks below any
    /// match reached along the named path.
    pub fn find(
        &self,
        long_name: &str,
    ) -> Result<NameMatch, MatchError>
    {
        let rest = self.strip_package(long_name)?;

        // Decode the descriptor once; every candidate compares against it
        let parsed = match descriptor_of(long_name)
        {
            Some(desc) => Some(parse_parameters(desc)?),
            None => None,
        };

        let mut search = Search { tree: self.tree, parsed, found: Vec::new() };
        let mut ordinal = 1;
        search.visit_items(self.tree.items(), Cursor { rest: &rest, weak: false }, &mut ordinal);

        let chosen = search
            .found
            .iter()
            .find(|(_, weak)| !weak)
            .or_else(|| {
                search
                    .found
                    .first()
            })
            .map(|(id, _)| *id)
            .ok_or_else(|| MatchError::NameNotFound(long_name.to_string()))?;

        // Report every other declaration that also matched
        for (other, _) in &search.found
        {
            if *other != chosen
            {
                warn!(
                    long_name,
                    kept = %self.tree.decl(chosen).signature(),
                    ignored = %self.tree.decl(*other).signature(),
                    "ambiguous long name; keeping first match"
                );
            }
        }

        let signature = self
            .tree
            .decl(chosen)
            .signature();
        debug!(long_name, %signature, "matched long name");

        Ok(NameMatch { decl: chosen, signature })
    }

    /// Suffix after the package, always starting at a `.` boundary
    fn strip_package(
        &self,
        long_name: &str,
    ) -> Result<String, MatchError>
    {
        let package = self
            .tree
            .package();
        if package.is_empty()
        {
            return Ok(format!(".{long_name}"));
        }

        match long_name.strip_prefix(package)
        {
            Some(rest) if rest.starts_with('.') => Ok(rest.to_string()),
            _ => Err(MatchError::PackageMismatch {
                long_name: long_name.to_string(),
                package: package.to_string(),
            }),
        }
    }
}

impl Search<'_>
{
    fn visit_items(
        &mut self,
        items: &[Item],
        cur: Cursor<'_>,
        ordinal: &mut u32,
    )
    {
        for item in items
        {
            match item
            {
                Item::Type { name, nested, members, .. } =>
                {
                    // Named types restart anonymous numbering
                    let mut fresh = 1;
                    match consume_type(cur.rest, name, *nested)
                    {
                        Some(rest) => self.visit_items(members, Cursor { rest, ..cur }, &mut fresh),
                        None => self.visit_items(members, Cursor { weak: true, ..cur }, &mut fresh),
                    }
                }
                Item::Anonymous { members, .. } =>
                {
                    if let Some(rest) = consume_ordinal(cur.rest, *ordinal)
                    {
                        let mut fresh = 1;
                        self.visit_items(members, Cursor { rest, ..cur }, &mut fresh);
                    }

                    // Siblings count in encounter order, matched or not
                    *ordinal += 1;
                }
                Item::Callable { decl, inner } =>
                {
                    self.try_callable(*decl, cur);
                    self.visit_items(inner, cur, ordinal);
                }
                Item::EnumConstant { decl, inner } =>
                {
                    let constant = self
                        .tree
                        .decl(*decl);
                    if cur
                        .rest
                        .strip_prefix('.')
                        == Some(constant.name.as_str())
                    {
                        self.record(*decl, cur.weak);
                    }
                    self.visit_items(inner, cur, ordinal);
                }
            }
        }
    }

    fn try_callable(
        &mut self,
        id: DeclId,
        cur: Cursor<'_>,
    )
    {
        let decl = self
            .tree
            .decl(id);
        let wanted = match decl.kind
        {
            DeclKind::Method => decl
                .name
                .as_str(),
            DeclKind::Constructor => "<init>",
            DeclKind::EnumConstant => return,
        };

        // `.name(<params>)<return?>`
        let Some(after_open) = cur
            .rest
            .strip_prefix('.')
            .and_then(|r| r.strip_prefix(wanted))
            .and_then(|r| r.strip_prefix('('))
        else
        {
            return;
        };
        let Some((_, ret)) = after_open.split_once(')')
        else
        {
            return;
        };
        if !ret.is_empty() && !is_single_type(ret)
        {
            return;
        }

        let Some(parsed) = &self.parsed
        else
        {
            return;
        };
        if params_match(&decl.params, parsed)
        {
            self.record(id, cur.weak);
        }
    }

    fn record(
        &mut self,
        id: DeclId,
        weak: bool,
    )
    {
        // Matches inside lambdas, local or anonymous classes belong to the member around them
        let root = self
            .tree
            .outermost(id);
        if !self
            .found
            .iter()
            .any(|(d, _)| *d == root)
        {
            self.found
                .push((root, weak));
        }
    }
}

/// Text between the first `(` and the following `)`
fn descriptor_of(long_name: &str) -> Option<&str>
{
    let open = long_name.find('(')?;
    let close = long_name[open..].find(')')? + open;
    Some(&long_name[open + 1..close])
}

/// A return descriptor is exactly one type unit
fn is_single_type(ret: &str) -> bool
{
    parse_parameters(ret)
        .map(|v| v.len() == 1)
        .unwrap_or(false)
}

/// Consume `.Name` (or `$Name` for nested types) at a segment boundary
fn consume_type<'a>(
    rest: &'a str,
    name: &str,
    nested: bool,
) -> Option<&'a str>
{
    let dotted = rest
        .strip_prefix('.')
        .and_then(|r| r.strip_prefix(name));
    let dollar = || {
        if nested
        {
            rest.strip_prefix('$')
                .and_then(|r| r.strip_prefix(name))
        }
        else
        {
            None
        }
    };

    let tail = dotted
        .filter(|t| at_boundary(t))
        .or_else(|| dollar().filter(|t| at_boundary(t)))?;
    Some(tail)
}

fn at_boundary(tail: &str) -> bool
{
    matches!(
        tail.chars()
            .next(),
        None | Some('.') | Some('$')
    )
}

/// Consume `$N` when no further digit follows
fn consume_ordinal(
    rest: &str,
    ordinal: u32,
) -> Option<&str>
{
    let tail = rest
        .strip_prefix('$')?
        .strip_prefix(
            ordinal
                .to_string()
                .as_str(),
        )?;

    if tail.starts_with(|c: char| c.is_ascii_digit())
    {
        return None;
    }

    Some(tail)
}

/// Compare formal parameters against decoded descriptor types, position by position
pub fn params_match(
    formals: &[FormalParam],
    parsed: &[ParameterType],
) -> bool
{
    // Overloads differing only in arity must not shadow each other
    if parsed.len() != formals.len()
    {
        return false;
    }

    formals
        .iter()
        .zip(parsed)
        .all(|(f, p)| param_matches(f, p))
}

fn param_matches(
    formal: &FormalParam,
    parsed: &ParameterType,
) -> bool
{
    // Type variables compare by their bound (Object when unbounded)
    let names_ok = match &formal.type_var_bound
    {
        Some(bound) => names_equal(bound, &parsed.base_name),
        None => names_equal(&formal.type_name, &parsed.base_name),
    };
    if !names_ok
    {
        return false;
    }

    // Varargs count as exactly one dimension
    let dims = if formal.varargs { 1 } else { formal.dims };
    if parsed.is_array() != (dims > 0)
    {
        return false;
    }

    !parsed.is_array() || parsed.array_depth == dims
}

/// Exact match, or one name is a dotted suffix of the other
fn names_equal(
    formal: &str,
    parsed: &str,
) -> bool
{
    if formal == parsed
    {
        return true;
    }

    let dotted_suffix = |long: &str, short: &str| {
        long.len() > short.len()
            && long.ends_with(short)
            && long.as_bytes()[long.len() - short.len() - 1] == b'.'
    };

    dotted_suffix(parsed, formal) || dotted_suffix(formal, parsed)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::parsers::java_parser::JavaSourceParser;

    fn parse(src: &str) -> SourceTree
    {
        JavaSourceParser::new()
            .parse(src)
            .unwrap()
    }

    const ANONYMOUS: &str = r#"
        package p;
        class A {
            Runnable r1 = new Runnable() { public void run() {} };
            Runnable r2 = new Runnable() {
                public void run() {
                    Runnable inner = new Runnable() { public void run() { } };
                }
            };
            Runnable r3 = new Runnable() { public void run() {} };
        }
    "#;

    #[test]
    fn matching_is_deterministic()
    {
        let tree = parse(ANONYMOUS);
        let matcher = NameMatcher::new(&tree);

        let a = matcher
            .find("p.A$3.run()V")
            .unwrap();
        let b = matcher
            .find("p.A$3.run()V")
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.signature, "run()");
    }

    #[test]
    fn anonymous_ordinals_follow_encounter_order()
    {
        // Given: three sibling anonymous classes, the second with a nested one
        let tree = parse(ANONYMOUS);
        let matcher = NameMatcher::new(&tree);
        let owner = |ln: &str| {
            let m = matcher
                .find(ln)
                .unwrap();
            tree.decl(m.decl)
                .owner
                .clone()
        };

        // Then: $1..$3 pick the siblings in order
        assert_eq!(owner("p.A$1.run()V"), "p.A$1");
        assert_eq!(owner("p.A$2.run()V"), "p.A$2");
        assert_eq!(owner("p.A$3.run()V"), "p.A$3");

        // And: the nested class restarts at 1 and resolves to its enclosing member
        assert_eq!(owner("p.A$2$1.run()V"), "p.A$2");
        assert!(matches!(
            matcher.find("p.A$2$2.run()V"),
            Err(MatchError::NameNotFound(_))
        ));
    }

    #[test]
    fn bounded_and_unbounded_type_variables()
    {
        let tree = parse(
            r#"
            package p;
            class G<T extends Number> {
                void take(T t) {}
                <U> void any(U u) {}
            }
            "#,
        );
        let matcher = NameMatcher::new(&tree);

        assert!(
            matcher
                .find("p.G.take(Ljava/lang/Number;)V")
                .is_ok()
        );
        assert!(
            matcher
                .find("p.G.take(Ljava/lang/String;)V")
                .is_err()
        );
        assert!(
            matcher
                .find("p.G.any(Ljava/lang/Object;)V")
                .is_ok()
        );
        assert!(
            matcher
                .find("p.G.any(Ljava/lang/String;)V")
                .is_err()
        );
    }

    #[test]
    fn nested_types_constructors_and_arrays()
    {
        let tree = parse(
            r#"
            package com.x;
            public class Outer {
                public static class Inner {
                    Inner(int[] xs, String... rest) {}
                    void go(java.util.Map.Entry<String, Integer> e, long[][] grid) {}
                }
                void go() {}
            }
            "#,
        );
        let matcher = NameMatcher::new(&tree);

        let ctor = matcher
            .find("com.x.Outer$Inner.<init>([I[Ljava/lang/String;)V")
            .unwrap();
        assert_eq!(ctor.signature, "Inner(int[], String...)");

        let go = matcher
            .find("com.x.Outer.Inner.go(Ljava/util/Map$Entry;[[J)V")
            .unwrap();
        assert_eq!(go.signature, "go(java.util.Map.Entry<String, Integer>, long[][])");

        // Outer.go() is the named-path match even though Inner is walked too
        let outer = matcher
            .find("com.x.Outer.go()V")
            .unwrap();
        assert_eq!(outer.signature, "go()");
        assert_eq!(
            tree.decl(outer.decl)
                .owner,
            "com.x.Outer"
        );

        // Array depth must agree
        assert!(
            matcher
                .find("com.x.Outer.Inner.go(Ljava/util/Map$Entry;[J)V")
                .is_err()
        );
    }

    #[test]
    fn lambda_and_local_class_matches_resolve_to_member()
    {
        let tree = parse(
            r#"
            class Host {
                void work() {
                    class Local { void step() {} }
                    new Local().step();
                }
            }
            "#,
        );
        let m = NameMatcher::new(&tree)
            .find("Host$Local.step()V")
            .unwrap();
        assert_eq!(m.signature, "work()");
    }

    #[test]
    fn enum_constants_match_by_bare_name()
    {
        let tree = parse(
            r#"
            package e;
            enum Color { RED, GREEN { void shade() {} } }
            "#,
        );
        let matcher = NameMatcher::new(&tree);
        assert_eq!(
            matcher
                .find("e.Color.GREEN")
                .unwrap()
                .signature,
            "GREEN"
        );
    }

    #[test]
    fn method_in_enum_constant_body_matches_itself()
    {
        // Given: a method declared inside a constant's class body
        let tree = parse(
            r#"
            package e;
            enum Color { RED, GREEN { void shade() {} } }
            "#,
        );

        // When
        let m = NameMatcher::new(&tree)
            .find("e.Color$1.shade()V")
            .unwrap();

        // Then: the method, not the constant around it
        assert_eq!(m.signature, "shade()");
        let decl = tree.decl(m.decl);
        assert_eq!(decl.kind, DeclKind::Method);
        assert_eq!(decl.owner, "e.Color$1");
    }

    #[test]
    fn overloads_need_exact_arity()
    {
        let tree = parse("class K { K() {} K(int n) {} }");
        let matcher = NameMatcher::new(&tree);

        let one = matcher
            .find("K.<init>(I)V")
            .unwrap();
        assert_eq!(one.signature, "K(int)");
        assert!(
            matcher
                .find("K.<init>(II)V")
                .is_err()
        );
    }

    #[test]
    fn failures_are_typed()
    {
        let tree = parse("package a.b; class C { void f(int x) {} }");
        let matcher = NameMatcher::new(&tree);

        assert!(matches!(
            matcher.find("a.bb.C.f(I)V"),
            Err(MatchError::PackageMismatch { .. })
        ));
        assert!(matches!(
            matcher.find("a.b.C.f(Q)V"),
            Err(MatchError::MalformedDescriptor(_))
        ));
        assert!(matches!(
            matcher.find("a.b.C.g(I)V"),
            Err(MatchError::NameNotFound(_))
        ));
        assert!(
            matcher
                .find("a.b.C.f(I)V")
                .is_ok()
        );
    }
}
