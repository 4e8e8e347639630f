//! Filepath: src/core/descriptor.rs
//! JVM parameter-descriptor parsing. A descriptor such as
//! `I[JLjava/lang/String;` is decoded into an ordered list
//! of `ParameterType`s that the name matcher compares
//! against formal parameters in source.

use std::fmt;

/// Errors raised while decoding a descriptor string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError
{
    /// An `L...` unit never reached its terminating `;`
    #[error("unterminated object type at offset {offset} in '{descriptor}'")]
    UnterminatedObject
    {
        descriptor: String,
        offset: usize,
    },

    /// The cursor hit a character that starts no known unit
    #[error("unknown descriptor code '{code}' at offset {offset} in '{descriptor}'")]
    UnknownCode
    {
        descriptor: String,
        offset: usize,
        code: char,
    },

    /// One or more `[` with nothing after them
    #[error("array prefix without element type at offset {offset} in '{descriptor}'")]
    MissingArrayElement
    {
        descriptor: String,
        offset: usize,
    },
}

/// Broad category of a decoded parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind
{
    /// `I`, `Z`, `B`, `C`, `D`, `F`, `J`, `S`, `V`
    Primitive,

    /// `L<name>;`
    Object,

    /// One or more `[` followed by a primitive or object unit
    Array,
}

/// One formal parameter reconstructed from a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterType
{
    /// Primitive, object or array
    pub kind: TypeKind,

    /// Java keyword for primitives, simple (possibly dotted) name for objects
    pub base_name: String,

    /// Number of `[` prefixes, zero unless `kind` is `Array`
    pub array_depth: usize,
}

impl ParameterType
{
    /// Build a primitive parameter from its Java keyword
    pub fn primitive(keyword: &str) -> Self
    {
        Self { kind: TypeKind::Primitive, base_name: keyword.to_string(), array_depth: 0 }
    }

    /// Build an object parameter from its simple name
    pub fn object(name: &str) -> Self
    {
        Self { kind: TypeKind::Object, base_name: name.to_string(), array_depth: 0 }
    }

    /// Build an array parameter over the given base name
    pub fn array(
        base_name: &str,
        depth: usize,
    ) -> Self
    {
        Self { kind: TypeKind::Array, base_name: base_name.to_string(), array_depth: depth }
    }

    /// True for array parameters
    pub fn is_array(&self) -> bool
    {
        self.kind == TypeKind::Array
    }
}

impl fmt::Display for ParameterType
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        // Render the way the type is spelled in Java source
        write!(f, "{}", self.base_name)?;
        for _ in 0..self.array_depth
        {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// Map a single primitive code to its Java keyword
fn primitive_keyword(code: char) -> Option<&'static str>
{
    let kw = match code
    {
        'I' => "int",
        'Z' => "boolean",
        'B' => "byte",
        'C' => "char",
        'D' => "double",
        'F' => "float",
        'J' => "long",
        'S' => "short",
        'V' => "void",
        _ => return None,
    };

    Some(kw)
}

/// Turn `java/util/Map$Entry` into `Map.Entry`
fn object_simple_name(internal: &str) -> String
{
    // Nested-type separators become dots first
    let dotted = internal.replace('$', ".");

    // Keep the last slash-separated path segment
    match dotted.rfind('/')
    {
        Some(pos) => dotted[pos + 1..].to_string(),
        None => dotted,
    }
}

/// Parse a full parameter descriptor (the text between `(` and `)`).
pub fn parse_parameters(descriptor: &str) -> Result<Vec<ParameterType>, DescriptorError>
{
    let chars: Vec<char> = descriptor
        .chars()
        .collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len()
    {
        // Count array dimensions, if any
        let start = i;
        let mut depth = 0;
        while i < chars.len() && chars[i] == '['
        {
            depth += 1;
            i += 1;
        }

        if i >= chars.len()
        {
            return Err(DescriptorError::MissingArrayElement {
                descriptor: descriptor.to_string(),
                offset: start,
            });
        }

        // Decode exactly one element unit
        let (element, next) = parse_unit(descriptor, &chars, i)?;
        i = next;

        if depth > 0
        {
            out.push(ParameterType::array(&element.base_name, depth));
        }
        else
        {
            out.push(element);
        }
    }

    Ok(out)
}

/// Decode one primitive or object unit starting at `at`
fn parse_unit(
    descriptor: &str,
    chars: &[char],
    at: usize,
) -> Result<(ParameterType, usize), DescriptorError>
{
    let code = chars[at];

    if code == 'L'
    {
        // Consume through the next ';'
        let end = chars[at + 1..]
            .iter()
            .position(|&c| c == ';')
            .map(|p| at + 1 + p)
            .ok_or_else(|| DescriptorError::UnterminatedObject {
                descriptor: descriptor.to_string(),
                offset: at,
            })?;

        let internal: String = chars[at + 1..end]
            .iter()
            .collect();
        return Ok((ParameterType::object(&object_simple_name(&internal)), end + 1));
    }

    match primitive_keyword(code)
    {
        Some(kw) => Ok((ParameterType::primitive(kw), at + 1)),
        None => Err(DescriptorError::UnknownCode {
            descriptor: descriptor.to_string(),
            offset: at,
            code,
        }),
    }
}
