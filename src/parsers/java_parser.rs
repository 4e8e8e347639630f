//! Filepath: src/parsers/java_parser.rs
//! Java declaration model built on tree-sitter-java.
//!
//! Parsing produces an owned `SourceTree`: an arena of declarations
//! (methods, constructors, enum constants) addressed by `DeclId`, an
//! arena of type bodies (named or anonymous) addressed by `ScopeId`,
//! and an `Item` tree that mirrors how those are nested in the file.
//! The tree-sitter `Tree` itself is dropped once the arena is built.

use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, warn};
use tree_sitter::{Language, Node, Parser};

use crate::infra::utils::{NameUtils, TsNodeUtils};

/// Handle of a declaration inside one `SourceTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub usize);

/// Handle of a named or anonymous type body inside one `SourceTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

/// The Source Parser could not produce a tree
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    #[error("failed to load Java grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    #[error("tree-sitter produced no syntax tree")]
    NoTree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Method,
    Constructor,
    EnumConstant,
}

/// A type parameter visible at some point in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    /// First declared bound, stripped of type arguments
    pub bound: Option<String>,
}

/// One formal parameter as written in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalParam {
    /// Declared type without type arguments or array brackets
    pub type_name: String,
    /// Array dimensions from both `T[] x` and `T x[]` forms
    pub dims: usize,
    /// Variable-arity (`T... x`)
    pub varargs: bool,
    /// Upper bound when `type_name` names an in-scope type variable
    pub type_var_bound: Option<String>,
    /// Normalized source spelling, used for signatures
    pub display: String,
}

/// A method, constructor or enum constant
#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclId,
    pub kind: DeclKind,
    pub name: String,
    pub params: Vec<FormalParam>,
    /// Nearest lexically enclosing declaration, if any
    pub enclosing: Option<DeclId>,
    /// Type body that declares this member
    pub scope: ScopeId,
    /// Binary name of the owning type, e.g. `com.x.Outer$Inner`
    pub owner: String,
    pub byte_range: Range<usize>,
    /// Calls and constructions found in the body, in source order
    pub references: Vec<Reference>,
}

impl Declaration {
    /// `name(T1, T2)` for callables, the bare name for enum constants
    pub fn signature(&self) -> String {
        match self.kind {
            DeclKind::EnumConstant => self.name.clone(),
            DeclKind::Method | DeclKind::Constructor => {
                let params: Vec<&str> = self.params.iter().map(|p| p.display.as_str()).collect();
                format!("{}({})", self.name, params.join(", "))
            }
        }
    }

    /// True if a call with `args` arguments can bind to this declaration
    pub fn accepts_arity(&self, args: usize) -> bool {
        let n = self.params.len();
        match self.params.last() {
            Some(last) if last.varargs => args + 1 >= n,
            _ => args == n,
        }
    }
}

/// A class, interface, enum, record, or anonymous class body
#[derive(Debug, Clone)]
pub struct TypeScope {
    pub id: ScopeId,
    /// `None` for anonymous bodies
    pub name: Option<String>,
    pub parent: Option<ScopeId>,
    pub binary_name: String,
    /// Methods and constructors declared directly in this body
    pub callables: Vec<DeclId>,
}

/// Structural nesting used by the name matcher
#[derive(Debug, Clone)]
pub enum Item {
    /// Named type declaration
    Type {
        scope: ScopeId,
        name: String,
        /// Member or local type (anything but top level)
        nested: bool,
        members: Vec<Item>,
    },
    /// Inline class body of `new T() { ... }` or an enum constant
    Anonymous { scope: ScopeId, members: Vec<Item> },
    /// Method or constructor, with types declared inside its body
    Callable { decl: DeclId, inner: Vec<Item> },
    /// Enum constant, with its optional body as an `Anonymous` item
    EnumConstant { decl: DeclId, inner: Vec<Item> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverKind {
    This,
    Super,
    /// Plain identifier, a variable or a type name
    Name(String),
    FieldAccess,
    ObjectCreation,
    StringLiteral,
    Other,
}

/// Qualifier in front of a call: the `x` in `x.m()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub kind: ReceiverKind,
    /// The receiver mentions a name, field access, `super`, a
    /// construction or a string literal somewhere inside it
    pub names_other: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    This,
    Super,
    Name(String),
    Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    This,
    Super,
}

/// Something inside a body that may point at another declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Call {
        name: String,
        receiver: Option<Receiver>,
        arg_count: usize,
        scope: ScopeId,
    },
    MethodRef {
        name: String,
        target: RefTarget,
        scope: ScopeId,
    },
    Creation {
        type_name: String,
        has_body: bool,
    },
    /// `this(...)` or `super(...)` at the start of a constructor
    Redirect {
        kind: RedirectKind,
        /// Simple name of the type declaring the constructor
        type_name: String,
        is_last_statement: bool,
    },
}

/// Parsed Java file as an owned declaration arena
#[derive(Debug, Clone)]
pub struct SourceTree {
    source: String,
    package: String,
    decls: Vec<Declaration>,
    scopes: Vec<TypeScope>,
    items: Vec<Item>,
    has_errors: bool,
}

impl SourceTree {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declared package, empty for the default package
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Top-level type declarations
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0]
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.decls
    }

    pub fn scope(&self, id: ScopeId) -> &TypeScope {
        &self.scopes[id.0]
    }

    /// Named type bodies with the given simple name
    pub fn scopes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TypeScope> + 'a {
        self.scopes
            .iter()
            .filter(move |s| s.name.as_deref() == Some(name))
    }

    /// Verbatim source text of a declaration
    pub fn text_of(&self, id: DeclId) -> &str {
        self.source
            .get(self.decl(id).byte_range.clone())
            .unwrap_or("")
    }

    /// Follow `enclosing` links up to the outermost declaration
    pub fn outermost(&self, id: DeclId) -> DeclId {
        let mut cur = id;
        while let Some(up) = self.decl(cur).enclosing {
            cur = up;
        }
        cur
    }

    /// Simple name of the nearest named type around `scope`
    pub fn type_name_of(&self, scope: ScopeId) -> Option<&str> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let s = self.scope(id);
            if let Some(name) = s.name.as_deref() {
                return Some(name);
            }
            cur = s.parent;
        }
        None
    }
}

/// Source Parser for Java files
pub struct JavaSourceParser {
    language: Language,
}

impl Default for JavaSourceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaSourceParser {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
        }
    }

    /// Parse Java source text into a `SourceTree`.
    ///
    /// Syntax errors are tolerated (tree-sitter recovers), but logged.
    pub fn parse(&self, source: &str) -> Result<SourceTree, ParseFailure> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;

        let tree = parser.parse(source, None).ok_or(ParseFailure::NoTree)?;
        let root = tree.root_node();
        let has_errors = root.has_error();
        if has_errors {
            warn!("Java source has syntax errors; continuing with recovered tree");
        }

        let mut builder = Builder::new(source.as_bytes());
        let items = builder.program(root);
        debug!(
            package = %builder.package,
            declarations = builder.decls.len(),
            scopes = builder.scopes.len(),
            "built declaration arena"
        );

        Ok(SourceTree {
            source: source.to_string(),
            package: builder.package,
            decls: builder.decls,
            scopes: builder.scopes,
            items,
            has_errors,
        })
    }
}

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const TYPE_NODES: &[&str] = &[
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
    "annotated_type",
];

const BODY_NODES: &[&str] = &[
    "class_body",
    "interface_body",
    "enum_body",
    "annotation_type_body",
];

fn is_type_declaration(kind: &str) -> bool {
    TYPE_DECLARATIONS.contains(&kind)
}

fn is_comment(node: &Node) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

/// Walks one tree-sitter tree and fills the arenas
struct Builder<'s> {
    bytes: &'s [u8],
    package: String,
    decls: Vec<Declaration>,
    scopes: Vec<TypeScope>,
    /// Body node id -> scope, used to track scope while collecting references
    scope_by_node: HashMap<usize, ScopeId>,
    /// Anonymous bodies seen so far per enclosing scope
    anonymous_seen: HashMap<ScopeId, u32>,
}

impl<'s> Builder<'s> {
    fn new(bytes: &'s [u8]) -> Self {
        Self {
            bytes,
            package: String::new(),
            decls: Vec::new(),
            scopes: Vec::new(),
            scope_by_node: HashMap::new(),
            anonymous_seen: HashMap::new(),
        }
    }

    fn text(&self, node: Node) -> &'s str {
        TsNodeUtils::text(node, self.bytes)
    }

    fn program(&mut self, root: Node) -> Vec<Item> {
        let mut items = Vec::new();
        for child in TsNodeUtils::named_children(root) {
            match child.kind() {
                "package_declaration" => {
                    if let Some(name) =
                        TsNodeUtils::first_named_of(child, &["scoped_identifier", "identifier"])
                    {
                        self.package = self.text(name).split_whitespace().collect();
                    }
                }
                k if is_type_declaration(k) => {
                    items.push(self.type_declaration(child, None, None, &[]));
                }
                _ => {}
            }
        }
        items
    }

    fn new_scope(&mut self, name: Option<String>, parent: Option<ScopeId>, binary_name: String) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(TypeScope {
            id,
            name,
            parent,
            binary_name,
            callables: Vec::new(),
        });
        id
    }

    fn type_declaration(
        &mut self,
        node: Node,
        parent: Option<ScopeId>,
        enclosing: Option<DeclId>,
        env: &[TypeParam],
    ) -> Item {
        let name = TsNodeUtils::field_text(node, "name", self.bytes)
            .unwrap_or_default()
            .to_string();
        let binary = match parent {
            Some(p) => format!("{}${}", self.scopes[p.0].binary_name, name),
            None => NameUtils::join(&[&self.package, &name], '.'),
        };
        let scope = self.new_scope(Some(name.clone()), parent, binary);

        let mut env = env.to_vec();
        env.extend(self.type_parameters(node));

        let members = match node.child_by_field_name("body") {
            Some(body) => {
                self.scope_by_node.insert(body.id(), scope);
                self.members(body, scope, enclosing, &env)
            }
            None => Vec::new(),
        };

        Item::Type {
            scope,
            name,
            nested: parent.is_some(),
            members,
        }
    }

    fn members(&mut self, body: Node, scope: ScopeId, enclosing: Option<DeclId>, env: &[TypeParam]) -> Vec<Item> {
        let mut items = Vec::new();
        for child in TsNodeUtils::named_children(body) {
            match child.kind() {
                "method_declaration" => {
                    items.push(self.callable(child, DeclKind::Method, scope, enclosing, env));
                }
                "constructor_declaration" | "compact_constructor_declaration" => {
                    items.push(self.callable(child, DeclKind::Constructor, scope, enclosing, env));
                }
                "enum_constant" => items.push(self.enum_constant(child, scope, enclosing, env)),
                "enum_body_declarations" => items.extend(self.members(child, scope, enclosing, env)),
                k if is_type_declaration(k) => {
                    items.push(self.type_declaration(child, Some(scope), enclosing, env));
                }
                // Fields and initializer blocks may hold anonymous or local types
                _ => items.extend(self.nested_items(child, scope, enclosing, env)),
            }
        }
        items
    }

    fn callable(
        &mut self,
        node: Node,
        kind: DeclKind,
        scope: ScopeId,
        enclosing: Option<DeclId>,
        env: &[TypeParam],
    ) -> Item {
        let name = TsNodeUtils::field_text(node, "name", self.bytes)
            .unwrap_or_default()
            .to_string();

        let mut env = env.to_vec();
        env.extend(self.type_parameters(node));

        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.formal_parameters(p, &env))
            .unwrap_or_default();

        let id = self.push_decl(kind, name, params, scope, enclosing, node.byte_range());

        let body = node.child_by_field_name("body");
        let inner = match body {
            Some(b) => self.nested_items(b, scope, Some(id), &env),
            None => Vec::new(),
        };

        // Nested scopes exist now, so reference scopes can be looked up
        if let Some(b) = body {
            self.decls[id.0].references = self.references(b, scope);
        }

        Item::Callable { decl: id, inner }
    }

    fn enum_constant(&mut self, node: Node, scope: ScopeId, enclosing: Option<DeclId>, env: &[TypeParam]) -> Item {
        let name = TsNodeUtils::field_text(node, "name", self.bytes)
            .unwrap_or_default()
            .to_string();
        let id = self.push_decl(DeclKind::EnumConstant, name, Vec::new(), scope, enclosing, node.byte_range());

        // Body members are not enclosed by the constant itself
        let mut inner = Vec::new();
        if let Some(args) = node.child_by_field_name("arguments") {
            inner.extend(self.nested_items(args, scope, enclosing, env));
        }
        if let Some(body) = node.child_by_field_name("body") {
            inner.push(self.anonymous_body(body, scope, enclosing, env));
        }

        self.decls[id.0].references = self.references(node, scope);

        Item::EnumConstant { decl: id, inner }
    }

    fn anonymous_body(&mut self, body: Node, parent: ScopeId, enclosing: Option<DeclId>, env: &[TypeParam]) -> Item {
        let seen = self.anonymous_seen.entry(parent).or_insert(0);
        *seen += 1;
        let binary = format!("{}${}", self.scopes[parent.0].binary_name, seen);

        let scope = self.new_scope(None, Some(parent), binary);
        self.scope_by_node.insert(body.id(), scope);
        let members = self.members(body, scope, enclosing, env);

        Item::Anonymous { scope, members }
    }

    /// Anonymous and local types found anywhere below `node`, in source order
    fn nested_items(&mut self, node: Node, scope: ScopeId, enclosing: Option<DeclId>, env: &[TypeParam]) -> Vec<Item> {
        let mut out = Vec::new();
        for child in TsNodeUtils::named_children(node) {
            self.collect_nested(child, scope, enclosing, env, &mut out);
        }
        out
    }

    fn collect_nested(
        &mut self,
        node: Node,
        scope: ScopeId,
        enclosing: Option<DeclId>,
        env: &[TypeParam],
        out: &mut Vec<Item>,
    ) {
        match node.kind() {
            "object_creation_expression" => {
                let body = TsNodeUtils::first_named_of(node, &["class_body"]);
                // Arguments are evaluated first, so their anonymous classes come first
                for child in TsNodeUtils::named_children(node) {
                    if Some(child) != body {
                        self.collect_nested(child, scope, enclosing, env, out);
                    }
                }
                if let Some(b) = body {
                    out.push(self.anonymous_body(b, scope, enclosing, env));
                }
            }
            k if is_type_declaration(k) => {
                out.push(self.type_declaration(node, Some(scope), enclosing, env));
            }
            _ => {
                for child in TsNodeUtils::named_children(node) {
                    self.collect_nested(child, scope, enclosing, env, out);
                }
            }
        }
    }

    fn push_decl(
        &mut self,
        kind: DeclKind,
        name: String,
        params: Vec<FormalParam>,
        scope: ScopeId,
        enclosing: Option<DeclId>,
        byte_range: Range<usize>,
    ) -> DeclId {
        let id = DeclId(self.decls.len());
        let owner = self.scopes[scope.0].binary_name.clone();
        self.decls.push(Declaration {
            id,
            kind,
            name,
            params,
            enclosing,
            scope,
            owner,
            byte_range,
            references: Vec::new(),
        });
        if kind != DeclKind::EnumConstant {
            self.scopes[scope.0].callables.push(id);
        }
        id
    }

    fn type_parameters(&self, node: Node) -> Vec<TypeParam> {
        let Some(list) = TsNodeUtils::first_named_of(node, &["type_parameters"]) else {
            return Vec::new();
        };

        TsNodeUtils::named_children(list)
            .into_iter()
            .filter(|p| p.kind() == "type_parameter")
            .filter_map(|p| {
                let name = TsNodeUtils::first_named_of(p, &["type_identifier", "identifier"])?;
                let bound = TsNodeUtils::first_named_of(p, &["type_bound"])
                    .and_then(|b| TsNodeUtils::first_named_of(b, TYPE_NODES))
                    .map(|t| self.type_shape(t).0);
                Some(TypeParam {
                    name: self.text(name).to_string(),
                    bound,
                })
            })
            .collect()
    }

    fn formal_parameters(&self, list: Node, env: &[TypeParam]) -> Vec<FormalParam> {
        let mut out = Vec::new();
        for p in TsNodeUtils::named_children(list) {
            let (ty, varargs) = match p.kind() {
                "formal_parameter" => (p.child_by_field_name("type"), false),
                "spread_parameter" => (TsNodeUtils::first_named_of(p, TYPE_NODES), true),
                // receiver parameters and comments
                _ => continue,
            };
            let Some(ty) = ty else { continue };

            let (type_name, dims) = self.type_shape(ty);
            let trailing = p
                .child_by_field_name("dimensions")
                .map(|d| self.count_dims(d))
                .unwrap_or(0);

            let mut display = NameUtils::collapse_ws(self.text(ty));
            display.push_str(&"[]".repeat(trailing));
            if varargs {
                display.push_str("...");
            }

            // Innermost declaration wins, so search from the end
            let type_var_bound = if type_name.contains('.') {
                None
            } else {
                env.iter()
                    .rev()
                    .find(|tp| tp.name == type_name)
                    .map(|tp| tp.bound.clone().unwrap_or_else(|| "Object".to_string()))
            };

            out.push(FormalParam {
                type_name,
                dims: dims + trailing,
                varargs,
                type_var_bound,
                display,
            });
        }
        out
    }

    /// Declared type name without type arguments, plus array dimensions
    fn type_shape(&self, node: Node) -> (String, usize) {
        match node.kind() {
            "array_type" => {
                let (name, inner) = node
                    .child_by_field_name("element")
                    .map(|e| self.type_shape(e))
                    .unwrap_or_default();
                let dims = node
                    .child_by_field_name("dimensions")
                    .map(|d| self.count_dims(d))
                    .unwrap_or(1);
                (name, inner + dims)
            }
            "annotated_type" => TsNodeUtils::named_children(node)
                .into_iter()
                .rev()
                .find(|c| TYPE_NODES.contains(&c.kind()))
                .map(|t| self.type_shape(t))
                .unwrap_or_default(),
            "generic_type" => {
                let base = TsNodeUtils::first_named_of(node, &["type_identifier", "scoped_type_identifier"])
                    .map(|b| self.text(b))
                    .unwrap_or_default();
                (NameUtils::strip_type_arguments(base), 0)
            }
            _ => (NameUtils::strip_type_arguments(self.text(node)), 0),
        }
    }

    fn count_dims(&self, node: Node) -> usize {
        self.text(node).matches('[').count()
    }

    /// Calls and constructions below `node`
    fn references(&self, node: Node, scope: ScopeId) -> Vec<Reference> {
        let mut refs = Vec::new();
        for child in TsNodeUtils::named_children(node) {
            self.collect_references(child, scope, true, &mut refs);
        }
        refs
    }

    /// `redirects` is false inside nested constructors, whose `this(...)`/`super(...)` are their own
    fn collect_references(&self, node: Node, scope: ScopeId, redirects: bool, refs: &mut Vec<Reference>) {
        // Entering an anonymous or local type body changes the lexical scope
        let scope = if BODY_NODES.contains(&node.kind()) {
            self.scope_by_node.get(&node.id()).copied().unwrap_or(scope)
        } else {
            scope
        };

        match node.kind() {
            "method_invocation" => refs.push(self.call_reference(node, scope)),
            "method_reference" => {
                if let Some(r) = self.method_reference(node, scope) {
                    refs.push(r);
                }
            }
            "object_creation_expression" => refs.push(self.creation_reference(node)),
            "explicit_constructor_invocation" if redirects => refs.push(self.redirect_reference(node, scope)),
            _ => {}
        }

        let redirects = redirects && node.kind() != "constructor_declaration";
        for child in TsNodeUtils::named_children(node) {
            self.collect_references(child, scope, redirects, refs);
        }
    }

    fn call_reference(&self, node: Node, scope: ScopeId) -> Reference {
        let name = TsNodeUtils::field_text(node, "name", self.bytes)
            .unwrap_or_default()
            .to_string();
        let receiver = node.child_by_field_name("object").map(|o| self.receiver(o));
        let arg_count = node
            .child_by_field_name("arguments")
            .map(|a| {
                TsNodeUtils::named_children(a)
                    .iter()
                    .filter(|c| !is_comment(c))
                    .count()
            })
            .unwrap_or(0);

        Reference::Call {
            name,
            receiver,
            arg_count,
            scope,
        }
    }

    fn receiver(&self, object: Node) -> Receiver {
        let kind = match object.kind() {
            "this" => ReceiverKind::This,
            "super" => ReceiverKind::Super,
            "identifier" => ReceiverKind::Name(self.text(object).to_string()),
            "field_access" => ReceiverKind::FieldAccess,
            "object_creation_expression" => ReceiverKind::ObjectCreation,
            "string_literal" => ReceiverKind::StringLiteral,
            _ => ReceiverKind::Other,
        };

        let names_other = TsNodeUtils::any_in_subtree(object, &mut |n: Node| match n.kind() {
            "field_access" | "super" | "object_creation_expression" | "string_literal" => true,
            "identifier" => !is_member_or_binding_name(n),
            _ => false,
        });

        Receiver { kind, names_other }
    }

    fn method_reference(&self, node: Node, scope: ScopeId) -> Option<Reference> {
        let target = TsNodeUtils::named_children(node).into_iter().next()?;

        let mut cursor = node.walk();
        let last = node.children(&mut cursor).last()?;
        // `Type::new` is a constructor reference; nothing to resolve by name
        if last.kind() != "identifier" || last == target {
            return None;
        }

        let target = match target.kind() {
            "this" => RefTarget::This,
            "super" => RefTarget::Super,
            "identifier" | "type_identifier" => RefTarget::Name(self.text(target).to_string()),
            _ => RefTarget::Expression,
        };

        Some(Reference::MethodRef {
            name: self.text(last).to_string(),
            target,
            scope,
        })
    }

    fn creation_reference(&self, node: Node) -> Reference {
        let type_name = node
            .child_by_field_name("type")
            .map(|t| {
                let (name, _) = self.type_shape(t);
                NameUtils::last_segment(&name).to_string()
            })
            .unwrap_or_default();
        let has_body = TsNodeUtils::first_named_of(node, &["class_body"]).is_some();

        Reference::Creation { type_name, has_body }
    }

    fn redirect_reference(&self, node: Node, scope: ScopeId) -> Reference {
        let kind = match node.child_by_field_name("constructor").map(|c| c.kind()) {
            Some("this") => RedirectKind::This,
            _ => RedirectKind::Super,
        };
        let type_name = self.type_name_of(scope).unwrap_or_default().to_string();
        let is_last_statement = TsNodeUtils::next_significant_sibling(node).is_none();

        Reference::Redirect {
            kind,
            type_name,
            is_last_statement,
        }
    }

    fn type_name_of(&self, scope: ScopeId) -> Option<&str> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let s = &self.scopes[id.0];
            if let Some(name) = s.name.as_deref() {
                return Some(name);
            }
            cur = s.parent;
        }
        None
    }
}

/// Identifiers that name a member or bind a variable rather than refer to one
fn is_member_or_binding_name(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };

    match parent.kind() {
        "method_invocation" | "field_access" => {
            parent.child_by_field_name("name") == Some(node) || parent.child_by_field_name("field") == Some(node)
        }
        "method_reference" => node.next_sibling().is_none(),
        "lambda_expression" | "inferred_parameters" | "formal_parameter" | "variable_declarator" => true,
        _ => false,
    }
}
