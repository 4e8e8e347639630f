//! Filepath: src/parsers/resolver.rs
//! Best-effort resolution of references to declarations in the same file.
//!
//! Only lexically certain cases resolve: unqualified calls, `this.`
//! calls, `Type.` calls and `this::m` / `Type::m` references, and only
//! when exactly one declaration fits by name and arity. Everything else
//! is left unresolved for the caller to handle.

use super::java_parser::{
    DeclId, DeclKind, ReceiverKind, RefTarget, Reference, ScopeId, SourceTree,
};

/// Maps a reference to the declaration it targets, if that is certain
pub trait Resolver {
    fn resolve(&self, tree: &SourceTree, reference: &Reference) -> Option<DeclId>;
}

/// Resolver that walks the lexical scope chain of the call site
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopeResolver;

impl Resolver for ScopeResolver {
    fn resolve(&self, tree: &SourceTree, reference: &Reference) -> Option<DeclId> {
        match reference {
            Reference::Call {
                name,
                receiver,
                arg_count,
                scope,
            } => match receiver {
                None => self.in_scope_chain(tree, *scope, name, Some(*arg_count)),
                Some(r) => match &r.kind {
                    ReceiverKind::This => unique_in(tree, *scope, name, Some(*arg_count)),
                    ReceiverKind::Name(type_name) => {
                        let scope = single_type_named(tree, type_name)?;
                        unique_in(tree, scope, name, Some(*arg_count))
                    }
                    _ => None,
                },
            },
            Reference::MethodRef {
                name,
                target,
                scope,
            } => match target {
                RefTarget::This => unique_in(tree, *scope, name, None),
                RefTarget::Name(type_name) => {
                    let scope = single_type_named(tree, type_name)?;
                    unique_in(tree, scope, name, None)
                }
                RefTarget::Super | RefTarget::Expression => None,
            },
            Reference::Creation { .. } | Reference::Redirect { .. } => None,
        }
    }
}

impl ScopeResolver {
    /// Innermost scope with any candidate decides; ambiguity there is unresolved
    fn in_scope_chain(&self, tree: &SourceTree, from: ScopeId, name: &str, arity: Option<usize>) -> Option<DeclId> {
        let mut cur = Some(from);
        while let Some(scope) = cur {
            let found = candidates(tree, scope, name, arity);
            match found.as_slice() {
                [] => cur = tree.scope(scope).parent,
                [only] => return Some(*only),
                _ => return None,
            }
        }
        None
    }
}

fn candidates(tree: &SourceTree, scope: ScopeId, name: &str, arity: Option<usize>) -> Vec<DeclId> {
    tree.scope(scope)
        .callables
        .iter()
        .copied()
        .filter(|&id| {
            let d = tree.decl(id);
            d.kind == DeclKind::Method
                && d.name == name
                && arity.is_none_or(|n| d.accepts_arity(n))
        })
        .collect()
}

fn unique_in(tree: &SourceTree, scope: ScopeId, name: &str, arity: Option<usize>) -> Option<DeclId> {
    match candidates(tree, scope, name, arity).as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

fn single_type_named(tree: &SourceTree, name: &str) -> Option<ScopeId> {
    let mut it = tree.scopes_named(name);
    let first = it.next()?;
    if it.next().is_some() {
        return None;
    }
    Some(first.id)
}
