//! Filepath: src/core/neighborhood.rs
//! Call-neighborhood extraction around seed declarations.
//!
//! Two tiers per reference: the `Resolver` first, then (for unqualified
//! calls, constructions and `this(...)` only) a same-name lookup in an
//! index of every method and constructor in the file. Each fallback is
//! logged at debug level.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet, map::Entry};
use tracing::debug;

use crate::core::ids::IdAllocator;
use crate::core::model::{DeclarationNode, Edge};
use crate::parsers::java_parser::{DeclId, DeclKind, RedirectKind, Reference, SourceTree};
use crate::parsers::resolver::Resolver;

/// Nodes and edges discovered for one source file
#[derive(Debug, Default, Clone)]
pub struct Neighborhood
{
    /// Keyed by declaration identity, in discovery order
    pub nodes: IndexMap<DeclId, DeclarationNode>,

    /// Deduplicated on (source, destination)
    pub edges: IndexSet<Edge>,
}

impl Neighborhood
{
    /// Drop invalid or excluded nodes and every edge touching them
    pub fn filter(
        &mut self,
        exclude: impl Fn(&DeclarationNode) -> bool,
    )
    {
        let dropped: HashSet<DeclId> = self
            .nodes
            .values()
            .filter(|n| !n.valid || exclude(n))
            .map(|n| n.decl)
            .collect();

        if dropped.is_empty()
        {
            return;
        }

        debug!(count = dropped.len(), "dropping invalid or excluded nodes");
        self.nodes
            .retain(|decl, _| !dropped.contains(decl));
        self.edges
            .retain(|e| !dropped.contains(&e.source) && !dropped.contains(&e.destination));
    }
}

/// Payload shared by every node discovered from one task's seeds
#[derive(Debug, Clone)]
pub struct NodeTemplate
{
    pub project: String,
    pub hash: String,
    pub class_source_file: String,

    /// Prefix signatures with the owning type (`Outer.f()`)
    pub qualify_signatures: bool,
}

impl NodeTemplate
{
    /// Build the node for `decl` with a fresh id and the discovered sentinel
    pub fn discovered(
        &self,
        tree: &SourceTree,
        decl: DeclId,
        ids: &IdAllocator,
    ) -> DeclarationNode
    {
        let d = tree.decl(decl);
        let parent = d
            .owner
            .clone();
        let signature = if self.qualify_signatures
        {
            format!("{parent}.{}", d.signature())
        }
        else
        {
            d.signature()
        };

        DeclarationNode {
            decl,
            id: ids.next_node_id(),
            project: self
                .project
                .clone(),
            hash: self
                .hash
                .clone(),
            parent,
            class_source_file: self
                .class_source_file
                .clone(),
            signature,
            long_name: None,
            number_of_bugs: DeclarationNode::DISCOVERED,
            seed: false,
            valid: true,
            explicit_super: false,
            graph_id: None,
        }
    }
}

/// What one declaration body points at
#[derive(Default)]
struct Scan
{
    targets: IndexSet<DeclId>,
    explicit_super: bool,
    invalid: bool,
}

/// Depth-first extractor over one `SourceTree`
pub struct NeighborhoodExtractor<'t, R>
{
    tree: &'t SourceTree,
    resolver: R,
    ids: &'t IdAllocator,
    by_name: HashMap<&'t str, Vec<DeclId>>,
}

impl<'t, R: Resolver> NeighborhoodExtractor<'t, R>
{
    pub fn new(
        tree: &'t SourceTree,
        resolver: R,
        ids: &'t IdAllocator,
    ) -> Self
    {
        // Same-name index over methods and constructors
        let mut by_name: HashMap<&'t str, Vec<DeclId>> = HashMap::new();
        for d in tree
            .declarations()
            .iter()
            .filter(|d| d.kind != DeclKind::EnumConstant)
        {
            by_name
                .entry(d.name.as_str())
                .or_default()
                .push(d.id);
        }

        Self { tree, resolver, ids, by_name }
    }

    /// Expand `seeds` into their neighborhood.
    ///
    /// Seeds for the same declaration merge (bug counts add, first seed
    /// keeps its metadata). Each declaration is explored at most once.
    pub fn extract(
        &self,
        seeds: Vec<DeclarationNode>,
        template: &NodeTemplate,
    ) -> Neighborhood
    {
        let mut hood = Neighborhood::default();
        let order: Vec<DeclId> = seeds
            .iter()
            .map(|s| s.decl)
            .collect();

        for seed in seeds
        {
            match hood
                .nodes
                .entry(seed.decl)
            {
                Entry::Occupied(mut e) =>
                {
                    debug!(signature = %seed.signature, "merging duplicate seed");
                    e.get_mut()
                        .absorb(&seed);
                }
                Entry::Vacant(e) =>
                {
                    e.insert(seed);
                }
            }
        }

        let mut visited = HashSet::new();
        for start in order
        {
            self.explore(start, template, &mut hood, &mut visited);
        }

        hood
    }

    fn explore(
        &self,
        start: DeclId,
        template: &NodeTemplate,
        hood: &mut Neighborhood,
        visited: &mut HashSet<DeclId>,
    )
    {
        let mut stack = vec![start];

        while let Some(current) = stack.pop()
        {
            if !visited.insert(current)
            {
                continue;
            }

            let scan = self.scan(current);
            if let Some(node) = hood
                .nodes
                .get_mut(&current)
            {
                node.explicit_super |= scan.explicit_super;
                node.valid &= !scan.invalid;
            }

            for &target in &scan.targets
            {
                if !hood
                    .nodes
                    .contains_key(&target)
                {
                    let node = template.discovered(self.tree, target, self.ids);
                    hood.nodes
                        .insert(target, node);
                }
                hood.edges
                    .insert(Edge::new(current, target));
            }

            // An invalid constructor keeps its edges but is not expanded
            if scan.invalid
            {
                continue;
            }

            // Reverse so the first reference is explored first
            for &target in scan
                .targets
                .iter()
                .rev()
            {
                if !visited.contains(&target)
                {
                    stack.push(target);
                }
            }
        }
    }

    /// Collect the declarations one body refers to
    fn scan(
        &self,
        current: DeclId,
    ) -> Scan
    {
        let decl = self
            .tree
            .decl(current);
        let mut scan = Scan::default();

        for reference in &decl.references
        {
            match reference
            {
                Reference::Call { name, receiver, .. } =>
                {
                    if let Some(target) = self
                        .resolver
                        .resolve(self.tree, reference)
                    {
                        scan.targets
                            .insert(target);
                    }
                    else if receiver
                        .as_ref()
                        .is_none_or(|r| !r.names_other)
                    {
                        debug!(from = %decl.signature(), call = %name, "unresolved call; using same-name declarations");
                        self.add_named(name, &mut scan);
                    }
                    else
                    {
                        debug!(from = %decl.signature(), call = %name, "unresolved qualified call dropped");
                    }
                }
                Reference::MethodRef { name, .. } =>
                {
                    match self
                        .resolver
                        .resolve(self.tree, reference)
                    {
                        Some(target) =>
                        {
                            scan.targets
                                .insert(target);
                        }
                        None => debug!(from = %decl.signature(), reference = %name, "unresolved method reference dropped"),
                    }
                }
                Reference::Creation { type_name, has_body } =>
                {
                    if !has_body
                    {
                        self.add_named(type_name, &mut scan);
                    }
                }
                Reference::Redirect { kind: RedirectKind::This, type_name, .. } =>
                {
                    self.add_named(type_name, &mut scan);
                }
                Reference::Redirect { kind: RedirectKind::Super, is_last_statement, .. } =>
                {
                    if *is_last_statement
                    {
                        scan.explicit_super = true;
                    }
                    else
                    {
                        debug!(from = %decl.signature(), "super(...) is not the last statement; node invalid");
                        scan.invalid = true;
                        break;
                    }
                }
            }
        }

        scan
    }

    fn add_named(
        &self,
        name: &str,
        scan: &mut Scan,
    )
    {
        if let Some(all) = self
            .by_name
            .get(name)
        {
            scan.targets
                .extend(all.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::parsers::java_parser::JavaSourceParser;
    use crate::parsers::resolver::ScopeResolver;

    fn template() -> NodeTemplate
    {
        NodeTemplate {
            project: "proj".into(),
            hash: "abc".into(),
            class_source_file: "proj/classes/x.java".into(),
            qualify_signatures: true,
        }
    }

    fn seed(
        tree: &SourceTree,
        name: &str,
        ids: &IdAllocator,
    ) -> DeclarationNode
    {
        let d = tree
            .declarations()
            .iter()
            .find(|d| d.name == name)
            .unwrap();
        let mut node = template().discovered(tree, d.id, ids);
        node.number_of_bugs = 1;
        node.seed = true;
        node
    }

    fn run(
        src: &str,
        seeds: &[&str],
    ) -> (SourceTree, Neighborhood)
    {
        let tree = JavaSourceParser::new()
            .parse(src)
            .unwrap();
        let ids = IdAllocator::new();
        let seeds = seeds
            .iter()
            .map(|s| seed(&tree, s, &ids))
            .collect();
        let hood = NeighborhoodExtractor::new(&tree, ScopeResolver, &ids).extract(seeds, &template());
        (tree, hood)
    }

    fn edge_names(
        tree: &SourceTree,
        hood: &Neighborhood,
    ) -> Vec<(String, String)>
    {
        hood.edges
            .iter()
            .map(|e| {
                (
                    tree.decl(e.source)
                        .signature(),
                    tree.decl(e.destination)
                        .signature(),
                )
            })
            .collect()
    }

    #[test]
    fn self_recursion_terminates_with_one_edge()
    {
        let (_, hood) = run("class A { int f(int n) { return n > 0 ? f(n - 1) + f(n - 2) : 0; } }", &["f"]);

        assert_eq!(hood.nodes.len(), 1);
        assert_eq!(hood.edges.len(), 1);
        let e = hood
            .edges
            .first()
            .unwrap();
        assert_eq!(e.source, e.destination);
    }

    #[test]
    fn discovered_nodes_get_sentinel_and_parent()
    {
        let (tree, hood) = run("package q; class A { void a() { b(); } void b() { c(); } void c() {} }", &["a"]);

        assert_eq!(edge_names(&tree, &hood), vec![
            ("a()".to_string(), "b()".to_string()),
            ("b()".to_string(), "c()".to_string()),
        ]);
        let c = hood
            .nodes
            .values()
            .find(|n| n.signature == "q.A.c()")
            .unwrap();
        assert_eq!(c.number_of_bugs, DeclarationNode::DISCOVERED);
        assert_eq!(c.parent, "q.A");
    }

    #[test]
    fn ambiguous_unqualified_call_falls_back_to_every_same_name()
    {
        // Two overloads with one argument each; arity cannot decide
        let (tree, hood) = run(
            "class A { void a(Object o) { put(o); } void put(String s) {} void put(Integer i) {} }",
            &["a"],
        );
        let targets: Vec<String> = edge_names(&tree, &hood)
            .into_iter()
            .map(|(_, d)| d)
            .collect();
        assert_eq!(targets, vec!["put(String)", "put(Integer)"]);
    }

    #[test]
    fn qualified_unresolved_calls_do_not_fall_back()
    {
        let (_, hood) = run(
            "class A { java.util.List<String> xs; void a() { xs.add(\"s\"); \"x\".trim(); super.toString(); } void add(String s) {} void trim() {} }",
            &["a"],
        );
        assert!(hood.edges.is_empty());
    }

    #[test]
    fn constructions_and_this_redirects_link_constructors()
    {
        let (tree, hood) = run(
            r#"
            class Box {
                Box() { this(0); }
                Box(int v) {}
                static Box make() { return new Box(); }
                static Runnable anon() { return new Runnable() { public void run() {} }; }
            }
            "#,
            &["make", "anon"],
        );
        let names = edge_names(&tree, &hood);
        assert!(names.contains(&("make()".into(), "Box()".into())));
        assert!(names.contains(&("make()".into(), "Box(int)".into())));
        assert!(names.contains(&("Box()".into(), "Box(int)".into())));
        assert!(
            !names
                .iter()
                .any(|(s, _)| s == "anon()")
        );
    }

    #[test]
    fn super_position_decides_validity()
    {
        let (tree, hood) = run(
            r#"
            class Base { Base() {} }
            class Last extends Base { Last() { super(); } }
            class Early extends Base { Early(int x) { super(); helper(); } void helper() {} }
            "#,
            &["Last", "Early"],
        );
        let by_sig = |sig: &str| {
            hood.nodes
                .values()
                .find(|n| {
                    tree.decl(n.decl)
                        .signature()
                        == sig
                })
                .unwrap()
        };

        assert!(by_sig("Last()").explicit_super);
        assert!(by_sig("Last()").valid);
        assert!(!by_sig("Early(int)").valid);
        assert!(hood.edges.is_empty());
    }

    #[test]
    fn filter_removes_nodes_and_touching_edges()
    {
        let (_, mut hood) = run("class A { void a() { testHelper(); b(); } void testHelper() {} void b() {} }", &["a"]);
        assert_eq!(hood.edges.len(), 2);

        hood.filter(|n| {
            n.signature
                .contains("test")
        });

        assert_eq!(hood.nodes.len(), 2);
        assert_eq!(hood.edges.len(), 1);
    }
}
