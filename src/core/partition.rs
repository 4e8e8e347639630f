//! Filepath: src/core/partition.rs
//! Split a neighborhood into weakly connected components and stamp
//! graph ids on their nodes and edges.

use indexmap::{IndexMap, IndexSet};
use petgraph::unionfind::UnionFind;

use crate::core::ids::IdAllocator;
use crate::core::model::Edge;
use crate::core::neighborhood::Neighborhood;
use crate::parsers::java_parser::DeclId;

/// Union-find grouping over one neighborhood
pub struct Partitioner<'a>
{
    ids: &'a IdAllocator,
    keep_isolated: bool,
}

impl<'a> Partitioner<'a>
{
    pub fn new(
        ids: &'a IdAllocator,
        keep_isolated: bool,
    ) -> Self
    {
        Self { ids, keep_isolated }
    }

    /// Assign graph ids in place and return how many groups were made.
    ///
    /// Edges group by the root of their source endpoint; groups get ids
    /// in order of first appearance. Seeds without edges stay unassigned
    /// unless `keep_isolated` is set, in which case each gets its own id.
    pub fn partition(
        &self,
        hood: &mut Neighborhood,
    ) -> usize
    {
        // Dense indices for every endpoint
        let endpoints: IndexSet<DeclId> = hood
            .edges
            .iter()
            .flat_map(|e| [e.source, e.destination])
            .collect();
        let index = |d: DeclId| {
            endpoints
                .get_index_of(&d)
                .unwrap_or_default()
        };

        let mut uf = UnionFind::<usize>::new(endpoints.len());
        for e in &hood.edges
        {
            uf.union(index(e.source), index(e.destination));
        }

        let mut groups: IndexMap<usize, u32> = IndexMap::new();
        let edges: Vec<Edge> = hood
            .edges
            .drain(..)
            .collect();

        for mut edge in edges
        {
            let root = uf.find_mut(index(edge.source));
            let gid = *groups
                .entry(root)
                .or_insert_with(|| {
                    self.ids
                        .next_graph_id()
                });

            edge.graph_id = Some(gid);
            for end in [edge.source, edge.destination]
            {
                if let Some(node) = hood
                    .nodes
                    .get_mut(&end)
                {
                    node.graph_id = Some(gid);
                }
            }
            hood.edges
                .insert(edge);
        }

        let mut count = groups.len();

        if self.keep_isolated
        {
            for node in hood
                .nodes
                .values_mut()
                .filter(|n| n.graph_id.is_none() && n.is_seed())
            {
                node.graph_id = Some(
                    self.ids
                        .next_graph_id(),
                );
                count += 1;
            }
        }

        count
    }
}
