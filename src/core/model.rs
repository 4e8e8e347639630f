//! Filepath: src/core/model.rs
//! Graph entities produced by matching and neighborhood extraction.

use std::hash::{Hash, Hasher};

use crate::parsers::java_parser::DeclId;

/// A declaration tracked in one task's graph.
///
/// Identity is `decl`, the handle into the task's `SourceTree`; every
/// other field is payload.
#[derive(Debug, Clone)]
pub struct DeclarationNode
{
    /// Underlying declaration (identity)
    pub decl: DeclId,

    /// Process-wide id, assigned once at creation
    pub id: u32,

    pub project: String,
    pub hash: String,

    /// Qualified name of the owning type
    pub parent: String,

    /// Path of the copied class file, relative to the output directory
    pub class_source_file: String,

    /// `parent.name(T1, T2)` for seeds and discovered nodes alike
    pub signature: String,

    /// Long name of the bug record that seeded this node, if any
    pub long_name: Option<String>,

    /// Bug count, or -1 for nodes discovered only through expansion
    pub number_of_bugs: i64,

    /// Created from an input record (or as a prediction-mode seed)
    pub seed: bool,

    /// Cleared when the node must be dropped from output
    pub valid: bool,

    /// Constructor whose `super(...)` is its last statement
    pub explicit_super: bool,

    /// Component id, set by the partitioner
    pub graph_id: Option<u32>,
}

impl DeclarationNode
{
    /// Sentinel bug count for nodes not seeded from a record
    pub const DISCOVERED: i64 = -1;

    /// True when this node was seeded rather than discovered
    pub fn is_seed(&self) -> bool
    {
        self.seed
    }

    /// Fold a duplicate seed for the same declaration into this one.
    ///
    /// Bug counts add up; everything else keeps the first seed's values.
    pub fn absorb(
        &mut self,
        other: &DeclarationNode,
    )
    {
        debug_assert_eq!(self.decl, other.decl);
        if other.is_seed()
        {
            self.number_of_bugs = self.number_of_bugs.max(0) + other.number_of_bugs;
        }
    }
}

/// Directed call or construction edge between two declarations
#[derive(Debug, Clone, Copy)]
pub struct Edge
{
    pub source: DeclId,
    pub destination: DeclId,
    pub graph_id: Option<u32>,
}

impl Edge
{
    pub fn new(
        source: DeclId,
        destination: DeclId,
    ) -> Self
    {
        Self { source, destination, graph_id: None }
    }
}

// Edges are deduplicated on endpoints only; graph ids do not take part
impl PartialEq for Edge
{
    fn eq(
        &self,
        other: &Self,
    ) -> bool
    {
        self.source == other.source && self.destination == other.destination
    }
}

impl Eq for Edge {}

impl Hash for Edge
{
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    )
    {
        self.source
            .hash(state);
        self.destination
            .hash(state);
    }
}
