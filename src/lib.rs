//! **sdpgraph** - Build defect-prediction graph datasets from Java sources
//!
//! Bug records name buggy methods by JVM long name. Each name is matched to
//! its source declaration, expanded into a call neighborhood, and split into
//! connected components written out as node and edge tables.

/// Command-line interface with clap integration
pub mod cli;

/// Core pipeline - matching, neighborhood extraction and partitioning
pub mod core {
    /// JVM parameter-descriptor decoding
    pub mod descriptor;
    pub use descriptor::{DescriptorError, ParameterType, TypeKind, parse_parameters};

    /// Long-name to declaration matching with anonymous-class ordinals
    pub mod matcher;
    pub use matcher::{MatchError, NameMatch, NameMatcher};

    /// Node and edge entities
    pub mod model;
    pub use model::{DeclarationNode, Edge};

    /// Atomic node-id and graph-id counters
    pub mod ids;
    pub use ids::IdAllocator;

    /// Depth-first call-neighborhood extraction with heuristic fallback
    pub mod neighborhood;
    pub use neighborhood::{Neighborhood, NeighborhoodExtractor, NodeTemplate};

    /// Union-find component partitioning
    pub mod partition;
    pub use partition::Partitioner;

    /// CSV bug records and output rows
    pub mod records;
    pub use records::{BugRecord, EdgeRow, NodeRow, PredictionNodeRow};

    /// Batch orchestration over a rayon worker pool
    pub mod pipeline;
    pub use pipeline::{Mode, RunOptions, RunSummary};
}

/// Language processing - Java declaration arena and reference resolution
pub mod parsers {
    /// tree-sitter-java backed Source Parser
    pub mod java_parser;
    pub use java_parser::{DeclId, DeclKind, Declaration, JavaSourceParser, ParseFailure, SourceTree};

    /// Scope-chain resolution of calls and method references
    pub mod resolver;
    pub use resolver::{Resolver, ScopeResolver};
}

/// Infrastructure - Configuration, I/O, and utilities
pub mod infra {
    /// Layered configuration (file, environment, flags)
    pub mod config;
    pub use config::{Config, load_config};

    /// Source reading and snippet materialization
    pub mod io;

    /// Name and tree-sitter node helpers
    pub mod utils;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli};
pub use core::{IdAllocator, NameMatcher, RunOptions, RunSummary};
pub use infra::{Config, load_config};
pub use parsers::{JavaSourceParser, SourceTree};
