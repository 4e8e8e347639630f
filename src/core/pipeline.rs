//! Filepath: src/core/pipeline.rs
//! Batch orchestration.
//!
//! Training mode groups bug records by (project, hash, source file) and
//! runs one task per group on a bounded rayon pool: match long names,
//! expand neighborhoods, filter, partition, then materialize rows and
//! snippet files. Prediction mode (input ending in `.java`) seeds every
//! method of a single file. Task failures and panics are logged and
//! produce no output; they never stop sibling tasks.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::core::ids::IdAllocator;
use crate::core::matcher::NameMatcher;
use crate::core::model::DeclarationNode;
use crate::core::neighborhood::{Neighborhood, NeighborhoodExtractor, NodeTemplate};
use crate::core::partition::Partitioner;
use crate::core::records::{BugRecord, EdgeRow, NodeRow, PredictionNodeRow, read_bug_records, write_table};
use crate::infra::config::Config;
use crate::infra::io::{copy_once, read_source, write_file};
use crate::parsers::java_parser::{DeclKind, JavaSourceParser, SourceTree};
use crate::parsers::resolver::ScopeResolver;

/// Where to read from and write to, plus effective configuration
#[derive(Debug, Clone)]
pub struct RunOptions
{
    /// Bug-record CSV, or a single `.java` file for prediction
    pub input: PathBuf,

    /// Base directory for the records' source paths
    pub working_dir: PathBuf,

    /// Output directory (created if missing)
    pub output: PathBuf,

    pub config: Config,
}

/// Counts reported at the end of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary
{
    pub tasks: usize,
    pub failed: usize,
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode
{
    Training,
    Prediction,
}

impl Mode
{
    /// A `.java` input selects prediction mode
    pub fn detect(input: &Path) -> Self
    {
        if input
            .extension()
            .is_some_and(|e| e == "java")
        {
            Mode::Prediction
        }
        else
        {
            Mode::Training
        }
    }
}

/// Bug records sharing one (project, hash, source file)
#[derive(Debug, Clone)]
pub struct Task
{
    pub project: String,
    pub hash: String,
    pub source_file: String,
    pub records: Vec<BugRecord>,
}

impl Task
{
    fn label(&self) -> String
    {
        format!("{}@{}:{}", self.project, self.hash, self.source_file)
    }

    /// Stable file name for this task's copied class file
    fn class_key(&self) -> String
    {
        let mut hasher = blake3::Hasher::new();
        for part in [&self.project, &self.hash, &self.source_file]
        {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }

        let hex = hasher
            .finalize()
            .to_hex();
        hex.as_str()[..32].to_string()
    }
}

/// Group records in first-seen order
pub fn group_records(records: Vec<BugRecord>) -> Vec<Task>
{
    let mut groups: IndexMap<(String, String, String), Vec<BugRecord>> = IndexMap::new();
    for r in records
    {
        groups
            .entry((r.project.clone(), r.hash.clone(), r.source_file.clone()))
            .or_default()
            .push(r);
    }

    groups
        .into_iter()
        .map(|((project, hash, source_file), records)| Task { project, hash, source_file, records })
        .collect()
}

#[derive(Debug, Default)]
struct TaskOutput
{
    nodes: Vec<NodeRow>,
    edges: Vec<EdgeRow>,
}

/// Run in the mode selected by the input path
pub fn run(
    opts: &RunOptions,
    ids: &IdAllocator,
) -> Result<RunSummary>
{
    std::fs::create_dir_all(&opts.output)
        .with_context(|| format!("Failed to create output directory {}", opts.output.display()))?;

    match Mode::detect(&opts.input)
    {
        Mode::Training => run_training(opts, ids),
        Mode::Prediction => run_prediction(opts, ids),
    }
}

fn run_training(
    opts: &RunOptions,
    ids: &IdAllocator,
) -> Result<RunSummary>
{
    let records = read_bug_records(&opts.input)?;
    let record_count = records.len();
    let tasks = group_records(records);
    info!(records = record_count, tasks = tasks.len(), workers = opts.config.workers, "starting training run");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(
            opts.config
                .workers
                .max(1),
        )
        .build()
        .context("Failed to build worker pool")?;
    let grace = Duration::from_secs(
        opts.config
            .shutdown_grace_secs,
    );

    // Collect keeps task order, so output is deterministic
    let results: Vec<Option<TaskOutput>> = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| isolate(&task.label(), grace, || training_task(task, opts, ids)))
            .collect()
    });

    let mut summary = RunSummary { tasks: tasks.len(), ..RunSummary::default() };
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for result in results
    {
        match result
        {
            Some(out) =>
            {
                nodes.extend(out.nodes);
                edges.extend(out.edges);
            }
            None => summary.failed += 1,
        }
    }

    summary.nodes = nodes.len();
    summary.edges = edges.len();
    write_table(&nodes, &opts.output.join("nodes.csv"))?;
    write_table(&edges, &opts.output.join("edges.csv"))?;

    info!(
        tasks = summary.tasks,
        failed = summary.failed,
        nodes = summary.nodes,
        edges = summary.edges,
        "training run finished"
    );
    Ok(summary)
}

/// Run one task, turning errors and panics into a logged `None`
fn isolate<F>(
    label: &str,
    grace: Duration,
    task: F,
) -> Option<TaskOutput>
where
    F: FnOnce() -> Result<TaskOutput>,
{
    let started = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(task));

    let elapsed = started.elapsed();
    if elapsed > grace
    {
        warn!(task = label, secs = elapsed.as_secs(), "task ran past the shutdown grace period");
    }

    match outcome
    {
        Ok(Ok(out)) => Some(out),
        Ok(Err(e)) =>
        {
            error!(task = label, "task failed: {e:#}");
            None
        }
        Err(payload) =>
        {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| {
                    payload
                        .downcast_ref::<String>()
                        .cloned()
                })
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(task = label, "task panicked: {msg}");
            None
        }
    }
}

fn training_task(
    task: &Task,
    opts: &RunOptions,
    ids: &IdAllocator,
) -> Result<TaskOutput>
{
    let label = task.label();
    info!(task = %label, records = task.records.len(), "processing task");

    let path = opts
        .working_dir
        .join(&task.source_file);
    let source = read_source(&path)?;
    let tree = JavaSourceParser::new()
        .parse(&source)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let class_rel = format!("{}/classes/{}.java", task.project, task.class_key());
    copy_once(&path, &opts.output, Path::new(&class_rel))?;

    let template = NodeTemplate {
        project: task
            .project
            .clone(),
        hash: task
            .hash
            .clone(),
        class_source_file: class_rel,
        qualify_signatures: true,
    };

    // One seed per record that matches; misses are skipped
    let matcher = NameMatcher::new(&tree);
    let mut seeds = Vec::new();
    for record in &task.records
    {
        match matcher.find(&record.long_name)
        {
            Ok(m) => seeds.push(DeclarationNode {
                decl: m.decl,
                id: ids.next_node_id(),
                project: record
                    .project
                    .clone(),
                hash: record
                    .hash
                    .clone(),
                parent: record
                    .parent
                    .clone(),
                class_source_file: template
                    .class_source_file
                    .clone(),
                signature: format!("{}.{}", record.parent, m.signature),
                long_name: Some(
                    record
                        .long_name
                        .clone(),
                ),
                number_of_bugs: record.number_of_bugs,
                seed: true,
                valid: true,
                explicit_super: false,
                graph_id: None,
            }),
            Err(e) => warn!(task = %label, long_name = %record.long_name, "skipping record: {e}"),
        }
    }

    if seeds.is_empty()
    {
        info!(task = %label, "no record matched a declaration");
        return Ok(TaskOutput::default());
    }

    let hood = expand(&tree, seeds, &template, &opts.config, ids);

    let mut out = TaskOutput::default();
    for node in hood
        .nodes
        .values()
        .filter(|n| n.graph_id.is_some())
    {
        let method_rel = format!("{}/methods/{}.java", node.project, node.id);
        write_file(&opts.output, Path::new(&method_rel), tree.text_of(node.decl))?;

        out.nodes
            .push(NodeRow {
                id: node.id,
                project: node
                    .project
                    .clone(),
                class_source_file: node
                    .class_source_file
                    .clone(),
                method_source_file: method_rel,
                hash: node
                    .hash
                    .clone(),
                signature: node
                    .signature
                    .clone(),
                parent: node
                    .parent
                    .clone(),
                number_of_bugs: node.number_of_bugs,
                graph_id: node.graph_id,
            });
    }
    out.edges = edge_rows(&hood);

    info!(task = %label, nodes = out.nodes.len(), edges = out.edges.len(), "task finished");
    Ok(out)
}

fn run_prediction(
    opts: &RunOptions,
    ids: &IdAllocator,
) -> Result<RunSummary>
{
    info!(input = %opts.input.display(), "starting prediction run");

    let source = read_source(&opts.input)?;
    let tree = JavaSourceParser::new()
        .parse(&source)
        .with_context(|| format!("Failed to parse {}", opts.input.display()))?;

    let template = NodeTemplate {
        project: String::new(),
        hash: String::new(),
        class_source_file: String::new(),
        qualify_signatures: false,
    };

    // Every method is a seed
    let seeds: Vec<DeclarationNode> = tree
        .declarations()
        .iter()
        .filter(|d| d.kind == DeclKind::Method)
        .map(|d| {
            let mut node = template.discovered(&tree, d.id, ids);
            node.seed = true;
            node
        })
        .collect();
    debug!(seeds = seeds.len(), "seeded every method");

    // Every surviving method gets a row; methods without edges form their own groups
    let config = Config { keep_isolated: true, ..opts.config.clone() };
    let hood = expand(&tree, seeds, &template, &config, ids);

    let mut nodes = Vec::new();
    for node in hood
        .nodes
        .values()
        .filter(|n| n.graph_id.is_some())
    {
        let method_rel = format!("methods/{}.java", node.id);
        write_file(&opts.output, Path::new(&method_rel), tree.text_of(node.decl))?;

        nodes.push(PredictionNodeRow {
            id: node.id,
            method_source_file: method_rel,
            signature: node
                .signature
                .clone(),
            graph_id: node.graph_id,
        });
    }
    let edges = edge_rows(&hood);

    write_table(&nodes, &opts.output.join("nodes.csv"))?;
    write_table(&edges, &opts.output.join("edges.csv"))?;

    let summary = RunSummary { tasks: 1, failed: 0, nodes: nodes.len(), edges: edges.len() };
    info!(nodes = summary.nodes, edges = summary.edges, "prediction run finished");
    Ok(summary)
}

/// Extract, filter and partition around `seeds`
fn expand(
    tree: &SourceTree,
    seeds: Vec<DeclarationNode>,
    template: &NodeTemplate,
    config: &Config,
    ids: &IdAllocator,
) -> Neighborhood
{
    let mut hood = NeighborhoodExtractor::new(tree, ScopeResolver, ids).extract(seeds, template);

    let marker = config
        .exclude_marker
        .as_str();
    hood.filter(|n| {
        !marker.is_empty()
            && n.signature
                .contains(marker)
    });

    let groups = Partitioner::new(ids, config.keep_isolated).partition(&mut hood);
    debug!(nodes = hood.nodes.len(), edges = hood.edges.len(), groups, "neighborhood partitioned");

    hood
}

fn edge_rows(hood: &Neighborhood) -> Vec<EdgeRow>
{
    hood.edges
        .iter()
        .filter_map(|e| {
            let source = hood
                .nodes
                .get(&e.source)?;
            let destination = hood
                .nodes
                .get(&e.destination)?;
            Some(EdgeRow { source: source.id, destination: destination.id, graph_id: e.graph_id })
        })
        .collect()
}
