//! Filepath: src/core/records.rs
//! Tabular records: bug reports in, node and edge tables out.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One known-buggy declaration from the input table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BugRecord
{
    #[serde(rename = "Project")]
    pub project: String,

    /// Source path relative to the working directory
    #[serde(rename = "Source-file")]
    pub source_file: String,

    #[serde(rename = "Hash")]
    pub hash: String,

    #[serde(rename = "Long-Name")]
    pub long_name: String,

    #[serde(rename = "Parent")]
    pub parent: String,

    #[serde(rename = "Number-Of-Bugs")]
    pub number_of_bugs: i64,
}

/// Output row for a node in training mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeRow
{
    pub id: u32,
    pub project: String,
    pub class_source_file: String,
    pub method_source_file: String,
    pub hash: String,
    pub signature: String,
    pub parent: String,
    pub number_of_bugs: i64,
    pub graph_id: Option<u32>,
}

/// Output row for a node in prediction mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PredictionNodeRow
{
    pub id: u32,
    pub method_source_file: String,
    pub signature: String,
    pub graph_id: Option<u32>,
}

/// Output row for an edge, referencing node ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EdgeRow
{
    pub source: u32,
    pub destination: u32,
    pub graph_id: Option<u32>,
}

/// Read every bug record from a CSV file with a header row
pub fn read_bug_records(path: &Path) -> Result<Vec<BugRecord>>
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open bug records {}", path.display()))?;

    let mut out = Vec::new();
    for (i, row) in reader
        .deserialize()
        .enumerate()
    {
        // Row numbers are 1-based and skip the header
        let record: BugRecord =
            row.with_context(|| format!("Malformed bug record at row {} of {}", i + 2, path.display()))?;
        out.push(record);
    }

    Ok(out)
}

/// Serialize `rows` as CSV (header first) into `output_path`
pub fn write_table<T: Serialize>(
    rows: &[T],
    output_path: &Path,
) -> Result<()>
{
    // Create parent directories if needed
    if let Some(parent) = output_path.parent()
        && !parent
            .as_os_str()
            .is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file =
        File::create(output_path).with_context(|| format!("Failed to create {}", output_path.display()))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    for row in rows
    {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", output_path.display()))?;
    }

    // Flush the csv buffer, then the file buffer
    let mut inner = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush {}: {}", output_path.display(), e.error()))?;
    inner
        .flush()
        .with_context(|| format!("Failed to flush {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_headers_and_trims_fields()
    {
        let dir = TempDir::new().unwrap();
        let path = dir
            .path()
            .join("bugs.csv");
        std::fs::write(
            &path,
            "Project,Source-file,Hash,Long-Name,Parent,Number-Of-Bugs\n\
             demo, src/A.java ,abc,p.A.f()V,p.A,3\n",
        )
        .unwrap();

        let records = read_bug_records(&path).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_file, "src/A.java");
        assert_eq!(records[0].number_of_bugs, 3);
    }

    #[test]
    fn malformed_rows_report_their_position()
    {
        let dir = TempDir::new().unwrap();
        let path = dir
            .path()
            .join("bugs.csv");
        std::fs::write(
            &path,
            "Project,Source-file,Hash,Long-Name,Parent,Number-Of-Bugs\n\
             demo,A.java,abc,p.A.f()V,p.A,many\n",
        )
        .unwrap();

        let err = read_bug_records(&path).unwrap_err();
        assert!(
            format!("{err:#}")
                .contains("row 2")
        );
    }

    #[test]
    fn writes_kebab_case_headers()
    {
        let dir = TempDir::new().unwrap();
        let path = dir
            .path()
            .join("out/edges.csv");

        write_table(&[EdgeRow { source: 1, destination: 2, graph_id: Some(0) }], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "source,destination,graph-id\n1,2,0\n");
    }
}
