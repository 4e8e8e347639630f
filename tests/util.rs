//! Shared test utilities for integration tests
//!
//! Builds throwaway workspaces holding Java fixtures and bug-record
//! tables, and reads the produced CSV tables back.

#![allow(dead_code)]

use std::path::Path;

use assert_fs::prelude::*;

pub const BUG_HEADER: &str = "Project,Source-file,Hash,Long-Name,Parent,Number-Of-Bugs";

/// Fixture text by file name under tests/fixtures
pub fn fixture(name: &str) -> String
{
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).expect("read fixture")
}

/// Temp workspace with `fixtures` copied to the given relative paths
pub fn workspace(fixtures: &[(&str, &str)]) -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    for (name, rel) in fixtures
    {
        tmp.child(rel)
            .write_str(&fixture(name))
            .expect("write fixture");
    }

    tmp
}

/// Write a bug-record table; each row is `project,file,hash,long-name,parent,bugs`
pub fn write_bugs(
    tmp: &assert_fs::TempDir,
    rows: &[&str],
) -> std::path::PathBuf
{
    let mut body = String::from(BUG_HEADER);
    for row in rows
    {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');

    let child = tmp.child("bugs.csv");
    child
        .write_str(&body)
        .expect("write bugs");
    child
        .path()
        .to_path_buf()
}

/// Header plus rows of a produced CSV table, split on commas
pub fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>)
{
    let mut reader = csv::Reader::from_path(path).expect("open table");
    let header = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| {
            r.expect("row")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (header, rows)
}
