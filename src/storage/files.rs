//! Input file loading
//!
//! Tables (milestones, preconditions) are read either as a JSON array or,
//! for `.jsonl` files, one JSON object per line. Plans are a single JSON
//! document. Files are read under a shared lock so a simulator rewriting
//! them in place is never observed half-written.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;

use crate::check::PreconditionRow;
use crate::domain::{MilestoneRow, MilestoneTable, Plan};

fn open_shared(path: &Path) -> Result<File> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    file.lock_shared()
        .with_context(|| format!("Failed to acquire read lock on {}", path.display()))?;
    Ok(file)
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jsonl")
}

/// Reads one JSON document
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut file = open_shared(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Reads table rows from a JSON array or a JSONL file
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !is_jsonl(path) {
        return read_json(path);
    }

    let file = open_shared(path)?;
    let reader = BufReader::new(&file);
    let mut rows = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

        if line.trim().is_empty() {
            continue;
        }

        let row = serde_json::from_str(&line).with_context(|| {
            format!("Failed to parse row at {}:{}", path.display(), line_num + 1)
        })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Loads and validates a plan
pub fn load_plan(path: &Path) -> Result<Plan> {
    let plan: Plan = read_json(path)?;
    plan.validate()
        .with_context(|| format!("Invalid plan: {}", path.display()))?;

    log::debug!(
        "loaded plan with {} transitions from {}",
        plan.transitions.len(),
        path.display()
    );
    Ok(plan)
}

/// Loads the milestone table
pub fn load_milestones(path: &Path) -> Result<MilestoneTable> {
    let rows: Vec<MilestoneRow> = read_rows(path)?;
    MilestoneTable::from_rows(rows)
        .with_context(|| format!("Invalid milestone table: {}", path.display()))
}

/// Loads the process precondition table
pub fn load_preconditions(path: &Path) -> Result<Vec<PreconditionRow>> {
    read_rows(path)
}
