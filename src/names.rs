/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Bidirectional entity/predicate name tables loaded from `entity2ID.txt`
//! and `rel2ID.txt`: line-delimited `⟨name⟩ ⟨id⟩` ASCII files. Ambient
//! input, not part of the condensed graph itself — used only by the
//! quotient extractor's human-facing output.

use crate::error::{AssemblerError, RecordIndex, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[derive(Debug, Default)]
pub struct NameTable<Id> {
    name_to_id: HashMap<String, Id>,
    id_to_name: HashMap<Id, String>,
}

impl<Id> NameTable<Id>
where
    Id: Copy + Eq + std::hash::Hash + std::str::FromStr,
{
    pub fn load<R: Read>(reader: R, stage: &'static str, path: &Path) -> Result<Self> {
        let mut table = Self {
            name_to_id: HashMap::new(),
            id_to_name: HashMap::new(),
        };
        let buffered = BufReader::new(reader);
        for (line_no, line) in buffered.lines().enumerate() {
            let line = line.map_err(|e| AssemblerError::io(stage, path, e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let name = parts.next().ok_or_else(|| malformed(stage, path, line_no))?;
            let id_str = parts.next().ok_or_else(|| malformed(stage, path, line_no))?;
            if parts.next().is_some() {
                return Err(malformed(stage, path, line_no));
            }
            let id: Id = id_str
                .parse()
                .map_err(|_| malformed(stage, path, line_no))?;
            table.name_to_id.insert(name.to_string(), id);
            table.id_to_name.insert(id, name.to_string());
        }
        Ok(table)
    }

    pub fn name_of(&self, id: Id) -> Option<&str> {
        self.id_to_name.get(&id).map(|s| s.as_str())
    }

    pub fn id_of(&self, name: &str) -> Option<Id> {
        self.name_to_id.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }
}

fn malformed(stage: &'static str, path: &Path, line_no: usize) -> AssemblerError {
    AssemblerError::InvariantViolation {
        stage,
        path: path.to_path_buf(),
        at: RecordIndex(line_no as u64),
        detail: "expected a `<name> <id>` line in entity2ID.txt/rel2ID.txt".to_string(),
    }
}

/// `node_name` with an ambient name table: falls back to the decimal node
/// id, per §4.7, when no table is loaded or the id is absent from it.
pub fn node_name(table: Option<&NameTable<crate::ids::NodeId>>, node: crate::ids::NodeId) -> String {
    table
        .and_then(|t| t.name_of(node))
        .map(|s| s.to_string())
        .unwrap_or_else(|| node.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn loads_name_id_pairs_and_tolerates_trailing_blank_lines() {
        let data = "alice 0\nbob 1\n\n";
        let table: NameTable<u64> =
            NameTable::load(Cursor::new(data), "test", Path::new("entity2ID.txt")).unwrap();
        assert_eq!(table.id_of("alice"), Some(0));
        assert_eq!(table.name_of(1), Some("bob"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn rejects_malformed_lines() {
        let data = "alice\n";
        let result: Result<NameTable<u64>> =
            NameTable::load(Cursor::new(data), "test", Path::new("entity2ID.txt"));
        assert!(result.is_err());
    }
}
