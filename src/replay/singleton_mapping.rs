/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! `singleton_mapping-NNNNtoMMMM.bin`: for each level transition that
//! birthed new singletons, `⟨BLOCK parent_local, BLOCK_OR_SINGLETON count,
//! BLOCK_OR_SINGLETON child × count⟩` records naming exactly which nodes
//! were extracted from which parent. Needed because the plain
//! `mapping-*.bin` file only carries the `0` sentinel, not the node ids.

use crate::codec::block::write_block;
use crate::codec::block_or_singleton::{read_block_or_singleton, write_block_or_singleton};
use crate::error::{AssemblerError, RecordIndex, Result};
use crate::ids::{singleton_id, LocalBlockId, NodeId};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub fn write_to<W: Write + ?Sized>(
    writer: &mut W,
    records: &[(LocalBlockId, Vec<NodeId>)],
    stage: &'static str,
    path: &Path,
) -> Result<()> {
    for (parent_local, nodes) in records {
        write_block(writer, *parent_local, stage, path)?;
        write_block_or_singleton(writer, nodes.len() as i64, stage, path)?;
        for &n in nodes {
            write_block_or_singleton(writer, singleton_id(n), stage, path)?;
        }
    }
    Ok(())
}

pub struct SingletonMappingReader<R> {
    reader: R,
    path: PathBuf,
    at: u64,
}

impl<R: Read> SingletonMappingReader<R> {
    const STAGE: &'static str = "singleton_mapping";

    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            at: 0,
        }
    }

    /// Returns `(parent_local, singleton_nodes)`, or `None` at clean EOF.
    pub fn next_record(&mut self) -> Result<Option<(LocalBlockId, Vec<NodeId>)>> {
        let at = RecordIndex(self.at);
        let parent = match crate::codec::block::read_block(
            &mut self.reader,
            Self::STAGE,
            &self.path,
            at,
        )? {
            Some(p) => p,
            None => return Ok(None),
        };
        let count = read_block_or_singleton(&mut self.reader, Self::STAGE, &self.path, at)?
            .ok_or_else(|| AssemblerError::TruncatedRecord {
                stage: Self::STAGE,
                path: self.path.clone(),
                at,
                expected: 5,
            })?;
        let mut nodes = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let sid = read_block_or_singleton(&mut self.reader, Self::STAGE, &self.path, at)?
                .ok_or_else(|| AssemblerError::TruncatedRecord {
                    stage: Self::STAGE,
                    path: self.path.clone(),
                    at,
                    expected: 5,
                })?;
            nodes.push(crate::ids::node_of_singleton(sid));
        }
        self.at += 1;
        Ok(Some((parent, nodes)))
    }

    pub fn read_all(mut self) -> Result<Vec<(LocalBlockId, Vec<NodeId>)>> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record);
        }
        Ok(out)
    }
}

pub fn path_for(experiment_dir: &Path, from: crate::ids::Level, to: crate::ids::Level) -> PathBuf {
    experiment_dir
        .join("bisimulation")
        .join(format!("singleton_mapping-{from:04}to{to:04}.bin"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips() {
        let path = Path::new("test");
        let records = vec![(1u32, vec![5u64, 7u64])];
        let mut buf = Vec::new();
        write_to(&mut buf, &records, "test", path).unwrap();
        let mut reader = SingletonMappingReader::new(Cursor::new(buf), "test");
        let (parent, nodes) = reader.next_record().unwrap().unwrap();
        assert_eq!(parent, 1);
        assert_eq!(nodes, vec![5, 7]);
        assert!(reader.next_record().unwrap().is_none());
    }
}
