/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{fill_or_eof, write_all};
use crate::error::{RecordIndex, Result};
use crate::ids::LocalBlockId;
use std::io::{Read, Write};
use std::path::Path;

const WIDTH: usize = 4;

/// Reads a little-endian BLOCK (4-byte unsigned local block id). `Ok(None)`
/// means clean end of stream.
pub fn read_block<R: Read + ?Sized>(
    reader: &mut R,
    stage: &'static str,
    path: &Path,
    at: RecordIndex,
) -> Result<Option<LocalBlockId>> {
    let mut buf = [0u8; WIDTH];
    if !fill_or_eof(reader, &mut buf, WIDTH, stage, path, at)? {
        return Ok(None);
    }
    Ok(Some(u32::from_le_bytes(buf)))
}

pub fn write_block<W: Write + ?Sized>(
    writer: &mut W,
    value: LocalBlockId,
    stage: &'static str,
    path: &Path,
) -> Result<()> {
    write_all(writer, &value.to_le_bytes(), stage, path)
}
