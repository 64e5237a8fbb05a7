/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{fill_or_eof, write_all};
use crate::error::{RecordIndex, Result};
use crate::ids::SummaryId;
use std::io::{Read, Write};
use std::path::Path;

const WIDTH: usize = 5;

/// Reads a little-endian BLOCK_OR_SINGLETON: a 5-byte two's-complement
/// signed integer, sign-extended to `i64`. Positive values are
/// non-singleton summary ids, negative values are singletons, `0` is the
/// universal-block sentinel. `Ok(None)` means clean end of stream.
pub fn read_block_or_singleton<R: Read + ?Sized>(
    reader: &mut R,
    stage: &'static str,
    path: &Path,
    at: RecordIndex,
) -> Result<Option<SummaryId>> {
    let mut buf = [0u8; WIDTH];
    if !fill_or_eof(reader, &mut buf, WIDTH, stage, path, at)? {
        return Ok(None);
    }
    let mut value: i64 = 0;
    for (i, byte) in buf.iter().enumerate() {
        value |= (*byte as i64) << (i * 8);
    }
    // Sign bit of the 40-bit value lives in the top bit of the last byte.
    if (buf[WIDTH - 1] as i8) < 0 {
        value |= !0i64 << (WIDTH * 8);
    }
    Ok(Some(value))
}

pub fn write_block_or_singleton<W: Write + ?Sized>(
    writer: &mut W,
    value: SummaryId,
    stage: &'static str,
    path: &Path,
) -> Result<()> {
    let mut buf = [0u8; WIDTH];
    let mut v = value;
    for byte in buf.iter_mut() {
        *byte = (v & 0xFF) as u8;
        v >>= 8;
    }
    write_all(writer, &buf, stage, path)
}
