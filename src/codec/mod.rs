/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Fixed-width little-endian integer codec.
//!
//! This module is the leaf of the whole crate: every other stage reads and
//! writes its binary records through the five width-specific wrappers
//! re-exported here (ENTITY, PREDICATE, BLOCK, BLOCK_OR_SINGLETON, K).
//!
//! ### Endianness
//! Every field is little-endian. Graph inputs routinely exceed 2^32 nodes
//! but never approach 2^40, so entity and block-or-singleton ids are
//! encoded in 5 bytes rather than 8 — a deliberate 3-byte-per-field saving
//! that matters at the multi-terabyte scale these files are produced at.
//!
//! ### EOF vs. truncation vs. I/O error
//! A read that consumes zero bytes before hitting end-of-stream is a
//! *clean EOF* and is reported as `Ok(None)` — it is the normal way a
//! record stream ends. A read that consumes one or more bytes and then
//! hits end-of-stream is a *truncated record*, reported as
//! [`crate::error::AssemblerError::TruncatedRecord`]. Anything else the
//! underlying reader/writer raises is an [`crate::error::AssemblerError::IoError`].

mod block;
mod block_or_singleton;
mod entity;
mod k;
mod predicate;

pub use block::{read_block, write_block};
pub use block_or_singleton::{read_block_or_singleton, write_block_or_singleton};
pub use entity::{read_entity, write_entity};
pub use k::{read_k, write_k};
pub use predicate::{read_predicate, write_predicate};

use crate::error::{AssemblerError, RecordIndex, Result};
use std::io::{Read, Write};
use std::path::Path;

/// Minimum buffer size mandated by the resource model (`spec.md` §5) for
/// streaming I/O, to amortize syscall overhead.
pub const STREAM_BUFFER_BYTES: usize = 128 * 1024;

/// Reads exactly `width` bytes into `buf[..width]`, distinguishing a clean
/// EOF (returns `Ok(false)`, no bytes consumed) from a truncated record
/// (returns `Err(TruncatedRecord)`) from a genuine I/O failure (returns
/// `Err(IoError)`). On success (`Ok(true)`) `buf[..width]` holds the bytes
/// read, in file order.
pub(crate) fn fill_or_eof<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    width: usize,
    stage: &'static str,
    path: &Path,
    at: RecordIndex,
) -> Result<bool> {
    debug_assert!(buf.len() >= width);
    let mut read = 0usize;
    while read < width {
        match reader.read(&mut buf[read..width]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(AssemblerError::io(stage, path, e)),
        }
    }
    if read == 0 {
        Ok(false)
    } else if read < width {
        Err(AssemblerError::TruncatedRecord {
            stage,
            path: path.to_path_buf(),
            at,
            expected: width - read,
        })
    } else {
        Ok(true)
    }
}

/// Writes `buf` in full, mapping any failure to [`AssemblerError::IoError`].
pub(crate) fn write_all<W: Write + ?Sized>(
    writer: &mut W,
    buf: &[u8],
    stage: &'static str,
    path: &Path,
) -> Result<()> {
    writer.write_all(buf).map_err(|e| AssemblerError::io(stage, path, e))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    pub fn dummy_path() -> PathBuf {
        PathBuf::from("<memory>")
    }
}
