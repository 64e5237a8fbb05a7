/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{fill_or_eof, write_all};
use crate::error::{RecordIndex, Result};
use crate::ids::NodeId;
use std::io::{Read, Write};
use std::path::Path;

const WIDTH: usize = 5;

/// Reads a little-endian ENTITY (5-byte unsigned node id). `Ok(None)` means
/// clean end of stream.
pub fn read_entity<R: Read + ?Sized>(
    reader: &mut R,
    stage: &'static str,
    path: &Path,
    at: RecordIndex,
) -> Result<Option<NodeId>> {
    let mut buf = [0u8; WIDTH];
    if !fill_or_eof(reader, &mut buf, WIDTH, stage, path, at)? {
        return Ok(None);
    }
    let mut value: u64 = 0;
    for (i, byte) in buf.iter().enumerate() {
        value |= (*byte as u64) << (i * 8);
    }
    Ok(Some(value))
}

pub fn write_entity<W: Write + ?Sized>(
    writer: &mut W,
    value: NodeId,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_support::dummy_path;
    use std::io::Cursor;

    #[test]
    fn round_trips() {
        let path = dummy_path();
        for value in [0u64, 1, 255, 256, (1u64 << 40) - 1] {
            let mut buf = Vec::new();
            write_entity(&mut buf, value, "test", &path).unwrap();
            assert_eq!(buf.len(), WIDTH);
            let mut cur = Cursor::new(buf);
            let read = read_entity(&mut cur, "test", &path, RecordIndex(0))
                .unwrap()
                .unwrap();
            assert_eq!(read, value);
        }
    }

    #[test]
    fn clean_eof_on_empty_stream() {
        let path = dummy_path();
        let mut cur = Cursor::new(Vec::<u8>::new());
        assert!(read_entity(&mut cur, "test", &path, RecordIndex(0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let path = dummy_path();
        let mut cur = Cursor::new(vec![1u8, 2, 3]);
        let err = read_entity(&mut cur, "test", &path, RecordIndex(0)).unwrap_err();
        assert!(matches!(err, crate::error::AssemblerError::TruncatedRecord { .. }));
    }
}
