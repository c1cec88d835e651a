//! lzop container framing around LZO1X-1 blocks
//!
//! Layout written by [`LzopWriter`], all integers big-endian:
//!
//! ```text
//! magic(9) | version(2) lib_version(2) version_needed(2) method(1) level(1)
//!          | flags(4) mode(4) mtime_low(4) mtime_high(4) name_len(1)
//!          | header_adler32(4)
//! block*   | d_len(4) c_len(4) d_adler32(4) [c_adler32(4)] data(c_len)
//! eos      | 0u32
//! ```
//!
//! A block whose compressed form is not smaller than its input is stored raw
//! with `c_len == d_len` and carries no `c_adler32`. Without the trailing zero length `lzop -d` reports
//! a truncated archive.

use std::io::{self, Write};

use chrono::Utc;

const LZOP_MAGIC: [u8; 9] = [0x89, b'L', b'Z', b'O', 0x00, 0x0d, 0x0a, 0x1a, 0x0a];
const LZOP_VERSION: u16 = 0x1030;
const LZO_LIB_VERSION: u16 = 0x2080;
const LZOP_VERSION_NEEDED: u16 = 0x0940;
const METHOD_LZO1X_1: u8 = 1;
const COMPRESSION_LEVEL: u8 = 5;

const F_ADLER32_D: u32 = 0x0000_0001;
const F_ADLER32_C: u32 = 0x0000_0002;
const F_H_FILTER: u32 = 0x0000_0800;
const F_CRC32_D: u32 = 0x0000_0100;
const F_CRC32_C: u32 = 0x0000_0200;
const F_H_CRC32: u32 = 0x0000_1000;
const F_OS_UNIX: u32 = 0x0300_0000;

const FILE_MODE: u32 = 0o100644;

/// Largest uncompressed block, matching lzop's default
pub const BLOCK_SIZE: usize = 256 * 1024;

/// Streaming lzop writer
///
/// Input is buffered into [`BLOCK_SIZE`] blocks. Call [`LzopWriter::finish`]
/// to write the last block and the end-of-stream marker; a writer dropped
/// without finishing does it on a best-effort basis.
pub struct LzopWriter<W: Write> {
    inner: Option<W>,
    block: Vec<u8>,
    header_written: bool,
    finished: bool,
}

impl<W: Write> LzopWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Some(inner),
            block: Vec::with_capacity(BLOCK_SIZE),
            header_written: false,
            finished: false,
        }
    }

    fn inner_mut(&mut self) -> io::Result<&mut W> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "lzop writer already finished"))
    }

    fn write_header(&mut self) -> io::Result<()> {
        if self.header_written {
            return Ok(());
        }

        let mtime = Utc::now().timestamp().max(0) as u64;
        let mut header = Vec::with_capacity(32);
        header.extend_from_slice(&LZOP_VERSION.to_be_bytes());
        header.extend_from_slice(&LZO_LIB_VERSION.to_be_bytes());
        header.extend_from_slice(&LZOP_VERSION_NEEDED.to_be_bytes());
        header.push(METHOD_LZO1X_1);
        header.push(COMPRESSION_LEVEL);
        header.extend_from_slice(&(F_ADLER32_D | F_ADLER32_C | F_OS_UNIX).to_be_bytes());
        header.extend_from_slice(&FILE_MODE.to_be_bytes());
        header.extend_from_slice(&(mtime as u32).to_be_bytes());
        header.extend_from_slice(&((mtime >> 32) as u32).to_be_bytes());
        header.push(0); // no file name
        let checksum = adler::adler32_slice(&header);

        let inner = self.inner_mut()?;
        inner.write_all(&LZOP_MAGIC)?;
        inner.write_all(&header)?;
        inner.write_all(&checksum.to_be_bytes())?;

        self.header_written = true;
        Ok(())
    }

    fn flush_block(&mut self) -> io::Result<()> {
        self.write_header()?;
        if self.block.is_empty() {
            return Ok(());
        }

        let block = std::mem::take(&mut self.block);
        let compressed = lzokay_native::compress(&block).map_err(|e| {
            io::Error::new(io::ErrorKind::Other, format!("lzo compression failed: {:?}", e))
        })?;
        let payload: &[u8] = if compressed.len() < block.len() {
            &compressed
        } else {
            &block
        };

        let inner = self.inner_mut()?;
        inner.write_all(&(block.len() as u32).to_be_bytes())?;
        inner.write_all(&(payload.len() as u32).to_be_bytes())?;
        inner.write_all(&adler::adler32_slice(&block).to_be_bytes())?;
        if payload.len() < block.len() {
            inner.write_all(&adler::adler32_slice(payload).to_be_bytes())?;
        }
        inner.write_all(payload)?;

        self.block = block;
        self.block.clear();
        Ok(())
    }

    /// Write pending data and the end-of-stream marker
    ///
    /// Calling this more than once is a no-op.
    pub fn try_finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.flush_block()?;
        let inner = self.inner_mut()?;
        inner.write_all(&0u32.to_be_bytes())?;
        inner.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Finish the stream and return the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.try_finish()?;
        self.inner
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "lzop writer already finished"))
    }
}

impl<W: Write> Write for LzopWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.finished {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "write after lzop end-of-stream",
            ));
        }
        let room = BLOCK_SIZE - self.block.len();
        let take = room.min(buf.len());
        self.block.extend_from_slice(&buf[..take]);
        if self.block.len() == BLOCK_SIZE {
            self.flush_block()?;
        }
        Ok(take)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner_mut()?.flush()
    }
}

impl<W: Write> Drop for LzopWriter<W> {
    fn drop(&mut self) {
        if self.inner.is_some() {
            let _ = self.try_finish();
        }
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> io::Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "truncated lzop stream",
            ));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn u8(&mut self) -> io::Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> io::Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> io::Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

/// LZO1X decompression that reports malformed input as `InvalidData`
///
/// The decompressor indexes out of bounds on some malformed blocks, so a
/// panic is caught and turned into an error.
fn decompress_block(data: &[u8], d_len: usize) -> io::Result<Vec<u8>> {
    match std::panic::catch_unwind(|| lzokay_native::decompress_all(data, Some(d_len))) {
        Ok(Ok(block)) => Ok(block),
        Ok(Err(e)) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("lzo decompression failed: {:?}", e),
        )),
        Err(_) => Err(invalid("lzo decompression failed: malformed block")),
    }
}

/// Decode a complete lzop stream written with Adler-32 checksums
///
/// Fails with `UnexpectedEof` when the end-of-stream marker is missing.
pub fn decode(stream: &[u8]) -> io::Result<Vec<u8>> {
    let mut cur = Cursor { buf: stream };
    if cur.take(LZOP_MAGIC.len())? != LZOP_MAGIC {
        return Err(invalid("not an lzop stream"));
    }

    let header_start = cur.buf;
    let version = cur.u16()?;
    let _lib_version = cur.u16()?;
    if version < 0x0940 {
        return Err(invalid("lzop header version too old"));
    }
    let _version_needed = cur.u16()?;
    let _method = cur.u8()?;
    let _level = cur.u8()?;
    let flags = cur.u32()?;
    if flags & (F_H_FILTER | F_H_CRC32 | F_CRC32_D | F_CRC32_C) != 0 {
        return Err(invalid("unsupported lzop flags"));
    }
    let _mode = cur.u32()?;
    let _mtime_low = cur.u32()?;
    let _mtime_high = cur.u32()?;
    let name_len = cur.u8()? as usize;
    cur.take(name_len)?;
    let header_len = header_start.len() - cur.buf.len();
    let expected = adler::adler32_slice(&header_start[..header_len]);
    if cur.u32()? != expected {
        return Err(invalid("lzop header checksum mismatch"));
    }

    let mut out = Vec::new();
    loop {
        let d_len = cur.u32()? as usize;
        if d_len == 0 {
            return Ok(out);
        }
        let c_len = cur.u32()? as usize;
        let d_adler = if flags & F_ADLER32_D != 0 {
            Some(cur.u32()?)
        } else {
            None
        };
        let c_adler = if flags & F_ADLER32_C != 0 && c_len < d_len {
            Some(cur.u32()?)
        } else {
            None
        };

        let data = cur.take(c_len)?;
        if let Some(sum) = c_adler {
            if adler::adler32_slice(data) != sum {
                return Err(invalid("lzop compressed block checksum mismatch"));
            }
        }
        let block = if c_len < d_len {
            decompress_block(data, d_len)?
        } else {
            data.to_vec()
        };

        if block.len() != d_len {
            return Err(invalid("lzop block length mismatch"));
        }
        if let Some(sum) = d_adler {
            if adler::adler32_slice(&block) != sum {
                return Err(invalid("lzop block checksum mismatch"));
            }
        }
        out.extend_from_slice(&block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(data: &[u8]) -> Vec<u8> {
        let mut writer = LzopWriter::new(Vec::new());
        writer.write_all(data).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_stream_starts_with_magic() {
        let out = encode(b"hello");
        assert_eq!(&out[..9], &LZOP_MAGIC);
    }

    #[test]
    fn test_stream_ends_with_eos_marker() {
        let out = encode(b"hello lzop");
        assert_eq!(&out[out.len() - 4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_input_round_trips() {
        let out = encode(b"");
        assert_eq!(decode(&out).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_compressible_multi_block_round_trips() {
        let line = b"2016-01-01T12:00:00Z\ttest\t{\"a\":1}\n";
        let data: Vec<u8> = line.iter().copied().cycle().take(BLOCK_SIZE * 2 + 123).collect();

        let out = encode(&data);
        assert!(out.len() < data.len());
        assert_eq!(decode(&out).unwrap(), data);
    }

    #[test]
    fn test_incompressible_block_stored_raw() {
        // xorshift noise does not compress
        let mut x: u32 = 0x1234_5678;
        let data: Vec<u8> = (0..4096)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                x as u8
            })
            .collect();

        let out = encode(&data);
        assert_eq!(decode(&out).unwrap(), data);
    }

    #[test]
    fn test_missing_eos_marker_is_truncated() {
        let out = encode(b"some log line\n");
        let truncated = &out[..out.len() - 4];
        let err = decode(truncated).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_drop_finishes_stream() {
        let mut sink = Vec::new();
        {
            let mut writer = LzopWriter::new(&mut sink);
            writer.write_all(b"dropped without finish").unwrap();
        }
        assert_eq!(decode(&sink).unwrap(), b"dropped without finish");
    }

    #[test]
    fn test_corrupted_block_detected() {
        let mut out = encode(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let last = out.len() - 5;
        out[last] ^= 0xff;
        let err = decode(&out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_compressed_blocks_carry_checksum_flag() {
        let out = encode(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        // flags follow magic(9) and version, lib, needed, method, level
        let flags = u32::from_be_bytes([out[17], out[18], out[19], out[20]]);
        assert_ne!(flags & F_ADLER32_C, 0);
    }

    #[test]
    fn test_malformed_block_with_valid_checksum_is_error() {
        let mut out = encode(b"");
        out.truncate(out.len() - 4);

        // well-formed framing around bytes that are not LZO1X
        let garbage = [0xff, 0xff, 0xff, 0xff, 0x00, 0x11, 0x00];
        let d_len = 64u32;
        out.extend_from_slice(&d_len.to_be_bytes());
        out.extend_from_slice(&(garbage.len() as u32).to_be_bytes());
        out.extend_from_slice(&adler::adler32_slice(&[b'a'; 64]).to_be_bytes());
        out.extend_from_slice(&adler::adler32_slice(&garbage).to_be_bytes());
        out.extend_from_slice(&garbage);
        out.extend_from_slice(&0u32.to_be_bytes());

        let err = decode(&out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
