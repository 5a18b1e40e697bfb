//! Wire-level TLV8 encoding and decoding.
//!
//! A TLV8 stream is a plain concatenation of entries with no framing,
//! checksum, or terminator:
//!
//! ```text
//! +------+--------+---------------------+
//! | type | length | value[0..length]    |
//! +------+--------+---------------------+
//!   1 B     1 B      0-255 B
//! ```
//!
//! Values longer than 255 bytes are written as a run of consecutive entries
//! sharing the same type. Every chunk but the last carries exactly 255 bytes.
//! A value whose length is an exact multiple of 255 ends with a full chunk;
//! no zero-length terminator is written.

use std::io::{ErrorKind, Read};

use bytes::{Buf, BufMut, BytesMut};

use crate::constants::{ENTRY_HEADER_SIZE, MAX_CHUNK_LEN};
use crate::{Tlv8Error, Tlv8Result};

/// A single entry as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEntry {
    /// Type code.
    pub tlv_type: u8,
    /// Value bytes, at most [`MAX_CHUNK_LEN`] long.
    pub value: Vec<u8>,
}

impl WireEntry {
    /// Create a wire entry.
    pub fn new(tlv_type: u8, value: Vec<u8>) -> Self {
        WireEntry { tlv_type, value }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Number of wire entries needed to carry a value of `len` bytes.
///
/// An empty value still takes one (header-only) entry.
pub fn wire_entry_count(len: usize) -> usize {
    if len == 0 {
        1
    } else {
        len.div_ceil(MAX_CHUNK_LEN)
    }
}

/// Total encoded size of a value of `len` bytes, headers included.
pub fn encoded_value_len(len: usize) -> usize {
    wire_entry_count(len) * ENTRY_HEADER_SIZE + len
}

/// Append the wire encoding of one logical value to `buf`, splitting it
/// into 255-byte chunks as needed.
pub fn encode_value<B: BufMut>(buf: &mut B, tlv_type: u8, value: &[u8]) {
    if value.is_empty() {
        buf.put_u8(tlv_type);
        buf.put_u8(0);
        return;
    }

    for chunk in value.chunks(MAX_CHUNK_LEN) {
        buf.put_u8(tlv_type);
        buf.put_u8(chunk.len() as u8);
        buf.put_slice(chunk);
    }
}

// ============================================================================
// Blocking reader
// ============================================================================

/// Reads wire entries one at a time from a blocking byte source.
///
/// End of input before a type byte is a clean end of stream. End of input
/// anywhere inside an entry is a [`Tlv8Error::Truncated`] error.
#[derive(Debug)]
pub struct EntryReader<R> {
    reader: R,
    /// Number of bytes consumed from the source so far.
    offset: usize,
    /// Set once the stream has ended or failed.
    done: bool,
}

impl<R: Read> EntryReader<R> {
    /// Wrap a byte source.
    pub fn new(reader: R) -> Self {
        EntryReader {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Number of bytes consumed from the source.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Read the next entry.
    ///
    /// Returns `Ok(None)` once the source is exhausted on an entry boundary.
    pub fn read_entry(&mut self) -> Tlv8Result<Option<WireEntry>> {
        if self.done {
            return Ok(None);
        }

        let result = self.read_entry_inner();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn read_entry_inner(&mut self) -> Tlv8Result<Option<WireEntry>> {
        let tlv_type = match self.read_u8()? {
            Some(t) => t,
            None => return Ok(None),
        };

        let len = match self.read_u8()? {
            Some(l) => l as usize,
            None => return Err(Tlv8Error::truncated(self.offset, 1, 0)),
        };

        let value_offset = self.offset;
        let mut value = Vec::with_capacity(len);
        self.reader
            .by_ref()
            .take(len as u64)
            .read_to_end(&mut value)?;
        self.offset += value.len();

        if value.len() < len {
            return Err(Tlv8Error::truncated(value_offset, len, value.len()));
        }

        log::trace!(
            "tlv8: read entry type=0x{:02X} len={} at offset {}",
            tlv_type,
            len,
            value_offset - ENTRY_HEADER_SIZE
        );

        Ok(Some(WireEntry { tlv_type, value }))
    }

    fn read_u8(&mut self) -> Tlv8Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read> Iterator for EntryReader<R> {
    type Item = Tlv8Result<WireEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_entry().transpose()
    }
}

// ============================================================================
// Push-based decoder
// ============================================================================

/// An incremental decoder for transports that deliver bytes in arbitrary
/// pieces.
///
/// Feed received bytes with [`push`](Self::push) and drain complete entries
/// with [`decode`](Self::decode). Call [`finish`](Self::finish) once the
/// transport reports end of input to detect a dangling partial entry.
#[derive(Debug, Default)]
pub struct EntryCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
    /// Stream offset of the first buffered byte.
    offset: usize,
}

impl EntryCodec {
    /// Create a new entry codec.
    pub fn new() -> Self {
        EntryCodec {
            buffer: BytesMut::with_capacity(ENTRY_HEADER_SIZE + MAX_CHUNK_LEN),
            offset: 0,
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete entry from the buffer.
    ///
    /// Returns `None` if more data is needed.
    pub fn decode(&mut self) -> Option<WireEntry> {
        if self.buffer.len() < ENTRY_HEADER_SIZE {
            return None;
        }

        let len = self.buffer[1] as usize;
        if self.buffer.len() < ENTRY_HEADER_SIZE + len {
            return None;
        }

        let tlv_type = self.buffer.get_u8();
        self.buffer.advance(1);
        let value = self.buffer.split_to(len).to_vec();

        log::trace!(
            "tlv8: decoded entry type=0x{:02X} len={} at offset {}",
            tlv_type,
            len,
            self.offset
        );
        self.offset += ENTRY_HEADER_SIZE + len;

        Some(WireEntry { tlv_type, value })
    }

    /// Check that no partial entry is left over at end of input.
    ///
    /// Complete entries still waiting in the buffer are not an error; they
    /// can be drained with [`decode`](Self::decode) afterwards.
    pub fn finish(&self) -> Tlv8Result<()> {
        let n = self.buffer.len();
        let mut pos = 0;

        while pos + ENTRY_HEADER_SIZE <= n {
            let len = self.buffer[pos + 1] as usize;
            if pos + ENTRY_HEADER_SIZE + len > n {
                return Err(Tlv8Error::truncated(
                    self.offset + pos + ENTRY_HEADER_SIZE,
                    len,
                    n - pos - ENTRY_HEADER_SIZE,
                ));
            }
            pos += ENTRY_HEADER_SIZE + len;
        }

        if pos < n {
            return Err(Tlv8Error::truncated(self.offset + pos + 1, 1, 0));
        }
        Ok(())
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Number of bytes consumed by decoded entries.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Clear the buffer and reset the stream offset.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(tlv_type: u8, value: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_value(&mut buf, tlv_type, value);
        buf
    }

    #[test]
    fn test_encode_small_value() {
        assert_eq!(encode(0x01, &[0xAF, 0xFA]), vec![0x01, 0x02, 0xAF, 0xFA]);
    }

    #[test]
    fn test_encode_empty_value() {
        assert_eq!(encode(0x07, &[]), vec![0x07, 0x00]);
    }

    #[test]
    fn test_encode_exactly_one_chunk() {
        let value = vec![0x5A; 255];
        let encoded = encode(0x02, &value);
        assert_eq!(encoded.len(), 257);
        assert_eq!(&encoded[..2], &[0x02, 0xFF]);
    }

    #[test]
    fn test_encode_exact_multiple_has_no_terminator() {
        let value = vec![0x11; 510];
        let encoded = encode(0x03, &value);

        assert_eq!(encoded.len(), 514);
        assert_eq!(&encoded[..2], &[0x03, 0xFF]);
        assert_eq!(&encoded[257..259], &[0x03, 0xFF]);
        assert_eq!(encoded.len(), encoded_value_len(510));
    }

    #[test]
    fn test_wire_entry_count() {
        assert_eq!(wire_entry_count(0), 1);
        assert_eq!(wire_entry_count(1), 1);
        assert_eq!(wire_entry_count(255), 1);
        assert_eq!(wire_entry_count(256), 2);
        assert_eq!(wire_entry_count(384), 2);
        assert_eq!(wire_entry_count(510), 2);
        assert_eq!(wire_entry_count(511), 3);
    }

    #[test]
    fn test_reader_multiple_entries() {
        let data = hex::decode("0102AFFA0200030101").unwrap();
        let mut reader = EntryReader::new(Cursor::new(data));

        assert_eq!(
            reader.read_entry().unwrap(),
            Some(WireEntry::new(0x01, vec![0xAF, 0xFA]))
        );
        assert_eq!(reader.read_entry().unwrap(), Some(WireEntry::new(0x02, vec![])));
        assert_eq!(reader.read_entry().unwrap(), Some(WireEntry::new(0x03, vec![0x01])));
        assert_eq!(reader.read_entry().unwrap(), None);
        assert_eq!(reader.offset(), 9);
    }

    #[test]
    fn test_reader_empty_source() {
        let mut reader = EntryReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.read_entry().unwrap().is_none());
    }

    #[test]
    fn test_reader_missing_length() {
        let mut reader = EntryReader::new(Cursor::new(vec![0x01]));
        match reader.read_entry() {
            Err(Tlv8Error::Truncated {
                offset,
                expected,
                actual,
            }) => {
                assert_eq!(offset, 1);
                assert_eq!(expected, 1);
                assert_eq!(actual, 0);
            }
            other => panic!("Expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_reader_short_value() {
        let data = hex::decode("0102AFFA0104BF").unwrap();
        let mut reader = EntryReader::new(Cursor::new(data));

        assert!(reader.read_entry().unwrap().is_some());
        match reader.read_entry() {
            Err(Tlv8Error::Truncated {
                offset,
                expected,
                actual,
            }) => {
                assert_eq!(offset, 6);
                assert_eq!(expected, 4);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected truncation, got {:?}", other),
        }

        // The reader stays finished after an error.
        assert!(reader.read_entry().unwrap().is_none());
    }

    #[test]
    fn test_reader_as_iterator() {
        let data = hex::decode("0101AA0201BB").unwrap();
        let entries: Tlv8Result<Vec<WireEntry>> = EntryReader::new(Cursor::new(data)).collect();
        let entries = entries.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].tlv_type, 0x02);
        assert_eq!(entries[1].value, vec![0xBB]);
    }

    #[test]
    fn test_codec_partial() {
        let mut codec = EntryCodec::new();
        let data = hex::decode("0103AABBCC").unwrap();

        codec.push(&data[..1]);
        assert!(codec.decode().is_none());
        codec.push(&data[1..3]);
        assert!(codec.decode().is_none());
        assert!(codec.finish().is_err());

        codec.push(&data[3..]);
        let entry = codec.decode().expect("should decode entry");
        assert_eq!(entry, WireEntry::new(0x01, vec![0xAA, 0xBB, 0xCC]));
        assert!(codec.finish().is_ok());
        assert_eq!(codec.offset(), 5);
    }

    #[test]
    fn test_codec_multiple() {
        let mut codec = EntryCodec::new();
        codec.push(&hex::decode("0101AA0200").unwrap());

        assert_eq!(codec.decode(), Some(WireEntry::new(0x01, vec![0xAA])));
        assert_eq!(codec.decode(), Some(WireEntry::new(0x02, vec![])));
        assert!(codec.decode().is_none());
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_codec_finish_reports_declared_length() {
        let mut codec = EntryCodec::new();
        codec.push(&[0x01, 0x01, 0xAA, 0x05, 0x09, 0x00]);
        assert!(codec.decode().is_some());

        match codec.finish() {
            Err(Tlv8Error::Truncated {
                offset,
                expected,
                actual,
            }) => {
                assert_eq!(offset, 5);
                assert_eq!(expected, 9);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected truncation, got {:?}", other),
        }

        codec.clear();
        assert_eq!(codec.buffered_len(), 0);
        assert!(codec.finish().is_ok());
    }

    #[test]
    fn test_codec_finish_with_undecoded_entry() {
        let mut codec = EntryCodec::new();
        codec.push(&[0x01, 0x01, 0xAA]);

        // A complete entry left in the buffer is not a truncation.
        assert!(codec.finish().is_ok());
        assert_eq!(codec.decode(), Some(WireEntry::new(0x01, vec![0xAA])));
        assert!(codec.finish().is_ok());
    }

    #[test]
    fn test_codec_finish_skips_complete_entries() {
        let mut codec = EntryCodec::new();
        codec.push(&[0x01, 0x01, 0xAA, 0x02, 0x04, 0xBB, 0xCC]);

        match codec.finish() {
            Err(Tlv8Error::Truncated {
                offset,
                expected,
                actual,
            }) => {
                assert_eq!(offset, 5);
                assert_eq!(expected, 4);
                assert_eq!(actual, 2);
            }
            other => panic!("Expected truncation, got {:?}", other),
        }

        codec.clear();
        codec.push(&[0x01, 0x00, 0x02]);
        match codec.finish() {
            Err(Tlv8Error::Truncated {
                offset,
                expected,
                actual,
            }) => {
                assert_eq!(offset, 3);
                assert_eq!(expected, 1);
                assert_eq!(actual, 0);
            }
            other => panic!("Expected truncation, got {:?}", other),
        }
    }
}
