//! The TLV8 container.
//!
//! A [`Tlv8Container`] is an ordered map from 8-bit type codes to byte
//! values. Values have no length limit; splitting into 255-byte wire chunks
//! happens only when the container is serialized, and chunks are joined
//! again when it is decoded.

use std::collections::HashMap;
use std::io::Read;

use bytes::{BufMut, BytesMut};

use crate::assembler::{decode_items, Tlv8Item};
use crate::codec::{encode_value, encoded_value_len};
use crate::constants::{BOOL_FALSE, BOOL_TRUE};
use crate::{DecodeOptions, Tlv8Error, Tlv8Result};

/// An ordered collection of TLV8 values keyed by type code.
///
/// Each type code holds at most one value. Setting a type replaces its
/// value; the type keeps the position where it was first inserted.
/// Serialization emits types in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tlv8Container {
    entries: HashMap<u8, Vec<u8>>,
    /// Type codes in insertion order.
    order: Vec<u8>,
}

impl Tlv8Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Decoding
    // ------------------------------------------------------------------------

    /// Read a container from a byte source using default options.
    ///
    /// Reads until the source is exhausted. Entries sharing a type code are
    /// concatenated in stream order.
    pub fn from_reader<R: Read>(reader: R) -> Tlv8Result<Self> {
        Self::from_reader_with(reader, &DecodeOptions::default())
    }

    /// Read a container from a byte source.
    pub fn from_reader_with<R: Read>(reader: R, options: &DecodeOptions) -> Tlv8Result<Self> {
        let items = decode_items(reader, options)?;
        Ok(Self::from_items(items))
    }

    /// Decode a container from a complete byte slice.
    pub fn decode(data: &[u8]) -> Tlv8Result<Self> {
        Self::from_reader(data)
    }

    /// Build a container from reassembled items.
    ///
    /// A repeated type code replaces the earlier value.
    pub fn from_items<I: IntoIterator<Item = Tlv8Item>>(items: I) -> Self {
        let mut container = Self::new();
        for item in items {
            if container.contains(item.tlv_type) {
                log::debug!(
                    "tlv8: repeated item for type 0x{:02X} replaces earlier value",
                    item.tlv_type
                );
            }
            container.set_bytes(item.tlv_type, item.value);
        }
        container
    }

    // ------------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------------

    /// Serialize every value into a new buffer.
    pub fn bytes_buffer(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_to(&mut buf);
        buf
    }

    /// Append the serialization of every value to `buf`.
    pub fn encode_to<B: BufMut>(&self, buf: &mut B) {
        for (tlv_type, value) in self.iter() {
            encode_value(buf, tlv_type, value);
        }
    }

    /// Serialize into a `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_to(&mut buf);
        buf
    }

    /// Size of the serialized container in bytes.
    pub fn encoded_len(&self) -> usize {
        self.iter().map(|(_, value)| encoded_value_len(value.len())).sum()
    }

    // ------------------------------------------------------------------------
    // Raw storage
    // ------------------------------------------------------------------------

    /// Get the value for a type, if set.
    pub fn get(&self, tlv_type: u8) -> Option<&[u8]> {
        self.entries.get(&tlv_type).map(Vec::as_slice)
    }

    /// Whether a value is set for a type.
    pub fn contains(&self, tlv_type: u8) -> bool {
        self.entries.contains_key(&tlv_type)
    }

    /// Remove and return the value for a type.
    pub fn remove(&mut self, tlv_type: u8) -> Option<Vec<u8>> {
        let value = self.entries.remove(&tlv_type)?;
        self.order.retain(|&t| t != tlv_type);
        Some(value)
    }

    /// Number of type codes set.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the container holds no values.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Type codes in insertion order.
    pub fn types(&self) -> &[u8] {
        &self.order
    }

    /// Iterate over `(type, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &[u8])> + '_ {
        self.order
            .iter()
            .filter_map(move |&t| self.entries.get(&t).map(|v| (t, v.as_slice())))
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    /// Store a byte sequence, replacing any existing value.
    pub fn set_bytes(&mut self, tlv_type: u8, value: impl Into<Vec<u8>>) {
        if self.entries.insert(tlv_type, value.into()).is_none() {
            self.order.push(tlv_type);
        }
    }

    /// Get the full value for a type, or an empty slice if unset.
    pub fn bytes(&self, tlv_type: u8) -> &[u8] {
        self.get(tlv_type).unwrap_or_default()
    }

    /// Store a single byte.
    pub fn set_byte(&mut self, tlv_type: u8, value: u8) {
        self.set_bytes(tlv_type, vec![value]);
    }

    /// Get the first byte of the value, or `0` if unset or empty.
    pub fn byte(&self, tlv_type: u8) -> u8 {
        self.bytes(tlv_type).first().copied().unwrap_or(0)
    }

    /// Store the UTF-8 bytes of a string.
    pub fn set_string(&mut self, tlv_type: u8, value: impl AsRef<str>) {
        self.set_bytes(tlv_type, value.as_ref().as_bytes());
    }

    /// Get the value as text, or an empty string if unset.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD. Use
    /// [`try_string`](Self::try_string) to reject them instead.
    pub fn string(&self, tlv_type: u8) -> String {
        String::from_utf8_lossy(self.bytes(tlv_type)).into_owned()
    }

    /// Get the value as text, failing on invalid UTF-8.
    pub fn try_string(&self, tlv_type: u8) -> Tlv8Result<&str> {
        std::str::from_utf8(self.bytes(tlv_type)).map_err(|_| Tlv8Error::InvalidUtf8 { tlv_type })
    }

    /// Store a boolean as a single `0x01` or `0x00` byte.
    pub fn set_bool(&mut self, tlv_type: u8, value: bool) {
        self.set_byte(tlv_type, if value { BOOL_TRUE } else { BOOL_FALSE });
    }

    /// Get a boolean. Any non-zero first byte is `true`; unset is `false`.
    pub fn bool(&self, tlv_type: u8) -> bool {
        self.byte(tlv_type) != BOOL_FALSE
    }

    /// Store a little-endian `u16`.
    pub fn set_u16(&mut self, tlv_type: u8, value: u16) {
        self.set_bytes(tlv_type, value.to_le_bytes());
    }

    /// Get a little-endian `u16`; short values are zero-extended.
    pub fn u16(&self, tlv_type: u8) -> u16 {
        u16::from_le_bytes(self.le_bytes(tlv_type))
    }

    /// Store a little-endian `u32`.
    pub fn set_u32(&mut self, tlv_type: u8, value: u32) {
        self.set_bytes(tlv_type, value.to_le_bytes());
    }

    /// Get a little-endian `u32`; short values are zero-extended.
    pub fn u32(&self, tlv_type: u8) -> u32 {
        u32::from_le_bytes(self.le_bytes(tlv_type))
    }

    /// Store a little-endian `u64`.
    pub fn set_u64(&mut self, tlv_type: u8, value: u64) {
        self.set_bytes(tlv_type, value.to_le_bytes());
    }

    /// Get a little-endian `u64`; short values are zero-extended.
    pub fn u64(&self, tlv_type: u8) -> u64 {
        u64::from_le_bytes(self.le_bytes(tlv_type))
    }

    fn le_bytes<const N: usize>(&self, tlv_type: u8) -> [u8; N] {
        let value = self.bytes(tlv_type);
        let n = value.len().min(N);
        let mut buf = [0u8; N];
        buf[..n].copy_from_slice(&value[..n]);
        buf
    }
}

impl<V: Into<Vec<u8>>> FromIterator<(u8, V)> for Tlv8Container {
    fn from_iter<I: IntoIterator<Item = (u8, V)>>(iter: I) -> Self {
        let mut container = Self::new();
        container.extend(iter);
        container
    }
}

impl<V: Into<Vec<u8>>> Extend<(u8, V)> for Tlv8Container {
    fn extend<I: IntoIterator<Item = (u8, V)>>(&mut self, iter: I) {
        for (tlv_type, value) in iter {
            self.set_bytes(tlv_type, value);
        }
    }
}

impl TryFrom<&[u8]> for Tlv8Container {
    type Error = Tlv8Error;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        Self::decode(data)
    }
}

impl From<&Tlv8Container> for Vec<u8> {
    fn from(container: &Tlv8Container) -> Self {
        container.to_vec()
    }
}
