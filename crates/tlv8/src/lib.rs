//! TLV8 Container Encoding
//!
//! This crate provides an ordered container of typed attributes and its
//! TLV8 wire encoding, as used by device-pairing and accessory-configuration
//! protocols.
//!
//! # Wire Format
//!
//! A TLV8 stream is a sequence of entries, each made of:
//!
//! - **Type**: 1 byte, the attribute's type code
//! - **Length**: 1 byte, 0-255
//! - **Value**: `length` bytes
//!
//! Values longer than 255 bytes are split into consecutive entries sharing
//! the same type and joined again on decode, so callers only ever see whole
//! values.
//!
//! # Example
//!
//! ```rust
//! use tlv8::Tlv8Container;
//!
//! let mut container = Tlv8Container::new();
//! container.set_byte(0x06, 0x01);
//! container.set_string(0x01, "Pair-Setup");
//!
//! let encoded = container.bytes_buffer();
//! let decoded = Tlv8Container::from_reader(&encoded[..]).unwrap();
//! assert_eq!(decoded.byte(0x06), 0x01);
//! assert_eq!(decoded.string(0x01), "Pair-Setup");
//! ```

mod assembler;
mod codec;
mod config;
mod constants;
mod container;
mod error;

pub use assembler::*;
pub use codec::*;
pub use config::*;
pub use constants::*;
pub use container::*;
pub use error::*;
