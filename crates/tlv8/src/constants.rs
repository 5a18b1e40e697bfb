//! Wire-format constants for TLV8.

/// Maximum number of value bytes a single wire entry can carry.
pub const MAX_CHUNK_LEN: usize = u8::MAX as usize;

/// Size of a wire entry header: type (1) + length (1).
pub const ENTRY_HEADER_SIZE: usize = 2;

/// Value stored by `set_bool(.., true)`.
pub const BOOL_TRUE: u8 = 0x01;

/// Value stored by `set_bool(.., false)`.
pub const BOOL_FALSE: u8 = 0x00;
