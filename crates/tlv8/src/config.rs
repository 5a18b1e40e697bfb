//! Decoding options.
//!
//! These can be embedded in a host application's own configuration file;
//! every field has a default so partial documents deserialize.

use serde::{Deserialize, Serialize};

/// How wire entries sharing a type code are combined on decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Every entry is appended to the value for its type, wherever it
    /// appears in the stream.
    #[default]
    Unconditional,
    /// Only immediately consecutive entries of the same type are joined.
    /// A later, non-adjacent entry starts a new logical item.
    Adjacent,
}

/// Options controlling how a TLV8 stream is decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DecodeOptions {
    /// Merge rule for repeated type codes.
    pub merge_policy: MergePolicy,
    /// Upper bound on a reassembled value, in bytes. `None` is unbounded.
    pub max_value_len: Option<usize>,
}

impl DecodeOptions {
    /// Create the default options (unconditional merge, no size limit).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the merge policy.
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Limit the size of any reassembled value.
    pub fn with_max_value_len(mut self, max: usize) -> Self {
        self.max_value_len = Some(max);
        self
    }
}
