//! Reassembly of chunked values.
//!
//! Wire entries are at most 255 bytes, so longer values arrive as several
//! entries sharing a type code. The [`Assembler`] joins them back into
//! logical items according to a [`MergePolicy`].

use std::collections::HashMap;
use std::io::Read;

use crate::codec::{EntryReader, WireEntry};
use crate::{DecodeOptions, MergePolicy, Tlv8Error, Tlv8Result};

/// One logical attribute after chunk reassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv8Item {
    /// Type code.
    pub tlv_type: u8,
    /// Reassembled value, of any length.
    pub value: Vec<u8>,
}

/// Joins wire entries into logical items.
#[derive(Debug)]
pub struct Assembler {
    policy: MergePolicy,
    max_value_len: Option<usize>,
    items: Vec<Tlv8Item>,
    /// Index into `items` of the item holding each type code.
    by_type: HashMap<u8, usize>,
}

impl Assembler {
    /// Create an assembler for the given options.
    pub fn new(options: &DecodeOptions) -> Self {
        Assembler {
            policy: options.merge_policy,
            max_value_len: options.max_value_len,
            items: Vec::new(),
            by_type: HashMap::new(),
        }
    }

    /// Feed the next wire entry, in stream order.
    pub fn accept(&mut self, entry: WireEntry) -> Tlv8Result<()> {
        let last = self.items.len().checked_sub(1);
        let target = match self.policy {
            MergePolicy::Unconditional => self.by_type.get(&entry.tlv_type).copied(),
            MergePolicy::Adjacent => last.filter(|&i| self.items[i].tlv_type == entry.tlv_type),
        };

        match target {
            Some(index) => {
                let item = &mut self.items[index];
                let size = item.value.len() + entry.value.len();
                Self::check_size(self.max_value_len, entry.tlv_type, size)?;

                if Some(index) != last {
                    log::debug!(
                        "tlv8: merging non-adjacent entry for type 0x{:02X} ({} bytes)",
                        entry.tlv_type,
                        entry.value.len()
                    );
                }
                item.value.extend_from_slice(&entry.value);
            }
            None => {
                Self::check_size(self.max_value_len, entry.tlv_type, entry.value.len())?;
                self.by_type.insert(entry.tlv_type, self.items.len());
                self.items.push(Tlv8Item {
                    tlv_type: entry.tlv_type,
                    value: entry.value,
                });
            }
        }

        Ok(())
    }

    /// Number of logical items assembled so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no entries have been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the assembler and return the items in stream order.
    pub fn finish(self) -> Vec<Tlv8Item> {
        self.items
    }

    fn check_size(max: Option<usize>, tlv_type: u8, size: usize) -> Tlv8Result<()> {
        match max {
            Some(max) if size > max => Err(Tlv8Error::ValueTooLarge {
                tlv_type,
                size,
                max,
            }),
            _ => Ok(()),
        }
    }
}

/// Read a whole TLV8 stream and return its logical items in stream order.
///
/// Unlike loading into a container, repeated items produced by
/// [`MergePolicy::Adjacent`] are all kept.
pub fn decode_items<R: Read>(reader: R, options: &DecodeOptions) -> Tlv8Result<Vec<Tlv8Item>> {
    let mut assembler = Assembler::new(options);
    for entry in EntryReader::new(reader) {
        assembler.accept(entry?)?;
    }
    Ok(assembler.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn items(hex_data: &str, options: &DecodeOptions) -> Tlv8Result<Vec<Tlv8Item>> {
        decode_items(Cursor::new(hex::decode(hex_data).unwrap()), options)
    }

    fn item(tlv_type: u8, value: &[u8]) -> Tlv8Item {
        Tlv8Item {
            tlv_type,
            value: value.to_vec(),
        }
    }

    #[test]
    fn test_unconditional_merges_adjacent() {
        let result = items("0102AFFA0103BFFBAA", &DecodeOptions::default()).unwrap();
        assert_eq!(result, vec![item(1, &[0xAF, 0xFA, 0xBF, 0xFB, 0xAA])]);
    }

    #[test]
    fn test_unconditional_merges_non_adjacent() {
        let result = items("0101AA0201BB0101CC", &DecodeOptions::default()).unwrap();
        assert_eq!(result, vec![item(1, &[0xAA, 0xCC]), item(2, &[0xBB])]);
    }

    #[test]
    fn test_adjacent_keeps_repeats_distinct() {
        let options = DecodeOptions::new().with_merge_policy(MergePolicy::Adjacent);
        let result = items("0101AA0101AB0201BB0101CC", &options).unwrap();
        assert_eq!(
            result,
            vec![item(1, &[0xAA, 0xAB]), item(2, &[0xBB]), item(1, &[0xCC])]
        );
    }

    #[test]
    fn test_empty_entry_joins_run() {
        let result = items("0101AA0100", &DecodeOptions::default()).unwrap();
        assert_eq!(result, vec![item(1, &[0xAA])]);
    }

    #[test]
    fn test_max_value_len() {
        let options = DecodeOptions::new().with_max_value_len(3);
        assert!(items("0102AAAA0101BB", &options).is_ok());

        match items("0102AAAA0102BBBB", &options) {
            Err(Tlv8Error::ValueTooLarge {
                tlv_type,
                size,
                max,
            }) => {
                assert_eq!(tlv_type, 1);
                assert_eq!(size, 4);
                assert_eq!(max, 3);
            }
            other => panic!("Expected ValueTooLarge, got {:?}", other),
        }

        assert!(items("0104AAAAAAAA", &options).is_err());
    }

    #[test]
    fn test_assembler_counts() {
        let mut assembler = Assembler::new(&DecodeOptions::default());
        assert!(assembler.is_empty());

        assembler.accept(WireEntry::new(1, vec![0x01])).unwrap();
        assembler.accept(WireEntry::new(1, vec![0x02])).unwrap();
        assembler.accept(WireEntry::new(4, vec![])).unwrap();
        assert_eq!(assembler.len(), 2);

        let result = assembler.finish();
        assert_eq!(result, vec![item(1, &[0x01, 0x02]), item(4, &[])]);
    }

    #[test]
    fn test_truncated_stream_propagates() {
        let result = items("0102AFFA0103BF", &DecodeOptions::default());
        assert!(matches!(result, Err(Tlv8Error::Truncated { .. })));
    }
}
