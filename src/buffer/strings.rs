use tracing::debug;

use super::{AssetSink, AttributeBuffer, BufferViewRecord, ViewId, pad_to_4};
use crate::error::BuildError;

/// View ids of a packed string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedStrings {
    pub values: ViewId,
    pub offsets: ViewId,
    pub count: usize,
}

/// UTF-8 strings concatenated into one view, with a parallel `u16` offset
/// view.
///
/// Offset `i` is where string `i` starts relative to the start of the
/// values view. One extra trailing offset marks the end of the last string,
/// so string `i` is always `bytes[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    name: String,
    values: Vec<String>,
}

impl StringTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Appends a string and returns its row index.
    pub fn add(&mut self, value: impl Into<String>) -> usize {
        self.values.push(value.into());
        self.values.len() - 1
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        self.values.get(row).map(String::as_str)
    }

    /// Concatenated bytes and offsets, before any padding.
    pub fn encode(&self) -> Result<(Vec<u8>, AttributeBuffer<u16>), BuildError> {
        let mut bytes = Vec::new();
        let mut offsets = AttributeBuffer::untargeted(format!("{}-offsets", self.name));
        for value in &self.values {
            offsets.add(Self::offset(bytes.len())?);
            bytes.extend_from_slice(value.as_bytes());
        }
        offsets.add(Self::offset(bytes.len())?);
        Ok((bytes, offsets))
    }

    fn offset(len: usize) -> Result<u16, BuildError> {
        u16::try_from(len).map_err(|_| BuildError::StringTableOverflow { bytes: len })
    }

    pub fn pack(&self, sink: &mut impl AssetSink) -> Result<Option<PackedStrings>, BuildError> {
        if self.values.is_empty() {
            return Ok(None);
        }

        let (mut bytes, offsets) = self.encode()?;
        let byte_length = bytes.len() as u64;
        pad_to_4(&mut bytes);

        let byte_offset = sink.shared_buffer_append(&bytes);
        let values = sink.append_buffer_view(BufferViewRecord {
            name: Some(format!("{}-values", self.name)),
            byte_offset,
            byte_length,
            byte_stride: None,
            target: None,
        });

        let offset_bytes = offsets.encode()?;
        let byte_offset = sink.shared_buffer_append(&offset_bytes);
        let offsets = sink.append_buffer_view(BufferViewRecord {
            name: Some(offsets.name().to_string()),
            byte_offset,
            byte_length: (offsets.len() * 2) as u64,
            byte_stride: None,
            target: None,
        });

        debug!(name = %self.name, count = self.values.len(), "packed string table");

        Ok(Some(PackedStrings {
            values,
            offsets,
            count: self.values.len(),
        }))
    }
}
