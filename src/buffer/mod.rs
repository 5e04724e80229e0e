//! Typed attribute streams and their packing into the shared binary buffer.

pub mod encodable;
pub mod record;
pub mod strings;

use tracing::debug;

pub use encodable::{Arity, ComponentType, Encodable, Quantized4};
pub use record::{
    AccessorId, AccessorRecord, AssetSink, AttributeSemantic, BufferTarget, BufferViewRecord,
    MaterialId, MeshId, NodeId, PrimitiveRecord, TopologyMode, ViewId,
};
pub use strings::{PackedStrings, StringTable};

use crate::error::BuildError;

pub(crate) fn pad_to_4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

/// Ids produced by packing one attribute buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedAccessor {
    pub view: ViewId,
    pub accessor: AccessorId,
}

/// An ordered stream of one element type plus its running bounds.
#[derive(Debug, Clone)]
pub struct AttributeBuffer<T: Encodable> {
    name: String,
    target: Option<BufferTarget>,
    values: Vec<T>,
    bounds: Option<(T, T)>,
}

impl<T: Encodable> AttributeBuffer<T> {
    /// A per-vertex (or per-instance) attribute stream.
    pub fn vertex(name: impl Into<String>) -> Self {
        Self::with_target(name, Some(BufferTarget::ArrayBuffer))
    }

    /// An index stream bound as an element array.
    pub fn indices(name: impl Into<String>) -> Self {
        Self::with_target(name, Some(BufferTarget::ElementArrayBuffer))
    }

    /// A stream with no GPU binding target, such as a metadata offset table.
    pub fn untargeted(name: impl Into<String>) -> Self {
        Self::with_target(name, None)
    }

    fn with_target(name: impl Into<String>, target: Option<BufferTarget>) -> Self {
        Self {
            name: name.into(),
            target,
            values: Vec::new(),
            bounds: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, value: T) {
        T::fold_bounds(&mut self.bounds, value);
        self.values.push(value);
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> Option<T> {
        self.bounds.map(|(min, _)| min)
    }

    pub fn max(&self) -> Option<T> {
        self.bounds.map(|(_, max)| max)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.bounds = None;
    }

    /// Drops everything past `len`. Bounds are recomputed from what remains.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.values.len() {
            return;
        }
        self.values.truncate(len);
        self.bounds = None;
        for &value in &self.values {
            T::fold_bounds(&mut self.bounds, value);
        }
    }

    fn needs_word_padding(&self) -> bool {
        self.target == Some(BufferTarget::ElementArrayBuffer) || T::byte_size() % 4 != 0
    }

    /// Encodes every element in insertion order, padded as the view requires.
    pub fn encode(&self) -> Result<Vec<u8>, BuildError> {
        let mut bytes = Vec::with_capacity(self.values.len() * T::byte_size() + 3);
        for value in &self.values {
            value.write_le(&mut bytes)?;
        }
        if self.needs_word_padding() {
            pad_to_4(&mut bytes);
        }
        Ok(bytes)
    }

    /// Appends this stream to the sink as one buffer view and one accessor.
    ///
    /// Returns `None` for an empty stream. Encoding happens before anything
    /// is appended, so a failed pack leaves the sink untouched.
    pub fn pack(&self, sink: &mut impl AssetSink) -> Result<Option<PackedAccessor>, BuildError> {
        if self.values.is_empty() {
            return Ok(None);
        }

        let bytes = self.encode()?;
        let byte_offset = sink.shared_buffer_append(&bytes);

        let element_size = T::byte_size();
        let byte_stride = (self.target == Some(BufferTarget::ArrayBuffer) && element_size % 4 == 0)
            .then_some(element_size as u32);

        let view = sink.append_buffer_view(BufferViewRecord {
            name: Some(self.name.clone()),
            byte_offset,
            byte_length: bytes.len() as u64,
            byte_stride,
            target: self.target,
        });

        let (min, max) = match self.bounds {
            Some((min, max)) => (min.bound_value(), max.bound_value()),
            None => (None, None),
        };
        let accessor = sink.append_accessor(AccessorRecord {
            name: Some(self.name.clone()),
            view,
            component_type: T::COMPONENT_TYPE,
            arity: T::ARITY,
            normalized: T::NORMALIZED,
            count: self.values.len() as u64,
            min,
            max,
        });

        debug!(
            name = %self.name,
            count = self.values.len(),
            byte_offset,
            byte_length = bytes.len(),
            "packed accessor"
        );

        Ok(Some(PackedAccessor { view, accessor }))
    }
}
