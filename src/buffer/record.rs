//! Records handed across the boundary between the mesh builders and the
//! asset writer that owns the shared binary buffer.

use serde_json::Value;

use super::encodable::{Arity, ComponentType};

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn value(self) -> usize {
                self.0 as usize
            }
        }
    };
}

index_type!(
    /// Index of a mesh in the writer's mesh list.
    MeshId
);
index_type!(AccessorId);
index_type!(ViewId);
index_type!(NodeId);
index_type!(MaterialId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    ArrayBuffer,
    ElementArrayBuffer,
}

/// Primitive topology. Builders only produce `Triangles` and `LineStrip`,
/// but any mode may be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TopologyMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeSemantic {
    Position,
    Normal,
    Tangent,
    TexCoord0,
    Color0,
}

/// A contiguous, non-overlapping slice of the shared buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferViewRecord {
    pub name: Option<String>,
    pub byte_offset: u64,
    pub byte_length: u64,
    pub byte_stride: Option<u32>,
    pub target: Option<BufferTarget>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessorRecord {
    pub name: Option<String>,
    pub view: ViewId,
    pub component_type: ComponentType,
    pub arity: Arity,
    pub normalized: bool,
    pub count: u64,
    pub min: Option<Value>,
    pub max: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveRecord {
    pub mode: TopologyMode,
    pub material: Option<MaterialId>,
    pub attributes: Vec<(AttributeSemantic, AccessorId)>,
    pub indices: Option<AccessorId>,
}

/// Destination for everything a build produces.
///
/// All operations append. Returned ids are never reused, and bytes already
/// handed to [`AssetSink::shared_buffer_append`] are never rewritten.
pub trait AssetSink {
    /// Appends bytes to the shared buffer and returns the offset they start at.
    fn shared_buffer_append(&mut self, bytes: &[u8]) -> u64;

    fn append_buffer_view(&mut self, view: BufferViewRecord) -> ViewId;

    fn append_accessor(&mut self, accessor: AccessorRecord) -> AccessorId;

    fn allocate_mesh(&mut self, name: &str) -> MeshId;

    fn bind_primitive(&mut self, mesh: MeshId, primitive: PrimitiveRecord);

    fn add_node(&mut self, name: &str, mesh: MeshId) -> NodeId;
}
