//! glTF extension payloads built on top of the attribute buffer engine.

pub mod instancing;
pub mod metadata;

pub use instancing::{EXT_MESH_GPU_INSTANCING, InstanceAttributes, PackedInstances, RotationEncoding};
pub use metadata::{
    EXT_INSTANCE_FEATURES, EXT_STRUCTURAL_METADATA, StringPropertyTable, instance_features,
};
