//! Per-instance attribute streams for `EXT_mesh_gpu_instancing`.

use glam::{Quat, Vec3, Vec4};
use serde_json::{Map, Value, json};

use crate::buffer::{AccessorId, AssetSink, AttributeBuffer, Quantized4};
use crate::error::BuildError;

pub const EXT_MESH_GPU_INSTANCING: &str = "EXT_mesh_gpu_instancing";

/// How instance rotations are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationEncoding {
    #[default]
    Float,
    /// Normalized signed bytes, a quarter of the size of floats.
    QuantizedByte,
}

#[derive(Debug, Clone)]
enum RotationStream {
    Float(AttributeBuffer<Vec4>),
    Quantized(AttributeBuffer<Quantized4>),
}

impl RotationStream {
    fn len(&self) -> usize {
        match self {
            RotationStream::Float(buffer) => buffer.len(),
            RotationStream::Quantized(buffer) => buffer.len(),
        }
    }
}

/// Accessor ids of the packed instance streams, by attribute name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedInstances {
    pub attributes: Vec<(&'static str, AccessorId)>,
}

impl PackedInstances {
    /// Payload of the `EXT_mesh_gpu_instancing` node extension.
    pub fn to_extension(&self) -> Value {
        let attributes: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(name, id)| (name.to_string(), json!(id.0)))
            .collect();
        json!({ "attributes": attributes })
    }
}

/// TRANSLATION, ROTATION, SCALE and `_FEATURE_ID_0` streams for one
/// instanced node.
#[derive(Debug, Clone)]
pub struct InstanceAttributes {
    translation: AttributeBuffer<Vec3>,
    rotation: RotationStream,
    scale: AttributeBuffer<Vec3>,
    feature_id: AttributeBuffer<u16>,
}

impl InstanceAttributes {
    pub fn new(name: &str, encoding: RotationEncoding) -> Self {
        let rotation = match encoding {
            RotationEncoding::Float => {
                RotationStream::Float(AttributeBuffer::vertex(format!("{name}-rotation")))
            }
            RotationEncoding::QuantizedByte => {
                RotationStream::Quantized(AttributeBuffer::vertex(format!("{name}-rotation")))
            }
        };
        Self {
            translation: AttributeBuffer::vertex(format!("{name}-translation")),
            rotation,
            scale: AttributeBuffer::vertex(format!("{name}-scale")),
            feature_id: AttributeBuffer::vertex(format!("{name}-featureId")),
        }
    }

    pub fn len(&self) -> usize {
        self.translation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translation.is_empty()
    }

    pub fn add(&mut self, translation: Vec3, rotation: Quat, scale: Vec3, feature_id: Option<u16>) {
        self.translation.add(translation);
        let rotation = Vec4::from(rotation);
        match &mut self.rotation {
            RotationStream::Float(buffer) => buffer.add(rotation),
            RotationStream::Quantized(buffer) => buffer.add(Quantized4(rotation)),
        }
        self.scale.add(scale);
        if let Some(feature_id) = feature_id {
            self.feature_id.add(feature_id);
        }
    }

    /// Checks what [`pack`](Self::pack) would reject: partial feature id
    /// coverage and rotations outside the quantizable range.
    pub fn validate(&self) -> Result<(), BuildError> {
        let count = self.len();
        let feature_ids = self.feature_id.len();
        if feature_ids != 0 && feature_ids != count {
            return Err(BuildError::PartialAttributeCoverage {
                attribute: "_FEATURE_ID_0",
                count: feature_ids,
                vertex_count: count,
            });
        }
        debug_assert_eq!(self.rotation.len(), count);

        if let RotationStream::Quantized(buffer) = &self.rotation {
            buffer.encode()?;
        }
        Ok(())
    }

    /// Packs every stream. Feature ids must cover all instances or none.
    pub fn pack(&self, sink: &mut impl AssetSink) -> Result<PackedInstances, BuildError> {
        self.validate()?;

        let mut packed = PackedInstances::default();
        let rotation = match &self.rotation {
            RotationStream::Float(buffer) => buffer.pack(sink)?,
            RotationStream::Quantized(buffer) => buffer.pack(sink)?,
        };
        for (name, accessor) in [
            ("TRANSLATION", self.translation.pack(sink)?),
            ("ROTATION", rotation),
            ("SCALE", self.scale.pack(sink)?),
            ("_FEATURE_ID_0", self.feature_id.pack(sink)?),
        ] {
            if let Some(accessor) = accessor {
                packed.attributes.push((name, accessor.accessor));
            }
        }
        Ok(packed)
    }
}
