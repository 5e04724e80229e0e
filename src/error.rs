use thiserror::Error;

/// Why a mesh could not be finalized for lack of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    NoVertices,
    NoIndices,
}

impl std::fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmptyReason::NoVertices => f.write_str("no vertices"),
            EmptyReason::NoIndices => f.write_str("no indices"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("mesh '{name}' cannot be built: {reason}")]
    EmptyMesh { name: String, reason: EmptyReason },
    #[error("{attribute} covers {count} of {vertex_count} vertices")]
    PartialAttributeCoverage {
        attribute: &'static str,
        count: usize,
        vertex_count: usize,
    },
    #[error("vertex index {index} does not fit in an unsigned 16-bit index")]
    IndexOverflow { index: u32 },
    #[error("non-finite {stage} position {position:?}")]
    InvalidGeometry {
        position: [f32; 3],
        stage: &'static str,
    },
    #[error("value {value} quantizes to {quantized}, outside [-127, 127]")]
    QuantizationOverflow { value: f32, quantized: f32 },
    #[error("cannot build a rotation frame around axis {axis:?}")]
    DegenerateRotationFrame { axis: [f32; 3] },
    #[error("vertex {index} has no tangent contributions")]
    NoTangentData { index: u32 },
    #[error("vertex handle {index} does not name a vertex of the current mesh")]
    StaleVertex { index: u32 },
    #[error("string table is {bytes} bytes, too large for 16-bit offsets")]
    StringTableOverflow { bytes: usize },
}

pub type BuildResult<T> = Result<T, BuildError>;
