/// Typed attribute streams, accessor records and the [`buffer::AssetSink`] boundary
pub mod buffer;
/// 8-bit RGBA colors and HSB conversion
pub mod color;
/// Error definitions
pub mod error;
/// glTF/GLB output
pub mod export;
/// `EXT_mesh_gpu_instancing` and `EXT_structural_metadata` payloads
pub mod ext;
/// Vertex model, triangle assembly and the surface generators built on it
pub mod models;
