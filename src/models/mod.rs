//! Procedural mesh construction.

pub mod grid;
pub mod icosphere;
pub mod pipe;
pub mod shapes;
pub mod topology;
pub mod vertex;

pub use grid::{Grid, interp_float};
pub use icosphere::{IcosphereBuilder, IcosphereOptions};
pub use pipe::{PipeOptions, PipePoint, rotation_from_y};
pub use topology::{Bounds, Diagnostic, MeshAssembly};
pub use vertex::{FALLBACK_NORMAL, Vertex, VertexId};
