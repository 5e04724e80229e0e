//! The concrete asset writer and scene helpers built on it.

pub mod gltf_writer;
pub mod spheres;

pub use gltf_writer::{AlphaMode, GltfWriter, WriteError};
pub use spheres::{SphereFactory, SphereFactoryOptions};
