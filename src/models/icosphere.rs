//! Geodesic spheres built by recursive subdivision of an icosahedron.

use std::collections::HashMap;
use std::f32::consts::TAU;

use bon::Builder;
use glam::Vec3;
use tracing::debug;

use super::topology::MeshAssembly;
use super::vertex::VertexId;
use crate::buffer::{AssetSink, MeshId, NodeId};
use crate::color::Rgba8;
use crate::error::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct IcosphereOptions {
    #[builder(default = 1.0)]
    pub radius: f32,
    /// Number of subdivision passes. Each pass quadruples the face count.
    #[builder(default = 3)]
    pub max_detail: u32,
    #[builder(default = Rgba8::WHITE)]
    pub color: Rgba8,
    /// Darken each subdivision level so the structure is visible.
    #[builder(default)]
    pub patterned: bool,
}

impl Default for IcosphereOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

const TOP: usize = 10;
const BOTTOM: usize = 11;

pub struct IcosphereBuilder {
    mesh: MeshAssembly,
    options: IcosphereOptions,
    midpoints: HashMap<(u32, u32), VertexId>,
}

impl IcosphereBuilder {
    pub fn new(name: impl Into<String>, options: IcosphereOptions) -> Self {
        let mut mesh = MeshAssembly::new(name);
        mesh.set_invert_x(false);
        Self {
            mesh,
            options,
            midpoints: HashMap::new(),
        }
    }

    pub fn options(&self) -> &IcosphereOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: IcosphereOptions) {
        self.options = options;
    }

    pub fn set_max_detail(&mut self, max_detail: u32) {
        self.options.max_detail = max_detail;
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.options.color = color;
    }

    pub fn mesh(&self) -> &MeshAssembly {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut MeshAssembly {
        &mut self.mesh
    }

    /// Vertex color at subdivision level `lod`.
    pub fn color_at(&self, lod: u32) -> Rgba8 {
        if !self.options.patterned {
            return self.options.color;
        }
        self.options.color.adjust_sat_br(1.0, 1.0 / (lod + 1) as f32)
    }

    /// Adds a complete sphere to the current mesh.
    pub fn add_icosphere(&mut self) -> Result<(), BuildError> {
        self.midpoints.clear();

        let base = self.base_vertices()?;
        for i in 0..5 {
            let next = (i + 1) % 5;
            let (upper, upper_next) = (base[i], base[next]);
            let (lower, lower_next) = (base[i + 5], base[next + 5]);

            self.subdivide(0, base[TOP], upper_next, upper)?;
            self.subdivide(0, lower, upper, upper_next)?;
            self.subdivide(0, upper_next, lower_next, lower)?;
            self.subdivide(0, base[BOTTOM], lower, lower_next)?;
        }

        debug!(
            mesh = self.mesh.name(),
            detail = self.options.max_detail,
            vertices = self.mesh.vertex_count(),
            "added icosphere"
        );
        Ok(())
    }

    /// The 12 icosahedron corners: five around each of two rings at
    /// latitude `atan(1/2)`, the lower ring offset by half a step, then the
    /// two poles.
    fn base_vertices(&mut self) -> Result<[VertexId; 12], BuildError> {
        let radius = self.options.radius;
        let color = self.color_at(0);
        let latitude = 0.5f32.atan();
        let z = radius * latitude.sin();
        let xy = radius * latitude.cos();
        let step = TAU / 5.0;

        let mut positions = [Vec3::ZERO; 12];
        for i in 0..5 {
            let upper = i as f32 * step;
            let lower = upper + step / 2.0;
            positions[i] = Vec3::new(xy * upper.cos(), xy * upper.sin(), z);
            positions[i + 5] = Vec3::new(xy * lower.cos(), xy * lower.sin(), -z);
        }
        positions[TOP] = Vec3::new(0.0, 0.0, radius);
        positions[BOTTOM] = Vec3::new(0.0, 0.0, -radius);

        let mut ids = [VertexId(0); 12];
        for i in 0..5 {
            ids[i] = self.mesh.new_colored_vertex(positions[i], Some(color))?;
            ids[i + 5] = self.mesh.new_colored_vertex(positions[i + 5], Some(color))?;
        }
        ids[TOP] = self.mesh.new_colored_vertex(positions[TOP], Some(color))?;
        ids[BOTTOM] = self.mesh.new_colored_vertex(positions[BOTTOM], Some(color))?;
        Ok(ids)
    }

    fn subdivide(
        &mut self,
        lod: u32,
        v1: VertexId,
        v2: VertexId,
        v3: VertexId,
    ) -> Result<(), BuildError> {
        if lod >= self.options.max_detail {
            return self.mesh.add_triangle(v1, v2, v3);
        }

        let m12 = self.get_midpoint(lod, v1, v2)?;
        let m23 = self.get_midpoint(lod, v2, v3)?;
        let m13 = self.get_midpoint(lod, v1, v3)?;

        self.subdivide(lod + 1, v1, m13, m12)?;
        self.subdivide(lod + 1, v2, m12, m23)?;
        self.subdivide(lod + 1, v3, m23, m13)?;
        self.subdivide(lod + 1, m23, m12, m13)
    }

    /// The vertex halfway along edge `a`-`b`, pushed out to the sphere.
    ///
    /// Both orderings of the same edge return the same vertex until the next
    /// call to [`add_icosphere`](Self::add_icosphere).
    pub fn get_midpoint(&mut self, lod: u32, a: VertexId, b: VertexId) -> Result<VertexId, BuildError> {
        let key = (a.index().min(b.index()), a.index().max(b.index()));
        if let Some(&midpoint) = self.midpoints.get(&key) {
            return Ok(midpoint);
        }

        let sum = self.mesh.vertex(a)?.position() + self.mesh.vertex(b)?.position();
        let position = sum.normalize_or_zero() * self.options.radius;
        let midpoint = self
            .mesh
            .new_colored_vertex(position, Some(self.color_at(lod)))?;
        self.midpoints.insert(key, midpoint);
        Ok(midpoint)
    }

    pub fn build_mesh(&mut self, sink: &mut impl AssetSink) -> Result<MeshId, BuildError> {
        self.mesh.build_mesh(sink)
    }

    pub fn build(&mut self, sink: &mut impl AssetSink) -> Result<NodeId, BuildError> {
        self.mesh.build(sink)
    }
}
