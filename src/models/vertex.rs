use glam::{Vec2, Vec3, Vec4};

use crate::color::Rgba8;
use crate::error::BuildError;

/// `normalize(1, 1, 1)`, substituted for normals that cannot be resolved.
pub const FALLBACK_NORMAL: Vec3 = Vec3::new(
    0.577_350_26,
    0.577_350_26,
    0.577_350_26,
);

/// Handle to a vertex owned by a [`MeshAssembly`](super::topology::MeshAssembly).
///
/// The wrapped value is the vertex's index within its mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub(crate) u32);

impl VertexId {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    index: u32,
    position: Vec3,
    tex_coord: Option<Vec2>,
    color: Option<Rgba8>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
}

impl Vertex {
    pub(crate) fn new(index: u32, position: Vec3) -> Self {
        Self {
            index,
            position,
            tex_coord: None,
            color: None,
            normals: Vec::new(),
            tangents: Vec::new(),
        }
    }

    /// Clone of `source` under a new index. Later edits to either vertex do
    /// not affect the other.
    pub(crate) fn copy_of(index: u32, source: &Vertex) -> Self {
        Self {
            index,
            ..source.clone()
        }
    }

    pub fn id(&self) -> VertexId {
        VertexId(self.index)
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Position after the owning mesh's transform was applied.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn tex_coord(&self) -> Option<Vec2> {
        self.tex_coord
    }

    pub fn set_tex_coord(&mut self, tex_coord: Vec2) {
        self.tex_coord = Some(tex_coord);
    }

    pub fn color(&self) -> Option<Rgba8> {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.color = Some(color);
    }

    pub fn normal_contributions(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tangent_contributions(&self) -> &[Vec3] {
        &self.tangents
    }

    pub(crate) fn add_normal(&mut self, normal: Vec3) {
        self.normals.push(normal);
    }

    pub(crate) fn add_tangent(&mut self, tangent: Vec3) {
        self.tangents.push(tangent);
    }

    /// Normalized sum of the face normals, or `None` when there are none or
    /// they cancel out.
    pub fn try_resolve_normal(&self) -> Option<Vec3> {
        if self.normals.is_empty() {
            return None;
        }
        self.normals.iter().sum::<Vec3>().try_normalize()
    }

    pub fn resolve_normal(&self) -> Vec3 {
        self.try_resolve_normal().unwrap_or_else(|| {
            tracing::warn!(index = self.index, "vertex normal unresolved, using fallback");
            FALLBACK_NORMAL
        })
    }

    pub fn resolve_tangent(&self) -> Result<Vec4, BuildError> {
        if self.tangents.is_empty() {
            return Err(BuildError::NoTangentData { index: self.index });
        }
        let tangent = self
            .tangents
            .iter()
            .sum::<Vec3>()
            .try_normalize()
            .unwrap_or(FALLBACK_NORMAL);
        Ok(tangent.extend(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_unit() {
        assert!((FALLBACK_NORMAL.length() - 1.0).abs() < 1e-6);
        assert!((FALLBACK_NORMAL - Vec3::ONE.normalize()).length() < 1e-6);
    }

    #[test]
    fn test_resolve_normal() {
        let mut vertex = Vertex::new(0, Vec3::ZERO);
        assert_eq!(vertex.try_resolve_normal(), None);
        assert_eq!(vertex.resolve_normal(), FALLBACK_NORMAL);

        vertex.add_normal(Vec3::Y);
        vertex.add_normal(Vec3::X);
        let normal = vertex.resolve_normal();
        assert!((normal.length() - 1.0).abs() < 1e-5);
        assert!((normal - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);

        vertex.add_normal(-Vec3::X);
        vertex.add_normal(-Vec3::Y);
        assert_eq!(vertex.try_resolve_normal(), None);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut vertex = Vertex::new(3, Vec3::new(1.0, 2.0, 3.0));
        vertex.set_color(Rgba8::RED);
        vertex.add_normal(Vec3::Z);

        let mut copy = Vertex::copy_of(7, &vertex);
        assert_eq!(copy.index(), 7);
        assert_eq!(copy.position(), vertex.position());
        assert_eq!(copy.normal_contributions(), vertex.normal_contributions());

        copy.add_normal(Vec3::X);
        vertex.set_color(Rgba8::BLUE);
        assert_eq!(vertex.normal_contributions().len(), 1);
        assert_eq!(copy.color(), Some(Rgba8::RED));
    }

    #[test]
    fn test_resolve_tangent() {
        let mut vertex = Vertex::new(1, Vec3::ZERO);
        assert_eq!(
            vertex.resolve_tangent(),
            Err(BuildError::NoTangentData { index: 1 })
        );
        vertex.add_tangent(Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(vertex.resolve_tangent(), Ok(Vec4::new(1.0, 0.0, 0.0, 1.0)));
    }
}
