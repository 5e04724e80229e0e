//! Vertex/triangle accumulation and finalization of one mesh at a time.

use glam::{Mat4, Vec2, Vec3};
use tracing::{debug, warn};

use super::vertex::{FALLBACK_NORMAL, Vertex, VertexId};
use crate::buffer::{
    AssetSink, AttributeBuffer, AttributeSemantic, MaterialId, MeshId, NodeId, PrimitiveRecord,
    TopologyMode,
};
use crate::color::Rgba8;
use crate::error::{BuildError, EmptyReason};

/// Non-fatal substitutions made while assembling a mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A triangle's normal was degenerate and the fallback was used.
    FallbackFaceNormal { indices: [u32; 3] },
    /// A vertex had no usable normal contributions at build time.
    FallbackVertexNormal { index: u32 },
}

/// Axis-aligned bounds of the positions of the last built mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

/// Collects vertices and triangles for one mesh, then packs them.
///
/// Every position passed to [`new_vertex`](Self::new_vertex) goes through the
/// assembly's transform. By default the transform mirrors the X axis, which
/// converts the right-handed input space into the output convention; call
/// [`set_invert_x`](Self::set_invert_x) to turn that off.
///
/// After [`build`](Self::build) the assembly is empty again and can be
/// reused for the next mesh. Vertex handles from before the build are stale.
#[derive(Debug, Clone)]
pub struct MeshAssembly {
    name: String,
    mode: TopologyMode,
    transform: Mat4,
    invert_x: bool,
    vertices: Vec<Vertex>,
    indices: AttributeBuffer<u16>,
    suppress_normals: bool,
    emit_tangents: bool,
    material: Option<MaterialId>,
    bounds: Option<Bounds>,
    diagnostics: Vec<Diagnostic>,
}

impl MeshAssembly {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut transform = Mat4::IDENTITY;
        transform.x_axis.x = -1.0;
        Self {
            indices: AttributeBuffer::indices(format!("{name}-indices")),
            name,
            mode: TopologyMode::Triangles,
            transform,
            invert_x: true,
            vertices: Vec::new(),
            suppress_normals: false,
            emit_tangents: false,
            material: None,
            bounds: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.indices = AttributeBuffer::indices(format!("{}-indices", self.name));
    }

    pub fn mode(&self) -> TopologyMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TopologyMode) {
        self.mode = mode;
    }

    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    pub fn set_material(&mut self, material: Option<MaterialId>) {
        self.material = material;
    }

    pub fn set_emit_tangents(&mut self, emit: bool) {
        self.emit_tangents = emit;
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Replaces the whole transform. No X inversion is added.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        let flip = self.x_sign();
        self.transform.x_axis.x = scale.x * flip;
        self.transform.y_axis.y = scale.y;
        self.transform.z_axis.z = scale.z;
    }

    /// Moves `center` to the origin of the output space.
    pub fn set_center(&mut self, center: Vec3) {
        let mut translation = -center;
        translation.x *= self.x_sign();
        self.transform.w_axis = translation.extend(1.0);
    }

    pub fn set_invert_x(&mut self, invert: bool) {
        if invert != self.invert_x {
            self.transform.x_axis.x = -self.transform.x_axis.x;
            self.transform.w_axis.x = -self.transform.w_axis.x;
            self.invert_x = invert;
        }
    }

    fn x_sign(&self) -> f32 {
        if self.invert_x { -1.0 } else { 1.0 }
    }

    pub fn set_normal_suppression(&mut self, suppress: bool) {
        self.suppress_normals = suppress;
    }

    pub fn normal_suppression(&self) -> bool {
        self.suppress_normals
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        self.indices.values()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub(crate) fn index_len(&self) -> usize {
        self.indices.len()
    }

    pub(crate) fn truncate_indices(&mut self, len: usize) {
        self.indices.truncate(len);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Bounds of the most recently built mesh.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn min_bounds(&self) -> Option<Vec3> {
        self.bounds.map(|b| b.min)
    }

    pub fn max_bounds(&self) -> Option<Vec3> {
        self.bounds.map(|b| b.max)
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, BuildError> {
        self.vertices
            .get(id.0 as usize)
            .ok_or(BuildError::StaleVertex { index: id.0 })
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex, BuildError> {
        self.vertices
            .get_mut(id.0 as usize)
            .ok_or(BuildError::StaleVertex { index: id.0 })
    }

    /// Transforms `position` and appends a vertex for it.
    pub fn new_vertex(&mut self, position: Vec3) -> Result<VertexId, BuildError> {
        if !position.is_finite() {
            return Err(BuildError::InvalidGeometry {
                position: position.to_array(),
                stage: "input",
            });
        }
        let transformed = self.transform.transform_point3(position);
        if !transformed.is_finite() {
            return Err(BuildError::InvalidGeometry {
                position: transformed.to_array(),
                stage: "transformed",
            });
        }
        Ok(self.push_vertex(|index| Vertex::new(index, transformed)))
    }

    pub fn new_colored_vertex(
        &mut self,
        position: Vec3,
        color: Option<Rgba8>,
    ) -> Result<VertexId, BuildError> {
        let id = self.new_vertex(position)?;
        if let Some(color) = color {
            self.vertex_mut(id)?.set_color(color);
        }
        Ok(id)
    }

    /// Duplicates a vertex, including its accumulated normals and tangents.
    pub fn copy_vertex(&mut self, source: VertexId) -> Result<VertexId, BuildError> {
        let source = self.vertex(source)?.clone();
        Ok(self.push_vertex(|index| Vertex::copy_of(index, &source)))
    }

    fn push_vertex(&mut self, make: impl FnOnce(u32) -> Vertex) -> VertexId {
        let index = self.vertices.len() as u32;
        self.vertices.push(make(index));
        VertexId(index)
    }

    pub fn set_color(&mut self, id: VertexId, color: Rgba8) -> Result<(), BuildError> {
        self.vertex_mut(id)?.set_color(color);
        Ok(())
    }

    pub fn set_tex_coord(&mut self, id: VertexId, tex_coord: Vec2) -> Result<(), BuildError> {
        self.vertex_mut(id)?.set_tex_coord(tex_coord);
        Ok(())
    }

    /// Appends one triangle and, unless suppressed, credits its face normal
    /// to the three corners.
    ///
    /// The face normal is `normalize(cross(c - b, a - b))`. Nothing is
    /// recorded if any handle is stale or any index exceeds `u16`.
    pub fn add_triangle(&mut self, a: VertexId, b: VertexId, c: VertexId) -> Result<(), BuildError> {
        let [ia, ib, ic] = self.check_handles([a, b, c])?;
        let pa = self.vertices[a.0 as usize].position();
        let pb = self.vertices[b.0 as usize].position();
        let pc = self.vertices[c.0 as usize].position();
        for index in [ia, ib, ic] {
            self.indices.add(index);
        }

        if self.suppress_normals {
            return Ok(());
        }

        let normal = match (pc - pb).cross(pa - pb).try_normalize() {
            Some(normal) => normal,
            None => {
                let indices = [a.0, b.0, c.0];
                debug!(?indices, "degenerate triangle, using fallback normal");
                self.diagnostics
                    .push(Diagnostic::FallbackFaceNormal { indices });
                FALLBACK_NORMAL
            }
        };
        for id in [a, b, c] {
            self.vertices[id.0 as usize].add_normal(normal);
        }
        Ok(())
    }

    /// Two triangles `(v0, v1, v2)` and `(v2, v1, v3)` sharing the `v1`-`v2`
    /// diagonal.
    pub fn add_square(
        &mut self,
        v0: VertexId,
        v1: VertexId,
        v2: VertexId,
        v3: VertexId,
    ) -> Result<(), BuildError> {
        self.check_handles([v0, v1, v2, v3])?;
        self.add_triangle(v0, v1, v2)?;
        self.add_triangle(v2, v1, v3)?;

        let t01 = self.vertex(v0)?.position() - self.vertex(v1)?.position();
        let t23 = self.vertex(v2)?.position() - self.vertex(v3)?.position();
        for (id, tangent) in [(v0, t01), (v1, t01), (v2, t23), (v3, t23)] {
            self.vertices[id.0 as usize].add_tangent(tangent);
        }
        Ok(())
    }

    /// Index values for `ids`, failing on the first stale handle, then on
    /// the first index past `u16`.
    fn check_handles<const N: usize>(&self, ids: [VertexId; N]) -> Result<[u16; N], BuildError> {
        for id in ids {
            self.vertex(id)?;
        }
        let mut packed = [0u16; N];
        for (slot, id) in packed.iter_mut().zip(ids) {
            *slot = u16::try_from(id.0).map_err(|_| BuildError::IndexOverflow { index: id.0 })?;
        }
        Ok(packed)
    }

    /// Discards all vertices and indices without producing a mesh.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Validates and packs the current mesh into `sink`, then clears it.
    ///
    /// All validation happens before anything is appended, so an error
    /// leaves both the sink and this assembly unchanged.
    pub fn build_mesh(&mut self, sink: &mut impl AssetSink) -> Result<MeshId, BuildError> {
        if self.vertices.is_empty() {
            return Err(self.empty(EmptyReason::NoVertices));
        }
        if self.indices.is_empty() {
            return Err(self.empty(EmptyReason::NoIndices));
        }

        let name = &self.name;
        let mut positions = AttributeBuffer::vertex(format!("{name}-position"));
        let mut normals = AttributeBuffer::vertex(format!("{name}-normal"));
        let mut colors = AttributeBuffer::vertex(format!("{name}-color"));
        let mut tex_coords = AttributeBuffer::vertex(format!("{name}-texcoord"));
        let mut tangents = AttributeBuffer::vertex(format!("{name}-tangent"));
        let mut substituted = Vec::new();

        for vertex in &self.vertices {
            positions.add(vertex.position());
            if let Some(color) = vertex.color() {
                colors.add(color);
            }
            if let Some(tex_coord) = vertex.tex_coord() {
                tex_coords.add(tex_coord);
            }
            match vertex.try_resolve_normal() {
                Some(normal) => normals.add(normal),
                None => {
                    substituted.push(vertex.index());
                    normals.add(FALLBACK_NORMAL);
                }
            }
            if self.emit_tangents {
                tangents.add(vertex.resolve_tangent()?);
            }
        }

        let vertex_count = self.vertices.len();
        for (attribute, count) in [("COLOR_0", colors.len()), ("TEXCOORD_0", tex_coords.len())] {
            if count != 0 && count != vertex_count {
                return Err(BuildError::PartialAttributeCoverage {
                    attribute,
                    count,
                    vertex_count,
                });
            }
        }

        if !substituted.is_empty() {
            warn!(
                mesh = %self.name,
                count = substituted.len(),
                "vertices without normals, using fallback"
            );
            self.diagnostics.extend(
                substituted
                    .into_iter()
                    .map(|index| Diagnostic::FallbackVertexNormal { index }),
            );
        }

        let (Some(min), Some(max)) = (positions.min(), positions.max()) else {
            return Err(self.empty(EmptyReason::NoVertices));
        };

        let mesh = sink.allocate_mesh(&format!("{}-mesh", self.name));
        let mut attributes = Vec::new();
        for (semantic, packed) in [
            (AttributeSemantic::Position, positions.pack(sink)?),
            (AttributeSemantic::Normal, normals.pack(sink)?),
            (AttributeSemantic::Color0, colors.pack(sink)?),
            (AttributeSemantic::TexCoord0, tex_coords.pack(sink)?),
            (AttributeSemantic::Tangent, tangents.pack(sink)?),
        ] {
            if let Some(packed) = packed {
                attributes.push((semantic, packed.accessor));
            }
        }
        let indices = self.indices.pack(sink)?.map(|packed| packed.accessor);

        sink.bind_primitive(
            mesh,
            PrimitiveRecord {
                mode: self.mode,
                material: self.material,
                attributes,
                indices,
            },
        );

        debug!(
            mesh = %self.name,
            vertices = vertex_count,
            triangles = self.triangle_count(),
            "built mesh"
        );

        self.bounds = Some(Bounds { min, max });
        self.clear();
        Ok(mesh)
    }

    /// Builds the mesh and attaches it to a new node.
    pub fn build(&mut self, sink: &mut impl AssetSink) -> Result<NodeId, BuildError> {
        let mesh = self.build_mesh(sink)?;
        Ok(sink.add_node(&format!("{}-node", self.name), mesh))
    }

    fn empty(&self, reason: EmptyReason) -> BuildError {
        BuildError::EmptyMesh {
            name: self.name.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::GltfWriter;

    fn flat_assembly() -> MeshAssembly {
        let mut mesh = MeshAssembly::new("test");
        mesh.set_invert_x(false);
        mesh
    }

    #[test]
    fn test_transform_inverts_x_by_default() {
        let mut mesh = MeshAssembly::new("test");
        mesh.set_scale(Vec3::splat(2.0));
        mesh.set_center(Vec3::new(1.0, 1.0, 1.0));
        let id = mesh.new_vertex(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(mesh.vertex(id).unwrap().position(), Vec3::new(-1.0, 3.0, 5.0));

        mesh.set_invert_x(false);
        let id = mesh.new_vertex(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(mesh.vertex(id).unwrap().position(), Vec3::new(1.0, 3.0, 5.0));
    }

    #[test]
    fn test_non_finite_positions_rejected() {
        let mut mesh = flat_assembly();
        assert!(matches!(
            mesh.new_vertex(Vec3::new(f32::NAN, 0.0, 0.0)),
            Err(BuildError::InvalidGeometry { stage: "input", .. })
        ));

        mesh.set_scale(Vec3::splat(f32::MAX));
        assert!(matches!(
            mesh.new_vertex(Vec3::splat(f32::MAX)),
            Err(BuildError::InvalidGeometry {
                stage: "transformed",
                ..
            })
        ));
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_triangle_normal_orientation() {
        let mut mesh = flat_assembly();
        let a = mesh.new_vertex(Vec3::new(0.0, 0.0, 0.0)).unwrap();
        let b = mesh.new_vertex(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let c = mesh.new_vertex(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        mesh.add_triangle(a, b, c).unwrap();

        // cross(c - b, a - b) = cross((-1, 1, 0), (-1, 0, 0)) = (0, 0, 1)
        for id in [a, b, c] {
            assert_eq!(mesh.vertex(id).unwrap().resolve_normal(), Vec3::Z);
        }
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert!(mesh.diagnostics().is_empty());
    }

    #[test]
    fn test_degenerate_triangle_uses_fallback() {
        let mut mesh = flat_assembly();
        let a = mesh.new_vertex(Vec3::ZERO).unwrap();
        let b = mesh.new_vertex(Vec3::X).unwrap();
        let c = mesh.new_vertex(Vec3::X * 2.0).unwrap();
        mesh.add_triangle(a, b, c).unwrap();

        assert_eq!(
            mesh.diagnostics(),
            &[Diagnostic::FallbackFaceNormal { indices: [0, 1, 2] }]
        );
        let normal = mesh.vertex(b).unwrap().resolve_normal();
        assert!(normal.is_finite());
        assert!((normal.length() - 1.0).abs() < 1e-5);
        assert_eq!(mesh.take_diagnostics().len(), 1);
        assert!(mesh.diagnostics().is_empty());
    }

    #[test]
    fn test_suppressed_normals_still_write_indices() {
        let mut mesh = flat_assembly();
        let a = mesh.new_vertex(Vec3::ZERO).unwrap();
        let b = mesh.new_vertex(Vec3::X).unwrap();
        let c = mesh.new_vertex(Vec3::Y).unwrap();
        mesh.set_normal_suppression(true);
        mesh.add_triangle(a, b, c).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.vertex(a).unwrap().normal_contributions().is_empty());
    }

    #[test]
    fn test_square_tangents() {
        let mut mesh = flat_assembly();
        let v0 = mesh.new_vertex(Vec3::new(0.0, 0.0, 0.0)).unwrap();
        let v1 = mesh.new_vertex(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        let v2 = mesh.new_vertex(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let v3 = mesh.new_vertex(Vec3::new(1.0, 0.0, 1.0)).unwrap();
        mesh.add_square(v0, v1, v2, v3).unwrap();

        assert_eq!(mesh.indices(), &[0, 1, 2, 2, 1, 3]);
        assert_eq!(mesh.vertex(v0).unwrap().tangent_contributions(), &[-Vec3::Z]);
        assert_eq!(mesh.vertex(v3).unwrap().tangent_contributions(), &[-Vec3::Z]);
        // v1 and v2 sit on the shared diagonal
        assert_eq!(mesh.vertex(v1).unwrap().normal_contributions().len(), 2);
        assert_eq!(mesh.vertex(v2).unwrap().normal_contributions().len(), 2);
    }

    #[test]
    fn test_empty_mesh_commits_nothing() {
        let mut writer = GltfWriter::new();
        let mut mesh = flat_assembly();
        assert!(matches!(
            mesh.build(&mut writer),
            Err(BuildError::EmptyMesh {
                reason: EmptyReason::NoVertices,
                ..
            })
        ));

        mesh.new_vertex(Vec3::ZERO).unwrap();
        assert!(matches!(
            mesh.build(&mut writer),
            Err(BuildError::EmptyMesh {
                reason: EmptyReason::NoIndices,
                ..
            })
        ));

        assert!(writer.bin().is_empty());
        assert!(writer.accessors().is_empty());
        assert!(writer.root().meshes.is_empty());
        assert!(writer.root().nodes.is_empty());
    }

    #[test]
    fn test_partial_coverage_rejected() {
        let mut writer = GltfWriter::new();
        let mut mesh = flat_assembly();
        let a = mesh.new_colored_vertex(Vec3::ZERO, Some(Rgba8::RED)).unwrap();
        let b = mesh.new_vertex(Vec3::X).unwrap();
        let c = mesh.new_vertex(Vec3::Y).unwrap();
        mesh.add_triangle(a, b, c).unwrap();

        assert_eq!(
            mesh.build(&mut writer),
            Err(BuildError::PartialAttributeCoverage {
                attribute: "COLOR_0",
                count: 1,
                vertex_count: 3,
            })
        );
        assert!(writer.bin().is_empty());
        // the failed build keeps the mesh so the caller can fix it up
        assert_eq!(mesh.vertex_count(), 3);
        mesh.set_color(b, Rgba8::GREEN).unwrap();
        mesh.set_color(c, Rgba8::BLUE).unwrap();
        mesh.build(&mut writer).unwrap();
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_index_overflow() {
        let mut mesh = flat_assembly();
        let mut last = None;
        for i in 0..=65536u32 {
            last = Some(mesh.new_vertex(Vec3::new(i as f32, 0.0, 0.0)).unwrap());
        }
        let last = last.unwrap();
        assert_eq!(last.index(), 65536);

        let a = VertexId(0);
        let b = VertexId(1);
        assert_eq!(
            mesh.add_triangle(a, b, last),
            Err(BuildError::IndexOverflow { index: 65536 })
        );
        assert!(mesh.indices().is_empty());
        assert!(mesh.vertex(a).unwrap().normal_contributions().is_empty());
    }

    #[test]
    fn test_square_rejected_as_a_whole() {
        let mut mesh = flat_assembly();
        for i in 0..=65536u32 {
            mesh.new_vertex(Vec3::new((i % 2) as f32, (i / 2) as f32, 0.0))
                .unwrap();
        }
        let [v0, v1, v2, v3] = [0, 1, 2, 65536].map(VertexId);
        assert_eq!(
            mesh.add_square(v0, v1, v2, v3),
            Err(BuildError::IndexOverflow { index: 65536 })
        );
        assert!(mesh.indices().is_empty());
        for id in [v0, v1, v2] {
            assert!(mesh.vertex(id).unwrap().normal_contributions().is_empty());
            assert!(mesh.vertex(id).unwrap().tangent_contributions().is_empty());
        }

        // a stale fourth corner is caught the same way
        assert_eq!(
            mesh.add_square(v0, v1, v2, VertexId(70000)),
            Err(BuildError::StaleVertex { index: 70000 })
        );
        assert!(mesh.indices().is_empty());
    }

    #[test]
    fn test_stale_handles_after_build() {
        let mut writer = GltfWriter::new();
        let mut mesh = flat_assembly();
        let a = mesh.new_vertex(Vec3::ZERO).unwrap();
        let b = mesh.new_vertex(Vec3::X).unwrap();
        let c = mesh.new_vertex(Vec3::Y).unwrap();
        mesh.add_triangle(a, b, c).unwrap();
        mesh.build(&mut writer).unwrap();

        assert_eq!(
            mesh.add_triangle(a, b, c),
            Err(BuildError::StaleVertex { index: 0 })
        );
    }

    #[test]
    fn test_build_binds_attributes() {
        let mut writer = GltfWriter::new();
        let mut mesh = flat_assembly();
        mesh.set_emit_tangents(true);
        let v0 = mesh.new_vertex(Vec3::new(0.0, 0.0, 0.0)).unwrap();
        let v1 = mesh.new_vertex(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        let v2 = mesh.new_vertex(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let v3 = mesh.new_vertex(Vec3::new(1.0, 0.0, 1.0)).unwrap();
        mesh.add_square(v0, v1, v2, v3).unwrap();

        let id = mesh.build_mesh(&mut writer).unwrap();
        let primitive = &writer.primitives(id)[0];
        let semantics: Vec<_> = primitive.attributes.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            semantics,
            vec![
                AttributeSemantic::Position,
                AttributeSemantic::Normal,
                AttributeSemantic::Tangent
            ]
        );
        assert!(primitive.indices.is_some());
        assert_eq!(mesh.min_bounds(), Some(Vec3::ZERO));
        assert_eq!(mesh.max_bounds(), Some(Vec3::new(1.0, 0.0, 1.0)));

        // every normal written is unit length
        let accessor = &writer.accessors()[primitive.attributes[1].1.value()];
        let view = &writer.buffer_views()[accessor.view.value()];
        let start = view.byte_offset as usize;
        let floats: Vec<f32> = writer.bin()[start..start + view.byte_length as usize]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        for n in floats.chunks_exact(3) {
            let length = Vec3::new(n[0], n[1], n[2]).length();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_missing_tangents_fail_build() {
        let mut writer = GltfWriter::new();
        let mut mesh = flat_assembly();
        mesh.set_emit_tangents(true);
        let a = mesh.new_vertex(Vec3::ZERO).unwrap();
        let b = mesh.new_vertex(Vec3::X).unwrap();
        let c = mesh.new_vertex(Vec3::Y).unwrap();
        mesh.add_triangle(a, b, c).unwrap();
        assert_eq!(
            mesh.build(&mut writer),
            Err(BuildError::NoTangentData { index: 0 })
        );
        assert!(writer.bin().is_empty());
    }
}
