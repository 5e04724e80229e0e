//! Circles, discs and cylinders in the XZ plane.

use std::f32::consts::TAU;

use glam::Vec3;
use itertools::Itertools;

use super::grid::Grid;
use super::topology::MeshAssembly;
use super::vertex::VertexId;
use crate::color::Rgba8;
use crate::error::BuildError;

impl MeshAssembly {
    /// A ring of `sides` vertices around `center`, at the center's height.
    ///
    /// A negative radius walks the ring the other way, which flips the
    /// winding of anything built from it.
    pub fn add_circle_vertices_xz(
        &mut self,
        center: Vec3,
        radius: f32,
        sides: usize,
        color: Option<Rgba8>,
    ) -> Result<Vec<VertexId>, BuildError> {
        let direction = radius.signum();
        let radius = radius.abs();

        (0..sides)
            .map(|i| {
                let angle = TAU * i as f32 * direction / sides as f32;
                let position = Vec3::new(
                    angle.sin() * radius + center.x,
                    center.y,
                    angle.cos() * radius + center.z,
                );
                self.new_colored_vertex(position, color)
            })
            .collect()
    }

    /// A triangle fan closing a ring. See
    /// [`add_circle_vertices_xz`](Self::add_circle_vertices_xz) for the sign
    /// of `radius`.
    pub fn add_disc_xz(
        &mut self,
        center: Vec3,
        radius: f32,
        sides: usize,
        color: Option<Rgba8>,
    ) -> Result<(), BuildError> {
        let hub = self.new_colored_vertex(center, color)?;
        let ring = self.add_circle_vertices_xz(center, radius, sides, color)?;
        for (&last, &current) in ring.iter().circular_tuple_windows() {
            self.add_triangle(last, current, hub)?;
        }
        Ok(())
    }

    /// A closed cylinder standing on `bottom`.
    pub fn add_cylinder_xz(
        &mut self,
        bottom: Vec3,
        radius: f32,
        height: f32,
        sides: usize,
        color: Option<Rgba8>,
    ) -> Result<(), BuildError> {
        let top = bottom + Vec3::new(0.0, height, 0.0);
        let top_ring = self.add_circle_vertices_xz(top, radius, sides, color)?;
        let bottom_ring = self.add_circle_vertices_xz(bottom, radius, sides, color)?;

        let grid = Grid::from_columns(vec![bottom_ring, top_ring]);
        self.add_lathe(&grid, false)?;

        self.add_disc_xz(top, radius, sides, color)?;
        self.add_disc_xz(bottom, -radius, sides, color)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_assembly() -> MeshAssembly {
        let mut mesh = MeshAssembly::new("shape");
        mesh.set_invert_x(false);
        mesh
    }

    #[test]
    fn test_circle_positions() {
        let mut mesh = flat_assembly();
        let ring = mesh
            .add_circle_vertices_xz(Vec3::new(0.0, 2.0, 0.0), 1.0, 4, Some(Rgba8::RED))
            .unwrap();
        assert_eq!(ring.len(), 4);

        let first = mesh.vertex(ring[0]).unwrap();
        assert!((first.position() - Vec3::new(0.0, 2.0, 1.0)).length() < 1e-6);
        assert_eq!(first.color(), Some(Rgba8::RED));
        let second = mesh.vertex(ring[1]).unwrap().position();
        assert!((second - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);

        let reversed = mesh
            .add_circle_vertices_xz(Vec3::ZERO, -1.0, 4, None)
            .unwrap();
        let second = mesh.vertex(reversed[1]).unwrap().position();
        assert!((second - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_disc_faces_point_along_y() {
        let mut mesh = flat_assembly();
        mesh.add_disc_xz(Vec3::ZERO, 1.0, 8, None).unwrap();
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.triangle_count(), 8);
        let up = mesh.vertices()[0].resolve_normal();

        let mut mesh = flat_assembly();
        mesh.add_disc_xz(Vec3::ZERO, -1.0, 8, None).unwrap();
        let down = mesh.vertices()[0].resolve_normal();

        assert!((up.y.abs() - 1.0).abs() < 1e-5);
        assert!((up + down).length() < 1e-5);
    }

    #[test]
    fn test_cylinder_counts() {
        let mut mesh = flat_assembly();
        mesh.add_cylinder_xz(Vec3::ZERO, 1.0, 2.0, 6, Some(Rgba8::GREEN))
            .unwrap();
        // two rings, then a hub and ring for each cap
        assert_eq!(mesh.vertex_count(), 6 * 2 + 2 * (6 + 1));
        // side quads plus two fans
        assert_eq!(mesh.triangle_count(), 6 * 2 + 6 * 2);
        assert!(mesh.diagnostics().is_empty());
    }
}
