//! Tubes extruded along a polyline.

use bon::Builder;
use glam::{Mat3, Mat4, Vec3};
use tracing::warn;

use super::grid::Grid;
use super::topology::MeshAssembly;
use crate::color::Rgba8;
use crate::error::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct PipeOptions {
    /// Tube radius, in the transformed coordinate system.
    #[builder(default = 0.1)]
    pub radius: f32,
    #[builder(default = 8)]
    pub sides: usize,
}

impl Default for PipeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipePoint {
    pub position: Vec3,
    pub color: Rgba8,
}

impl PipePoint {
    pub fn new(position: Vec3, color: Rgba8) -> Self {
        Self { position, color }
    }
}

/// Rotation whose Y axis is `axis`.
///
/// Fails when `axis` is parallel to +Z (or zero), since the frame is derived
/// from `cross(axis, +Z)`.
pub fn rotation_from_y(axis: Vec3) -> Result<Mat3, BuildError> {
    let degenerate = || BuildError::DegenerateRotationFrame {
        axis: axis.to_array(),
    };
    let z = axis.cross(Vec3::Z).try_normalize().ok_or_else(degenerate)?;
    let y = axis.try_normalize().ok_or_else(degenerate)?;
    let x = y.cross(z).try_normalize().ok_or_else(degenerate)?;
    Ok(Mat3::from_cols(x, y, z))
}

/// Average direction of the segments entering and leaving `points[idx]`.
fn pipe_axis(points: &[Vec3], idx: usize) -> Vec3 {
    let mut sum = Vec3::ZERO;
    let mut segments = 0;
    if idx > 0 {
        sum += (points[idx] - points[idx - 1]).normalize_or_zero();
        segments += 1;
    }
    if idx + 1 < points.len() {
        sum += (points[idx + 1] - points[idx]).normalize_or_zero();
        segments += 1;
    }
    if segments == 0 {
        return Vec3::ZERO;
    }
    sum / segments as f32
}

fn ring_frame(rotation: Mat3, center: Vec3) -> Mat4 {
    Mat4::from_cols(
        rotation.x_axis.extend(0.0),
        rotation.y_axis.extend(0.0),
        rotation.z_axis.extend(0.0),
        center.extend(1.0),
    )
}

impl MeshAssembly {
    /// Extrudes a closed tube through `points`, capping both ends.
    ///
    /// Points go through the current transform first. Each ring is then laid
    /// out in a frame aligned with the local direction of the polyline. Where
    /// no rotation can be derived the previous one (or the identity) is
    /// reused, still centered on the point.
    pub fn add_pipe(&mut self, points: &[PipePoint], options: &PipeOptions) -> Result<(), BuildError> {
        let original = self.transform();
        let rings = self.extrude_rings(points, options, original);
        self.set_transform(original);
        self.add_lathe(&rings?, false)?;
        Ok(())
    }

    fn extrude_rings(
        &mut self,
        points: &[PipePoint],
        options: &PipeOptions,
        original: Mat4,
    ) -> Result<Grid, BuildError> {
        let transformed: Vec<Vec3> = points
            .iter()
            .map(|point| original.transform_point3(point.position))
            .collect();

        let mut grid = Grid::new(points.len(), options.sides);
        let mut rotation = Mat3::IDENTITY;
        for (idx, point) in points.iter().enumerate() {
            match rotation_from_y(pipe_axis(&transformed, idx)) {
                Ok(frame) => rotation = frame,
                Err(err) => warn!(index = idx, %err, "keeping previous pipe rotation"),
            }
            self.set_transform(ring_frame(rotation, transformed[idx]));

            let ring =
                self.add_circle_vertices_xz(Vec3::ZERO, options.radius, options.sides, Some(point.color))?;
            grid.set_column(idx, ring);

            if idx == 0 {
                self.add_disc_xz(Vec3::ZERO, -options.radius, options.sides, Some(point.color))?;
            } else if idx + 1 == points.len() {
                self.add_disc_xz(Vec3::ZERO, options.radius, options.sides, Some(point.color))?;
            }
        }
        Ok(grid)
    }
}
