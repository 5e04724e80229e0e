//! Quad-grid surfaces (planes, lathes and closed manifolds) with texture seam
//! duplication.

use glam::Vec2;
use itertools::iproduct;
use tracing::debug;

use super::topology::MeshAssembly;
use super::vertex::VertexId;
use crate::error::BuildError;

/// A `cols x rows` array of optional vertex handles. Empty cells leave holes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cells: Vec<Option<VertexId>>,
}

impl Grid {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![None; cols * rows],
        }
    }

    /// Builds a grid from columns. Short columns are padded with holes.
    pub fn from_columns(columns: Vec<Vec<VertexId>>) -> Self {
        let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self::new(columns.len(), rows);
        for (x, column) in columns.into_iter().enumerate() {
            grid.set_column(x, column);
        }
        grid
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get(&self, x: usize, y: usize) -> Option<VertexId> {
        if x >= self.cols || y >= self.rows {
            return None;
        }
        self.cells[x * self.rows + y]
    }

    /// Sets a cell. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, vertex: Option<VertexId>) {
        if x < self.cols && y < self.rows {
            self.cells[x * self.rows + y] = vertex;
        }
    }

    pub fn set_column(&mut self, x: usize, column: impl IntoIterator<Item = VertexId>) {
        for (y, vertex) in column.into_iter().enumerate() {
            self.set(x, y, Some(vertex));
        }
    }
}

/// `idx * part / max`, or 0 when there is nothing to interpolate across.
pub fn interp_float(max: usize, part: f32, idx: usize) -> f32 {
    if max == 0 {
        return 0.0;
    }
    idx as f32 * part / max as f32
}

impl MeshAssembly {
    /// A flat, open surface.
    pub fn add_plane(&mut self, grid: &Grid, textured: bool) -> Result<Grid, BuildError> {
        self.add_grid(grid, textured, false, false)
    }

    /// A surface of revolution, closed along the rows. Each column is one
    /// ring.
    pub fn add_lathe(&mut self, grid: &Grid, textured: bool) -> Result<Grid, BuildError> {
        self.add_grid(grid, textured, false, true)
    }

    /// A surface closed along both axes, like a torus.
    pub fn add_manifold(&mut self, grid: &Grid, textured: bool) -> Result<Grid, BuildError> {
        self.add_grid(grid, textured, true, true)
    }

    /// Triangulates `grid` and returns the grid that was finally rendered.
    ///
    /// When `textured`, the returned grid has one extra column and/or row for
    /// each wrapped axis. Those cells hold duplicates of the first column or
    /// row so the seam can carry both `u = 1` and `u = 0`.
    pub fn add_grid(
        &mut self,
        grid: &Grid,
        textured: bool,
        wrap_x: bool,
        wrap_y: bool,
    ) -> Result<Grid, BuildError> {
        debug!(
            mesh = self.name(),
            cols = grid.cols(),
            rows = grid.rows(),
            textured,
            wrap_x,
            wrap_y,
            "adding grid"
        );

        let first_index = self.index_len();
        self.render_grid(grid, wrap_x, wrap_y)?;
        if !textured {
            return Ok(grid.clone());
        }

        // Only the shading pass is discarded. Normals stay on the vertices.
        self.truncate_indices(first_index);
        let textured_grid = self.texture_grid(grid, wrap_x, wrap_y)?;

        let suppressed = self.normal_suppression();
        self.set_normal_suppression(true);
        let result = self.render_grid(&textured_grid, false, false);
        self.set_normal_suppression(suppressed);
        result?;

        Ok(textured_grid)
    }

    /// Emits one square per cell whose four corners are present.
    pub fn render_grid(&mut self, grid: &Grid, wrap_x: bool, wrap_y: bool) -> Result<(), BuildError> {
        let (cols, rows) = (grid.cols(), grid.rows());
        let x_start = usize::from(!wrap_x);
        let y_start = usize::from(!wrap_y);

        for (x, y) in iproduct!(x_start..cols, y_start..rows) {
            let x_prev = (x + cols - 1) % cols;
            let y_prev = (y + rows - 1) % rows;
            let corners = (
                grid.get(x_prev, y_prev),
                grid.get(x_prev, y),
                grid.get(x, y_prev),
                grid.get(x, y),
            );
            if let (Some(v0), Some(v1), Some(v2), Some(v3)) = corners {
                self.add_square(v0, v1, v2, v3)?;
            }
        }
        Ok(())
    }

    fn texture_grid(&mut self, grid: &Grid, wrap_x: bool, wrap_y: bool) -> Result<Grid, BuildError> {
        let (cols, rows) = (grid.cols(), grid.rows());
        if cols == 0 || rows == 0 {
            return Ok(grid.clone());
        }
        let tex_cols = cols + usize::from(wrap_x);
        let tex_rows = rows + usize::from(wrap_y);
        let mut textured = Grid::new(tex_cols, tex_rows);

        for (x, y) in iproduct!(0..tex_cols, 0..tex_rows) {
            let vertex = if x >= cols || y >= rows {
                let source = grid.get(x % cols, y % rows);
                source.map(|source| self.copy_vertex(source)).transpose()?
            } else {
                grid.get(x, y)
            };
            let Some(vertex) = vertex else {
                continue;
            };

            let u = interp_float(tex_cols - 1, 1.0, x);
            let v = interp_float(tex_rows - 1, 1.0, y);
            self.set_tex_coord(vertex, Vec2::new(u, v))?;
            textured.set(x, y, Some(vertex));
        }
        Ok(textured)
    }
}
