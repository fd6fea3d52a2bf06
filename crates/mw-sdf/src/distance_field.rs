//! Anti-aliased eight-point sequential Euclidean distance transform.
//!
//! Alpha is interpreted as shape coverage: `>= 1` is inside, `<= 0` is
//! outside, anything in between is an edge pixel whose distance is estimated
//! directly from its coverage and the local edge gradient.
//!
//! The transform runs in four ordered stages over a row-major buffer:
//! 1. edge gradient estimation (3x3 neighborhood, border pixels excluded),
//! 2. distance initialization,
//! 3. an upward and a downward raster sweep propagating nearest-edge offsets,
//! 4. an optional refinement that re-projects propagated offsets onto the
//!    edge gradient of the pixel they point at.
//!
//! Each sweep reads neighbors already visited in the same pass, so the scan
//! order below is part of the result.

use core::f32::consts::SQRT_2;

use mw_core::{Image, Vec2f};
use tracing::{debug, warn};

use crate::edge_delta::approximate_edge_delta;
use crate::error::{SdfError, SdfResult};

type Offset = (isize, isize);

// Upward sweep, rows top to bottom.
const UP_FIRST_COLUMN: [Offset; 2] = [(0, -1), (1, -1)];
const UP_INTERIOR: [Offset; 4] = [(-1, 0), (-1, -1), (0, -1), (1, -1)];
const UP_LAST_COLUMN: [Offset; 3] = [(-1, 0), (-1, -1), (0, -1)];
const UP_RETURN: [Offset; 1] = [(1, 0)];

// Downward sweep, rows bottom to top.
const DOWN_LAST_COLUMN: [Offset; 2] = [(0, 1), (-1, 1)];
const DOWN_INTERIOR: [Offset; 4] = [(1, 0), (1, 1), (0, 1), (-1, 1)];
const DOWN_FIRST_COLUMN: [Offset; 3] = [(1, 0), (1, 1), (0, 1)];
const DOWN_RETURN: [Offset; 1] = [(-1, 0)];

/// Resolved state of one pixel.
///
/// `(dx, dy)` is the offset from the pixel to the edge pixel it measured its
/// distance against; `(0, 0)` means the distance was set directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    pub distance: f32,
    pub dx: i32,
    pub dy: i32,
    pub gradient: Vec2f,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Cell {
    alpha: f32,
    gradient: Vec2f,
    distance: f32,
    dx: i32,
    dy: i32,
}

#[derive(Debug, Clone)]
pub struct DistanceField {
    cells: Image<Cell>,
    edge_pixels: usize,
}

impl DistanceField {
    /// Runs the full transform over `alpha` (row-major, `width * height`
    /// samples). Refinement runs when `post_process_distance > 0`.
    pub fn compute(
        alpha: &[f32],
        width: usize,
        height: usize,
        post_process_distance: f32,
    ) -> SdfResult<Self> {
        let mut field = Self::from_alpha(alpha, width, height)?;

        field.compute_edge_gradients();
        field.initialize_distances();
        field.sweep();
        if post_process_distance > 0.0 {
            field.post_process(post_process_distance);
        }

        let unresolved = field.distances().filter(|d| d.is_infinite()).count();
        debug!(
            "Distance field {}x{}: {} edge pixels, {} unresolved",
            width, height, field.edge_pixels, unresolved
        );
        if unresolved == field.cells.len() {
            warn!("Distance field has no edge or inside pixels; every distance is infinite");
        }

        Ok(field)
    }

    fn from_alpha(alpha: &[f32], width: usize, height: usize) -> SdfResult<Self> {
        if width == 0 || height == 0 {
            return Err(SdfError::EmptyImage);
        }
        let expected = width.checked_mul(height).ok_or(SdfError::SampleCountMismatch {
            expected: usize::MAX,
            actual: alpha.len(),
        })?;
        if alpha.len() != expected {
            return Err(SdfError::SampleCountMismatch {
                expected,
                actual: alpha.len(),
            });
        }

        let cells = alpha
            .iter()
            .map(|&a| Cell {
                alpha: a,
                ..Cell::default()
            })
            .collect();

        Ok(Self {
            cells: Image::from_vec(width, height, cells)?,
            edge_pixels: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.cells.width()
    }

    pub fn height(&self) -> usize {
        self.cells.height()
    }

    /// Number of pixels with `0 < alpha < 1`.
    pub fn edge_pixel_count(&self) -> usize {
        self.edge_pixels
    }

    pub fn sample(&self, x: usize, y: usize) -> Option<FieldSample> {
        self.cells.get(x, y).map(to_sample)
    }

    pub fn distance(&self, x: usize, y: usize) -> Option<f32> {
        self.cells.get(x, y).map(|c| c.distance)
    }

    /// Distances in row-major order.
    pub fn distances(&self) -> impl Iterator<Item = f32> + '_ {
        self.cells.data().iter().map(|c| c.distance)
    }

    pub fn into_samples(self) -> Image<FieldSample> {
        self.cells.map(to_sample)
    }

    fn compute_edge_gradients(&mut self) {
        let (w, h) = (self.cells.width(), self.cells.height());
        self.edge_pixels = 0;

        for y in 0..h {
            for x in 0..w {
                let Some(idx) = self.cells.index_of(x, y) else {
                    continue;
                };
                let alpha = self.cells.data()[idx].alpha;
                if !(alpha > 0.0 && alpha < 1.0) {
                    continue;
                }
                self.edge_pixels += 1;

                // Border pixels have an incomplete neighborhood and keep a zero gradient.
                if let Some(g) = self.edge_gradient(x, y) {
                    self.cells.data_mut()[idx].gradient = g;
                }
            }
        }
    }

    /// Unit gradient of the alpha field at `(x, y)` from its 3x3 neighborhood,
    /// or `None` if any neighbor lies outside the image.
    fn edge_gradient(&self, x: usize, y: usize) -> Option<Vec2f> {
        let at = |dx: isize, dy: isize| -> Option<f32> {
            let idx = self.cells.offset_index(x, y, dx, dy)?;
            Some(self.cells.data()[idx].alpha)
        };

        let nw = at(-1, -1)?;
        let n = at(0, -1)?;
        let ne = at(1, -1)?;
        let w = at(-1, 0)?;
        let e = at(1, 0)?;
        let sw = at(-1, 1)?;
        let s = at(0, 1)?;
        let se = at(1, 1)?;

        // Both components share the diagonal term.
        let diag = -nw - sw + ne + se;
        let gx = diag + (e - w) * SQRT_2;
        let gy = diag + (s - n) * SQRT_2;
        Some(Vec2f::new(gx, gy).normalize())
    }

    fn initialize_distances(&mut self) {
        for cell in self.cells.data_mut() {
            cell.dx = 0;
            cell.dy = 0;
            cell.distance = if cell.alpha <= 0.0 {
                f32::INFINITY
            } else if cell.alpha < 1.0 {
                approximate_edge_delta(cell.gradient.x, cell.gradient.y, cell.alpha)
            } else {
                0.0
            };
        }
    }

    fn sweep(&mut self) {
        let (w, h) = (self.cells.width(), self.cells.height());
        let last = w - 1;

        for y in 1..h {
            self.relax(0, y, &UP_FIRST_COLUMN);
            for x in 1..last {
                self.relax(x, y, &UP_INTERIOR);
            }
            if last > 0 {
                self.relax(last, y, &UP_LAST_COLUMN);
            }
            for x in (0..last).rev() {
                self.relax(x, y, &UP_RETURN);
            }
        }

        for y in (0..h - 1).rev() {
            self.relax(last, y, &DOWN_LAST_COLUMN);
            for x in (1..last).rev() {
                self.relax(x, y, &DOWN_INTERIOR);
            }
            if last > 0 {
                self.relax(0, y, &DOWN_FIRST_COLUMN);
            }
            for x in 1..w {
                self.relax(x, y, &DOWN_RETURN);
            }
        }
    }

    fn relax(&mut self, x: usize, y: usize, offsets: &[Offset]) {
        let Some(idx) = self.cells.index_of(x, y) else {
            return;
        };
        // Inside pixels, and edge pixels at or past the edge, are final.
        if self.cells.data()[idx].distance <= 0.0 {
            return;
        }
        for &(ox, oy) in offsets {
            self.update_distance(idx, x, y, ox, oy);
        }
    }

    fn update_distance(&mut self, idx: usize, x: usize, y: usize, ox: isize, oy: isize) {
        let Some(n_idx) = self.cells.offset_index(x, y, ox, oy) else {
            return;
        };
        let neighbor = self.cells.data()[n_idx];

        let Some(c_idx) = self.cells.offset_index(
            x,
            y,
            ox - neighbor.dx as isize,
            oy - neighbor.dy as isize,
        ) else {
            return;
        };
        let closest_alpha = self.cells.data()[c_idx].alpha;

        // The neighbor has nothing to offer yet, or would point back at us.
        if closest_alpha == 0.0 || c_idx == idx {
            return;
        }

        let dx = neighbor.dx - ox as i32;
        let dy = neighbor.dy - oy as i32;
        let distance = ((dx * dx + dy * dy) as f32).sqrt()
            + approximate_edge_delta(dx as f32, dy as f32, closest_alpha);

        let cell = &mut self.cells.data_mut()[idx];
        if distance < cell.distance {
            cell.distance = distance;
            cell.dx = dx;
            cell.dy = dy;
        }
    }

    /// Replaces lattice distances below `max_distance` with the distance to
    /// the edge hit point inside the pixel they point at, when that point
    /// falls within the pixel.
    fn post_process(&mut self, max_distance: f32) {
        let (w, h) = (self.cells.width(), self.cells.height());
        let mut refined = 0usize;

        for y in 0..h {
            for x in 0..w {
                let Some(idx) = self.cells.index_of(x, y) else {
                    continue;
                };
                let cell = self.cells.data()[idx];
                if (cell.dx == 0 && cell.dy == 0) || cell.distance >= max_distance {
                    continue;
                }

                let Some(c_idx) =
                    self.cells
                        .offset_index(x, y, -(cell.dx as isize), -(cell.dy as isize))
                else {
                    continue;
                };
                let closest = self.cells.data()[c_idx];
                let g = closest.gradient;
                if g.is_zero() {
                    continue;
                }

                let d = Vec2f::new(cell.dx as f32, cell.dy as f32);
                let df = approximate_edge_delta(g.x, g.y, closest.alpha);
                let t = g.perp_dot(d);
                let hit = g * -df + Vec2f::new(g.y, -g.x) * t;

                if hit.x.abs() <= 0.5 && hit.y.abs() <= 0.5 {
                    self.cells.data_mut()[idx].distance = (d + hit).norm();
                    refined += 1;
                }
            }
        }

        debug!(
            "Post-processed {} pixels within {} px of the edge",
            refined, max_distance
        );
    }
}

fn to_sample(cell: &Cell) -> FieldSample {
    FieldSample {
        distance: cell.distance,
        dx: cell.dx,
        dy: cell.dy,
        gradient: cell.gradient,
    }
}
