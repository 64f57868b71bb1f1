//! Pinhole projection of wireframes onto a 2D canvas.
//!
//! Points are divided by their depth (`x/z`, `y/z`) and then mapped into
//! the viewport. The canvas is `width` wide, so the horizontal unit spans
//! the full width and the vertical extent follows the aspect ratio.

use super::core::{Point3, Tolerance};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("line index buffer has odd length {0}")]
    OddIndexCount(usize),
    #[error("line index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: usize, vertex_count: usize },
    #[error("viewport must have positive finite size, got {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Result<Self, ProjectionError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(ProjectionError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    #[must_use]
    pub fn aspect(self) -> f64 {
        self.width / self.height
    }

    /// Map image-plane coordinates to canvas pixels.
    #[must_use]
    pub fn to_canvas(self, xy: [f64; 2]) -> [f64; 2] {
        [
            (xy[0] + 0.5) * self.width,
            (xy[1] + 0.5 / self.aspect()) * self.width,
        ]
    }
}

/// `(x/z, y/z)`; `None` when the point lies on the `z = 0` plane.
#[must_use]
pub fn perspective_divide(p: Point3) -> Option<[f64; 2]> {
    if p.z.abs() <= Tolerance::ZERO_LENGTH.eps {
        return None;
    }
    Some([p.x / p.z, p.y / p.z])
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedWireframe {
    /// Canvas-space segments `[start, end]`.
    pub segments: Vec<[[f64; 2]; 2]>,
    /// Segments dropped because an endpoint had zero depth.
    pub skipped: usize,
}

/// Project line pairs `(indices[2k], indices[2k+1])` onto the canvas.
pub fn project_wireframe(
    positions: &[Point3],
    line_indices: &[usize],
    viewport: Viewport,
) -> Result<ProjectedWireframe, ProjectionError> {
    if line_indices.len() % 2 != 0 {
        return Err(ProjectionError::OddIndexCount(line_indices.len()));
    }
    let vertex_count = positions.len();
    let lookup = |index: usize| {
        positions
            .get(index)
            .copied()
            .ok_or(ProjectionError::IndexOutOfRange {
                index,
                vertex_count,
            })
    };

    let mut out = ProjectedWireframe::default();
    for pair in line_indices.chunks_exact(2) {
        let a = lookup(pair[0])?;
        let b = lookup(pair[1])?;
        match (perspective_divide(a), perspective_divide(b)) {
            (Some(a), Some(b)) => out
                .segments
                .push([viewport.to_canvas(a), viewport.to_canvas(b)]),
            _ => out.skipped += 1,
        }
    }
    if out.skipped > 0 {
        log::debug!("projection skipped {} zero-depth segments", out.skipped);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optical_axis_maps_to_canvas_centre_column() {
        let viewport = Viewport::new(800.0, 600.0).unwrap();
        let uv = viewport.to_canvas(perspective_divide(Point3::new(0.0, 0.0, 1.0)).unwrap());
        assert!((uv[0] - 400.0).abs() < 1e-9);
        assert!((uv[1] - 300.0).abs() < 1e-9);
    }

    #[test]
    fn zero_depth_segments_are_skipped() {
        let positions = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let viewport = Viewport::new(100.0, 100.0).unwrap();
        let result = project_wireframe(&positions, &[0, 1, 1, 2], viewport).unwrap();
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn malformed_index_buffers() {
        let viewport = Viewport::new(100.0, 100.0).unwrap();
        let positions = [Point3::new(0.0, 0.0, 1.0)];
        assert_eq!(
            project_wireframe(&positions, &[0], viewport),
            Err(ProjectionError::OddIndexCount(1))
        );
        assert!(matches!(
            project_wireframe(&positions, &[0, 3], viewport),
            Err(ProjectionError::IndexOutOfRange { index: 3, .. })
        ));
        assert!(Viewport::new(0.0, 10.0).is_err());
    }
}
