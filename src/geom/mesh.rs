//! Output side of the tube generator.
//!
//! The generator only appends through [`TubeMeshSink`]. [`TubeMesh`] is the
//! owned implementation: strips and cap polygons are kept as emitted and can
//! be expanded to a triangle list for renderers that want one.

use serde::Serialize;

use super::{Point3, Vec3};

/// One output point as handed to a sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubePoint {
    pub position: Point3,
    /// Unit normal.
    pub normal: Vec3,
    pub tcoord: Option<f64>,
    /// Input scalar of the point this vertex was generated from.
    pub scalar: Option<f64>,
}

/// Which end of an open line a cap closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapEnd {
    Start,
    End,
}

/// A triangle strip along one side of one tube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TubeStrip {
    /// Source line index.
    pub line: usize,
    /// Side index in `0..number_of_sides`.
    pub side: usize,
    pub indices: Vec<u32>,
}

/// A convex cap polygon, wound so its normal faces away from the tube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TubeCap {
    pub line: usize,
    pub end: CapEnd,
    pub indices: Vec<u32>,
}

/// Append-only destination for generated tube geometry.
///
/// Point indices are `u32`. The generator skips a line with
/// [`LineDefect::IndexOverflow`](super::LineDefect::IndexOverflow) rather than
/// push points past `u32::MAX`.
pub trait TubeMeshSink {
    fn point_count(&self) -> usize;
    /// Appends a point and returns its index.
    fn push_point(&mut self, point: TubePoint) -> u32;
    fn push_strip(&mut self, strip: TubeStrip);
    fn push_cap(&mut self, cap: TubeCap);
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TubeMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    /// One texture coordinate per point when generation is enabled.
    pub tcoords: Option<Vec<f64>>,
    /// Input scalars copied onto the output points when the input had them.
    pub point_scalars: Option<Vec<f64>>,
    pub strips: Vec<TubeStrip>,
    pub caps: Vec<TubeCap>,
}

impl TubeMesh {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty mesh that stores texture coordinates and/or point scalars.
    #[must_use]
    pub fn with_layout(tcoords: bool, point_scalars: bool) -> Self {
        Self {
            tcoords: tcoords.then(Vec::new),
            point_scalars: point_scalars.then(Vec::new),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn strip_count(&self) -> usize {
        self.strips.len()
    }

    #[must_use]
    pub fn cap_count(&self) -> usize {
        self.caps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of triangles the strips and caps expand to.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        let strips: usize = self.strips.iter().map(|s| s.indices.len().saturating_sub(2)).sum();
        let caps: usize = self.caps.iter().map(|c| c.indices.len().saturating_sub(2)).sum();
        strips + caps
    }

    /// Strips for one source line, in side order.
    pub fn strips_for_line(&self, line: usize) -> impl Iterator<Item = &TubeStrip> + '_ {
        self.strips.iter().filter(move |s| s.line == line)
    }

    /// Expands strips (alternating winding) and fans caps into triangles.
    #[must_use]
    pub fn to_triangles(&self) -> Vec<[u32; 3]> {
        let mut triangles = Vec::with_capacity(self.triangle_count());
        for strip in &self.strips {
            for (j, w) in strip.indices.windows(3).enumerate() {
                if j % 2 == 0 {
                    triangles.push([w[0], w[1], w[2]]);
                } else {
                    triangles.push([w[1], w[0], w[2]]);
                }
            }
        }
        for cap in &self.caps {
            if let Some((&first, rest)) = cap.indices.split_first() {
                for pair in rest.windows(2) {
                    triangles.push([first, pair[0], pair[1]]);
                }
            }
        }
        triangles
    }

    /// Flat triangle index buffer: `[a0, b0, c0, a1, b1, c1, ...]`.
    #[must_use]
    pub fn triangle_indices(&self) -> Vec<u32> {
        self.to_triangles().into_iter().flatten().collect()
    }

    /// The position buffer as a flat slice: `[x0, y0, z0, x1, y1, z1, ...]`.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        self.positions.as_flattened()
    }

    #[must_use]
    pub fn normals_flat(&self) -> &[f64] {
        self.normals.as_flattened()
    }

    /// Returns true if any position or normal contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions_flat()
            .iter()
            .chain(self.normals_flat())
            .any(|c| !c.is_finite())
    }

    /// Returns true if every strip and cap index is within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len() as u32;
        self.strips
            .iter()
            .map(|s| &s.indices)
            .chain(self.caps.iter().map(|c| &c.indices))
            .all(|indices| indices.iter().all(|&i| i < n))
    }

    /// Returns true if all per-point buffers match `positions.len()`.
    #[must_use]
    pub fn has_valid_attribute_lengths(&self) -> bool {
        let n = self.positions.len();
        self.normals.len() == n
            && self.tcoords.as_ref().is_none_or(|t| t.len() == n)
            && self.point_scalars.as_ref().is_none_or(|s| s.len() == n)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.has_invalid_vertices() {
            return Err("tube mesh has invalid vertex data (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("tube mesh has out-of-bounds vertex indices".to_string());
        }
        if !self.has_valid_attribute_lengths() {
            return Err("tube mesh attribute buffers do not match vertex count".to_string());
        }
        if self.strips.iter().any(|s| s.indices.len() < 4) {
            return Err("tube mesh has a strip shorter than two rings".to_string());
        }
        if self.caps.iter().any(|c| c.indices.len() < 3) {
            return Err("tube mesh has a cap with fewer than 3 points".to_string());
        }
        Ok(())
    }
}

impl TubeMeshSink for TubeMesh {
    fn point_count(&self) -> usize {
        self.positions.len()
    }

    fn push_point(&mut self, point: TubePoint) -> u32 {
        // In range: `append_patch` checks the final index before pushing.
        let index = u32::try_from(self.positions.len()).unwrap_or(u32::MAX);
        self.positions.push(point.position.to_array());
        self.normals.push(point.normal.to_array());
        if let Some(tcoords) = self.tcoords.as_mut() {
            tcoords.push(point.tcoord.unwrap_or(0.0));
        }
        if let Some(scalars) = self.point_scalars.as_mut() {
            scalars.push(point.scalar.unwrap_or(0.0));
        }
        index
    }

    fn push_strip(&mut self, strip: TubeStrip) {
        self.strips.push(strip);
    }

    fn push_cap(&mut self, cap: TubeCap) {
        self.caps.push(cap);
    }
}
