//! Input side of the tube generator.
//!
//! The generator only reads polylines through [`PolylineSource`], so any mesh
//! container can feed it. [`PolylineSet`] is the owned implementation used by
//! the wasm facade, the CLI and the tests.

use serde::{Deserialize, Serialize};

use super::{Point3, Vec3};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("{attribute} array has {len} entries but there are {points} points")]
    AttributeLengthMismatch {
        attribute: &'static str,
        len: usize,
        points: usize,
    },
    #[error("line {line} references point {point} but there are {points} points")]
    PointIndexOutOfRange {
        line: usize,
        point: usize,
        points: usize,
    },
}

/// Read-only access to polylines and their per-point attributes.
///
/// Point ids passed to the accessors always come from [`line`](Self::line)
/// and have been range checked against [`point_count`](Self::point_count).
pub trait PolylineSource {
    fn point_count(&self) -> usize;
    fn line_count(&self) -> usize;
    /// Point ids of line `index`, in order.
    fn line(&self, index: usize) -> &[usize];
    fn point(&self, id: usize) -> Point3;

    fn has_normals(&self) -> bool {
        false
    }
    fn normal(&self, _id: usize) -> Option<Vec3> {
        None
    }

    fn has_scalars(&self) -> bool {
        false
    }
    fn scalar(&self, _id: usize) -> Option<f64> {
        None
    }

    fn has_vectors(&self) -> bool {
        false
    }
    fn vector(&self, _id: usize) -> Option<Vec3> {
        None
    }

    /// Structural checks beyond line indices (attribute array lengths etc).
    fn validate(&self) -> Result<(), InputError> {
        Ok(())
    }
}

/// Owned polylines sharing one point array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolylineSet {
    pub points: Vec<[f64; 3]>,
    pub lines: Vec<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<[f64; 3]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalars: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectors: Option<Vec<[f64; 3]>>,
}

impl PolylineSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding a single line through `points`.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Self {
        let mut set = Self::new();
        set.push_polyline(points);
        set
    }

    /// Append `points` and a line through them; returns the line index.
    pub fn push_polyline(&mut self, points: &[Point3]) -> usize {
        let start = self.points.len();
        self.points.extend(points.iter().map(|p| p.to_array()));
        self.lines.push((start..start + points.len()).collect());
        self.lines.len() - 1
    }

    /// Append a line over existing point ids; returns the line index.
    pub fn push_line(&mut self, ids: Vec<usize>) -> usize {
        self.lines.push(ids);
        self.lines.len() - 1
    }

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<[f64; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    #[must_use]
    pub fn with_scalars(mut self, scalars: Vec<f64>) -> Self {
        self.scalars = Some(scalars);
        self
    }

    #[must_use]
    pub fn with_vectors(mut self, vectors: Vec<[f64; 3]>) -> Self {
        self.vectors = Some(vectors);
        self
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|err| format!("invalid polyline set: {err}"))
    }
}

impl PolylineSource for PolylineSet {
    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> &[usize] {
        &self.lines[index]
    }

    fn point(&self, id: usize) -> Point3 {
        Point3::from_array(self.points[id])
    }

    fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    fn normal(&self, id: usize) -> Option<Vec3> {
        self.normals.as_ref().map(|n| Vec3::from_array(n[id]))
    }

    fn has_scalars(&self) -> bool {
        self.scalars.is_some()
    }

    fn scalar(&self, id: usize) -> Option<f64> {
        self.scalars.as_ref().map(|s| s[id])
    }

    fn has_vectors(&self) -> bool {
        self.vectors.is_some()
    }

    fn vector(&self, id: usize) -> Option<Vec3> {
        self.vectors.as_ref().map(|v| Vec3::from_array(v[id]))
    }

    fn validate(&self) -> Result<(), InputError> {
        let points = self.points.len();
        let lengths = [
            ("normals", self.normals.as_ref().map(Vec::len)),
            ("scalars", self.scalars.as_ref().map(Vec::len)),
            ("vectors", self.vectors.as_ref().map(Vec::len)),
        ];
        for (attribute, len) in lengths {
            if let Some(len) = len.filter(|len| *len != points) {
                return Err(InputError::AttributeLengthMismatch {
                    attribute,
                    len,
                    points,
                });
            }
        }
        Ok(())
    }
}

/// Check that every line only references existing points.
pub(crate) fn check_line_indices<P: PolylineSource + ?Sized>(source: &P) -> Result<(), InputError> {
    let points = source.point_count();
    for line in 0..source.line_count() {
        if let Some(&point) = source.line(line).iter().find(|&&id| id >= points) {
            return Err(InputError::PointIndexOutOfRange { line, point, points });
        }
    }
    Ok(())
}
