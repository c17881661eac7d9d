//! Diagnostics for tube generation.
//!
//! A bad polyline never fails a whole invocation. It is skipped and recorded
//! here as a [`SkippedLine`] so callers can report what was left out.
//!
//! # Example
//!
//! ```ignore
//! use tube_engine::geom::{generate_tubes, PolylineSet, TubeConfig};
//!
//! let (mesh, diagnostics) = generate_tubes(&lines, &TubeConfig::default())?;
//!
//! if !diagnostics.is_clean() {
//!     for skipped in &diagnostics.skipped {
//!         eprintln!("line {} skipped: {}", skipped.line, skipped.defect);
//!     }
//! }
//! ```

use std::fmt;

use serde::Serialize;

use super::metrics::TubeTimingReport;

/// Why a single polyline produced no tube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineDefect {
    #[error("line has {count} point(s); at least 2 are required")]
    TooFewPoints { count: usize },
    #[error("point {index} coincides with its predecessor")]
    CoincidentPoints { index: usize },
    #[error("normal at point {index} is parallel to the line")]
    ParallelNormal { index: usize },
    #[error("line has non-finite coordinates or attributes")]
    NonFiniteInput,
    #[error("no normal could be generated for the line")]
    NormalGeneration,
    #[error("tube points would exceed the 32-bit index range of the mesh")]
    IndexOverflow,
}

/// A polyline that was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// Index of the line in the input.
    pub line: usize,
    pub defect: LineDefect,
}

/// Counts and notes collected while generating tubes.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TubeDiagnostics {
    /// Number of polylines in the input.
    pub line_count: usize,

    /// Number of polylines that received a tube.
    pub tubed_line_count: usize,

    /// Total number of output points (ring and cap points).
    pub vertex_count: usize,

    /// Number of triangle strips emitted.
    pub strip_count: usize,

    /// Number of cap polygons emitted.
    pub cap_count: usize,

    /// Number of triangles the strips and caps expand to.
    pub triangle_count: usize,

    /// Lines that were skipped, in input order.
    pub skipped: Vec<SkippedLine>,

    /// Optional per-phase timing.
    ///
    /// Only populated when the `tube_metrics` feature is enabled and the
    /// target is not WASM.
    pub timing: Option<TubeTimingReport>,

    /// Human-readable notes, e.g. a zero scalar range on a line.
    pub warnings: Vec<String>,
}

impl TubeDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn skipped_line_count(&self) -> usize {
        self.skipped.len()
    }

    /// Returns `true` if every line was tubed and nothing was noted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn record_skip(&mut self, line: usize, defect: LineDefect) {
        self.skipped.push(SkippedLine { line, defect });
    }

    /// Number of skipped lines whose defect matches `pred`.
    #[must_use]
    pub fn count_skipped(&self, pred: impl Fn(&LineDefect) -> bool) -> usize {
        self.skipped.iter().filter(|s| pred(&s.defect)).count()
    }

    /// Merges another diagnostics struct into this one.
    ///
    /// Line indices in `other.skipped` are shifted by this struct's
    /// `line_count`, matching how two inputs would be concatenated.
    /// `timing` from `other` is ignored.
    pub fn merge(&mut self, other: &TubeDiagnostics) {
        let shift = self.line_count;
        self.line_count += other.line_count;
        self.tubed_line_count += other.tubed_line_count;
        self.vertex_count += other.vertex_count;
        self.strip_count += other.strip_count;
        self.cap_count += other.cap_count;
        self.triangle_count += other.triangle_count;
        self.skipped.extend(other.skipped.iter().map(|s| SkippedLine {
            line: s.line + shift,
            defect: s.defect.clone(),
        }));
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"lines:{tubed}/{total} V:{vertices} S:{strips} T:{triangles} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("lines:{}/{}", self.tubed_line_count, self.line_count),
            format!("V:{} S:{} T:{}", self.vertex_count, self.strip_count, self.triangle_count),
        ];

        if self.cap_count > 0 {
            parts.push(format!("caps:{}", self.cap_count));
        }
        if !self.skipped.is_empty() {
            parts.push(format!("skipped:{}", self.skipped.len()));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("warnings:{}", self.warnings.len()));
        }

        parts.join(" ")
    }
}

impl fmt::Display for TubeDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tube Diagnostics:")?;
        writeln!(f, "  Lines: {} ({} tubed)", self.line_count, self.tubed_line_count)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Strips: {}", self.strip_count)?;
        writeln!(f, "  Caps: {}", self.cap_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;

        if !self.skipped.is_empty() {
            writeln!(f, "  Skipped lines:")?;
            for skipped in &self.skipped {
                writeln!(f, "    - line {}: {}", skipped.line, skipped.defect)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {}", warning)?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_clean() {
            "CLEAN"
        } else if self.tubed_line_count > 0 {
            "PARTIAL"
        } else {
            "EMPTY"
        };
        writeln!(f, "  Status: {}", status)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_clean() {
        let diag = TubeDiagnostics::default();
        assert!(diag.is_clean());
        assert!(!diag.has_warnings());
        assert_eq!(diag.skipped_line_count(), 0);
    }

    #[test]
    fn test_record_skip() {
        let mut diag = TubeDiagnostics::new();
        diag.record_skip(2, LineDefect::CoincidentPoints { index: 1 });
        diag.record_skip(5, LineDefect::TooFewPoints { count: 1 });

        assert!(!diag.is_clean());
        assert_eq!(diag.skipped_line_count(), 2);
        assert_eq!(
            diag.count_skipped(|d| matches!(d, LineDefect::CoincidentPoints { .. })),
            1
        );
    }

    #[test]
    fn test_merge_shifts_line_indices() {
        let mut first = TubeDiagnostics {
            line_count: 3,
            tubed_line_count: 3,
            vertex_count: 30,
            strip_count: 9,
            ..Default::default()
        };
        let mut second = TubeDiagnostics {
            line_count: 2,
            tubed_line_count: 1,
            vertex_count: 10,
            strip_count: 3,
            cap_count: 2,
            warnings: vec!["note".to_string()],
            ..Default::default()
        };
        second.record_skip(1, LineDefect::NonFiniteInput);

        first.merge(&second);

        assert_eq!(first.line_count, 5);
        assert_eq!(first.tubed_line_count, 4);
        assert_eq!(first.vertex_count, 40);
        assert_eq!(first.strip_count, 12);
        assert_eq!(first.cap_count, 2);
        assert_eq!(first.skipped[0].line, 4);
        assert_eq!(first.warnings.len(), 1);
    }

    #[test]
    fn test_summary() {
        let mut diag = TubeDiagnostics {
            line_count: 4,
            tubed_line_count: 3,
            vertex_count: 120,
            strip_count: 24,
            triangle_count: 200,
            cap_count: 6,
            ..Default::default()
        };
        diag.record_skip(0, LineDefect::TooFewPoints { count: 1 });

        let summary = diag.summary();
        assert!(summary.contains("lines:3/4"));
        assert!(summary.contains("V:120"));
        assert!(summary.contains("S:24"));
        assert!(summary.contains("caps:6"));
        assert!(summary.contains("skipped:1"));
    }

    #[test]
    fn test_display() {
        let mut diag = TubeDiagnostics {
            line_count: 2,
            tubed_line_count: 1,
            vertex_count: 12,
            ..Default::default()
        };
        diag.record_skip(1, LineDefect::ParallelNormal { index: 2 });

        let output = format!("{}", diag);
        assert!(output.contains("Vertices: 12"));
        assert!(output.contains("line 1: normal at point 2 is parallel to the line"));
        assert!(output.contains("PARTIAL"));
    }
}
