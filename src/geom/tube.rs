//! Tube surfaces around polylines.
//!
//! Every line is built on its own into a [`LinePatch`] with local point
//! indices. Patches are appended to the sink in line order, so the output
//! numbering does not depend on whether lines were built in parallel.

use super::config::{ConfigError, TCoordMode, TubeConfig};
use super::diagnostics::{LineDefect, TubeDiagnostics};
use super::frame::{
    RingFrame, close_sliding_normals, ring_frame, segment_directions, sliding_normals,
};
use super::mesh::{CapEnd, TubeCap, TubeMesh, TubeMeshSink, TubePoint, TubeStrip};
use super::metrics::{TimingBucket, TubeMetrics};
use super::polyline::{InputError, PolylineSource, check_line_indices};
use super::radius::{LineAttributes, line_radii};
use super::{Point3, Tolerance, Vec3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Closed loops need at least three distinct points plus the repeated one.
const MIN_CLOSED_POINTS: usize = 4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TubeError {
    #[error("invalid tube configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid polyline input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("`{mode}` mode requires point scalars but the input has none")]
    MissingScalars { mode: &'static str },
    #[error("radius by vector requires point vectors but the input has none")]
    MissingVectors,
}

/// Builds tube meshes for one configuration.
#[derive(Debug, Clone)]
pub struct TubeGenerator {
    config: TubeConfig,
    tol: Tolerance,
}

impl TubeGenerator {
    #[must_use]
    pub fn new(config: TubeConfig) -> Self {
        Self {
            config,
            tol: Tolerance::default_geom(),
        }
    }

    /// Tolerance for coincident points and closed-loop detection.
    #[must_use]
    pub fn with_tolerance(mut self, tol: Tolerance) -> Self {
        self.tol = tol;
        self
    }

    #[must_use]
    pub fn config(&self) -> &TubeConfig {
        &self.config
    }

    /// Builds tubes for every line of `source` into a fresh [`TubeMesh`].
    pub fn generate<P>(&self, source: &P) -> Result<(TubeMesh, TubeDiagnostics), TubeError>
    where
        P: PolylineSource + Sync + ?Sized,
    {
        let mut mesh =
            TubeMesh::with_layout(self.config.generate_tcoords().is_enabled(), source.has_scalars());
        let diagnostics = self.generate_into(source, &mut mesh)?;
        Ok((mesh, diagnostics))
    }

    /// Builds tubes for every line of `source` and appends them to `sink`.
    ///
    /// Nothing is written to `sink` when an error is returned.
    pub fn generate_into<P, S>(&self, source: &P, sink: &mut S) -> Result<TubeDiagnostics, TubeError>
    where
        P: PolylineSource + Sync + ?Sized,
        S: TubeMeshSink + ?Sized,
    {
        let mut metrics = TubeMetrics::default();
        metrics.begin();

        metrics.time(TimingBucket::Validation, || self.check_input(source))?;

        let line_count = source.line_count();
        log::debug!(
            "tube: {} line(s), {} point(s), {} side(s), radius {} ({})",
            line_count,
            source.point_count(),
            self.config.number_of_sides(),
            self.config.radius(),
            self.config.vary_radius()
        );

        let outcomes = self.build_lines(source);

        let mut diagnostics = TubeDiagnostics {
            line_count,
            ..TubeDiagnostics::default()
        };
        let first_point = sink.point_count();

        for (line, outcome) in outcomes.into_iter().enumerate() {
            metrics.absorb(&outcome.metrics);
            for note in outcome.notes {
                diagnostics.add_warning(format!("line {line}: {note}"));
            }
            let appended = outcome.patch.and_then(|patch| {
                metrics.time(TimingBucket::Merge, || {
                    append_patch(line, patch, &mut *sink, &mut diagnostics)
                })
            });
            match appended {
                Ok(()) => diagnostics.tubed_line_count += 1,
                Err(defect) => {
                    log::warn!("tube: skipping line {line}: {defect}");
                    diagnostics.record_skip(line, defect);
                }
            }
        }

        diagnostics.vertex_count = sink.point_count() - first_point;
        diagnostics.timing = metrics.end();
        log::debug!("tube: {}", diagnostics.summary());

        Ok(diagnostics)
    }

    fn check_input<P>(&self, source: &P) -> Result<(), TubeError>
    where
        P: PolylineSource + ?Sized,
    {
        let vary = self.config.vary_radius();
        if vary.needs_scalars() && !source.has_scalars() {
            return Err(TubeError::MissingScalars { mode: vary.as_str() });
        }
        if vary.needs_vectors() && !source.has_vectors() {
            return Err(TubeError::MissingVectors);
        }
        if self.config.generate_tcoords() == TCoordMode::Scalars && !source.has_scalars() {
            return Err(TubeError::MissingScalars {
                mode: TCoordMode::Scalars.as_str(),
            });
        }
        source.validate()?;
        check_line_indices(source)?;
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn build_lines<P>(&self, source: &P) -> Vec<LineOutcome>
    where
        P: PolylineSource + Sync + ?Sized,
    {
        (0..source.line_count())
            .into_par_iter()
            .map(|line| self.build_line(source, line))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn build_lines<P>(&self, source: &P) -> Vec<LineOutcome>
    where
        P: PolylineSource + Sync + ?Sized,
    {
        (0..source.line_count())
            .map(|line| self.build_line(source, line))
            .collect()
    }

    fn build_line<P>(&self, source: &P, line: usize) -> LineOutcome
    where
        P: PolylineSource + ?Sized,
    {
        let mut metrics = TubeMetrics::default();
        let mut notes = Vec::new();
        let patch = LineInput::read(source, line, self.tol, &mut metrics)
            .and_then(|input| self.build_patch(&input, &mut metrics, &mut notes));
        LineOutcome {
            patch,
            notes,
            metrics,
        }
    }

    fn build_patch(
        &self,
        input: &LineInput,
        metrics: &mut TubeMetrics,
        notes: &mut Vec<String>,
    ) -> Result<LinePatch, LineDefect> {
        let cfg = &self.config;
        let count = input.points.len();

        let dirs = metrics.time(TimingBucket::Validation, || {
            segment_directions(&input.points, self.tol)
        })?;

        let normals = metrics.time(TimingBucket::Normals, || self.resolve_normals(input, &dirs))?;

        let profile = metrics.time(TimingBucket::Radius, || {
            line_radii(
                cfg,
                count,
                LineAttributes {
                    scalars: input.scalars.as_deref(),
                    vectors: input.vectors.as_deref(),
                },
            )
        })?;
        notes.extend(profile.note);

        let frames = metrics.time(TimingBucket::Rings, || {
            ring_frames(input.closed, &dirs, &normals)
        })?;

        let tcoords = metrics.time(TimingBucket::TextureCoords, || {
            texture_coords(cfg, &input.points, input.scalars.as_deref())
        });

        let mut patch = LinePatch::default();

        metrics.time(TimingBucket::Rings, || {
            for (i, frame) in frames.iter().enumerate() {
                self.push_ring(
                    &mut patch,
                    input.points[i],
                    frame,
                    profile.radii[i],
                    tcoords.as_ref().map(|t| t[i]),
                    input.scalar(i),
                );
            }
        });

        metrics.time(TimingBucket::Strips, || self.push_strips(&mut patch, count));

        if cfg.capping() && !input.closed {
            metrics.time(TimingBucket::Caps, || {
                let last = count - 1;
                self.push_cap(
                    &mut patch,
                    CapEnd::Start,
                    0,
                    dirs[0].neg(),
                    tcoords.as_ref().map(|t| t[0]),
                    input.scalar(0),
                );
                self.push_cap(
                    &mut patch,
                    CapEnd::End,
                    last,
                    dirs[dirs.len() - 1],
                    tcoords.as_ref().map(|t| t[last]),
                    input.scalar(last),
                );
            });
        }

        Ok(patch)
    }

    /// One unit normal per point of the line.
    fn resolve_normals(&self, input: &LineInput, dirs: &[Vec3]) -> Result<Vec<Vec3>, LineDefect> {
        let count = input.points.len();
        if self.config.use_default_normal() {
            return Ok(vec![self.config.default_normal(); count]);
        }

        let mut normals = match &input.normals {
            Some(supplied) => supplied
                .iter()
                .enumerate()
                .map(|(index, n)| {
                    if !n.is_finite() {
                        return Err(LineDefect::NonFiniteInput);
                    }
                    n.normalized().ok_or(LineDefect::ParallelNormal { index })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                let mut normals = sliding_normals(&input.points, self.tol)?;
                if input.closed {
                    close_sliding_normals(&input.points, dirs, &mut normals, self.tol);
                }
                normals
            }
        };

        if input.closed {
            normals[count - 1] = normals[0];
        }
        Ok(normals)
    }

    fn push_ring(
        &self,
        patch: &mut LinePatch,
        center: Point3,
        frame: &RingFrame,
        radius: f64,
        tcoord: Option<f64>,
        scalar: Option<f64>,
    ) {
        let theta = self.config.theta();
        let shared = self.config.sides_share_vertices();

        for k in 0..self.config.number_of_sides() {
            let angle = k as f64 * theta;
            let radial = frame.radial(angle);
            let position = center.add_vec(radial.mul_scalar(radius));

            if shared {
                patch.points.push(TubePoint {
                    position,
                    normal: radial,
                    tcoord,
                    scalar,
                });
            } else {
                // Two copies per side, each with the normal of one adjoining facet.
                for facet in [angle - 0.5 * theta, angle + 0.5 * theta] {
                    patch.points.push(TubePoint {
                        position,
                        normal: frame.radial(facet),
                        tcoord,
                        scalar,
                    });
                }
            }
        }
    }

    fn push_strips(&self, patch: &mut LinePatch, rings: usize) {
        let n = self.config.number_of_sides();
        let stride = self.config.ring_stride();
        let shared = self.config.sides_share_vertices();

        for side in self.config.visible_sides() {
            let next = (side + 1) % n;
            let (lead, trail) = if shared { (next, side) } else { (2 * next, 2 * side + 1) };

            let mut indices = Vec::with_capacity(2 * rings);
            for ring in 0..rings {
                let base = ring * stride;
                indices.push((base + lead) as u32);
                indices.push((base + trail) as u32);
            }
            patch.strips.push((side, indices));
        }
    }

    /// Cap over ring `ring`: copies of the ring positions carrying the cap
    /// normal, listed so the polygon faces along `normal`.
    fn push_cap(
        &self,
        patch: &mut LinePatch,
        end: CapEnd,
        ring: usize,
        normal: Vec3,
        tcoord: Option<f64>,
        scalar: Option<f64>,
    ) {
        let n = self.config.number_of_sides();
        let stride = self.config.ring_stride();
        let per_side = stride / n;
        let ring_start = ring * stride;
        let cap_start = patch.points.len();

        for k in 0..n {
            let position = patch.points[ring_start + k * per_side].position;
            patch.points.push(TubePoint {
                position,
                normal,
                tcoord,
                scalar,
            });
        }

        let mut indices: Vec<u32> = (cap_start..cap_start + n).map(|i| i as u32).collect();
        if end == CapEnd::End {
            indices[1..].reverse();
        }
        patch.caps.push((end, indices));
    }
}

/// One-shot form of [`TubeGenerator::generate`].
pub fn generate_tubes<P>(
    source: &P,
    config: &TubeConfig,
) -> Result<(TubeMesh, TubeDiagnostics), TubeError>
where
    P: PolylineSource + Sync + ?Sized,
{
    TubeGenerator::new(config.clone()).generate(source)
}

/// Geometry and attributes of one line, copied out of the source.
#[derive(Debug)]
struct LineInput {
    points: Vec<Point3>,
    normals: Option<Vec<Vec3>>,
    scalars: Option<Vec<f64>>,
    vectors: Option<Vec<Vec3>>,
    closed: bool,
}

impl LineInput {
    fn read<P>(
        source: &P,
        line: usize,
        tol: Tolerance,
        metrics: &mut TubeMetrics,
    ) -> Result<Self, LineDefect>
    where
        P: PolylineSource + ?Sized,
    {
        metrics.time(TimingBucket::Validation, || {
            let ids = source.line(line);
            if ids.len() < 2 {
                return Err(LineDefect::TooFewPoints { count: ids.len() });
            }

            let points: Vec<Point3> = ids.iter().map(|&id| source.point(id)).collect();
            if points.iter().any(|p| !p.is_finite()) {
                return Err(LineDefect::NonFiniteInput);
            }

            let last = ids.len() - 1;
            let closed = ids.len() >= MIN_CLOSED_POINTS
                && (ids[0] == ids[last] || tol.approx_eq_point3(points[0], points[last]));

            let normals = source
                .has_normals()
                .then(|| ids.iter().map(|&id| source.normal(id)).collect::<Option<Vec<_>>>())
                .flatten();
            let vectors = source
                .has_vectors()
                .then(|| ids.iter().map(|&id| source.vector(id)).collect::<Option<Vec<_>>>())
                .flatten();
            let scalars = source
                .has_scalars()
                .then(|| ids.iter().map(|&id| source.scalar(id)).collect::<Option<Vec<_>>>())
                .flatten();

            Ok(Self {
                points,
                normals,
                scalars,
                vectors,
                closed,
            })
        })
    }

    fn scalar(&self, index: usize) -> Option<f64> {
        self.scalars.as_ref().map(|s| s[index])
    }
}

/// A line's output with indices relative to its first point.
#[derive(Debug, Default)]
struct LinePatch {
    points: Vec<TubePoint>,
    strips: Vec<(usize, Vec<u32>)>,
    caps: Vec<(CapEnd, Vec<u32>)>,
}

struct LineOutcome {
    patch: Result<LinePatch, LineDefect>,
    notes: Vec<String>,
    metrics: TubeMetrics,
}

/// Appends a patch behind the points already in `sink`.
///
/// Fails with [`LineDefect::IndexOverflow`] when the patch's last point would
/// not be addressable by a `u32` index; the patch-local indices are exact
/// whenever this check passes.
fn append_patch<S>(
    line: usize,
    patch: LinePatch,
    sink: &mut S,
    diagnostics: &mut TubeDiagnostics,
) -> Result<(), LineDefect>
where
    S: TubeMeshSink + ?Sized,
{
    let first = sink.point_count();
    let fits = first
        .checked_add(patch.points.len())
        .and_then(|end| end.checked_sub(1))
        .is_some_and(|last| u32::try_from(last).is_ok());
    if !fits {
        return Err(LineDefect::IndexOverflow);
    }
    let base = u32::try_from(first).map_err(|_| LineDefect::IndexOverflow)?;
    for point in patch.points {
        sink.push_point(point);
    }

    for (side, mut indices) in patch.strips {
        indices.iter_mut().for_each(|i| *i += base);
        diagnostics.strip_count += 1;
        diagnostics.triangle_count += indices.len().saturating_sub(2);
        sink.push_strip(TubeStrip { line, side, indices });
    }

    for (end, mut indices) in patch.caps {
        indices.iter_mut().for_each(|i| *i += base);
        diagnostics.cap_count += 1;
        diagnostics.triangle_count += indices.len().saturating_sub(2);
        sink.push_cap(TubeCap { line, end, indices });
    }
    Ok(())
}

/// Ring frame at every point. Closed lines wrap their end tangents around the
/// seam and reuse the first frame for the repeated last point.
fn ring_frames(closed: bool, dirs: &[Vec3], normals: &[Vec3]) -> Result<Vec<RingFrame>, LineDefect> {
    let count = normals.len();
    let last_dir = dirs.len() - 1;

    let mut frames = Vec::with_capacity(count);
    for (i, normal) in normals.iter().enumerate() {
        if closed && i == count - 1 {
            frames.push(frames[0]);
            continue;
        }
        let s_prev = match i {
            0 if closed => dirs[last_dir],
            0 => dirs[0],
            _ => dirs[i - 1],
        };
        let s_next = dirs[i.min(last_dir)];
        frames.push(ring_frame(i, s_prev, s_next, *normal)?);
    }
    Ok(frames)
}

/// Per-point texture coordinate, or `None` when generation is off.
///
/// Accumulates in `f64` so the last point of a normalized line is exactly 1.
fn texture_coords(config: &TubeConfig, points: &[Point3], scalars: Option<&[f64]>) -> Option<Vec<f64>> {
    let arc_lengths = || {
        let mut total = 0.0;
        std::iter::once(0.0)
            .chain(points.windows(2).map(move |pair| {
                total += pair[0].distance_to(pair[1]);
                total
            }))
            .collect::<Vec<f64>>()
    };

    match config.generate_tcoords() {
        TCoordMode::Off => None,
        TCoordMode::NormalizedLength => {
            let lengths = arc_lengths();
            let total = lengths.last().copied().unwrap_or(0.0);
            if total <= 0.0 {
                return Some(vec![0.0; points.len()]);
            }
            Some(lengths.iter().map(|l| l / total).collect())
        }
        TCoordMode::Length => {
            let texture_length = config.texture_length();
            Some(arc_lengths().iter().map(|l| l / texture_length).collect())
        }
        TCoordMode::Scalars => {
            let scalars = scalars?;
            let texture_length = config.texture_length();
            let mut total = 0.0;
            Some(
                std::iter::once(0.0)
                    .chain(scalars.windows(2).map(|pair| {
                        total += (pair[1] - pair[0]).abs();
                        total / texture_length
                    }))
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::config::TubeOptions;

    #[test]
    fn normalized_tcoords_end_at_one() {
        let cfg = TubeConfig::new(TubeOptions {
            generate_tcoords: TCoordMode::NormalizedLength,
            ..Default::default()
        })
        .unwrap();
        let points: Vec<Point3> = (0..7).map(|i| Point3::new(0.1 * i as f64, 0.0, 0.0)).collect();
        let tc = texture_coords(&cfg, &points, None).unwrap();
        assert_eq!(tc[0], 0.0);
        assert_eq!(tc[6], 1.0);
        assert!(tc.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn scalar_tcoords_accumulate_absolute_steps() {
        let cfg = TubeConfig::new(TubeOptions {
            generate_tcoords: TCoordMode::Scalars,
            texture_length: 2.0,
            ..Default::default()
        })
        .unwrap();
        let points = [Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let tc = texture_coords(&cfg, &points, Some(&[1.0, 3.0, 2.0])).unwrap();
        assert_eq!(tc, vec![0.0, 1.0, 1.5]);
    }

    #[test]
    fn closed_frames_wrap_around_the_seam() {
        let dirs = [Vec3::X, Vec3::Y, Vec3::X.neg(), Vec3::Y.neg()];
        let normals = [Vec3::Z; 5];
        let frames = ring_frames(true, &dirs, &normals).unwrap();
        assert_eq!(frames[0], frames[4]);
        let expected = Vec3::new(1.0, -1.0, 0.0).normalized().unwrap();
        assert!(frames[0].tangent.sub(expected).length() < 1e-12);
    }
}
