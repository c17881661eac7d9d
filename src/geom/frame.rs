//! Normal resolution and ring frames along a polyline.
//!
//! Lines without usable normals get *sliding normals*: a start normal
//! perpendicular to the first segment, carried along the line with a
//! rotation-minimizing transport so consecutive rings do not twist more than
//! the line itself bends.

use super::diagnostics::LineDefect;
use super::{Point3, Tolerance, Vec3};

/// Cross-product magnitude above which two unit segment directions are
/// considered to span a plane when picking the start normal.
const PLANE_SPAN_THRESHOLD: f64 = 1.0e-3;

/// Orthonormal cross-section frame at one polyline point.
///
/// Ring vertex `k` lies along `w·cos(kθ) + n·sin(kθ)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingFrame {
    /// Bevel direction: the averaged tangent at the point.
    pub tangent: Vec3,
    pub w: Vec3,
    pub n: Vec3,
}

impl RingFrame {
    /// Unit radial direction at `angle` radians around the ring.
    #[must_use]
    pub fn radial(&self, angle: f64) -> Vec3 {
        self.w.mul_scalar(angle.cos()).add(self.n.mul_scalar(angle.sin()))
    }
}

/// Unit directions of every segment of `points`.
///
/// Fails on the first segment shorter than `tol.eps`.
pub fn segment_directions(points: &[Point3], tol: Tolerance) -> Result<Vec<Vec3>, LineDefect> {
    points
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let d = pair[1].sub_point(pair[0]);
            if tol.is_zero_vec3(d) {
                return Err(LineDefect::CoincidentPoints { index: i + 1 });
            }
            d.normalized().ok_or(LineDefect::NonFiniteInput)
        })
        .collect()
}

/// Sliding normals for a line through `points`, one per point.
///
/// Zero-length segments are stepped over rather than rotated through.
pub fn sliding_normals(points: &[Point3], tol: Tolerance) -> Result<Vec<Vec3>, LineDefect> {
    if points.len() < 2 {
        return Err(LineDefect::TooFewPoints { count: points.len() });
    }

    let dirs: Vec<Option<Vec3>> = points
        .windows(2)
        .map(|pair| {
            let d = pair[1].sub_point(pair[0]);
            if tol.is_zero_vec3(d) { None } else { d.normalized() }
        })
        .collect();

    let Some((first, t0)) = dirs
        .iter()
        .enumerate()
        .find_map(|(i, d)| d.map(|d| (i, d)))
    else {
        return Err(LineDefect::CoincidentPoints { index: 1 });
    };

    let mut normal = start_normal(t0, &dirs[first + 1..]).ok_or(LineDefect::NormalGeneration)?;

    let mut normals = Vec::with_capacity(points.len());
    let mut prev_dir = t0;
    normals.push(normal);

    for dir in dirs.iter().skip(1) {
        if let Some(next_dir) = *dir {
            normal = transport_normal(normal, prev_dir, next_dir, tol);
            prev_dir = next_dir;
        }
        normals.push(normal);
    }
    normals.push(normal);

    Ok(normals)
}

/// Spread the twist the sliding normals of a closed loop pick up over the
/// loop's arc length, so the normal carried across the seam lands on the
/// start normal.
///
/// `dirs` are the segment directions and `normals` one normal per point, the
/// last point repeating the first.
pub fn close_sliding_normals(points: &[Point3], dirs: &[Vec3], normals: &mut [Vec3], tol: Tolerance) {
    let (Some(&first_dir), Some(&last_dir)) = (dirs.first(), dirs.last()) else {
        return;
    };
    let (Some(&start), Some(&end)) = (normals.first(), normals.last()) else {
        return;
    };

    let carried = transport_normal(end, last_dir, first_dir, tol);
    let twist = first_dir.dot(carried.cross(start)).atan2(carried.dot(start));
    if twist.abs() <= tol.eps {
        return;
    }

    let mut arc = Vec::with_capacity(points.len());
    let mut total = 0.0;
    arc.push(total);
    for pair in points.windows(2) {
        total += pair[0].distance_to(pair[1]);
        arc.push(total);
    }
    if total <= 0.0 {
        return;
    }

    let last = dirs.len() - 1;
    for (i, (normal, length)) in normals.iter_mut().zip(&arc).enumerate() {
        *normal = normal.rotated_about(dirs[i.min(last)], twist * length / total);
    }
}

/// Start normal: perpendicular to the plane of the first two non-parallel
/// segments, or any perpendicular of `t0` for straight lines.
fn start_normal(t0: Vec3, rest: &[Option<Vec3>]) -> Option<Vec3> {
    rest.iter()
        .flatten()
        .map(|d| t0.cross(*d))
        .find(|c| c.length() > PLANE_SPAN_THRESHOLD)
        .and_then(Vec3::normalized)
        .or_else(|| t0.any_perpendicular())
}

/// Carry `normal` (perpendicular to `from`) across a bend to `to`.
fn transport_normal(normal: Vec3, from: Vec3, to: Vec3, tol: Tolerance) -> Vec3 {
    let axis = from.cross(to);
    let rotated = match axis.normalized() {
        Some(axis) if !tol.is_zero_vec3(axis) => {
            let angle = from.dot(to).clamp(-1.0, 1.0).acos();
            normal.rotated_about(axis, angle)
        }
        // Straight run or full reversal: the old normal is still perpendicular.
        _ => normal,
    };

    // Remove drift so the normal stays perpendicular to the new segment.
    rotated
        .sub(to.mul_scalar(rotated.dot(to)))
        .normalized()
        .unwrap_or(normal)
}

/// Ring frame at a point whose incoming and outgoing unit segment directions
/// are `s_prev` and `s_next`, with point normal `normal`.
///
/// Returns [`LineDefect::ParallelNormal`] (for point `index`) when the normal
/// does not define a plane together with the bevel direction.
pub fn ring_frame(
    index: usize,
    s_prev: Vec3,
    s_next: Vec3,
    normal: Vec3,
) -> Result<RingFrame, LineDefect> {
    let tangent = s_prev
        .add(s_next)
        .mul_scalar(0.5)
        .normalized()
        .or_else(|| s_prev.cross(normal).normalized())
        .ok_or(LineDefect::ParallelNormal { index })?;

    if Tolerance::PARALLEL.is_parallel(tangent, normal) {
        return Err(LineDefect::ParallelNormal { index });
    }
    let w = tangent
        .cross(normal)
        .normalized()
        .ok_or(LineDefect::ParallelNormal { index })?;
    let n = w.cross(tangent).normalized().ok_or(LineDefect::ParallelNormal { index })?;

    Ok(RingFrame { tangent, w, n })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol() -> Tolerance {
        Tolerance::default_geom()
    }

    #[test]
    fn straight_line_normals_are_constant_and_perpendicular() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        let normals = sliding_normals(&points, tol()).expect("straight line");
        assert_eq!(normals.len(), 3);
        for n in &normals {
            assert!(n.dot(Vec3::Z).abs() < 1e-12);
            assert!((n.length() - 1.0).abs() < 1e-12);
            assert!((n.dot(normals[0]) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn planar_bend_uses_plane_normal() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let normals = sliding_normals(&points, tol()).expect("bent line");
        for n in &normals {
            assert!((n.z.abs() - 1.0).abs() < 1e-12, "expected plane normal, got {n:?}");
        }
    }

    #[test]
    fn normals_stay_perpendicular_on_helix() {
        let points: Vec<Point3> = (0..40)
            .map(|i| {
                let t = i as f64 * 0.3;
                Point3::new(t.cos(), t.sin(), 0.1 * t)
            })
            .collect();
        let normals = sliding_normals(&points, tol()).expect("helix");
        for (i, n) in normals.iter().enumerate().skip(1) {
            let seg = points[i].sub_point(points[i - 1]).normalized().unwrap();
            // Point i normal is perpendicular to the outgoing segment (or the last one).
            let out = if i + 1 < points.len() {
                points[i + 1].sub_point(points[i]).normalized().unwrap()
            } else {
                seg
            };
            assert!(n.dot(out).abs() < 1e-9, "normal {i} not perpendicular");
            assert!((n.length() - 1.0).abs() < 1e-9);
        }
    }

    fn trefoil(samples: usize) -> Vec<Point3> {
        let mut points: Vec<Point3> = (0..samples)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / samples as f64;
                Point3::new(
                    t.sin() + 2.0 * (2.0 * t).sin(),
                    t.cos() - 2.0 * (2.0 * t).cos(),
                    -(3.0 * t).sin(),
                )
            })
            .collect();
        points.push(points[0]);
        points
    }

    #[test]
    fn closed_loop_twist_is_spread_to_meet_the_start_normal() {
        let points = trefoil(59);
        let dirs = segment_directions(&points, tol()).expect("trefoil");
        let mut normals = sliding_normals(&points, tol()).expect("trefoil");
        let last = dirs.len() - 1;

        let open_end = transport_normal(normals[last + 1], dirs[last], dirs[0], tol());
        assert!(open_end.dot(normals[0]) < 1.0 - 1e-6, "loop should pick up twist");

        close_sliding_normals(&points, &dirs, &mut normals, tol());

        let closed_end = transport_normal(normals[last + 1], dirs[last], dirs[0], tol());
        assert!(closed_end.sub(normals[0]).length() < 1e-9);
        for (i, n) in normals.iter().enumerate() {
            assert!(n.dot(dirs[i.min(last)]).abs() < 1e-9, "normal {i} not perpendicular");
            assert!((n.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn planar_loop_normals_are_left_alone() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let dirs = segment_directions(&points, tol()).expect("square");
        let mut normals = sliding_normals(&points, tol()).expect("square");
        let before = normals.clone();

        close_sliding_normals(&points, &dirs, &mut normals, tol());

        assert_eq!(normals, before);
    }

    #[test]
    fn coincident_points_are_stepped_over() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let normals = sliding_normals(&points, tol()).expect("one usable segment");
        assert_eq!(normals.len(), 3);
        assert!(matches!(
            segment_directions(&points, tol()),
            Err(LineDefect::CoincidentPoints { index: 1 })
        ));
    }

    #[test]
    fn fully_degenerate_line_fails() {
        let points = [Point3::ORIGIN, Point3::ORIGIN];
        assert!(matches!(
            sliding_normals(&points, tol()),
            Err(LineDefect::CoincidentPoints { .. })
        ));
    }

    #[test]
    fn ring_frame_is_orthonormal() {
        let s = Vec3::new(1.0, 1.0, 0.0).normalized().unwrap();
        let frame = ring_frame(0, s, s, Vec3::Z).expect("valid frame");
        assert!(frame.w.dot(frame.n).abs() < 1e-12);
        assert!(frame.w.dot(frame.tangent).abs() < 1e-12);
        assert!(frame.n.dot(frame.tangent).abs() < 1e-12);
        assert!((frame.radial(0.7).length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ring_frame_rejects_parallel_normal() {
        let result = ring_frame(3, Vec3::X, Vec3::X, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(result, Err(LineDefect::ParallelNormal { index: 3 }));
    }
}
