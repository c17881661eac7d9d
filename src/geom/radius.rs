//! Per-point tube radius for each [`VaryRadius`] mode.
//!
//! All modes keep the radius inside `[radius, radius_factor × radius]` and
//! therefore non-negative.

use super::config::{TubeConfig, VaryRadius};
use super::diagnostics::LineDefect;
use super::Vec3;

/// Radii for one line plus an optional note for the diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusProfile {
    pub radii: Vec<f64>,
    pub note: Option<String>,
}

impl RadiusProfile {
    fn plain(radii: Vec<f64>) -> Self {
        Self { radii, note: None }
    }
}

/// Attribute values of one line, in point order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineAttributes<'a> {
    pub scalars: Option<&'a [f64]>,
    pub vectors: Option<&'a [Vec3]>,
}

/// Radius at every point of a line with `count` points.
///
/// The scalar/vector modes require the matching attribute; its presence is
/// checked once per invocation before any line is built.
pub fn line_radii(
    config: &TubeConfig,
    count: usize,
    attributes: LineAttributes<'_>,
) -> Result<RadiusProfile, LineDefect> {
    match config.vary_radius() {
        VaryRadius::Off => Ok(RadiusProfile::plain(vec![config.radius(); count])),
        VaryRadius::ByScalar => {
            let scalars = attributes.scalars.ok_or(LineDefect::NonFiniteInput)?;
            scalar_radii(config, scalars)
        }
        VaryRadius::ByAbsoluteScalar => {
            let scalars = attributes.scalars.ok_or(LineDefect::NonFiniteInput)?;
            absolute_scalar_radii(config, scalars)
        }
        VaryRadius::ByVector => {
            let vectors = attributes.vectors.ok_or(LineDefect::NonFiniteInput)?;
            vector_radii(config, vectors)
        }
    }
}

/// Linear map of the line's scalar range onto `[radius, max_radius]`.
pub fn scalar_radii(config: &TubeConfig, scalars: &[f64]) -> Result<RadiusProfile, LineDefect> {
    if scalars.iter().any(|s| !s.is_finite()) {
        return Err(LineDefect::NonFiniteInput);
    }

    let lo = scalars.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = scalars.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (span, note) = if hi - lo > 0.0 {
        (hi - lo, None)
    } else {
        (1.0, Some("scalar range is zero; using minimum radius".to_string()))
    };

    let growth = config.radius_factor() - 1.0;
    let radii = scalars
        .iter()
        .map(|s| config.radius() * (1.0 + growth * (s - lo) / span))
        .collect();

    Ok(RadiusProfile { radii, note })
}

/// The scalar magnitude is the radius, clamped to `[radius, max_radius]`.
pub fn absolute_scalar_radii(
    config: &TubeConfig,
    scalars: &[f64],
) -> Result<RadiusProfile, LineDefect> {
    if scalars.iter().any(|s| !s.is_finite()) {
        return Err(LineDefect::NonFiniteInput);
    }

    let (min, max) = (config.radius(), config.max_radius());
    let clamped = scalars.iter().filter(|s| s.abs() < min || s.abs() > max).count();
    let radii = scalars.iter().map(|s| s.abs().clamp(min, max)).collect();
    let note = (clamped > 0).then(|| format!("{clamped} absolute scalar radii clamped"));

    Ok(RadiusProfile { radii, note })
}

/// Flux-preserving radius: `r = radius × sqrt(vmax / |v|)` capped at the
/// radius factor, so `r² · |v|` is constant where the cap is inactive.
///
/// `vmax` is the largest vector magnitude on the line, which therefore gets
/// the minimum radius. Points with zero magnitude get the maximum radius.
pub fn vector_radii(config: &TubeConfig, vectors: &[Vec3]) -> Result<RadiusProfile, LineDefect> {
    if vectors.iter().any(|v| !v.is_finite()) {
        return Err(LineDefect::NonFiniteInput);
    }

    let speeds: Vec<f64> = vectors.iter().map(|v| v.length()).collect();
    let max_speed = speeds.iter().copied().fold(0.0, f64::max);
    if max_speed <= 0.0 {
        return Ok(RadiusProfile {
            radii: vec![config.radius(); vectors.len()],
            note: Some("vector magnitudes are all zero; using minimum radius".to_string()),
        });
    }

    let factor = config.radius_factor();
    let radii = speeds
        .iter()
        .map(|&speed| {
            let scale = if speed > 0.0 { (max_speed / speed).sqrt().min(factor) } else { factor };
            config.radius() * scale
        })
        .collect();

    Ok(RadiusProfile::plain(radii))
}
