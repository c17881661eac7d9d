//! Tube generation settings.
//!
//! [`TubeOptions`] is the plain, serde-friendly form (every field public, the
//! defaults match the classic tube filter). [`TubeConfig`] is what the
//! generator consumes: it can only be obtained through [`TubeConfig::new`],
//! which validates the options once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Vec3;

/// How the tube radius varies along a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaryRadius {
    /// Constant radius.
    #[default]
    Off,
    /// Linear in the point scalar over the line's scalar range.
    ByScalar,
    /// Flux preserving: `r² · |v|` is held constant.
    ByVector,
    /// The scalar magnitude is the radius.
    ByAbsoluteScalar,
}

impl VaryRadius {
    pub const ALL: [Self; 4] = [Self::Off, Self::ByScalar, Self::ByVector, Self::ByAbsoluteScalar];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::ByScalar => "by_scalar",
            Self::ByVector => "by_vector",
            Self::ByAbsoluteScalar => "by_absolute_scalar",
        }
    }

    #[must_use]
    pub const fn needs_scalars(self) -> bool {
        matches!(self, Self::ByScalar | Self::ByAbsoluteScalar)
    }

    #[must_use]
    pub const fn needs_vectors(self) -> bool {
        matches!(self, Self::ByVector)
    }
}

impl fmt::Display for VaryRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaryRadius {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}

/// Source of the texture coordinate generated along each tube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TCoordMode {
    #[default]
    Off,
    /// Arc length divided by the line's total length, so `[0, 1]` per line.
    NormalizedLength,
    /// Arc length divided by `texture_length`.
    Length,
    /// Accumulated scalar change divided by `texture_length`.
    Scalars,
}

impl TCoordMode {
    pub const ALL: [Self; 4] = [Self::Off, Self::NormalizedLength, Self::Length, Self::Scalars];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::NormalizedLength => "normalized_length",
            Self::Length => "length",
            Self::Scalars => "scalars",
        }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for TCoordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TCoordMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("radius must be finite and >= 0 (got {0})")]
    InvalidRadius(f64),
    #[error("tube requires at least 3 sides (got {0})")]
    NotEnoughSides(usize),
    #[error("radius factor must be finite and >= 1 (got {0})")]
    InvalidRadiusFactor(f64),
    #[error("on ratio must be >= 1")]
    ZeroOnRatio,
    #[error("texture length must be finite and > 0 (got {0})")]
    InvalidTextureLength(f64),
    #[error("default normal must be finite and non-zero")]
    InvalidDefaultNormal,
    #[error("unknown mode `{0}`")]
    UnknownMode(String),
}

/// Raw tube settings, as read from JSON or a JS object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeOptions {
    /// Minimum tube radius.
    pub radius: f64,
    pub vary_radius: VaryRadius,
    pub number_of_sides: usize,
    /// Maximum radius as a multiple of `radius`.
    pub radius_factor: f64,
    pub default_normal: [f64; 3],
    /// Use `default_normal` at every point, ignoring supplied normals.
    pub use_default_normal: bool,
    pub sides_share_vertices: bool,
    pub capping: bool,
    /// Every `on_ratio`-th side is emitted, starting at `offset`.
    pub on_ratio: usize,
    pub offset: usize,
    pub generate_tcoords: TCoordMode,
    /// Length mapped onto one unit of texture space.
    pub texture_length: f64,
}

impl Default for TubeOptions {
    fn default() -> Self {
        Self {
            radius: 0.5,
            vary_radius: VaryRadius::Off,
            number_of_sides: 3,
            radius_factor: 10.0,
            default_normal: [0.0, 0.0, 1.0],
            use_default_normal: false,
            sides_share_vertices: true,
            capping: false,
            on_ratio: 1,
            offset: 0,
            generate_tcoords: TCoordMode::Off,
            texture_length: 1.0,
        }
    }
}

/// Validated, immutable tube configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeConfig {
    options: TubeOptions,
    default_normal: Vec3,
}

impl TubeConfig {
    pub fn new(options: TubeOptions) -> Result<Self, ConfigError> {
        if !options.radius.is_finite() || options.radius < 0.0 {
            return Err(ConfigError::InvalidRadius(options.radius));
        }
        if options.number_of_sides < 3 {
            return Err(ConfigError::NotEnoughSides(options.number_of_sides));
        }
        if !options.radius_factor.is_finite() || options.radius_factor < 1.0 {
            return Err(ConfigError::InvalidRadiusFactor(options.radius_factor));
        }
        if options.on_ratio == 0 {
            return Err(ConfigError::ZeroOnRatio);
        }
        if !options.texture_length.is_finite() || options.texture_length <= 0.0 {
            return Err(ConfigError::InvalidTextureLength(options.texture_length));
        }

        let raw_normal = Vec3::from_array(options.default_normal);
        let default_normal = match raw_normal.normalized() {
            Some(n) => n,
            None if options.use_default_normal => return Err(ConfigError::InvalidDefaultNormal),
            // Unused unless `use_default_normal` is set.
            None => Vec3::Z,
        };

        Ok(Self {
            options,
            default_normal,
        })
    }

    /// Parse and validate options from a JSON document.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let options: TubeOptions =
            serde_json::from_str(text).map_err(|err| format!("invalid tube options: {err}"))?;
        Self::new(options).map_err(|err| err.to_string())
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.options.radius
    }

    #[must_use]
    pub fn max_radius(&self) -> f64 {
        self.options.radius * self.options.radius_factor
    }

    #[must_use]
    pub fn radius_factor(&self) -> f64 {
        self.options.radius_factor
    }

    #[must_use]
    pub fn vary_radius(&self) -> VaryRadius {
        self.options.vary_radius
    }

    #[must_use]
    pub fn number_of_sides(&self) -> usize {
        self.options.number_of_sides
    }

    /// Angle between consecutive ring vertices.
    #[must_use]
    pub fn theta(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.options.number_of_sides as f64
    }

    /// Unit default normal.
    #[must_use]
    pub fn default_normal(&self) -> Vec3 {
        self.default_normal
    }

    #[must_use]
    pub fn use_default_normal(&self) -> bool {
        self.options.use_default_normal
    }

    #[must_use]
    pub fn sides_share_vertices(&self) -> bool {
        self.options.sides_share_vertices
    }

    #[must_use]
    pub fn capping(&self) -> bool {
        self.options.capping
    }

    #[must_use]
    pub fn on_ratio(&self) -> usize {
        self.options.on_ratio
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.options.offset
    }

    #[must_use]
    pub fn generate_tcoords(&self) -> TCoordMode {
        self.options.generate_tcoords
    }

    #[must_use]
    pub fn texture_length(&self) -> f64 {
        self.options.texture_length
    }

    /// Vertices emitted per ring: one per side, or two when sides do not share.
    #[must_use]
    pub fn ring_stride(&self) -> usize {
        if self.options.sides_share_vertices {
            self.options.number_of_sides
        } else {
            2 * self.options.number_of_sides
        }
    }

    /// Side indices that receive a strip, in emission order.
    #[must_use]
    pub fn visible_sides(&self) -> Vec<usize> {
        let n = self.options.number_of_sides;
        let offset = self.options.offset % n;
        (offset..offset + n)
            .step_by(self.options.on_ratio)
            .map(|k| k % n)
            .collect()
    }
}

impl Default for TubeConfig {
    fn default() -> Self {
        Self {
            options: TubeOptions::default(),
            default_normal: Vec3::Z,
        }
    }
}

impl TryFrom<TubeOptions> for TubeConfig {
    type Error = ConfigError;

    fn try_from(options: TubeOptions) -> Result<Self, Self::Error> {
        Self::new(options)
    }
}

impl fmt::Display for TubeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.options;
        writeln!(f, "Tube Config:")?;
        writeln!(f, "  Radius: {}", o.radius)?;
        writeln!(f, "  Vary Radius: {}", o.vary_radius)?;
        writeln!(f, "  Radius Factor: {}", o.radius_factor)?;
        writeln!(f, "  Number Of Sides: {}", o.number_of_sides)?;
        writeln!(
            f,
            "  Default Normal: ({}, {}, {})",
            o.default_normal[0], o.default_normal[1], o.default_normal[2]
        )?;
        writeln!(f, "  Use Default Normal: {}", if o.use_default_normal { "On" } else { "Off" })?;
        writeln!(f, "  Sides Share Vertices: {}", if o.sides_share_vertices { "On" } else { "Off" })?;
        writeln!(f, "  Capping: {}", if o.capping { "On" } else { "Off" })?;
        writeln!(f, "  On Ratio: {}", o.on_ratio)?;
        writeln!(f, "  Offset: {}", o.offset)?;
        writeln!(f, "  Generate TCoords: {}", o.generate_tcoords)?;
        writeln!(f, "  Texture Length: {}", o.texture_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = TubeConfig::new(TubeOptions::default()).expect("defaults are valid");
        assert_eq!(config.number_of_sides(), 3);
        assert!((config.radius() - 0.5).abs() < 1e-12);
        assert!((config.max_radius() - 5.0).abs() < 1e-12);
        assert_eq!(config.vary_radius(), VaryRadius::Off);
        assert_eq!(config.generate_tcoords(), TCoordMode::Off);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            (TubeOptions { number_of_sides: 2, ..Default::default() }, ConfigError::NotEnoughSides(2)),
            (TubeOptions { radius: -1.0, ..Default::default() }, ConfigError::InvalidRadius(-1.0)),
            (TubeOptions { texture_length: 0.0, ..Default::default() }, ConfigError::InvalidTextureLength(0.0)),
            (TubeOptions { on_ratio: 0, ..Default::default() }, ConfigError::ZeroOnRatio),
            (TubeOptions { radius_factor: 0.5, ..Default::default() }, ConfigError::InvalidRadiusFactor(0.5)),
        ];
        for (options, expected) in cases {
            assert_eq!(TubeConfig::new(options), Err(expected));
        }
    }

    #[test]
    fn zero_default_normal_only_matters_when_used() {
        let unused = TubeOptions { default_normal: [0.0; 3], ..Default::default() };
        assert!(TubeConfig::new(unused).is_ok());

        let used = TubeOptions {
            default_normal: [0.0; 3],
            use_default_normal: true,
            ..Default::default()
        };
        assert_eq!(TubeConfig::new(used), Err(ConfigError::InvalidDefaultNormal));
    }

    #[test]
    fn visible_sides_follow_ratio_and_offset() {
        let config = TubeConfig::new(TubeOptions {
            number_of_sides: 8,
            on_ratio: 2,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.visible_sides(), vec![0, 2, 4, 6]);

        let config = TubeConfig::new(TubeOptions {
            number_of_sides: 6,
            on_ratio: 4,
            offset: 5,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.visible_sides(), vec![5, 3]);
    }

    #[test]
    fn huge_offset_wraps_around_the_ring() {
        let config = TubeConfig::new(TubeOptions {
            number_of_sides: 8,
            on_ratio: 3,
            offset: usize::MAX,
            ..Default::default()
        })
        .unwrap();
        let first = usize::MAX % 8;
        assert_eq!(config.visible_sides(), vec![first, (first + 3) % 8, (first + 6) % 8]);
    }

    #[test]
    fn ring_stride_doubles_without_sharing() {
        let config = TubeConfig::new(TubeOptions {
            number_of_sides: 5,
            sides_share_vertices: false,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.ring_stride(), 10);
    }

    #[test]
    fn json_uses_defaults_for_missing_fields() {
        let config = TubeConfig::from_json(
            r#"{ "radius": 0.25, "vary_radius": "by_vector", "number_of_sides": 12 }"#,
        )
        .expect("valid json");
        assert_eq!(config.vary_radius(), VaryRadius::ByVector);
        assert_eq!(config.number_of_sides(), 12);
        assert!((config.radius_factor() - 10.0).abs() < 1e-12);
        assert!(config.sides_share_vertices());

        assert!(TubeConfig::from_json(r#"{ "number_of_sides": 1 }"#).is_err());
        assert!(TubeConfig::from_json(r#"{ "vary_radius": "sideways" }"#).is_err());
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in VaryRadius::ALL {
            assert_eq!(mode.as_str().parse::<VaryRadius>(), Ok(mode));
        }
        for mode in TCoordMode::ALL {
            assert_eq!(mode.as_str().parse::<TCoordMode>(), Ok(mode));
        }
        assert!("bogus".parse::<TCoordMode>().is_err());
    }

    #[test]
    fn display_lists_settings() {
        let text = TubeConfig::default().to_string();
        assert!(text.contains("Number Of Sides: 3"));
        assert!(text.contains("Vary Radius: off"));
        assert!(text.contains("Capping: Off"));
    }
}
