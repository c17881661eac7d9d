mod config;
mod core;
mod diagnostics;
mod frame;
mod mesh;
mod metrics;
mod polyline;
mod radius;
mod tube;

pub use config::{ConfigError, TCoordMode, TubeConfig, TubeOptions, VaryRadius};
pub use core::{Point3, Tolerance, Vec3};
pub use diagnostics::{LineDefect, SkippedLine, TubeDiagnostics};
pub use frame::{
    RingFrame, close_sliding_normals, ring_frame, segment_directions, sliding_normals,
};
pub use mesh::{CapEnd, TubeCap, TubeMesh, TubeMeshSink, TubePoint, TubeStrip};
pub use metrics::{TimingBucket, TubeMetrics, TubeTimingReport};
pub use polyline::{InputError, PolylineSet, PolylineSource};
pub use radius::{
    LineAttributes, RadiusProfile, absolute_scalar_radii, line_radii, scalar_radii, vector_radii,
};
pub use tube::{TubeError, TubeGenerator, generate_tubes};

#[cfg(test)]
mod tests;
