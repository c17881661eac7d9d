//! Opt-in timing hooks for tube generation.
//!
//! Timing is only collected when the `tube_metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable there). Otherwise
//! every call compiles down to running the closure.
//!
//! # Usage
//!
//! ```ignore
//! use tube_engine::geom::{TubeMetrics, TimingBucket};
//!
//! let mut metrics = TubeMetrics::default();
//! metrics.begin();
//!
//! let normals = metrics.time(TimingBucket::Normals, || sliding_normals(&points, tol));
//!
//! if let Some(report) = metrics.end() {
//!     println!("Normals: {} ns", report.normals_ns);
//! }
//! ```

use serde::Serialize;

/// Phases of per-line tube generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Input and per-line validity checks.
    Validation,
    /// Normal resolution (supplied, default or sliding).
    Normals,
    /// Per-point radius computation.
    Radius,
    /// Ring frames and ring vertices.
    Rings,
    /// Strip connectivity.
    Strips,
    /// Texture coordinates.
    TextureCoords,
    /// Cap points and polygons.
    Caps,
    /// Appending per-line patches to the output sink.
    Merge,
}

impl TimingBucket {
    pub const ALL: [Self; 8] = [
        Self::Validation,
        Self::Normals,
        Self::Radius,
        Self::Rings,
        Self::Strips,
        Self::TextureCoords,
        Self::Caps,
        Self::Merge,
    ];
}

/// Cumulative nanoseconds per phase.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TubeTimingReport {
    pub validation_ns: u64,
    pub normals_ns: u64,
    pub radius_ns: u64,
    pub rings_ns: u64,
    pub strips_ns: u64,
    pub texture_coords_ns: u64,
    pub caps_ns: u64,
    pub merge_ns: u64,
}

impl TubeTimingReport {
    /// Returns the total time across all buckets in nanoseconds.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        TimingBucket::ALL
            .iter()
            .fold(0u64, |acc, bucket| acc.saturating_add(*self.bucket(*bucket)))
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    /// Adds all buckets of `other` into this report.
    pub fn accumulate(&mut self, other: &TubeTimingReport) {
        for bucket in TimingBucket::ALL {
            let add = *other.bucket(bucket);
            let slot = self.bucket_mut(bucket);
            *slot = slot.saturating_add(add);
        }
    }

    fn bucket(&self, bucket: TimingBucket) -> &u64 {
        match bucket {
            TimingBucket::Validation => &self.validation_ns,
            TimingBucket::Normals => &self.normals_ns,
            TimingBucket::Radius => &self.radius_ns,
            TimingBucket::Rings => &self.rings_ns,
            TimingBucket::Strips => &self.strips_ns,
            TimingBucket::TextureCoords => &self.texture_coords_ns,
            TimingBucket::Caps => &self.caps_ns,
            TimingBucket::Merge => &self.merge_ns,
        }
    }

    fn bucket_mut(&mut self, bucket: TimingBucket) -> &mut u64 {
        match bucket {
            TimingBucket::Validation => &mut self.validation_ns,
            TimingBucket::Normals => &mut self.normals_ns,
            TimingBucket::Radius => &mut self.radius_ns,
            TimingBucket::Rings => &mut self.rings_ns,
            TimingBucket::Strips => &mut self.strips_ns,
            TimingBucket::TextureCoords => &mut self.texture_coords_ns,
            TimingBucket::Caps => &mut self.caps_ns,
            TimingBucket::Merge => &mut self.merge_ns,
        }
    }
}

/// Accumulator for timing tube generation phases.
///
/// When the `tube_metrics` feature is disabled (or on WASM), all methods are
/// no-ops and [`end`](Self::end) returns `None`.
#[derive(Debug, Default, Clone)]
pub struct TubeMetrics {
    #[cfg(all(feature = "tube_metrics", not(target_arch = "wasm32")))]
    report: TubeTimingReport,
}

impl TubeMetrics {
    /// Resets all timing counters to zero.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "tube_metrics", not(target_arch = "wasm32")))]
        {
            self.report = TubeTimingReport::default();
        }
    }

    /// Returns the accumulated timing report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<TubeTimingReport> {
        #[cfg(all(feature = "tube_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "tube_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Folds another accumulator (e.g. from a worker thread) into this one.
    pub fn absorb(&mut self, other: &TubeMetrics) {
        #[cfg(all(feature = "tube_metrics", not(target_arch = "wasm32")))]
        {
            self.report.accumulate(&other.report);
        }
        #[cfg(not(all(feature = "tube_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = other;
        }
    }

    /// Times the execution of `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "tube_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let elapsed = start.elapsed();
            // Cap at u64::MAX to prevent overflow
            let nanos_u64 = elapsed.as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = self.report.bucket_mut(bucket);
            *slot = slot.saturating_add(nanos_u64);
            result
        }

        #[cfg(not(all(feature = "tube_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_report_total() {
        let report = TubeTimingReport {
            normals_ns: 1000,
            rings_ns: 2000,
            strips_ns: 3000,
            ..Default::default()
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_accumulate() {
        let mut a = TubeTimingReport {
            caps_ns: 5,
            ..Default::default()
        };
        let b = TubeTimingReport {
            caps_ns: 7,
            merge_ns: u64::MAX,
            ..Default::default()
        };
        a.accumulate(&b);
        a.accumulate(&b);
        assert_eq!(a.caps_ns, 19);
        assert_eq!(a.merge_ns, u64::MAX);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut metrics = TubeMetrics::default();
        metrics.begin();
        let result = metrics.time(TimingBucket::Rings, || 42);
        assert_eq!(result, 42);
        let _ = metrics.end();
    }

    #[cfg(not(feature = "tube_metrics"))]
    #[test]
    fn test_disabled_metrics_report_nothing() {
        let mut metrics = TubeMetrics::default();
        metrics.begin();
        metrics.time(TimingBucket::Caps, || ());
        assert!(metrics.end().is_none());
    }
}
