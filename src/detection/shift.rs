//! Mean-Shift Test: Baseline vs. Late-Stage Sensor Windows
//!
//! For a single sensor, compares the late-stage mean against the
//! baseline mean in units of the baseline standard deviation:
//!
//!   z = |μ_late - μ_base| / σ_base
//!
//! and reports evidence of degradation when z > mean_sigma.

use serde::Serialize;

/// Summary statistics of one window, missing values excluded
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    /// Number of non-missing samples
    pub count: usize,
    /// Sample mean
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator); NaN for count < 2
    pub std: f64,
}

impl WindowStats {
    /// Compute statistics over the non-missing values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let present: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        let count = present.len();

        if count == 0 {
            return Self { count, mean: f64::NAN, std: f64::NAN };
        }

        let n = count as f64;
        let mean = present.iter().sum::<f64>() / n;

        let constant = present.iter().all(|&x| x == present[0]);

        let std = if constant && count > 1 {
            0.0
        } else if count > 1 {
            let variance = present.iter()
                .map(|x| (x - mean).powi(2))
                .sum::<f64>() / (n - 1.0);
            variance.sqrt()
        } else {
            f64::NAN
        };

        Self { count, mean, std }
    }
}

/// Outcome of the shift test for one sensor of one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShiftOutcome {
    /// Fewer than the required samples in one of the windows
    InsufficientSamples { baseline: usize, late: usize },
    /// Baseline spread is zero (or undefined); no basis for a sigma-scaled test
    DegenerateBaseline,
    /// Shift observed but not beyond the threshold
    WithinTolerance { sigmas: f64 },
    /// Shift beyond the threshold: evidence of degradation
    Shifted { sigmas: f64 },
}

impl ShiftOutcome {
    pub fn is_evidence(&self) -> bool {
        matches!(self, ShiftOutcome::Shifted { .. })
    }
}

/// Sigma-scaled mean-shift test with fixed thresholds
#[derive(Debug, Clone, Copy)]
pub struct MeanShiftTest {
    /// Threshold in baseline standard deviations
    mean_sigma: f64,
    /// Minimum non-missing samples per window
    min_samples: usize,
}

impl MeanShiftTest {
    pub fn new(mean_sigma: f64, min_samples: usize) -> Self {
        Self { mean_sigma, min_samples }
    }

    /// Test precomputed window statistics.
    pub fn evaluate(&self, baseline: &WindowStats, late: &WindowStats) -> ShiftOutcome {
        if baseline.count < self.min_samples || late.count < self.min_samples {
            return ShiftOutcome::InsufficientSamples {
                baseline: baseline.count,
                late: late.count,
            };
        }

        // NaN std (single sample) fails this comparison too
        if !(baseline.std > 0.0) {
            return ShiftOutcome::DegenerateBaseline;
        }

        let shift = (late.mean - baseline.mean).abs();
        let sigmas = shift / baseline.std;

        if shift > self.mean_sigma * baseline.std {
            ShiftOutcome::Shifted { sigmas }
        } else {
            ShiftOutcome::WithinTolerance { sigmas }
        }
    }

    /// Test two raw windows (missing values allowed).
    pub fn test<B, L>(&self, baseline: B, late: L) -> ShiftOutcome
    where
        B: IntoIterator<Item = f64>,
        L: IntoIterator<Item = f64>,
    {
        let b = WindowStats::from_values(baseline);
        let l = WindowStats::from_values(late);
        self.evaluate(&b, &l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_stats_skips_missing() {
        let stats = WindowStats::from_values(vec![1.0, f64::NAN, 3.0, f64::NAN]);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 2.0);
        // Sample std of {1, 3} = sqrt(2)
        assert!((stats.std - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_window_stats_empty_and_single() {
        let empty = WindowStats::from_values(Vec::<f64>::new());
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan());

        let single = WindowStats::from_values(vec![4.0]);
        assert_eq!(single.mean, 4.0);
        assert!(single.std.is_nan());
    }

    #[test]
    fn test_constant_baseline_is_degenerate() {
        let test = MeanShiftTest::new(1.5, 10);
        let outcome = test.test(vec![10.0; 70], vec![50.0; 30]);
        assert_eq!(outcome, ShiftOutcome::DegenerateBaseline);
        assert!(!outcome.is_evidence());
    }

    #[test]
    fn test_constant_inexact_baseline_has_zero_spread() {
        // Summing 0.1 repeatedly does not reproduce 0.1 exactly
        let stats = WindowStats::from_values(vec![0.1; 70]);
        assert_eq!(stats.std, 0.0);
    }

    #[test]
    fn test_insufficient_samples() {
        let test = MeanShiftTest::new(1.5, 10);
        let baseline: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut late = vec![f64::NAN; 30];
        late[..9].fill(100.0);

        let outcome = test.test(baseline, late);
        assert_eq!(outcome, ShiftOutcome::InsufficientSamples { baseline: 20, late: 9 });
    }

    #[test]
    fn test_shift_detected_both_directions() {
        let test = MeanShiftTest::new(1.5, 10);
        let baseline: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect();

        let up = test.test(baseline.clone(), vec![5.0; 20]);
        assert!(up.is_evidence());

        let down = test.test(baseline, vec![-5.0; 20]);
        assert!(down.is_evidence());
    }

    #[test]
    fn test_shift_within_tolerance() {
        let test = MeanShiftTest::new(1.5, 10);
        let baseline: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect();
        let outcome = test.test(baseline, vec![0.5; 20]);
        match outcome {
            ShiftOutcome::WithinTolerance { sigmas } => assert!(sigmas < 1.5),
            other => panic!("expected WithinTolerance, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let test = MeanShiftTest::new(1.5, 10);
        let baseline = WindowStats { count: 20, mean: 0.0, std: 2.0 };

        // |3.0 - 0.0| == 1.5 * 2.0: on the threshold, not beyond it
        let on = WindowStats { count: 20, mean: 3.0, std: 1.0 };
        assert_eq!(test.evaluate(&baseline, &on), ShiftOutcome::WithinTolerance { sigmas: 1.5 });

        let beyond = WindowStats { count: 20, mean: -3.5, std: 1.0 };
        assert_eq!(test.evaluate(&baseline, &beyond), ShiftOutcome::Shifted { sigmas: 1.75 });
    }
}
