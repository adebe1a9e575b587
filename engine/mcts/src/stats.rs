//! Running statistics for the RQ bonus.
//!
//! Keeps O(1) sums so the mean, sample standard deviation and sample
//! covariance against the win indicator can be read after every iteration
//! without revisiting earlier samples.

/// Running sums over `(x, w)` pairs, where `w` is the win indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    n: u64,
    sum_x: f64,
    sum_x2: f64,
    sum_w: f64,
    sum_xw: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample.
    pub fn push(&mut self, x: f64, w: f64) {
        self.n += 1;
        self.sum_x += x;
        self.sum_x2 += x * x;
        self.sum_w += w;
        self.sum_xw += x * w;
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum_x / self.n as f64
        }
    }

    /// Sample standard deviation (n - 1 denominator); 0.0 below two samples.
    pub fn std_dev(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        let n = self.n as f64;
        let variance = (self.sum_x2 - self.sum_x * self.sum_x / n) / (n - 1.0);
        // Cancellation can leave a tiny negative residue
        variance.max(0.0).sqrt()
    }

    /// Sample covariance between `x` and the win indicator.
    pub fn covariance(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        let n = self.n as f64;
        (self.sum_xw - self.sum_x * self.sum_w / n) / (n - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(samples: &[(f64, f64)]) -> (f64, f64, f64) {
        let n = samples.len() as f64;
        let mx = samples.iter().map(|s| s.0).sum::<f64>() / n;
        let mw = samples.iter().map(|s| s.1).sum::<f64>() / n;
        let var = samples.iter().map(|s| (s.0 - mx).powi(2)).sum::<f64>() / (n - 1.0);
        let cov = samples
            .iter()
            .map(|s| (s.0 - mx) * (s.1 - mw))
            .sum::<f64>()
            / (n - 1.0);
        (mx, var.sqrt(), cov)
    }

    #[test]
    fn test_empty_and_single_sample() {
        let mut stats = RunningStats::new();
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.std_dev(), 0.0);

        stats.push(3.0, 1.0);
        assert_eq!(stats.count(), 1);
        assert_eq!(stats.mean(), 3.0);
        assert_eq!(stats.std_dev(), 0.0);
        assert_eq!(stats.covariance(), 0.0);
    }

    #[test]
    fn test_matches_two_pass_computation() {
        let samples = [(4.0, 1.0), (7.0, 0.0), (5.0, 1.0), (12.0, 0.0), (6.0, 1.0)];
        let mut stats = RunningStats::new();
        for &(x, w) in &samples {
            stats.push(x, w);
        }

        let (mean, std, cov) = naive(&samples);
        assert!((stats.mean() - mean).abs() < 1e-12);
        assert!((stats.std_dev() - std).abs() < 1e-12);
        assert!((stats.covariance() - cov).abs() < 1e-12);
        // Short samples win here, so the covariance is negative
        assert!(stats.covariance() < 0.0);
    }

    #[test]
    fn test_constant_samples_have_zero_spread() {
        let mut stats = RunningStats::new();
        for _ in 0..10 {
            stats.push(0.1, 1.0);
        }
        assert!(stats.std_dev() < 1e-6);
    }
}
