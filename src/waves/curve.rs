//! Elite spawn-chance curve: wave index -> probability in [0, 1]

/// Default keyframes as (wave, chance)
pub const DEFAULT_ELITE_KEYFRAMES: [(f32, f32); 5] =
    [(1.0, 0.0), (5.0, 0.1), (10.0, 0.25), (20.0, 0.6), (30.0, 1.0)];

/// Piecewise-linear, monotone non-decreasing sampled curve
#[derive(Debug, Clone, PartialEq)]
pub struct EliteCurve {
    keys: Vec<(f32, f32)>,
}

impl EliteCurve {
    /// Build from keyframes. Rejects empty, non-finite, out-of-range,
    /// duplicate-x or decreasing curves.
    pub fn from_keyframes(keys: &[(f32, f32)]) -> Option<Self> {
        if keys.is_empty() {
            return None;
        }
        let mut keys = keys.to_vec();
        if keys
            .iter()
            .any(|(x, y)| !x.is_finite() || !y.is_finite() || !(0.0..=1.0).contains(y))
        {
            return None;
        }
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        let ordered = keys.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 <= w[1].1);
        ordered.then_some(Self { keys })
    }

    /// Keyframes, falling back to the default curve with a warning
    pub fn from_keyframes_or_default(keys: &[(f32, f32)]) -> Self {
        Self::from_keyframes(keys).unwrap_or_else(|| {
            tracing::warn!("elite curve keyframes invalid; synthesizing default curve");
            Self::default()
        })
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return 0.0,
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        for w in self.keys.windows(2) {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            if x <= x1 {
                let t = (x - x0) / (x1 - x0);
                return (y0 + (y1 - y0) * t).clamp(0.0, 1.0);
            }
        }
        last.1
    }

    pub fn keyframes(&self) -> &[(f32, f32)] {
        &self.keys
    }
}

impl Default for EliteCurve {
    fn default() -> Self {
        Self {
            keys: DEFAULT_ELITE_KEYFRAMES.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_curve_hits_keyframes() {
        let curve = EliteCurve::default();
        assert_eq!(curve.evaluate(1.0), 0.0);
        assert!((curve.evaluate(5.0) - 0.1).abs() < 1e-6);
        assert!((curve.evaluate(10.0) - 0.25).abs() < 1e-6);
        assert!((curve.evaluate(20.0) - 0.6).abs() < 1e-6);
        assert_eq!(curve.evaluate(30.0), 1.0);
    }

    #[test]
    fn test_interpolates_between_keys() {
        let curve = EliteCurve::default();
        // Halfway between (10, 0.25) and (20, 0.6)
        assert!((curve.evaluate(15.0) - 0.425).abs() < 1e-5);
    }

    #[test]
    fn test_clamps_outside_range() {
        let curve = EliteCurve::default();
        assert_eq!(curve.evaluate(-4.0), 0.0);
        assert_eq!(curve.evaluate(99.0), 1.0);
    }

    #[test]
    fn test_monotone_over_waves() {
        let curve = EliteCurve::default();
        let samples: Vec<f32> = (0..40).map(|w| curve.evaluate(w as f32)).collect();
        assert!(samples.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_rejects_bad_keyframes() {
        assert!(EliteCurve::from_keyframes(&[]).is_none());
        assert!(EliteCurve::from_keyframes(&[(1.0, 0.5), (2.0, 0.2)]).is_none());
        assert!(EliteCurve::from_keyframes(&[(1.0, 1.5)]).is_none());
        assert!(EliteCurve::from_keyframes(&[(1.0, 0.1), (1.0, 0.2)]).is_none());
        assert!(EliteCurve::from_keyframes(&[(f32::NAN, 0.1)]).is_none());
    }

    #[test]
    fn test_unsorted_keyframes_accepted() {
        let curve = EliteCurve::from_keyframes(&[(10.0, 1.0), (0.0, 0.0)]).unwrap();
        assert!((curve.evaluate(5.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_fallback_to_default() {
        assert_eq!(EliteCurve::from_keyframes_or_default(&[]), EliteCurve::default());
    }
}
