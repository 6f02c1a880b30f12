pub struct Statistics;

impl Statistics {
    /// Finite values in ascending order.
    pub fn sorted_finite(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
        let mut out: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        out.sort_by(f64::total_cmp);
        out
    }

    /// Linear-interpolated quantile of an ascending slice (R-7, the same rule
    /// d3 uses). `p` is clamped to `[0, 1]`.
    pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
        let n = sorted.len();
        if n == 0 || p.is_nan() {
            return None;
        }
        let p = p.clamp(0.0, 1.0);
        let i = (n - 1) as f64 * p;
        let i0 = i.floor() as usize;
        let lo = sorted[i0];
        match sorted.get(i0 + 1) {
            Some(&hi) => Some(lo + (hi - lo) * (i - i0 as f64)),
            None => Some(lo),
        }
    }

    /// `bins - 1` thresholds splitting `values` into equal-count classes.
    /// Empty when there is no finite value or fewer than two bins.
    pub fn quantile_breaks(values: impl IntoIterator<Item = f64>, bins: usize) -> Vec<f64> {
        let sorted = Self::sorted_finite(values);
        if sorted.is_empty() || bins < 2 {
            return Vec::new();
        }
        (1..bins)
            .filter_map(|i| Self::quantile(&sorted, i as f64 / bins as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Statistics;
    use pretty_assertions::assert_eq;

    #[test]
    fn sorted_finite_drops_nan_and_infinity() {
        assert_eq!(
            Statistics::sorted_finite([f64::NAN, 3.0, -1.0, f64::INFINITY]),
            vec![-1.0, 3.0]
        );
    }

    #[test]
    fn quantile_interpolates() {
        let s = [0.0, 10.0, 20.0, 30.0];
        assert_eq!(Statistics::quantile(&s, 0.0), Some(0.0));
        assert_eq!(Statistics::quantile(&s, 0.5), Some(15.0));
        assert_eq!(Statistics::quantile(&s, 1.0), Some(30.0));
        assert_eq!(Statistics::quantile(&[], 0.5), None);
    }

    #[test]
    fn breaks_ignore_non_finite() {
        let breaks = Statistics::quantile_breaks([4.0, f64::NAN, 0.0, 2.0, 1.0, 3.0], 4);
        assert_eq!(breaks, vec![1.0, 2.0, 3.0]);
        assert!(Statistics::quantile_breaks([f64::NAN], 4).is_empty());
    }
}
