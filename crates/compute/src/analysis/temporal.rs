use foundation::time::YearRange;

pub struct TemporalAnalysis;

impl TemporalAnalysis {
    /// Value `dt` years after an observation of `value` under per-year decay
    /// `alpha`. Equivalent to applying `× (1 − α)` once per elapsed year.
    pub fn decayed(value: f64, alpha: f64, dt: i32) -> f64 {
        value * (1.0 - alpha).powi(dt.max(0))
    }

    /// One value per year of `range`.
    ///
    /// Real observations win; gaps carry the most recent real observation
    /// forward with geometric decay (observations before `range.min` count).
    /// Years before the first observation are 0. Non-finite observations are
    /// discarded; for duplicate years the later observation wins.
    pub fn densify(observations: &[(i32, f64)], range: YearRange, alpha: f64) -> Vec<f64> {
        let mut obs: Vec<(i32, f64)> = observations
            .iter()
            .copied()
            .filter(|(_, v)| v.is_finite())
            .collect();
        // Stable sort keeps input order within a year, so the last duplicate
        // is the one retained below.
        obs.sort_by_key(|(year, _)| *year);

        let mut out = Vec::with_capacity(range.len());
        let mut next = 0;
        let mut last_real: Option<(i32, f64)> = None;
        for year in range.years() {
            while next < obs.len() && obs[next].0 <= year {
                last_real = Some(obs[next]);
                next += 1;
            }
            let value = match last_real {
                Some((t, v)) if t == year => v,
                Some((t, v)) => Self::decayed(v, alpha, year - t),
                None => 0.0,
            };
            out.push(value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::TemporalAnalysis;
    use foundation::time::YearRange;
    use pretty_assertions::assert_eq;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {a} ~= {b}");
    }

    #[test]
    fn carries_forward_with_decay() {
        let dense = TemporalAnalysis::densify(
            &[(1965, 100.0), (1970, 80.0)],
            YearRange::new(1965, 1972),
            0.1,
        );
        assert_eq!(dense.len(), 8);
        assert_eq!(dense[0], 100.0);
        assert_close(dense[2], 81.0);
        assert_eq!(dense[5], 80.0);
        assert_close(dense[7], 64.8);
    }

    #[test]
    fn closed_form_matches_stepwise() {
        let dense =
            TemporalAnalysis::densify(&[(2000, 50.0)], YearRange::new(2000, 2010), 0.07);
        let mut step = 50.0;
        for (i, v) in dense.iter().enumerate() {
            assert_eq!(*v, 50.0 * (1.0 - 0.07f64).powi(i as i32));
            assert_close(*v, step);
            step *= 1.0 - 0.07;
        }
        assert_eq!(dense[10], 50.0 * (1.0 - 0.07f64).powi(10));
    }

    #[test]
    fn leading_years_are_zero_and_early_rows_seed() {
        let dense = TemporalAnalysis::densify(&[(1962, 10.0)], YearRange::new(1960, 1963), 0.5);
        assert_eq!(dense, vec![0.0, 0.0, 10.0, 5.0]);

        let seeded = TemporalAnalysis::densify(&[(1950, 8.0)], YearRange::new(1951, 1952), 0.5);
        assert_eq!(seeded, vec![4.0, 2.0]);

        let empty = TemporalAnalysis::densify(&[(1960, f64::NAN)], YearRange::new(1960, 1961), 0.5);
        assert_eq!(empty, vec![0.0, 0.0]);
    }

    #[test]
    fn later_duplicate_wins() {
        let dense = TemporalAnalysis::densify(&[(1960, 1.0), (1960, 2.0)], YearRange::single(1960), 0.1);
        assert_eq!(dense, vec![2.0]);
    }
}
