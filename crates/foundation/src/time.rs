/// Inclusive range of calendar years driven by the timeline slider.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// Builds a range, swapping the ends if given in reverse.
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn single(year: i32) -> Self {
        Self {
            min: year,
            max: year,
        }
    }

    pub fn len(&self) -> usize {
        usize::try_from(i64::from(self.max) - i64::from(self.min))
            .unwrap_or(usize::MAX)
            .saturating_add(1)
    }

    /// Position of `year` within the range, `None` outside it.
    pub fn offset(&self, year: i32) -> Option<usize> {
        if !self.contains(year) {
            return None;
        }
        usize::try_from(i64::from(year) - i64::from(self.min)).ok()
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.min && year <= self.max
    }

    pub fn clamp(&self, year: i32) -> i32 {
        year.clamp(self.min, self.max)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.min..=self.max
    }
}

#[cfg(test)]
mod tests {
    use super::YearRange;

    #[test]
    fn range_is_inclusive_and_ordered() {
        let r = YearRange::new(1970, 1965);
        assert_eq!(r.min, 1965);
        assert_eq!(r.len(), 6);
        assert!(r.contains(1970));
        assert_eq!(r.clamp(2000), 1970);
        assert_eq!(r.years().count(), 6);
        assert_eq!(r.offset(1967), Some(2));
        assert_eq!(r.offset(1971), None);
    }

    #[test]
    fn extreme_ranges_do_not_overflow() {
        let r = YearRange::new(i32::MIN, i32::MAX);
        assert!(r.len() > 1);
        assert_eq!(r.offset(i32::MAX), usize::try_from(u32::MAX).ok());
        assert_eq!(YearRange::single(i32::MAX).len(), 1);
    }
}
