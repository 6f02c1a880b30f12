/// Frame metadata handed to per-frame callbacks.
///
/// Timestamps come from the host (`requestAnimationFrame`) in production and
/// are injected directly in tests, so animation code never reads a clock.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Host timestamp in milliseconds.
    pub now_ms: f64,
}

impl Frame {
    pub fn new(index: u64, now_ms: f64) -> Self {
        Self { index, now_ms }
    }

    /// Next frame at `now_ms`. Timestamps never run backwards.
    pub fn next(self, now_ms: f64) -> Self {
        Self::new(self.index + 1, now_ms.max(self.now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn next_advances_index_and_time() {
        let f0 = Frame::new(0, 10.0);
        let f1 = f0.next(26.5);
        assert_eq!(f1.index, 1);
        assert_eq!(f1.now_ms, 26.5);
    }

    #[test]
    fn time_is_monotonic() {
        let f = Frame::new(3, 100.0).next(90.0);
        assert_eq!(f.now_ms, 100.0);
    }
}
