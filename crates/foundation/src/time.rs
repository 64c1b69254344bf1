/// Event-loop time in milliseconds.
///
/// The host supplies it (`performance.now()` in the browser, a counter in
/// tests), so scheduling stays deterministic and replayable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn after(self, delay_ms: u64) -> Self {
        Millis(self.0.saturating_add(delay_ms))
    }

    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Millis;

    #[test]
    fn after_saturates() {
        assert_eq!(Millis(u64::MAX - 1).after(10), Millis(u64::MAX));
        assert_eq!(Millis(5).after(10), Millis(15));
    }

    #[test]
    fn since_never_underflows() {
        assert_eq!(Millis(3).since(Millis(10)), 0);
        assert_eq!(Millis(10).since(Millis(3)), 7);
    }
}
