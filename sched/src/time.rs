//! Время ядра в миллисекундах / Kernel time in milliseconds

use core::fmt;

/// Момент времени (мс с загрузки) / Instant, milliseconds since boot.
///
/// Часы считаются монотонными, но это не гарантируется:
/// все разности считаются через [`Millis::saturating_since`].
/// The clock is meant to be monotonic but is not trusted to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub const fn new(ms: u64) -> Self { Self(ms) }
    pub const fn as_u64(self) -> u64  { self.0 }

    /// `self - earlier`, 0 if the clock went backwards.
    pub const fn saturating_since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub const fn saturating_add(self, ms: u64) -> Millis {
        Millis(self.0.saturating_add(ms))
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backwards_clock_clamps_to_zero() {
        assert_eq!(Millis(5).saturating_since(Millis(9)), 0);
        assert_eq!(Millis(9).saturating_since(Millis(5)), 4);
    }
}
