//! Combo multiplier applied to token rewards

use crate::efficiency::round_hundredths;

pub const BASE_COMBO: f64 = 1.0;
pub const DEFAULT_COMBO_STEP: f64 = 0.1;
pub const DEFAULT_COMBO_CAP: f64 = 2.0;

/// Grows by a fixed step on every successful flush, never past the cap.
/// Values are kept at hundredth precision, so steps finer than 0.01 are not
/// supported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComboMultiplier {
    value: f64,
    step: f64,
    cap: f64,
}

impl ComboMultiplier {
    pub fn new(step: f64, cap: f64) -> Self {
        Self {
            value: BASE_COMBO,
            step: step.max(0.0),
            cap: cap.max(BASE_COMBO),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn bump(&mut self) -> f64 {
        self.value = round_hundredths(self.value + self.step).min(self.cap);
        self.value
    }

    /// Scale a token reward by the current multiplier.
    pub fn apply(&self, tokens: f64) -> f64 {
        tokens * self.value
    }
}

impl Default for ComboMultiplier {
    fn default() -> Self {
        Self::new(DEFAULT_COMBO_STEP, DEFAULT_COMBO_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_steps() {
        let mut combo = ComboMultiplier::default();
        assert_eq!(combo.value(), 1.0);
        assert_eq!(combo.bump(), 1.1);
        assert_eq!(combo.bump(), 1.2);
        assert_eq!(combo.apply(2.0), 2.4);
    }

    #[test]
    fn test_never_exceeds_cap() {
        let mut combo = ComboMultiplier::default();
        for _ in 0..50 {
            assert!(combo.bump() <= 2.0);
        }
        assert_eq!(combo.value(), 2.0);
    }

    #[test]
    fn test_cap_not_a_multiple_of_step() {
        let mut combo = ComboMultiplier::new(0.3, 1.5);
        combo.bump();
        assert_eq!(combo.bump(), 1.5);
        assert_eq!(combo.bump(), 1.5);
    }
}
