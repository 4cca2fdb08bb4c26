//! Output level helpers.
//!
//! Every level the engine accepts from callers (main output, category,
//! reverb blend) is a linear gain in `[0, 1]`. This module holds that
//! contract plus the dB conversions used when levels are reported.
//!
//! ```rust
//! use sonance_core::level;
//!
//! assert!(level::is_valid_level(0.4));
//! assert!(!level::is_valid_level(1.2));
//! assert!(!level::is_valid_level(f32::NAN));
//! assert!((level::linear_to_db(0.5) - (-6.02)).abs() < 0.01);
//! ```

use libm::{expf, logf};

/// Full level (unity gain).
pub const UNITY: f32 = 1.0;

/// Silence.
pub const SILENT: f32 = 0.0;

/// Whether `level` is a finite value in `[0, 1]`.
#[inline]
pub fn is_valid_level(level: f32) -> bool {
    (SILENT..=UNITY).contains(&level)
}

/// Complement of a wet level: the dry share that keeps `wet + dry == 1`.
#[inline]
pub fn dry_for_wet(wet: f32) -> f32 {
    UNITY - wet
}

/// Convert decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Gains at or below 1e-10 report -200 dB.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(is_valid_level(0.0));
        assert!(is_valid_level(1.0));
        assert!(!is_valid_level(-0.001));
        assert!(!is_valid_level(1.001));
    }

    #[test]
    fn non_finite_rejected() {
        assert!(!is_valid_level(f32::NAN));
        assert!(!is_valid_level(f32::INFINITY));
        assert!(!is_valid_level(f32::NEG_INFINITY));
    }

    #[test]
    fn dry_complements_wet() {
        for i in 0..=10 {
            let wet = i as f32 / 10.0;
            assert!((wet + dry_for_wet(wet) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn db_roundtrip() {
        let db = -12.0;
        assert!((linear_to_db(db_to_linear(db)) - db).abs() < 0.01);
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn silence_is_floored() {
        assert!((linear_to_db(0.0) - (-200.0)).abs() < 0.01);
    }
}
