//! In-loop saturation for the feedback delay network.
//!
//! Sits after the feedback matrix, before the tone filter, one instance per
//! FDN channel. Four curves with different harmonic signatures:
//!
//! | Type | Curve |
//! |------|-------|
//! | Soft | `1.5x − 0.5x³` on the input clamped to ±1 |
//! | Warm | `tanh(x)` |
//! | Tape | `tanh(x)` for x ≥ 0, `1.25·tanh(0.8x)` below |
//! | Tube | `tanh(1.2x)` for x ≥ 0, `tanh(0.8x)` below |
//!
//! Flow: drive → asymmetry offset → curve → DC blocker (active only when the
//! offset is non-zero, since a symmetric curve adds no DC) → wet/dry blend by
//! amount. Every curve maps [−∞, ∞] into [−1.25, 1.25], which bounds the
//! stage inside the feedback loop regardless of drive.

use crate::params::SatType;
use cuerda_core::db_to_linear;
use libm::tanhf;

/// Per-channel saturator with asymmetry DC compensation.
#[derive(Debug, Clone)]
pub struct Saturator {
    /// Wet blend, 0–1.
    amount: f32,
    /// Linear drive gain.
    drive: f32,
    curve: SatType,
    /// DC offset injected before the curve, 0–0.2.
    asym_offset: f32,
    /// DC-blocker pole (~10 Hz highpass).
    dc_coeff: f32,
    dc_x1: f32,
    dc_y1: f32,
}

impl Saturator {
    /// Create a transparent saturator for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        let mut sat = Self {
            amount: 0.0,
            drive: 1.0,
            curve: SatType::Warm,
            asym_offset: 0.0,
            dc_coeff: 0.995,
            dc_x1: 0.0,
            dc_y1: 0.0,
        };
        sat.set_sample_rate(sample_rate);
        sat
    }

    /// Recompute the DC-blocker pole for a ~10 Hz corner.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let r = 1.0 - core::f32::consts::TAU * 10.0 / sample_rate;
        self.dc_coeff = r.clamp(0.9, 0.9999);
    }

    /// Set amount (0–100 %), drive (dB), curve, and asymmetry (0–100 %).
    pub fn set_parameters(&mut self, amount: f32, drive_db: f32, curve: SatType, asymmetry: f32) {
        self.amount = amount * 0.01;
        self.drive = db_to_linear(drive_db);
        self.curve = curve;
        // 0–100 % → 0–0.2 offset
        self.asym_offset = asymmetry * 0.002;
    }

    /// Saturate one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if self.amount < 1e-6 {
            return input;
        }

        let driven = input * self.drive + self.asym_offset;
        let saturated = self.apply_curve(driven);

        let result = if self.asym_offset.abs() > 1e-6 {
            let blocked = saturated - self.dc_x1 + self.dc_coeff * self.dc_y1;
            self.dc_x1 = saturated;
            self.dc_y1 = blocked;
            blocked
        } else {
            saturated
        };

        (1.0 - self.amount) * input + self.amount * result
    }

    /// Pre-seed the DC blocker with the curve's response to the bare offset,
    /// so zero input produces exactly zero output after reset.
    pub fn reset(&mut self) {
        self.dc_x1 = self.apply_curve(self.asym_offset);
        self.dc_y1 = 0.0;
    }

    #[inline]
    fn apply_curve(&self, x: f32) -> f32 {
        match self.curve {
            SatType::Soft => {
                let c = x.clamp(-1.0, 1.0);
                1.5 * c - 0.5 * c * c * c
            }
            SatType::Warm => tanhf(x),
            SatType::Tape => {
                if x >= 0.0 {
                    tanhf(x)
                } else {
                    1.25 * tanhf(0.8 * x)
                }
            }
            SatType::Tube => {
                if x >= 0.0 {
                    tanhf(1.2 * x)
                } else {
                    tanhf(0.8 * x)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    #[test]
    fn zero_amount_is_bit_transparent() {
        let mut sat = Saturator::new(SR);
        sat.set_parameters(0.0, 24.0, SatType::Tube, 100.0);
        for &x in &[0.0, 0.5, -0.99, 1.0] {
            assert_eq!(sat.process(x), x);
        }
    }

    #[test]
    fn all_curves_bounded_at_full_drive() {
        for curve in [SatType::Soft, SatType::Warm, SatType::Tape, SatType::Tube] {
            let mut sat = Saturator::new(SR);
            sat.set_parameters(100.0, 24.0, curve, 0.0);
            sat.reset();
            for i in 0..2000 {
                let x = (i as f32 / 1000.0) - 1.0; // sweep [−1, 1)
                let y = sat.process(x);
                assert!(
                    y.abs() <= 1.3,
                    "{curve:?}: |y| = {} for x = {x}",
                    y.abs()
                );
            }
        }
    }

    #[test]
    fn warm_saturates_toward_unity() {
        let mut sat = Saturator::new(SR);
        sat.set_parameters(100.0, 24.0, SatType::Warm, 0.0);
        let y = sat.process(1.0);
        assert!(y > 0.99 && y < 1.0, "got {y}");
    }

    #[test]
    fn soft_curve_matches_polynomial() {
        let mut sat = Saturator::new(SR);
        sat.set_parameters(100.0, 0.0, SatType::Soft, 0.0);
        let x = 0.5f32;
        let expected = 1.5 * x - 0.5 * x * x * x;
        assert!((sat.process(x) - expected).abs() < 1e-6);
        // Beyond the clamp the polynomial freezes at its ±1 value
        assert!((sat.process(3.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tape_is_asymmetric() {
        let mut sat = Saturator::new(SR);
        sat.set_parameters(100.0, 12.0, SatType::Tape, 0.0);
        let pos = sat.process(0.5);
        let neg = sat.process(-0.5);
        assert!(
            (pos + neg).abs() > 1e-3,
            "tape halves should differ: {pos} vs {neg}"
        );
    }

    #[test]
    fn asymmetry_engages_dc_blocker() {
        let mut sat = Saturator::new(SR);
        sat.set_parameters(100.0, 6.0, SatType::Warm, 50.0);
        sat.reset();
        // A long sine should come out without DC
        let mut sum = 0.0f64;
        let n = 44100;
        for i in 0..n {
            let x = libm::sinf(core::f32::consts::TAU * 100.0 * i as f32 / SR) * 0.5;
            sum += sat.process(x) as f64;
        }
        let mean = sum / n as f64;
        assert!(mean.abs() < 0.01, "residual DC {mean}");
    }

    #[test]
    fn reset_gives_zero_for_zero_input() {
        let mut sat = Saturator::new(SR);
        sat.set_parameters(100.0, 12.0, SatType::Tube, 80.0);
        // Disturb the state, then reset
        for _ in 0..100 {
            sat.process(0.7);
        }
        sat.reset();
        for _ in 0..100 {
            let y = sat.process(0.0);
            assert!(y.abs() < 1e-6, "nonzero output after reset: {y}");
        }
    }

    #[test]
    fn drive_increases_compression() {
        let mut gentle = Saturator::new(SR);
        gentle.set_parameters(100.0, 0.0, SatType::Warm, 0.0);
        let mut hard = Saturator::new(SR);
        hard.set_parameters(100.0, 24.0, SatType::Warm, 0.0);
        // At high drive the output is much closer to the rail
        assert!(hard.process(0.2) > gentle.process(0.2));
    }
}
