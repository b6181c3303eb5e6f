//! First-order attenuation shelf for the FDN feedback loop.
//!
//! One shelf per delay line realises frequency-dependent decay: the gain at
//! DC is the low-band loop gain, the gain at Nyquist the high-band loop gain,
//! with the transition at the crossover frequency. Per Jot's design the loop
//! gains follow from the line length `L` and the band RT60s:
//!
//! ```text
//! g = 10^(−3·L / (SR·RT60))
//! ```
//!
//! clamped to 0.9999 so the loop magnitude stays strictly below unity on the
//! whole unit circle.
//!
//! The transfer function is built from the first-order allpass parameter
//! `ap = (tan(π·fc/SR) − 1)/(tan(π·fc/SR) + 1)`:
//!
//! ```text
//! H(z) = (b0 + b1·z⁻¹) / (1 + ap·z⁻¹)
//! b0 = ½·(gLow·(1+ap) + gHigh·(1−ap))
//! b1 = ½·(gLow·(1+ap) − gHigh·(1−ap))
//! ```
//!
//! which pins `H(1) = gLow` and `H(−1) = gHigh` exactly. Coefficients are
//! one-pole smoothed (~5 ms) so RT60 and damping automation cannot zipper
//! inside the feedback loop.

use libm::{expf, powf, tanf};

/// Smoothing time constant for coefficient changes, in milliseconds.
const COEFF_SMOOTHING_MS: f32 = 5.0;

/// Loop-gain ceiling keeping the feedback loop contractive.
const MAX_LOOP_GAIN: f32 = 0.9999;

/// First-order shelving attenuation filter with smoothed coefficients.
#[derive(Debug, Clone)]
pub struct ShelfFilter {
    // Target coefficients
    b0_target: f32,
    b1_target: f32,
    a1_target: f32,
    // Smoothed coefficients in use
    b0: f32,
    b1: f32,
    a1: f32,
    /// One-pole smoothing coefficient for the three targets.
    smooth: f32,
    /// Input delay register x[n−1].
    z1: f32,
    /// Output delay register y[n−1].
    z_out1: f32,
}

impl ShelfFilter {
    /// Create a unity-gain shelf running at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            b0_target: 1.0,
            b1_target: 0.0,
            a1_target: 0.0,
            b0: 1.0,
            b1: 0.0,
            a1: 0.0,
            smooth: 1.0,
            z1: 0.0,
            z_out1: 0.0,
        };
        filter.set_sample_rate(sample_rate);
        filter
    }

    /// Compute the per-band loop gain for a delay of `delay_samples` at the
    /// given RT60. The result is clamped to the loop-gain ceiling.
    pub fn loop_gain(delay_samples: f32, rt60_s: f32, sample_rate: f32) -> f32 {
        let delay_sec = delay_samples / sample_rate;
        let g = powf(10.0, -3.0 * delay_sec / rt60_s.max(0.05));
        g.clamp(0.0, MAX_LOOP_GAIN)
    }

    /// Set target coefficients from the band gains and crossover frequency.
    ///
    /// When the band gains coincide the shelf degenerates to a scalar
    /// multiply (`b1 = a1 = 0`).
    pub fn set_coefficients(
        &mut self,
        gain_low: f32,
        gain_high: f32,
        crossover_hz: f32,
        sample_rate: f32,
    ) {
        let g_low = gain_low.clamp(0.0, MAX_LOOP_GAIN);
        let g_high = gain_high.clamp(0.0, MAX_LOOP_GAIN);

        if (g_low - g_high).abs() < 1e-6 {
            self.b0_target = g_low;
            self.b1_target = 0.0;
            self.a1_target = 0.0;
            return;
        }

        let fc = crossover_hz.clamp(20.0, sample_rate * 0.49);
        let t = tanf(core::f32::consts::PI * fc / sample_rate);
        let ap = (t - 1.0) / (t + 1.0);

        self.b0_target = 0.5 * (g_low * (1.0 + ap) + g_high * (1.0 - ap));
        self.b1_target = 0.5 * (g_low * (1.0 + ap) - g_high * (1.0 - ap));
        self.a1_target = ap;
    }

    /// Update the sample rate (recomputes the coefficient smoothing pole).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let samples_per_tau = COEFF_SMOOTHING_MS * 0.001 * sample_rate;
        self.smooth = 1.0 - expf(-1.0 / samples_per_tau.max(1.0));
    }

    /// Filter one sample, advancing the coefficient smoothers.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.b0 += self.smooth * (self.b0_target - self.b0);
        self.b1 += self.smooth * (self.b1_target - self.b1);
        self.a1 += self.smooth * (self.a1_target - self.a1);

        let output = self.b0 * input + self.b1 * self.z1 - self.a1 * self.z_out1;
        self.z1 = input;
        self.z_out1 = output;
        output
    }

    /// Zero the state registers and snap coefficients to their targets.
    pub fn reset(&mut self) {
        self.b0 = self.b0_target;
        self.b1 = self.b1_target;
        self.a1 = self.a1_target;
        self.z1 = 0.0;
        self.z_out1 = 0.0;
    }
}
