//! Dark velvet-noise tail (layer 3).
//!
//! Dark velvet noise widens each velvet pulse to 1–4 samples and averages
//! the input across the pulse width, which tilts the spectrum downward —
//! a darker, smoother late tail than plain velvet noise. Each pulse carries
//! a double-exponential envelope
//!
//! ```text
//! env(t) = (1 − shape)·exp(−t/τ₁) + shape·exp(−t/τ₂)
//! τ₁ = RT60 / 6.9078,   τ₂ = 1.5·RT60 / 6.9078
//! ```
//!
//! so `shape` blends a straight exponential decay into a slower secondary
//! slope — the non-exponential decay of coupled spaces.
//!
//! Pulse positions and widths are fixed at prepare over the 3-second maximum
//! tail; RT60 and shape changes only refresh the envelopes. The pulse count
//! is capped (widening the grid, keeping full-length coverage) to bound the
//! worst-case per-sample cost.
//!
//! Reference: Fagerström et al., "Non-Exponential Reverb Modeling Using
//! Dark Velvet Noise", JAES 72(6), 2024.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use cuerda_core::Lcg;
use libm::{expf, sqrtf};

/// Nominal pulse density before the count cap applies.
const DENSITY: f32 = 1800.0;

/// Maximum tail length in seconds.
const MAX_TAIL_S: f64 = 3.0;

/// Worst-case pulse count (CPU ceiling).
const MAX_PULSES: usize = 500;

/// Largest pulse width in samples.
const MAX_WIDTH: u32 = 4;

#[derive(Debug, Clone, Copy)]
struct DvnPulse {
    /// Tap delay in samples.
    position: usize,
    /// ±1.
    sign: f32,
    /// Averaging window width, 1–4 samples.
    width: usize,
    /// Current envelope weight (refreshed on RT60/shape changes).
    envelope: f32,
}

/// Sparse-FIR dark velvet-noise convolver.
pub struct DvnSequence {
    sample_rate: f64,
    pulses: Vec<DvnPulse>,
    /// Pulses `0..active` lie inside the current tail length.
    active: usize,
    /// `sign · envelope · rms_norm / width`, parallel to `pulses`.
    coeffs: Vec<f32>,
    ring: Vec<f32>,
    write_pos: usize,
    decay_shape: f32,
    rt60: f32,
}

impl DvnSequence {
    /// Generate the pulse layout and size the input ring.
    pub fn prepare(sample_rate: f64, max_block: usize, seed: u32) -> Self {
        let max_len = (sample_rate * MAX_TAIL_S) as usize;
        let nominal_grid = ((sample_rate / DENSITY as f64) as usize).max(1);
        // Widen the grid when the nominal density would exceed the CPU cap,
        // so the capped pulse set still spans the whole tail.
        let grid = nominal_grid.max(max_len / MAX_PULSES);
        let num_pulses = (max_len / grid).min(MAX_PULSES);

        let mut rng = Lcg::new(seed);
        let mut pulses = Vec::with_capacity(num_pulses);
        for m in 0..num_pulses {
            let position = m * grid + rng.next_range(grid as u32) as usize;
            let sign = rng.next_sign();
            let width = 1 + rng.next_range(MAX_WIDTH) as usize;
            if position < max_len {
                pulses.push(DvnPulse {
                    position,
                    sign,
                    width,
                    envelope: 1.0,
                });
            }
        }

        let count = pulses.len();
        let mut dvn = Self {
            sample_rate,
            pulses,
            active: count,
            coeffs: vec![0.0; count],
            ring: vec![0.0; max_len + max_block.max(1) + MAX_WIDTH as usize],
            write_pos: 0,
            decay_shape: 0.4,
            rt60: 1.8,
        };
        dvn.refresh_envelopes();
        dvn
    }

    /// Update decay shape (0–1) and RT60; refreshes envelopes only on change.
    pub fn set_parameters(&mut self, decay_shape: f32, rt60_s: f32) {
        let shape = decay_shape.clamp(0.0, 1.0);
        let rt60 = rt60_s.max(0.05);
        if (shape - self.decay_shape).abs() < 1e-6 && (rt60 - self.rt60).abs() < 1e-6 {
            return;
        }
        self.decay_shape = shape;
        self.rt60 = rt60;
        self.refresh_envelopes();
    }

    /// Number of pulses inside the current tail length.
    pub fn active_pulses(&self) -> usize {
        self.active
    }

    /// Convolve a block; `output` is overwritten with the scaled result.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], gain: f32) {
        debug_assert_eq!(input.len(), output.len());
        let len = self.ring.len();

        for (n, &x) in input.iter().enumerate() {
            self.ring[(self.write_pos + n) % len] = x;

            let mut sum = 0.0;
            for (pulse, &coeff) in self.pulses[..self.active].iter().zip(&self.coeffs) {
                // Running-sum window of `width` samples ending at the tap
                let base = self.write_pos + n + len - pulse.position;
                let mut windowed = 0.0;
                for w in 0..pulse.width {
                    windowed += self.ring[(base + len - w) % len];
                }
                sum += coeff * windowed;
            }
            output[n] = sum * gain;
        }

        self.write_pos = (self.write_pos + input.len()) % len;
    }

    /// Zero the convolution history.
    pub fn reset(&mut self) {
        self.ring.fill(0.0);
        self.write_pos = 0;
    }

    /// Recompute envelopes, the active tail span, and the RMS normalisation.
    fn refresh_envelopes(&mut self) {
        let tau1 = self.rt60 / 6.9078;
        let tau2 = self.rt60 * 1.5 / 6.9078;
        let shape = self.decay_shape;

        let tail_len = (self.sample_rate * (2.0 * self.rt60 as f64).min(MAX_TAIL_S)) as usize;
        self.active = self
            .pulses
            .iter()
            .take_while(|p| p.position < tail_len)
            .count();

        let mut energy = 0.0;
        for pulse in &mut self.pulses[..self.active] {
            let t = pulse.position as f32 / self.sample_rate as f32;
            pulse.envelope = (1.0 - shape) * expf(-t / tau1) + shape * expf(-t / tau2);
            energy += pulse.envelope * pulse.envelope;
        }

        let norm = if energy > 0.0 { 1.0 / sqrtf(energy) } else { 0.0 };
        for (pulse, coeff) in self.pulses[..self.active].iter().zip(&mut self.coeffs) {
            *coeff = pulse.sign * pulse.envelope * norm / pulse.width as f32;
        }
    }
}
