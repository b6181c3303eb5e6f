//! Velvet-noise early reflections (layer 1).
//!
//! An optimised velvet-noise (OVN) pulse train acts as a sparse FIR: ±1
//! pulses at jittered positions, one per grid cell, each weighted by an
//! exponential decay envelope. Convolving the input with ~60 such taps over
//! 30 ms yields dense, transient-preserving early reflections at a fraction
//! of the cost of a dense FIR.
//!
//! The convolution state is a persistent input ring buffer, so taps near the
//! end of the sequence read correctly delayed input across block boundaries.
//!
//! Reference: Fagerström et al., "Velvet-Noise Feedback Delay Network",
//! DAFx-20 (2020).

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use cuerda_core::Lcg;
use libm::{expf, logf, sqrtf};

/// One velvet-noise tap with its envelope and normalisation premultiplied.
#[derive(Debug, Clone, Copy)]
struct Pulse {
    /// Delay of this tap in samples.
    position: usize,
    /// `sign · envelope · rms_norm`.
    coeff: f32,
}

/// Deterministic sparse-FIR convolver for the early-reflection layer.
pub struct VelvetSequence {
    pulses: Vec<Pulse>,
    sequence_len: usize,
    ring: Vec<f32>,
    write_pos: usize,
}

impl VelvetSequence {
    /// Generate a pulse train and size the convolution ring.
    ///
    /// Positions are jittered uniformly within grid cells of
    /// `⌊sample_rate / density⌋` samples; signs come from the seeded LCG.
    /// Each pulse is weighted by `exp(−3·ln10 · position / len)` (−60 dB
    /// across the sequence) and the set is scaled to unit RMS gain.
    pub fn generate(
        sample_rate: f64,
        duration_ms: f32,
        density: f32,
        seed: u32,
        max_block: usize,
    ) -> Self {
        let total_samples = ((sample_rate * duration_ms as f64 * 0.001) as usize).max(1);
        let grid = ((sample_rate / density as f64) as usize).max(1);
        let num_pulses = total_samples / grid;

        let decay_rate = -3.0 * logf(10.0) / total_samples as f32;

        let mut rng = Lcg::new(seed);
        let mut pulses = Vec::with_capacity(num_pulses);
        for m in 0..num_pulses {
            let position = m * grid + rng.next_range(grid as u32) as usize;
            let sign = rng.next_sign();
            if position < total_samples {
                let envelope = expf(decay_rate * position as f32);
                pulses.push(Pulse {
                    position,
                    coeff: sign * envelope,
                });
            }
        }

        // Unit RMS gain for the sparse FIR
        let energy: f32 = pulses.iter().map(|p| p.coeff * p.coeff).sum();
        if energy > 0.0 {
            let norm = 1.0 / sqrtf(energy);
            for p in &mut pulses {
                p.coeff *= norm;
            }
        }

        Self {
            pulses,
            sequence_len: total_samples,
            ring: vec![0.0; total_samples + max_block.max(1)],
            write_pos: 0,
        }
    }

    /// Sequence length in samples.
    pub fn sequence_len(&self) -> usize {
        self.sequence_len
    }

    /// Number of generated pulses.
    pub fn pulse_count(&self) -> usize {
        self.pulses.len()
    }

    /// Convolve a block. `output` is overwritten with the scaled result.
    ///
    /// Runs pulse-outer/sample-inner: the block is committed to the ring
    /// first, then each tap streams over the block, which keeps the tap
    /// coefficient and its base read index in registers.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], gain: f32) {
        debug_assert_eq!(input.len(), output.len());
        debug_assert!(input.len() < self.ring.len());
        let len = self.ring.len();

        for (n, &x) in input.iter().enumerate() {
            self.ring[(self.write_pos + n) % len] = x;
        }

        output.fill(0.0);
        for pulse in &self.pulses {
            // Index of input[0] delayed by the pulse position
            let base = self.write_pos + len - pulse.position;
            let coeff = pulse.coeff * gain;
            for (n, out) in output.iter_mut().enumerate() {
                *out += coeff * self.ring[(base + n) % len];
            }
        }

        self.write_pos = (self.write_pos + input.len()) % len;
    }

    /// Zero the convolution history.
    pub fn reset(&mut self) {
        self.ring.fill(0.0);
        self.write_pos = 0;
    }
}
