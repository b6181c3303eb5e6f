//! Multi-channel input diffuser.
//!
//! Four cascaded steps, each of which delays every channel by a different
//! amount, permutes and sign-flips the channels, and mixes them through a
//! normalised Hadamard matrix. A single input pulse leaves the cascade as
//! 8⁴ = 4096 echoes, giving the FDN immediate density at its input.
//!
//! Per-step maximum delays are 5, 10, 20, 40 ms; within a step, channel `ch`
//! draws its delay uniformly from the sub-range
//! `[max·ch/8, max·(ch+1)/8]`, which spreads the taps evenly instead of
//! clustering them. The draws come from a fixed-seed LCG, so the layout is
//! deterministic and immutable after construction.
//!
//! Reference: Signalsmith, "Let's Write a Reverb" (ADC 2021).

use crate::fdn::NUM_CHANNELS;
use crate::matrix::normalized_hadamard;
use cuerda_core::{DelayLine, Lcg};

/// Number of cascaded diffusion steps.
pub const NUM_STEPS: usize = 4;

/// Per-step maximum delays in milliseconds.
const STEP_MAX_MS: [f32; NUM_STEPS] = [5.0, 10.0, 20.0, 40.0];

/// Seed for delay draws and polarity flips.
const DIFFUSER_SEED: u32 = 0xbaad_f00d;

struct DiffusionStep {
    lines: [DelayLine; NUM_CHANNELS],
    delays: [usize; NUM_CHANNELS],
    shuffle: [usize; NUM_CHANNELS],
    signs: [f32; NUM_CHANNELS],
}

/// Four-step shuffle/flip/Hadamard diffusion cascade.
pub struct Diffuser {
    steps: [DiffusionStep; NUM_STEPS],
    hadamard: [[f32; NUM_CHANNELS]; NUM_CHANNELS],
}

impl Diffuser {
    /// Build the cascade for the given (oversampled) rate.
    pub fn new(sample_rate: f64) -> Self {
        let mut rng = Lcg::new(DIFFUSER_SEED);

        let steps = core::array::from_fn(|step| {
            let max_delay = STEP_MAX_MS[step] * 0.001 * sample_rate as f32;

            let mut delays = [0usize; NUM_CHANNELS];
            let lines = core::array::from_fn(|ch| {
                let lo = max_delay * ch as f32 / NUM_CHANNELS as f32;
                let hi = max_delay * (ch + 1) as f32 / NUM_CHANNELS as f32;
                let t = rng.next_unit();
                let delay = ((lo + t * (hi - lo)) as usize).max(1);
                delays[ch] = delay;
                DelayLine::new(delay)
            });

            let mut shuffle = [0usize; NUM_CHANNELS];
            let mut signs = [0.0f32; NUM_CHANNELS];
            for ch in 0..NUM_CHANNELS {
                shuffle[ch] = (ch + step + 1) % NUM_CHANNELS;
                signs[ch] = rng.next_sign();
            }

            DiffusionStep {
                lines,
                delays,
                shuffle,
                signs,
            }
        });

        Self {
            steps,
            hadamard: normalized_hadamard(),
        }
    }

    /// Diffuse one 8-channel sample.
    pub fn process_sample(
        &mut self,
        input: &[f32; NUM_CHANNELS],
        output: &mut [f32; NUM_CHANNELS],
    ) {
        let mut current = *input;

        for step in &mut self.steps {
            // Per-channel delay
            let mut delayed = [0.0f32; NUM_CHANNELS];
            for ch in 0..NUM_CHANNELS {
                step.lines[ch].write(current[ch]);
                delayed[ch] = step.lines[ch].read_integer(step.delays[ch]);
            }

            // Shuffle + polarity flip
            let mut shuffled = [0.0f32; NUM_CHANNELS];
            for ch in 0..NUM_CHANNELS {
                shuffled[ch] = step.signs[ch] * delayed[step.shuffle[ch]];
            }

            // Hadamard mix
            for (i, row) in self.hadamard.iter().enumerate() {
                let mut sum = 0.0;
                for (j, &h) in row.iter().enumerate() {
                    sum += h * shuffled[j];
                }
                current[i] = sum;
            }
        }

        *output = current;
    }

    /// Zero every delay buffer.
    pub fn reset(&mut self) {
        for step in &mut self.steps {
            for line in &mut step.lines {
                line.clear();
            }
        }
    }
}
