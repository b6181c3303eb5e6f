//! Eight-channel feedback delay network (layer 2).
//!
//! Runs at the oversampled rate. Per-sample signal flow:
//!
//! ```text
//! stereo in → spread to 8 ch → diffuser ─────────────┐
//!                                                    ▼ (injection)
//! delay lines → attenuation shelves → output taps   write
//!        ▲                    │                      ▲
//!        └── LFO-modulated    └→ matrix blend → saturate → tone → clamp
//! ```
//!
//! The feedback path is kept contractive by construction: shelves are capped
//! below unity gain, the matrix blend is energy-renormalised, the tone filter
//! is unity-bounded, and a `2·tanh(y/2)` clamp bounds any channel that still
//! runs away. Delay-length targets are smoothed per sample so room-size
//! automation never glitches.
//!
//! Architecture after Jot (1992) with a Signalsmith-style input diffuser.

use crate::diffuser::Diffuser;
use crate::matrix::{FeedbackMatrix, MatrixKind};
use crate::params::ReverbParams;
use crate::saturation::Saturator;
use crate::shelf::ShelfFilter;
use crate::tone::ToneFilter;
use cuerda_core::{DelayLine, SmoothedParam};
use libm::{powf, sinf, sqrtf};

/// Number of delay lines / network channels.
pub const NUM_CHANNELS: usize = 8;

/// Mutually-coprime base delay lengths in samples at 44.1 kHz.
/// Scaled by room size and the rate ratio at parameter-update time.
pub const BASE_DELAYS: [usize; NUM_CHANNELS] = [887, 1151, 1559, 1907, 2467, 3109, 3907, 4787];

/// Peak modulation excursion in samples at full depth.
const MAX_MOD_SAMPLES: f32 = 16.0;

/// Modulation headroom reserved in every delay buffer.
const MOD_HEADROOM: usize = 128;

/// Input spread gain: 1/√(N/2), four lines per side.
const INPUT_SCALE: f32 = 0.5;

/// Output tap gain: four lines per side.
const OUTPUT_SCALE: f32 = 0.5;

/// Delay-length smoothing time constant in milliseconds.
const DELAY_SMOOTHING_MS: f32 = 5.0;

/// The feedback delay network.
pub struct Fdn {
    sample_rate: f64,
    delay_lines: [DelayLine; NUM_CHANNELS],
    matrix: FeedbackMatrix,
    shelves: [ShelfFilter; NUM_CHANNELS],
    saturators: [Saturator; NUM_CHANNELS],
    tone_filters: [ToneFilter; NUM_CHANNELS],
    diffuser: Diffuser,

    target_delays: [f32; NUM_CHANNELS],
    smoothed_delays: [SmoothedParam; NUM_CHANNELS],

    diffusion: f32,
    mod_depth: f32,
    mod_rate: f32,
    lfo_phase: f64,

    bypass_saturation: bool,
    bypass_tone: bool,
    bypass_atten: bool,
    bypass_modulation: bool,
}

impl Fdn {
    /// Create a network prepared for `sample_rate` (the oversampled rate).
    pub fn new(sample_rate: f64) -> Self {
        let sr = sample_rate as f32;
        let mut fdn = Self {
            sample_rate,
            delay_lines: core::array::from_fn(|_| DelayLine::new(1)),
            matrix: FeedbackMatrix::new(MatrixKind::Hadamard),
            shelves: core::array::from_fn(|_| ShelfFilter::new(sr)),
            saturators: core::array::from_fn(|_| Saturator::new(sr)),
            tone_filters: core::array::from_fn(|_| ToneFilter::new(sr)),
            diffuser: Diffuser::new(sample_rate),
            target_delays: [0.0; NUM_CHANNELS],
            smoothed_delays: core::array::from_fn(|_| {
                SmoothedParam::with_config(0.0, sr, DELAY_SMOOTHING_MS)
            }),
            diffusion: 0.8,
            mod_depth: 0.0,
            mod_rate: 0.5,
            lfo_phase: 0.0,
            bypass_saturation: false,
            bypass_tone: false,
            bypass_atten: false,
            bypass_modulation: false,
        };
        fdn.prepare(sample_rate);
        fdn
    }

    /// Size all delay buffers for `sample_rate` and clear state. Idempotent.
    ///
    /// Buffer bound: largest base delay × max room size × rate ratio, plus
    /// 128 samples of modulation headroom.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        let sr = sample_rate as f32;

        let rate_ratio = sample_rate / 44100.0;
        let max_delay = (BASE_DELAYS[NUM_CHANNELS - 1] as f64 * rate_ratio) as usize + MOD_HEADROOM;
        self.delay_lines = core::array::from_fn(|_| DelayLine::new(max_delay));

        for shelf in &mut self.shelves {
            shelf.set_sample_rate(sr);
        }
        for sat in &mut self.saturators {
            sat.set_sample_rate(sr);
        }
        for tone in &mut self.tone_filters {
            tone.set_sample_rate(sr);
        }
        self.diffuser = Diffuser::new(sample_rate);

        for smoother in &mut self.smoothed_delays {
            smoother.set_sample_rate(sr);
        }

        self.reset();
    }

    /// Push a parameter snapshot into the network (once per block).
    pub fn set_parameters(&mut self, params: &ReverbParams) {
        let sr = self.sample_rate as f32;
        let rate_ratio = (self.sample_rate / 44100.0) as f32;

        for i in 0..NUM_CHANNELS {
            self.target_delays[i] = BASE_DELAYS[i] as f32 * params.room_size * rate_ratio;
            self.smoothed_delays[i].set_target(self.target_delays[i]);
        }

        // Exponential knob law: 0 % → 20 kHz, 100 % → 500 Hz
        let crossover_hz = 20000.0 * powf(500.0 / 20000.0, params.hf_damping * 0.01);

        for i in 0..NUM_CHANNELS {
            let g_low = ShelfFilter::loop_gain(self.target_delays[i], params.low_rt60_s, sr);
            let g_high = ShelfFilter::loop_gain(self.target_delays[i], params.high_rt60_s, sr);
            self.shelves[i].set_coefficients(g_low, g_high, crossover_hz, sr);
        }

        self.diffusion = (params.diffusion * 0.01).clamp(0.0, 1.0);

        for sat in &mut self.saturators {
            sat.set_parameters(
                params.sat_amount,
                params.sat_drive_db,
                params.sat_type,
                params.sat_asymmetry,
            );
        }
        for tone in &mut self.tone_filters {
            tone.set_tone(params.sat_tone);
        }

        self.mod_depth = params.mod_depth * 0.01;
        self.mod_rate = params.mod_rate_hz;

        self.bypass_saturation = params.bypass_saturation;
        self.bypass_tone = params.bypass_tone_filter;
        self.bypass_atten = params.bypass_atten_filter;
        self.bypass_modulation = params.bypass_modulation;
    }

    /// Process one stereo sample at the oversampled rate.
    pub fn process_sample(&mut self, input_l: f32, input_r: f32) -> (f32, f32) {
        // 1. Spread the stereo pair across the 8 channels and diffuse
        let mut diffuser_input = [0.0f32; NUM_CHANNELS];
        for (i, v) in diffuser_input.iter_mut().enumerate() {
            *v = if i % 2 == 0 { input_l } else { input_r } * INPUT_SCALE;
        }
        let mut diffused = [0.0f32; NUM_CHANNELS];
        self.diffuser.process_sample(&diffuser_input, &mut diffused);

        // 2. Read delay lines
        let mut reads = [0.0f32; NUM_CHANNELS];
        for (i, r) in reads.iter_mut().enumerate() {
            *r = self.delay_lines[i].read();
        }

        // 3. Attenuation shelves (before the matrix, per Jot)
        let mut attenuated = [0.0f32; NUM_CHANNELS];
        if self.bypass_atten {
            attenuated = reads;
        } else {
            for i in 0..NUM_CHANNELS {
                attenuated[i] = self.shelves[i].process(reads[i]);
            }
        }

        // 4. Output taps, even → L, odd → R
        let mut out_l = 0.0;
        let mut out_r = 0.0;
        for (i, &a) in attenuated.iter().enumerate() {
            if i % 2 == 0 {
                out_l += a;
            } else {
                out_r += a;
            }
        }
        out_l *= OUTPUT_SCALE;
        out_r *= OUTPUT_SCALE;

        // 5. Feedback mix: blend identity with the orthonormal matrix and
        //    renormalise so the blend never adds energy
        let mut feedback = [0.0f32; NUM_CHANNELS];
        if self.diffusion < 0.001 {
            feedback = attenuated;
        } else if self.diffusion > 0.999 {
            self.matrix.process(&attenuated, &mut feedback);
        } else {
            let mut mixed = [0.0f32; NUM_CHANNELS];
            self.matrix.process(&attenuated, &mut mixed);

            let mut energy_in = 0.0;
            for &a in &attenuated {
                energy_in += a * a;
            }
            let mut energy_out = 0.0;
            for i in 0..NUM_CHANNELS {
                feedback[i] =
                    (1.0 - self.diffusion) * attenuated[i] + self.diffusion * mixed[i];
                energy_out += feedback[i] * feedback[i];
            }
            if energy_in > 1e-10 && energy_out > 1e-10 {
                let norm = sqrtf(energy_in / energy_out);
                for f in &mut feedback {
                    *f *= norm;
                }
            }
        }

        // 6. In-loop saturation and tone (both optional)
        let mut processed = feedback;
        if !self.bypass_saturation {
            for i in 0..NUM_CHANNELS {
                processed[i] = self.saturators[i].process(processed[i]);
            }
        }
        if !self.bypass_tone {
            for i in 0..NUM_CHANNELS {
                processed[i] = self.tone_filters[i].process(processed[i]);
            }
        }

        // 7. Safety clamp on runaway channel state
        for p in &mut processed {
            *p = cuerda_core::safety_clamp(*p);
        }

        // 8. Advance smoothed delay targets, apply modulation, write back
        let phase = self.lfo_phase as f32;
        for i in 0..NUM_CHANNELS {
            let base = self.smoothed_delays[i].advance();

            let delay = if self.bypass_modulation {
                base
            } else {
                let offset = core::f32::consts::TAU * i as f32 / NUM_CHANNELS as f32;
                base + self.mod_depth * MAX_MOD_SAMPLES * sinf(phase + offset)
            };
            self.delay_lines[i].set_delay(delay);
            self.delay_lines[i].write(diffused[i] + processed[i]);
        }

        if !self.bypass_modulation {
            self.lfo_phase +=
                core::f64::consts::TAU * self.mod_rate as f64 / self.sample_rate;
            if self.lfo_phase > core::f64::consts::TAU {
                self.lfo_phase -= core::f64::consts::TAU;
            }
        }

        // 9. Denormal kill on the taps
        out_l = (out_l + 1e-18) - 1e-18;
        out_r = (out_r + 1e-18) - 1e-18;

        (out_l, out_r)
    }

    /// Zero all state; smoothed delays snap to their targets.
    pub fn reset(&mut self) {
        for line in &mut self.delay_lines {
            line.clear();
        }
        for shelf in &mut self.shelves {
            shelf.reset();
        }
        for sat in &mut self.saturators {
            sat.reset();
        }
        for tone in &mut self.tone_filters {
            tone.reset();
        }
        self.diffuser.reset();
        for smoother in &mut self.smoothed_delays {
            smoother.snap_to_target();
        }
        self.lfo_phase = 0.0;
    }
}
