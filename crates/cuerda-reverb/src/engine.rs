//! Per-block reverberation engine.
//!
//! Drives the three layers around the shared pre-delay and mixer:
//!
//! ```text
//! in ──┬─────────────────────────────────────────────────────────► dry
//!      └► pre-delay ─┬► velvet noise (L1, base rate) ────────────► early
//!                    └► upsample ► FDN (L2, per sample) ► downsample ─┬► late
//!                                                      dark velvet ◄──┘
//!                                                      noise (L3) ───► tail
//! dry/early/late/tail ► mixer (per-sample smoothed gains) ► out
//! ```
//!
//! The engine is allocation-free after [`Engine::prepare`] and a total
//! function of (input block, parameter snapshot, prior state): it never
//! reports errors, and every numerical pathology is handled in-band
//! (gain ceilings, energy renormalisation, safety clamps, denormal kills).
//!
//! Parameter targets are read once per block from the snapshot and advanced
//! through ~10 ms linear smoothers per sample, so automation never zippers.
//! An oversampling-factor change re-prepares the resampler and the network
//! at the block boundary — the audio thread owns the whole transition.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

use crate::dark_velvet::DvnSequence;
use crate::fdn::Fdn;
use crate::mixer::Mixer;
use crate::params::ReverbParams;
use crate::velvet::VelvetSequence;
use cuerda_core::{
    db_to_linear, ms_to_samples, DelayLine, HalfBandOversampler, LinearSmoothedParam,
    Oversampler, OversamplingFactor,
};

/// Velvet-noise seeds, left and right channel.
const EARLY_SEEDS: [u32; 2] = [0xdead_beef, 0xcafe_babe];

/// Dark velvet-noise seeds, left and right channel.
const TAIL_SEEDS: [u32; 2] = [0xabcd_1234, 0x5678_ef01];

/// Early-reflection sequence length and density.
const EARLY_DURATION_MS: f32 = 30.0;
const EARLY_DENSITY: f32 = 2000.0;

/// Maximum pre-delay in milliseconds (the parameter ceiling).
const MAX_PRE_DELAY_MS: f32 = 100.0;

/// Gain and pre-delay smoothing time in milliseconds.
const GAIN_SMOOTHING_MS: f32 = 10.0;

/// Hybrid stereo reverberation engine.
///
/// Generic over the [`Oversampler`] seam; [`HalfBandOversampler`] is the
/// default. The host wrapper owns channel layout: `process_block` expects
/// two equal-length channel slices (mirror a mono input into both).
pub struct Engine<O: Oversampler = HalfBandOversampler> {
    sample_rate: f64,
    max_block: usize,
    params: ReverbParams,
    prepared_factor: OversamplingFactor,

    pre_delay: [DelayLine; 2],
    smooth_pre_delay: LinearSmoothedParam,

    early: [VelvetSequence; 2],
    fdn: Fdn,
    tail: [DvnSequence; 2],
    mixer: Mixer,

    smooth_wet: LinearSmoothedParam,
    smooth_early_gain: LinearSmoothedParam,
    smooth_late_gain: LinearSmoothedParam,
    smooth_width: LinearSmoothedParam,

    oversampler: O,

    // Scratch, sized at prepare
    dry: [Vec<f32>; 2],
    early_buf: [Vec<f32>; 2],
    fdn_buf: [Vec<f32>; 2],
    os_buf: [Vec<f32>; 2],
    tail_buf: [Vec<f32>; 2],
}

impl Engine<HalfBandOversampler> {
    /// Engine with the built-in resampler, prepared for 44.1 kHz / 512.
    pub fn new() -> Self {
        Self::with_oversampler(HalfBandOversampler::new())
    }
}

impl Default for Engine<HalfBandOversampler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Oversampler> Engine<O> {
    /// Engine with a caller-supplied resampler implementation.
    pub fn with_oversampler(oversampler: O) -> Self {
        let params = ReverbParams::default();
        let sample_rate = 44100.0;
        let mut engine = Self {
            sample_rate,
            max_block: 512,
            params,
            prepared_factor: params.oversampling,
            pre_delay: [DelayLine::new(1), DelayLine::new(1)],
            smooth_pre_delay: LinearSmoothedParam::with_config(
                0.0,
                sample_rate as f32,
                GAIN_SMOOTHING_MS,
            ),
            early: [
                VelvetSequence::generate(sample_rate, EARLY_DURATION_MS, EARLY_DENSITY, EARLY_SEEDS[0], 512),
                VelvetSequence::generate(sample_rate, EARLY_DURATION_MS, EARLY_DENSITY, EARLY_SEEDS[1], 512),
            ],
            fdn: Fdn::new(sample_rate),
            tail: [
                DvnSequence::prepare(sample_rate, 512, TAIL_SEEDS[0]),
                DvnSequence::prepare(sample_rate, 512, TAIL_SEEDS[1]),
            ],
            mixer: Mixer::new(),
            smooth_wet: LinearSmoothedParam::with_config(0.3, sample_rate as f32, GAIN_SMOOTHING_MS),
            smooth_early_gain: LinearSmoothedParam::with_config(
                db_to_linear(-3.0),
                sample_rate as f32,
                GAIN_SMOOTHING_MS,
            ),
            smooth_late_gain: LinearSmoothedParam::with_config(
                db_to_linear(-6.0),
                sample_rate as f32,
                GAIN_SMOOTHING_MS,
            ),
            smooth_width: LinearSmoothedParam::with_config(0.7, sample_rate as f32, GAIN_SMOOTHING_MS),
            oversampler,
            dry: [Vec::new(), Vec::new()],
            early_buf: [Vec::new(), Vec::new()],
            fdn_buf: [Vec::new(), Vec::new()],
            os_buf: [Vec::new(), Vec::new()],
            tail_buf: [Vec::new(), Vec::new()],
        };
        engine.prepare(sample_rate, 512);
        engine
    }

    /// Size every buffer and sequence for the host configuration. Idempotent.
    ///
    /// Reallocates scratch, regenerates the velvet sequences, re-prepares
    /// the resampler and the network at the oversampled rate, and snaps all
    /// smoothers to their current targets. No allocation happens after this
    /// returns.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.max_block = max_block_size.max(1);
        let sr = sample_rate as f32;

        let pre_delay_cap = ms_to_samples(MAX_PRE_DELAY_MS, sr) as usize + 1;
        self.pre_delay = [DelayLine::new(pre_delay_cap), DelayLine::new(pre_delay_cap)];

        self.early = [
            VelvetSequence::generate(
                sample_rate,
                EARLY_DURATION_MS,
                EARLY_DENSITY,
                EARLY_SEEDS[0],
                self.max_block,
            ),
            VelvetSequence::generate(
                sample_rate,
                EARLY_DURATION_MS,
                EARLY_DENSITY,
                EARLY_SEEDS[1],
                self.max_block,
            ),
        ];

        self.tail = [
            DvnSequence::prepare(sample_rate, self.max_block, TAIL_SEEDS[0]),
            DvnSequence::prepare(sample_rate, self.max_block, TAIL_SEEDS[1]),
        ];

        for buf in self.dry.iter_mut().chain(&mut self.early_buf) {
            buf.clear();
            buf.resize(self.max_block, 0.0);
        }
        for buf in self.fdn_buf.iter_mut().chain(&mut self.tail_buf) {
            buf.clear();
            buf.resize(self.max_block, 0.0);
        }
        for buf in &mut self.os_buf {
            buf.clear();
            buf.resize(self.max_block * OversamplingFactor::Four.ratio(), 0.0);
        }

        for smoother in [
            &mut self.smooth_pre_delay,
            &mut self.smooth_wet,
            &mut self.smooth_early_gain,
            &mut self.smooth_late_gain,
            &mut self.smooth_width,
        ] {
            smoother.set_sample_rate(sr);
        }

        self.prepare_oversampling(self.params.oversampling);
        self.reset();
    }

    /// Zero all audio state; smoothers snap to the current snapshot targets.
    pub fn reset(&mut self) {
        // Apply the snapshot first so component resets (saturator DC
        // pre-seeding, tail envelopes) see the current parameters
        self.fdn.set_parameters(&self.params);
        for seq in &mut self.tail {
            seq.set_parameters(self.params.decay_shape * 0.01, self.params.low_rt60_s);
        }
        for line in &mut self.pre_delay {
            line.clear();
        }
        for seq in &mut self.early {
            seq.reset();
        }
        self.fdn.reset();
        for seq in &mut self.tail {
            seq.reset();
        }
        self.oversampler.reset();
        self.push_smoother_targets();
        self.smooth_pre_delay.snap_to_target();
        self.smooth_wet.snap_to_target();
        self.smooth_early_gain.snap_to_target();
        self.smooth_late_gain.snap_to_target();
        self.smooth_width.snap_to_target();
    }

    /// Feed the snapshot's mix targets into the per-sample smoothers.
    fn push_smoother_targets(&mut self) {
        let params = self.params;
        self.smooth_wet.set_target(params.dry_wet * 0.01);
        self.smooth_early_gain
            .set_target(db_to_linear(params.early_level_db));
        self.smooth_late_gain
            .set_target(db_to_linear(params.late_level_db));
        self.smooth_width.set_target(params.stereo_width * 0.01);
        self.smooth_pre_delay
            .set_target(ms_to_samples(params.pre_delay_ms, self.sample_rate as f32));
    }

    /// Store a parameter snapshot (clamped to legal ranges).
    ///
    /// Takes effect at the next `process_block`; scalar changes reach the
    /// audio through ~10 ms smoothers.
    pub fn set_parameter_snapshot(&mut self, snapshot: ReverbParams) {
        self.params = snapshot.clamped();
    }

    /// Current (clamped) parameter snapshot.
    pub fn parameter_snapshot(&self) -> ReverbParams {
        self.params
    }

    /// Resampler latency in base-rate samples (for host compensation).
    pub fn latency_samples(&self) -> usize {
        self.oversampler.latency_samples()
    }

    /// Process one stereo block in place. Slices must be equal length,
    /// at most the prepared maximum block size.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        debug_assert!(left.len() <= self.max_block);
        let n = left.len().min(right.len()).min(self.max_block);
        if n == 0 {
            return;
        }

        // Oversampling change: suspend → re-prepare → resume at the boundary
        if self.params.oversampling != self.prepared_factor {
            self.prepare_oversampling(self.params.oversampling);
        }

        // Per-block targets into the per-sample smoothers
        self.push_smoother_targets();
        let params = self.params;
        self.fdn.set_parameters(&params);
        for seq in &mut self.tail {
            seq.set_parameters(params.decay_shape * 0.01, params.low_rt60_s);
        }

        // Dry copy, then pre-delay in place into the FDN input buffers
        self.dry[0][..n].copy_from_slice(left);
        self.dry[1][..n].copy_from_slice(right);

        for i in 0..n {
            let pd = self.smooth_pre_delay.advance();
            self.pre_delay[0].set_delay(pd);
            self.pre_delay[1].set_delay(pd);
            self.pre_delay[0].write(left[i]);
            self.pre_delay[1].write(right[i]);
            self.fdn_buf[0][i] = self.pre_delay[0].read();
            self.fdn_buf[1][i] = self.pre_delay[1].read();
        }

        // L1: velvet-noise early reflections at the base rate
        if params.bypass_early {
            self.early_buf[0][..n].fill(0.0);
            self.early_buf[1][..n].fill(0.0);
        } else {
            let (el, er) = self.early_buf.split_at_mut(1);
            self.early[0].process(&self.fdn_buf[0][..n], &mut el[0][..n], 1.0);
            self.early[1].process(&self.fdn_buf[1][..n], &mut er[0][..n], 1.0);
        }

        // L2: the oversampled feedback network, in place over fdn_buf
        if params.bypass_fdn {
            self.fdn_buf[0][..n].fill(0.0);
            self.fdn_buf[1][..n].fill(0.0);
        } else {
            let ratio = self.oversampler.ratio();
            let os_n = n * ratio;
            {
                let (os_l, os_r) = self.os_buf.split_at_mut(1);
                self.oversampler
                    .upsample(0, &self.fdn_buf[0][..n], &mut os_l[0][..os_n]);
                self.oversampler
                    .upsample(1, &self.fdn_buf[1][..n], &mut os_r[0][..os_n]);
                for i in 0..os_n {
                    let (l, r) = self.fdn.process_sample(os_l[0][i], os_r[0][i]);
                    os_l[0][i] = l;
                    os_r[0][i] = r;
                }
            }
            self.oversampler
                .downsample(0, &self.os_buf[0][..os_n], &mut self.fdn_buf[0][..n]);
            self.oversampler
                .downsample(1, &self.os_buf[1][..os_n], &mut self.fdn_buf[1][..n]);
        }

        // L3: dark velvet tail, fed from the post-FDN signal at the base rate
        if params.bypass_dvn {
            self.tail_buf[0][..n].fill(0.0);
            self.tail_buf[1][..n].fill(0.0);
        } else {
            let (tail_l, tail_r) = self.tail_buf.split_at_mut(1);
            self.tail[0].process(&self.fdn_buf[0][..n], &mut tail_l[0][..n], 1.0);
            self.tail[1].process(&self.fdn_buf[1][..n], &mut tail_r[0][..n], 1.0);
        }

        // Final mix with per-sample smoothed gains
        for i in 0..n {
            let wet = self.smooth_wet.advance();
            let early_gain = self.smooth_early_gain.advance();
            let late_gain = self.smooth_late_gain.advance();
            let width = self.smooth_width.advance();
            self.mixer.set_gains(wet, early_gain, late_gain, width);

            let (l, r) = self.mixer.process(
                self.dry[0][i],
                self.dry[1][i],
                self.early_buf[0][i],
                self.early_buf[1][i],
                self.fdn_buf[0][i],
                self.fdn_buf[1][i],
                self.tail_buf[0][i],
                self.tail_buf[1][i],
            );
            left[i] = l;
            right[i] = r;
        }
    }

    /// Re-prepare the resampler and the network for a new factor.
    /// Owned by the audio thread; the block boundary is the sync point.
    fn prepare_oversampling(&mut self, factor: OversamplingFactor) {
        self.oversampler
            .prepare(2, factor, self.sample_rate, self.max_block);
        let os_rate = self.oversampler.oversampled_rate(self.sample_rate);
        self.fdn.prepare(os_rate);
        self.fdn.set_parameters(&self.params);
        self.prepared_factor = factor;
    }
}
