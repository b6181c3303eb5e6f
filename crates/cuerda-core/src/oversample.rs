//! Block oversampling for anti-aliased nonlinear processing.
//!
//! The reverberator's feedback network optionally runs nonlinear saturation
//! inside its loop; harmonics generated there would alias back into the
//! audible band at the base rate. The engine therefore upsamples the FDN
//! input, runs the network at 2× or 4× the host rate, and downsamples the
//! result.
//!
//! The engine depends only on the [`Oversampler`] trait: any band-limited
//! resampler with an integer rate ratio of 2^factor and a constant per-block
//! latency satisfies it. [`HalfBandOversampler`] is the built-in
//! implementation — linear-interpolation upsampling followed by a 16-tap
//! Kaiser windowed-sinc FIR at the decimation points. The linear
//! interpolator's sin(x)/x rolloff sits inside the decimation filter's
//! stopband, so it costs nothing audible.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

/// Number of anti-aliasing FIR taps.
const FILTER_TAPS: usize = 16;

/// Host-selectable oversampling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversamplingFactor {
    /// 1× — the network runs at the host rate; the resampler passes through.
    Off,
    /// 2× oversampling.
    #[default]
    Two,
    /// 4× oversampling.
    Four,
}

impl OversamplingFactor {
    /// Integer rate ratio: 1, 2, or 4.
    #[inline]
    pub const fn ratio(self) -> usize {
        match self {
            OversamplingFactor::Off => 1,
            OversamplingFactor::Two => 2,
            OversamplingFactor::Four => 4,
        }
    }

    /// Map a host choice index (0, 1, 2) to a factor. Out-of-range clamps to 4×.
    #[inline]
    pub const fn from_index(index: u32) -> Self {
        match index {
            0 => OversamplingFactor::Off,
            1 => OversamplingFactor::Two,
            _ => OversamplingFactor::Four,
        }
    }

    /// Choice index for persistence (0, 1, 2).
    #[inline]
    pub const fn index(self) -> u32 {
        match self {
            OversamplingFactor::Off => 0,
            OversamplingFactor::Two => 1,
            OversamplingFactor::Four => 2,
        }
    }
}

/// Up/downsampling seam between the engine and the resampler implementation.
///
/// Contract: `upsample` writes `input.len() · ratio()` samples, `downsample`
/// writes `input.len() / ratio()` samples, per channel, with state kept
/// across blocks. `latency_samples` is constant between `prepare` calls and
/// expressed at the base rate.
pub trait Oversampler {
    /// Size internal state for `channels` channels at the given factor.
    /// Idempotent; clears resampler state.
    fn prepare(
        &mut self,
        channels: usize,
        factor: OversamplingFactor,
        sample_rate: f64,
        max_block: usize,
    );

    /// Upsample one channel's block into `output` (`input.len() · ratio()`).
    fn upsample(&mut self, channel: usize, input: &[f32], output: &mut [f32]);

    /// Downsample one channel's block into `output` (`input.len() / ratio()`).
    fn downsample(&mut self, channel: usize, input: &[f32], output: &mut [f32]);

    /// Clear resampler state without changing the configuration.
    fn reset(&mut self);

    /// Round-trip latency in base-rate samples. Zero only when the factor is Off.
    fn latency_samples(&self) -> usize;

    /// Configured factor.
    fn factor(&self) -> OversamplingFactor;

    /// Integer rate ratio (1, 2, or 4).
    #[inline]
    fn ratio(&self) -> usize {
        self.factor().ratio()
    }

    /// The rate the oversampled region runs at.
    #[inline]
    fn oversampled_rate(&self, base_rate: f64) -> f64 {
        base_rate * self.ratio() as f64
    }
}

/// Per-channel resampler state.
#[derive(Debug, Clone)]
struct ChannelState {
    /// Previous base-rate input sample for the linear interpolator.
    prev_sample: f32,
    /// Decimation FIR delay line.
    fir_state: [f32; FILTER_TAPS],
}

impl ChannelState {
    fn new() -> Self {
        Self {
            prev_sample: 0.0,
            fir_state: [0.0; FILTER_TAPS],
        }
    }

    fn clear(&mut self) {
        self.prev_sample = 0.0;
        self.fir_state = [0.0; FILTER_TAPS];
    }
}

/// Built-in resampler: linear-interpolation upsampling, windowed-sinc FIR
/// decimation.
///
/// The FIR computes its convolution only at the decimation points, which is
/// equivalent to filtering the full oversampled stream and keeping every
/// ratio-th sample.
#[derive(Debug, Clone)]
pub struct HalfBandOversampler {
    channels: Vec<ChannelState>,
    factor: OversamplingFactor,
}

impl HalfBandOversampler {
    /// Create an unconfigured resampler; call [`Oversampler::prepare`] before use.
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            factor: OversamplingFactor::Off,
        }
    }

    #[inline]
    fn coefficients(&self) -> &'static [f32; FILTER_TAPS] {
        match self.factor {
            OversamplingFactor::Two => &COEFFS_2X,
            _ => &COEFFS_4X,
        }
    }
}

impl Default for HalfBandOversampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Oversampler for HalfBandOversampler {
    fn prepare(
        &mut self,
        channels: usize,
        factor: OversamplingFactor,
        _sample_rate: f64,
        _max_block: usize,
    ) {
        self.factor = factor;
        self.channels.clear();
        self.channels.resize_with(channels, ChannelState::new);
    }

    fn upsample(&mut self, channel: usize, input: &[f32], output: &mut [f32]) {
        let ratio = self.factor.ratio();
        debug_assert_eq!(output.len(), input.len() * ratio);

        if ratio == 1 {
            output.copy_from_slice(input);
            return;
        }

        let state = &mut self.channels[channel];
        let step = 1.0 / ratio as f32;
        for (n, &x) in input.iter().enumerate() {
            for k in 0..ratio {
                let t = (k as f32 + 1.0) * step;
                output[n * ratio + k] = state.prev_sample + t * (x - state.prev_sample);
            }
            state.prev_sample = x;
        }
    }

    fn downsample(&mut self, channel: usize, input: &[f32], output: &mut [f32]) {
        let ratio = self.factor.ratio();
        debug_assert_eq!(output.len() * ratio, input.len());

        if ratio == 1 {
            output.copy_from_slice(input);
            return;
        }

        let coeffs = self.coefficients();
        let state = &mut self.channels[channel];

        for (m, out) in output.iter_mut().enumerate() {
            // Push `ratio` oversampled samples; convolve at the last one.
            for k in 0..ratio {
                for j in (1..FILTER_TAPS).rev() {
                    state.fir_state[j] = state.fir_state[j - 1];
                }
                state.fir_state[0] = input[m * ratio + k];
            }
            let mut acc = 0.0;
            for (j, &c) in coeffs.iter().enumerate() {
                acc += state.fir_state[j] * c;
            }
            *out = acc;
        }
    }

    fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.clear();
        }
    }

    fn latency_samples(&self) -> usize {
        match self.factor {
            OversamplingFactor::Off => 0,
            // Symmetric FIR group delay, referred to the base rate.
            _ => FILTER_TAPS / 2 / self.factor.ratio(),
        }
    }

    fn factor(&self) -> OversamplingFactor {
        self.factor
    }
}

// Anti-aliasing FIR coefficients: windowed sinc, Kaiser window with beta
// chosen for ~60 dB stopband attenuation. Symmetric (linear phase), so the
// group delay is constant. Cutoffs leave a transition-band margin below the
// base-rate Nyquist:
//   2×: 0.4 × oversampled Nyquist
//   4×: 0.2 × oversampled Nyquist
// Coefficient sums are normalised to ~1.0 for unity passband gain.

/// 2× decimation filter (half-band: alternating zeros off the centre tap).
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
static COEFFS_2X: [f32; FILTER_TAPS] = [
    -0.00152541,  0.00000000,  0.01309369,  0.00000000,
    -0.05738920,  0.00000000,  0.29581875,  0.50000434,
     0.29581875,  0.00000000, -0.05738920,  0.00000000,
     0.01309369,  0.00000000, -0.00152541,  0.00000000,
];

/// 4× decimation filter.
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
static COEFFS_4X: [f32; FILTER_TAPS] = [
    0.0018645282, 0.0068257641, 0.0172712655, 0.0342604001,
    0.0571166576, 0.0830896230, 0.1078345458, 0.1260221675,
    0.1332946246, 0.1260221675, 0.1078345458, 0.0830896230,
    0.0571166576, 0.0342604001, 0.0172712655, 0.0068257641,
];
