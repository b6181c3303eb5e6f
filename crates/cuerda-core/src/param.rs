//! Parameter smoothing for zipper-free automation.
//!
//! Parameter targets arrive once per block from the host; the audio thread
//! advances a smoother per sample so every change is a continuous trajectory.
//! Two flavours:
//!
//! - [`SmoothedParam`]: exponential (one-pole) approach. Used for filter
//!   coefficients and delay-length targets (~5 ms time constant).
//! - [`LinearSmoothedParam`]: constant-slope ramp that lands exactly on the
//!   target. Used for gains and pre-delay (~10 ms transition).

use libm::expf;

/// Exponentially smoothed parameter (one-pole lowpass toward the target).
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    /// One-pole coefficient: 0 = frozen, 1 = instant.
    coeff: f32,
    sample_rate: f32,
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create with an initial value, sample rate, and time constant.
    ///
    /// A `smoothing_time_ms` of 0 disables smoothing (instant changes).
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate,
            smoothing_time_ms,
        };
        param.recalculate_coeff();
        param
    }

    /// Set the value the smoother approaches.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set target and current simultaneously (no transition).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Jump the current value to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// Update the sample rate, preserving the configured time constant.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// The one-pole coefficient follows from the time constant tau:
    /// `coeff = 1 − exp(−1 / (tau · SR))`, so the smoother covers 63.2% of
    /// any step per tau and is settled for audio purposes after ~5·tau.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples_per_tau = self.smoothing_time_ms * 0.001 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples_per_tau);
        }
    }
}

/// Linearly smoothed parameter: fixed increment per sample, exact landing.
#[derive(Debug, Clone)]
pub struct LinearSmoothedParam {
    current: f32,
    target: f32,
    increment: f32,
    samples_remaining: u32,
    sample_rate: f32,
    transition_time_ms: f32,
}

impl LinearSmoothedParam {
    /// Create with an initial value, sample rate, and transition time.
    pub fn with_config(initial: f32, sample_rate: f32, transition_time_ms: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            sample_rate,
            transition_time_ms,
        }
    }

    /// Start a ramp toward `target` over the configured transition time.
    pub fn set_target(&mut self, target: f32) {
        if (target - self.target).abs() < 1e-9 {
            return;
        }
        self.target = target;
        let samples = (self.transition_time_ms * 0.001 * self.sample_rate) as u32;
        if samples == 0 {
            self.current = target;
            self.increment = 0.0;
            self.samples_remaining = 0;
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Set target and current simultaneously (no ramp).
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Advance one sample and return the current value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Jump to the target, cancelling any ramp in flight.
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Update the sample rate. Affects ramps started after this call.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }
}
