//! Post-saturation tone filter.
//!
//! A single one-pole lowpass and two blend laws give a dark/bright tilt
//! after the in-loop saturator:
//!
//! - tone < 0 (dark): crossfade toward the lowpass,
//!   `(1 − |tone|)·x + |tone|·lp`, cutoff swept 8 kHz → 1 kHz.
//! - tone > 0 (bright): subtract lowpassed content, `x − tone·lp`,
//!   cutoff swept 8 kHz → 4 kHz.
//!
//! Both laws have magnitude ≤ 1 on the whole unit circle, the condition for
//! living inside the FDN feedback loop. The filter deactivates entirely for
//! |tone| ≤ 1 %, keeping the loop bit-transparent at the default setting.

/// One-pole tilt filter, one instance per FDN channel.
#[derive(Debug, Clone)]
pub struct ToneFilter {
    sample_rate: f32,
    /// Tone in −1…+1.
    tone: f32,
    lp_coeff: f32,
    lp_state: f32,
    active: bool,
}

impl ToneFilter {
    /// Create an inactive (flat) tone filter.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            tone: 0.0,
            lp_coeff: 0.1,
            lp_state: 0.0,
            active: false,
        }
    }

    /// Update the sample rate and recompute the cutoff coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        let tone_percent = self.tone * 100.0;
        self.set_tone(tone_percent);
    }

    /// Set the tilt from a −100…+100 % knob value.
    pub fn set_tone(&mut self, tone_percent: f32) {
        self.tone = (tone_percent * 0.01).clamp(-1.0, 1.0);

        if self.tone.abs() < 0.01 {
            self.active = false;
            return;
        }
        self.active = true;

        let freq = if self.tone < 0.0 {
            // Dark: 8 kHz at the centre down to 1 kHz fully dark
            1000.0 + (1.0 + self.tone) * 7000.0
        } else {
            // Bright: 8 kHz at the centre down to 4 kHz fully bright
            8000.0 - self.tone * 4000.0
        };

        let w = core::f32::consts::TAU * freq / self.sample_rate;
        self.lp_coeff = w / (1.0 + w);
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if !self.active {
            return input;
        }

        self.lp_state =
            cuerda_core::flush_denormal(self.lp_state + self.lp_coeff * (input - self.lp_state));

        if self.tone < 0.0 {
            let blend = -self.tone;
            (1.0 - blend) * input + blend * self.lp_state
        } else {
            input - self.tone * self.lp_state
        }
    }

    /// Zero the lowpass state.
    pub fn reset(&mut self) {
        self.lp_state = 0.0;
    }
}
