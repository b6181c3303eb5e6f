//! Output mixer: dry, early, late, and tail busses into the stereo pair.
//!
//! The dark velvet-noise tail joins the FDN output on the late bus so one
//! late-level gain rides both. Mid/Side width is applied to the combined wet
//! bus only — the dry path stays untouched. The final sum passes through a
//! cubic soft clip and a bit-pattern denormal kill.

use cuerda_core::{kill_denormal, soft_clip_cubic};

/// Pure parameter block combining the four sources per sample.
///
/// Gains are linear and set per sample by the engine from its smoothed
/// parameter bank.
#[derive(Debug, Clone, Copy)]
pub struct Mixer {
    dry: f32,
    wet: f32,
    early_gain: f32,
    late_gain: f32,
    width: f32,
}

impl Mixer {
    /// Unity-dry mixer; gains are overwritten every sample by the engine.
    pub fn new() -> Self {
        Self {
            dry: 0.7,
            wet: 0.3,
            early_gain: 0.707,
            late_gain: 0.5,
            width: 0.7,
        }
    }

    /// Set the linear gains for the next sample.
    ///
    /// `wet` is the 0–1 mix fraction (`dry = 1 − wet`), `width` the 0–1
    /// Mid/Side scale.
    #[inline]
    pub fn set_gains(&mut self, wet: f32, early_gain: f32, late_gain: f32, width: f32) {
        self.wet = wet;
        self.dry = 1.0 - wet;
        self.early_gain = early_gain;
        self.late_gain = late_gain;
        self.width = width;
    }

    /// Combine one sample of the four stereo sources.
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn process(
        &self,
        dry_l: f32,
        dry_r: f32,
        early_l: f32,
        early_r: f32,
        late_l: f32,
        late_r: f32,
        dvn_l: f32,
        dvn_r: f32,
    ) -> (f32, f32) {
        // Tail rides the late gain together with the FDN
        let mut wet_l = self.early_gain * early_l + self.late_gain * (late_l + dvn_l);
        let mut wet_r = self.early_gain * early_r + self.late_gain * (late_r + dvn_r);

        // Mid/Side width on the wet bus
        let mid = (wet_l + wet_r) * 0.5;
        let side = (wet_l - wet_r) * 0.5;
        wet_l = mid + side * self.width;
        wet_r = mid - side * self.width;

        let out_l = soft_clip_cubic(self.dry * dry_l + self.wet * wet_l);
        let out_r = soft_clip_cubic(self.dry * dry_r + self.wet * wet_r);

        (kill_denormal(out_l), kill_denormal(out_r))
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}
