//! Parameter snapshot and the cross-thread parameter store.
//!
//! The engine consumes a [`ReverbParams`] value once per block. The struct is
//! plain `Copy` data in display units (percent, dB, ms, s, Hz); clamping to
//! legal ranges happens in [`ReverbParams::clamped`] before the audio thread
//! ever computes with a value, so the DSP treats every field as valid.
//!
//! [`AtomicParams`] is the lock-free bridge for hosts that automate from
//! another thread: one `AtomicU32` per parameter holding f32 bit patterns,
//! written with relaxed stores and snapshotted with relaxed loads at the
//! block boundary. No parameter read is required to be consistent with any
//! other — per-sample smoothers downstream absorb the skew.

use core::sync::atomic::{AtomicU32, Ordering};

use cuerda_core::{OversamplingFactor, ParamDescriptor, ParamScale, ParamUnit, ParameterInfo};

/// In-loop saturation curve selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SatType {
    /// Cubic polynomial soft clip on the clamped input.
    Soft = 0,
    /// Plain `tanh` — the default recommendation.
    #[default]
    Warm = 1,
    /// `tanh` positive half, `1.25·tanh(0.8x)` negative half.
    Tape = 2,
    /// `tanh(1.2x)` positive half, `tanh(0.8x)` negative half — even harmonics.
    Tube = 3,
}

impl SatType {
    /// Map a choice index (0–3) to a type; out-of-range clamps to Tube.
    #[inline]
    pub const fn from_index(index: u32) -> Self {
        match index {
            0 => SatType::Soft,
            1 => SatType::Warm,
            2 => SatType::Tape,
            _ => SatType::Tube,
        }
    }

    /// Choice index for persistence.
    #[inline]
    pub const fn index(self) -> u32 {
        self as u32
    }
}

/// Full parameter vector, in display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    /// Dry/wet mix, 0–100 %.
    pub dry_wet: f32,
    /// Pre-delay, 0–100 ms.
    pub pre_delay_ms: f32,
    /// Early-reflection level, −24…+6 dB.
    pub early_level_db: f32,
    /// Late (FDN + tail) level, −24…+6 dB.
    pub late_level_db: f32,
    /// Room size scaling on the FDN delay lengths, 0.1–1.0.
    pub room_size: f32,
    /// Mid/Side width of the wet bus, 0–100 %.
    pub stereo_width: f32,
    /// Oversampling factor for the feedback network.
    pub oversampling: OversamplingFactor,
    /// Low-band RT60, 0.2–12 s.
    pub low_rt60_s: f32,
    /// High-band RT60, 0.1–8 s.
    pub high_rt60_s: f32,
    /// Crossover position for the two RT60 bands, 0–100 %.
    pub hf_damping: f32,
    /// Feedback-matrix blend, 0–100 %.
    pub diffusion: f32,
    /// Tail double-slope blend, 0–100 %.
    pub decay_shape: f32,
    /// Saturation wet amount, 0–100 %.
    pub sat_amount: f32,
    /// Saturation drive, 0–24 dB.
    pub sat_drive_db: f32,
    /// Saturation curve.
    pub sat_type: SatType,
    /// Post-saturation tilt, −100…+100 % (dark…bright).
    pub sat_tone: f32,
    /// Saturation asymmetry, 0–100 %.
    pub sat_asymmetry: f32,
    /// Delay modulation depth, 0–100 %.
    pub mod_depth: f32,
    /// Delay modulation rate, 0.1–5 Hz.
    pub mod_rate_hz: f32,
    /// Bypass the early-reflection layer.
    pub bypass_early: bool,
    /// Bypass the feedback delay network.
    pub bypass_fdn: bool,
    /// Bypass the dark velvet-noise tail.
    pub bypass_dvn: bool,
    /// Bypass in-loop saturation.
    pub bypass_saturation: bool,
    /// Bypass the post-saturation tone filter.
    pub bypass_tone_filter: bool,
    /// Bypass the attenuation shelves.
    pub bypass_atten_filter: bool,
    /// Bypass delay-length modulation.
    pub bypass_modulation: bool,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            dry_wet: 30.0,
            pre_delay_ms: 12.0,
            early_level_db: -3.0,
            late_level_db: -6.0,
            room_size: 0.6,
            stereo_width: 70.0,
            oversampling: OversamplingFactor::Two,
            low_rt60_s: 2.5,
            high_rt60_s: 1.4,
            hf_damping: 65.0,
            diffusion: 80.0,
            decay_shape: 40.0,
            sat_amount: 0.0,
            sat_drive_db: 6.0,
            sat_type: SatType::Warm,
            sat_tone: 0.0,
            sat_asymmetry: 0.0,
            mod_depth: 15.0,
            mod_rate_hz: 0.5,
            bypass_early: false,
            bypass_fdn: false,
            bypass_dvn: false,
            bypass_saturation: false,
            bypass_tone_filter: false,
            bypass_atten_filter: false,
            bypass_modulation: false,
        }
    }
}

/// Number of host-visible parameters.
pub const PARAM_COUNT: usize = 26;

/// Descriptors in index order. Stable: hosts persist by index.
pub static PARAM_DESCRIPTORS: [ParamDescriptor; PARAM_COUNT] = [
    ParamDescriptor::percent("Dry/Wet Mix", "Mix", 30.0),
    ParamDescriptor::new("Pre-Delay", "PreDly", ParamUnit::Milliseconds, 0.0, 100.0, 12.0, 0.1),
    ParamDescriptor::gain_db("Early Level", "Early", -24.0, 6.0, -3.0),
    ParamDescriptor::gain_db("Late Level", "Late", -24.0, 6.0, -6.0),
    ParamDescriptor::new("Room Size", "Room", ParamUnit::None, 0.1, 1.0, 0.6, 0.01),
    ParamDescriptor::percent("Stereo Width", "Width", 70.0),
    ParamDescriptor::stepped("Oversampling", "OvrSmp", 2.0, 1.0),
    ParamDescriptor::new("Low RT60", "LowRT", ParamUnit::Seconds, 0.2, 12.0, 2.5, 0.01)
        .with_scale(ParamScale::Logarithmic),
    ParamDescriptor::new("High RT60", "HighRT", ParamUnit::Seconds, 0.1, 8.0, 1.4, 0.01)
        .with_scale(ParamScale::Logarithmic),
    ParamDescriptor::percent("HF Damping", "HFDamp", 65.0),
    ParamDescriptor::percent("Diffusion", "Diff", 80.0),
    ParamDescriptor::percent("Decay Shape", "Shape", 40.0),
    ParamDescriptor::percent("Saturation Amount", "SatAmt", 0.0),
    ParamDescriptor::new("Saturation Drive", "SatDrv", ParamUnit::Decibels, 0.0, 24.0, 6.0, 0.1),
    ParamDescriptor::stepped("Saturation Type", "SatTyp", 3.0, 1.0),
    ParamDescriptor::new("Saturation Tone", "SatTon", ParamUnit::Percent, -100.0, 100.0, 0.0, 0.1),
    ParamDescriptor::percent("Saturation Asymmetry", "SatAsy", 0.0),
    ParamDescriptor::percent("Mod Depth", "ModDep", 15.0),
    ParamDescriptor::new("Mod Rate", "ModRate", ParamUnit::Hertz, 0.1, 5.0, 0.5, 0.01)
        .with_scale(ParamScale::Logarithmic),
    ParamDescriptor::stepped("Bypass Early", "BypEar", 1.0, 0.0),
    ParamDescriptor::stepped("Bypass FDN", "BypFdn", 1.0, 0.0),
    ParamDescriptor::stepped("Bypass DVN", "BypDvn", 1.0, 0.0),
    ParamDescriptor::stepped("Bypass Saturation", "BypSat", 1.0, 0.0),
    ParamDescriptor::stepped("Bypass Tone Filter", "BypTon", 1.0, 0.0),
    ParamDescriptor::stepped("Bypass Atten Filter", "BypAtt", 1.0, 0.0),
    ParamDescriptor::stepped("Bypass Modulation", "BypMod", 1.0, 0.0),
];

impl ReverbParams {
    /// A copy with every scalar clamped to its descriptor range.
    pub fn clamped(&self) -> Self {
        let d = &PARAM_DESCRIPTORS;
        Self {
            dry_wet: d[0].clamp(self.dry_wet),
            pre_delay_ms: d[1].clamp(self.pre_delay_ms),
            early_level_db: d[2].clamp(self.early_level_db),
            late_level_db: d[3].clamp(self.late_level_db),
            room_size: d[4].clamp(self.room_size),
            stereo_width: d[5].clamp(self.stereo_width),
            oversampling: self.oversampling,
            low_rt60_s: d[7].clamp(self.low_rt60_s),
            high_rt60_s: d[8].clamp(self.high_rt60_s),
            hf_damping: d[9].clamp(self.hf_damping),
            diffusion: d[10].clamp(self.diffusion),
            decay_shape: d[11].clamp(self.decay_shape),
            sat_amount: d[12].clamp(self.sat_amount),
            sat_drive_db: d[13].clamp(self.sat_drive_db),
            sat_type: self.sat_type,
            sat_tone: d[15].clamp(self.sat_tone),
            sat_asymmetry: d[16].clamp(self.sat_asymmetry),
            mod_depth: d[17].clamp(self.mod_depth),
            mod_rate_hz: d[18].clamp(self.mod_rate_hz),
            ..*self
        }
    }
}

impl ParameterInfo for ReverbParams {
    fn param_count(&self) -> usize {
        PARAM_COUNT
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAM_DESCRIPTORS.get(index).copied()
    }

    fn get_param(&self, index: usize) -> f32 {
        match index {
            0 => self.dry_wet,
            1 => self.pre_delay_ms,
            2 => self.early_level_db,
            3 => self.late_level_db,
            4 => self.room_size,
            5 => self.stereo_width,
            6 => self.oversampling.index() as f32,
            7 => self.low_rt60_s,
            8 => self.high_rt60_s,
            9 => self.hf_damping,
            10 => self.diffusion,
            11 => self.decay_shape,
            12 => self.sat_amount,
            13 => self.sat_drive_db,
            14 => self.sat_type.index() as f32,
            15 => self.sat_tone,
            16 => self.sat_asymmetry,
            17 => self.mod_depth,
            18 => self.mod_rate_hz,
            19 => self.bypass_early as u32 as f32,
            20 => self.bypass_fdn as u32 as f32,
            21 => self.bypass_dvn as u32 as f32,
            22 => self.bypass_saturation as u32 as f32,
            23 => self.bypass_tone_filter as u32 as f32,
            24 => self.bypass_atten_filter as u32 as f32,
            25 => self.bypass_modulation as u32 as f32,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        let Some(desc) = PARAM_DESCRIPTORS.get(index) else {
            return;
        };
        let v = desc.clamp(value);
        match index {
            0 => self.dry_wet = v,
            1 => self.pre_delay_ms = v,
            2 => self.early_level_db = v,
            3 => self.late_level_db = v,
            4 => self.room_size = v,
            5 => self.stereo_width = v,
            6 => self.oversampling = OversamplingFactor::from_index(v as u32),
            7 => self.low_rt60_s = v,
            8 => self.high_rt60_s = v,
            9 => self.hf_damping = v,
            10 => self.diffusion = v,
            11 => self.decay_shape = v,
            12 => self.sat_amount = v,
            13 => self.sat_drive_db = v,
            14 => self.sat_type = SatType::from_index(v as u32),
            15 => self.sat_tone = v,
            16 => self.sat_asymmetry = v,
            17 => self.mod_depth = v,
            18 => self.mod_rate_hz = v,
            19 => self.bypass_early = v >= 0.5,
            20 => self.bypass_fdn = v >= 0.5,
            21 => self.bypass_dvn = v >= 0.5,
            22 => self.bypass_saturation = v >= 0.5,
            23 => self.bypass_tone_filter = v >= 0.5,
            24 => self.bypass_atten_filter = v >= 0.5,
            25 => self.bypass_modulation = v >= 0.5,
            _ => {}
        }
    }
}

/// Lock-free cross-thread parameter store.
///
/// Writers (GUI, automation) call [`set`](Self::set) at any time; the audio
/// thread calls [`snapshot`](Self::snapshot) once per block. All accesses are
/// relaxed — torn vectors are acceptable by design because every value is
/// individually valid and smoothed downstream.
pub struct AtomicParams {
    cells: [AtomicU32; PARAM_COUNT],
}

impl AtomicParams {
    /// Create a store initialised from a parameter snapshot.
    pub fn new(params: ReverbParams) -> Self {
        let cells = core::array::from_fn(|i| AtomicU32::new(params.get_param(i).to_bits()));
        Self { cells }
    }

    /// Store one parameter value (clamped to its descriptor range).
    pub fn set(&self, index: usize, value: f32) {
        if let Some(desc) = PARAM_DESCRIPTORS.get(index) {
            self.cells[index].store(desc.clamp(value).to_bits(), Ordering::Relaxed);
        }
    }

    /// Read one parameter value.
    pub fn get(&self, index: usize) -> f32 {
        self.cells
            .get(index)
            .map(|c| f32::from_bits(c.load(Ordering::Relaxed)))
            .unwrap_or(0.0)
    }

    /// Assemble a full snapshot for the audio thread.
    pub fn snapshot(&self) -> ReverbParams {
        let mut params = ReverbParams::default();
        for i in 0..PARAM_COUNT {
            params.set_param(i, f32::from_bits(self.cells[i].load(Ordering::Relaxed)));
        }
        params
    }
}

impl Default for AtomicParams {
    fn default() -> Self {
        Self::new(ReverbParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_descriptors() {
        let params = ReverbParams::default();
        for (i, desc) in PARAM_DESCRIPTORS.iter().enumerate() {
            assert!(
                (params.get_param(i) - desc.default).abs() < 1e-6,
                "param {i} ({}) default mismatch: {} vs {}",
                desc.name,
                params.get_param(i),
                desc.default
            );
        }
    }

    #[test]
    fn set_param_clamps() {
        let mut params = ReverbParams::default();
        params.set_param(0, 250.0);
        assert_eq!(params.dry_wet, 100.0);
        params.set_param(7, 0.0);
        assert_eq!(params.low_rt60_s, 0.2);
        params.set_param(13, -5.0);
        assert_eq!(params.sat_drive_db, 0.0);
    }

    #[test]
    fn clamped_restores_legal_ranges() {
        let mut params = ReverbParams::default();
        params.room_size = 5.0;
        params.sat_tone = -500.0;
        let c = params.clamped();
        assert_eq!(c.room_size, 1.0);
        assert_eq!(c.sat_tone, -100.0);
    }

    #[test]
    fn enum_fields_roundtrip_by_index() {
        let mut params = ReverbParams::default();
        params.set_param(14, 3.0);
        assert_eq!(params.sat_type, SatType::Tube);
        assert_eq!(params.get_param(14), 3.0);
        params.set_param(6, 2.0);
        assert_eq!(params.oversampling, OversamplingFactor::Four);
    }

    #[test]
    fn bool_fields_threshold_at_half() {
        let mut params = ReverbParams::default();
        params.set_param(20, 0.6);
        assert!(params.bypass_fdn);
        params.set_param(20, 0.4);
        assert!(!params.bypass_fdn);
    }

    #[test]
    fn snapshot_roundtrip_within_half_lsb() {
        // Quantise every scalar to its step grid, push it through the
        // normalised persistence path, and require recovery within step/2.
        let mut params = ReverbParams::default();
        let probe = [
            (0, 42.7),
            (1, 33.3),
            (2, -11.4),
            (4, 0.73),
            (7, 7.77),
            (13, 18.2),
            (15, -64.2),
            (18, 2.22),
        ];
        for &(i, v) in &probe {
            params.set_param(i, v);
        }
        let mut restored = ReverbParams::default();
        for i in 0..PARAM_COUNT {
            let desc = PARAM_DESCRIPTORS[i];
            let quantised = desc.quantize(params.get_param(i));
            let norm = desc.normalize(quantised);
            restored.set_param(i, desc.denormalize(norm));
        }
        for i in 0..PARAM_COUNT {
            let desc = PARAM_DESCRIPTORS[i];
            let a = desc.quantize(params.get_param(i));
            let b = restored.get_param(i);
            assert!(
                (a - b).abs() <= desc.step * 0.5 + 1e-4,
                "param {i} ({}) drifted: {a} vs {b}",
                desc.name
            );
        }
    }

    #[test]
    fn atomic_store_roundtrip() {
        let store = AtomicParams::default();
        store.set(0, 55.0);
        store.set(14, 2.0);
        store.set(21, 1.0);
        let snap = store.snapshot();
        assert_eq!(snap.dry_wet, 55.0);
        assert_eq!(snap.sat_type, SatType::Tape);
        assert!(snap.bypass_dvn);
        // Untouched parameters keep their defaults
        assert_eq!(snap.room_size, 0.6);
    }

    #[test]
    fn atomic_set_clamps() {
        let store = AtomicParams::default();
        store.set(4, 99.0);
        assert_eq!(store.get(4), 1.0);
    }
}
