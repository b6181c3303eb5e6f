//! Parameter metadata for display, clamping, and snapshot persistence.
//!
//! Each parameter is described by a [`ParamDescriptor`]: range, default,
//! display unit, quantisation step, and normalisation curve. The
//! [`ParameterInfo`] trait exposes index-based access so a host wrapper can
//! enumerate, save, and restore the full parameter vector without knowing
//! the concrete type.

/// Normalisation curve between plain values and `[0, 1]` space.
///
/// - **Linear**: `normalized = (value − min) / (max − min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`, requires
///   `min > 0`. Used for rate- and time-like parameters where low values
///   need more resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    #[default]
    Linear,
    Logarithmic,
}

/// Unit tag for formatting a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels — gains and levels.
    Decibels,
    /// Hertz — rates and frequencies.
    Hertz,
    /// Milliseconds — short times (pre-delay).
    Milliseconds,
    /// Seconds — long times (RT60).
    Seconds,
    /// Percent — normalised 0–100 knobs.
    Percent,
    /// Dimensionless or enumerated.
    None,
}

impl ParamUnit {
    /// Display suffix for this unit.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Seconds => " s",
            ParamUnit::Percent => "%",
            ParamUnit::None => "",
        }
    }
}

/// Metadata for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full name for display (e.g. "Low RT60").
    pub name: &'static str,
    /// Short name for narrow displays, ≤ 8 characters.
    pub short_name: &'static str,
    /// Unit for value formatting.
    pub unit: ParamUnit,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
    /// Default value.
    pub default: f32,
    /// Quantisation step for host persistence and encoder control.
    pub step: f32,
    /// Normalisation curve.
    pub scale: ParamScale,
}

impl ParamDescriptor {
    /// Continuous parameter with a custom unit.
    pub const fn new(
        name: &'static str,
        short_name: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
        step: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit,
            min,
            max,
            default,
            step,
            scale: ParamScale::Linear,
        }
    }

    /// Percent knob 0–100.
    pub const fn percent(name: &'static str, short_name: &'static str, default: f32) -> Self {
        Self::new(name, short_name, ParamUnit::Percent, 0.0, 100.0, default, 0.1)
    }

    /// Gain in dB.
    pub const fn gain_db(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self::new(name, short_name, ParamUnit::Decibels, min, max, default, 0.1)
    }

    /// Stepped/enumerated parameter (step = 1).
    pub const fn stepped(
        name: &'static str,
        short_name: &'static str,
        max: f32,
        default: f32,
    ) -> Self {
        Self::new(name, short_name, ParamUnit::None, 0.0, max, default, 1.0)
    }

    /// Switch to logarithmic normalisation (builder style).
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Clamp a value into this parameter's range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Round a value to the descriptor's quantisation step.
    #[inline]
    pub fn quantize(&self, value: f32) -> f32 {
        if self.step <= 0.0 {
            return self.clamp(value);
        }
        let steps = libm::roundf((value - self.min) / self.step);
        self.clamp(self.min + steps * self.step)
    }

    /// Plain value → normalised `[0, 1]`, respecting the scale.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (self.clamp(value) - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(self.clamp(value) / self.min) / libm::logf(self.max / self.min)
            }
        }
    }

    /// Normalised `[0, 1]` → plain value, respecting the scale.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let n = normalized.clamp(0.0, 1.0);
        match self.scale {
            ParamScale::Linear => self.min + n * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, n)
            }
        }
    }
}

/// Index-based parameter access for enumeration and persistence.
///
/// Implementations clamp incoming values to the descriptor range; indices
/// past `param_count()` are ignored on set and return 0.0 on get.
pub trait ParameterInfo {
    /// Number of parameters; valid indices are `0..param_count()`.
    fn param_count(&self) -> usize;

    /// Descriptor for the parameter at `index`, `None` when out of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current plain value at `index`.
    fn get_param(&self, index: usize) -> f32;

    /// Set the plain value at `index` (clamped to the descriptor range).
    fn set_param(&mut self, index: usize, value: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_respects_range() {
        let desc = ParamDescriptor::percent("Mix", "Mix", 30.0);
        assert_eq!(desc.clamp(50.0), 50.0);
        assert_eq!(desc.clamp(-10.0), 0.0);
        assert_eq!(desc.clamp(150.0), 100.0);
    }

    #[test]
    fn quantize_rounds_to_step() {
        let desc = ParamDescriptor::percent("Mix", "Mix", 30.0); // step 0.1
        assert!((desc.quantize(33.333) - 33.3).abs() < 1e-4);
        let stepped = ParamDescriptor::stepped("Type", "Type", 3.0, 1.0);
        assert_eq!(stepped.quantize(1.7), 2.0);
        assert_eq!(stepped.quantize(5.0), 3.0);
    }

    #[test]
    fn linear_normalize_roundtrip() {
        let desc = ParamDescriptor::gain_db("Early", "Early", -24.0, 6.0, -3.0);
        for &v in &[-24.0, -12.5, 0.0, 6.0] {
            let rt = desc.denormalize(desc.normalize(v));
            assert!((rt - v).abs() < 1e-4, "roundtrip failed for {v}: {rt}");
        }
    }

    #[test]
    fn log_normalize_roundtrip() {
        let desc = ParamDescriptor::new(
            "Rate",
            "Rate",
            ParamUnit::Hertz,
            0.1,
            5.0,
            0.5,
            0.01,
        )
        .with_scale(ParamScale::Logarithmic);
        assert!((desc.normalize(0.1)).abs() < 1e-6);
        assert!((desc.normalize(5.0) - 1.0).abs() < 1e-6);
        for &v in &[0.1, 0.5, 1.0, 5.0] {
            let rt = desc.denormalize(desc.normalize(v));
            assert!((rt - v).abs() / v < 1e-4, "roundtrip failed for {v}: {rt}");
        }
    }

    #[test]
    fn zero_range_normalizes_to_zero() {
        let desc = ParamDescriptor::new("Fixed", "Fixed", ParamUnit::None, 3.0, 3.0, 3.0, 0.0);
        assert_eq!(desc.normalize(3.0), 0.0);
    }

    #[test]
    fn unit_suffixes() {
        assert_eq!(ParamUnit::Decibels.suffix(), " dB");
        assert_eq!(ParamUnit::Seconds.suffix(), " s");
        assert_eq!(ParamUnit::None.suffix(), "");
    }
}
