//! Mathematical utilities shared by the reverberator's DSP stages.
//!
//! Everything here is allocation-free and `no_std`-friendly. Transcendental
//! functions come from `libm` so the same code runs with or without `std`.
//!
//! # Level conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] — dB ↔ linear gain
//!
//! # Clipping and clamping
//!
//! | Function | Shape | Placement |
//! |----------|-------|-----------|
//! | [`soft_clip_cubic`] | `x − x³/6.75` on \|x\| ≤ 1.5, ±1 beyond | final output mix |
//! | [`safety_clamp`] | `2·tanh(x/2)` for \|x\| > 2, identity below | FDN channel state |
//!
//! # Denormal handling
//!
//! Subnormal floats trigger microcode penalties of up to two orders of
//! magnitude on common architectures. Feedback structures that decay toward
//! zero must scrub them:
//!
//! - [`flush_denormal`] — threshold test, for per-sample feedback state
//! - [`kill_denormal`] — exact IEEE-754 exponent-field test, for the output bus

use libm::{expf, logf, tanhf};

/// Convert decibels to linear gain (0 dB → 1.0, −6 dB → ~0.5).
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB · ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Inputs ≤ 0 are floored at −200 dB.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Cubic soft clip used at the final mix stage.
///
/// `y = x − x³/6.75` for |x| ≤ 1.5, saturating to ±1 beyond. The cubic term
/// is tuned so the curve reaches exactly ±1 at x = ±1.5 with zero slope,
/// making the transition into the flat region continuous.
#[inline]
pub fn soft_clip_cubic(x: f32) -> f32 {
    if x > 1.5 {
        1.0
    } else if x < -1.5 {
        -1.0
    } else {
        x - (x * x * x) / 6.75
    }
}

/// Safety clamp for feedback-loop state.
///
/// Identity for |x| ≤ 2; `2·tanh(x/2)` beyond. Bounds runaway channel state
/// without audibly hard-clipping the loop under normal operation.
#[inline]
pub fn safety_clamp(x: f32) -> f32 {
    if x.abs() > 2.0 { 2.0 * tanhf(x * 0.5) } else { x }
}

/// Flush near-subnormal values to zero (threshold form).
///
/// Replaces values below 1e-20 with zero, well above where the IEEE 754
/// subnormal range begins. Use inside feedback loops where signal decays
/// indefinitely toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Zero a value whose IEEE-754 exponent field is all zeros (bit-pattern form).
///
/// Catches every subnormal exactly, including signed zeros' neighbours, at
/// the cost of a bit manipulation instead of a compare. Used on the output
/// bus, where the rule is strict: exponent field all zero → 0.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn kill_denormal(x: f32) -> f32 {
    if x.to_bits() & 0x7f80_0000 == 0 { 0.0 } else { x }
}

/// Linear interpolation from `a` (t = 0) to `b` (t = 1).
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert milliseconds to (possibly fractional) samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Convert samples to milliseconds.
#[inline]
pub fn samples_to_ms(samples: f32, sample_rate: f32) -> f32 {
    samples * 1000.0 / sample_rate
}
