//! Cuerda Core — DSP primitives for the cuerda reverberator.
//!
//! This crate holds the reverb-agnostic building blocks:
//!
//! - [`DelayLine`] — circular buffer with Lagrange-3 fractional reads and an
//!   integer fast path
//! - [`SmoothedParam`] / [`LinearSmoothedParam`] — zipper-free parameter
//!   trajectories
//! - [`Lcg`] — the fixed-seed generator behind every deterministic sequence
//! - [`Oversampler`] / [`HalfBandOversampler`] — the resampling seam around
//!   the nonlinear feedback network
//! - [`ParamDescriptor`] / [`ParameterInfo`] — parameter metadata for
//!   clamping and snapshot persistence
//! - [`math`] — level conversions, clippers, denormal scrubbing
//!
//! ## no_std
//!
//! `no_std` compatible with `default-features = false`; heap use is limited
//! to construction-time buffer allocation.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod delay;
pub mod math;
pub mod oversample;
pub mod param;
pub mod param_info;
pub mod rng;

pub use delay::DelayLine;
pub use math::{
    db_to_linear, flush_denormal, kill_denormal, lerp, linear_to_db, ms_to_samples,
    safety_clamp, samples_to_ms, soft_clip_cubic,
};
pub use oversample::{HalfBandOversampler, Oversampler, OversamplingFactor};
pub use param::{LinearSmoothedParam, SmoothedParam};
pub use param_info::{ParamDescriptor, ParamScale, ParamUnit, ParameterInfo};
pub use rng::Lcg;
