//! Cuerda Reverb — a hybrid stereo reverberator for sustained strings.
//!
//! Three layers share one pre-delay and one output mixer:
//!
//! - **L1** [`VelvetSequence`] — sparse-FIR velvet-noise early reflections
//!   that keep bow transients intact
//! - **L2** [`Fdn`] — an 8-channel feedback delay network with an input
//!   diffuser, per-line attenuation shelves, optional in-loop saturation,
//!   and LFO delay modulation, run at a host-selected oversampled rate
//! - **L3** [`DvnSequence`] — a dark velvet-noise tail with a
//!   double-exponential decay envelope, fed from the network output
//!
//! [`Engine`] is the per-block driver and the only type a host wrapper
//! needs: `prepare` / `reset` / `set_parameter_snapshot` / `process_block`.
//! It is allocation-free and deterministic on the audio thread; every
//! pseudo-random sequence inside derives from fixed seeds, so two runs
//! produce bit-identical output.
//!
//! ```rust
//! use cuerda_reverb::{Engine, ReverbParams};
//!
//! let mut engine = Engine::new();
//! engine.prepare(48000.0, 512);
//!
//! let mut params = ReverbParams::default();
//! params.dry_wet = 40.0;
//! engine.set_parameter_snapshot(params);
//!
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! left[0] = 1.0;
//! right[0] = 1.0;
//! engine.process_block(&mut left, &mut right);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod dark_velvet;
pub mod diffuser;
pub mod engine;
pub mod fdn;
pub mod matrix;
pub mod mixer;
pub mod params;
pub mod saturation;
pub mod shelf;
pub mod tone;
pub mod velvet;

pub use dark_velvet::DvnSequence;
pub use diffuser::Diffuser;
pub use engine::Engine;
pub use fdn::{Fdn, BASE_DELAYS, NUM_CHANNELS};
pub use matrix::{FeedbackMatrix, MatrixKind};
pub use mixer::Mixer;
pub use params::{AtomicParams, ReverbParams, SatType, PARAM_COUNT, PARAM_DESCRIPTORS};
pub use saturation::Saturator;
pub use shelf::ShelfFilter;
pub use tone::ToneFilter;
pub use velvet::VelvetSequence;

// Re-export the host-facing seams so wrappers only need this crate.
pub use cuerda_core::{
    HalfBandOversampler, Oversampler, OversamplingFactor, ParamDescriptor, ParameterInfo,
};
