//! Property-based tests: for any legal parameter snapshot and any bounded
//! input, the engine stays finite, bounded, and resets clean.

use cuerda_reverb::{Engine, ParameterInfo, ReverbParams, PARAM_COUNT, PARAM_DESCRIPTORS};
use proptest::prelude::*;

/// Build a snapshot from normalised [0, 1] draws via the descriptors.
fn snapshot_from(normalised: &[f32; 32]) -> ReverbParams {
    let mut params = ReverbParams::default();
    for i in 0..PARAM_COUNT {
        let desc = PARAM_DESCRIPTORS[i];
        params.set_param(i, desc.denormalize(normalised[i]));
    }
    params
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Finite output for any snapshot and any input in [−1, 1].
    #[test]
    fn output_is_finite(
        normalised in prop::array::uniform32(0.0f32..=1.0f32),
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut engine = Engine::new();
        engine.prepare(48000.0, 32);
        engine.set_parameter_snapshot(snapshot_from(&normalised));
        engine.reset();

        for _ in 0..16 {
            let mut l = input;
            let mut r = input;
            engine.process_block(&mut l, &mut r);
            for &x in l.iter().chain(r.iter()) {
                prop_assert!(x.is_finite(), "non-finite output {x}");
            }
        }
    }

    /// The output stage's soft clip bounds every sample to ±1.
    #[test]
    fn output_is_bounded(
        normalised in prop::array::uniform32(0.0f32..=1.0f32),
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut engine = Engine::new();
        engine.prepare(44100.0, 32);
        engine.set_parameter_snapshot(snapshot_from(&normalised));
        engine.reset();

        for _ in 0..16 {
            let mut l = input;
            let mut r = input;
            engine.process_block(&mut l, &mut r);
            for &x in l.iter().chain(r.iter()) {
                prop_assert!(x.abs() <= 1.0 + 1e-6, "output {x} beyond the clip");
            }
        }
    }

    /// After reset, silence in produces silence out for any snapshot.
    #[test]
    fn reset_gives_exact_silence(
        normalised in prop::array::uniform32(0.0f32..=1.0f32),
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut engine = Engine::new();
        engine.prepare(48000.0, 32);
        engine.set_parameter_snapshot(snapshot_from(&normalised));
        engine.reset();

        // Accumulate internal state, then wipe it
        for _ in 0..8 {
            let mut l = input;
            let mut r = input;
            engine.process_block(&mut l, &mut r);
        }
        engine.reset();

        for _ in 0..4 {
            let mut l = [0.0f32; 32];
            let mut r = [0.0f32; 32];
            engine.process_block(&mut l, &mut r);
            for &x in l.iter().chain(r.iter()) {
                prop_assert!(x.abs() <= 1e-6, "residue {x} after reset");
            }
        }
    }

    /// Snapshot round-trip through the normalised persistence path recovers
    /// every scalar within half a quantisation step.
    #[test]
    fn snapshot_roundtrip(normalised in prop::array::uniform32(0.0f32..=1.0f32)) {
        let params = snapshot_from(&normalised);
        let mut restored = ReverbParams::default();
        for i in 0..PARAM_COUNT {
            let desc = PARAM_DESCRIPTORS[i];
            let quantised = desc.quantize(params.get_param(i));
            restored.set_param(i, desc.denormalize(desc.normalize(quantised)));
        }
        for i in 0..PARAM_COUNT {
            let desc = PARAM_DESCRIPTORS[i];
            let a = desc.quantize(params.get_param(i));
            let b = restored.get_param(i);
            prop_assert!(
                (a - b).abs() <= desc.step * 0.5 + desc.max.abs() * 1e-5,
                "param {i} drifted: {a} vs {b}"
            );
        }
    }
}
