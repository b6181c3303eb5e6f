//! End-to-end scenarios for the full engine: impulse tails, stability under
//! extreme parameters, decay times, oversampling transitions, and the
//! harmonic signature of the in-loop saturator.

use cuerda_reverb::{
    Engine, FeedbackMatrix, MatrixKind, OversamplingFactor, ReverbParams, SatType, Saturator,
    NUM_CHANNELS,
};

/// Goertzel magnitude of `freq` in `samples`, normalised to amplitude.
fn goertzel(samples: &[f32], freq: f32, sample_rate: f32) -> f32 {
    let w = core::f32::consts::TAU * freq / sample_rate;
    let coeff = 2.0 * w.cos();
    let mut s1 = 0.0f32;
    let mut s2 = 0.0f32;
    for &x in samples {
        let s0 = x + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    (s1 * s1 + s2 * s2 - coeff * s1 * s2).max(0.0).sqrt() / (samples.len() as f32 * 0.5)
}

fn process_impulse(engine: &mut Engine, block: usize) {
    let mut l = vec![0.0f32; block];
    let mut r = vec![0.0f32; block];
    l[0] = 1.0;
    r[0] = 1.0;
    engine.process_block(&mut l, &mut r);
}

/// Run `blocks` silent blocks, returning (peak, energy of the last `tail` blocks).
fn drain(engine: &mut Engine, blocks: usize, block: usize, tail: usize) -> (f32, f64) {
    let mut peak = 0.0f32;
    let mut tail_energy = 0.0f64;
    for b in 0..blocks {
        let mut l = vec![0.0f32; block];
        let mut r = vec![0.0f32; block];
        engine.process_block(&mut l, &mut r);
        for i in 0..block {
            assert!(l[i].is_finite() && r[i].is_finite(), "non-finite in block {b}");
            peak = peak.max(l[i].abs()).max(r[i].abs());
            if b >= blocks - tail {
                tail_energy += (l[i] * l[i] + r[i] * r[i]) as f64;
            }
        }
    }
    (peak, tail_energy)
}

fn all_scalars_max() -> ReverbParams {
    let mut params = ReverbParams::default();
    params.dry_wet = 100.0;
    params.pre_delay_ms = 100.0;
    params.early_level_db = 6.0;
    params.late_level_db = 6.0;
    params.room_size = 1.0;
    params.stereo_width = 100.0;
    params.low_rt60_s = 12.0;
    params.high_rt60_s = 8.0;
    params.hf_damping = 100.0;
    params.diffusion = 100.0;
    params.decay_shape = 100.0;
    params.sat_amount = 100.0;
    params.sat_drive_db = 24.0;
    params.sat_type = SatType::Tube;
    params.sat_tone = 100.0;
    params.sat_asymmetry = 100.0;
    params.mod_depth = 100.0;
    params.mod_rate_hz = 5.0;
    params
}

// --- Scenarios ---

#[test]
fn s1_default_impulse_leaves_a_live_bounded_tail() {
    let mut engine = Engine::new();
    engine.prepare(44100.0, 512);
    process_impulse(&mut engine, 512);
    let (_, tail_energy) = drain(&mut engine, 20, 512, 5);
    assert!(tail_energy > 1e-10, "tail died early: {tail_energy}");
    assert!(tail_energy < 10.0, "tail too hot: {tail_energy}");
}

#[test]
fn s2_fully_dry_noise_leaves_no_wet_residue() {
    let mut engine = Engine::new();
    engine.prepare(48000.0, 256);
    let mut params = ReverbParams::default();
    params.dry_wet = 0.0;
    engine.set_parameter_snapshot(params);
    engine.reset();

    let mut rng = 0x1234_5678u32;
    for _ in 0..10 {
        let mut l = [0.0f32; 256];
        let mut r = [0.0f32; 256];
        for i in 0..256 {
            rng = rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            l[i] = (rng >> 16) as f32 / 32768.0 - 1.0;
            rng = rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            r[i] = (rng >> 16) as f32 / 32768.0 - 1.0;
        }
        engine.process_block(&mut l, &mut r);
    }

    // With the wet bus fully muted, stopping the input silences the output
    // at once: the internal tail must not bleed through.
    let (peak, _) = drain(&mut engine, 10, 256, 1);
    assert!(peak <= 1e-3, "wet residue peak {peak}");
}

#[test]
fn s3_extreme_parameters_at_96k_4x_stay_bounded() {
    let mut engine = Engine::new();
    engine.prepare(96000.0, 1024);
    let mut params = all_scalars_max();
    params.oversampling = OversamplingFactor::Four;
    engine.set_parameter_snapshot(params);
    engine.reset();

    process_impulse(&mut engine, 1024);
    let (peak, _) = drain(&mut engine, 20, 1024, 1);
    assert!(peak <= 10.0, "output peak {peak}");
}

#[test]
fn s4_one_second_rt60_decays_within_five_seconds() {
    let mut engine = Engine::new();
    engine.prepare(44100.0, 512);
    let mut params = ReverbParams::default();
    params.low_rt60_s = 1.0;
    params.high_rt60_s = 0.5;
    params.diffusion = 80.0;
    params.mod_depth = 0.0;
    engine.set_parameter_snapshot(params);
    engine.reset();

    process_impulse(&mut engine, 512);
    // 5 s of silence
    let blocks = (5.0 * 44100.0 / 512.0) as usize;
    drain(&mut engine, blocks, 512, 1);
    // Whatever remains now must be below audibility
    let (peak, _) = drain(&mut engine, 4, 512, 1);
    assert!(peak < 1e-3, "tail survives after 5 s: {peak}");
}

#[test]
fn s5_warm_saturation_produces_a_third_harmonic() {
    const SR: f32 = 44100.0;
    let mut sat = Saturator::new(SR);
    sat.set_parameters(100.0, 12.0, SatType::Warm, 0.0);
    sat.reset();

    let n = 8192;
    let mut output = vec![0.0f32; n];
    for (i, out) in output.iter_mut().enumerate() {
        let x = 0.5 * (core::f32::consts::TAU * 1000.0 * i as f32 / SR).sin();
        *out = sat.process(x);
    }

    let fundamental = goertzel(&output, 1000.0, SR);
    let third = goertzel(&output, 3000.0, SR);
    assert!(
        third >= fundamental * 1e-3,
        "third harmonic {third} below -60 dB of fundamental {fundamental}"
    );
}

#[test]
fn s5b_asymmetry_raises_the_second_harmonic() {
    const SR: f32 = 44100.0;
    let measure_second = |asymmetry: f32| {
        let mut sat = Saturator::new(SR);
        sat.set_parameters(100.0, 12.0, SatType::Warm, asymmetry);
        sat.reset();
        let n = 8192;
        let mut output = vec![0.0f32; n];
        for (i, out) in output.iter_mut().enumerate() {
            let x = 0.5 * (core::f32::consts::TAU * 1000.0 * i as f32 / SR).sin();
            *out = sat.process(x);
        }
        goertzel(&output, 2000.0, SR)
    };

    let symmetric = measure_second(0.0);
    let asymmetric = measure_second(50.0);
    // ≥ 10 dB lift
    assert!(
        asymmetric >= symmetric * 3.16,
        "second harmonic lift too small: {symmetric} -> {asymmetric}"
    );
}

#[test]
fn s6_oversampling_switch_mid_stream_is_glitch_safe() {
    let mut engine = Engine::new();
    engine.prepare(44100.0, 512);
    let mut params = ReverbParams::default();
    params.oversampling = OversamplingFactor::Off;
    engine.set_parameter_snapshot(params);
    engine.reset();

    let run_two_blocks = |engine: &mut Engine| {
        for _ in 0..2 {
            let mut l = vec![0.3f32; 512];
            let mut r = vec![-0.3f32; 512];
            engine.process_block(&mut l, &mut r);
            for &x in l.iter().chain(r.iter()) {
                assert!(x.is_finite(), "non-finite after factor switch");
            }
        }
    };

    run_two_blocks(&mut engine);
    params.oversampling = OversamplingFactor::Four;
    engine.set_parameter_snapshot(params);
    run_two_blocks(&mut engine);
}

// --- Universal invariants ---

#[test]
fn matrix_preserves_energy_for_random_vectors() {
    for kind in [MatrixKind::Hadamard, MatrixKind::Householder] {
        let matrix = FeedbackMatrix::new(kind);
        let mut rng = 0xfeed_5eedu32;
        for _ in 0..200 {
            let mut v = [0.0f32; NUM_CHANNELS];
            for x in &mut v {
                rng = rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                *x = (rng >> 16) as f32 / 32768.0 - 1.0;
            }
            let mut out = [0.0f32; NUM_CHANNELS];
            matrix.process(&v, &mut out);
            let e_in: f32 = v.iter().map(|x| x * x).sum();
            let e_out: f32 = out.iter().map(|x| x * x).sum();
            assert!(
                (e_out - e_in).abs() <= 1e-2 * e_in.max(1e-9),
                "{kind:?}: {e_in} -> {e_out}"
            );
        }
    }
}

#[test]
fn bounded_output_for_hostile_snapshots() {
    let mut hostile = all_scalars_max();
    hostile.oversampling = OversamplingFactor::Off;
    let mut weird = ReverbParams::default();
    weird.room_size = 0.1;
    weird.low_rt60_s = 12.0;
    weird.high_rt60_s = 0.1;
    weird.diffusion = 0.0;
    weird.sat_amount = 100.0;
    weird.sat_type = SatType::Tape;
    weird.sat_asymmetry = 100.0;
    weird.sat_tone = -100.0;

    for params in [ReverbParams::default(), hostile, weird] {
        let mut engine = Engine::new();
        engine.prepare(44100.0, 512);
        engine.set_parameter_snapshot(params);
        engine.reset();

        let mut rng = 0x0bad_cafeu32;
        // 2 s of full-scale noise
        for _ in 0..172 {
            let mut l = [0.0f32; 512];
            let mut r = [0.0f32; 512];
            for i in 0..512 {
                rng = rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                l[i] = (rng >> 16) as f32 / 32768.0 - 1.0;
                rng = rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                r[i] = (rng >> 16) as f32 / 32768.0 - 1.0;
            }
            engine.process_block(&mut l, &mut r);
            for &x in l.iter().chain(r.iter()) {
                assert!(x.is_finite());
                assert!(x.abs() <= 10.0, "output {x} out of bounds");
            }
        }
    }
}

#[test]
fn reset_is_idempotent_to_machine_epsilon() {
    let mut engine = Engine::new();
    engine.prepare(44100.0, 512);
    let mut l = vec![0.9f32; 512];
    let mut r = vec![-0.9f32; 512];
    engine.process_block(&mut l, &mut r);
    engine.reset();

    let mut zl = vec![0.0f32; 512];
    let mut zr = vec![0.0f32; 512];
    engine.process_block(&mut zl, &mut zr);
    let sum: f32 = zl.iter().chain(zr.iter()).map(|x| x.abs()).sum();
    assert!(sum <= f32::EPSILON * 512.0, "residue {sum}");
}

#[test]
fn saturation_off_is_transparent() {
    let mut sat = Saturator::new(44100.0);
    sat.set_parameters(0.0, 24.0, SatType::Tube, 100.0);
    for i in 0..1000 {
        let x = (i as f32 / 500.0) - 1.0;
        let y = sat.process(x);
        // −120 dB
        assert!((y - x).abs() <= 1e-6 * x.abs().max(1.0), "{x} -> {y}");
    }
}

#[test]
fn saturation_bounded_at_full_tilt() {
    for sat_type in [SatType::Soft, SatType::Warm, SatType::Tape, SatType::Tube] {
        let mut sat = Saturator::new(44100.0);
        sat.set_parameters(100.0, 24.0, sat_type, 0.0);
        sat.reset();
        for i in 0..4000 {
            let x = (i as f32 / 2000.0) - 1.0;
            let y = sat.process(x);
            assert!(y.abs() <= 1.3, "{sat_type:?}: |{y}| > 1.3");
        }
    }
}

#[test]
fn identical_runs_are_bit_identical() {
    let render = || {
        let mut engine = Engine::new();
        engine.prepare(48000.0, 256);
        let mut out = Vec::new();
        let mut rng = 0x5eed_cafeu32;
        for _ in 0..20 {
            let mut l = [0.0f32; 256];
            let mut r = [0.0f32; 256];
            for i in 0..256 {
                rng = rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                l[i] = (rng >> 16) as f32 / 32768.0 - 1.0;
                r[i] = l[i] * 0.5;
            }
            engine.process_block(&mut l, &mut r);
            out.extend_from_slice(&l);
            out.extend_from_slice(&r);
        }
        out
    };
    let a = render();
    let b = render();
    assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
}

#[test]
fn stereo_width_zero_makes_wet_mono() {
    let mut engine = Engine::new();
    engine.prepare(44100.0, 512);
    let mut params = ReverbParams::default();
    params.dry_wet = 100.0;
    params.stereo_width = 0.0;
    engine.set_parameter_snapshot(params);
    engine.reset();

    // Decorrelated input: impulse on the left only
    let mut l = vec![0.0f32; 512];
    let mut r = vec![0.0f32; 512];
    l[0] = 1.0;
    engine.process_block(&mut l, &mut r);
    for _ in 0..8 {
        let mut l = vec![0.0f32; 512];
        let mut r = vec![0.0f32; 512];
        engine.process_block(&mut l, &mut r);
        for i in 0..512 {
            assert!(
                (l[i] - r[i]).abs() < 1e-5,
                "width 0 should collapse to mono: {} vs {}",
                l[i],
                r[i]
            );
        }
    }
}
