//! Integration tests for sonance-core graph execution.
//!
//! Builds whole graphs and drives them through [`Engine`] the way the device
//! boundary does: envelope timing at sample resolution, multi-tap echoes off
//! one delay buffer, eager freeze capture, a released voice switching itself
//! off, and bit-exact agreement between serial and parallel dispatch.

use core::time::Duration;

use sonance_core::{
    Adsr, BandPass, Comb, Delay, Dispatcher, Engine, Envelope, EnvelopeState, Freeze, Gain,
    Graph, GraphConfig, Instrument, LowPass, Mixer, NodeId, Oscillator, Pan, Table, Tap, Unit,
};

fn adsr_ms(attack: u64, decay: u64, sustain: u64, release: u64) -> Adsr {
    Adsr {
        attack: Duration::from_millis(attack),
        decay: Duration::from_millis(decay),
        sustain: Duration::from_millis(sustain),
        release: Duration::from_millis(release),
        sustain_level: 0.5,
        peak: 1.0,
    }
}

// ============================================================================
// 1. Envelope timing
// ============================================================================

#[test]
fn test_envelope_boundary_scenario() {
    let config = GraphConfig::new(1000.0, 1).unwrap();
    let mut g = Graph::new(config).unwrap();
    let env = g.add(Envelope::new(&config, adsr_ms(10, 10, 10, 10))).unwrap();
    assert_eq!(g.envelope_mut(env).unwrap().boundaries(), [10, 20, 30, 40]);

    let mut engine = Engine::new(g, Dispatcher::serial(), env).unwrap();
    let out = engine.render(40).unwrap();
    assert!((out[5] - 0.5).abs() < 1e-12, "expected 0.5 mid-attack, got {}", out[5]);
    assert!((out[10] - 1.0).abs() < 1e-12, "expected peak, got {}", out[10]);
    assert_eq!(out[25], 0.5);
    assert!(out[39] < 0.1, "expected near zero at end of release, got {}", out[39]);

    // Loops back into the attack.
    let next = engine.render(1).unwrap();
    assert_eq!(next[0], 0.0);
}

#[test]
fn test_envelope_release_mid_attack() {
    let config = GraphConfig::new(1000.0, 1).unwrap();
    let mut g = Graph::new(config).unwrap();
    let env = g.add(Envelope::new(&config, adsr_ms(10, 10, 10, 10))).unwrap();
    let mut engine = Engine::new(g, Dispatcher::serial(), env).unwrap();

    engine.render(5).unwrap();
    {
        let mut state = engine.graph().envelope_mut(env).unwrap();
        assert!(state.release());
        assert_eq!(state.position(), 31);
        assert_eq!(state.state(), EnvelopeState::Release);
        // Already releasing: a second call reports it.
        assert!(!state.release());
    }

    let tail = engine.render(9).unwrap();
    assert!(tail[0] <= 0.5, "expected release to start at sustain level, got {}", tail[0]);
    for pair in tail.windows(2) {
        assert!(pair[1] < pair[0], "expected falling release, got {tail:?}");
    }
    assert_eq!(engine.graph().envelope_mut(env).unwrap().position(), 0);
}

#[test]
fn test_sustained_voice_releases_and_switches_off() {
    let config = GraphConfig::new(1000.0, 8).unwrap();
    let mut g = Graph::new(config).unwrap();
    let osc = g.add(Oscillator::new(&config, Table::sine(), 125.0, 1.0)).unwrap();
    let env = g
        .add(Envelope::new(&config, adsr_ms(4, 4, 4, 16)).with_input(osc))
        .unwrap();
    let voice = g.add(Instrument::new(&config, env)).unwrap();
    g.envelope_mut(env).unwrap().sustain();

    let mut engine = Engine::new(g, Dispatcher::serial(), voice).unwrap();
    engine.render(64).unwrap();
    assert!(engine.graph().envelope_mut(env).unwrap().is_sustaining());
    assert!(engine.output().iter().any(|&x| x != 0.0));

    assert!(engine.graph().envelope_mut(env).unwrap().release());
    engine
        .graph()
        .instrument_mut(voice)
        .unwrap()
        .off_in(Duration::from_millis(16));
    engine.render(16).unwrap();
    assert!(engine.graph().node(voice).unwrap().is_off());

    let after = engine.render(8).unwrap();
    assert!(after.iter().all(|&x| x == 0.0));
}

// ============================================================================
// 2. Delay family
// ============================================================================

#[test]
fn test_multi_tap_echo_shares_one_buffer() {
    let config = GraphConfig::new(1000.0, 4).unwrap();
    let mut g = Graph::new(config).unwrap();
    let imp = g.add(Unit::impulse(1.0)).unwrap();
    let delay = g
        .add(Delay::new(&config, imp, Duration::from_millis(9)).unwrap())
        .unwrap();
    let near = g.add(Tap::new(&config, delay, Duration::from_millis(2))).unwrap();
    let far = g.add(Tap::new(&config, delay, Duration::from_millis(5))).unwrap();
    let quiet = g.add(Gain::new(far, 0.5)).unwrap();
    let mix = g.add(Mixer::with_inputs(vec![imp, near, quiet, delay])).unwrap();

    let mut engine = Engine::new(g, Dispatcher::new(2).unwrap(), mix).unwrap();
    let out = engine.render(16).unwrap();
    let mut expected = vec![0.0; 16];
    expected[0] = 1.0;
    expected[2] = 1.0;
    expected[5] = 0.5;
    expected[9] = 1.0;
    assert_eq!(out, expected);
}

#[test]
fn test_comb_rings_through_engine() {
    let config = GraphConfig::new(1000.0, 8).unwrap();
    let mut g = Graph::new(config).unwrap();
    let imp = g.add(Unit::impulse(1.0)).unwrap();
    let comb = g
        .add(Comb::new(&config, imp, Duration::from_millis(3), 0.5).unwrap())
        .unwrap();
    let mut engine = Engine::new(g, Dispatcher::serial(), comb).unwrap();
    let out = engine.render(10).unwrap();
    assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.25]);
}

#[test]
fn test_freeze_replays_captured_period() {
    let config = GraphConfig::new(1024.0, 16).unwrap();
    let mut g = Graph::new(config).unwrap();
    let table = Table::from_samples((0..32u8).map(f64::from).collect()).unwrap();
    // 32 Hz through a 32-entry table at 1024 Hz: one entry per frame.
    let osc = g.add(Oscillator::new(&config, table, 32.0, 1.0)).unwrap();
    let dispatcher = Dispatcher::serial();
    let frozen = Freeze::capture(&g, &dispatcher, osc, Duration::from_millis(8)).unwrap();
    assert_eq!(frozen.samples().len(), 8);
    assert_eq!(frozen.samples(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    // The source advanced by the whole capture tick.
    assert_eq!(g.current_tick(), 1);

    let frz = g.add(frozen).unwrap();
    let mut engine = Engine::new(g, dispatcher, frz).unwrap();
    let out = engine.render(16).unwrap();
    assert_eq!(&out[..8], &out[8..]);
}

// ============================================================================
// 3. Dispatch
// ============================================================================

/// A graph with several tiers and wide fan-in: modulated oscillators,
/// envelopes, both filters, a delay with taps, a comb and a stereo bus.
fn build_network(config: GraphConfig) -> (Graph, NodeId) {
    let mut g = Graph::new(config).unwrap();
    let lfo = g.add(Oscillator::new(&config, Table::sine(), 3.0, 0.1)).unwrap();
    let vib = g.add(Oscillator::new(&config, Table::triangle(), 5.0, 0.05)).unwrap();

    let mut voices = Vec::new();
    for (i, table) in [Table::sine(), Table::sawtooth(), Table::square_synthesis(8, 0.0)]
        .into_iter()
        .enumerate()
    {
        let freq = 220.0 * (i + 1) as f64;
        let osc = g
            .add(
                Oscillator::new(&config, table, freq, 0.3)
                    .with_phase_mod(lfo)
                    .with_amp_mod(vib),
            )
            .unwrap();
        let env = g
            .add(Envelope::new(&config, adsr_ms(5, 20, 40, 30)).with_input(osc))
            .unwrap();
        voices.push(env);
    }

    let bus = g.add(Mixer::with_inputs(voices.clone())).unwrap();
    let lp = g.add(LowPass::new(&config, bus, 2000.0).unwrap()).unwrap();
    let bp = g.add(BandPass::new(&config, voices[1], 660.0, 80.0).unwrap()).unwrap();
    let delay = g
        .add(Delay::new(&config, lp, Duration::from_millis(30)).unwrap())
        .unwrap();
    let tap = g.add(Tap::new(&config, delay, Duration::from_millis(11))).unwrap();
    let comb = g
        .add(Comb::new(&config, bp, Duration::from_millis(7), 0.6).unwrap())
        .unwrap();
    let wet = g.add(Mixer::with_inputs(vec![lp, delay, tap, comb])).unwrap();
    let left = g.add(Pan::new(wet, -0.4)).unwrap();
    let right = g.add(Pan::new(voices[2], 0.7)).unwrap();
    let out = g.add(Mixer::with_inputs(vec![left, right]).stereo()).unwrap();
    (g, out)
}

#[test]
fn test_parallel_dispatch_matches_serial() {
    let config = GraphConfig::new(8000.0, 64).unwrap();

    let (g, root) = build_network(config);
    let mut serial = Engine::new(g, Dispatcher::serial(), root).unwrap();
    let (g, root) = build_network(config);
    let mut parallel = Engine::new(g, Dispatcher::new(4).unwrap(), root).unwrap();
    assert!(parallel.schedule().tier_count() > 3);

    let a = serial.render(2048).unwrap();
    let b = parallel.render(2048).unwrap();
    assert_eq!(a.len(), 4096);
    assert!(a.iter().any(|&x| x != 0.0));
    assert_eq!(a, b);
}

#[test]
fn test_shared_input_prepared_once_per_tick() {
    let config = GraphConfig::new(1000.0, 4).unwrap();
    let mut g = Graph::new(config).unwrap();
    let ramp = g.add(Unit::ramp(0.0, 1.0)).unwrap();
    let a = g.add(Gain::new(ramp, 1.0)).unwrap();
    let b = g.add(Gain::new(ramp, 1.0)).unwrap();
    let deep = g.add(Gain::new(a, 1.0)).unwrap();
    let mix = g.add(Mixer::with_inputs(vec![deep, b, ramp])).unwrap();

    let mut engine = Engine::new(g, Dispatcher::new(3).unwrap(), mix).unwrap();
    engine.tick().unwrap();
    engine.tick().unwrap();
    // Three copies of the ramp's second block, not an over-advanced one.
    assert_eq!(&*engine.output(), &[12.0, 15.0, 18.0, 21.0]);
}
