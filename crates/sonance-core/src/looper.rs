//! Record-and-replay buffers.
//!
//! [`Loop`] captures its input lazily while playing: after
//! [`record()`](Loop::record) it fills its buffer from the input, then flips
//! to replaying the buffer cyclically. [`Freeze`] captures eagerly at build
//! time by dispatching the source's own schedule until enough frames are in
//! hand, then replays them.

use core::time::Duration;

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Dispatcher, Graph, NodeId, Render, Signals, resolve};

/// Loop node: records a fixed-length buffer from its input, then replays it.
#[derive(Debug, Clone)]
pub struct Loop {
    input: NodeId,
    buf: Vec<f64>,
    read: usize,
    write: usize,
    recording: bool,
}

impl Loop {
    /// Creates a silent loop of `duration`.
    ///
    /// Returns an error if the duration rounds to zero frames.
    pub fn new(config: &GraphConfig, input: NodeId, duration: Duration) -> Result<Self> {
        let frames = config.frames(duration);
        if frames == 0 {
            return Err(GraphError::zero_length("loop"));
        }
        Ok(Self {
            input,
            buf: vec![0.0; frames],
            read: 0,
            write: 0,
            recording: false,
        })
    }

    /// Starts recording from the first frame of the buffer.
    pub fn record(&mut self) {
        self.write = 0;
        self.recording = true;
    }

    /// Rewinds replay to the first frame.
    pub fn restart(&mut self) {
        self.read = 0;
    }

    /// True while filling the buffer.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Loop length in frames.
    pub fn frames(&self) -> usize {
        self.buf.len()
    }
}

impl Render for Loop {
    fn render(&mut self, out: &mut [f64], signals: &Signals<'_>) -> bool {
        let input = signals.input(Some(self.input));
        for (i, o) in out.iter_mut().enumerate() {
            if self.recording {
                // Monitor the input while it is captured.
                let x = input.as_ref().map_or(0.0, |x| x.sample(i));
                self.buf[self.write] = x;
                self.write += 1;
                if self.write == self.buf.len() {
                    self.recording = false;
                    self.read = 0;
                }
                *o = x;
            } else {
                *o = self.buf[self.read];
                self.read = (self.read + 1) % self.buf.len();
            }
        }
        true
    }

    fn inputs(&self, into: &mut Vec<NodeId>) {
        into.push(self.input);
    }
}

/// Freeze node: replays a buffer captured from another node at build time.
#[derive(Debug, Clone)]
pub struct Freeze {
    samples: Vec<f64>,
    channels: usize,
    pos: usize,
}

impl Freeze {
    /// Captures `duration` of `source`'s output.
    ///
    /// Resolves `source`'s dependencies and dispatches as many ticks as it
    /// takes, drawing ticks from the graph's counter. Everything upstream of
    /// `source` advances as it would during playback.
    pub fn capture(
        graph: &Graph,
        dispatcher: &Dispatcher,
        source: NodeId,
        duration: Duration,
    ) -> Result<Self> {
        let frames = graph.config().frames(duration);
        if frames == 0 {
            return Err(GraphError::zero_length("freeze"));
        }
        let schedule = resolve(graph, source)?;
        let channels = graph
            .node(source)
            .ok_or(GraphError::NodeNotFound(source))?
            .channels();

        let wanted = frames * channels;
        let mut samples = Vec::with_capacity(wanted);
        while samples.len() < wanted {
            let tick = graph.next_tick();
            dispatcher.dispatch(graph, &schedule, tick)?;
            let block = graph
                .samples(source)
                .ok_or(GraphError::NodeNotFound(source))?;
            let take = (wanted - samples.len()).min(block.len());
            samples.extend_from_slice(&block[..take]);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("freeze: captured {frames} frames from {source}");
        Ok(Self {
            samples,
            channels,
            pos: 0,
        })
    }

    /// Replays pre-rendered interleaved samples.
    pub fn from_samples(samples: Vec<f64>, channels: usize) -> Result<Self> {
        if samples.is_empty() {
            return Err(GraphError::zero_length("freeze"));
        }
        if channels == 0 {
            return Err(GraphError::invalid("channels", 0.0));
        }
        Ok(Self {
            samples,
            channels,
            pos: 0,
        })
    }

    /// Captured samples, interleaved by channel.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Next sample index to play.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the playhead, wrapping modulo the capture length.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos % self.samples.len();
    }
}

impl Render for Freeze {
    fn render(&mut self, out: &mut [f64], _signals: &Signals<'_>) -> bool {
        for o in out.iter_mut() {
            *o = self.samples[self.pos];
            self.pos = (self.pos + 1) % self.samples.len();
        }
        true
    }

    fn channels(&self) -> usize {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Unit;

    fn config() -> GraphConfig {
        GraphConfig::new(1000.0, 4).unwrap()
    }

    fn tick(g: &Graph, ids: &[NodeId]) -> Vec<f64> {
        let tick = g.next_tick();
        for &id in ids {
            g.prepare(id, tick).unwrap();
        }
        g.samples(ids[ids.len() - 1]).unwrap().to_vec()
    }

    #[test]
    fn test_loop_is_silent_until_recorded() {
        let mut g = Graph::new(config()).unwrap();
        let ramp = g.add(Unit::ramp(1.0, 1.0)).unwrap();
        let lp = g
            .add(Loop::new(&config(), ramp, Duration::from_millis(6)).unwrap())
            .unwrap();
        assert_eq!(tick(&g, &[ramp, lp]), vec![0.0; 4]);
    }

    #[test]
    fn test_loop_records_then_replays() {
        let mut g = Graph::new(config()).unwrap();
        let ramp = g.add(Unit::ramp(1.0, 1.0)).unwrap();
        let lp = g
            .add(Loop::new(&config(), ramp, Duration::from_millis(6)).unwrap())
            .unwrap();
        g.looper_mut(lp).unwrap().record();

        let mut out = Vec::new();
        for _ in 0..4 {
            out.extend(tick(&g, &[ramp, lp]));
        }
        // Six frames monitored while recording, then the capture repeats.
        assert_eq!(
            out,
            vec![
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 1.0, 2.0, 3.0, 4.0
            ]
        );
        assert!(!g.looper_mut(lp).unwrap().is_recording());
    }

    #[test]
    fn test_loop_restart_rewinds() {
        let mut g = Graph::new(config()).unwrap();
        let ramp = g.add(Unit::ramp(1.0, 1.0)).unwrap();
        let lp = g
            .add(Loop::new(&config(), ramp, Duration::from_millis(6)).unwrap())
            .unwrap();
        g.looper_mut(lp).unwrap().record();
        tick(&g, &[ramp, lp]);
        // Second block finishes recording and replays two frames.
        assert_eq!(tick(&g, &[ramp, lp]), vec![5.0, 6.0, 1.0, 2.0]);
        g.looper_mut(lp).unwrap().restart();
        assert_eq!(tick(&g, &[ramp, lp]), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_freeze_captures_and_cycles() {
        let mut g = Graph::new(config()).unwrap();
        let ramp = g.add(Unit::ramp(0.0, 1.0)).unwrap();
        let frz = Freeze::capture(&g, &Dispatcher::serial(), ramp, Duration::from_millis(6))
            .unwrap();
        assert_eq!(frz.samples(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        let frz = g.add(frz).unwrap();
        assert_eq!(tick(&g, &[frz]), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(tick(&g, &[frz]), vec![4.0, 5.0, 0.0, 1.0]);

        g.freeze_mut(frz).unwrap().set_position(9);
        assert_eq!(g.freeze_mut(frz).unwrap().position(), 3);
    }

    #[test]
    fn test_freeze_draws_fresh_ticks() {
        let mut g = Graph::new(config()).unwrap();
        let ramp = g.add(Unit::ramp(0.0, 1.0)).unwrap();
        // Prepare once at tick 1 so a capture reusing tick 1 would be a no-op.
        g.prepare(ramp, g.next_tick()).unwrap();
        let frz = Freeze::capture(&g, &Dispatcher::serial(), ramp, Duration::from_millis(4))
            .unwrap();
        assert_eq!(frz.samples(), &[4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_zero_length_buffers_rejected() {
        let mut g = Graph::new(config()).unwrap();
        let unit = g.add(Unit::step(1.0)).unwrap();
        assert!(Loop::new(&config(), unit, Duration::ZERO).is_err());
        assert!(Freeze::capture(&g, &Dispatcher::serial(), unit, Duration::ZERO).is_err());
        assert!(Freeze::from_samples(Vec::new(), 1).is_err());
    }

    #[test]
    fn test_loop_pauses_while_off() {
        let mut g = Graph::new(config()).unwrap();
        let ramp = g.add(Unit::ramp(1.0, 1.0)).unwrap();
        let lp = g
            .add(Loop::new(&config(), ramp, Duration::from_millis(6)).unwrap())
            .unwrap();
        g.looper_mut(lp).unwrap().record();
        tick(&g, &[ramp, lp]);
        assert_eq!(tick(&g, &[ramp, lp]), vec![5.0, 6.0, 1.0, 2.0]);

        g.off(lp).unwrap();
        assert_eq!(tick(&g, &[ramp, lp]), vec![0.0; 4]);
        g.on(lp).unwrap();
        // Replay resumes where it stopped.
        assert_eq!(tick(&g, &[ramp, lp]), vec![3.0, 4.0, 5.0, 6.0]);
    }
}
