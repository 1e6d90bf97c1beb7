use serde::{Deserialize, Serialize};

use crate::{render::SinkFanout, ColorSink, Result, Sequencer, SequencerConfig};

/// Which host time source advances the sequencer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessMode {
    /// Scaled per-frame delta.
    #[default]
    Idle,
    /// Fixed-step delta from the physics tick.
    Fixed,
    /// Per-frame delta that ignores time scaling.
    Unscaled,
}

/// Host callback that produced a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Frame,
    Fixed,
}

/// Time deltas reported by the host for one tick, in seconds.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub delta: f32,
    pub unscaled_delta: f32,
    pub fixed_delta: f32,
}

impl FrameTiming {
    /// Same delta for every source.
    pub fn uniform(delta: f32) -> Self {
        Self {
            delta,
            unscaled_delta: delta,
            fixed_delta: delta,
        }
    }
}

impl ProcessMode {
    /// Picks the delta this mode consumes for a tick, or `None` when the tick
    /// belongs to another mode.
    pub fn select(self, kind: TickKind, timing: &FrameTiming) -> Option<f32> {
        match (self, kind) {
            (ProcessMode::Idle, TickKind::Frame) => Some(timing.delta),
            (ProcessMode::Unscaled, TickKind::Frame) => Some(timing.unscaled_delta),
            (ProcessMode::Fixed, TickKind::Fixed) => Some(timing.fixed_delta),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    pub time_seconds: f32,
    pub ticks: u64,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
        self.ticks = 0;
    }

    pub fn advance(&mut self, delta: f32) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
        self.ticks += 1;
    }
}

/// Owns a sequencer and feeds it host ticks, pushing every newly installed
/// palette to the attached sinks.
#[derive(Debug)]
pub struct FrameDriver {
    sequencer: Sequencer,
    mode: ProcessMode,
    clock: PlaybackClock,
    sinks: SinkFanout,
    last_revision: Option<u64>,
}

impl FrameDriver {
    pub fn new(sequencer: Sequencer, mode: ProcessMode) -> Self {
        Self {
            sequencer,
            mode,
            clock: PlaybackClock::default(),
            sinks: SinkFanout::new(),
            last_revision: None,
        }
    }

    pub fn from_config(config: SequencerConfig) -> Result<Self> {
        let mode = config.process_mode;
        Ok(Self::new(Sequencer::new(config)?, mode))
    }

    /// Attaches a sink and immediately hands it the installed palette.
    pub fn attach_sink<S>(&mut self, sink: S)
    where
        S: ColorSink + Send + 'static,
    {
        self.sinks.push(sink);
        self.last_revision = None;
        self.flush();
    }

    /// Handles one host callback. Returns whether the sequencer was stepped.
    pub fn tick(&mut self, kind: TickKind, timing: &FrameTiming) -> bool {
        let Some(delta) = self.mode.select(kind, timing) else {
            return false;
        };

        self.clock.advance(delta);
        self.sequencer.step(delta);
        self.flush();
        true
    }

    /// Drives `ticks` ticks of the kind matching the current mode.
    pub fn run(&mut self, delta: f32, ticks: u64) {
        let kind = match self.mode {
            ProcessMode::Fixed => TickKind::Fixed,
            ProcessMode::Idle | ProcessMode::Unscaled => TickKind::Frame,
        };
        let timing = FrameTiming::uniform(delta);
        for _ in 0..ticks {
            self.tick(kind, &timing);
        }
        tracing::debug!(
            ticks,
            elapsed = self.clock.time_seconds,
            index = self.sequencer.current_index(),
            "frame driver run finished"
        );
    }

    fn flush(&mut self) {
        let revision = self.sequencer.revision();
        if self.last_revision != Some(revision) {
            self.sinks.apply_palette(self.sequencer.current_palette());
            self.last_revision = Some(revision);
        }
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn mode(&self) -> ProcessMode {
        self.mode
    }
}
