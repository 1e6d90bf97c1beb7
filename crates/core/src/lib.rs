//! Core library for the palette sequencer.
//!
//! A [`Sequencer`] walks an ordered [`PaletteSet`] over time, optionally
//! cross-fading between neighbouring palettes, and reports its transitions
//! through a synchronous [`EventBus`]. The [`FrameDriver`] adapts host frame
//! callbacks to sequencer steps and forwards resolved colors to
//! [`ColorSink`]s.

pub mod color;
pub mod config;
pub mod error;
pub mod events;
pub mod palette;
pub mod render;
pub mod sequencer;
pub mod timeline;

pub use color::Color;
pub use config::SequencerConfig;
pub use error::{Result, SequencerError};
pub use events::{EventBus, EventKind, EventLog, SequencerEvent, SequencerSnapshot};
pub use palette::{lerp_colors, Palette, PaletteSet};
pub use render::{ColorSink, SinkFanout, SwatchSink};
pub use sequencer::Sequencer;
pub use timeline::{FrameDriver, FrameTiming, PlaybackClock, ProcessMode, TickKind};
