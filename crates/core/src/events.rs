//! Synchronous in-process event dispatch for the sequencer.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::Color;

/// Closed set of notifications a sequencer can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Playback started or resumed.
    Play,
    /// A step was processed, whether or not the palette changed.
    Step,
    /// The sentinel end slot was reached, looping or not.
    End,
    /// Playback paused.
    Pause,
    /// Elapsed time rewound to zero.
    Reset,
    /// A different palette index was installed.
    PaletteChange,
}

/// Copy of the observable sequencer state at the moment an event fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SequencerSnapshot {
    pub current_index: usize,
    pub elapsed_time: f32,
    pub inter_frame_time: f32,
    pub paused: bool,
    pub looping: bool,
    pub cross_fade: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SequencerEvent {
    Play(SequencerSnapshot),
    Step(SequencerSnapshot),
    End(SequencerSnapshot),
    Pause(SequencerSnapshot),
    Reset(SequencerSnapshot),
    PaletteChange { index: usize, colors: Vec<Color> },
}

impl SequencerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Play(_) => EventKind::Play,
            Self::Step(_) => EventKind::Step,
            Self::End(_) => EventKind::End,
            Self::Pause(_) => EventKind::Pause,
            Self::Reset(_) => EventKind::Reset,
            Self::PaletteChange { .. } => EventKind::PaletteChange,
        }
    }
}

/// Handler type stored by [`EventBus`].
pub type EventHandler = Box<dyn FnMut(&SequencerEvent) + Send>;

struct Subscription {
    kind: Option<EventKind>,
    handler: EventHandler,
}

/// Ordered observer registry.
///
/// Handlers run synchronously in registration order. They only receive the
/// event, never the sequencer, so they cannot re-enter it mid-dispatch.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a single event kind.
    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&SequencerEvent) + Send + 'static,
    {
        self.subscriptions.push(Subscription {
            kind: Some(kind),
            handler: Box::new(handler),
        });
    }

    /// Registers a handler that receives every event.
    pub fn on_any<F>(&mut self, handler: F)
    where
        F: FnMut(&SequencerEvent) + Send + 'static,
    {
        self.subscriptions.push(Subscription {
            kind: None,
            handler: Box::new(handler),
        });
    }

    pub fn emit(&mut self, event: &SequencerEvent) {
        let kind = event.kind();
        for subscription in &mut self.subscriptions {
            if subscription.kind.map_or(true, |wanted| wanted == kind) {
                (subscription.handler)(event);
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handler_count", &self.subscriptions.len())
            .finish()
    }
}

/// Shared recorder that can be handed to an [`EventBus`] as a handler.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SequencerEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handler that appends every event it sees to this log.
    pub fn recorder(&self) -> impl FnMut(&SequencerEvent) + Send + 'static {
        let events = Arc::clone(&self.events);
        move |event| {
            let mut guard = events.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.push(event.clone());
        }
    }

    pub fn events(&self) -> Vec<SequencerEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(SequencerEvent::kind).collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}
