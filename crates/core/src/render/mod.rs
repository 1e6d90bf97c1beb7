use std::sync::{Arc, Mutex, MutexGuard};

use crate::{palette::Palette, Color};

/// Anything that can display a resolved palette: a material, a sprite
/// batch, an LED strip.
pub trait ColorSink {
    fn apply_palette(&mut self, colors: &[Color]);
}

impl<F> ColorSink for F
where
    F: FnMut(&[Color]),
{
    fn apply_palette(&mut self, colors: &[Color]) {
        self(colors)
    }
}

/// In-memory sink that keeps every palette it was handed. Clones share the
/// same history.
#[derive(Debug, Clone, Default)]
pub struct SwatchSink {
    history: Arc<Mutex<Vec<Palette>>>,
}

impl SwatchSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records into an existing history buffer.
    pub fn shared(history: Arc<Mutex<Vec<Palette>>>) -> Self {
        Self { history }
    }

    pub fn last(&self) -> Option<Palette> {
        self.lock().last().cloned()
    }

    pub fn applied_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Palette>> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ColorSink for SwatchSink {
    fn apply_palette(&mut self, colors: &[Color]) {
        self.lock().push(colors.to_vec());
    }
}

/// Broadcasts a palette to several sinks in attachment order.
#[derive(Default)]
pub struct SinkFanout {
    sinks: Vec<Box<dyn ColorSink + Send>>,
}

impl SinkFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S>(&mut self, sink: S)
    where
        S: ColorSink + Send + 'static,
    {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ColorSink for SinkFanout {
    fn apply_palette(&mut self, colors: &[Color]) {
        for sink in &mut self.sinks {
            sink.apply_palette(colors);
        }
    }
}

impl std::fmt::Debug for SinkFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkFanout")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_reaches_every_sink() {
        let first = SwatchSink::new();
        let second = SwatchSink::new();
        let mut fanout = SinkFanout::new();
        fanout.push(first.clone());
        fanout.push(second.clone());

        fanout.apply_palette(&[Color::RED, Color::BLUE]);

        assert_eq!(fanout.len(), 2);
        assert_eq!(first.last(), Some(vec![Color::RED, Color::BLUE]));
        assert_eq!(second.applied_count(), 1);
    }

    #[test]
    fn closures_act_as_sinks() {
        let mut widths = Vec::new();
        {
            let mut sink = |colors: &[Color]| widths.push(colors.len());
            sink.apply_palette(&[Color::WHITE; 3]);
        }
        assert_eq!(widths, vec![3]);
    }
}
