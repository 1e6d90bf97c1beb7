//! Palette sequencer state machine.
//!
//! A [`Sequencer`] steps through a [`PaletteSet`] at a fixed frame rate,
//! optionally cross-fading towards the following palette, and reports every
//! transition through its [`EventBus`]. It is driven entirely by the deltas
//! passed to [`Sequencer::step`] and never reads a clock itself.

use crate::{
    config::validate_frames_per_second,
    events::{EventBus, EventKind, SequencerEvent, SequencerSnapshot},
    palette::{floored_mod_f32, lerp_colors, Palette},
    Color, PaletteSet, Result, SequencerConfig, SequencerError,
};

#[derive(Debug)]
pub struct Sequencer {
    palettes: PaletteSet,
    current_palette: Palette,
    current_index: usize,
    elapsed_time: f32,
    inter_frame_time: f32,
    paused: bool,
    looping: bool,
    cross_fade: bool,
    frames_per_second: f32,
    speed: f32,
    revision: u64,
    events: EventBus,
}

impl Sequencer {
    /// Builds a sequencer at index 0 with the first palette installed.
    ///
    /// The sequencer starts playing when `autostart` is set and paused
    /// otherwise. Construction emits no events.
    pub fn new(config: SequencerConfig) -> Result<Self> {
        config.validate()?;

        let mut sequencer = Self {
            palettes: config.palettes,
            current_palette: Vec::new(),
            current_index: 0,
            elapsed_time: 0.0,
            inter_frame_time: 0.0,
            paused: !config.autostart,
            looping: config.looping,
            cross_fade: config.cross_fade,
            frames_per_second: config.frames_per_second,
            speed: config.speed,
            revision: 0,
            events: EventBus::new(),
        };
        sequencer.refresh();
        Ok(sequencer)
    }

    // -------------------------------
    // MARK: Playback control
    // -------------------------------

    pub fn play(&mut self) {
        if self.paused {
            self.paused = false;
            self.emit_state(EventKind::Play);
        }
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.emit_state(EventKind::Pause);
        }
    }

    /// Rewinds elapsed time. The current index is left alone.
    pub fn reset(&mut self) {
        self.elapsed_time = 0.0;
        self.emit_state(EventKind::Reset);
    }

    /// Advances the animation by `delta` seconds of host time.
    pub fn step(&mut self, delta: f32) {
        if self.paused {
            return;
        }

        let count = self.palettes.len();
        if count == 0 {
            return;
        }

        let scaled = delta * self.speed;
        self.elapsed_time += scaled;
        self.inter_frame_time += scaled;

        let seconds_per_frame = 1.0 / self.frames_per_second;
        let raw_frame = self.elapsed_time / seconds_per_frame;
        // One slot past the last palette marks the end of the sequence.
        let candidate = floored_mod_f32(raw_frame.floor(), (count + 1) as f32) as usize;

        self.emit_state(EventKind::Step);

        if candidate >= count {
            self.elapsed_time = 0.0;
            tracing::debug!(last_index = count - 1, "palette sequence reached its end");
            self.emit_state(EventKind::End);

            if self.looping {
                tracing::debug!(from_index = self.current_index, "looping back to first palette");
                self.play();
                self.set_current_palette(0);
            } else {
                tracing::debug!(index = self.current_index, "pausing on last palette");
                self.pause();
            }
        } else {
            self.set_current_palette(candidate as i64);
        }
    }

    // -------------------------------
    // MARK: Palette resolution
    // -------------------------------

    /// Installs the palette at `index`, wrapped onto the palette set.
    ///
    /// With cross-fading enabled the installed colors are the previously
    /// installed ones blended towards the following palette by the time
    /// spent on the current frame. A palette change event fires only when
    /// the index actually changes.
    pub fn set_current_palette(&mut self, index: i64) {
        let Some(new_index) = self.palettes.normalize(index) else {
            return;
        };
        let count = self.palettes.len();
        let current = self.palettes.full_palette(new_index as i64, self.looping);

        let resolved = if self.cross_fade {
            let next_index = if !self.looping && new_index + 1 >= count {
                new_index
            } else {
                (new_index + 1) % count
            };
            let next = self.palettes.full_palette(next_index as i64, self.looping);
            let from = if self.current_palette.is_empty() {
                &current
            } else {
                &self.current_palette
            };
            lerp_colors(from, &next, self.inter_frame_time)
        } else {
            current
        };

        self.current_palette = resolved;
        self.revision = self.revision.wrapping_add(1);

        let previous_index = self.current_index;
        self.current_index = new_index;
        if previous_index != new_index {
            self.inter_frame_time = 0.0;
            let event = SequencerEvent::PaletteChange {
                index: new_index,
                colors: self.current_palette.clone(),
            };
            self.events.emit(&event);
        }
    }

    /// Effective palette at `index` without touching any state.
    pub fn full_palette(&self, index: i64) -> Palette {
        self.palettes.full_palette(index, self.looping)
    }

    /// Re-installs the current index, e.g. after the palettes were edited.
    pub fn refresh(&mut self) {
        self.set_current_palette(self.current_index as i64);
    }

    // -------------------------------
    // MARK: Configuration
    // -------------------------------

    /// Swaps the palette set, keeping the current index when it still fits.
    pub fn set_palettes(&mut self, palettes: PaletteSet) {
        self.current_index = palettes
            .normalize(self.current_index as i64)
            .unwrap_or_default();
        self.palettes = palettes;
        self.refresh();
    }

    pub fn set_frames_per_second(&mut self, fps: f32) -> Result<()> {
        validate_frames_per_second(fps)?;
        self.frames_per_second = fps;
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if !speed.is_finite() {
            return Err(SequencerError::invalid("speed must be a finite number"));
        }
        self.speed = speed;
        Ok(())
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_cross_fade(&mut self, cross_fade: bool) {
        self.cross_fade = cross_fade;
    }

    // -------------------------------
    // MARK: Events
    // -------------------------------

    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&SequencerEvent) + Send + 'static,
    {
        self.events.on(kind, handler);
    }

    pub fn on_any<F>(&mut self, handler: F)
    where
        F: FnMut(&SequencerEvent) + Send + 'static,
    {
        self.events.on_any(handler);
    }

    fn emit_state(&mut self, kind: EventKind) {
        let snapshot = self.snapshot();
        let event = match kind {
            EventKind::Play => SequencerEvent::Play(snapshot),
            EventKind::Step => SequencerEvent::Step(snapshot),
            EventKind::End => SequencerEvent::End(snapshot),
            EventKind::Pause => SequencerEvent::Pause(snapshot),
            EventKind::Reset => SequencerEvent::Reset(snapshot),
            EventKind::PaletteChange => SequencerEvent::PaletteChange {
                index: self.current_index,
                colors: self.current_palette.clone(),
            },
        };
        self.events.emit(&event);
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    pub fn snapshot(&self) -> SequencerSnapshot {
        SequencerSnapshot {
            current_index: self.current_index,
            elapsed_time: self.elapsed_time,
            inter_frame_time: self.inter_frame_time,
            paused: self.paused,
            looping: self.looping,
            cross_fade: self.cross_fade,
        }
    }

    /// Colors most recently installed by [`set_current_palette`](Self::set_current_palette).
    pub fn current_palette(&self) -> &[Color] {
        &self.current_palette
    }

    /// Raw palette at the current index, without padding or blending.
    pub fn selected_palette(&self) -> Option<&Palette> {
        self.palettes.get(self.current_index as i64)
    }

    /// Width every resolved palette is padded to.
    pub fn palette_size(&self) -> usize {
        self.palettes.max_palette_len()
    }

    pub fn palettes(&self) -> &PaletteSet {
        &self.palettes
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn inter_frame_time(&self) -> f32 {
        self.inter_frame_time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn cross_fade(&self) -> bool {
        self.cross_fade
    }

    pub fn frames_per_second(&self) -> f32 {
        self.frames_per_second
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Incremented on every palette install, including blends that keep the
    /// same index.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;

    fn two_tone(looping: bool) -> SequencerConfig {
        SequencerConfig {
            palettes: PaletteSet::new(vec![vec![Color::WHITE], vec![Color::BLACK]]),
            frames_per_second: 1.0,
            looping,
            autostart: true,
            ..Default::default()
        }
    }

    fn with_log(config: SequencerConfig) -> (Sequencer, EventLog) {
        let mut sequencer = Sequencer::new(config).unwrap();
        let log = EventLog::new();
        sequencer.on_any(log.recorder());
        (sequencer, log)
    }

    #[test]
    fn construction_respects_autostart() {
        let playing = Sequencer::new(two_tone(false)).unwrap();
        assert!(!playing.is_paused());

        let paused = Sequencer::new(SequencerConfig {
            autostart: false,
            ..two_tone(false)
        })
        .unwrap();
        assert!(paused.is_paused());
        assert_eq!(paused.current_index(), 0);
        assert_eq!(paused.current_palette(), &[Color::WHITE]);
    }

    #[test]
    fn rejects_invalid_frame_rate() {
        let config = SequencerConfig {
            frames_per_second: 0.0,
            ..two_tone(false)
        };
        assert!(Sequencer::new(config).is_err());

        let mut sequencer = Sequencer::new(two_tone(false)).unwrap();
        assert!(sequencer.set_frames_per_second(-1.0).is_err());
        assert!(sequencer.set_frames_per_second(f32::NAN).is_err());
        assert_eq!(sequencer.frames_per_second(), 1.0);
        assert!(sequencer.set_speed(f32::INFINITY).is_err());
    }

    #[test]
    fn play_and_pause_are_idempotent() {
        let (mut sequencer, log) = with_log(SequencerConfig {
            autostart: false,
            ..two_tone(false)
        });

        sequencer.play();
        sequencer.play();
        sequencer.pause();
        sequencer.pause();

        assert_eq!(log.kinds(), vec![EventKind::Play, EventKind::Pause]);
    }

    #[test]
    fn paused_sequencer_ignores_steps() {
        let (mut sequencer, log) = with_log(SequencerConfig {
            autostart: false,
            ..two_tone(false)
        });

        sequencer.step(1.5);
        assert_eq!(sequencer.elapsed_time(), 0.0);
        assert!(log.events().is_empty());
    }

    #[test]
    fn reset_rewinds_time_but_keeps_index() {
        let (mut sequencer, log) = with_log(two_tone(false));
        sequencer.step(1.5);
        sequencer.reset();

        assert_eq!(sequencer.elapsed_time(), 0.0);
        assert_eq!(sequencer.current_index(), 1);
        assert_eq!(log.kinds().last(), Some(&EventKind::Reset));
    }

    #[test]
    fn single_step_lands_on_second_palette() {
        let (mut sequencer, log) = with_log(two_tone(false));
        sequencer.step(1.5);

        assert_eq!(sequencer.elapsed_time(), 1.5);
        assert_eq!(sequencer.current_index(), 1);
        assert_eq!(sequencer.current_palette(), &[Color::BLACK]);
        assert_eq!(
            log.events(),
            vec![
                SequencerEvent::Step(SequencerSnapshot {
                    current_index: 0,
                    elapsed_time: 1.5,
                    inter_frame_time: 1.5,
                    paused: false,
                    looping: false,
                    cross_fade: false,
                }),
                SequencerEvent::PaletteChange {
                    index: 1,
                    colors: vec![Color::BLACK],
                },
            ]
        );
    }

    #[test]
    fn sentinel_slot_delays_end_by_one_frame() {
        let (mut sequencer, log) = with_log(two_tone(false));

        sequencer.step(1.0);
        sequencer.step(0.5);
        assert_eq!(sequencer.current_index(), 1);
        assert!(!log.kinds().contains(&EventKind::End));

        sequencer.step(0.5);
        assert!(log.kinds().contains(&EventKind::End));
    }

    #[test]
    fn non_looping_end_pauses_on_last_palette() {
        let (mut sequencer, log) = with_log(two_tone(false));
        sequencer.step(1.0);
        log.clear();

        sequencer.step(1.5);

        assert_eq!(
            log.kinds(),
            vec![EventKind::Step, EventKind::End, EventKind::Pause]
        );
        assert!(sequencer.is_paused());
        assert_eq!(sequencer.current_index(), 1);
        assert_eq!(sequencer.elapsed_time(), 0.0);
        assert_eq!(sequencer.current_palette(), &[Color::BLACK]);
    }

    #[test]
    fn looping_end_wraps_to_first_palette() {
        let (mut sequencer, log) = with_log(two_tone(true));
        sequencer.step(1.0);
        assert_eq!(sequencer.current_index(), 1);
        log.clear();

        sequencer.step(1.5);

        assert_eq!(
            log.kinds(),
            vec![EventKind::Step, EventKind::End, EventKind::PaletteChange]
        );
        assert!(!sequencer.is_paused());
        assert_eq!(sequencer.current_index(), 0);
        assert_eq!(sequencer.current_palette(), &[Color::WHITE]);
    }

    #[test]
    fn looping_from_first_palette_skips_redundant_change() {
        let (mut sequencer, log) = with_log(two_tone(true));
        sequencer.step(2.5);

        assert_eq!(log.kinds(), vec![EventKind::Step, EventKind::End]);
        assert_eq!(sequencer.current_index(), 0);
        assert_eq!(sequencer.elapsed_time(), 0.0);
    }

    #[test]
    fn looping_never_leaves_sequencer_paused() {
        let (mut sequencer, _log) = with_log(two_tone(true));
        for _ in 0..50 {
            sequencer.step(0.7);
            assert!(!sequencer.is_paused());
            assert!(sequencer.current_index() < 2);
        }
    }

    #[test]
    fn index_normalization_is_periodic() {
        let mut sequencer = Sequencer::new(SequencerConfig {
            palettes: PaletteSet::new(vec![
                vec![Color::RED],
                vec![Color::GREEN],
                vec![Color::BLUE],
            ]),
            ..Default::default()
        })
        .unwrap();

        for k in -3_i64..4 {
            sequencer.set_current_palette(1 + k * 3);
            assert_eq!(sequencer.current_index(), 1);
            assert_eq!(sequencer.current_palette(), &[Color::GREEN]);
        }
        sequencer.set_current_palette(-1);
        assert_eq!(sequencer.current_index(), 2);
    }

    #[test]
    fn palette_change_fires_only_on_index_change() {
        let (mut sequencer, log) = with_log(two_tone(false));
        sequencer.set_current_palette(0);
        sequencer.set_current_palette(2);
        assert!(log.events().is_empty());

        sequencer.set_current_palette(1);
        assert_eq!(log.kinds(), vec![EventKind::PaletteChange]);
    }

    #[test]
    fn cross_fade_blends_from_installed_palette() {
        let (mut sequencer, log) = with_log(SequencerConfig {
            palettes: PaletteSet::new(vec![vec![Color::RED], vec![Color::BLUE]]),
            frames_per_second: 2.0,
            cross_fade: true,
            autostart: true,
            ..Default::default()
        });
        assert_eq!(sequencer.current_palette(), &[Color::RED]);

        sequencer.step(0.5);

        let purple = Color::new(0.5, 0.0, 0.5, 1.0);
        assert_eq!(sequencer.current_index(), 1);
        assert_eq!(sequencer.current_palette(), &[purple]);
        assert_eq!(sequencer.inter_frame_time(), 0.0);
        assert_eq!(
            log.events().last(),
            Some(&SequencerEvent::PaletteChange {
                index: 1,
                colors: vec![purple],
            })
        );
    }

    #[test]
    fn cross_fade_keeps_blending_within_a_frame() {
        let mut sequencer = Sequencer::new(SequencerConfig {
            palettes: PaletteSet::new(vec![vec![Color::BLACK], vec![Color::WHITE]]),
            frames_per_second: 1.0,
            looping: true,
            cross_fade: true,
            autostart: true,
            ..Default::default()
        })
        .unwrap();
        let before = sequencer.revision();

        sequencer.step(0.25);
        assert_eq!(sequencer.current_index(), 0);
        assert_eq!(sequencer.current_palette(), &[Color::new(0.25, 0.25, 0.25, 1.0)]);
        assert_eq!(sequencer.revision(), before + 1);
    }

    #[test]
    fn empty_palette_set_is_inert() {
        let (mut sequencer, log) = with_log(SequencerConfig {
            palettes: PaletteSet::default(),
            autostart: true,
            ..Default::default()
        });

        sequencer.step(10.0);
        sequencer.set_current_palette(3);

        assert!(log.events().is_empty());
        assert!(sequencer.current_palette().is_empty());
        assert!(sequencer.full_palette(0).is_empty());
        assert_eq!(sequencer.elapsed_time(), 0.0);
    }

    #[test]
    fn set_palettes_reinstalls_current_index() {
        let mut sequencer = Sequencer::new(two_tone(false)).unwrap();
        sequencer.set_current_palette(1);

        sequencer.set_palettes(PaletteSet::new(vec![
            vec![Color::RED],
            vec![Color::GREEN, Color::BLUE],
        ]));
        assert_eq!(sequencer.current_index(), 1);
        assert_eq!(sequencer.current_palette(), &[Color::GREEN, Color::BLUE]);
        assert_eq!(sequencer.selected_palette(), Some(&vec![Color::GREEN, Color::BLUE]));
        assert_eq!(sequencer.palette_size(), 2);

        sequencer.set_palettes(PaletteSet::new(vec![vec![Color::WHITE]]));
        assert_eq!(sequencer.current_index(), 0);
    }

    #[test]
    fn speed_scales_elapsed_time() {
        let mut sequencer = Sequencer::new(SequencerConfig {
            speed: 2.0,
            ..two_tone(false)
        })
        .unwrap();

        sequencer.step(0.5);
        assert_eq!(sequencer.elapsed_time(), 1.0);
        assert_eq!(sequencer.current_index(), 1);
    }

    #[test]
    fn disabling_loop_stops_first_palette_borrowing_from_last() {
        let mut sequencer = Sequencer::new(SequencerConfig {
            palettes: PaletteSet::new(vec![
                vec![Color::RED],
                vec![Color::GREEN, Color::BLUE],
                vec![Color::BLACK, Color::WHITE],
            ]),
            looping: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sequencer.current_palette(), &[Color::RED, Color::WHITE]);

        sequencer.set_looping(false);
        assert_eq!(sequencer.full_palette(0), vec![Color::RED, Color::BLUE]);
        assert_eq!(sequencer.current_palette(), &[Color::RED, Color::WHITE]);

        sequencer.refresh();
        assert!(!sequencer.is_looping());
        assert_eq!(sequencer.current_palette(), &[Color::RED, Color::BLUE]);
    }

    #[test]
    fn enabling_cross_fade_mid_run_blends_next_install() {
        let mut sequencer = Sequencer::new(SequencerConfig {
            palettes: PaletteSet::new(vec![vec![Color::BLACK], vec![Color::WHITE]]),
            frames_per_second: 1.0,
            looping: true,
            autostart: true,
            ..Default::default()
        })
        .unwrap();

        sequencer.step(0.25);
        assert_eq!(sequencer.current_palette(), &[Color::BLACK]);

        sequencer.set_cross_fade(true);
        assert!(sequencer.cross_fade());
        sequencer.step(0.25);

        assert_eq!(sequencer.current_index(), 0);
        assert_eq!(sequencer.current_palette(), &[Color::new(0.5, 0.5, 0.5, 1.0)]);
    }

    #[test]
    fn looping_cross_fade_on_last_palette_heads_back_to_first() {
        let mut sequencer = Sequencer::new(SequencerConfig {
            palettes: PaletteSet::new(vec![
                vec![Color::RED],
                vec![Color::GREEN],
                vec![Color::BLUE],
            ]),
            frames_per_second: 2.0,
            looping: true,
            cross_fade: true,
            autostart: true,
            ..Default::default()
        })
        .unwrap();

        sequencer.step(0.5);
        assert_eq!(sequencer.current_index(), 1);
        assert_eq!(sequencer.current_palette(), &[Color::new(0.5, 0.0, 0.5, 1.0)]);

        sequencer.step(0.5);
        assert_eq!(sequencer.current_index(), 2);
        assert_eq!(sequencer.current_palette(), &[Color::new(0.75, 0.0, 0.25, 1.0)]);
    }
}
