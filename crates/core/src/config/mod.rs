use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Color, PaletteSet, ProcessMode, Result, SequencerError};

/// Highest accepted frame rate.
pub const MAX_FRAMES_PER_SECOND: f32 = 360.0;

/// Construction-time settings for a [`Sequencer`](crate::Sequencer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub palettes: PaletteSet,
    pub frames_per_second: f32,
    pub speed: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub cross_fade: bool,
    pub autostart: bool,
    pub process_mode: ProcessMode,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            palettes: PaletteSet::new(vec![vec![Color::WHITE]]),
            frames_per_second: 24.0,
            speed: 1.0,
            looping: false,
            cross_fade: false,
            autostart: false,
            process_mode: ProcessMode::default(),
        }
    }
}

impl SequencerConfig {
    /// Parses and validates a JSON document. Missing fields use defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_frames_per_second(self.frames_per_second)?;
        if !self.speed.is_finite() {
            return Err(SequencerError::invalid("speed must be a finite number"));
        }
        Ok(())
    }
}

/// Rejects frame rates that would make the frame duration undefined.
pub fn validate_frames_per_second(fps: f32) -> Result<()> {
    if !fps.is_finite() || fps <= 0.0 || fps > MAX_FRAMES_PER_SECOND {
        return Err(SequencerError::invalid(format!(
            "frames_per_second must be in (0, {MAX_FRAMES_PER_SECOND}], got {fps}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config = SequencerConfig::from_json_str(
            r##"{ "palettes": [["#ffffff"], ["#000000"]], "loop": true }"##,
        )
        .unwrap();

        assert_eq!(config.palettes.len(), 2);
        assert!(config.looping);
        assert_eq!(config.frames_per_second, 24.0);
        assert_eq!(config.process_mode, ProcessMode::Idle);
    }

    #[test]
    fn rejects_non_positive_frame_rate() {
        for fps in ["0", "-3", "1000"] {
            let json = format!(r#"{{ "frames_per_second": {fps} }}"#);
            let err = SequencerConfig::from_json_str(&json).unwrap_err();
            assert!(matches!(err, SequencerError::InvalidConfig(_)));
        }
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = SequencerConfig::from_json_str("{ palettes: ").unwrap_err();
        assert!(matches!(err, SequencerError::Json(_)));
    }

    #[test]
    fn saves_and_loads_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "palette-sequencer-config-{}.json",
            std::process::id()
        ));
        let config = SequencerConfig {
            cross_fade: true,
            process_mode: ProcessMode::Fixed,
            ..Default::default()
        };

        config.save(&path).unwrap();
        let loaded = SequencerConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
