use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use earshot_audio::EngineConfig;
use earshot_domain::{IntervalCatalog, TetrachordCatalog};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::drill::{Drill, IntervalDrill, PracticeMode, TetrachordDrill};
use crate::error::TutorError;
use crate::generator::RunLength;
use crate::session::SessionSettings;

/// Practice options, read from YAML. Every field is optional in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PracticeConfig {
    pub mode: PracticeMode,
    pub run_length: u8,
    /// Tetrachord starting notes such as `C4`. All of them when absent.
    pub allowed_starts: Option<Vec<String>>,
    /// Interval names or catalog indices. All of them when absent.
    pub allowed_intervals: Option<Vec<String>>,
    pub tetrachord_advance_ms: u64,
    pub interval_advance_ms: u64,
    pub hint_display_ms: u64,
    pub seed: Option<u64>,
    pub engine: EngineConfig,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            mode: PracticeMode::default(),
            run_length: 4,
            allowed_starts: None,
            allowed_intervals: None,
            tetrachord_advance_ms: 1000,
            interval_advance_ms: 1500,
            hint_display_ms: 5000,
            seed: None,
            engine: EngineConfig::default(),
        }
    }
}

impl PracticeConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, TutorError> {
        let config: Self =
            serde_yaml::from_str(raw).map_err(|err| TutorError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading practice config {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("parsing practice config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), TutorError> {
        RunLength::new(self.run_length)?;
        if self.hint_display_ms == 0 {
            return Err(TutorError::Config("hint_display_ms must be positive".into()));
        }
        self.tetrachord_drill()?;
        self.interval_drill()?;
        Ok(())
    }

    pub fn settings(&self) -> SessionSettings {
        let advance_ms = match self.mode {
            PracticeMode::Tetrachord => self.tetrachord_advance_ms,
            PracticeMode::Interval => self.interval_advance_ms,
        };
        SessionSettings {
            auto_advance: Duration::from_millis(advance_ms),
            hint_display: Duration::from_millis(self.hint_display_ms),
        }
    }

    pub fn tetrachord_drill(&self) -> Result<TetrachordDrill, TutorError> {
        let mut drill = TetrachordDrill::new(TetrachordCatalog::standard()?);
        drill.set_run_length(self.run_length)?;
        if let Some(starts) = &self.allowed_starts {
            let allowed = resolve(&drill, starts)?;
            drill.set_allowed(allowed);
        }
        Ok(drill)
    }

    pub fn interval_drill(&self) -> Result<IntervalDrill, TutorError> {
        let mut drill = IntervalDrill::new(IntervalCatalog::standard()?);
        if let Some(names) = &self.allowed_intervals {
            let allowed = resolve(&drill, names)?;
            drill.set_allowed(allowed);
        }
        Ok(drill)
    }

    /// Seeded when `seed` is set, otherwise from OS entropy.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn resolve<D: Drill>(drill: &D, names: &[String]) -> Result<BTreeSet<D::Item>, TutorError> {
    names
        .iter()
        .map(|name| drill.identify(name).ok_or_else(|| TutorError::unknown(name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn defaults_are_valid() {
        let config = PracticeConfig::default();
        config.validate().unwrap();
        let settings = config.settings();
        assert_eq!(settings.auto_advance, Duration::from_secs(1));
        assert_eq!(settings.hint_display, Duration::from_secs(5));
        assert_eq!(config.tetrachord_drill().unwrap().allowed().len(), 7);
        assert_eq!(config.interval_drill().unwrap().allowed().len(), 13);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config = PracticeConfig::from_yaml_str(
            "mode: interval\nallowed_intervals: [Tritone, octave, \"0\"]\nseed: 12\n",
        )
        .unwrap();
        assert_eq!(config.mode, PracticeMode::Interval);
        assert_eq!(config.run_length, 4);
        assert_eq!(config.settings().auto_advance, Duration::from_millis(1500));
        assert_eq!(config.interval_drill().unwrap().allowed(), vec![0, 6, 12]);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            PracticeConfig::from_yaml_str("run_length: 9"),
            Err(TutorError::InvalidRunLength(9))
        ));
        assert!(matches!(
            PracticeConfig::from_yaml_str("allowed_starts: [C4, H4]"),
            Err(TutorError::UnknownItem(_))
        ));
        assert!(matches!(
            PracticeConfig::from_yaml_str("mode: chords"),
            Err(TutorError::Config(_))
        ));
        assert!(PracticeConfig::from_yaml_str("hint_display_ms: 0").is_err());
    }

    #[test]
    fn seeded_rng_repeats() {
        let config = PracticeConfig {
            seed: Some(99),
            ..Default::default()
        };
        let mut first = config.rng();
        let mut second = config.rng();
        for _ in 0..5 {
            assert_eq!(first.gen::<u64>(), second.gen::<u64>());
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join("earshot-config-that-does-not-exist.yaml");
        let err = PracticeConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("reading practice config"));
    }

    #[test]
    fn load_reads_yaml_file() {
        let path = std::env::temp_dir().join(format!("earshot-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "run_length: 3\nallowed_starts: [c4, d4]\n").unwrap();
        let config = PracticeConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let drill = config.tetrachord_drill().unwrap();
        assert_eq!(drill.run_length().get(), 3);
        assert_eq!(drill.allowed().len(), 2);
    }
}
