use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smoothness::{
    ProjectFile, SettingsStore, SmoothnessCommand, SmoothnessController, SmoothnessError, TextureSet,
};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Smoothness(#[from] SmoothnessError),
    #[error("Invalid command '{raw}': {source}")]
    InvalidCommand {
        raw: String,
        source: serde_json::Error,
    },
    #[error("Pipeline finished without producing a smoothness map")]
    NoOutput,
}

/// How long a job waits for a processing lock held by someone else
const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Parse JSON-encoded parameter edits, e.g. `{"type":"set_final_bias","params":{"value":0.1}}`
pub fn parse_commands(raw: &[String]) -> Result<Vec<SmoothnessCommand>, CliError> {
    raw.iter()
        .map(|raw| {
            serde_json::from_str(raw).map_err(|source| CliError::InvalidCommand {
                raw: raw.clone(),
                source,
            })
        })
        .collect()
}

/// One smoothness map to generate from files on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateJob {
    /// Diffuse as originally loaded
    pub diffuse: PathBuf,
    /// Edited diffuse, preferred when present
    pub edited_diffuse: Option<PathBuf>,
    pub metallic: Option<PathBuf>,
    /// Project settings to start from
    pub settings: Option<PathBuf>,
    /// Where to write the smoothness map
    pub output: PathBuf,
    /// Edits applied on top of the loaded settings
    pub commands: Vec<SmoothnessCommand>,
    /// Where to write the final settings, if anywhere
    pub save_settings: Option<PathBuf>,
}

/// Summary of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub width: u32,
    pub height: u32,
    pub blur_runs: u64,
    pub composite_runs: u64,
}

impl GenerateJob {
    pub fn run(&self) -> Result<GenerateReport, CliError> {
        let mut textures = TextureSet::new();
        textures.load_diffuse_original(&self.diffuse)?;
        if let Some(path) = &self.edited_diffuse {
            textures.load_diffuse(path)?;
        }
        if let Some(path) = &self.metallic {
            textures.load_metallic(path)?;
        }

        let mut controller = SmoothnessController::new(textures);
        if let Some(path) = &self.settings {
            controller.load_settings(&ProjectFile::new(path.clone())?)?;
        }
        for command in &self.commands {
            controller.apply(command.clone())?;
        }

        controller.run_to_completion_within(LOCK_TIMEOUT)?;
        let map = controller.output().ok_or(CliError::NoOutput)?;
        smoothness::io::save_smoothness_map(&map, &self.output)?;
        info!(path = %self.output.display(), "wrote smoothness map");

        if let Some(path) = &self.save_settings {
            let store = ProjectFile::new(path.clone())?;
            controller.save_settings(&store)?;
        }

        let stats = controller.stats();
        Ok(GenerateReport {
            width: map.width(),
            height: map.height(),
            blur_runs: stats.blur_runs,
            composite_runs: stats.composite_runs,
        })
    }
}

/// Write default project settings to `path`
pub fn init_settings(path: PathBuf) -> Result<(), CliError> {
    let store = ProjectFile::new(path)?;
    store.save(&smoothness::ProjectSettings {
        smoothness: Some(Default::default()),
        material: Some(Default::default()),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smoothness::{ProjectSettings, SampleSlot};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("smoothness-cli-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_parse_commands() {
        let raw = vec![
            r#"{"type":"set_final_bias","params":{"value":0.1}}"#.to_string(),
            r#"{"type":"set_sample_enabled","params":{"slot":"first","enabled":true}}"#.to_string(),
        ];
        let commands = parse_commands(&raw).expect("Should parse");
        assert_eq!(
            commands[1],
            SmoothnessCommand::SetSampleEnabled {
                slot: SampleSlot::First,
                enabled: true
            }
        );
    }

    #[test]
    fn test_parse_invalid_command() {
        let raw = vec![r#"{"type":"set_everything"}"#.to_string()];
        assert!(matches!(parse_commands(&raw), Err(CliError::InvalidCommand { .. })));
    }

    #[test]
    fn test_generate_job_writes_map_and_settings() {
        let diffuse = temp_path("diffuse.png");
        image::RgbaImage::from_pixel(8, 4, image::Rgba([128, 128, 128, 255]))
            .save(&diffuse)
            .expect("Should write diffuse");

        let job = GenerateJob {
            diffuse: diffuse.clone(),
            edited_diffuse: None,
            metallic: None,
            settings: None,
            output: temp_path("smoothness.png"),
            commands: vec![
                SmoothnessCommand::SetBaseSmoothness { value: 0.5 },
                SmoothnessCommand::SetBlurRadius { radius: 2 },
            ],
            save_settings: Some(temp_path("settings.json")),
        };

        let report = job.run().expect("Should generate");
        assert_eq!((report.width, report.height), (8, 4));
        assert_eq!(report.blur_runs, 1);

        let saved = ProjectSettings::from_file(temp_path("settings.json")).expect("Should load settings");
        assert_eq!(saved.smoothness_or_default().blur_radius, 2);

        for path in [diffuse, job.output.clone(), temp_path("settings.json")] {
            let _ = std::fs::remove_file(path);
        }
    }
}
