use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Result, SmoothnessError},
    traits::SettingsStore,
    types::{clamp_f32, ranges, SmoothnessParameters},
};

const MULTIPLIER: RangeInclusive<f32> = 0.0..=3.0;
const DISPLACEMENT: RangeInclusive<f32> = 0.0..=5.0;
const TILING: RangeInclusive<f32> = 0.1..=5.0;
const OFFSET: RangeInclusive<f32> = -1.0..=1.0;
const EXPOSURE: RangeInclusive<f32> = 0.0..=30.0;

/// Material preview tuning stored next to the smoothness parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MaterialSettings {
    pub metallic_multiplier: f32,
    pub normal_scale: f32,
    pub smoothness_multiplier: f32,
    pub ao_multiplier: f32,
    pub displacement_strength: f32,
    /// Texture tiling (x, y)
    pub tiling: [f32; 2],
    /// Texture offset (x, y)
    pub offset: [f32; 2],
    /// Preview light color, RGB
    pub light_color: [f32; 3],
    pub light_exposure: f32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            metallic_multiplier: 1.0,
            normal_scale: 1.0,
            smoothness_multiplier: 1.0,
            ao_multiplier: 1.0,
            displacement_strength: 0.5,
            tiling: [1.0, 1.0],
            offset: [0.0, 0.0],
            light_color: [1.0, 1.0, 1.0],
            light_exposure: 1.0,
        }
    }
}

impl MaterialSettings {
    /// Bring every field into the range the editing controls allow
    pub fn clamp(&mut self) {
        self.metallic_multiplier = clamp_f32(self.metallic_multiplier, &MULTIPLIER);
        self.normal_scale = clamp_f32(self.normal_scale, &MULTIPLIER);
        self.smoothness_multiplier = clamp_f32(self.smoothness_multiplier, &MULTIPLIER);
        self.ao_multiplier = clamp_f32(self.ao_multiplier, &MULTIPLIER);
        self.displacement_strength = clamp_f32(self.displacement_strength, &DISPLACEMENT);
        for value in &mut self.tiling {
            *value = clamp_f32(*value, &TILING);
        }
        for value in &mut self.offset {
            *value = clamp_f32(*value, &OFFSET);
        }
        for value in &mut self.light_color {
            *value = clamp_f32(*value, &ranges::UNIT);
        }
        self.light_exposure = clamp_f32(self.light_exposure, &EXPOSURE);
    }
}

/// Settings saved with a project; absent sections restore to defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothness: Option<SmoothnessParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialSettings>,
}

impl ProjectSettings {
    /// Smoothness parameters, defaulted and clamped
    pub fn smoothness_or_default(&self) -> SmoothnessParameters {
        self.smoothness.clone().unwrap_or_default().clamped()
    }

    /// Material settings, defaulted and clamped
    pub fn material_or_default(&self) -> MaterialSettings {
        let mut material = self.material.clone().unwrap_or_default();
        material.clamp();
        material
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Convert settings to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load settings from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Convert settings to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Auto-detect file format and load settings
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = SettingsFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        match format {
            SettingsFormat::Toml => Self::from_toml(&content),
            SettingsFormat::Json => Self::from_json(&content),
        }
    }

    /// Auto-detect file format and save settings
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match SettingsFormat::from_path(path)? {
            SettingsFormat::Toml => self.to_toml()?,
            SettingsFormat::Json => self.to_json()?,
        };
        fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingsFormat {
    Toml,
    Json,
}

impl SettingsFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(SmoothnessError::UnsupportedFileFormat),
        }
    }
}

/// Project settings stored in a single `.json` or `.toml` file
#[derive(Debug, Clone)]
pub struct ProjectFile {
    path: PathBuf,
}

impl ProjectFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        SettingsFormat::from_path(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for ProjectFile {
    fn load(&self) -> Result<Option<ProjectSettings>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no project settings saved yet");
            return Ok(None);
        }
        let settings = ProjectSettings::from_file(&self.path)?;
        info!(path = %self.path.display(), "loaded project settings");
        Ok(Some(settings))
    }

    fn save(&self, settings: &ProjectSettings) -> Result<()> {
        settings.to_file(&self.path)?;
        info!(path = %self.path.display(), "saved project settings");
        Ok(())
    }
}
