use super::{Settings, SettingsPersistence};
use crate::constants::SETTINGS_FILE_NAME;
use crate::error::WakefulError;
use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Settings stored as a JSON document on disk.
pub struct JsonFileSettings {
    path: PathBuf,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.json` inside the platform config directory.
    pub fn default_location() -> Result<Self, WakefulError> {
        let proj_dirs =
            ProjectDirs::from("com", "wakeful", "Wakeful").ok_or(WakefulError::NoSettingsDir)?;
        Ok(Self::new(proj_dirs.config_dir().join(SETTINGS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsPersistence for JsonFileSettings {
    fn load(&self) -> Result<Option<Settings>, WakefulError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, settings: &Settings) -> Result<(), WakefulError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
