//! Flat JSON key/value store for front-end preferences.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Writes pretty JSON next to `path` and renames it into place.
pub(crate) fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

#[derive(Debug)]
pub struct Settings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl Settings {
    /// Loads the settings file. A missing file gives empty settings; an
    /// unreadable one is moved aside to `<file>.bak.<unix-ts>` first.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    Self::quarantine(&path, "top-level value is not an object")?;
                    Map::new()
                }
                Err(e) => {
                    Self::quarantine(&path, &e.to_string())?;
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}", path.display());
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, values })
    }

    fn quarantine(path: &Path, reason: &str) -> Result<()> {
        let stamp = Utc::now().timestamp();
        let mut backup = Self::sibling(path, &format!(".bak.{}", stamp));
        let mut attempt = 2;
        while backup.exists() {
            backup = Self::sibling(path, &format!(".bak.{}.{}", stamp, attempt));
            attempt += 1;
        }
        fs::rename(path, &backup)?;
        warn!(
            "Settings file {} is corrupt ({}), moved to {}",
            path.display(),
            reason,
            backup.display()
        );
        Ok(())
    }

    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Stores the value and writes the file.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.values.insert(key.to_string(), value.into());
        self.save()
    }

    /// Returns whether the key existed.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        if self.values.remove(key).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &Value::Object(self.values.clone()))?;
        debug!("Saved {} settings to {}", self.values.len(), self.path.display());
        Ok(())
    }

    /// Copies the current settings to `<dir>/<file>.<YYYYmmdd_HHMMSS>.bak`,
    /// defaulting to the settings file's own directory.
    pub fn create_backup(&self, dir: Option<&Path>) -> Result<PathBuf> {
        let dir = dir
            .map(Path::to_path_buf)
            .or_else(|| self.path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "settings.json".to_string());
        let backup = dir.join(format!("{}.{}.bak", file_name, Local::now().format("%Y%m%d_%H%M%S")));

        write_json_atomic(&backup, &Value::Object(self.values.clone()))?;
        info!("Backed up settings to {}", backup.display());
        Ok(backup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(settings.keys().count(), 0);
        assert!(!dir.path().join("settings.json").exists());
    }

    #[test]
    fn set_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::load(&path).unwrap();
        settings.set("theme", "dark").unwrap();
        settings.set("window_width", 1280).unwrap();

        let reloaded = Settings::load(&path).unwrap();
        assert_eq!(reloaded.get_str("theme"), Some("dark"));
        assert_eq!(reloaded.get("window_width"), Some(&json!(1280)));
    }

    #[test]
    fn unknown_keys_survive_a_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"future_feature": {"nested": [1, 2]}}"#).unwrap();

        let mut settings = Settings::load(&path).unwrap();
        settings.set("theme", "light").unwrap();

        let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["future_feature"], json!({"nested": [1, 2]}));
        assert_eq!(on_disk["theme"], "light");
    }

    #[test]
    fn corrupt_file_is_moved_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.keys().count(), 0);
        assert!(!path.exists());

        let quarantined: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("settings.json.bak."))
            .collect();
        assert_eq!(quarantined.len(), 1);
    }

    #[test]
    fn repeated_corruption_keeps_every_copy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        for n in 0..3 {
            fs::write(&path, format!("broken {}", n)).unwrap();
            Settings::load(&path).unwrap();
        }

        let mut kept: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with("settings.json.bak."))
            .map(|p| fs::read_to_string(p).unwrap())
            .collect();
        kept.sort();
        assert_eq!(kept, vec!["broken 0", "broken 1", "broken 2"]);
    }

    #[test]
    fn non_object_file_is_moved_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.keys().count(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn delete_and_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::load(&path).unwrap();
        settings.set("a", true).unwrap();
        settings.set("b", false).unwrap();

        assert!(settings.delete("a").unwrap());
        assert!(!settings.delete("a").unwrap());
        assert_eq!(settings.keys().collect::<Vec<_>>(), vec!["b"]);

        settings.clear().unwrap();
        assert_eq!(Settings::load(&path).unwrap().keys().count(), 0);
    }

    #[test]
    fn backup_copies_current_values() {
        let dir = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let mut settings = Settings::load(dir.path().join("settings.json")).unwrap();
        settings.set("theme", "dark").unwrap();

        let backup = settings.create_backup(Some(backups.path())).unwrap();
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("settings.json."));
        assert!(name.ends_with(".bak"));

        let copied: Value = serde_json::from_str(&fs::read_to_string(&backup).unwrap()).unwrap();
        assert_eq!(copied["theme"], "dark");
    }
}
