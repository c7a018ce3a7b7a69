//! Named launch-option snapshots, one JSON file per profile.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LaunchError, Result};
use crate::launch_options::LaunchOptions;
use crate::schema::OptionSchema;
use crate::settings::write_json_atomic;

/// Timestamps are stored as (possibly fractional) unix seconds.
mod unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.timestamp_millis() as f64 / 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", seconds)))
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn unnamed() -> String {
    "Unnamed Profile".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "unnamed")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "unix_seconds", default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "unix_seconds", default = "now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub launch_options: LaunchOptions,
}

impl Profile {
    pub fn new(name: &str, description: &str, launch_options: LaunchOptions) -> Self {
        let created = now();
        Self {
            name: name.to_string(),
            description: description.to_string(),
            created_at: created,
            updated_at: created,
            launch_options,
        }
    }

    pub fn update(&mut self, launch_options: LaunchOptions) {
        self.launch_options = launch_options;
        self.updated_at = now();
    }

    pub fn to_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(value: serde_json::Value, schema: &OptionSchema) -> Result<Self> {
        let mut profile: Profile = serde_json::from_value(value)?;
        profile.launch_options.retain_known(schema);
        Ok(profile)
    }
}

/// Replaces anything but alphanumerics, `_`, `-` and space with `_`.
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || "_- ".contains(c) { c } else { '_' })
        .collect()
}

pub struct ProfileManager {
    profiles_dir: PathBuf,
    schema: OptionSchema,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileManager {
    pub fn new(profiles_dir: impl Into<PathBuf>, schema: &OptionSchema) -> Result<Self> {
        let mut manager = Self {
            profiles_dir: profiles_dir.into(),
            schema: schema.clone(),
            profiles: BTreeMap::new(),
        };
        fs::create_dir_all(&manager.profiles_dir)?;
        manager.reload()?;
        Ok(manager)
    }

    /// Re-reads every profile file, skipping the ones that fail to parse.
    pub fn reload(&mut self) -> Result<()> {
        self.profiles.clear();

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.profiles_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            match self.read_profile(&path) {
                Ok(profile) => {
                    if self.profiles.contains_key(&profile.name) {
                        warn!("Duplicate profile '{}' in {}", profile.name, path.display());
                    }
                    self.profiles.insert(profile.name.clone(), profile);
                }
                Err(e) => warn!("Error loading profile from {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} profiles from {}", self.profiles.len(), self.profiles_dir.display());
        Ok(())
    }

    fn read_profile(&self, path: &Path) -> Result<Profile> {
        let contents = fs::read_to_string(path)?;
        Profile::from_dict(serde_json::from_str(&contents)?, &self.schema)
    }

    fn file_for(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(format!("{}.json", safe_filename(name)))
    }

    fn is_taken(&self, name: &str) -> bool {
        self.profiles.contains_key(name) || self.file_for(name).exists()
    }

    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// All profiles, ordered by name.
    pub fn profiles(&self) -> Vec<&Profile> {
        self.profiles.values().collect()
    }

    /// Writes the profile to its file, replacing any previous version.
    pub fn save_profile(&mut self, profile: Profile) -> Result<()> {
        let path = self.file_for(&profile.name);
        write_json_atomic(&path, &profile.to_dict()?)?;
        info!("Saved profile '{}' to {}", profile.name, path.display());
        self.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    pub fn create_profile(&mut self, name: &str, description: &str, options: &LaunchOptions) -> Result<&Profile> {
        if name.trim().is_empty() {
            return Err(LaunchError::invalid("name", "profile name cannot be empty"));
        }
        if self.is_taken(name) {
            return Err(LaunchError::ProfileExists(name.to_string()));
        }
        self.save_profile(Profile::new(name, description, options.clone()))?;
        self.profiles
            .get(name)
            .ok_or_else(|| LaunchError::ProfileNotFound(name.to_string()))
    }

    pub fn update_profile(&mut self, name: &str, options: &LaunchOptions) -> Result<()> {
        let mut profile = self
            .profiles
            .get(name)
            .cloned()
            .ok_or_else(|| LaunchError::ProfileNotFound(name.to_string()))?;
        profile.update(options.clone());
        self.save_profile(profile)
    }

    /// Writes the profile under its new name, then removes the old file.
    pub fn rename_profile(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }
        if new_name.trim().is_empty() {
            return Err(LaunchError::invalid("name", "profile name cannot be empty"));
        }
        let old_path = self.file_for(old_name);
        let new_path = self.file_for(new_name);
        if self.profiles.contains_key(new_name) || (new_path != old_path && new_path.exists()) {
            return Err(LaunchError::ProfileExists(new_name.to_string()));
        }
        let mut profile = self
            .profiles
            .get(old_name)
            .cloned()
            .ok_or_else(|| LaunchError::ProfileNotFound(old_name.to_string()))?;

        profile.name = new_name.to_string();
        profile.updated_at = now();
        self.save_profile(profile)?;

        if old_path != new_path && old_path.exists() {
            fs::remove_file(&old_path)?;
        }
        self.profiles.remove(old_name);
        Ok(())
    }

    /// Returns `false` when no such profile exists.
    pub fn delete_profile(&mut self, name: &str) -> Result<bool> {
        if !self.profiles.contains_key(name) {
            warn!("Profile not found: {}", name);
            return Ok(false);
        }
        let path = self.file_for(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        self.profiles.remove(name);
        Ok(true)
    }

    /// Reads a profile file and stores it, renaming it if its name is taken.
    pub fn import_profile(&mut self, path: &Path) -> Result<Profile> {
        let mut profile = self.read_profile(path)?;

        if self.is_taken(&profile.name) {
            let original = profile.name.clone();
            let base = format!("{} (Imported {})", original, Utc::now().timestamp());
            let mut candidate = base.clone();
            let mut attempt = 2;
            while self.is_taken(&candidate) {
                candidate = format!("{} {}", base, attempt);
                attempt += 1;
            }
            info!("Renamed imported profile from '{}' to '{}'", original, candidate);
            profile.name = candidate;
        }

        self.save_profile(profile.clone())?;
        Ok(profile)
    }

    pub fn export_profile(&self, name: &str, path: &Path) -> Result<()> {
        let profile = self
            .get_profile(name)
            .ok_or_else(|| LaunchError::ProfileNotFound(name.to_string()))?;
        let contents = serde_json::to_string_pretty(&profile.to_dict()?)?;
        fs::write(path, contents)?;
        info!("Exported profile '{}' to {}", name, path.display());
        Ok(())
    }
}
