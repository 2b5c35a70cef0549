//! Preset storage - one JSON file per named macro

use chrono::{DateTime, Utc};
use macrotap_core::{Action, Error, Notification, Notifier, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Whole-list persistence of named action sequences.
pub trait PresetStore {
    fn save(&self, name: &str, actions: &[Action]) -> Result<()>;
    /// Actions of preset `name`; empty if it was never saved.
    fn load(&self, name: &str) -> Result<Vec<Action>>;
    fn list(&self) -> Result<Vec<String>>;
    fn delete(&self, name: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

pub struct PresetStorage {
    dir: PathBuf,
    notifier: Notifier,
}

impl PresetStorage {
    /// Storage under `~/.macrotap/presets`.
    pub fn new() -> Result<Self> {
        let home = std::env::var("HOME").map_err(|e| Error::storage("locate HOME", e))?;
        Self::with_dir(PathBuf::from(home).join(".macrotap").join("presets"))
    }

    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| Error::storage("create preset dir", e))?;
        Ok(Self {
            dir,
            notifier: Notifier::disabled(),
        })
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self, name: &str) -> bool {
        self.file_for(name).map(|p| p.exists()).unwrap_or(false)
    }

    /// Full preset record, including when it was saved.
    pub fn read(&self, name: &str) -> Result<Preset> {
        let path = self.file_for(name)?;
        if !path.exists() {
            return Err(Error::preset_not_found(name));
        }
        let reader = BufReader::new(File::open(&path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn file_for(&self, name: &str) -> Result<PathBuf> {
        let stem = sanitize(name);
        if stem.is_empty() {
            return Err(Error::invalid_preset_name(name));
        }
        Ok(self.dir.join(format!("{}.json", stem)))
    }
}

impl PresetStore for PresetStorage {
    fn save(&self, name: &str, actions: &[Action]) -> Result<()> {
        let path = self.file_for(name)?;
        let preset = Preset {
            name: sanitize(name),
            saved_at: Utc::now(),
            actions: actions.to_vec(),
        };
        let mut w = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut w, &preset)?;
        w.flush()?;
        debug!("saved {} actions to {}", actions.len(), path.display());
        self.notifier.send(Notification::PresetSaved(preset.name));
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Vec<Action>> {
        match self.read(name) {
            Ok(preset) => Ok(preset.actions),
            Err(e) if e.code == macrotap_core::ErrorCode::PresetNotFound => {
                debug!("preset {} not found, starting empty", name);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => names.push(stem.to_string()),
                None => warn!("skipping unreadable preset file {}", path.display()),
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.file_for(name)?;
        if !path.exists() {
            return Err(Error::preset_not_found(name));
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

/// Keep `[A-Za-z0-9_-]`, replace the rest with `_`. Surrounding whitespace
/// is dropped first so a blank name stays empty.
pub fn sanitize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use macrotap_core::{AbsolutePoint, ErrorCode};

    fn storage() -> (tempfile::TempDir, PresetStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = PresetStorage::with_dir(dir.path()).unwrap();
        (dir, storage)
    }

    #[test]
    fn save_and_load() {
        let (_dir, storage) = storage();
        let actions = vec![
            Action::click(1, AbsolutePoint::new(100.0, 100.0)),
            Action::wait(2, 250),
        ];
        storage.save("daily", &actions).unwrap();
        assert_eq!(storage.load("daily").unwrap(), actions);
        assert_eq!(storage.read("daily").unwrap().name, "daily");
    }

    #[test]
    fn missing_preset_loads_empty() {
        let (_dir, storage) = storage();
        assert!(storage.load("nothing").unwrap().is_empty());
        assert_eq!(
            storage.delete("nothing").unwrap_err().code,
            ErrorCode::PresetNotFound
        );
    }

    #[test]
    fn list_is_sorted_and_ignores_other_files() {
        let (dir, storage) = storage();
        storage.save("zeta", &[]).unwrap();
        storage.save("alpha", &[]).unwrap();
        fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        assert_eq!(storage.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn names_are_sanitized() {
        let (_dir, storage) = storage();
        storage.save("my preset/1", &[]).unwrap();
        assert_eq!(storage.list().unwrap(), vec!["my_preset_1"]);
        assert!(storage.exists("my preset/1"));
        assert_eq!(
            storage.save("   ", &[]).unwrap_err().code,
            ErrorCode::InvalidPresetName
        );
    }

    #[test]
    fn delete_removes_file() {
        let (_dir, storage) = storage();
        storage.save("gone", &[]).unwrap();
        storage.delete("gone").unwrap();
        assert!(storage.list().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let (dir, storage) = storage();
        fs::write(dir.path().join("bad.json"), "{").unwrap();
        assert_eq!(storage.load("bad").unwrap_err().code, ErrorCode::Storage);
    }

    #[test]
    fn save_notifies() {
        let (_dir, storage) = storage();
        let (notifier, rx) = Notifier::channel();
        let storage = storage.with_notifier(notifier);
        storage.save("x", &[]).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Notification::PresetSaved("x".into()));
    }

    #[test]
    fn reads_camel_case_presets() {
        let (dir, storage) = storage();
        let json = r#"{"name":"legacy","savedAt":"2024-05-01T10:00:00Z","actions":[
            {"id":3,"type":"LONG_CLICK","points":[{"x":1.0,"y":2.0}],"duration":900,
             "delayBefore":0,"delayAfter":40,"isEnabled":false}]}"#;
        fs::write(dir.path().join("legacy.json"), json).unwrap();
        let actions = storage.load("legacy").unwrap();
        assert_eq!(actions[0].kind, macrotap_core::ActionKind::LongClick);
        assert_eq!(actions[0].delay_after, 40);
        assert!(!actions[0].enabled);
    }
}
