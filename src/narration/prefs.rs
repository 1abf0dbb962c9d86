//! Speech parameters and their persistence

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

/// Key under which `VoicePreferences` are persisted
pub const PREFERENCES_KEY: &str = "voiceSettings";

const DEFAULT_RATE: f32 = 0.8;
const DEFAULT_PITCH: f32 = 1.1;
const DEFAULT_VOLUME: f32 = 0.9;

const RATE_RANGE: (f32, f32) = (0.1, 10.0);
const PITCH_RANGE: (f32, f32) = (0.0, 2.0);
const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

/// User-tunable speech parameters
///
/// Fields missing from persisted data take their default values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicePreferences {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoicePreferences {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            pitch: DEFAULT_PITCH,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl VoicePreferences {
    /// Apply the fields present in `patch`
    pub fn merged(&self, patch: VoicePreferencesPatch) -> Self {
        Self {
            rate: patch.rate.unwrap_or(self.rate),
            pitch: patch.pitch.unwrap_or(self.pitch),
            volume: patch.volume.unwrap_or(self.volume),
        }
        .sanitized()
    }

    /// Parse a persisted record and sanitize it
    ///
    /// Only a JSON object is accepted. Arrays would otherwise deserialize
    /// positionally into the fields.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<serde_json::Value>(raw)? {
            serde_json::Value::Object(map) => {
                let prefs: Self = serde_json::from_value(serde_json::Value::Object(map))?;
                Ok(prefs.sanitized())
            }
            _ => Err(serde_json::Error::custom(
                "voice preferences must be a JSON object",
            )),
        }
    }

    /// Clamp each field into its valid range
    ///
    /// Non-finite values fall back to the field's default.
    pub fn sanitized(&self) -> Self {
        Self {
            rate: clamp_or(self.rate, RATE_RANGE, DEFAULT_RATE),
            pitch: clamp_or(self.pitch, PITCH_RANGE, DEFAULT_PITCH),
            volume: clamp_or(self.volume, VOLUME_RANGE, DEFAULT_VOLUME),
        }
    }
}

fn clamp_or(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Partial update to `VoicePreferences`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VoicePreferencesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
}

impl VoicePreferencesPatch {
    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rate.is_none() && self.pitch.is_none() && self.volume.is_none()
    }
}

/// Errors raised by preference stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("preference storage unavailable: {0}")]
    Unavailable(String),
    #[error("preference storage I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Namespaced string storage, the analogue of browser local storage
pub trait PreferenceStore {
    /// Read the value under `key`; `Ok(None)` if absent
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Box<T> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}

/// In-process store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    /// Reject every operation, to simulate unavailable storage
    disabled: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that fails every read and write
    pub fn unavailable() -> Self {
        Self {
            entries: HashMap::new(),
            disabled: true,
        }
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.disabled {
            return Err(StoreError::Unavailable("storage disabled".to_string()));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.disabled {
            return Err(StoreError::Unavailable("storage disabled".to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store keeping one `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PreferenceStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}
