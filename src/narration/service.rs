//! Narration service

use super::platform::{SpeechError, SpeechPlatform, Utterance, UtteranceEvent, SPEECH_LANG};
use super::prefs::{
    PreferenceStore, StoreError, VoicePreferences, VoicePreferencesPatch, PREFERENCES_KEY,
};
use super::voice::{Voice, VoiceCatalog};

/// Errors surfaced by the fallible narration operations
#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    #[error("speech synthesis is not available on this platform")]
    Unavailable,
    #[error(transparent)]
    Speech(#[from] SpeechError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("malformed voice preferences: {0}")]
    Format(#[from] serde_json::Error),
}

type SettingsListener = Box<dyn FnMut(&VoicePreferences)>;

/// Speaks text through the platform speech engine
pub struct NarrationService<P: SpeechPlatform, S: PreferenceStore> {
    platform: P,
    store: S,
    settings: VoicePreferences,
    catalog: VoiceCatalog,
    /// Selected voice, resolved against the catalog at speak time
    selected: Option<Voice>,
    speaking: bool,
    listener: Option<SettingsListener>,
}

impl<P: SpeechPlatform, S: PreferenceStore> NarrationService<P, S> {
    /// Load persisted preferences and whatever voices the platform has so far
    ///
    /// Never fails: unreadable or malformed preferences fall back to the
    /// defaults, and an empty voice list is filled in later through
    /// `on_voices_changed`.
    pub fn new(platform: P, store: S) -> Self {
        let settings = match load_preferences(&store) {
            Ok(Some(settings)) => settings,
            Ok(None) => VoicePreferences::default(),
            Err(err) => {
                log::warn!("Failed to load voice settings, using defaults: {}", err);
                VoicePreferences::default()
            }
        };

        let mut service = Self {
            platform,
            store,
            settings,
            catalog: VoiceCatalog::new(),
            selected: None,
            speaking: false,
            listener: None,
        };
        if service.platform.is_available() {
            service.on_voices_changed();
        } else {
            log::warn!("Speech synthesis is not available; narration disabled");
        }
        log::info!(
            "Narration ready (rate {}, pitch {}, volume {})",
            service.settings.rate,
            service.settings.pitch,
            service.settings.volume
        );
        service
    }

    /// Re-read the platform voice list and re-run voice selection
    pub fn on_voices_changed(&mut self) {
        self.catalog.replace(self.platform.voices());
        self.selected = self.catalog.select().cloned();

        let chinese: Vec<&str> = self
            .catalog
            .chinese_voices()
            .map(|v| v.name.as_str())
            .collect();
        log::debug!("Chinese voices: {:?}", chinese);
        match &self.selected {
            Some(voice) => log::info!("Selected voice: {} ({})", voice.name, voice.lang),
            None if self.catalog.is_empty() => log::debug!("Voice list not loaded yet"),
            None => log::info!("No Chinese voice found; using the platform default"),
        }
    }

    /// Speak `text`, replacing anything currently being spoken
    ///
    /// Returns whether the utterance was handed to the platform. Failures
    /// are logged, never propagated.
    pub fn synthesize(&mut self, text: &str) -> bool {
        match self.try_synthesize(text) {
            Ok(()) => true,
            Err(err) => {
                log::error!("Speech synthesis failed: {}", err);
                false
            }
        }
    }

    /// Fallible form of `synthesize`
    pub fn try_synthesize(&mut self, text: &str) -> Result<(), NarrationError> {
        if !self.platform.is_available() {
            return Err(NarrationError::Unavailable);
        }

        self.platform.cancel();
        self.speaking = false;

        let utterance = Utterance {
            text: text.to_string(),
            lang: SPEECH_LANG.to_string(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            volume: self.settings.volume,
            voice: self.selected_voice().cloned(),
        };
        self.platform.speak(utterance)?;
        Ok(())
    }

    /// Stop all current and queued speech
    pub fn stop(&mut self) {
        if self.platform.is_available() {
            self.platform.cancel();
        }
        self.speaking = false;
    }

    /// Merge `patch` into the settings and persist them
    ///
    /// Utterances already submitted keep their original parameters.
    pub fn update_settings(&mut self, patch: VoicePreferencesPatch) {
        self.settings = self.settings.merged(patch);
        if let Err(err) = self.save_settings() {
            log::warn!("Failed to save voice settings: {}", err);
        }
        self.notify_listener();
    }

    fn save_settings(&mut self) -> Result<(), NarrationError> {
        let json = serde_json::to_string(&self.settings)?;
        self.store.save(PREFERENCES_KEY, &json)?;
        Ok(())
    }

    /// Observe the effective settings
    ///
    /// The listener is called right away and again after every update.
    pub fn set_settings_listener(&mut self, listener: impl FnMut(&VoicePreferences) + 'static) {
        self.listener = Some(Box::new(listener));
        self.notify_listener();
    }

    fn notify_listener(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.settings);
        }
    }

    /// Track playback progress reported by the platform
    pub fn handle_utterance_event(&mut self, event: UtteranceEvent) {
        match event {
            UtteranceEvent::Started => {
                self.speaking = true;
                log::debug!("Speech started");
            }
            UtteranceEvent::Ended => {
                self.speaking = false;
                log::debug!("Speech ended");
            }
            UtteranceEvent::Error(reason) => {
                self.speaking = false;
                log::warn!("Speech playback error: {}", reason);
            }
        }
    }

    pub fn settings(&self) -> VoicePreferences {
        self.settings
    }

    /// The selected voice, if it is still in the catalog
    pub fn selected_voice(&self) -> Option<&Voice> {
        self.selected
            .as_ref()
            .and_then(|voice| self.catalog.resolve(voice))
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

fn load_preferences(
    store: &impl PreferenceStore,
) -> Result<Option<VoicePreferences>, NarrationError> {
    let Some(raw) = store.load(PREFERENCES_KEY)? else {
        return Ok(None);
    };
    Ok(Some(VoicePreferences::from_json(&raw)?))
}
