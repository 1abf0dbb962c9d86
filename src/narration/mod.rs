//! Text-to-speech narration
//!
//! Wraps the platform speech capability with a fixed voice-selection policy
//! and persisted, user-tunable speech parameters.
//!
//! # Architecture
//!
//! - `platform`: the injected speech capability and the utterance type
//! - `voice`: the voice catalog and the Chinese-voice selection policy
//! - `prefs`: speech parameters and the stores that persist them
//! - `service`: `NarrationService`, tying the three together
//!
//! Narration is cosmetic. Speech and storage failures are logged and
//! swallowed; none of them reach the caller as a panic or hard error.

pub mod platform;
pub mod prefs;
pub mod service;
pub mod voice;

pub use platform::{
    RecordingPlatform, SpeechError, SpeechPlatform, Utterance, UtteranceEvent, SPEECH_LANG,
};
pub use prefs::{
    FileStore, MemoryStore, PreferenceStore, StoreError, VoicePreferences, VoicePreferencesPatch,
    PREFERENCES_KEY,
};
pub use service::{NarrationError, NarrationService};
pub use voice::{select_voice, Voice, VoiceCatalog, VOICE_PRIORITY};
