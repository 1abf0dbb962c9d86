//! Platform speech capability

use super::voice::Voice;

/// Language tag used for every utterance
pub const SPEECH_LANG: &str = "zh-CN";

/// One request to vocalize text
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// Voice to use; `None` means the platform default
    pub voice: Option<Voice>,
}

/// Progress notifications for a submitted utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    Started,
    Ended,
    Error(String),
}

/// Errors raised by a speech platform
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("speech synthesis is not supported")]
    Unsupported,
    #[error("speech platform rejected the utterance: {0}")]
    Rejected(String),
}

/// The process-wide speech engine
///
/// The engine is a shared singleton: callers must `cancel` before `speak`
/// to avoid overlapping utterances.
pub trait SpeechPlatform {
    /// Whether speech synthesis exists at all
    fn is_available(&self) -> bool;
    /// Voices currently known; may be empty until the platform finishes loading
    fn voices(&self) -> Vec<Voice>;
    /// Queue an utterance for playback
    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError>;
    /// Drop the current and all queued utterances
    fn cancel(&mut self);
}

/// Platform that records utterances instead of playing them
#[derive(Debug, Clone)]
pub struct RecordingPlatform {
    available: bool,
    voices: Vec<Voice>,
    spoken: Vec<Utterance>,
    cancels: usize,
    reject_next: Option<String>,
}

impl RecordingPlatform {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            available: true,
            voices,
            spoken: Vec::new(),
            cancels: 0,
            reject_next: None,
        }
    }

    /// A platform without speech synthesis
    pub fn unsupported() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new())
        }
    }

    /// Change the voice list, as a platform does when voices finish loading
    pub fn set_voices(&mut self, voices: Vec<Voice>) {
        self.voices = voices;
    }

    /// Make the next `speak` call fail with `reason`
    pub fn reject_next(&mut self, reason: &str) {
        self.reject_next = Some(reason.to_string());
    }

    pub fn spoken(&self) -> &[Utterance] {
        &self.spoken
    }

    pub fn last_spoken(&self) -> Option<&Utterance> {
        self.spoken.last()
    }

    pub fn cancels(&self) -> usize {
        self.cancels
    }
}

impl SpeechPlatform for RecordingPlatform {
    fn is_available(&self) -> bool {
        self.available
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError> {
        if !self.available {
            return Err(SpeechError::Unsupported);
        }
        if let Some(reason) = self.reject_next.take() {
            return Err(SpeechError::Rejected(reason));
        }
        log::debug!(
            "Speaking {} characters with {}",
            utterance.text.chars().count(),
            utterance
                .voice
                .as_ref()
                .map_or("the default voice", |v| v.name.as_str())
        );
        self.spoken.push(utterance);
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancels += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(text: &str) -> Utterance {
        Utterance {
            text: text.to_string(),
            lang: SPEECH_LANG.to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }

    #[test]
    fn test_recording_platform_records() {
        let mut platform = RecordingPlatform::new(vec![Voice::new("Ting-Ting", "zh-CN")]);
        platform.speak(utterance("你好")).unwrap();
        platform.cancel();

        assert_eq!(platform.spoken().len(), 1);
        assert_eq!(platform.last_spoken().unwrap().text, "你好");
        assert_eq!(platform.cancels(), 1);
        assert_eq!(platform.voices().len(), 1);
    }

    #[test]
    fn test_reject_next() {
        let mut platform = RecordingPlatform::new(Vec::new());
        platform.reject_next("audio device busy");
        assert_eq!(
            platform.speak(utterance("a")),
            Err(SpeechError::Rejected("audio device busy".into()))
        );
        assert!(platform.speak(utterance("b")).is_ok());
    }

    #[test]
    fn test_unsupported_platform() {
        let mut platform = RecordingPlatform::unsupported();
        assert!(!platform.is_available());
        assert_eq!(platform.speak(utterance("a")), Err(SpeechError::Unsupported));
    }
}
