//! Core types for the intro sequencer

use std::fmt;

use crate::time::Millis;

/// Progress of the intro-to-main-view handoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    /// Intro is showing; no trigger has fired yet
    #[default]
    Pending,
    /// A trigger fired; fade and activation are underway
    Transitioning,
    /// Handoff finished (successfully or not); terminal
    Complete,
}

/// Why the transition started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    MediaEnded,
    UserSkip,
    ContainerClick,
    Timeout,
    VisibilityHidden,
    MediaError,
}

impl TriggerSource {
    /// Every trigger source, in declaration order
    pub const ALL: [TriggerSource; 6] = [
        TriggerSource::MediaEnded,
        TriggerSource::UserSkip,
        TriggerSource::ContainerClick,
        TriggerSource::Timeout,
        TriggerSource::VisibilityHidden,
        TriggerSource::MediaError,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerSource::MediaEnded => "media ended",
            TriggerSource::UserSkip => "skip button",
            TriggerSource::ContainerClick => "intro clicked",
            TriggerSource::Timeout => "fallback timeout",
            TriggerSource::VisibilityHidden => "page hidden",
            TriggerSource::MediaError => "media error",
        };
        f.write_str(name)
    }
}

/// Set of attached trigger sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerSet(u8);

impl TriggerSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        TriggerSource::ALL.iter().copied().collect()
    }

    pub fn insert(&mut self, source: TriggerSource) {
        self.0 |= source.bit();
    }

    pub fn contains(&self, source: TriggerSource) -> bool {
        self.0 & source.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<TriggerSource> for TriggerSet {
    fn from_iter<I: IntoIterator<Item = TriggerSource>>(iter: I) -> Self {
        let mut set = TriggerSet::empty();
        for source in iter {
            set.insert(source);
        }
        set
    }
}

/// Outcome of the main-view activation callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationOutcome {
    /// Not invoked yet
    #[default]
    Pending,
    Activated,
    Failed,
}

/// Signals reported by the intro media element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// Enough data buffered to begin playback
    CanPlay,
    /// First frame loaded; playback is attempted here
    LoadedData,
    /// Playback reached the end
    Ended,
    /// Media failed to load or decode
    Error(String),
}

/// User interaction with the intro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    /// The dedicated skip button
    SkipButton,
    /// A click anywhere on the intro container
    ContainerClick {
        /// Whether the click landed on the skip button itself
        on_skip_button: bool,
    },
    /// The "click to play" prompt shown when autoplay is refused
    PlayPrompt,
}

/// Errors reported by the intro media
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("playback refused: {0}")]
    PlaybackRefused(String),
}

/// Notice shown when the main view fails to initialize
pub const DEFAULT_FAILURE_NOTICE: &str = "地图加载失败，请刷新页面重试";

/// Timing and behavior of the handoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroConfig {
    /// Duration of the intro fade-out
    pub fade_ms: Millis,
    /// Delay between successful activation and the post-activation callback
    pub settle_ms: Millis,
    /// Ceiling after which the intro is abandoned
    pub fallback_timeout_ms: Millis,
    /// Hand off immediately when the media fails instead of fading
    pub skip_fade_on_media_error: bool,
    /// Text of the activation failure notice
    pub failure_notice: String,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            fade_ms: 500,
            settle_ms: 1000,
            fallback_timeout_ms: 10_000,
            skip_fade_on_media_error: true,
            failure_notice: DEFAULT_FAILURE_NOTICE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_state_default() {
        assert_eq!(TransitionState::default(), TransitionState::Pending);
    }

    #[test]
    fn test_trigger_set() {
        let mut set = TriggerSet::empty();
        assert!(set.is_empty());

        set.insert(TriggerSource::UserSkip);
        assert!(set.contains(TriggerSource::UserSkip));
        assert!(!set.contains(TriggerSource::Timeout));

        let all = TriggerSet::all();
        assert!(TriggerSource::ALL.iter().all(|s| all.contains(*s)));
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(TriggerSource::Timeout.to_string(), "fallback timeout");
        assert_eq!(TriggerSource::UserSkip.to_string(), "skip button");
    }

    #[test]
    fn test_media_error_display() {
        let err = MediaError::PlaybackRefused("autoplay blocked".into());
        assert_eq!(err.to_string(), "playback refused: autoplay blocked");
    }

    #[test]
    fn test_intro_config_default() {
        let config = IntroConfig::default();
        assert_eq!(config.fade_ms, 500);
        assert_eq!(config.settle_ms, 1000);
        assert_eq!(config.fallback_timeout_ms, 10_000);
        assert!(config.skip_fade_on_media_error);
    }
}
