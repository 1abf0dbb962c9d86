//! Capabilities the sequencer drives: the visual stage and the intro media

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::types::MediaError;
use crate::time::Millis;

/// Visual surfaces involved in the handoff
pub trait IntroStage {
    /// Start fading the intro container out over `duration_ms`
    fn begin_fade_out(&mut self, duration_ms: Millis);
    /// Remove the intro container from view
    fn hide_intro(&mut self);
    /// Reveal the main view container
    fn show_main(&mut self);
    /// Offer a "click to play" prompt over the intro
    fn show_play_prompt(&mut self);
    fn dismiss_play_prompt(&mut self);
    /// Show a user-visible notice
    fn show_notice(&mut self, message: &str);
}

/// The intro media element
pub trait IntroMedia {
    /// Request playback; fails when the platform refuses to autoplay
    fn play(&mut self) -> Result<(), MediaError>;
}

/// A stage operation, as recorded by `RecordingStage`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageAction {
    FadeOut(Millis),
    HideIntro,
    ShowMain,
    ShowPlayPrompt,
    DismissPlayPrompt,
    Notice(String),
}

/// Stage that records operations into a shared journal
///
/// The journal handle can be cloned before the stage is moved into a
/// sequencer, so callers can inspect the order of operations afterwards.
#[derive(Debug, Default, Clone)]
pub struct RecordingStage {
    journal: Rc<RefCell<Vec<StageAction>>>,
}

impl RecordingStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Rc<RefCell<Vec<StageAction>>> {
        Rc::clone(&self.journal)
    }

    pub fn actions(&self) -> Vec<StageAction> {
        self.journal.borrow().clone()
    }

    fn record(&self, action: StageAction) {
        self.journal.borrow_mut().push(action);
    }
}

impl IntroStage for RecordingStage {
    fn begin_fade_out(&mut self, duration_ms: Millis) {
        self.record(StageAction::FadeOut(duration_ms));
    }

    fn hide_intro(&mut self) {
        self.record(StageAction::HideIntro);
    }

    fn show_main(&mut self) {
        self.record(StageAction::ShowMain);
    }

    fn show_play_prompt(&mut self) {
        self.record(StageAction::ShowPlayPrompt);
    }

    fn dismiss_play_prompt(&mut self) {
        self.record(StageAction::DismissPlayPrompt);
    }

    fn show_notice(&mut self, message: &str) {
        self.record(StageAction::Notice(message.to_string()));
    }
}

/// Media whose `play` results are scripted in advance
///
/// Each call to `play` consumes the next scripted result; once the script
/// runs out every call succeeds.
#[derive(Debug, Default)]
pub struct ScriptedMedia {
    results: VecDeque<Result<(), MediaError>>,
    play_calls: usize,
}

impl ScriptedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Media that refuses the first playback attempt, like a browser
    /// blocking autoplay until the user interacts
    pub fn autoplay_blocked() -> Self {
        let mut media = Self::new();
        media.push_result(Err(MediaError::PlaybackRefused(
            "autoplay requires user interaction".to_string(),
        )));
        media
    }

    pub fn push_result(&mut self, result: Result<(), MediaError>) {
        self.results.push_back(result);
    }

    pub fn play_calls(&self) -> usize {
        self.play_calls
    }
}

impl IntroMedia for ScriptedMedia {
    fn play(&mut self) -> Result<(), MediaError> {
        self.play_calls += 1;
        self.results.pop_front().unwrap_or(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_stage_shares_journal() {
        let mut stage = RecordingStage::new();
        let journal = stage.journal();

        stage.begin_fade_out(500);
        stage.show_notice("oops");

        assert_eq!(
            *journal.borrow(),
            vec![StageAction::FadeOut(500), StageAction::Notice("oops".into())]
        );
    }

    #[test]
    fn test_scripted_media() {
        let mut media = ScriptedMedia::autoplay_blocked();
        assert!(media.play().is_err());
        assert!(media.play().is_ok());
        assert_eq!(media.play_calls(), 2);
    }
}
