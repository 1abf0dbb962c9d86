//! Intro sequencer
//!
//! Races the intro's end signals against each other and runs the handoff to
//! the main view exactly once:
//!
//! ```text
//! Pending --(any trigger)--> Transitioning --(fade, activate, settle)--> Complete
//! ```
//!
//! Triggers arriving after the first one are absorbed. Once started, the
//! transition cannot be cancelled.

use super::stage::{IntroMedia, IntroStage};
use super::types::{
    ActivationOutcome, IntroConfig, MediaEvent, TransitionState, TriggerSet, TriggerSource,
    UserInput,
};
use crate::time::{Millis, TimerId, TimerQueue};

/// Main-view activation; runs at most once
pub type ActivateFn = Box<dyn FnOnce() -> anyhow::Result<()>>;

/// Post-activation step; runs at most once, only after successful activation
pub type ActivatedFn = Box<dyn FnOnce()>;

/// Timers owned by the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntroTimer {
    Fallback,
    FadeComplete,
    Settle,
}

pub struct IntroSequencer<S: IntroStage, M: IntroMedia> {
    config: IntroConfig,
    stage: S,
    media: M,

    state: TransitionState,
    /// The trigger that started the transition
    trigger: Option<TriggerSource>,
    activation: ActivationOutcome,
    attached: TriggerSet,
    started: bool,
    prompt_visible: bool,

    activate: Option<ActivateFn>,
    on_activated: Option<ActivatedFn>,

    timers: TimerQueue<IntroTimer>,
    fallback: Option<TimerId>,
}

impl<S: IntroStage, M: IntroMedia> IntroSequencer<S, M> {
    pub fn new(
        config: IntroConfig,
        stage: S,
        media: M,
        activate: impl FnOnce() -> anyhow::Result<()> + 'static,
        on_activated: impl FnOnce() + 'static,
    ) -> Self {
        Self {
            config,
            stage,
            media,
            state: TransitionState::Pending,
            trigger: None,
            activation: ActivationOutcome::Pending,
            attached: TriggerSet::empty(),
            started: false,
            prompt_visible: false,
            activate: Some(Box::new(activate)),
            on_activated: Some(Box::new(on_activated)),
            timers: TimerQueue::new(),
            fallback: None,
        }
    }

    /// Listen for the given trigger sources
    ///
    /// Events from sources that are never attached are ignored.
    pub fn attach_triggers(&mut self, sources: &[TriggerSource]) {
        for &source in sources {
            self.attached.insert(source);
        }
    }

    /// Begin the intro: attach defaults and arm the fallback timer
    ///
    /// If no sources were attached beforehand, all of them are. Calling
    /// `start` more than once has no effect.
    pub fn start(&mut self, now: Millis) {
        if self.started {
            return;
        }
        self.started = true;

        if self.attached.is_empty() {
            self.attached = TriggerSet::all();
        }

        if self.attached.contains(TriggerSource::Timeout) && self.state == TransitionState::Pending
        {
            self.fallback = Some(self.timers.schedule_after(
                now,
                self.config.fallback_timeout_ms,
                IntroTimer::Fallback,
            ));
        }
        log::info!(
            "Intro started; falling back to the main view after {}ms",
            self.config.fallback_timeout_ms
        );
    }

    /// Start the transition unless one has already begun
    ///
    /// Returns `true` if this call started the transition.
    pub fn request_transition(&mut self, source: TriggerSource, now: Millis) -> bool {
        if self.state != TransitionState::Pending {
            log::debug!(
                "Ignoring {} trigger; transition is {:?}",
                source,
                self.state
            );
            return false;
        }

        self.state = TransitionState::Transitioning;
        self.trigger = Some(source);
        if let Some(id) = self.fallback.take() {
            self.timers.cancel(id);
        }
        log::info!("Leaving intro ({})", source);

        if source == TriggerSource::MediaError && self.config.skip_fade_on_media_error {
            self.hand_off(now);
        } else {
            self.stage.begin_fade_out(self.config.fade_ms);
            self.timers
                .schedule_after(now, self.config.fade_ms, IntroTimer::FadeComplete);
        }
        true
    }

    /// Fire every timer due at `now`
    pub fn advance(&mut self, now: Millis) {
        for (_, timer) in self.timers.take_due(now) {
            match timer {
                IntroTimer::Fallback => {
                    self.fallback = None;
                    log::info!(
                        "Intro still showing after {}ms",
                        self.config.fallback_timeout_ms
                    );
                    self.request_transition(TriggerSource::Timeout, now);
                }
                IntroTimer::FadeComplete => self.hand_off(now),
                IntroTimer::Settle => {
                    if let Some(on_activated) = self.on_activated.take() {
                        log::debug!("Running post-activation step");
                        on_activated();
                    }
                    self.finish();
                }
            }
        }
    }

    /// Swap the intro for the main view and activate it
    fn hand_off(&mut self, now: Millis) {
        self.stage.hide_intro();
        self.stage.show_main();

        let Some(activate) = self.activate.take() else {
            self.finish();
            return;
        };

        match activate() {
            Ok(()) => {
                self.activation = ActivationOutcome::Activated;
                log::info!("Main view activated");
                self.timers
                    .schedule_after(now, self.config.settle_ms, IntroTimer::Settle);
            }
            Err(err) => {
                self.activation = ActivationOutcome::Failed;
                log::error!("Main view failed to initialize: {:#}", err);
                self.stage.show_notice(&self.config.failure_notice);
                self.finish();
            }
        }
    }

    fn finish(&mut self) {
        self.state = TransitionState::Complete;
        log::debug!("Intro sequence complete");
    }

    /// Route a media element signal
    pub fn handle_media_event(&mut self, event: MediaEvent, now: Millis) {
        match event {
            MediaEvent::CanPlay => log::debug!("Intro media can play"),
            MediaEvent::LoadedData => {
                log::debug!("Intro media loaded");
                if self.state != TransitionState::Pending {
                    return;
                }
                if let Err(err) = self.media.play() {
                    log::info!("Intro autoplay refused: {}", err);
                    if !self.prompt_visible {
                        self.prompt_visible = true;
                        self.stage.show_play_prompt();
                    }
                }
            }
            MediaEvent::Ended => {
                self.fire(TriggerSource::MediaEnded, now);
            }
            MediaEvent::Error(reason) => {
                log::warn!("Intro media failed: {}", reason);
                self.fire(TriggerSource::MediaError, now);
            }
        }
    }

    /// Route a user interaction
    pub fn handle_input(&mut self, input: UserInput, now: Millis) {
        match input {
            UserInput::SkipButton => {
                self.fire(TriggerSource::UserSkip, now);
            }
            UserInput::ContainerClick {
                on_skip_button: true,
            } => {
                // The skip button reports its own click.
            }
            UserInput::ContainerClick {
                on_skip_button: false,
            } => {
                self.fire(TriggerSource::ContainerClick, now);
            }
            UserInput::PlayPrompt => {
                if !self.prompt_visible {
                    return;
                }
                match self.media.play() {
                    Ok(()) => {
                        self.prompt_visible = false;
                        self.stage.dismiss_play_prompt();
                    }
                    Err(err) => log::warn!("Intro playback still refused: {}", err),
                }
            }
        }
    }

    /// Report a change in host page visibility
    pub fn visibility_changed(&mut self, hidden: bool, now: Millis) {
        if hidden && self.state == TransitionState::Pending {
            self.fire(TriggerSource::VisibilityHidden, now);
        }
    }

    fn fire(&mut self, source: TriggerSource, now: Millis) -> bool {
        if !self.attached.contains(source) {
            log::debug!("Trigger {} is not attached", source);
            return false;
        }
        self.request_transition(source, now)
    }

    #[inline]
    pub fn state(&self) -> TransitionState {
        self.state
    }

    #[inline]
    pub fn trigger(&self) -> Option<TriggerSource> {
        self.trigger
    }

    #[inline]
    pub fn activation(&self) -> ActivationOutcome {
        self.activation
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.state == TransitionState::Complete
    }

    pub fn is_prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// When the next timer is due, if any
    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn media(&self) -> &M {
        &self.media
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::intro::{RecordingStage, ScriptedMedia, StageAction};

    struct Harness {
        seq: IntroSequencer<RecordingStage, ScriptedMedia>,
        activations: Rc<Cell<u32>>,
        post: Rc<Cell<u32>>,
    }

    fn harness_with(media: ScriptedMedia, fail: bool) -> Harness {
        let activations = Rc::new(Cell::new(0));
        let post = Rc::new(Cell::new(0));
        let a = Rc::clone(&activations);
        let p = Rc::clone(&post);
        let seq = IntroSequencer::new(
            IntroConfig::default(),
            RecordingStage::new(),
            media,
            move || {
                a.set(a.get() + 1);
                if fail {
                    anyhow::bail!("map data missing");
                }
                Ok(())
            },
            move || p.set(p.get() + 1),
        );
        Harness {
            seq,
            activations,
            post,
        }
    }

    fn harness() -> Harness {
        harness_with(ScriptedMedia::new(), false)
    }

    #[test]
    fn test_media_end_runs_full_handoff() {
        let mut h = harness();
        h.seq.start(0);
        h.seq.handle_media_event(MediaEvent::Ended, 3_000);

        assert_eq!(h.seq.state(), TransitionState::Transitioning);
        assert_eq!(h.seq.trigger(), Some(TriggerSource::MediaEnded));
        assert_eq!(h.seq.next_deadline(), Some(3_500));

        h.seq.advance(3_500);
        assert_eq!(h.activations.get(), 1);
        assert_eq!(h.post.get(), 0);
        assert_eq!(h.seq.activation(), ActivationOutcome::Activated);

        h.seq.advance(4_499);
        assert_eq!(h.post.get(), 0);
        h.seq.advance(4_500);
        assert_eq!(h.post.get(), 1);
        assert!(h.seq.is_complete());

        assert_eq!(
            h.seq.stage().actions(),
            vec![
                StageAction::FadeOut(500),
                StageAction::HideIntro,
                StageAction::ShowMain
            ]
        );
    }

    #[test]
    fn test_duplicate_triggers_are_absorbed() {
        let mut h = harness();
        h.seq.start(0);
        h.seq.handle_input(UserInput::SkipButton, 100);
        h.seq.handle_input(UserInput::SkipButton, 150);
        h.seq.handle_media_event(MediaEvent::Ended, 200);
        h.seq.visibility_changed(true, 250);

        assert_eq!(h.seq.trigger(), Some(TriggerSource::UserSkip));
        h.seq.advance(10_000);
        h.seq.advance(20_000);

        assert_eq!(h.activations.get(), 1);
        assert_eq!(h.post.get(), 1);
        let fades = h
            .seq
            .stage()
            .actions()
            .iter()
            .filter(|a| matches!(a, StageAction::FadeOut(_)))
            .count();
        assert_eq!(fades, 1);
    }

    #[test]
    fn test_fallback_timeout() {
        let mut h = harness();
        h.seq.start(1_000);
        assert_eq!(h.seq.next_deadline(), Some(11_000));

        h.seq.advance(10_999);
        assert_eq!(h.seq.state(), TransitionState::Pending);

        h.seq.advance(11_000);
        assert_eq!(h.seq.trigger(), Some(TriggerSource::Timeout));
        h.seq.advance(11_500);
        h.seq.advance(12_500);
        assert!(h.seq.is_complete());
        assert_eq!(h.post.get(), 1);
    }

    #[test]
    fn test_fallback_cancelled_by_earlier_trigger() {
        let mut h = harness();
        h.seq.start(0);
        h.seq.handle_input(UserInput::ContainerClick { on_skip_button: false }, 2_000);
        h.seq.advance(2_500);
        h.seq.advance(3_500);
        assert!(h.seq.is_complete());

        h.seq.advance(10_000);
        assert_eq!(h.seq.trigger(), Some(TriggerSource::ContainerClick));
        assert_eq!(h.seq.next_deadline(), None);
        assert_eq!(h.activations.get(), 1);
    }

    #[test]
    fn test_activation_failure_still_completes() {
        let mut h = harness_with(ScriptedMedia::new(), true);
        h.seq.start(0);
        h.seq.handle_input(UserInput::SkipButton, 0);
        h.seq.advance(500);

        assert!(h.seq.is_complete());
        assert_eq!(h.seq.activation(), ActivationOutcome::Failed);
        assert_eq!(h.activations.get(), 1);

        h.seq.advance(5_000);
        assert_eq!(h.post.get(), 0);
        assert_eq!(
            h.seq.stage().actions().last(),
            Some(&StageAction::Notice(DEFAULT_NOTICE.to_string()))
        );
    }

    const DEFAULT_NOTICE: &str = crate::intro::DEFAULT_FAILURE_NOTICE;

    #[test]
    fn test_media_error_skips_fade() {
        let mut h = harness();
        h.seq.start(0);
        h.seq
            .handle_media_event(MediaEvent::Error("decode failed".into()), 50);

        assert_eq!(h.activations.get(), 1);
        assert_eq!(
            h.seq.stage().actions(),
            vec![StageAction::HideIntro, StageAction::ShowMain]
        );
        h.seq.advance(1_050);
        assert!(h.seq.is_complete());
    }

    #[test]
    fn test_media_error_with_fade() {
        let mut config = IntroConfig::default();
        config.skip_fade_on_media_error = false;
        let mut seq = IntroSequencer::new(
            config,
            RecordingStage::new(),
            ScriptedMedia::new(),
            || Ok(()),
            || {},
        );
        seq.start(0);
        seq.handle_media_event(MediaEvent::Error("404".into()), 0);
        assert_eq!(seq.stage().actions(), vec![StageAction::FadeOut(500)]);
    }

    #[test]
    fn test_hidden_page_triggers_transition() {
        let mut h = harness();
        h.seq.start(0);
        h.seq.visibility_changed(false, 10);
        assert_eq!(h.seq.state(), TransitionState::Pending);

        h.seq.visibility_changed(true, 20);
        assert_eq!(h.seq.trigger(), Some(TriggerSource::VisibilityHidden));
    }

    #[test]
    fn test_click_on_skip_button_is_not_container_click() {
        let mut h = harness();
        h.seq.start(0);
        h.seq
            .handle_input(UserInput::ContainerClick { on_skip_button: true }, 10);
        assert_eq!(h.seq.state(), TransitionState::Pending);
    }

    #[test]
    fn test_unattached_sources_are_ignored() {
        let mut h = harness();
        h.seq.attach_triggers(&[TriggerSource::MediaEnded]);
        h.seq.start(0);

        h.seq.handle_input(UserInput::SkipButton, 10);
        h.seq.visibility_changed(true, 20);
        assert_eq!(h.seq.state(), TransitionState::Pending);
        // Timeout was not attached, so nothing is armed
        assert_eq!(h.seq.next_deadline(), None);

        h.seq.handle_media_event(MediaEvent::Ended, 30);
        assert_eq!(h.seq.trigger(), Some(TriggerSource::MediaEnded));
    }

    #[test]
    fn test_autoplay_refused_shows_prompt() {
        let mut h = harness_with(ScriptedMedia::autoplay_blocked(), false);
        h.seq.start(0);
        h.seq.handle_media_event(MediaEvent::CanPlay, 5);
        h.seq.handle_media_event(MediaEvent::LoadedData, 10);
        assert!(h.seq.is_prompt_visible());

        h.seq.handle_input(UserInput::PlayPrompt, 500);
        assert!(!h.seq.is_prompt_visible());
        assert_eq!(h.seq.media().play_calls(), 2);
        assert_eq!(
            h.seq.stage().actions(),
            vec![StageAction::ShowPlayPrompt, StageAction::DismissPlayPrompt]
        );
        assert_eq!(h.seq.state(), TransitionState::Pending);
    }

    #[test]
    fn test_activation_happens_after_fade_and_swap() {
        let stage = RecordingStage::new();
        let journal = stage.journal();
        let seen = Rc::new(Cell::new(0usize));
        let s = Rc::clone(&seen);

        let mut seq = IntroSequencer::new(
            IntroConfig::default(),
            stage,
            ScriptedMedia::new(),
            move || {
                s.set(journal.borrow().len());
                Ok(())
            },
            || {},
        );
        seq.start(0);
        seq.request_transition(TriggerSource::UserSkip, 0);
        seq.advance(500);

        // FadeOut, HideIntro and ShowMain were all recorded before activation
        assert_eq!(seen.get(), 3);
    }

    #[test]
    fn test_request_before_start() {
        let mut h = harness();
        assert!(h.seq.request_transition(TriggerSource::UserSkip, 0));
        h.seq.start(0);
        assert_eq!(h.seq.next_deadline(), Some(500));
    }
}
