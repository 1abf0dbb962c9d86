//! Typing animation state machine

use super::target::{RenderTarget, CURSOR_MARKUP};
use crate::time::{Millis, TimerId, TimerQueue};

/// Default delay between characters
pub const DEFAULT_TYPING_SPEED_MS: Millis = 50;

/// One run of the animation over a single string
#[derive(Debug, Clone)]
pub struct TypingSession {
    text: String,
    /// Length of `text` in characters
    len: usize,
    /// Characters already revealed
    position: usize,
    speed_ms: Millis,
    active: bool,
    /// Handle of the scheduled next step, if any
    pending: Option<TimerId>,
}

impl TypingSession {
    fn new(text: &str, speed_ms: Millis) -> Self {
        Self {
            text: text.to_string(),
            len: text.chars().count(),
            position: 0,
            speed_ms,
            active: true,
            pending: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn speed_ms(&self) -> Millis {
        self.speed_ms
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// First `chars` characters of the text
    fn prefix(&self, chars: usize) -> &str {
        match self.text.char_indices().nth(chars) {
            Some((byte_idx, _)) => &self.text[..byte_idx],
            None => &self.text,
        }
    }
}

/// Reveals text into a render target one character per step
///
/// Each session owns at most one scheduled step. Stopping or restarting
/// cancels that step through its `TimerId`, and a step that fires anyway
/// re-checks that it is still the session's pending step before writing.
#[derive(Debug)]
pub struct TypingAnimator<T: RenderTarget> {
    target: T,
    session: Option<TypingSession>,
    timers: TimerQueue<()>,
}

impl<T: RenderTarget> TypingAnimator<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            session: None,
            timers: TimerQueue::new(),
        }
    }

    /// Start typing `text`, superseding any session in progress
    ///
    /// The target is cleared and the first character is due immediately;
    /// later characters follow every `speed_ms`.
    pub fn start(&mut self, text: &str, speed_ms: Millis, now: Millis) {
        self.cancel_pending();
        if let Some(previous) = self.session.as_mut() {
            previous.active = false;
        }

        let mut session = TypingSession::new(text, speed_ms);
        log::debug!(
            "Typing {} characters at {}ms per character",
            session.len,
            speed_ms
        );

        self.target.set_markup("");
        session.pending = Some(self.timers.schedule_at(now, ()));
        self.session = Some(session);
    }

    /// Halt the animation where it is
    pub fn stop(&mut self) {
        self.cancel_pending();
        if let Some(session) = self.session.as_mut() {
            session.active = false;
        }
    }

    /// Halt the animation and show the whole text
    pub fn skip(&mut self) {
        self.stop();
        if let Some(session) = self.session.as_mut() {
            session.position = session.len;
            self.target.set_markup(&session.text);
        }
    }

    /// Run every step due at `now`; returns the number of steps that rendered
    ///
    /// A step scheduled while handling this call waits for the next call,
    /// so a zero speed still reveals one character per call.
    pub fn advance(&mut self, now: Millis) -> usize {
        let mut rendered = 0;
        for (id, ()) in self.timers.take_due(now) {
            if self.step(id, now) {
                rendered += 1;
            }
        }
        rendered
    }

    fn step(&mut self, id: TimerId, now: Millis) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.active || session.pending != Some(id) {
            return false;
        }
        session.pending = None;

        let next = session.position + 1;
        if next >= session.len {
            session.position = session.len;
            session.active = false;
            self.target.set_markup(&session.text);
            log::debug!("Typing finished");
        } else {
            let markup = format!("{}{}", session.prefix(next), CURSOR_MARKUP);
            self.target.set_markup(&markup);
            session.position = next;
            session.pending = Some(self.timers.schedule_after(now, session.speed_ms, ()));
        }
        true
    }

    fn cancel_pending(&mut self) {
        if let Some(id) = self.session.as_mut().and_then(|s| s.pending.take()) {
            self.timers.cancel(id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.active)
    }

    /// Text of the current session; empty before the first `start`
    pub fn text(&self) -> &str {
        self.session.as_ref().map_or("", |s| s.text())
    }

    /// Characters revealed in the current session
    pub fn position(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.position)
    }

    pub fn session(&self) -> Option<&TypingSession> {
        self.session.as_ref()
    }

    /// When the next step is due, if one is scheduled
    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn target(&self) -> &T {
        &self.target
    }
}
