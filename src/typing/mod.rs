//! Character-by-character text reveal
//!
//! A `TypingAnimator` writes a growing prefix of a string into a
//! `RenderTarget`, one character per step, with a cursor marker on the
//! character currently being typed. Steps are driven by the presentation
//! clock (see `crate::time`).

pub mod animator;
pub mod target;

pub use animator::{TypingAnimator, TypingSession, DEFAULT_TYPING_SPEED_MS};
pub use target::{RecordingTarget, RenderTarget, CURSOR_MARKUP};
