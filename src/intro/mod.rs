//! Intro-to-main-view handoff
//!
//! This module plays an introductory media clip and then reveals the main
//! view exactly once, whichever of several signals arrives first.
//!
//! # Architecture
//!
//! The intro system consists of:
//! - Trigger sources and the transition state machine (`types`)
//! - Capability traits for the visual stage and the intro media (`stage`)
//! - The sequencer that races triggers and drives the handoff (`sequencer`)
//!
//! # Threading
//!
//! Everything runs on the host's event thread. Ordering is guaranteed by the
//! state machine and the timer queue, not by locks.

pub mod sequencer;
pub mod stage;
pub mod types;

pub use sequencer::IntroSequencer;
pub use stage::{IntroMedia, IntroStage, RecordingStage, ScriptedMedia, StageAction};
pub use types::{
    ActivationOutcome, IntroConfig, MediaError, MediaEvent, TransitionState, TriggerSet,
    TriggerSource, UserInput, DEFAULT_FAILURE_NOTICE,
};
