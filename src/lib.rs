// Red map presentation runtime
// Intro handoff, typing animation and narration

pub mod cli;
pub mod config;
pub mod intro;
pub mod logging;
pub mod narration;
pub mod time;
pub mod typing;

pub use cli::Cli;
pub use config::Options;
pub use intro::IntroSequencer;
pub use logging::LogLevel;
pub use narration::NarrationService;
pub use typing::TypingAnimator;
