use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{parse_millis, parse_pitch, parse_rate, parse_volume, Options};
use crate::intro::{IntroMedia, IntroSequencer, IntroStage, MediaEvent, UserInput};
use crate::logging::LogLevel;
use crate::narration::VoicePreferencesPatch;
use crate::time::Millis;

/// Narration shown and spoken once the map is revealed
pub const DEFAULT_NARRATION: &str =
    "欢迎来到济南红色地图。让我们沿着革命先辈的足迹，重温这座泉城的红色记忆。";

/// Red map presenter - plays the intro and hands off to the map, headless
#[derive(Parser, Debug)]
#[command(name = "redmap")]
#[command(version)]
#[command(about = "Intro, typing and narration sequencing for the red map presentation", long_about = None)]
pub struct Cli {
    /// Configuration directory path
    #[arg(short, long, value_name = "CONFIGDIR")]
    pub configdir: Option<PathBuf>,

    /// Log file path
    #[arg(short, long, value_name = "FILE")]
    pub logfile: Option<PathBuf>,

    /// Log level (nothing, user, error, warning, info, debug, all)
    #[arg(long, value_name = "LEVEL")]
    pub loglevel: Option<String>,

    /// Intro fade-out duration (e.g. 500, 500ms, 0.5s)
    #[arg(long, value_name = "DURATION")]
    pub fade: Option<String>,

    /// Delay between map activation and background audio
    #[arg(long, value_name = "DURATION")]
    pub settle: Option<String>,

    /// Give up on the intro after this long
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Fade out even when the intro media fails
    #[arg(long)]
    pub fade_on_error: bool,

    /// Delay between typed characters
    #[arg(long, value_name = "DURATION")]
    pub typing_speed: Option<String>,

    /// Directory where voice settings are persisted
    #[arg(long, value_name = "DIR")]
    pub prefsdir: Option<PathBuf>,

    /// Speech rate to save (0.1-10.0)
    #[arg(long, value_name = "RATE")]
    pub rate: Option<String>,

    /// Speech pitch to save (0.0-2.0)
    #[arg(long, value_name = "PITCH")]
    pub pitch: Option<String>,

    /// Speech volume to save (0-100)
    #[arg(long, value_name = "VOLUME")]
    pub volume: Option<i32>,

    /// Refuse the first playback attempt, like a browser blocking autoplay
    #[arg(long)]
    pub autoplay_blocked: bool,

    /// Make the map fail to initialize
    #[arg(long)]
    pub fail_map: bool,

    /// Report the voice list only after the first refresh
    #[arg(long)]
    pub voices_late: bool,

    /// Scripted event, KIND@MS (canplay, loaded, ended, error, skip, click,
    /// skipclick, play, hidden, visible); may be repeated
    #[arg(short, long = "event", value_name = "KIND@MS")]
    pub events: Vec<ScriptedEvent>,

    /// Narration text
    #[arg(long, value_name = "TEXT", default_value = DEFAULT_NARRATION)]
    pub text: String,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        if let Some(ref file) = self.logfile {
            opts.log_file = Some(file.clone());
        }

        if let Some(ref level) = self.loglevel {
            opts.log_level =
                LogLevel::parse(level).with_context(|| format!("Invalid log level '{level}'"))?;
        }

        if let Some(ref fade) = self.fade {
            opts.fade_ms = parse_millis(fade).context("Invalid fade duration")?;
        }

        if let Some(ref settle) = self.settle {
            opts.settle_ms = parse_millis(settle).context("Invalid settle delay")?;
        }

        if let Some(ref timeout) = self.timeout {
            opts.fallback_timeout_ms = parse_millis(timeout).context("Invalid fallback timeout")?;
        }

        if self.fade_on_error {
            opts.skip_fade_on_media_error = false;
        }

        if let Some(ref speed) = self.typing_speed {
            opts.typing_speed_ms = parse_millis(speed).context("Invalid typing speed")?;
        }

        if let Some(ref dir) = self.prefsdir {
            opts.prefs_dir = Some(dir.clone());
        }

        Ok(opts)
    }

    /// Voice settings requested on the command line
    pub fn voice_patch(&self) -> Result<VoicePreferencesPatch> {
        let mut patch = VoicePreferencesPatch::default();
        if let Some(ref rate) = self.rate {
            patch = patch.rate(parse_rate(rate)?);
        }
        if let Some(ref pitch) = self.pitch {
            patch = patch.pitch(parse_pitch(pitch)?);
        }
        if let Some(volume) = self.volume {
            patch = patch.volume(parse_volume(volume));
        }
        Ok(patch)
    }

    /// Scripted events, earliest first
    pub fn sorted_events(&self) -> Vec<ScriptedEvent> {
        let mut events = self.events.clone();
        events.sort_by_key(|e| e.at);
        events
    }
}

/// Kind of a scripted host event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CanPlay,
    Loaded,
    Ended,
    MediaError,
    Skip,
    Click,
    SkipButtonClick,
    PlayPrompt,
    Hidden,
    Visible,
}

/// A host event scheduled at a point on the virtual clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedEvent {
    pub kind: EventKind,
    pub at: Millis,
}

impl ScriptedEvent {
    /// Deliver this event to the sequencer
    pub fn dispatch<S: IntroStage, M: IntroMedia>(&self, seq: &mut IntroSequencer<S, M>) {
        let now = self.at;
        match self.kind {
            EventKind::CanPlay => seq.handle_media_event(MediaEvent::CanPlay, now),
            EventKind::Loaded => seq.handle_media_event(MediaEvent::LoadedData, now),
            EventKind::Ended => seq.handle_media_event(MediaEvent::Ended, now),
            EventKind::MediaError => {
                seq.handle_media_event(MediaEvent::Error("scripted media failure".into()), now)
            }
            EventKind::Skip => seq.handle_input(UserInput::SkipButton, now),
            EventKind::Click => seq.handle_input(
                UserInput::ContainerClick {
                    on_skip_button: false,
                },
                now,
            ),
            EventKind::SkipButtonClick => {
                // The skip button sits inside the container: both handlers see the click.
                seq.handle_input(UserInput::SkipButton, now);
                seq.handle_input(UserInput::ContainerClick { on_skip_button: true }, now);
            }
            EventKind::PlayPrompt => seq.handle_input(UserInput::PlayPrompt, now),
            EventKind::Hidden => seq.visibility_changed(true, now),
            EventKind::Visible => seq.visibility_changed(false, now),
        }
    }
}

impl FromStr for ScriptedEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, at) = s
            .split_once('@')
            .context("Event must be in KIND@MS format")?;
        let kind = match kind.trim().to_ascii_lowercase().as_str() {
            "canplay" => EventKind::CanPlay,
            "loaded" | "loadeddata" => EventKind::Loaded,
            "ended" => EventKind::Ended,
            "error" => EventKind::MediaError,
            "skip" => EventKind::Skip,
            "click" => EventKind::Click,
            "skipclick" => EventKind::SkipButtonClick,
            "play" => EventKind::PlayPrompt,
            "hidden" => EventKind::Hidden,
            "visible" => EventKind::Visible,
            other => anyhow::bail!("Unknown event kind '{}'", other),
        };
        let at = parse_millis(at).context("Invalid event time")?;
        Ok(Self { kind, at })
    }
}
