use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use clap::Parser;

use redmap::cli::{Cli, ScriptedEvent};
use redmap::config;
use redmap::intro::{IntroSequencer, IntroStage, ScriptedMedia};
use redmap::logging;
use redmap::narration::{
    FileStore, MemoryStore, NarrationService, PreferenceStore, RecordingPlatform, Voice,
};
use redmap::time::{earliest, Millis, VirtualClock};
use redmap::typing::{RenderTarget, TypingAnimator};

/// Virtual time after which the run is abandoned
const RUN_HORIZON_MS: Millis = 120_000;

/// Stage that reports operations on the console
struct ConsoleStage;

impl IntroStage for ConsoleStage {
    fn begin_fade_out(&mut self, duration_ms: Millis) {
        log::info!("Fading out intro over {}ms", duration_ms);
    }

    fn hide_intro(&mut self) {
        log::info!("Intro hidden");
    }

    fn show_main(&mut self) {
        log::info!("Map shown");
    }

    fn show_play_prompt(&mut self) {
        println!("[点击播放视频]");
    }

    fn dismiss_play_prompt(&mut self) {
        log::info!("Play prompt dismissed");
    }

    fn show_notice(&mut self, message: &str) {
        println!("NOTICE: {message}");
    }
}

/// Caption area of the map; keeps the latest markup
#[derive(Default)]
struct Caption {
    markup: String,
}

impl RenderTarget for Caption {
    fn set_markup(&mut self, markup: &str) {
        log::debug!("caption: {}", markup);
        self.markup.clear();
        self.markup.push_str(markup);
    }
}

fn builtin_voices() -> Vec<Voice> {
    vec![
        Voice::new("Samantha", "en-US"),
        Voice::new("Google 普通话（中国大陆）", "zh-CN"),
        Voice::new("Ting-Ting", "zh-CN"),
    ]
}

fn default_script() -> Vec<ScriptedEvent> {
    ["canplay@100", "loaded@200", "ended@6000"]
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect()
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration file, then let the command line override it
    let options = config::load_config(cli.configdir.as_deref())?;
    let options = cli.merge_into_options(options)?;

    logging::init(options.log_level, options.log_file.as_deref())?;
    log::info!("Red map presenter starting");

    let store: Box<dyn PreferenceStore> = match &options.prefs_dir {
        Some(dir) => Box::new(FileStore::new(dir)),
        None => Box::new(MemoryStore::new()),
    };
    let platform = if cli.voices_late {
        RecordingPlatform::new(Vec::new())
    } else {
        RecordingPlatform::new(builtin_voices())
    };
    let narration = Rc::new(RefCell::new(NarrationService::new(platform, store)));

    let patch = cli.voice_patch()?;
    if !patch.is_empty() {
        narration.borrow_mut().update_settings(patch);
    }

    let media = if cli.autoplay_blocked {
        ScriptedMedia::autoplay_blocked()
    } else {
        ScriptedMedia::new()
    };

    let fail_map = cli.fail_map;
    let activated = Rc::new(Cell::new(false));

    let mut sequencer = IntroSequencer::new(
        options.intro_config(),
        ConsoleStage,
        media,
        move || {
            if fail_map {
                anyhow::bail!("map tiles could not be loaded");
            }
            log::info!("Map initialized");
            Ok(())
        },
        {
            let narration = Rc::clone(&narration);
            let activated = Rc::clone(&activated);
            let voices_late = cli.voices_late;
            let text = cli.text.clone();
            move || {
                let mut narration = narration.borrow_mut();
                if voices_late {
                    narration.platform_mut().set_voices(builtin_voices());
                    narration.on_voices_changed();
                }
                narration.synthesize(&text);
                activated.set(true);
            }
        },
    );

    let mut typer = TypingAnimator::new(Caption::default());
    let mut clock = VirtualClock::new();

    let events = if cli.events.is_empty() {
        default_script()
    } else {
        cli.sorted_events()
    };
    let mut script = events.into_iter().peekable();

    sequencer.start(clock.now());

    loop {
        let deadline = earliest(
            earliest(script.peek().map(|e| e.at), sequencer.next_deadline()),
            typer.next_deadline(),
        );
        let Some(deadline) = deadline else {
            break;
        };
        if deadline > RUN_HORIZON_MS {
            log::warn!("Stopping at the {}ms horizon", RUN_HORIZON_MS);
            break;
        }

        let now = clock.advance_to(deadline);
        while let Some(event) = script.next_if(|e| e.at <= now) {
            event.dispatch(&mut sequencer);
        }
        sequencer.advance(now);

        if activated.replace(false) {
            typer.start(&cli.text, options.typing_speed_ms, now);
        }
        typer.advance(now);

        if sequencer.is_complete() && !typer.is_active() {
            break;
        }
    }

    println!(
        "intro left via {} at {}ms; map {:?}",
        sequencer
            .trigger()
            .map_or_else(|| "nothing".to_string(), |t| t.to_string()),
        clock.now(),
        sequencer.activation()
    );
    if !typer.target().markup.is_empty() {
        println!("caption: {}", typer.target().markup);
    }

    let narration = narration.borrow();
    for utterance in narration.platform().spoken() {
        println!(
            "spoke {} characters (voice {}, rate {}, pitch {}, volume {})",
            utterance.text.chars().count(),
            utterance
                .voice
                .as_ref()
                .map_or("default", |v| v.name.as_str()),
            utterance.rate,
            utterance.pitch,
            utterance.volume
        );
    }

    log::logger().flush();
    Ok(())
}
