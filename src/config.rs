use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::intro::{IntroConfig, DEFAULT_FAILURE_NOTICE};
use crate::logging::LogLevel;
use crate::time::Millis;
use crate::typing::DEFAULT_TYPING_SPEED_MS;

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "redmap.cfg";

/// Presentation options that can be set via CLI or config file
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    // Commandline-only options
    pub log_file: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,

    // Commandline and config file options
    pub log_level: LogLevel,
    pub fade_ms: Millis,
    pub settle_ms: Millis,
    pub fallback_timeout_ms: Millis,
    pub skip_fade_on_media_error: bool,
    pub failure_notice: String,
    pub typing_speed_ms: Millis,
    /// Directory holding persisted preferences; in-memory when unset
    pub prefs_dir: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        let intro = IntroConfig::default();
        Self {
            log_file: None,
            config_dir: None,
            log_level: LogLevel::Info,
            fade_ms: intro.fade_ms,
            settle_ms: intro.settle_ms,
            fallback_timeout_ms: intro.fallback_timeout_ms,
            skip_fade_on_media_error: intro.skip_fade_on_media_error,
            failure_notice: DEFAULT_FAILURE_NOTICE.to_string(),
            typing_speed_ms: DEFAULT_TYPING_SPEED_MS,
            prefs_dir: None,
        }
    }
}

impl Options {
    /// Sequencer settings derived from these options
    pub fn intro_config(&self) -> IntroConfig {
        IntroConfig {
            fade_ms: self.fade_ms,
            settle_ms: self.settle_ms,
            fallback_timeout_ms: self.fallback_timeout_ms,
            skip_fade_on_media_error: self.skip_fade_on_media_error,
            failure_notice: self.failure_notice.clone(),
        }
    }

    /// Apply one `key = value` setting
    ///
    /// Unknown keys are reported and skipped.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "loglevel" => {
                self.log_level = LogLevel::parse(value)
                    .with_context(|| format!("Invalid log level '{value}'"))?;
            }
            "fade" => self.fade_ms = parse_millis(value).context("Invalid fade duration")?,
            "settle" => self.settle_ms = parse_millis(value).context("Invalid settle delay")?,
            "timeout" => {
                self.fallback_timeout_ms =
                    parse_millis(value).context("Invalid fallback timeout")?
            }
            "skipfadeonerror" => {
                self.skip_fade_on_media_error =
                    parse_bool(value).context("Invalid skipfadeonerror value")?
            }
            "failurenotice" => self.failure_notice = value.to_string(),
            "typingspeed" => {
                self.typing_speed_ms = parse_millis(value).context("Invalid typing speed")?
            }
            "prefsdir" => self.prefs_dir = Some(PathBuf::from(value)),
            other => log::warn!("Unknown configuration key '{}'", other),
        }
        Ok(())
    }
}

/// Load configuration from `redmap.cfg` in `config_dir`
///
/// A missing directory or file yields the defaults.
pub fn load_config(config_dir: Option<&Path>) -> Result<Options> {
    let mut options = Options::default();
    let Some(dir) = config_dir else {
        return Ok(options);
    };
    options.config_dir = Some(dir.to_path_buf());

    let path = dir.join(CONFIG_FILE_NAME);
    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::debug!("No configuration at {}; using defaults", path.display());
            return Ok(options);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Cannot read {}", path.display()));
        }
    };

    for (line_no, key, value) in parse_settings(&data) {
        options
            .apply(&key, &value)
            .with_context(|| format!("{}:{}", path.display(), line_no))?;
    }
    Ok(options)
}

/// Parse `key = value` lines
///
/// Keys are lower-cased; `#` starts a comment that runs to the end of the
/// line. Lines without `=` are skipped with a warning. Each entry carries its
/// 1-based line number.
pub fn parse_settings(data: &str) -> Vec<(usize, String, String)> {
    let mut entries = Vec::new();
    for (idx, raw) in data.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            log::warn!("Key without value on line {}", idx + 1);
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            log::warn!("Value without key on line {}", idx + 1);
            continue;
        }
        entries.push((idx + 1, key, value.trim().to_string()));
    }
    entries
}

/// Parse a duration in milliseconds; a trailing `ms` or `s` unit is accepted
pub fn parse_millis(s: &str) -> Result<Millis> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.trim().parse().context("Invalid millisecond value");
    }
    if let Some(secs) = s.strip_suffix('s') {
        let secs: f64 = secs.trim().parse().context("Invalid seconds value")?;
        if !secs.is_finite() || secs < 0.0 {
            anyhow::bail!("Duration must be a non-negative number of seconds");
        }
        return Ok((secs * 1000.0).round() as Millis);
    }
    s.parse().context("Invalid millisecond value")
}

/// Parse a boolean setting (`true`/`false`, `yes`/`no`, `on`/`off`, `1`/`0`)
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => anyhow::bail!("Expected a boolean, got '{}'", other),
    }
}

/// Parse a speech rate (0.1-10.0)
pub fn parse_rate(s: &str) -> Result<f32> {
    parse_ranged(s, 0.1, 10.0).context("Speech rate out of range (0.1 to 10.0)")
}

/// Parse a speech pitch (0.0-2.0)
pub fn parse_pitch(s: &str) -> Result<f32> {
    parse_ranged(s, 0.0, 2.0).context("Speech pitch out of range (0.0 to 2.0)")
}

/// Parse a volume value (0-100) to a float (0.0-1.0)
pub fn parse_volume(vol: i32) -> f32 {
    if vol < 0 {
        return 0.0;
    }
    if vol > 100 {
        return 1.0;
    }
    vol as f32 / 100.0
}

fn parse_ranged(s: &str, min: f32, max: f32) -> Result<f32> {
    let value: f32 = s.trim().parse().context("Not a number")?;
    if !(min..=max).contains(&value) {
        anyhow::bail!("{} is outside {}..={}", value, min, max);
    }
    Ok(value)
}
