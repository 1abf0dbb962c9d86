//! Voice catalog and selection policy

/// A synthesis voice offered by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 language tag, e.g. `zh-CN`
    pub lang: String,
}

impl Voice {
    pub fn new(name: &str, lang: &str) -> Self {
        Self {
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }

    /// Tagged as Chinese: language contains `zh` or region `CN`
    pub fn is_chinese(&self) -> bool {
        self.lang.contains("zh") || self.lang.contains("CN")
    }
}

/// Preferred voice name fragments, best first
pub const VOICE_PRIORITY: [&str; 5] = ["Ting-Ting", "Mei-Jia", "Google", "Microsoft", "Female"];

/// Pick a voice from `voices` by the priority policy
///
/// Only Chinese-tagged voices are considered. The first name fragment in
/// `VOICE_PRIORITY` that matches any of them wins; otherwise the first
/// Chinese voice is used. Returns `None` if there is no Chinese voice.
pub fn select_voice(voices: &[Voice]) -> Option<&Voice> {
    let chinese: Vec<&Voice> = voices.iter().filter(|v| v.is_chinese()).collect();

    VOICE_PRIORITY
        .iter()
        .find_map(|fragment| chinese.iter().find(|v| v.name.contains(*fragment)))
        .or_else(|| chinese.first())
        .copied()
}

/// Latest list of voices reported by the platform
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog contents
    pub fn replace(&mut self, voices: Vec<Voice>) {
        self.voices = voices;
    }

    pub fn chinese_voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter().filter(|v| v.is_chinese())
    }

    /// Look up a previously selected voice in the current list
    ///
    /// Matches on both name and language, and only among Chinese voices, so
    /// a same-named voice in another language is never returned.
    pub fn resolve(&self, voice: &Voice) -> Option<&Voice> {
        self.chinese_voices()
            .find(|v| v.name == voice.name && v.lang == voice.lang)
    }

    pub fn select(&self) -> Option<&Voice> {
        select_voice(&self.voices)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
