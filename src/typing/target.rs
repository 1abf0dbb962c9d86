//! Render surfaces for typed text

/// Markup appended after the in-progress prefix
pub const CURSOR_MARKUP: &str = r#"<span class="typing-cursor"></span>"#;

/// Any surface that accepts a markup string
///
/// Each call replaces the previous contents entirely.
pub trait RenderTarget {
    fn set_markup(&mut self, markup: &str);
}

impl RenderTarget for String {
    fn set_markup(&mut self, markup: &str) {
        self.clear();
        self.push_str(markup);
    }
}

/// Target that keeps every write, newest last
#[derive(Debug, Default, Clone)]
pub struct RecordingTarget {
    writes: Vec<String>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents (empty if nothing was written)
    pub fn current(&self) -> &str {
        self.writes.last().map(String::as_str).unwrap_or("")
    }

    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    pub fn write_count(&self) -> usize {
        self.writes.len()
    }
}

impl RenderTarget for RecordingTarget {
    fn set_markup(&mut self, markup: &str) {
        self.writes.push(markup.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_target_replaces_contents() {
        let mut target = String::from("old");
        target.set_markup("new");
        assert_eq!(target, "new");
    }

    #[test]
    fn test_recording_target() {
        let mut target = RecordingTarget::new();
        assert_eq!(target.current(), "");

        target.set_markup("a");
        target.set_markup("ab");
        assert_eq!(target.current(), "ab");
        assert_eq!(target.write_count(), 2);
        assert_eq!(target.writes()[0], "a");
    }
}
