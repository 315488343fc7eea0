/// Narration of one game.
///
/// A disabled log drops everything; messages are built lazily so a muted
/// game (batch runs, speculative forks) pays nothing for narration.
#[derive(Debug, Clone, Default)]
pub struct GameLog {
    lines: Option<Vec<String>>,
}

impl GameLog {
    pub fn enabled() -> Self {
        GameLog {
            lines: Some(Vec::new()),
        }
    }

    pub fn disabled() -> Self {
        GameLog { lines: None }
    }

    pub fn new(verbose: bool) -> Self {
        if verbose {
            Self::enabled()
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.lines.is_some()
    }

    pub fn log(&mut self, message: impl FnOnce() -> String) {
        if let Some(lines) = self.lines.as_mut() {
            lines.push(message());
        }
    }

    /// Muted copy, for forks
    pub fn muted(&self) -> Self {
        Self::disabled()
    }

    pub fn lines(&self) -> &[String] {
        self.lines.as_deref().unwrap_or(&[])
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.unwrap_or_default()
    }
}
