//! Terminal rendering of response payloads.
//!
//! Payloads are serialized to pretty JSON and syntax-highlighted for a 24-bit
//! terminal. Formatting problems never abort a conversation: the renderer
//! prints the error and the payload's debug representation instead.

use std::fmt::Debug;
use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use serde::Serialize;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

const THEME: &str = "base16-mocha.dark";

/// Failure while turning a payload into highlighted text.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Highlight(#[from] syntect::Error),
}

/// Severity of a line of plain status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Success,
    Warning,
    Error,
}

impl Tone {
    fn color(self) -> Option<Color> {
        match self {
            Tone::Plain => None,
            Tone::Success => Some(Color::Green),
            Tone::Warning => Some(Color::Yellow),
            Tone::Error => Some(Color::Red),
        }
    }
}

/// Writes titled, highlighted JSON sections to `W`.
pub struct JsonRenderer<W> {
    out: W,
    syntaxes: SyntaxSet,
    theme: Option<Theme>,
    color: bool,
}

impl<W: Write> JsonRenderer<W> {
    /// Renderer with syntax highlighting and colored status lines.
    pub fn new(out: W) -> Self {
        let mut themes = ThemeSet::load_defaults();
        Self {
            out,
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme: themes.themes.remove(THEME),
            color: true,
        }
    }

    /// Renderer that writes plain, uncolored text.
    pub fn plain(out: W) -> Self {
        Self {
            out,
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme: None,
            color: false,
        }
    }

    /// Consume the renderer and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print `=== title ===` followed by the payload as JSON.
    ///
    /// If serialization or highlighting fails, prints
    /// `Error printing JSON: <e>` and the payload's `Debug` form.
    pub fn render<T: Serialize + Debug + ?Sized>(&mut self, title: &str, payload: &T) -> io::Result<()> {
        writeln!(self.out, "\n=== {title} ===")?;
        match self.highlight(payload) {
            Ok(text) => {
                self.out.write_all(text.as_bytes())?;
                if self.color {
                    queue!(self.out, ResetColor)?;
                }
                writeln!(self.out)?;
            }
            Err(e) => {
                tracing::debug!(error = %e, "falling back to raw payload");
                if self.color {
                    queue!(
                        self.out,
                        SetForegroundColor(Color::Red),
                        SetAttribute(Attribute::Bold),
                        Print("Error printing JSON:"),
                        SetAttribute(Attribute::Reset),
                        ResetColor,
                    )?;
                } else {
                    write!(self.out, "Error printing JSON:")?;
                }
                writeln!(self.out, " {e}")?;
                writeln!(self.out, "{payload:?}")?;
            }
        }
        self.out.flush()
    }

    /// Print one line of status text in the given tone.
    pub fn line(&mut self, tone: Tone, text: &str) -> io::Result<()> {
        match tone.color().filter(|_| self.color) {
            Some(color) => queue!(
                self.out,
                SetForegroundColor(color),
                SetAttribute(Attribute::Bold),
                Print(text),
                SetAttribute(Attribute::Reset),
                ResetColor,
                Print("\n"),
            )?,
            None => writeln!(self.out, "{text}")?,
        }
        self.out.flush()
    }

    /// Print text without a trailing newline, for prompts.
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()
    }

    fn highlight<T: Serialize + ?Sized>(&self, payload: &T) -> Result<String, RenderError> {
        let json = serde_json::to_string_pretty(payload)?;
        let Some(theme) = self.theme.as_ref() else {
            return Ok(json);
        };

        let mut highlighter = HighlightLines::new(self.json_syntax(), theme);
        let mut text = String::with_capacity(json.len() * 2);
        for line in LinesWithEndings::from(&json) {
            let ranges = highlighter.highlight_line(line, &self.syntaxes)?;
            text.push_str(&as_24_bit_terminal_escaped(&ranges, false));
        }
        Ok(text)
    }

    fn json_syntax(&self) -> &SyntaxReference {
        self.syntaxes
            .find_syntax_by_extension("json")
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }
}

impl<W> Debug for JsonRenderer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRenderer")
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}
