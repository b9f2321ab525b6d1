//! Obsidian callouts to Quarto callout divs.
//!
//! `> [!warning] Careful` opens `::: {.callout-warning title="Careful"}` and
//! the div is closed as soon as a line carries fewer blockquote markers than
//! the current nesting depth. Two levels of nesting are recognized, and the
//! depth always equals the number of fences currently open.

use regex::Regex;
use std::sync::OnceLock;

pub const CALLOUT_CLOSE: &str = ":::";

fn single_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*>\s*\[!(?P<kind>[A-Za-z][\w-]*)\][+-]?(?:\s+(?P<title>.*?))?\s*$").unwrap()
    })
}

fn nested_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*>\s*>\s*\[!(?P<kind>[A-Za-z][\w-]*)\][+-]?(?:\s+(?P<title>.*?))?\s*$")
            .unwrap()
    })
}

/// One converted input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalloutLine {
    /// A callout header: `closes` fences to emit first, then the opening `fence`
    Open { closes: usize, fence: String },
    /// Any other line: `closes` fences to emit first, then `text`
    Body { closes: usize, text: String },
}

/// Tracks callout nesting within a single note
#[derive(Debug, Default)]
pub struct CalloutConverter {
    depth: usize,
}

impl CalloutConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn convert(&mut self, line: &str) -> CalloutLine {
        for (regex, depth) in [(nested_regex(), 2), (single_regex(), 1)] {
            if let Some(caps) = regex.captures(line) {
                let kind = &caps["kind"];
                let title = caps
                    .name("title")
                    .map(|m| m.as_str())
                    .filter(|t| !t.is_empty())
                    .unwrap_or(kind);
                // a nested header with nothing to nest in opens a single level
                let level = depth.min(self.depth + 1);
                let closes = self.depth + 1 - level;
                self.depth = level;
                return CalloutLine::Open {
                    closes,
                    fence: render_open(kind, title),
                };
            }
        }

        let (markers, rest) = split_markers(line);
        let mut closes = 0;
        if markers < self.depth {
            closes = self.depth - markers;
            self.depth = markers;
        }
        CalloutLine::Body {
            closes,
            text: rest.to_string(),
        }
    }

    /// Fences still needed at end of input
    pub fn finish(&mut self) -> usize {
        std::mem::take(&mut self.depth)
    }
}

fn render_open(kind: &str, title: &str) -> String {
    format!(
        "::: {{.callout-{} title=\"{}\"}}",
        kind.to_lowercase(),
        title.replace('"', "\\\"")
    )
}

/// Count the `>` markers in the leading blockquote prefix and return the
/// text after it. Lines without a marker are returned untouched.
fn split_markers(line: &str) -> (usize, &str) {
    let mut markers = 0;
    let mut end = line.len();
    for (idx, c) in line.char_indices() {
        match c {
            '>' => markers += 1,
            c if c.is_whitespace() => {}
            _ => {
                end = idx;
                break;
            }
        }
    }

    if markers == 0 {
        (0, line)
    } else {
        (markers, &line[end..])
    }
}
