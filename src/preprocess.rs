//! Line-level preprocessing of page sources.
//!
//! Page sources are markdown with two additions, handled here before the
//! text reaches the markdown renderer:
//!
//! ## Directives
//!
//! A line whose first non-blank character is `^` carries page metadata:
//!
//! ```text
//! ^title Getting Started
//! ^category core
//! ```
//!
//! The word after `^` is the command, the rest of the line (trimmed) its
//! argument. `title` and `category` fill [`PageMetadata`]; any other command
//! is reported as a [`Warning`]. Directive lines never reach the cleaned body.
//!
//! ## Header anchors
//!
//! Every header line gets a self-link appended so readers can copy a deep
//! link to any section:
//!
//! ```text
//! ## Café Menu!
//! ```
//!
//! becomes
//!
//! ```text
//! ## Café Menu! <a href="#café-menu" name="café-menu" class="header-anchor">#</a>
//! ```
//!
//! Slugs are derived from the header text alone. Two headers with the same
//! text produce the same anchor; existing deep links depend on slugs staying
//! stable, so no disambiguating suffix is added.
//!
//! All other lines pass through byte for byte.

use crate::types::PageMetadata;
use maud::html;

/// Characters removed from an anchor slug after lowercasing.
const STRIPPED_SLUG_CHARS: &[char] = &['.', '?', '!', ':', '/', '*'];

/// A page-metadata directive parsed from a `^command args` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Title(String),
    Category(String),
    Unknown { command: String, args: String },
}

/// Classification of one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Directive(Directive),
    Header {
        indent: &'a str,
        marker: &'a str,
        text: &'a str,
    },
    Text(&'a str),
}

/// Non-fatal problem found while preprocessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UnknownCommand { command: String, args: String },
}

/// Result of preprocessing one page source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preprocessed {
    pub metadata: PageMetadata,
    /// Markdown with directives removed and header anchors added.
    pub body: String,
    pub warnings: Vec<Warning>,
}

/// Classify a single line. `line` may include its terminator.
pub fn classify(line: &str) -> Line<'_> {
    let stripped = line.trim_start();
    let indent = &line[..line.len() - stripped.len()];

    if let Some(rest) = stripped.strip_prefix('^') {
        Line::Directive(parse_directive(rest))
    } else if stripped.starts_with('#') {
        let content = strip_line_ending(stripped);
        let marker_len = content.len() - content.trim_start_matches('#').len();
        Line::Header {
            indent,
            marker: &content[..marker_len],
            text: content[marker_len..].trim(),
        }
    } else {
        Line::Text(line)
    }
}

/// Parse the part of a directive line after the first `^`.
fn parse_directive(rest: &str) -> Directive {
    let rest = strip_line_ending(rest).trim_start_matches('^');
    let (command, args) = rest.split_once(' ').unwrap_or((rest, ""));
    let args = args.trim().to_string();

    match command {
        "title" => Directive::Title(args),
        "category" => Directive::Category(args),
        _ => Directive::Unknown {
            command: command.to_string(),
            args,
        },
    }
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Derive the anchor slug for a header's text.
///
/// Lowercases with Unicode default case mapping, turns each space into a
/// hyphen and removes `. ? ! : / *`. Any other character is kept.
pub fn anchor_slug(text: &str) -> String {
    text.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| !STRIPPED_SLUG_CHARS.contains(c))
        .collect()
}

/// The self-link appended to a header line.
pub fn anchor_link(slug: &str) -> String {
    html! {
        a href={ "#" (slug) } name=(slug) class="header-anchor" { "#" }
    }
    .into_string()
}

/// Preprocess a whole page source.
pub fn preprocess(source: &str) -> Preprocessed {
    let mut out = Preprocessed::default();

    for line in source.split_inclusive('\n') {
        match classify(line) {
            Line::Directive(Directive::Title(title)) => out.metadata.title = title,
            Line::Directive(Directive::Category(category)) => out.metadata.category = category,
            Line::Directive(Directive::Unknown { command, args }) => {
                out.warnings.push(Warning::UnknownCommand { command, args });
            }
            Line::Header {
                indent,
                marker,
                text,
            } => {
                let link = anchor_link(&anchor_slug(text));
                out.body.push_str(indent);
                out.body.push_str(marker);
                out.body.push(' ');
                out.body.push_str(text);
                out.body.push(' ');
                out.body.push_str(&link);
                out.body.push('\n');
            }
            Line::Text(text) => out.body.push_str(text),
        }
    }
    out
}
