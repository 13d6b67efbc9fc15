//! Syntax highlighting of fenced code blocks.
//!
//! Runs over the pulldown-cmark event stream before HTML is written. A fenced
//! block whose info string names a language is tokenized with syntect and
//! replaced by a single HTML event:
//!
//! ```text
//! <div class="codehilite"><pre><code class="language-python">
//!   <span class="source python"><span class="storage type function python">def</span> …
//! </code></pre></div>
//! ```
//!
//! Spans carry scope names as classes rather than inline colors, so the
//! palette lives in the site stylesheet. Blocks without a language, and
//! indented code blocks, are left as plain `<pre><code>`.

use maud::{PreEscaped, html};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> &'a SyntaxReference {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text())
}

/// Language token of a fence info string (`python linenums` → `python`).
fn language(info: &str) -> Option<&str> {
    info.split_whitespace().next()
}

/// Highlight `code` as `lang`, returning the complete block markup.
///
/// Unknown languages fall back to plain text, which still escapes the code.
pub fn highlight_code(code: &str, lang: &str) -> Result<String, syntect::Error> {
    let ss = syntax_set();
    let syntax = find_syntax(ss, lang);
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, ss, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    let spans = generator.finalize();

    let markup = html! {
        div.codehilite {
            pre { code class={ "language-" (lang) } { (PreEscaped(spans)) } }
        }
    };
    Ok(format!("{}\n", markup.into_string()))
}

/// Replace fenced code blocks that name a language with highlighted HTML.
///
/// Any other event passes through unchanged. If highlighting a block fails,
/// the block is emitted as it came in.
pub fn highlight_code_blocks<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut out = Vec::new();
    let mut fence: Option<(CowStr<'a>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                if language(&info).is_some() =>
            {
                fence = Some((info, String::new()));
            }
            Event::Text(text) if fence.is_some() => {
                if let Some((_, code)) = fence.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) if fence.is_some() => {
                let Some((info, code)) = fence.take() else {
                    continue;
                };
                let lang = language(&info).unwrap_or_default();
                match highlight_code(&code, lang) {
                    Ok(markup) => out.push(Event::Html(CowStr::from(markup))),
                    Err(_) => {
                        out.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))));
                        out.push(Event::Text(CowStr::from(code)));
                        out.push(Event::End(TagEnd::CodeBlock));
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}
