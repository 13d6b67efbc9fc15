//! Markdown to HTML rendering.
//!
//! Thin adapter over [pulldown-cmark](https://docs.rs/pulldown-cmark): the
//! cleaned page body goes in, an HTML fragment comes out. Which markdown
//! extensions are active is decided by [`MarkdownConfig`]; everything else is
//! plain CommonMark. With `highlight` on, fenced code blocks are passed
//! through [`crate::highlight`] before HTML is written. Raw HTML (such as
//! the header anchors added by [`crate::preprocess`]) passes through
//! untouched.

use crate::config::MarkdownConfig;
use crate::highlight;
use pulldown_cmark::{Options, Parser, html as md_html};

/// Map the configured extensions onto pulldown-cmark options.
pub fn options(config: &MarkdownConfig) -> Options {
    let mut options = Options::empty();
    options.set(Options::ENABLE_DEFINITION_LIST, config.definition_lists);
    options.set(Options::ENABLE_TABLES, config.tables);
    options.set(Options::ENABLE_FOOTNOTES, config.footnotes);
    options.set(Options::ENABLE_STRIKETHROUGH, config.strikethrough);
    options.set(Options::ENABLE_SMART_PUNCTUATION, config.smart_punctuation);
    options
}

/// Render a markdown body to an HTML fragment.
pub fn render_markdown(body: &str, config: &MarkdownConfig) -> String {
    let parser = Parser::new_ext(body, options(config));
    let mut html = String::with_capacity(body.len() * 3 / 2);
    if config.highlight {
        md_html::push_html(&mut html, highlight::highlight_code_blocks(parser).into_iter());
    } else {
        md_html::push_html(&mut html, parser);
    }
    html
}
