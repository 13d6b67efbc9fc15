//! # docgen
//!
//! Builds the documentation website from a tree of annotated markdown files.
//! Every `*.markdown` file under the source root becomes an HTML page at the
//! same relative path under the output root, wrapped in one of two page
//! templates.
//!
//! # Architecture: One Linear Pipeline
//!
//! ```text
//! doc/site/guide.markdown
//!     │  preprocess   ^title / ^category directives → metadata,
//!     │               header lines → headers with self-anchors
//!     │  render       cleaned markdown → HTML fragment (pulldown-cmark)
//!     │  assemble     fragment + metadata + mtime → page template
//!     ▼
//! build/docs/guide.html
//! ```
//!
//! A run starts with a full rebuild into a freshly emptied output directory.
//! With `--watch` it then polls the source tree and rebuilds only pages whose
//! output is older than their source or the default template. Nothing runs
//! concurrently and the only state carried between polls is file
//! modification times.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Optional `config.toml` in the source root, merged over stock defaults |
//! | [`template`] | The two page templates and `{placeholder}` substitution |
//! | [`preprocess`] | Directive extraction and header anchor injection |
//! | [`render`] | Markdown to HTML via pulldown-cmark |
//! | [`highlight`] | syntect highlighting of fenced code blocks |
//! | [`page`] | Template selection by category and page assembly |
//! | [`staleness`] | Modification-time comparisons for incremental passes |
//! | [`style`] | Runs the external stylesheet compiler when stale |
//! | [`pipeline`] | Page discovery, per-page conversion, initial pass and watch loop |
//! | [`types`] | Shared types (`PageMetadata`, `BuildEvent`, `Mode`) |
//! | [`output`] | Console formatting of build events |
//!
//! # Page Source Format
//!
//! ```text
//! ^title Getting Started
//! ^category core
//! # Setup
//! Install the tool.
//! ```
//!
//! `^title` and `^category` lines set the page metadata and are removed from
//! the body. Any other `^command` is reported and dropped. Header lines get
//! a `<a class="header-anchor">` self-link whose slug is the lowercased header
//! text with spaces turned into hyphens and `. ? ! : / *` removed.

pub mod config;
pub mod highlight;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod preprocess;
pub mod render;
pub mod staleness;
pub mod style;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
