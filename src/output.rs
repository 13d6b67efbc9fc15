//! CLI output formatting.
//!
//! The pipeline reports progress as [`BuildEvent`]s; this module turns them
//! into console lines. Each `format_*` function is pure (returns strings,
//! no I/O) so it can be tested directly, and a `print_*` wrapper writes the
//! result to stdout or stderr.
//!
//! # Output Format
//!
//! ```text
//! built css
//! UNKNOWN COMMAND: fixme link the class index
//! converted modules/core.markdown
//! converted guide.markdown
//! ==> Built 2 pages → build/docs
//! ==> Watching doc/site
//! error: api/list.markdown: template error: unknown placeholder {author}
//! ```

use crate::pipeline::PassSummary;
use crate::types::BuildEvent;
use std::path::Path;

/// Console line for a build event.
pub fn format_event(event: &BuildEvent) -> String {
    match event {
        BuildEvent::Converted { path } => format!("converted {}", path.display()),
        BuildEvent::StylesheetBuilt => "built css".to_string(),
        BuildEvent::UnknownDirective { command, args } => {
            format!("UNKNOWN COMMAND: {command} {args}")
        }
        BuildEvent::PageFailed { path, message } => {
            format!("error: {}: {}", path.display(), message)
        }
    }
}

/// Print a build event. Failures go to stderr, everything else to stdout.
pub fn print_event(event: &BuildEvent) {
    let line = format_event(event);
    match event {
        BuildEvent::PageFailed { .. } => eprintln!("{line}"),
        _ => println!("{line}"),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Closing line of the initial pass.
pub fn format_summary(summary: &PassSummary, output_root: &Path) -> String {
    format!(
        "==> Built {} → {}",
        plural(summary.converted, "page"),
        output_root.display()
    )
}

pub fn print_summary(summary: &PassSummary, output_root: &Path) {
    println!("{}", format_summary(summary, output_root));
}

/// Banner printed once when watch mode starts.
pub fn format_watch_banner(source_root: &Path) -> String {
    format!("==> Watching {}", source_root.display())
}

pub fn print_watch_banner(source_root: &Path) {
    println!("{}", format_watch_banner(source_root));
}
