//! The build pipeline: discover page sources and convert each to HTML.
//!
//! A run has two phases:
//!
//! 1. **Initial pass**: the output directory is deleted and recreated, the
//!    stylesheet is compiled if stale, and every page is converted.
//! 2. **Watch** (`--watch` only): forever, compile the stylesheet if stale,
//!    convert pages whose output is out of date, then sleep for the poll
//!    interval. The loop only ends when the process is killed.
//!
//! Converting one page:
//!
//! ```text
//! guide.markdown ─▶ preprocess ─▶ render ─▶ assemble ─▶ guide.html
//!                   (directives,  (pulldown  (template
//!                    anchors)      -cmark)    by category)
//! ```
//!
//! Everything runs on the calling thread, one blocking step at a time.
//! Killing the process mid-write can leave a truncated output page; the next
//! initial pass rebuilds it from scratch.

use crate::config::{ConfigError, SiteConfig, SitePaths};
use crate::page::{self, PageError};
use crate::preprocess::{self, Warning};
use crate::render;
use crate::staleness;
use crate::style::{StyleBuilder, StyleError};
use crate::template::{TemplateError, TemplateStore};
use crate::types::{BuildEvent, Mode};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use walkdir::WalkDir;

/// Extension given to every output page.
const OUTPUT_EXTENSION: &str = "html";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Template(#[from] TemplateError),
    #[error("{0}")]
    Page(#[from] PageError),
    #[error("{0}")]
    Style(#[from] StyleError),
    #[error("{path}: {source}")]
    InPage {
        path: PathBuf,
        source: Box<PipelineError>,
    },
}

/// Everything a pass needs, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Site {
    pub config: SiteConfig,
    pub paths: SitePaths,
    pub templates: TemplateStore,
}

impl Site {
    /// Load the page templates for an already-resolved configuration.
    pub fn load(config: SiteConfig, paths: SitePaths) -> Result<Self, PipelineError> {
        let templates = TemplateStore::load(&paths)?;
        Ok(Self {
            config,
            paths,
            templates,
        })
    }

    /// Read `config.toml` from the source root and load the templates.
    pub fn open(source_root: &Path, output_root: &Path) -> Result<Self, PipelineError> {
        let config = crate::config::load_config(source_root)?;
        let paths = SitePaths::resolve(&config, source_root, output_root);
        Self::load(config, paths)
    }

    fn style_builder(&self) -> StyleBuilder {
        StyleBuilder::new(
            self.config.stylesheet.compiler.as_str(),
            &self.paths.stylesheet_source,
            &self.paths.stylesheet_output,
        )
    }
}

/// What happened to a single page during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Converted,
    UpToDate,
}

/// Counts for one pass over the source tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub converted: usize,
    pub up_to_date: usize,
    pub failed: usize,
    pub stylesheet_built: bool,
}

/// Find every page source under `source_root`.
///
/// Returns paths relative to `source_root`, in file-name order per directory.
pub fn discover_pages(source_root: &Path, extension: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let suffix = format!(".{extension}");
    let mut pages = Vec::new();
    for entry in WalkDir::new(source_root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(&suffix));
        if matches {
            let relative = entry
                .path()
                .strip_prefix(source_root)
                .unwrap_or(entry.path())
                .to_path_buf();
            pages.push(relative);
        }
    }
    Ok(pages)
}

/// Output location for a page: same relative path, `.html` extension.
pub fn output_path(output_root: &Path, relative: &Path) -> PathBuf {
    output_root.join(relative).with_extension(OUTPUT_EXTENSION)
}

/// Delete the output directory (if present) and recreate it empty.
pub fn clean_output(output_root: &Path) -> io::Result<()> {
    if output_root.exists() {
        fs::remove_dir_all(output_root)?;
    }
    fs::create_dir_all(output_root)
}

/// Convert one page, identified by its path relative to the source root.
///
/// In [`Mode::Incremental`] the page is skipped when its output is newer
/// than both the source and the default template.
pub fn convert_page(
    site: &Site,
    relative: &Path,
    mode: Mode,
    on_event: &mut dyn FnMut(BuildEvent),
) -> Result<Outcome, PipelineError> {
    convert_page_inner(site, relative, mode, on_event).map_err(|e| PipelineError::InPage {
        path: relative.to_path_buf(),
        source: Box::new(e),
    })
}

fn convert_page_inner(
    site: &Site,
    relative: &Path,
    mode: Mode,
    on_event: &mut dyn FnMut(BuildEvent),
) -> Result<Outcome, PipelineError> {
    let source = site.paths.source_root.join(relative);
    let output = output_path(&site.paths.output_root, relative);

    if mode.skips_up_to_date()
        && staleness::is_up_to_date(&source, &output, &site.paths.default_template)?
    {
        return Ok(Outcome::UpToDate);
    }

    let text = fs::read_to_string(&source)?;
    let preprocessed = preprocess::preprocess(&text);
    for warning in preprocessed.warnings {
        match warning {
            Warning::UnknownCommand { command, args } => {
                on_event(BuildEvent::UnknownDirective { command, args });
            }
        }
    }

    let html = render::render_markdown(&preprocessed.body, &site.config.markdown);
    let modified = staleness::modified(&source)?;
    let document = page::assemble(
        &site.templates,
        &site.config.templates.core_category,
        &preprocessed.metadata,
        &html,
        modified,
    )?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, document)?;

    on_event(BuildEvent::Converted {
        path: relative.to_path_buf(),
    });
    Ok(Outcome::Converted)
}

/// Pages whose last incremental conversion failed, keyed to the source
/// modification time seen at that failure.
///
/// A failing page stays stale and is retried on every poll; this is what
/// keeps it from being reported again until its source changes.
#[derive(Debug, Default)]
pub struct FailedPages(HashMap<PathBuf, Option<SystemTime>>);

impl FailedPages {
    /// Remember a failure. Returns true when this page has not already been
    /// reported at this modification time.
    fn record(&mut self, relative: &Path, modified: Option<SystemTime>) -> bool {
        self.0.insert(relative.to_path_buf(), modified) != Some(modified)
    }

    fn forget(&mut self, relative: &Path) {
        self.0.remove(relative);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Compile the stylesheet if stale, then convert pages.
///
/// A [`Mode::Full`] pass stops at the first failing page. A
/// [`Mode::Incremental`] pass reports the failure as
/// [`BuildEvent::PageFailed`] and moves on; the page stays stale and is
/// retried on the next pass. Stylesheet failures always abort.
pub fn build_pass(
    site: &Site,
    mode: Mode,
    on_event: &mut dyn FnMut(BuildEvent),
) -> Result<PassSummary, PipelineError> {
    build_pass_tracking(site, mode, &mut FailedPages::default(), on_event)
}

/// [`build_pass`] that carries failure reports across passes.
///
/// A page already in `failures` with an unchanged source modification time
/// is still retried and counted in [`PassSummary::failed`], but no second
/// [`BuildEvent::PageFailed`] is emitted for it.
pub fn build_pass_tracking(
    site: &Site,
    mode: Mode,
    failures: &mut FailedPages,
    on_event: &mut dyn FnMut(BuildEvent),
) -> Result<PassSummary, PipelineError> {
    let mut summary = PassSummary::default();

    if site.style_builder().build_if_stale()? {
        summary.stylesheet_built = true;
        on_event(BuildEvent::StylesheetBuilt);
    }

    let pages = discover_pages(&site.paths.source_root, &site.config.markdown.extension)?;
    failures.0.retain(|path, _| pages.contains(path));
    for relative in &pages {
        match convert_page(site, relative, mode, on_event) {
            Ok(outcome) => {
                failures.forget(relative);
                match outcome {
                    Outcome::Converted => summary.converted += 1,
                    Outcome::UpToDate => summary.up_to_date += 1,
                }
            }
            Err(e) if mode == Mode::Incremental => {
                summary.failed += 1;
                let modified = staleness::modified(&site.paths.source_root.join(relative)).ok();
                if !failures.record(relative, modified) {
                    continue;
                }
                let message = match e {
                    PipelineError::InPage { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                on_event(BuildEvent::PageFailed {
                    path: relative.clone(),
                    message,
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(summary)
}

/// Initial pass: wipe the output directory and convert everything.
pub fn run_once(
    site: &Site,
    on_event: &mut dyn FnMut(BuildEvent),
) -> Result<PassSummary, PipelineError> {
    clean_output(&site.paths.output_root)?;
    build_pass(site, Mode::Full, on_event)
}

/// Poll the source tree forever, rebuilding stale pages.
///
/// Only returns on a stylesheet or source-tree error.
pub fn watch(site: &Site, on_event: &mut dyn FnMut(BuildEvent)) -> Result<(), PipelineError> {
    let interval = Duration::from_millis(site.config.watch.poll_interval_ms);
    let mut failures = FailedPages::default();
    loop {
        build_pass_tracking(site, Mode::Incremental, &mut failures, on_event)?;
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{fixture_config, set_mtime, setup_fixtures, write_file};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn fixture_site(tmp: &tempfile::TempDir) -> Site {
        let (config, paths) = fixture_config(tmp);
        Site::load(config, paths).unwrap()
    }

    fn collect(site: &Site, mode: Mode) -> (PassSummary, Vec<BuildEvent>) {
        let mut events = Vec::new();
        let summary = build_pass(site, mode, &mut |e| events.push(e)).unwrap();
        (summary, events)
    }

    fn converted(events: &[BuildEvent]) -> Vec<PathBuf> {
        events
            .iter()
            .filter_map(|e| match e {
                BuildEvent::Converted { path } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    fn t(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    #[test]
    fn discovers_markdown_recursively_in_order() {
        let tmp = setup_fixtures();
        let pages = discover_pages(&tmp.path().join("site"), "markdown").unwrap();
        assert_eq!(
            pages,
            vec![
                PathBuf::from("guide.markdown"),
                PathBuf::from("index.markdown"),
                PathBuf::from("modules/core.markdown"),
            ]
        );
    }

    #[test]
    fn output_path_mirrors_source() {
        assert_eq!(
            output_path(Path::new("build/docs"), Path::new("modules/core.markdown")),
            PathBuf::from("build/docs/modules/core.html")
        );
        assert_eq!(
            output_path(Path::new("out"), Path::new("a.b.markdown")),
            PathBuf::from("out/a.b.html")
        );
    }

    #[test]
    fn clean_output_removes_previous_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("out");
        write_file(&out.join("stale/old.html"), "old");
        clean_output(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn run_once_converts_every_page() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        let mut events = Vec::new();
        let summary = run_once(&site, &mut |e| events.push(e)).unwrap();

        assert_eq!(summary.converted, 3);
        assert!(summary.stylesheet_built);
        assert_eq!(events[0], BuildEvent::StylesheetBuilt);
        assert_eq!(converted(&events).len(), 3);

        let out = tmp.path().join("out");
        assert!(out.join("guide.html").is_file());
        assert!(out.join("index.html").is_file());
        assert!(out.join("modules/core.html").is_file());
        assert!(out.join("style.css").is_file());
        assert!(!out.join("notes").exists());
    }

    #[test]
    fn guide_page_uses_core_template() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        run_once(&site, &mut |_| {}).unwrap();

        let html = fs::read_to_string(tmp.path().join("out/guide.html")).unwrap();
        assert!(html.contains(
            r##"<h1>Setup <a href="#setup" name="setup" class="header-anchor">#</a></h1>"##
        ));
        assert!(html.contains("<title>Getting Started – Core Library</title>"));
        assert!(html.contains("<p>Install the tool.</p>"));
        assert!(!html.contains("^title"));
    }

    #[test]
    fn default_template_keeps_literal_braces() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        run_once(&site, &mut |_| {}).unwrap();

        let html = fs::read_to_string(tmp.path().join("out/index.html")).unwrap();
        assert!(html.contains("<title>Welcome – Docs</title>"));
        assert!(html.contains(".header-anchor { visibility: hidden; }"));
        assert!(html.contains("<body class=\"\">"));
        assert!(html.contains("<dt>Language guide</dt>"));
    }

    #[test]
    fn unknown_directive_reported() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        let mut events = Vec::new();
        run_once(&site, &mut |e| events.push(e)).unwrap();

        assert!(events.contains(&BuildEvent::UnknownDirective {
            command: "fixme".into(),
            args: "link the class index".into(),
        }));
        let html = fs::read_to_string(tmp.path().join("out/modules/core.html")).unwrap();
        assert!(!html.contains("fixme"));
        assert!(html.contains(r##"name="café-menu""##));
        assert!(html.contains(r##"name="object-methods""##));
    }

    #[test]
    fn one_shot_is_idempotent() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        let read_all = || {
            ["guide.html", "index.html", "modules/core.html"]
                .map(|p| fs::read(tmp.path().join("out").join(p)).unwrap())
        };

        run_once(&site, &mut |_| {}).unwrap();
        let first = read_all();
        run_once(&site, &mut |_| {}).unwrap();
        assert_eq!(first, read_all());
    }

    #[test]
    fn incremental_pass_skips_fresh_pages() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        run_once(&site, &mut |_| {}).unwrap();

        let src = tmp.path().join("site");
        let out = tmp.path().join("out");
        for page in ["guide", "index", "modules/core"] {
            set_mtime(&src.join(format!("{page}.markdown")), t(10));
            set_mtime(&out.join(format!("{page}.html")), t(20));
        }
        set_mtime(&src.join("template.html"), t(10));

        let (summary, events) = collect(&site, Mode::Incremental);
        assert_eq!(summary.converted, 0);
        assert_eq!(summary.up_to_date, 3);
        assert!(converted(&events).is_empty());
    }

    #[test]
    fn incremental_pass_rebuilds_touched_page() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        run_once(&site, &mut |_| {}).unwrap();

        let src = tmp.path().join("site");
        let out = tmp.path().join("out");
        for page in ["guide", "index", "modules/core"] {
            set_mtime(&src.join(format!("{page}.markdown")), t(10));
            set_mtime(&out.join(format!("{page}.html")), t(20));
        }
        set_mtime(&src.join("template.html"), t(10));
        set_mtime(&src.join("index.markdown"), t(30));

        let (summary, events) = collect(&site, Mode::Incremental);
        assert_eq!(summary.converted, 1);
        assert_eq!(converted(&events), vec![PathBuf::from("index.markdown")]);
    }

    #[test]
    fn template_change_rebuilds_everything() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        run_once(&site, &mut |_| {}).unwrap();

        let src = tmp.path().join("site");
        let out = tmp.path().join("out");
        for page in ["guide", "index", "modules/core"] {
            set_mtime(&src.join(format!("{page}.markdown")), t(10));
            set_mtime(&out.join(format!("{page}.html")), t(20));
        }
        set_mtime(&src.join("template.html"), t(30));

        let (summary, _) = collect(&site, Mode::Incremental);
        assert_eq!(summary.converted, 3);
    }

    #[test]
    fn new_page_picked_up_incrementally() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        run_once(&site, &mut |_| {}).unwrap();

        write_file(
            &tmp.path().join("site/api/list.markdown"),
            "^title List\n# Methods\n",
        );
        let (_, events) = collect(&site, Mode::Incremental);
        assert!(converted(&events).contains(&PathBuf::from("api/list.markdown")));
        assert!(tmp.path().join("out/api/list.html").is_file());
    }

    #[test]
    fn full_pass_fails_fast_on_bad_page() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        fs::write(tmp.path().join("site/broken.markdown"), [0xff, 0xfe, 0x00]).unwrap();

        let err = run_once(&site, &mut |_| {}).unwrap_err();
        assert!(
            matches!(err, PipelineError::InPage { ref path, .. } if path == Path::new("broken.markdown"))
        );
    }

    #[test]
    fn incremental_pass_reports_bad_page_and_continues() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        fs::write(tmp.path().join("site/broken.markdown"), [0xff, 0xfe, 0x00]).unwrap();

        let (summary, events) = collect(&site, Mode::Incremental);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.converted, 3);
        assert!(events.iter().any(|e| matches!(
            e,
            BuildEvent::PageFailed { path, .. } if path == Path::new("broken.markdown")
        )));
    }

    #[test]
    fn failing_page_reported_once_until_source_changes() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        let broken = tmp.path().join("site/broken.markdown");
        fs::write(&broken, [0xff, 0xfe, 0x00]).unwrap();
        set_mtime(&broken, t(1_000));

        let mut failures = FailedPages::default();
        let pass = |failures: &mut FailedPages| {
            let mut events = Vec::new();
            let summary =
                build_pass_tracking(&site, Mode::Incremental, failures, &mut |e| events.push(e))
                    .unwrap();
            let reported = events
                .iter()
                .filter(|e| matches!(e, BuildEvent::PageFailed { .. }))
                .count();
            (summary.failed, reported)
        };

        assert_eq!(pass(&mut failures), (1, 1));
        assert_eq!(pass(&mut failures), (1, 0));
        assert_eq!(pass(&mut failures), (1, 0));

        set_mtime(&broken, t(2_000));
        assert_eq!(pass(&mut failures), (1, 1));
        assert_eq!(pass(&mut failures), (1, 0));
    }

    #[test]
    fn fixed_page_forgotten_then_reported_if_broken_again() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        let page = tmp.path().join("site/flaky.markdown");
        let later = SystemTime::now() + Duration::from_secs(3_600);
        let mut failures = FailedPages::default();

        fs::write(&page, [0xff, 0xfe, 0x00]).unwrap();
        set_mtime(&page, later);
        build_pass_tracking(&site, Mode::Incremental, &mut failures, &mut |_| {}).unwrap();
        assert!(!failures.is_empty());

        fs::write(&page, "^title Flaky\nFine now.\n").unwrap();
        build_pass_tracking(&site, Mode::Incremental, &mut failures, &mut |_| {}).unwrap();
        assert!(failures.is_empty());

        fs::write(&page, [0xff, 0xfe, 0x00]).unwrap();
        set_mtime(&page, later);
        let mut events = Vec::new();
        build_pass_tracking(&site, Mode::Incremental, &mut failures, &mut |e| events.push(e))
            .unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            BuildEvent::PageFailed { path, .. } if path == Path::new("flaky.markdown")
        )));
    }

    #[test]
    fn missing_stylesheet_aborts_pass() {
        let tmp = setup_fixtures();
        let site = fixture_site(&tmp);
        fs::remove_file(tmp.path().join("site/style.scss")).unwrap();

        let err = run_once(&site, &mut |_| {}).unwrap_err();
        assert!(matches!(err, PipelineError::Style(StyleError::MissingSource(_))));
    }

    #[test]
    fn site_open_reads_config_file() {
        let tmp = setup_fixtures();
        write_file(
            &tmp.path().join("site/config.toml"),
            "[stylesheet]\ncompiler = \"cp\"\n[markdown]\nextension = \"txt\"\n",
        );
        let site = Site::open(&tmp.path().join("site"), &tmp.path().join("out")).unwrap();
        let (summary, events) = collect(&site, Mode::Full);
        assert_eq!(summary.converted, 1);
        assert_eq!(converted(&events), vec![PathBuf::from("notes/draft.txt")]);
        assert!(tmp.path().join("out/notes/draft.html").is_file());
    }
}
