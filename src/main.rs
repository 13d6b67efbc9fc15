use clap::Parser;
use docgen::config;
use docgen::output;
use docgen::pipeline::{self, Site};
use docgen::types::BuildEvent;
use std::path::PathBuf;

fn version_string() -> &'static str {
    let tagged = env!("DOCGEN_TAGGED");
    let revision = env!("DOCGEN_REVISION");
    if tagged == "true" {
        env!("CARGO_PKG_VERSION")
    } else if revision.is_empty() {
        "dev@unknown"
    } else {
        // Leaked once at startup
        Box::leak(format!("dev@{revision}").into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "docgen")]
#[command(about = "Build the documentation site from annotated markdown")]
#[command(long_about = "\
Build the documentation site from annotated markdown

Every *.markdown file under the source directory is converted to an HTML
page at the same relative path under the output directory. The output
directory is emptied first.

Source layout:

  doc/site/
  ├── config.toml              # Optional, see --gen-config
  ├── template.html            # Default page template
  ├── template-core.html       # Template for `^category core` pages
  ├── style.scss               # Compiled to <output>/style.css with sass
  ├── index.markdown
  └── modules/
      └── core.markdown        # → build/docs/modules/core.html

Page directives (removed from the rendered page):

  ^title Getting Started       # {title} in the template
  ^category core               # {category}; `core` selects template-core.html

Templates receive {title}, {html}, {mod} (source modification date) and
{category}. Write {{ and }} for literal braces.

With --watch, keeps running after the first build and reconverts pages whose
source or template changed, polling every 300ms by default.")]
#[command(version = version_string())]
struct Cli {
    /// Keep running and rebuild stale pages as sources change
    #[arg(long)]
    watch: bool,

    /// Documentation source directory
    #[arg(long, default_value = "doc/site")]
    source: PathBuf,

    /// Output directory (deleted and recreated on every run)
    #[arg(long, default_value = "build/docs")]
    output: PathBuf,

    /// Print a stock config.toml with all options documented and exit
    #[arg(long, conflicts_with = "watch")]
    gen_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site = Site::open(&cli.source, &cli.output)?;
    let mut report = |event: BuildEvent| output::print_event(&event);

    let summary = pipeline::run_once(&site, &mut report)?;
    output::print_summary(&summary, &cli.output);

    if cli.watch {
        output::print_watch_banner(&cli.source);
        pipeline::watch(&site, &mut report)?;
    }

    Ok(())
}
