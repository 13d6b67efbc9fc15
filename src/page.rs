//! Page assembly: wrapping a rendered fragment in its page template.
//!
//! The template is chosen by the page's category (the core category gets the
//! core template, everything else the default one) and receives exactly four
//! fields:
//!
//! | Placeholder  | Value |
//! |--------------|-------|
//! | `{title}`    | `^title` directive, empty if absent |
//! | `{html}`     | rendered markdown fragment |
//! | `{mod}`      | source file's modification date, e.g. `March 07, 2024` |
//! | `{category}` | `^category` directive, empty if absent |

use crate::template::{Template, TemplateError, TemplateStore};
use crate::types::PageMetadata;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::time::SystemTime;
use thiserror::Error;

/// strftime pattern for the `{mod}` field.
const MODIFIED_FORMAT: &str = "%B %d, %Y";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}

/// Format a file modification time in local time, e.g. `March 07, 2024`.
pub fn format_modified(modified: SystemTime) -> String {
    DateTime::<Local>::from(modified)
        .format(MODIFIED_FORMAT)
        .to_string()
}

/// Pick the template for a page category.
pub fn select_template<'a>(
    store: &'a TemplateStore,
    category: &str,
    core_category: &str,
) -> &'a Template {
    if category == core_category {
        &store.core
    } else {
        &store.default
    }
}

/// Build the final HTML document for one page.
pub fn assemble(
    store: &TemplateStore,
    core_category: &str,
    metadata: &PageMetadata,
    html: &str,
    modified: SystemTime,
) -> Result<String, PageError> {
    let modified = format_modified(modified);
    let fields: HashMap<&str, &str> = HashMap::from([
        ("title", metadata.title.as_str()),
        ("html", html),
        ("mod", modified.as_str()),
        ("category", metadata.category.as_str()),
    ]);
    let template = select_template(store, &metadata.category, core_category);
    Ok(template.render(&fields)?)
}
