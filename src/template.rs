//! Page templates and keyed placeholder substitution.
//!
//! A template is an HTML file containing `{name}` placeholders. `{{` and `}}`
//! stand for literal braces, so inline CSS or JavaScript in a template has to
//! double its braces. Page templates may only reference the fields in
//! [`PAGE_FIELDS`]; both syntax and field names are checked when the
//! [`TemplateStore`] loads, so a bad template fails the run before any page
//! is written.
//!
//! Substituted values are inserted verbatim and never re-scanned, so page
//! content containing braces cannot interfere with the substitution.

use crate::config::SitePaths;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholders every page template can use.
pub const PAGE_FIELDS: &[&str] = &["title", "html", "mod", "category"];

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unmatched '{brace}' at byte {offset}")]
    UnmatchedBrace { brace: char, offset: usize },
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),
    #[error("{path}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<TemplateError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed page template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text, rejecting unbalanced braces.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, n) in chars.by_ref() {
                        match n {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => break,
                            _ => name.push(n),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::UnmatchedBrace { brace: '{', offset });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(TemplateError::UnmatchedBrace { brace: '}', offset }),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Read and parse a template file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|e| TemplateError::InFile {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder from `fields`.
    ///
    /// Fails on the first placeholder that has no value.
    pub fn render(&self, fields: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = fields
                        .get(name.as_str())
                        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// The two page templates, loaded once at startup and shared read-only by
/// every page of a run.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    pub default: Template,
    pub core: Template,
}

impl TemplateStore {
    pub fn load(paths: &SitePaths) -> Result<Self, TemplateError> {
        Ok(Self {
            default: load_page_template(&paths.default_template)?,
            core: load_page_template(&paths.core_template)?,
        })
    }
}

/// Load a template and reject placeholders outside [`PAGE_FIELDS`].
fn load_page_template(path: &Path) -> Result<Template, TemplateError> {
    let template = Template::load(path)?;
    if let Some(name) = template
        .placeholders()
        .find(|name| !PAGE_FIELDS.contains(name))
    {
        return Err(TemplateError::InFile {
            path: path.to_path_buf(),
            source: Box::new(TemplateError::UnknownPlaceholder(name.to_string())),
        });
    }
    Ok(template)
}
