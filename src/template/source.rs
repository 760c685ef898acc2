//! Template source resolution and rendering

use std::fs;
use std::path::Path;

use serde::Serialize;

use super::engine::Template;
use super::types::{RenderError, RenderResult};
use crate::catalog::TemplateSource;

/// The body a [`TemplateSource`] resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateBody<'a> {
    /// Inline template text, named after the subject
    Inline { name: &'a str, text: &'a str },
    /// Template file on disk
    File(&'a Path),
}

impl<'a> TemplateBody<'a> {
    /// Pick the body of `source`. Exactly one of the inline text and the
    /// path must be non-blank.
    pub fn resolve(source: &'a TemplateSource) -> RenderResult<Self> {
        match (source.inline(), source.path()) {
            (Some(_), Some(_)) => Err(RenderError::Conflict {
                subject: source.subject.clone(),
            }),
            (Some(text), None) => Ok(TemplateBody::Inline {
                name: &source.subject,
                text,
            }),
            (None, Some(path)) => Ok(TemplateBody::File(Path::new(path.trim()))),
            (None, None) => Err(RenderError::Empty {
                subject: source.subject.clone(),
            }),
        }
    }

    /// Read (for files) and parse the body
    pub fn load(&self) -> RenderResult<Template> {
        match *self {
            TemplateBody::Inline { name, text } => Template::parse(name, text),
            TemplateBody::File(path) => {
                let text = fs::read_to_string(path).map_err(|source| RenderError::Load {
                    path: path.display().to_string(),
                    source,
                })?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());

                Template::parse(name, &text)
            }
        }
    }
}

/// Render a template source against `data`.
///
/// `data` can be any serializable value; templates address its fields
/// with `{{.Field}}`. A field the template references but `data` lacks is
/// an execution error.
pub fn render<T>(source: &TemplateSource, data: &T) -> RenderResult<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let template = TemplateBody::resolve(source)?.load()?;
    let data = serde_json::to_value(data)?;
    let rendered = template.execute(&data)?;

    tracing::debug!(
        subject = %source.subject,
        template = %template.name(),
        bytes = rendered.len(),
        "Template rendered"
    );

    Ok(rendered)
}

impl TemplateSource {
    /// Render this template against `data`
    pub fn render<T>(&self, data: &T) -> RenderResult<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        render(self, data)
    }
}
