//! Catalog validation.
//!
//! Decoding a catalog document and checking it happen in one pass:
//!
//! 1. the YAML document is decoded into a [`Catalog`]
//! 2. every language code must be non-blank and upper-case
//! 3. for each event in turn, no template may set both `template` and
//!    `template_path`, every template key must be upper-case, and there
//!    must be a template for every declared language
//!
//! The first violation wins. Template keys for languages that are not
//! declared at the top level are accepted; only missing coverage is an error.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::catalog::{is_upper_case, Catalog};
use crate::error::{AppError, Result};

/// Validation-specific error type
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Decode(#[from] serde_yaml::Error),

    #[error("language \"{code}\" should be a non-empty upper-case code")]
    LanguageFormat { code: String },

    #[error("template and template path are both specified")]
    TemplateConflict,

    #[error("language \"{language}\" in event \"{event}\" should be uppercased")]
    TemplateKeyCase { event: String, language: String },

    #[error("language \"{language}\" in event \"{event}\" is not defined")]
    MissingLanguageTemplate { event: String, language: String },
}

/// Result type for validation operations
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Decode a catalog document and check it, discarding the decoded value
pub fn validate<R: Read>(reader: R) -> ValidationResult<()> {
    load(reader).map(|_| ())
}

/// Decode a catalog document and check it
pub fn load<R: Read>(reader: R) -> ValidationResult<Catalog> {
    let catalog = decode(reader)?;
    catalog.validate()?;

    tracing::debug!(
        languages = catalog.languages.len(),
        events = catalog.events.len(),
        "Catalog validated"
    );

    Ok(catalog)
}

/// Decode a catalog document without checking it
pub fn decode<R: Read>(reader: R) -> ValidationResult<Catalog> {
    Ok(serde_yaml::from_reader(reader)?)
}

/// Open and validate a catalog file
pub fn load_file(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AppError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(load(BufReader::new(file))?)
}

impl Catalog {
    /// Check an already decoded catalog, stopping at the first violation
    pub fn validate(&self) -> ValidationResult<()> {
        let mut first = None;
        self.scan(|err| {
            first = Some(err);
            false
        });

        first.map_or(Ok(()), Err)
    }

    /// Every violation in the catalog, in the order [`Catalog::validate`]
    /// would encounter them
    pub fn violations(&self) -> Vec<ValidationError> {
        let mut found = Vec::new();
        self.scan(|err| {
            found.push(err);
            true
        });

        found
    }

    /// Walk the catalog, handing each violation to `report`.
    /// The walk stops as soon as `report` returns `false`.
    fn scan<F>(&self, mut report: F)
    where
        F: FnMut(ValidationError) -> bool,
    {
        for lang in &self.languages {
            if !lang.is_valid() {
                let err = ValidationError::LanguageFormat {
                    code: lang.code.clone(),
                };
                if !report(err) {
                    return;
                }
            }
        }

        for event in &self.events {
            for (language, template) in &event.templates {
                if template.is_conflicting() && !report(ValidationError::TemplateConflict) {
                    return;
                }

                if !is_upper_case(language) {
                    let err = ValidationError::TemplateKeyCase {
                        event: event.name.clone(),
                        language: language.clone(),
                    };
                    if !report(err) {
                        return;
                    }
                }
            }

            for lang in &self.languages {
                if !event.templates.contains_key(&lang.code) {
                    let err = ValidationError::MissingLanguageTemplate {
                        event: event.name.clone(),
                        language: lang.code.clone(),
                    };
                    if !report(err) {
                        return;
                    }
                }
            }
        }
    }
}
