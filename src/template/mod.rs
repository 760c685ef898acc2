//! Notification template rendering.
//!
//! This module provides:
//! - Resolution of a [`TemplateSource`](crate::catalog::TemplateSource) to
//!   either its inline text or its template file
//! - A parser and executor for Go-style `{{.Field}}` templates
//! - HTML escaping of every value an action prints
//!
//! Escaping is plain HTML-text escaping wherever the action appears. There
//! is no context awareness: values inside `href`/`src` attributes are not
//! URL-filtered, and values inside `<script>` or `style` are not JS/CSS
//! escaped. Keep actions in those positions out of templates fed with
//! untrusted data.
//!
//! Supported actions: `{{.}}`, `{{.A.B}}`, `{{$.A}}`, string/number/bool
//! literals, `{{if}}`, `{{with}}`, `{{range}}` (each with `{{else}}`, and
//! `{{else if}}`), comments `{{/* ... */}}`, and the `{{-`/`-}}` trim markers.
//!
//! # Example
//!
//! ```ignore
//! let event = catalog.event("user.registered").unwrap();
//! let body = event.template_for("en").render(&json!({"Name": "Ada"}))?;
//! assert_eq!(body, b"Hello Ada");
//! ```

mod engine;
mod exec;
mod parse;
mod source;
mod types;

pub use engine::Template;
pub use source::{render, TemplateBody};
pub use types::{RenderError, RenderResult};
