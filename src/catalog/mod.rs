//! Notification catalog model.
//!
//! A catalog describes where notifications are published (the AMQP
//! binding), which languages are supported, and for every event one
//! template per language.
//!
//! # Example
//!
//! ```yaml
//! amqp:
//!   exchange: notifications
//!   tag: mailer
//! languages:
//!   - code: EN
//!     name: English
//! events:
//!   - name: user.registered
//!     key: user.registered
//!     templates:
//!       EN:
//!         subject: Welcome
//!         template: "Hello {{.Name}}"
//! ```

mod types;

pub(crate) use types::is_upper_case;
pub use types::{AmqpBinding, Catalog, Event, Language, TemplateSource};
