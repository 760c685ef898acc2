//! End-to-end tests over catalog documents
//!
//! These tests go from raw document bytes through validation, language
//! lookup and rendering, the way the publishing side uses the crate.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use ara_notification_catalog::catalog::Catalog;
use ara_notification_catalog::error::AppError;
use ara_notification_catalog::template::RenderError;
use ara_notification_catalog::validation::{self, ValidationError};

fn package_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn sample_catalog() -> Catalog {
    validation::load_file(package_path("config/catalog.yaml")).expect("sample catalog is valid")
}

#[test]
fn test_sample_catalog_is_valid() {
    let catalog = sample_catalog();

    assert_eq!(catalog.amqp.exchange, "notifications");
    assert_eq!(catalog.amqp.tag, "ara-mailer");
    assert_eq!(catalog.languages.len(), 2);
    assert_eq!(catalog.events.len(), 2);
    assert!(catalog.violations().is_empty());
}

#[test]
fn test_render_inline_for_requested_language() {
    let catalog = sample_catalog();
    let requested = "en";

    assert!(catalog.contains_language(requested));
    let event = catalog.event("user.registered").unwrap();
    let template = event.template_for(requested);

    assert_eq!(template.subject, "Welcome to Ara");
    let body = template.render(&json!({"Name": "Ada"})).unwrap();
    assert_eq!(body, "Hello Ada, welcome aboard!".as_bytes());
}

#[test]
fn test_render_file_template() {
    let catalog = sample_catalog();
    let event = catalog.event_by_key("order.shipped").unwrap();

    // Template paths in the sample catalog are relative to the package root
    let mut template = event.template_for("EN").clone();
    template.template_path = template
        .template_path
        .map(|p| package_path(&p).display().to_string());

    let data = json!({
        "Name": "Ada",
        "Order": {"Id": 1042, "Carrier": "Nova Poshta", "Items": ["Lamp", "Desk & Chair"]}
    });
    let body = String::from_utf8(template.render(&data).unwrap()).unwrap();

    assert_eq!(
        body,
        "<p>Hi Ada,</p>\n\
         <p>Order #1042 is on its way via Nova Poshta.</p>\n\
         <ul>\n  <li>Lamp</li>\n  <li>Desk &amp; Chair</li>\n</ul>\n"
    );
}

#[test]
fn test_render_file_template_missing_field() {
    let catalog = sample_catalog();
    let event = catalog.event("order.shipped").unwrap();

    let mut template = event.template_for("uk").clone();
    template.template_path = template
        .template_path
        .map(|p| package_path(&p).display().to_string());

    let err = template.render(&json!({"Name": "Ada"})).unwrap_err();
    match err {
        RenderError::Exec { name, line, .. } => {
            assert_eq!(name, "order_shipped.html");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unsupported_language_gets_empty_template() {
    let catalog = sample_catalog();
    let event = catalog.event("user.registered").unwrap();

    assert!(!catalog.contains_language("DE"));
    let template = event.template_for("de");
    assert!(template.is_empty());
    assert!(matches!(
        template.render(&json!({})),
        Err(RenderError::Empty { .. })
    ));
}

#[test]
fn test_missing_language_scenario() {
    let doc = r#"
amqp:
  exchange: notifications
  tag: mailer
languages:
  - code: EN
events:
  - name: password.reset
    key: password.reset
    templates:
      UK:
        subject: Reset
        template: "x"
"#;
    let err = validation::validate(doc.as_bytes()).unwrap_err();
    match err {
        ValidationError::MissingLanguageTemplate { event, language } => {
            assert_eq!(event, "password.reset");
            assert_eq!(language, "EN");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_lowercase_language_code_scenario() {
    let doc = r#"
amqp: { exchange: notifications, tag: mailer }
languages:
  - code: en
    name: English
events: []
"#;
    let err = validation::validate(doc.as_bytes()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "language \"en\" should be a non-empty upper-case code"
    );
}

#[test]
fn test_conflicting_sources_scenario() {
    let doc = r#"
amqp: { exchange: notifications, tag: mailer }
languages:
  - code: EN
events:
  - name: password.reset
    key: password.reset
    templates:
      EN:
        subject: Reset
        template: "x"
        template_path: "y.tmpl"
"#;
    let err = validation::validate(doc.as_bytes()).unwrap_err();
    assert!(matches!(err, ValidationError::TemplateConflict));
}

#[test]
fn test_load_file_reports_io_and_validation_errors() {
    let err = validation::load_file("/nonexistent/catalog.yaml").unwrap_err();
    assert!(matches!(err, AppError::Io { .. }));
    assert_eq!(err.code(), "IO_ERROR");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "amqp: {{ exchange: x, tag: y }}\nlanguages:\n  - code: fr").unwrap();

    let err = validation::load_file(file.path()).unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::LanguageFormat { .. })
    ));
}

#[test]
fn test_catalog_shared_across_threads() {
    let catalog = Arc::new(sample_catalog());
    let names = ["Ada", "Bob", "Cy"];

    let handles: Vec<_> = names
        .into_iter()
        .map(|name| {
            let catalog = catalog.clone();
            std::thread::spawn(move || {
                let event = catalog.event("user.registered").unwrap();
                event
                    .template_for("uk")
                    .render(&json!({ "Name": name }))
                    .unwrap()
            })
        })
        .collect();

    for (handle, name) in handles.into_iter().zip(names) {
        let body = String::from_utf8(handle.join().unwrap()).unwrap();
        assert_eq!(body, format!("Вітаємо, {name}!"));
    }
}
