use std::fs::File;
use std::io::BufReader;

use anyhow::{bail, Context, Result};

use ara_notification_catalog::catalog::Catalog;
use ara_notification_catalog::config::Settings;
use ara_notification_catalog::telemetry::init_tracing;
use ara_notification_catalog::validation;

fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new().context("Failed to load settings")?;
    init_tracing(&settings.log);

    let path = &settings.catalog.path;
    tracing::info!(path = %path, report_all = settings.catalog.report_all, "Validating notification catalog");

    let catalog = if settings.catalog.report_all {
        load_reporting_all(path)?
    } else {
        validation::load_file(path).map_err(|e| {
            tracing::error!(code = e.code(), error = %e, "Catalog rejected");
            e
        })?
    };

    tracing::info!(
        exchange = %catalog.amqp.exchange,
        tag = %catalog.amqp.tag,
        languages = catalog.languages.len(),
        events = catalog.events.len(),
        "Notification catalog is valid"
    );

    Ok(())
}

/// Decode the catalog and log every violation before rejecting it
fn load_reporting_all(path: &str) -> Result<Catalog> {
    let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
    let catalog = validation::decode(BufReader::new(file))?;

    let violations = catalog.violations();
    for violation in &violations {
        tracing::error!(error = %violation, "Catalog violation");
    }

    if !violations.is_empty() {
        bail!("{} catalog violation(s) in {}", violations.len(), path);
    }

    Ok(catalog)
}
