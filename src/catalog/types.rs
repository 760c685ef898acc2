//! Catalog document types

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

/// Zero-value template returned by [`Event::template_for`] on a miss
static EMPTY_TEMPLATE: TemplateSource = TemplateSource {
    subject: String::new(),
    template_path: None,
    template: None,
};

/// Message-bus binding the notifications are published through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmqpBinding {
    /// Exchange name
    pub exchange: String,

    /// Consumer tag
    pub tag: String,
}

/// A supported language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Upper-case language code, e.g. `EN`
    #[serde(default)]
    pub code: String,

    /// Human-readable language name
    #[serde(default)]
    pub name: String,
}

impl Language {
    /// A code is valid when it is non-blank and already upper-case
    pub fn is_valid(&self) -> bool {
        !self.code.trim().is_empty() && is_upper_case(&self.code)
    }
}

/// Where the body of one rendered message comes from.
///
/// `template` and `template_path` are mutually exclusive; blank values
/// (whitespace only) count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSource {
    /// Message subject, also used to name inline templates in diagnostics
    #[serde(default)]
    pub subject: String,

    /// Path to a template file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,

    /// Inline template body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl TemplateSource {
    /// Inline body, if it is not blank
    pub fn inline(&self) -> Option<&str> {
        non_blank(self.template.as_deref())
    }

    /// Template path, if it is not blank
    pub fn path(&self) -> Option<&str> {
        non_blank(self.template_path.as_deref())
    }

    /// Both an inline body and a path are set
    pub fn is_conflicting(&self) -> bool {
        self.inline().is_some() && self.path().is_some()
    }

    /// Neither an inline body nor a path is set
    pub fn is_empty(&self) -> bool {
        self.inline().is_none() && self.path().is_none()
    }
}

/// A named notification trigger with one template per language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event name
    pub name: String,

    /// Routing key on the exchange
    pub key: String,

    /// Templates keyed by upper-case language code
    #[serde(default, deserialize_with = "unique_templates")]
    pub templates: BTreeMap<String, TemplateSource>,
}

impl Event {
    /// Template for a language code, looked up case-insensitively.
    ///
    /// Returns an empty [`TemplateSource`] when the language has no entry;
    /// callers are expected to gate on [`Catalog::contains_language`] first.
    pub fn template_for(&self, code: &str) -> &TemplateSource {
        self.get_template(code).unwrap_or(&EMPTY_TEMPLATE)
    }

    /// Template for a language code, or `None` when it has no entry
    pub fn get_template(&self, code: &str) -> Option<&TemplateSource> {
        self.templates.get(&code.to_ascii_uppercase())
    }
}

/// Root of a notification catalog document.
///
/// Decoded once and then shared read-only; pass it explicitly to whatever
/// needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Message-bus binding
    pub amqp: AmqpBinding,

    /// Supported languages, in declared order
    #[serde(default)]
    pub languages: Vec<Language>,

    /// Events, in declared order
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Catalog {
    /// Whether a language is supported, compared case-insensitively
    pub fn contains_language(&self, code: &str) -> bool {
        self.language(code).is_some()
    }

    /// Language by code, compared case-insensitively
    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
    }

    /// Event by name
    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.name == name)
    }

    /// Event by routing key
    pub fn event_by_key(&self, key: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.key == key)
    }
}

/// Decode the template map, rejecting a language key that appears twice
fn unique_templates<'de, D>(deserializer: D) -> Result<BTreeMap<String, TemplateSource>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueTemplates;

    impl<'de> Visitor<'de> for UniqueTemplates {
        type Value = BTreeMap<String, TemplateSource>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of language codes to templates")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(BTreeMap::new())
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut templates = BTreeMap::new();
            while let Some((code, template)) = access.next_entry::<String, TemplateSource>()? {
                match templates.entry(code) {
                    Entry::Occupied(entry) => {
                        return Err(de::Error::custom(format_args!(
                            "template for language \"{}\" already defined",
                            entry.key()
                        )))
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(template);
                    }
                }
            }

            Ok(templates)
        }
    }

    deserializer.deserialize_map(UniqueTemplates)
}

/// `s` equals its own ASCII upper-cased form
pub(crate) fn is_upper_case(s: &str) -> bool {
    s == s.to_ascii_uppercase()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
