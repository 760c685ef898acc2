//! Parsed templates

use serde_json::Value;

use super::exec::Exec;
use super::parse::{parse, Node};
use super::types::RenderResult;

/// A parsed template, ready to execute.
///
/// Templates are not cached; each render parses its source again.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template text. `name` only appears in diagnostics.
    pub fn parse(name: impl Into<String>, text: &str) -> RenderResult<Self> {
        let name = name.into();
        let nodes = parse(&name, text)?;
        Ok(Self { name, nodes })
    }

    /// Template name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute against `data`, returning the rendered bytes
    pub fn execute(&self, data: &Value) -> RenderResult<Vec<u8>> {
        Exec::new(&self.name, data).run(&self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::template::RenderError;

    #[test]
    fn test_parse_once_execute_many() {
        let template = Template::parse("greeting", "Hello {{.Name}}").unwrap();
        assert_eq!(template.name(), "greeting");
        assert_eq!(template.execute(&json!({"Name": "Ada"})).unwrap(), b"Hello Ada");
        assert_eq!(template.execute(&json!({"Name": "Bob"})).unwrap(), b"Hello Bob");
    }

    #[test]
    fn test_errors_carry_template_name() {
        let err = Template::parse("greeting", "{{if .X}}").unwrap_err();
        assert!(matches!(err, RenderError::Parse { ref name, .. } if name == "greeting"));
        assert_eq!(err.to_string(), "template: greeting:1: unexpected EOF, missing {{end}}");
    }
}
