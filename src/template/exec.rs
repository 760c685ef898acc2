//! Template execution against JSON data

use std::borrow::Cow;

use serde_json::Value;

use super::parse::{BlockKind, Node, Operand};
use super::types::{RenderError, RenderResult};

/// Walks a parsed tree, writing HTML-escaped output
pub(crate) struct Exec<'a> {
    name: &'a str,
    root: &'a Value,
    out: Vec<u8>,
}

impl<'a> Exec<'a> {
    pub(crate) fn new(name: &'a str, root: &'a Value) -> Self {
        Self {
            name,
            root,
            out: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, nodes: &[Node]) -> RenderResult<Vec<u8>> {
        self.walk(nodes, self.root)?;
        Ok(self.out)
    }

    fn walk(&mut self, nodes: &[Node], dot: &Value) -> RenderResult<()> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.extend_from_slice(text.as_bytes()),
                Node::Action { line, operand } => {
                    let value = self.eval(*line, operand, dot)?;
                    escape_html(&print(&value), &mut self.out);
                }
                Node::Block {
                    kind,
                    line,
                    operand,
                    body,
                    otherwise,
                } => {
                    let value = self.eval(*line, operand, dot)?;
                    match kind {
                        BlockKind::If if is_true(&value) => self.walk(body, dot)?,
                        BlockKind::With if is_true(&value) => self.walk(body, &value)?,
                        BlockKind::If | BlockKind::With => self.walk(otherwise, dot)?,
                        BlockKind::Range => self.range(*line, &value, body, otherwise, dot)?,
                    }
                }
            }
        }

        Ok(())
    }

    fn range(
        &mut self,
        line: usize,
        value: &Value,
        body: &[Node],
        otherwise: &[Node],
        dot: &Value,
    ) -> RenderResult<()> {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(self.exec_error(
                    line,
                    format!("range can't iterate over {}", print(other)),
                ))
            }
        };

        if items.is_empty() {
            return self.walk(otherwise, dot);
        }

        for item in items {
            self.walk(body, item)?;
        }

        Ok(())
    }

    fn eval<'v>(&self, line: usize, operand: &Operand, dot: &'v Value) -> RenderResult<Cow<'v, Value>>
    where
        'a: 'v,
    {
        match operand {
            Operand::Field { root, path } => {
                let mut value: &'v Value = if *root { self.root } else { dot };
                for field in path {
                    value = self.field(line, value, field)?;
                }
                Ok(Cow::Borrowed(value))
            }
            Operand::Str(s) => Ok(Cow::Owned(Value::String(s.clone()))),
            Operand::Number(n) => Ok(Cow::Owned(Value::Number(n.clone()))),
            Operand::Bool(b) => Ok(Cow::Owned(Value::Bool(*b))),
        }
    }

    fn field<'v>(&self, line: usize, value: &'v Value, field: &str) -> RenderResult<&'v Value> {
        match value {
            Value::Object(map) => map.get(field).ok_or_else(|| {
                self.exec_error(line, format!("map has no entry for key \"{field}\""))
            }),
            Value::Null => Err(self.exec_error(line, format!("nil pointer evaluating .{field}"))),
            other => Err(self.exec_error(
                line,
                format!("can't evaluate field {field} in type {}", kind(other)),
            )),
        }
    }

    fn exec_error(&self, line: usize, message: String) -> RenderError {
        RenderError::Exec {
            name: self.name.to_string(),
            line,
            message,
        }
    }
}

/// Go-template truthiness: zero values and empty collections are false
fn is_true(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn print(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(print).collect();
            format!("[{}]", items.join(" "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k}:{}", print(v)))
                .collect();
            format!("map[{}]", entries.join(" "))
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

fn escape_html(s: &str, out: &mut Vec<u8>) {
    for c in s.chars() {
        match c {
            '&' => out.extend_from_slice(b"&amp;"),
            '<' => out.extend_from_slice(b"&lt;"),
            '>' => out.extend_from_slice(b"&gt;"),
            '"' => out.extend_from_slice(b"&#34;"),
            '\'' => out.extend_from_slice(b"&#39;"),
            '+' => out.extend_from_slice(b"&#43;"),
            '\0' => out.extend_from_slice("\u{FFFD}".as_bytes()),
            c => {
                let mut buf = [0; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
}
