//! Template lexer and parser
//!
//! Turns template text into a tree of [`Node`]s. Actions are delimited by
//! `{{` and `}}`; `{{- ` and ` -}}` trim the adjacent text's whitespace.

use serde_json::Number;

use super::types::{RenderError, RenderResult};

const LEFT: &str = "{{";
const RIGHT: &str = "}}";

/// A value an action evaluates
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    /// `.A.B` relative to dot, or `$.A.B` relative to the root data
    Field { root: bool, path: Vec<String> },
    Str(String),
    Number(Number),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    If,
    With,
    Range,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action {
        line: usize,
        operand: Operand,
    },
    Block {
        kind: BlockKind,
        line: usize,
        operand: Operand,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

enum Item {
    Text(String),
    Action { line: usize, body: String },
}

enum Word {
    Block(BlockKind),
    Else,
    End,
    Operand(Operand),
}

/// An open `if`/`with`/`range` awaiting its `{{end}}`
struct Frame {
    kind: BlockKind,
    line: usize,
    operand: Operand,
    body: Vec<Node>,
    otherwise: Option<Vec<Node>>,
    /// Opened by `{{else if}}`; its `{{end}}` also closes the parent
    chained: bool,
}

impl Frame {
    fn open(kind: BlockKind, line: usize, operand: Operand, chained: bool) -> Self {
        Self {
            kind,
            line,
            operand,
            body: Vec::new(),
            otherwise: None,
            chained,
        }
    }

    fn into_node(self) -> Node {
        Node::Block {
            kind: self.kind,
            line: self.line,
            operand: self.operand,
            body: self.body,
            otherwise: self.otherwise.unwrap_or_default(),
        }
    }
}

/// Parse template text into a node tree
pub(crate) fn parse(name: &str, src: &str) -> RenderResult<Vec<Node>> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for item in lex(name, src)? {
        let (line, body) = match item {
            Item::Text(text) => {
                current(&mut root, &mut stack).push(Node::Text(text));
                continue;
            }
            Item::Action { line, body } => (line, body),
        };

        let mut words = tokenize(name, line, &body)?.into_iter();
        match words.next() {
            None => return Err(parse_error(name, line, "missing value for command")),
            Some(Word::End) => {
                expect_end(name, line, words)?;
                close(name, line, &mut root, &mut stack)?;
            }
            Some(Word::Else) => {
                let frame = stack
                    .last_mut()
                    .filter(|frame| frame.otherwise.is_none())
                    .ok_or_else(|| parse_error(name, line, "unexpected {{else}}"))?;
                frame.otherwise = Some(Vec::new());
                let parent = frame.kind;

                match words.next() {
                    None => {}
                    // `else if` only chains under `if`, `else with` only under `with`
                    Some(Word::Block(kind)) if kind == parent && kind != BlockKind::Range => {
                        let operand = single_operand(name, line, words)?;
                        stack.push(Frame::open(kind, line, operand, true));
                    }
                    Some(_) => {
                        return Err(parse_error(name, line, "unexpected word after {{else}}"))
                    }
                }
            }
            Some(Word::Block(kind)) => {
                let operand = single_operand(name, line, words)?;
                stack.push(Frame::open(kind, line, operand, false));
            }
            Some(Word::Operand(operand)) => {
                expect_end(name, line, words)?;
                current(&mut root, &mut stack).push(Node::Action { line, operand });
            }
        }
    }

    if let Some(frame) = stack.last() {
        return Err(parse_error(
            name,
            frame.line,
            "unexpected EOF, missing {{end}}",
        ));
    }

    Ok(root)
}

fn current<'r>(root: &'r mut Vec<Node>, stack: &'r mut [Frame]) -> &'r mut Vec<Node> {
    match stack.last_mut() {
        Some(frame) => frame.otherwise.as_mut().unwrap_or(&mut frame.body),
        None => root,
    }
}

fn close(name: &str, line: usize, root: &mut Vec<Node>, stack: &mut Vec<Frame>) -> RenderResult<()> {
    loop {
        let frame = stack
            .pop()
            .ok_or_else(|| parse_error(name, line, "unexpected {{end}}"))?;
        let chained = frame.chained;
        current(root, stack).push(frame.into_node());

        if !chained {
            return Ok(());
        }
    }
}

fn single_operand(
    name: &str,
    line: usize,
    mut words: impl Iterator<Item = Word>,
) -> RenderResult<Operand> {
    match words.next() {
        Some(Word::Operand(operand)) => {
            expect_end(name, line, words)?;
            Ok(operand)
        }
        Some(_) => Err(parse_error(name, line, "unexpected keyword in operand")),
        None => Err(parse_error(name, line, "missing value for block")),
    }
}

fn expect_end(name: &str, line: usize, mut words: impl Iterator<Item = Word>) -> RenderResult<()> {
    match words.next() {
        None => Ok(()),
        Some(_) => Err(parse_error(name, line, "unexpected operand in command")),
    }
}

fn lex(name: &str, src: &str) -> RenderResult<Vec<Item>> {
    let mut items = Vec::new();
    let mut rest = src;
    let mut line = 1;
    let mut trim_next = false;

    while !rest.is_empty() {
        let Some(open) = rest.find(LEFT) else {
            push_text(&mut items, rest, trim_next, false);
            break;
        };

        let after = &rest[open + LEFT.len()..];
        let trim_left = after.starts_with('-')
            && after[1..].starts_with(|c: char| c.is_ascii_whitespace());
        push_text(&mut items, &rest[..open], trim_next, trim_left);
        line += newlines(&rest[..open]);

        let inner = if trim_left { &after[1..] } else { after };
        let raw = split_action(name, line, inner)?;
        let action_line = line;
        line += newlines(&inner[..raw.len]);
        rest = &inner[raw.len..];
        trim_next = raw.trim_right;

        if let Some(body) = raw.body {
            items.push(Item::Action {
                line: action_line,
                body: body.trim().to_string(),
            });
        }
    }

    Ok(items)
}

fn push_text(items: &mut Vec<Item>, text: &str, trim_start: bool, trim_end: bool) {
    let text = if trim_start { text.trim_start() } else { text };
    let text = if trim_end { text.trim_end() } else { text };

    if !text.is_empty() {
        items.push(Item::Text(text.to_string()));
    }
}

fn newlines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

/// Action text between the delimiters
struct RawAction<'s> {
    /// `None` for comments
    body: Option<&'s str>,
    trim_right: bool,
    /// Bytes consumed, closing delimiter included
    len: usize,
}

fn split_action<'s>(name: &str, line: usize, inner: &'s str) -> RenderResult<RawAction<'s>> {
    let lead = inner.len() - inner.trim_start().len();

    if inner[lead..].starts_with("/*") {
        let start = lead + 2;
        let end = inner[start..]
            .find("*/")
            .map(|i| start + i + 2)
            .ok_or_else(|| parse_error(name, line, "unclosed comment"))?;
        let close = inner[end..]
            .find(RIGHT)
            .map(|i| end + i)
            .ok_or_else(|| parse_error(name, line, "unclosed action"))?;

        let tail = inner[end..close].trim();
        if !tail.is_empty() && tail != "-" {
            return Err(parse_error(
                name,
                line,
                "comment ends before closing delimiter",
            ));
        }

        return Ok(RawAction {
            body: None,
            trim_right: tail == "-",
            len: close + RIGHT.len(),
        });
    }

    let mut chars = inner.char_indices();
    let mut quote: Option<char> = None;

    while let Some((i, c)) = chars.next() {
        match quote {
            Some('"') if c == '\\' => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '`' => quote = Some(c),
            None if inner[i..].starts_with(RIGHT) => {
                let body = &inner[..i];
                let (body, trim_right) = match body.strip_suffix('-') {
                    Some(b) if b.ends_with(|c: char| c.is_ascii_whitespace()) => (b, true),
                    _ => (body, false),
                };

                return Ok(RawAction {
                    body: Some(body),
                    trim_right,
                    len: i + RIGHT.len(),
                });
            }
            None => {}
        }
    }

    Err(parse_error(name, line, "unclosed action"))
}

fn tokenize(name: &str, line: usize, body: &str) -> RenderResult<Vec<Word>> {
    let mut words = Vec::new();
    let mut rest = body.trim_start();

    while !rest.is_empty() {
        let (word, tail) = next_word(name, line, rest)?;
        words.push(word);
        rest = tail.trim_start();
    }

    Ok(words)
}

fn next_word<'s>(name: &str, line: usize, rest: &'s str) -> RenderResult<(Word, &'s str)> {
    if let Some(quoted) = rest.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = quoted.char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '"' => return Ok((Word::Operand(Operand::Str(value)), &quoted[i + 1..])),
                '\\' => {
                    let escaped = match chars.next() {
                        Some((_, 'n')) => '\n',
                        Some((_, 't')) => '\t',
                        Some((_, 'r')) => '\r',
                        Some((_, '\\')) => '\\',
                        Some((_, '"')) => '"',
                        _ => return Err(parse_error(name, line, "unknown escape sequence")),
                    };
                    value.push(escaped);
                }
                '\n' => break,
                c => value.push(c),
            }
        }

        return Err(parse_error(name, line, "unterminated quoted string"));
    }

    if let Some(raw) = rest.strip_prefix('`') {
        let end = raw
            .find('`')
            .ok_or_else(|| parse_error(name, line, "unterminated raw quoted string"))?;
        return Ok((Word::Operand(Operand::Str(raw[..end].to_string())), &raw[end + 1..]));
    }

    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let (token, tail) = rest.split_at(end);

    let word = match token {
        "if" => Word::Block(BlockKind::If),
        "with" => Word::Block(BlockKind::With),
        "range" => Word::Block(BlockKind::Range),
        "else" => Word::Else,
        "end" => Word::End,
        "true" => Word::Operand(Operand::Bool(true)),
        "false" => Word::Operand(Operand::Bool(false)),
        "nil" => return Err(parse_error(name, line, "nil is not a command")),
        _ if token.starts_with('.') || token.starts_with('$') => {
            Word::Operand(parse_field(name, line, token)?)
        }
        _ if looks_numeric(token) => Word::Operand(Operand::Number(parse_number(name, line, token)?)),
        _ => {
            return Err(parse_error(
                name,
                line,
                format!("function \"{token}\" not defined"),
            ))
        }
    };

    Ok((word, tail))
}

fn parse_field(name: &str, line: usize, token: &str) -> RenderResult<Operand> {
    let root = token.starts_with('$');
    let rest = if root { &token[1..] } else { token };

    if rest.is_empty() || rest == "." {
        return Ok(Operand::Field {
            root,
            path: Vec::new(),
        });
    }

    let Some(fields) = rest.strip_prefix('.') else {
        return Err(parse_error(
            name,
            line,
            format!("variables are not supported: {token}"),
        ));
    };

    let path: Vec<String> = fields.split('.').map(str::to_string).collect();
    if !path.iter().all(|field| is_identifier(field)) {
        return Err(parse_error(name, line, format!("bad field syntax: {token}")));
    }

    Ok(Operand::Field { root, path })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn looks_numeric(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

fn parse_number(name: &str, line: usize, token: &str) -> RenderResult<Number> {
    if let Ok(n) = token.parse::<i64>() {
        return Ok(Number::from(n));
    }

    token
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| parse_error(name, line, format!("bad number syntax: {token}")))
}

fn parse_error(name: &str, line: usize, message: impl Into<String>) -> RenderError {
    RenderError::Parse {
        name: name.to_string(),
        line,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(path: &[&str]) -> Operand {
        Operand::Field {
            root: false,
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn parse_err(src: &str) -> (usize, String) {
        match parse("test", src).unwrap_err() {
            RenderError::Parse { line, message, .. } => (line, message),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_text_and_field() {
        let nodes = parse("test", "Hello {{.Name}}!").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Text("Hello ".to_string()),
                Node::Action {
                    line: 1,
                    operand: field(&["Name"]),
                },
                Node::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_nested_path_and_root() {
        let nodes = parse("test", "{{ .User.Email }}{{$.Site}}{{.}}").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Action {
                    line: 1,
                    operand: field(&["User", "Email"]),
                },
                Node::Action {
                    line: 1,
                    operand: Operand::Field {
                        root: true,
                        path: vec!["Site".to_string()],
                    },
                },
                Node::Action {
                    line: 1,
                    operand: field(&[]),
                },
            ]
        );
    }

    #[test]
    fn test_parse_literals() {
        let nodes = parse("test", r#"{{"a}}b"}}{{`raw`}}{{42}}{{-1.5}}{{true}}"#).unwrap();
        let operands: Vec<_> = nodes
            .into_iter()
            .map(|node| match node {
                Node::Action { operand, .. } => operand,
                other => panic!("unexpected node: {other:?}"),
            })
            .collect();

        assert_eq!(operands[0], Operand::Str("a}}b".to_string()));
        assert_eq!(operands[1], Operand::Str("raw".to_string()));
        assert_eq!(operands[2], Operand::Number(Number::from(42)));
        assert_eq!(operands[3], Operand::Number(Number::from_f64(-1.5).unwrap()));
        assert_eq!(operands[4], Operand::Bool(true));
    }

    #[test]
    fn test_trim_markers_and_comments() {
        let nodes = parse("test", "a  {{- /* note */ -}}  b {{- .X }}\n").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Text("a".to_string()),
                Node::Text("b".to_string()),
                Node::Action {
                    line: 1,
                    operand: field(&["X"]),
                },
                Node::Text("\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_blocks_with_else_if() {
        let nodes = parse("test", "{{if .A}}a{{else if .B}}b{{else}}c{{end}}").unwrap();
        assert_eq!(nodes.len(), 1);

        let Node::Block {
            kind, body, otherwise, ..
        } = &nodes[0]
        else {
            panic!("expected block");
        };
        assert_eq!(*kind, BlockKind::If);
        assert_eq!(body, &vec![Node::Text("a".to_string())]);

        let Node::Block {
            kind,
            operand,
            otherwise: inner_else,
            ..
        } = &otherwise[0]
        else {
            panic!("expected chained block");
        };
        assert_eq!(*kind, BlockKind::If);
        assert_eq!(operand, &field(&["B"]));
        assert_eq!(inner_else, &vec![Node::Text("c".to_string())]);
    }

    #[test]
    fn test_line_numbers_in_errors() {
        assert_eq!(parse_err("line one\n{{.Name").0, 2);
        assert_eq!(parse_err("a\nb\n{{if .X}}\n").0, 3);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_err("{{end}}").1, "unexpected {{end}}");
        assert_eq!(parse_err("{{else}}").1, "unexpected {{else}}");
        assert_eq!(parse_err("{{}}").1, "missing value for command");
        assert_eq!(parse_err("{{upper .Name}}").1, "function \"upper\" not defined");
        assert_eq!(parse_err("{{.Name..X}}").1, "bad field syntax: .Name..X");
        assert_eq!(parse_err("{{$x}}").1, "variables are not supported: $x");
        assert_eq!(parse_err("{{\"open}}").1, "unclosed action");
        assert_eq!(parse_err("{{/* open }}").1, "unclosed comment");
        assert_eq!(parse_err("{{.A .B}}").1, "unexpected operand in command");
        assert_eq!(parse_err("{{if .A}}{{else}}{{else}}{{end}}").1, "unexpected {{else}}");
    }

    #[test]
    fn test_else_chain_must_match_block() {
        let msg = "unexpected word after {{else}}";
        assert_eq!(parse_err("{{range .A}}{{else if .B}}{{end}}").1, msg);
        assert_eq!(parse_err("{{if .A}}{{else with .B}}{{end}}").1, msg);
        assert_eq!(parse_err("{{with .A}}{{else if .B}}{{end}}").1, msg);
        assert_eq!(parse_err("{{range .A}}{{else range .B}}{{end}}").1, msg);

        assert!(parse("test", "{{with .A}}a{{else with .B}}b{{end}}").is_ok());
    }
}
