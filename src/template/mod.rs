//! # Templates
//!
//! Link fields and generated texts (commit messages, pull request bodies) can
//! contain small templates that are evaluated against a `Context`, a set of
//! named values serialized to JSON.
//!
//! ## Syntax
//!
//! Text outside `{{ ... }}` is copied as-is. An action holds one of:
//!
//! - a field chain, `{{ .Link.From.Path }}`; names match the serialized keys
//!   case-insensitively and ignoring underscores, so `.HTMLURL` finds
//!   `html_url`;
//! - `{{ . }}`, the whole context;
//! - a string (`"..."` or `` `...` ``), integer or boolean literal;
//! - a function call, `{{ trimN .Link.From.Path 1 }}` (see `functions`);
//! - a comment, `{{/* ... */}}`, which renders nothing.
//!
//! `{{- ` trims the whitespace before an action and ` -}}` the whitespace
//! after it.
//!
//! Strings without `{{` are returned unchanged without being parsed.

pub mod functions;

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Named values a template can refer to.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` under `name`, builder style.
    pub fn with<T: Serialize + ?Sized>(mut self, name: &str, value: &T) -> Result<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// Adds or replaces `value` under `name`.
    pub fn insert<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        self.values
            .insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Renders `template` against this context.
    pub fn render(&self, template: &str) -> Result<String> {
        render(template, &self.values).map_err(|message| Error::Template {
            message: format!("{:?}: {}", template, message),
            variable: None,
        })
    }
}

/// Whether `s` contains anything that would be evaluated.
pub fn has_markup(s: &str) -> bool {
    s.contains(OPEN)
}

fn render(template: &str, root: &Map<String, Value>) -> std::result::Result<String, String> {
    if !has_markup(template) {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len());
    let mut remaining = template;
    let mut trim_next = false;

    while let Some(start) = remaining.find(OPEN) {
        let after_open = &remaining[start + OPEN.len()..];
        let trim_before = starts_with_trim_marker(after_open);

        let mut text = &remaining[..start];
        if trim_next {
            text = text.trim_start();
        }
        if trim_before {
            text = text.trim_end();
        }
        out.push_str(text);

        let end = find_close(after_open).ok_or("unclosed action")?;
        let mut body = &after_open[..end];
        if trim_before {
            body = &body[1..];
        }
        trim_next = ends_with_trim_marker(body);
        if trim_next {
            body = &body[..body.len() - 1];
        }

        out.push_str(&eval_action(body.trim(), root)?);
        remaining = &after_open[end + CLOSE.len()..];
    }

    out.push_str(if trim_next {
        remaining.trim_start()
    } else {
        remaining
    });

    Ok(out)
}

fn starts_with_trim_marker(body: &str) -> bool {
    body.strip_prefix('-')
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

fn ends_with_trim_marker(body: &str) -> bool {
    body.strip_suffix('-')
        .is_some_and(|rest| rest.ends_with(char::is_whitespace))
}

/// Byte offset of the `}}` closing the action, skipping quoted strings.
fn find_close(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '`' => quote = Some(c),
            None if s[i..].starts_with(CLOSE) => return Some(i),
            None => {}
        }
    }

    None
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// `.A.B`; empty for `.` alone.
    Field(Vec<String>),
    Str(String),
    Int(i64),
    Bool(bool),
    Ident(String),
}

fn eval_action(body: &str, root: &Map<String, Value>) -> std::result::Result<String, String> {
    if let Some(comment) = body.strip_prefix("/*") {
        return if comment.ends_with("*/") {
            Ok(String::new())
        } else {
            Err("unclosed comment".to_string())
        };
    }

    let tokens = tokenize(body)?;
    let value = match tokens.split_first() {
        None => return Err("missing value for command".to_string()),
        Some((Token::Ident(name), args)) => {
            let args = args
                .iter()
                .map(|arg| eval_operand(arg, root))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            functions::call(name, args)?
        }
        Some((first, [])) => eval_operand(first, root)?,
        Some((first, _)) => return Err(format!("can't give argument to non-function {:?}", first)),
    };

    Ok(display(&value))
}

fn eval_operand(token: &Token, root: &Map<String, Value>) -> std::result::Result<Value, String> {
    match token {
        Token::Field(path) => lookup(root, path),
        Token::Str(s) => Ok(Value::String(s.clone())),
        Token::Int(n) => Ok(Value::from(*n)),
        Token::Bool(b) => Ok(Value::Bool(*b)),
        Token::Ident(name) => Err(format!("function {:?} used as an argument", name)),
    }
}

fn lookup(root: &Map<String, Value>, path: &[String]) -> std::result::Result<Value, String> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(Value::Object(root.clone()));
    };

    let mut current = find_key(root, first)?;
    for name in rest {
        current = match current {
            Value::Object(map) => find_key(map, name)?,
            Value::Null => return Err(format!("nil pointer evaluating .{}", name)),
            other => return Err(format!("can't evaluate field {} in {}", name, other)),
        };
    }

    Ok(current.clone())
}

fn find_key<'a>(map: &'a Map<String, Value>, name: &str) -> std::result::Result<&'a Value, String> {
    let wanted = normalize(name);
    map.iter()
        .find(|(key, _)| normalize(key) == wanted)
        .map(|(_, value)| value)
        .ok_or_else(|| format!("can't evaluate field {}", name))
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn tokenize(body: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = body.trim_start();

    while let Some(c) = rest.chars().next() {
        let (token, len) = match c {
            '"' => quoted(rest)?,
            '`' => {
                let end = rest[1..].find('`').ok_or("unterminated raw string")?;
                (Token::Str(rest[1..=end].to_string()), end + 2)
            }
            '.' => {
                let len = 1 + word_len(&rest[1..], |c| c.is_alphanumeric() || c == '_' || c == '.');
                (field(&rest[..len])?, len)
            }
            '-' | '0'..='9' => {
                let len = 1 + word_len(&rest[1..], |c| c.is_ascii_digit());
                let literal = &rest[..len];
                let n = literal
                    .parse()
                    .map_err(|_| format!("bad number {:?}", literal))?;
                (Token::Int(n), len)
            }
            c if c.is_alphabetic() || c == '_' => {
                let len = word_len(rest, |c| c.is_alphanumeric() || c == '_');
                let token = match &rest[..len] {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    name => Token::Ident(name.to_string()),
                };
                (token, len)
            }
            other => return Err(format!("unexpected {:?} in action", other)),
        };

        tokens.push(token);
        rest = rest[len..].trim_start();
    }

    Ok(tokens)
}

fn word_len(s: &str, accept: impl Fn(char) -> bool) -> usize {
    s.char_indices()
        .find(|(_, c)| !accept(*c))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn field(text: &str) -> std::result::Result<Token, String> {
    if text == "." {
        return Ok(Token::Field(Vec::new()));
    }

    let names: Vec<String> = text[1..].split('.').map(str::to_string).collect();
    if names.iter().any(String::is_empty) {
        return Err(format!("bad field {:?}", text));
    }

    Ok(Token::Field(names))
}

/// Parses a double-quoted string at the start of `s`, returning the token and
/// the number of bytes consumed.
fn quoted(s: &str) -> std::result::Result<(Token, usize), String> {
    let mut out = String::new();
    let mut chars = s.char_indices().skip(1);

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((Token::Str(out), i + 1)),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            c => out.push(c),
        }
    }

    Err("unterminated quoted string".to_string())
}
