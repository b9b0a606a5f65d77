//! # File Reference Parsing
//!
//! Link declarations are deliberately permissive: `from` and `to` may be left
//! out, given as a list, as a mapping, or as a string in one of several
//! shorthand forms. This module turns any of those into a list of `FileRef`.
//!
//! Raw YAML values are first decoded into a `FileValue`, a tagged union that
//! captures only the shapes the parser cares about. `parse_file_value` then
//! matches on it exhaustively.
//!
//! ## String Forms
//!
//! Strings are tried against the following forms, in order, and the first one
//! matching the whole string wins:
//!
//! | Form                                          | Example                                      |
//! | --------------------------------------------- | -------------------------------------------- |
//! | `https://<host>/<owner>/<repo>/blob/<ref>/<path>` | `https://github.com/o/r/blob/main/a/b.txt` |
//! | `<owner>/<repo>/blob/<ref>/<path>`            | `o/r/blob/main/a/b.txt`                      |
//! | `<owner>/<repo>:<path>@<ref>`                 | `o/r:a/b.txt@main`                           |
//! | `<owner>/<repo>:<path>`                       | `o/r:a/b.txt`                                |
//! | `<owner>/<repo>:@<ref>`                       | `o/r:@main`                                  |
//! | `<owner>/<repo>:`                             | `o/r:`                                       |
//! | `<path>@<ref>`                                | `a/b.txt@main`                               |
//! | `<path>`                                      | anything else, newlines included             |
//!
//! Only the URL and blob forms require both `owner` and `repo`; the others
//! accept either or both empty (`/:path`, `owner/:path`, `/repo:path`).

use crate::config::Warning;
use crate::error::{Error, Result};
use crate::file::{FileRef, Repo};
use log::debug;
use regex::Regex;
use serde_yaml::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

static URL_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://[^/]+/(?P<owner>[\w-]+)/(?P<repo>[\w-]+)/blob/(?P<ref>[\w-]+)/(?P<path>.+)$")
        .expect("URL form regex is valid")
});

static BLOB_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<owner>[\w-]+)/(?P<repo>[\w-]+)/blob/(?P<ref>[\w-]+)/(?P<path>.+)$")
        .expect("blob form regex is valid")
});

static REPO_PATH_REF_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<owner>[\w-]*)/(?P<repo>[\w-]*):(?P<path>[^@]+)@(?P<ref>[\w-]+)$")
        .expect("repo:path@ref regex is valid")
});

static REPO_PATH_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<owner>[\w-]*)/(?P<repo>[\w-]*):(?P<path>[^@]+)$")
        .expect("repo:path regex is valid")
});

static REPO_REF_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<owner>[\w-]*)/(?P<repo>[\w-]*):@(?P<ref>[\w-]+)$")
        .expect("repo:@ref regex is valid")
});

static REPO_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<owner>[\w-]*)/(?P<repo>[\w-]*):$").expect("repo: regex is valid")
});

static PATH_REF_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>[^@]+)@(?P<ref>[\w-]+)$").expect("path@ref regex is valid")
});

/// The shapes a `from`/`to` declaration can take.
#[derive(Debug, Clone, PartialEq)]
pub enum FileValue {
    /// Key left out, or explicitly `null`.
    Absent,
    List(Vec<FileValue>),
    /// A mapping; only string-valued entries are kept.
    Struct(HashMap<String, String>),
    Scalar(String),
    /// Anything else (numbers, booleans, tagged values). Kept so the parser
    /// can report it instead of the decoder.
    Unsupported(String),
}

impl From<Value> for FileValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FileValue::Absent,
            Value::String(s) => FileValue::Scalar(s),
            Value::Sequence(seq) => FileValue::List(seq.into_iter().map(FileValue::from).collect()),
            Value::Mapping(map) => {
                let mut fields = HashMap::new();
                for (key, value) in map {
                    match (key, value) {
                        (Value::String(k), Value::String(v)) => {
                            fields.insert(k, v);
                        }
                        (k, v) => debug!("Ignoring non-string entry {:?}: {:?}", k, v),
                    }
                }
                FileValue::Struct(fields)
            }
            other => FileValue::Unsupported(format!("{:?}", other)),
        }
    }
}

impl From<Option<Value>> for FileValue {
    fn from(value: Option<Value>) -> Self {
        value.map(FileValue::from).unwrap_or(FileValue::Absent)
    }
}

/// Parses one `from`/`to` declaration into zero or more file references.
///
/// Lists are flattened in order; the first error aborts the whole parse.
/// Oddities that do not stop the parse are pushed onto `warnings`.
pub fn parse_file_value(value: &FileValue, warnings: &mut Vec<Warning>) -> Result<Vec<FileRef>> {
    match value {
        FileValue::Absent => Ok(Vec::new()),
        FileValue::List(values) => {
            let mut files = Vec::new();
            for value in values {
                files.extend(parse_file_value(value, warnings)?);
            }
            Ok(files)
        }
        FileValue::Struct(fields) => Ok(vec![parse_struct(fields, warnings)]),
        FileValue::Scalar(s) => Ok(vec![parse_string(s)]),
        FileValue::Unsupported(value) => Err(Error::InvalidFileType {
            value: value.clone(),
        }),
    }
}

fn parse_struct(fields: &HashMap<String, String>, warnings: &mut Vec<Warning>) -> FileRef {
    let get = |key: &str| fields.get(key).cloned().unwrap_or_default();

    let (repo, warning) = parse_repo(&get("owner"), &get("repo"));
    warnings.extend(warning);
    FileRef::new(repo, get("path"), get("ref"))
}

/// Builds a repository from separate owner and repo values, where `repo` may
/// also carry the owner as `owner/repo`. The owner found in `repo` wins.
///
/// A `repo` with more than one slash keeps its first two segments and comes
/// back with a `Warning::MalformedRepo`.
pub fn parse_repo(owner: &str, repo: &str) -> (Repo, Option<Warning>) {
    match repo.split_once('/') {
        Some((owner, name)) => {
            let warning = name.contains('/').then(|| Warning::MalformedRepo {
                repo: repo.to_string(),
            });
            let name = name.split('/').next().unwrap_or_default();
            (Repo::new(owner, name), warning)
        }
        None => (Repo::new(owner, repo), None),
    }
}

/// Parses a string declaration, trying each shorthand form in order.
pub fn parse_string(s: &str) -> FileRef {
    let file = if let Some(m) = URL_FORM.captures(s).or_else(|| BLOB_FORM.captures(s)) {
        FileRef::new(Repo::new(&m["owner"], &m["repo"]), &m["path"], &m["ref"])
    } else if let Some(m) = REPO_PATH_REF_FORM.captures(s) {
        FileRef::new(Repo::new(&m["owner"], &m["repo"]), &m["path"], &m["ref"])
    } else if let Some(m) = REPO_PATH_FORM.captures(s) {
        FileRef::new(Repo::new(&m["owner"], &m["repo"]), &m["path"], "")
    } else if let Some(m) = REPO_REF_FORM.captures(s) {
        FileRef::new(Repo::new(&m["owner"], &m["repo"]), "", &m["ref"])
    } else if let Some(m) = REPO_FORM.captures(s) {
        FileRef::new(Repo::new(&m["owner"], &m["repo"]), "", "")
    } else if let Some(m) = PATH_REF_FORM.captures(s) {
        FileRef::new(Repo::default(), &m["path"], &m["ref"])
    } else {
        // Multi-line strings land here too, which keeps templates usable.
        FileRef::new(Repo::default(), s, "")
    };

    debug!("Parsed {:?} into {}", s, file);
    file
}
