//! # Links
//!
//! A `Link` pairs a source file with the destination file that should mirror
//! it. Links go through a fixed sequence of steps between configuration and
//! pull request:
//!
//! 1. **Defaulting**: `fill_defaults` copies fields from the configuration's
//!    default link, then `fill_missing` mirrors the source onto whatever the
//!    destination still lacks. The first returns a `Defaulted` whose only
//!    continuation is the second, so the order cannot be swapped.
//! 2. **Templating**: `apply_templates` evaluates each derived field.
//! 3. **Population**: `populate` reads both files from the forge.
//! 4. **Synchronization**: `need_update` and `update` bring the destination
//!    up to date on the integration branch and record a `Status`.

use crate::error::{Error, Result};
use crate::file::FileRef;
use crate::format::Formatter;
use crate::forge::{FileStore, RepoStore};
use crate::parse::parse_string;
use crate::template::{has_markup, Context};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of synchronizing one link. Every state but `Unchecked` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "unchecked")]
    Unchecked,
    #[serde(rename = "failed to check for update")]
    FailedToCheck,
    #[serde(rename = "failed to update")]
    FailedToUpdate,
    #[serde(rename = "update not needed")]
    UpdateNotNeeded,
    #[serde(rename = "updated")]
    Updated,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unchecked => "unchecked",
            Status::FailedToCheck => "failed to check for update",
            Status::FailedToUpdate => "failed to update",
            Status::UpdateNotNeeded => "update not needed",
            Status::Updated => "updated",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source to destination synchronization edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    pub from: FileRef,
    pub to: FileRef,
    #[serde(default)]
    pub status: Status,
}

/// A link that went through `fill_defaults` but not yet `fill_missing`.
#[derive(Debug, Clone)]
#[must_use]
pub struct Defaulted(Link);

/// The fields `apply_templates` evaluates, in evaluation order.
const TEMPLATED_FIELDS: [(Side, Part); 10] = [
    (Side::From, Part::Name),
    (Side::From, Part::Path),
    (Side::From, Part::Ref),
    (Side::From, Part::Owner),
    (Side::From, Part::Repo),
    (Side::To, Part::Name),
    (Side::To, Part::Path),
    (Side::To, Part::Ref),
    (Side::To, Part::Owner),
    (Side::To, Part::Repo),
];

#[derive(Debug, Clone, Copy)]
enum Side {
    From,
    To,
}

#[derive(Debug, Clone, Copy)]
enum Part {
    Name,
    Path,
    Ref,
    Owner,
    Repo,
}

impl Link {
    pub fn new(from: FileRef, to: FileRef) -> Self {
        Self {
            from,
            to,
            status: Status::Unchecked,
        }
    }

    /// Takes each of the source repository, source path, destination
    /// repository and destination path from `default` when this link leaves
    /// it empty.
    pub fn fill_defaults(mut self, default: &Link) -> Defaulted {
        if self.from.repo.is_empty() {
            self.from.repo = default.from.repo.clone();
        }
        if self.from.path.is_empty() {
            self.from.path = default.from.path.clone();
        }
        if self.to.repo.is_empty() {
            self.to.repo = default.to.repo.clone();
        }
        if self.to.path.is_empty() {
            self.to.path = default.to.path.clone();
        }
        Defaulted(self)
    }

    /// Evaluates every templated field against `context` plus the link
    /// itself, exposed as `Link`.
    ///
    /// Fields are evaluated in order and each sees the results of the ones
    /// before it. The first failure aborts and names the field.
    pub fn apply_templates(mut self, context: &Context) -> Result<Link> {
        for (side, part) in TEMPLATED_FIELDS {
            let value = self.field_mut(side, part);
            if !has_markup(value) {
                continue;
            }
            let template = value.clone();

            let rendered = context
                .clone()
                .with("Link", &self)
                .and_then(|ctx| ctx.render(&template))
                .map_err(|e| match e {
                    Error::Template { message, .. } => Error::Template {
                        message,
                        variable: Some(variable_name(side, part)),
                    },
                    other => other,
                })?;

            debug!(
                "Templated {} {:?} into {:?}",
                variable_name(side, part),
                template,
                rendered
            );
            *self.field_mut(side, part) = rendered;
        }

        Ok(self)
    }

    fn field_mut(&mut self, side: Side, part: Part) -> &mut String {
        let file = match side {
            Side::From => &mut self.from,
            Side::To => &mut self.to,
        };
        match part {
            Part::Name => &mut file.name,
            Part::Path => &mut file.path,
            Part::Ref => &mut file.r#ref,
            Part::Owner => &mut file.repo.owner,
            Part::Repo => &mut file.repo.repo,
        }
    }

    /// A link is moot when it would copy a file onto itself.
    pub fn is_moot(&self) -> bool {
        self.from == self.to
    }

    /// Reads both ends of the link from `store`.
    ///
    /// The source is read at its ref, or at its repository's default branch
    /// when it has none; failing to read it is fatal. The destination is read
    /// at `head` first and then at its own ref. A missing destination is not
    /// an error and leaves it without content.
    pub fn populate<S>(&mut self, store: &S, head: &str) -> Result<()>
    where
        S: FileStore + RepoStore + ?Sized,
    {
        self.populate_from(store)?;
        self.populate_to(store, head)
    }

    fn populate_from<S>(&mut self, store: &S) -> Result<()>
    where
        S: FileStore + RepoStore + ?Sized,
    {
        if self.from.r#ref.is_empty() {
            let branch = store
                .default_branch(&self.from.repo)
                .map_err(|e| self.resolution_error("failed to get repo", e))?;
            self.from.repo.default_branch = branch.clone();
            self.from.r#ref = branch;
        }

        self.from = store
            .read(&self.from)
            .map_err(|e| self.resolution_error("from is missing", e))?;
        Ok(())
    }

    fn populate_to<S>(&mut self, store: &S, head: &str) -> Result<()>
    where
        S: FileStore + ?Sized,
    {
        let own_ref = self.to.r#ref.clone();

        for r#ref in [head, own_ref.as_str()] {
            self.to.r#ref = r#ref.to_string();

            match store.read(&self.to) {
                Ok(file) => {
                    self.to = file;
                    return Ok(());
                }
                Err(e) if e.is_missing_file() => {
                    debug!("{} does not exist", self.to);
                }
                Err(e) => return Err(self.resolution_error("to is missing", e)),
            }
        }

        Ok(())
    }

    fn resolution_error(&self, message: &str, cause: Error) -> Error {
        Error::Resolution {
            link: self.to_string(),
            message: format!("{}: {}", message, cause),
        }
    }

    /// Whether the destination must be rewritten for the source to be
    /// reflected on the `head` branch.
    pub fn need_update<S: FileStore + ?Sized>(&self, store: &S, head: &str) -> Result<bool> {
        if self.from.content == self.to.content {
            debug!("Content is the same for {}", self);
            return Ok(false);
        }

        let head_to = self.to.at(head);
        debug!("Checking head content of {}", head_to);

        match store.read(&head_to) {
            Ok(file) => Ok(file.content != self.from.content),
            Err(e) if e.is_missing_file() => {
                warn!("File is missing: {}", head_to);
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Copies the source content onto the destination and writes it on
    /// `head`. The destination keeps the new content even when the write
    /// fails.
    pub fn update<S: FileStore + ?Sized>(
        &mut self,
        store: &S,
        formatter: &Formatter,
        head: &str,
    ) -> Result<FileRef> {
        info!("Processing link {}", self);

        self.to.content = self.from.content.clone();
        let message = formatter.commit_message(self)?;
        let written = store.write(&self.to, head, &message)?;

        info!("Updated file {}", written);
        Ok(written)
    }
}

impl Defaulted {
    /// Mirrors the source repository and path onto a destination that still
    /// lacks them.
    pub fn fill_missing(self) -> Link {
        let mut link = self.0;
        if link.to.repo.is_empty() {
            link.to.repo = link.from.repo.clone();
        }
        if link.to.path.is_empty() {
            link.to.path = link.from.path.clone();
        }
        link
    }
}

fn variable_name(side: Side, part: Part) -> String {
    let side = match side {
        Side::From => "From",
        Side::To => "To",
    };
    let part = match part {
        Part::Name => "Name",
        Part::Path => "Path",
        Part::Ref => "Ref",
        Part::Owner => "Repo.Owner",
        Part::Repo => "Repo.Repo",
    };
    format!("{}.{}", side, part)
}

/// Links are the same edge when both ends are the same file.
impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for Link {}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Parses the `"<from> -> <to>"` form, where each side is any string file
/// declaration. The empty string is the empty link.
impl FromStr for Link {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Link::default());
        }

        match s.split(" -> ").collect::<Vec<_>>()[..] {
            [from, to] => Ok(Link::new(parse_string(from), parse_string(to))),
            _ => Err(Error::InvalidLinkFormat {
                input: s.to_string(),
            }),
        }
    }
}
