//! # Configuration
//!
//! The configuration document lists the links to keep in sync:
//!
//! ```yaml
//! defaults:
//!   link:
//!     from: owner/repo:templates/
//!     to: owner/other:.github/
//! links:
//!   - from: owner/repo:LICENSE
//!     to: [a/b:, c/d:]
//!   - from: https://github.com/owner/repo/blob/main/ci.yaml
//! ```
//!
//! Only `defaults` and `links` are accepted at the top level, and only `from`
//! and `to` inside a link; anything else is rejected before any forge call.
//!
//! ## Resolution
//!
//! Each declaration is resolved into links by the same pipeline:
//!
//! 1. `from` and `to` are parsed into file references (`parse` module).
//! 2. The two lists are expanded into links (`links::combine`).
//! 3. Empty fields are filled from the default link, then from the source.
//! 4. Templated fields are evaluated against `Config` and the caller's extra
//!    context values.
//! 5. Moot links are dropped and reported as warnings.
//!
//! `defaults.link` goes through the same pipeline first, against a default
//! link pointing at the current repository on both ends.

use crate::error::{Error, Result};
use crate::file::{FileRef, Repo};
use crate::forge::{FileStore, RepoStore};
use crate::link::Link;
use crate::links::{combine, filter, LinkGroups};
use crate::parse::{parse_file_value, FileValue};
use crate::template::Context;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

const SCHEMA_HINT: &str =
    "top-level keys are `defaults` and `links`; `defaults.link` and each link take `from` and `to`";

/// The document as written, before any interpretation of `from`/`to`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    defaults: Option<RawDefaults>,
    #[serde(default)]
    links: Option<Vec<RawLink>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDefaults {
    #[serde(default)]
    link: Option<RawLink>,
}

/// One link declaration. Either side may be absent, a string, a mapping or a
/// list of those.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawLink {
    #[serde(default)]
    pub from: Option<serde_yaml::Value>,
    #[serde(default)]
    pub to: Option<serde_yaml::Value>,
}

/// Something odd about the configuration that does not prevent a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A link resolved to a file copied onto itself and was dropped.
    MootLink(Link),
    /// `defaults.link` resolved to several links; the first is used.
    MultipleDefaultLinks { count: usize, used: Link },
    /// A `repo` value with more than one slash; only the first two segments
    /// were kept.
    MalformedRepo { repo: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MootLink(link) => write!(f, "Found moot link, ignoring: {}", link),
            Warning::MultipleDefaultLinks { count, used } => write!(
                f,
                "Defaults has {} links, using the first: {}",
                count, used
            ),
            Warning::MalformedRepo { repo } => {
                write!(f, "Invalid repo string {:?}, want owner/repo", repo)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Defaults {
    pub link: Link,
}

/// A parsed configuration and the file it was read from.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub source: FileRef,
    pub defaults: Defaults,
    pub links: Vec<Link>,
}

impl Config {
    /// An empty configuration read from `source`, whose default link points
    /// at `repo` on both ends.
    pub fn new(source: FileRef, repo: Repo) -> Self {
        Self {
            source,
            defaults: Defaults {
                link: Link::new(
                    FileRef::new(repo.clone(), "", ""),
                    FileRef::new(repo, "", ""),
                ),
            },
            links: Vec::new(),
        }
    }

    /// Parses `yaml` into the default link and the resolved links.
    ///
    /// `extras` is made available to templates next to `Config` and `Link`.
    pub fn parse(&mut self, yaml: &str, extras: &Context) -> Result<Vec<Warning>> {
        if yaml.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: "configuration is empty".to_string(),
                hint: Some(SCHEMA_HINT.to_string()),
            });
        }

        let raw: RawConfig = serde_yaml::from_str(yaml).map_err(|e| {
            let message = e.to_string();
            let hint = message
                .contains("unknown field")
                .then(|| SCHEMA_HINT.to_string());
            Error::ConfigParse { message, hint }
        })?;

        let mut warnings = Vec::new();

        let raw_default = raw.defaults.and_then(|d| d.link).unwrap_or_default();
        self.parse_defaults(&raw_default, extras, &mut warnings)?;

        let mut links = Vec::new();
        for (i, raw_link) in raw.links.unwrap_or_default().iter().enumerate() {
            let parsed = self
                .parse_link(raw_link, extras, &mut warnings)
                .inspect_err(|_| debug!("Failed to parse link {}: {:?}", i, raw_link))?;
            links.extend(parsed);
        }
        self.links = links;

        Ok(warnings)
    }

    fn parse_defaults(
        &mut self,
        raw: &RawLink,
        extras: &Context,
        warnings: &mut Vec<Warning>,
    ) -> Result<()> {
        debug!("Parse defaults {:?}", raw);

        let mut links = self.parse_link(raw, extras, warnings)?;
        if links.len() > 1 {
            warnings.push(Warning::MultipleDefaultLinks {
                count: links.len(),
                used: links[0].clone(),
            });
        }
        if !links.is_empty() {
            self.defaults.link = links.swap_remove(0);
        }

        Ok(())
    }

    /// Resolves one declaration into links, dropping moot ones.
    pub fn parse_link(
        &self,
        raw: &RawLink,
        extras: &Context,
        warnings: &mut Vec<Warning>,
    ) -> Result<Vec<Link>> {
        let froms = parse_file_value(&FileValue::from(raw.from.clone()), warnings)?;
        let tos = parse_file_value(&FileValue::from(raw.to.clone()), warnings)?;

        let context = extras.clone().with("Config", self)?;
        let links = combine(&froms, &tos)
            .into_iter()
            .map(|link| {
                link.fill_defaults(&self.defaults.link)
                    .fill_missing()
                    .apply_templates(&context)
            })
            .collect::<Result<Vec<_>>>()?;

        let (kept, moot) = filter(links);
        warnings.extend(moot.into_iter().map(Warning::MootLink));

        Ok(kept)
    }

    /// Reads the source and destination of every link, see `Link::populate`.
    /// The first failure aborts.
    pub fn populate<S>(&mut self, store: &S, head: &str) -> Result<()>
    where
        S: FileStore + RepoStore + ?Sized,
    {
        for link in &mut self.links {
            link.populate(store, head)?;
        }
        Ok(())
    }

    pub fn groups(&self) -> LinkGroups {
        LinkGroups::new(&self.links)
    }
}

/// Logs each warning, for callers that have nothing better to do with them.
pub fn log_warnings(warnings: &[Warning]) {
    for warning in warnings {
        warn!("{}", warning);
    }
}
