//! # Generated Texts
//!
//! `Formatter` renders the texts the run sends to the forge: commit messages
//! and pull request bodies. Templates see three values:
//!
//! - `Data`: whatever is being formatted (a link, a pull body row);
//! - `Config`: the resolved configuration;
//! - `Environment`: the run environment.

use crate::config::Config;
use crate::defaults::{
    COMMIT_MESSAGE_TEMPLATE, PULL_BODY_FOOTER_TEMPLATE, PULL_BODY_HEADER, PULL_BODY_ROW_TEMPLATE,
};
use crate::environment::Environment;
use crate::error::Result;
use crate::link::Link;
use crate::template::Context;
use serde::Serialize;

/// One row of the pull request table.
#[derive(Debug, Serialize)]
struct PullRow<'a> {
    from: String,
    from_url: &'a str,
    to: &'a str,
    status: &'static str,
}

/// Values shared by the pull request footer.
#[derive(Debug, Serialize)]
struct PullFooter {
    config_path: String,
}

#[derive(Debug, Clone)]
pub struct Formatter {
    context: Context,
    config_path: String,
}

impl Formatter {
    pub fn new(config: &Config, environment: &Environment) -> Result<Self> {
        let context = Context::new()
            .with("Config", config)?
            .with("Environment", environment)?;

        Ok(Self {
            context,
            config_path: config.source.html_path(),
        })
    }

    /// Renders `template` with `data` exposed as `Data`.
    pub fn format<T: Serialize + ?Sized>(&self, template: &str, data: &T) -> Result<String> {
        self.context.clone().with("Data", data)?.render(template)
    }

    pub fn commit_message(&self, link: &Link) -> Result<String> {
        self.format(COMMIT_MESSAGE_TEMPLATE, link)
    }

    /// A markdown table of `links` and their statuses, followed by links to
    /// the run and to the configuration.
    pub fn pull_body(&self, links: &[Link]) -> Result<String> {
        let mut body = String::from(PULL_BODY_HEADER);

        for link in links {
            let row = PullRow {
                from: link.from.to_string(),
                from_url: &link.from.html_url,
                to: &link.to.path,
                status: link.status.as_str(),
            };
            body.push_str(&self.format(PULL_BODY_ROW_TEMPLATE, &row)?);
        }

        let footer = PullFooter {
            config_path: self.config_path.clone(),
        };
        body.push_str(&self.format(PULL_BODY_FOOTER_TEMPLATE, &footer)?);

        Ok(body)
    }
}
