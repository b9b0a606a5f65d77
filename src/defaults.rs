//! Default values and fixed texts used across the engine and the CLI.

/// The branch every destination repository accumulates updates on.
pub const HEAD_BRANCH: &str = "auto-action-ln";

/// Title of the pull requests opened from `HEAD_BRANCH`.
pub const PULL_TITLE: &str = "auto(ln): update links";

pub const DEFAULT_CONFIG_PATH: &str = ".ln-config.yaml";

pub const DEFAULT_SERVER: &str = "https://github.com";

/// Commit message for each file write; `Data` is the link.
pub const COMMIT_MESSAGE_TEMPLATE: &str = "auto(ln): update {{ .Data.To.Path }}

Source: {{ .Data.From.HTMLURL }}
";

pub const PULL_BODY_HEADER: &str = "This automated PR updates the following files:

| From | To  | Status |
| ---  | --- | ---    |
";

/// One table row per link; `Data` is the row.
pub const PULL_BODY_ROW_TEMPLATE: &str =
    "| [`{{ .Data.From }}`]({{ .Data.FromURL }}) | `{{ .Data.To }}` | {{ .Data.Status }} |\n";

pub const PULL_BODY_FOOTER_TEMPLATE: &str = "
---

| Quick links | [execution]({{ .Environment.ExecURL }}) | [configuration]({{ .Environment.Server }}{{ .Data.ConfigPath }}) |
| --- | --- | --- |
";

/// Metadata given to a configuration read from the local filesystem, which
/// has no repository, commit or URL of its own.
pub mod local_source {
    pub const OWNER: &str = "local_owner";
    pub const REPO: &str = "local_repo";
    pub const COMMIT: &str = "local_commit";
    pub const REF: &str = "local_ref";
    pub const SHA: &str = "local_sha";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::has_markup;

    #[test]
    fn test_templates_have_markup() {
        for template in [
            COMMIT_MESSAGE_TEMPLATE,
            PULL_BODY_ROW_TEMPLATE,
            PULL_BODY_FOOTER_TEMPLATE,
        ] {
            assert!(has_markup(template), "{:?}", template);
        }
        assert!(!has_markup(PULL_BODY_HEADER));
    }

    #[test]
    fn test_commit_message_layout() {
        let lines: Vec<&str> = COMMIT_MESSAGE_TEMPLATE.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].is_empty());
    }
}
