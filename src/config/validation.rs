//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (rules reference existing servers)
//! - Enforce the single-default-server invariant
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ProxyConf → Result<(), Vec<ValidationError>>
//! - Regexes and addresses are checked here so a bad config dies at startup,
//!   never on the request path

use regex::bytes::Regex;
use url::Url;

use crate::config::schema::{ProxyConf, ReplacementConf};

/// A single semantic violation in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate the whole configuration, collecting every violation.
pub fn validate_config(config: &ProxyConf) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_servers(config, &mut errors);
    validate_rules(config, &mut errors);
    validate_paths(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_servers(config: &ProxyConf, errors: &mut Vec<ValidationError>) {
    let servers = &config.routes.servers;

    let defaults = servers.iter().filter(|s| s.is_default).count();
    if defaults == 0 {
        errors.push(ValidationError(
            "no default proxy server configured; the proxy has no fallback route".to_string(),
        ));
    } else if defaults > 1 {
        errors.push(ValidationError(format!(
            "{defaults} servers flagged is_default; exactly one is allowed"
        )));
    }

    for (i, server) in servers.iter().enumerate() {
        if server.name.is_empty() {
            errors.push(ValidationError(format!("server #{i}: name is empty")));
        }
        if let Err(e) = Url::parse(&server.address) {
            errors.push(ValidationError(format!(
                "server `{}`: invalid address `{}`: {e}",
                server.name, server.address
            )));
        }
        let duplicate = servers[..i]
            .iter()
            .any(|other| other.name.eq_ignore_ascii_case(&server.name));
        if duplicate {
            errors.push(ValidationError(format!(
                "server `{}`: duplicate name",
                server.name
            )));
        }
    }
}

fn validate_rules(config: &ProxyConf, errors: &mut Vec<ValidationError>) {
    for (i, rule) in config.routes.rules.iter().enumerate() {
        if rule.server.is_empty() {
            errors.push(ValidationError(format!("rule #{i}: server is empty")));
        } else if !config
            .routes
            .servers
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(&rule.server))
        {
            errors.push(ValidationError(format!(
                "rule #{i}: unknown server `{}`",
                rule.server
            )));
        }

        for pattern in &rule.request_matcher_regexes {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError(format!(
                    "rule #{i}: invalid matcher regex `{pattern}`: {e}"
                )));
            }
        }
        validate_replacements(i, "request", &rule.request_replacements, errors);
        validate_replacements(i, "response", &rule.response_replacements, errors);
    }
}

fn validate_replacements(
    rule_index: usize,
    kind: &str,
    replacements: &[ReplacementConf],
    errors: &mut Vec<ValidationError>,
) {
    for replacement in replacements {
        if let Err(e) = Regex::new(&replacement.regex) {
            errors.push(ValidationError(format!(
                "rule #{rule_index}: invalid {kind} replacement regex `{}`: {e}",
                replacement.regex
            )));
        }
    }
}

fn validate_paths(config: &ProxyConf, errors: &mut Vec<ValidationError>) {
    let path = &config.server.context_path;
    if !path.is_empty() && !path.starts_with('/') {
        errors.push(ValidationError(format!(
            "server.context_path `{path}` must start with `/`"
        )));
    }
}
