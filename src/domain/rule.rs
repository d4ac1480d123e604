//! Rule model and matching logic.
//!
//! # Responsibilities
//! - Represent routing/rewrite rules
//! - Filter rule sets by remote address, service identity and body regexes
//! - Apply request/response body replacements
//!
//! # Design Decisions
//! - Filters chain with AND semantics; regexes within one rule are OR'd
//! - Empty condition = always matches (wildcard)
//! - `match_regex` resolves priority: higher priority wins, ties go to the
//!   higher (most recently created) id

use regex::bytes::Regex;
use thiserror::Error;

use crate::config::schema::{ReplacementConf, RuleConf};

/// Conversion failures from raw rule configuration.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to compile matcher regex `{pattern}`: {source}")]
    BadMatcherRegex {
        pattern: String,
        source: regex::Error,
    },
    #[error("failed to compile replacement regex `{pattern}`: {source}")]
    BadReplacementRegex {
        pattern: String,
        source: regex::Error,
    },
}

/// A single regex rewrite applied over the full body.
#[derive(Debug, Clone)]
pub struct Replacement {
    pub regex: Regex,
    pub value: String,
}

impl Replacement {
    fn from_config(conf: &ReplacementConf) -> Result<Self, RuleError> {
        let regex = Regex::new(&conf.regex).map_err(|source| RuleError::BadReplacementRegex {
            pattern: conf.regex.clone(),
            source,
        })?;
        Ok(Self {
            regex,
            value: conf.value.clone(),
        })
    }
}

/// A routing/rewrite directive.
///
/// `id` 0 means unsaved; config-seeded rules are assigned 1..N in config
/// order and are always read-only.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: i64,
    pub server: String,
    pub service: String,
    pub priority: i64,
    pub matcher_remote_addr: Vec<String>,
    pub matcher_regex: Vec<Regex>,
    pub request_replacements: Vec<Replacement>,
    pub response_replacements: Vec<Replacement>,
    pub read_only: bool,
}

impl Rule {
    /// True when the body passes the regex predicate (empty set = always).
    pub fn matches_body(&self, body: &[u8]) -> bool {
        if self.matcher_regex.is_empty() {
            return true;
        }
        self.matcher_regex.iter().any(|r| r.is_match(body))
    }

    /// True when the remote address passes the prefix predicate
    /// (empty set = always).
    pub fn matches_remote_addr(&self, remote_addr: &str) -> bool {
        if self.matcher_remote_addr.is_empty() {
            return true;
        }
        self.matcher_remote_addr
            .iter()
            .any(|prefix| remote_addr.starts_with(prefix.as_str()))
    }

    /// True when the service identity passes (empty = wildcard).
    pub fn matches_service(&self, service: &str) -> bool {
        self.service.is_empty() || self.service == service
    }

    pub fn apply_request_replacements(&self, body: &[u8]) -> Vec<u8> {
        apply_replacements(body, &self.request_replacements)
    }

    pub fn apply_response_replacements(&self, body: &[u8]) -> Vec<u8> {
        apply_replacements(body, &self.response_replacements)
    }
}

fn apply_replacements(body: &[u8], replacements: &[Replacement]) -> Vec<u8> {
    let mut result = body.to_vec();
    for r in replacements {
        result = r.regex.replace_all(&result, r.value.as_bytes()).into_owned();
    }
    result
}

/// Convert raw rule configuration into domain rules.
///
/// Config-seeded rules receive ids 1..N in config order and are forced
/// read-only: they seed the immutable partition of the rule store.
pub fn convert_rules(confs: &[RuleConf]) -> Result<Vec<Rule>, RuleError> {
    let mut result = Vec::with_capacity(confs.len());
    for (i, conf) in confs.iter().enumerate() {
        let mut rule = convert_rule(conf)?;
        rule.id = i as i64 + 1;
        rule.read_only = true;
        result.push(rule);
    }
    Ok(result)
}

fn convert_rule(conf: &RuleConf) -> Result<Rule, RuleError> {
    let mut matchers = Vec::with_capacity(conf.request_matcher_regexes.len());
    for pattern in &conf.request_matcher_regexes {
        let regex = Regex::new(pattern).map_err(|source| RuleError::BadMatcherRegex {
            pattern: pattern.clone(),
            source,
        })?;
        matchers.push(regex);
    }

    let request_replacements = conf
        .request_replacements
        .iter()
        .map(Replacement::from_config)
        .collect::<Result<Vec<_>, _>>()?;
    let response_replacements = conf
        .response_replacements
        .iter()
        .map(Replacement::from_config)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Rule {
        id: 0,
        server: conf.server.clone(),
        service: conf.service.clone(),
        priority: conf.priority,
        matcher_remote_addr: conf.request_matcher_remote_addr.clone(),
        matcher_regex: matchers,
        request_replacements,
        response_replacements,
        read_only: conf.read_only.unwrap_or(true),
    })
}

/// An owned snapshot of rules supporting chained filtering.
#[derive(Debug, Clone, Default)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    /// Keep rules whose remote-address prefixes match.
    pub fn match_remote_addr(self, remote_addr: &str) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|r| r.matches_remote_addr(remote_addr))
                .collect(),
        )
    }

    /// Keep rules whose service identity matches.
    pub fn match_service(self, service: &str) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|r| r.matches_service(service))
                .collect(),
        )
    }

    /// Return the first rule whose regex predicate passes, scanning in
    /// priority order (priority desc, then id desc). Not "best regex match":
    /// the highest-priority candidate that passes wins.
    pub fn match_regex(mut self, body: &[u8]) -> Option<Rule> {
        self.0
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(b.id.cmp(&a.id)));
        self.0.into_iter().find(|r| r.matches_body(body))
    }

    pub fn find_by_id(&self, id: i64) -> Option<&Rule> {
        self.0.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Rule> {
        self.0
    }
}
