//! Map sample labels to the named groups they belong to.
//!
//! Membership is non-exclusive: a label is reported for every rule it
//! matches, so `/main/x` can land in both a `/main/**` group and a
//! `/main/*` group at once.

use crate::utils::config::{GLOBAL_GROUP, PATH_SEPARATOR};
use crate::utils::error::ConfigError;
use log::debug;
use std::collections::HashSet;

/// How a rule selects labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPattern {
    /// Matches only the identical label
    Exact(String),

    /// Matches the prefix itself and everything nested below it (`prefix/**`)
    Subtree(String),

    /// Ant-style path pattern (`?`, `*` within a segment, `**` across segments)
    Glob(Vec<String>),
}

impl GroupPattern {
    /// Classify a pattern string
    ///
    /// `/main` is exact, `/main/**` is a subtree, anything else with
    /// wildcards is a glob.
    pub fn parse(pattern: &str) -> Self {
        if !has_wildcards(pattern) {
            return Self::Exact(pattern.to_string());
        }

        if let Some(prefix) = pattern.strip_suffix("/**") {
            if !has_wildcards(prefix) {
                return Self::Subtree(prefix.to_string());
            }
        }

        Self::Glob(pattern.split(PATH_SEPARATOR).map(str::to_string).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Exact(path) => path.is_empty(),
            Self::Subtree(_) => false,
            Self::Glob(segments) => segments.iter().all(String::is_empty),
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        match self {
            Self::Exact(path) => label == path,
            Self::Subtree(prefix) => match label.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with(PATH_SEPARATOR),
                None => false,
            },
            Self::Glob(segments) => {
                let parts: Vec<&str> = label.split(PATH_SEPARATOR).collect();
                match_segments(segments, &parts)
            }
        }
    }
}

impl std::fmt::Display for GroupPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(path) => write!(f, "{}", path),
            Self::Subtree(prefix) => write!(f, "{}/**", prefix),
            Self::Glob(segments) => write!(f, "{}", segments.join("/")),
        }
    }
}

/// A named matching directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    pub name: String,
    pub pattern: GroupPattern,
}

impl GroupRule {
    pub fn new(name: impl Into<String>, pattern: GroupPattern) -> Self {
        Self {
            name: name.into(),
            pattern,
        }
    }

    /// Parse a `name=pattern` directive (as given on the command line)
    pub fn parse_directive(directive: &str) -> Option<Self> {
        let (name, pattern) = directive.split_once('=')?;
        let (name, pattern) = (name.trim(), pattern.trim());
        if name.is_empty() || pattern.is_empty() {
            return None;
        }
        Some(Self::new(name, GroupPattern::parse(pattern)))
    }
}

/// Validated, immutable rule set
#[derive(Debug, Clone)]
pub struct GroupMatcher {
    rules: Vec<GroupRule>,
}

impl GroupMatcher {
    /// Build a matcher, rejecting duplicate, empty or reserved names
    pub fn new(rules: Vec<GroupRule>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();

        for rule in &rules {
            if rule.name.is_empty() {
                return Err(ConfigError::EmptyGroupName);
            }
            if rule.name == GLOBAL_GROUP {
                return Err(ConfigError::ReservedGroupName(rule.name.clone()));
            }
            if rule.pattern.is_empty() {
                return Err(ConfigError::EmptyPattern(rule.name.clone()));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigError::DuplicateGroup(rule.name.clone()));
            }
        }

        debug!("Group matcher built with {} rules", rules.len());

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[GroupRule] {
        &self.rules
    }

    /// Names of every rule matching `label`, in declaration order
    pub fn resolve_groups(&self, label: &str) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.pattern.matches(label))
            .map(|rule| rule.name.as_str())
            .collect()
    }
}

fn has_wildcards(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Match path segments, `**` consuming zero or more label segments
///
/// Tracks which label prefixes the pattern read so far can end at, so each
/// pattern segment is checked against each label segment at most once.
fn match_segments(pattern: &[String], label: &[&str]) -> bool {
    let mut reachable = vec![false; label.len() + 1];
    reachable[0] = true;

    for head in pattern {
        let mut next = vec![false; label.len() + 1];

        if head == "**" {
            let mut seen = false;
            for (slot, &ok) in next.iter_mut().zip(&reachable) {
                seen |= ok;
                *slot = seen;
            }
        } else {
            for (i, segment) in label.iter().enumerate() {
                if reachable[i] && match_segment(head.as_bytes(), segment.as_bytes()) {
                    next[i + 1] = true;
                }
            }
        }

        if !next.contains(&true) {
            return false;
        }
        reachable = next;
    }

    reachable[label.len()]
}

/// Match one segment against `*` and `?` wildcards
///
/// Greedy scan that only ever backtracks to the most recent `*`.
fn match_segment(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut last_star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                last_star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == b'?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match last_star {
                Some((star, consumed)) => {
                    last_star = Some((star, consumed + 1));
                    p = star + 1;
                    t = consumed + 1;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
