/// Path-driven context rules
///
/// A rule says "when the app is at one of these paths, these labels are
/// active". Regex rules can pull pieces of the path into the labels through
/// `{{N}}` placeholders, e.g. `^/users/(\d+)` with label `user-{{1}}`.

use crate::error::Result;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{(\d+)\}\}").unwrap();
}

#[derive(Debug, Clone)]
pub struct PathRule {
    paths: Vec<String>,
    regexes: Vec<Regex>,
    contexts: Vec<String>,
    // one pattern per placeholder label, used to spot stale dynamic labels
    stale_patterns: Vec<Regex>,
}

/// Serializable form of a rule, regexes kept as source strings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathRuleSpec {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub regexes: Vec<String>,
    pub contexts: Vec<String>,
}

/// Labels to switch on and off for a path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathContexts {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl PathRule {
    pub fn new<I, S>(contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let contexts: Vec<String> = contexts.into_iter().map(Into::into).collect();
        let stale_patterns = contexts
            .iter()
            .filter(|label| PLACEHOLDER.is_match(label))
            .filter_map(|label| Regex::new(&wildcard_pattern(label)).ok())
            .collect();

        Self {
            paths: Vec::new(),
            regexes: Vec::new(),
            contexts,
            stale_patterns,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn with_regex(mut self, pattern: &str) -> Result<Self> {
        self.regexes.push(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn from_spec(spec: PathRuleSpec) -> Result<Self> {
        let mut rule = PathRule::new(spec.contexts);
        rule.paths = spec.paths;
        for pattern in &spec.regexes {
            rule = rule.with_regex(pattern)?;
        }
        Ok(rule)
    }

    pub fn to_spec(&self) -> PathRuleSpec {
        PathRuleSpec {
            paths: self.paths.clone(),
            regexes: self.regexes.iter().map(|r| r.as_str().to_string()).collect(),
            contexts: self.contexts.clone(),
        }
    }

    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Labels this rule turns on for `path`, or None if it doesn't apply.
    ///
    /// Regexes are tried first and the first hit wins, then literal paths.
    pub fn labels_for(&self, path: &str) -> Option<Vec<String>> {
        for regex in &self.regexes {
            if let Some(caps) = regex.captures(path) {
                return Some(
                    self.contexts
                        .iter()
                        .map(|label| substitute(label, &caps))
                        .collect(),
                );
            }
        }

        if self.paths.iter().any(|p| p == path) {
            return Some(self.contexts.clone());
        }

        None
    }

    /// Active labels that look like they came from one of this rule's
    /// placeholder labels
    fn stale_labels<'a>(&self, active: &'a [String]) -> Vec<&'a String> {
        active
            .iter()
            .filter(|label| self.stale_patterns.iter().any(|p| p.is_match(label)))
            .collect()
    }
}

impl PartialEq for PathRule {
    fn eq(&self, other: &Self) -> bool {
        self.paths == other.paths
            && self.contexts == other.contexts
            && self.regexes.len() == other.regexes.len()
            && self
                .regexes
                .iter()
                .zip(&other.regexes)
                .all(|(a, b)| a.as_str() == b.as_str())
    }
}

/// Work out which labels a path adds and removes.
///
/// Rules that don't apply contribute their labels to `remove`. On top of that,
/// any active label produced by a placeholder label is removed too, so a label
/// like `user-5` doesn't outlive the `/users/5` page. Labels that end up in
/// `add` are never listed in `remove`.
pub fn resolve(rules: &[PathRule], path: &str, active: &[String]) -> PathContexts {
    let mut add: Vec<String> = Vec::new();
    let mut unmatched: Vec<String> = Vec::new();

    for rule in rules {
        match rule.labels_for(path) {
            Some(labels) => push_unique(&mut add, labels),
            None => push_unique(&mut unmatched, rule.contexts.iter().cloned()),
        }
    }

    let mut remove: Vec<String> = Vec::new();
    for rule in rules {
        push_unique(&mut remove, rule.stale_labels(active).into_iter().cloned());
    }
    push_unique(&mut remove, unmatched);
    remove.retain(|label| !add.contains(label));

    PathContexts { add, remove }
}

fn substitute(label: &str, caps: &Captures) -> String {
    PLACEHOLDER
        .replace_all(label, |placeholder: &Captures| {
            placeholder[1]
                .parse::<usize>()
                .ok()
                .and_then(|group| caps.get(group))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

// "user-{{1}}" -> "^user\-.+?$"
fn wildcard_pattern(label: &str) -> String {
    let literal_parts: Vec<String> = PLACEHOLDER.split(label).map(regex::escape).collect();
    format!("^{}$", literal_parts.join(".+?"))
}

fn push_unique<I>(target: &mut Vec<String>, labels: I)
where
    I: IntoIterator<Item = String>,
{
    for label in labels {
        if !target.contains(&label) {
            target.push(label);
        }
    }
}
