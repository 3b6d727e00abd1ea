/// Scope constraints on a wish
///
/// A scope is always structured as three label sets. Plain strings and lists
/// are sugar for the `any` set and get resolved when a wish is created.

use serde::{Deserialize, Serialize};

/// Which of a scope's three label sets to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Any,
    All,
    None,
}

impl ScopeKind {
    pub const ALL_KINDS: [ScopeKind; 3] = [ScopeKind::Any, ScopeKind::All, ScopeKind::None];
}

/// How a set of labels is compared against a scope's labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// The scope mentions at least one of the labels
    Any,
    /// The scope mentions every label
    All,
    /// The scope mentions none of the labels
    None,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Any => write!(f, "any"),
            MatchType::All => write!(f, "all"),
            MatchType::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(MatchType::Any),
            "all" => Ok(MatchType::All),
            "none" => Ok(MatchType::None),
            other => Err(format!("unknown match type '{}'", other)),
        }
    }
}

/// Where a wish is allowed to show up
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ScopeSpec")]
pub struct Scope {
    /// At least one of these must be active (passes when empty)
    pub any: Vec<String>,
    /// Every one of these must be active
    pub all: Vec<String>,
    /// None of these may be active
    pub none: Vec<String>,
}

impl Scope {
    pub fn any<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            any: labels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn all<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            all: labels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn none<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            none: labels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn and_all<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.all.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn and_none<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.none.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Scope that is visible everywhere
    pub fn universal(universal_label: &str) -> Self {
        Self::any([universal_label])
    }

    /// True only for the bare universal scope: `any` is exactly the universal
    /// label and there are no `all`/`none` constraints.
    pub fn is_universal(&self, universal_label: &str) -> bool {
        self.any.len() == 1
            && self.any[0] == universal_label
            && self.all.is_empty()
            && self.none.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.any.is_empty() && self.all.is_empty() && self.none.is_empty()
    }

    /// Labels from the requested sets, in `kinds` order
    pub fn labels(&self, kinds: &[ScopeKind]) -> Vec<&str> {
        let mut labels = Vec::new();
        for kind in kinds {
            let set = match kind {
                ScopeKind::Any => &self.any,
                ScopeKind::All => &self.all,
                ScopeKind::None => &self.none,
            };
            labels.extend(set.iter().map(String::as_str));
        }
        labels
    }

    /// Do the three constraints hold for this active context?
    pub fn admits(&self, context: &[String]) -> bool {
        let any_ok = self.any.is_empty() || contains_any(context, &self.any);
        let all_ok = context.len() >= self.all.len() && contains_all(context, &self.all);
        let none_ok = contains_none(context, &self.none);

        any_ok && all_ok && none_ok
    }

    /// Compare `labels` against the scope's labels from `kinds`.
    ///
    /// A scope with no labels in the chosen sets never matches.
    pub fn matches(&self, labels: &[String], match_type: MatchType, kinds: &[ScopeKind]) -> bool {
        let kinds = if kinds.is_empty() {
            &ScopeKind::ALL_KINDS[..]
        } else {
            kinds
        };
        let own = self.labels(kinds);
        if own.is_empty() {
            return false;
        }

        match match_type {
            MatchType::All => labels.iter().all(|l| own.contains(&l.as_str())),
            MatchType::None => !labels.iter().any(|l| own.contains(&l.as_str())),
            MatchType::Any => labels.iter().any(|l| own.contains(&l.as_str())),
        }
    }
}

impl From<&str> for Scope {
    fn from(label: &str) -> Self {
        Scope::any([label])
    }
}

impl From<String> for Scope {
    fn from(label: String) -> Self {
        Scope::any([label])
    }
}

impl From<Vec<String>> for Scope {
    fn from(labels: Vec<String>) -> Self {
        Scope::any(labels)
    }
}

impl From<Vec<&str>> for Scope {
    fn from(labels: Vec<&str>) -> Self {
        Scope::any(labels)
    }
}

impl<const N: usize> From<[&str; N]> for Scope {
    fn from(labels: [&str; N]) -> Self {
        Scope::any(labels)
    }
}

/// Accepted shapes when reading a scope from JSON
#[derive(Deserialize)]
#[serde(untagged)]
enum ScopeSpec {
    Label(String),
    Labels(Vec<String>),
    Structured {
        #[serde(default)]
        any: OneOrMany,
        #[serde(default)]
        all: OneOrMany,
        #[serde(default)]
        none: OneOrMany,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(label) => vec![label],
            OneOrMany::Many(labels) => labels,
        }
    }
}

impl From<ScopeSpec> for Scope {
    fn from(spec: ScopeSpec) -> Self {
        match spec {
            ScopeSpec::Label(label) => Scope::any([label]),
            ScopeSpec::Labels(labels) => Scope::any(labels),
            ScopeSpec::Structured { any, all, none } => Scope {
                any: any.into(),
                all: all.into(),
                none: none.into(),
            },
        }
    }
}

pub(crate) fn contains_any(haystack: &[String], needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub(crate) fn contains_all(haystack: &[String], needles: &[String]) -> bool {
    needles.iter().all(|n| haystack.contains(n))
}

pub(crate) fn contains_none(haystack: &[String], needles: &[String]) -> bool {
    !contains_any(haystack, needles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_admits_any() {
        let scope = Scope::any(["editor", "viewer"]);
        assert!(scope.admits(&labels(&["viewer"])));
        assert!(!scope.admits(&labels(&["admin"])));
    }

    #[test]
    fn test_admits_all_needs_superset() {
        let scope = Scope::all(["grandparent0", "parent1"]);
        assert!(scope.admits(&labels(&["grandparent0", "parent1"])));
        assert!(scope.admits(&labels(&["grandparent0", "parent1", "child3"])));
        assert!(!scope.admits(&labels(&["grandparent0"])));
        assert!(!scope.admits(&labels(&["grandparent0", "parent2"])));
    }

    #[test]
    fn test_admits_none() {
        let scope = Scope::none(["locked"]);
        assert!(scope.admits(&labels(&["editor"])));
        assert!(!scope.admits(&labels(&["editor", "locked"])));
    }

    #[test]
    fn test_empty_scope_admits_everything() {
        assert!(Scope::default().admits(&labels(&["anything"])));
        assert!(Scope::default().admits(&[]));
    }

    #[test]
    fn test_combined_constraints() {
        let scope = Scope::any(["a", "b"]).and_all(["c"]).and_none(["d"]);
        assert!(scope.admits(&labels(&["a", "c"])));
        assert!(!scope.admits(&labels(&["a"])));
        assert!(!scope.admits(&labels(&["b", "c", "d"])));
    }

    #[test]
    fn test_is_universal() {
        assert!(Scope::universal("universe").is_universal("universe"));
        assert!(!Scope::any(["universe", "other"]).is_universal("universe"));
        assert!(!Scope::all(["universe"]).is_universal("universe"));
        assert!(!Scope::universal("universe").and_none(["x"]).is_universal("universe"));
        assert!(!Scope::universal("universe").and_all(["x"]).is_universal("universe"));
    }

    #[test]
    fn test_matches_by_type() {
        let scope = Scope::any(["a", "b"]).and_none(["z"]);

        assert!(scope.matches(&labels(&["b"]), MatchType::Any, &ScopeKind::ALL_KINDS));
        assert!(scope.matches(&labels(&["a", "z"]), MatchType::All, &[]));
        assert!(!scope.matches(&labels(&["a", "z"]), MatchType::All, &[ScopeKind::Any]));
        assert!(scope.matches(&labels(&["q"]), MatchType::None, &[]));
        assert!(!scope.matches(&labels(&["z"]), MatchType::Any, &[ScopeKind::Any, ScopeKind::All]));
    }

    #[test]
    fn test_matches_needs_labels() {
        let scope = Scope::none(["x"]);
        assert!(!scope.matches(&labels(&["q"]), MatchType::None, &[ScopeKind::Any]));
    }

    #[test]
    fn test_json_sugar() {
        let scope: Scope = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(scope, Scope::any(["admin"]));

        let scope: Scope = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(scope, Scope::any(["a", "b"]));

        let scope: Scope = serde_json::from_str(r#"{"all": "a", "none": ["b"]}"#).unwrap();
        assert_eq!(scope, Scope::all(["a"]).and_none(["b"]));
    }

    #[test]
    fn test_serialized_form_reads_back() {
        let scope = Scope::any(["a"]).and_all(["b"]);
        let json = serde_json::to_string(&scope).unwrap();
        let back: Scope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scope);
    }
}
