/// The active context: where the application currently is
///
/// Keeps an ordered, duplicate-free label list plus the previous list so the
/// caller can flip back one step.

use crate::context::scope::Scope;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveContext {
    universal: String,
    current: Vec<String>,
    previous: Vec<String>,
}

impl ActiveContext {
    pub fn new(universal_label: &str) -> Self {
        Self {
            universal: universal_label.to_string(),
            current: vec![universal_label.to_string()],
            previous: vec![universal_label.to_string()],
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.current
    }

    pub fn previous(&self) -> &[String] {
        &self.previous
    }

    pub fn universal_label(&self) -> &str {
        &self.universal
    }

    /// Is this label list just the universal label?
    pub fn is_default(&self, labels: &[String]) -> bool {
        labels.len() == 1 && labels[0] == self.universal
    }

    pub fn is_universal(&self) -> bool {
        self.is_default(&self.current)
    }

    /// Replace the context. An empty list means the universal context.
    pub fn set(&mut self, labels: Vec<String>) -> &[String] {
        self.previous = std::mem::take(&mut self.current);
        self.current = self.normalize(labels);
        debug!(context = ?self.current, "context set");
        &self.current
    }

    /// Append labels that aren't active yet
    pub fn add(&mut self, labels: &[String]) -> &[String] {
        self.previous = self.current.clone();
        if labels.is_empty() {
            return &self.current;
        }
        if self.is_universal() {
            self.current.clear();
        }
        for label in labels {
            if !self.current.contains(label) {
                self.current.push(label.clone());
            }
        }
        if self.current.is_empty() {
            self.current.push(self.universal.clone());
        }
        debug!(added = ?labels, context = ?self.current, "context added");
        &self.current
    }

    /// Drop every occurrence of the given labels
    pub fn remove(&mut self, labels: &[String]) -> &[String] {
        self.previous = self.current.clone();
        self.current.retain(|label| !labels.contains(label));
        if self.current.is_empty() {
            self.current.push(self.universal.clone());
        }
        debug!(removed = ?labels, context = ?self.current, "context removed");
        &self.current
    }

    /// Swap back to the previous context
    pub fn revert(&mut self) -> &[String] {
        let previous = self.previous.clone();
        self.set(previous)
    }

    pub fn reset_to_default(&mut self) -> &[String] {
        let universal = vec![self.universal.clone()];
        self.set(universal)
    }

    /// Overwrite both slots, e.g. from a snapshot
    pub fn restore(&mut self, current: Vec<String>, previous: Vec<String>) {
        self.current = self.normalize(current);
        self.previous = self.normalize(previous);
    }

    /// Can a wish with this scope be seen right now?
    pub fn is_visible(&self, scope: &Scope) -> bool {
        self.is_universal()
            || scope.is_universal(&self.universal)
            || (scope.all.is_empty() && scope.none.is_empty() && scope.any == self.current)
            || scope.admits(&self.current)
    }

    /// Visibility against an arbitrary label list instead of the active one
    pub fn is_visible_in(&self, scope: &Scope, labels: &[String]) -> bool {
        self.is_default(labels) || scope.is_universal(&self.universal) || scope.admits(labels)
    }

    fn normalize(&self, labels: Vec<String>) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels {
            if !unique.contains(&label) {
                unique.push(label);
            }
        }
        if unique.is_empty() {
            unique.push(self.universal.clone());
        }
        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_starts_universal() {
        let ctx = ActiveContext::new("universe");
        assert!(ctx.is_universal());
        assert_eq!(ctx.labels(), &labels(&["universe"])[..]);
    }

    #[test]
    fn test_set_and_revert_toggle() {
        let mut ctx = ActiveContext::new("universe");
        ctx.set(labels(&["editor"]));
        assert_eq!(ctx.labels(), &labels(&["editor"])[..]);
        assert_eq!(ctx.previous(), &labels(&["universe"])[..]);

        ctx.revert();
        assert!(ctx.is_universal());

        ctx.revert();
        assert_eq!(ctx.labels(), &labels(&["editor"])[..]);
    }

    #[test]
    fn test_add_replaces_universal_and_dedupes() {
        let mut ctx = ActiveContext::new("universe");
        ctx.add(&labels(&["a", "b", "a"]));
        assert_eq!(ctx.labels(), &labels(&["a", "b"])[..]);

        ctx.add(&labels(&["b", "c"]));
        assert_eq!(ctx.labels(), &labels(&["a", "b", "c"])[..]);
        assert_eq!(ctx.previous(), &labels(&["a", "b"])[..]);
    }

    #[test]
    fn test_remove_falls_back_to_universal() {
        let mut ctx = ActiveContext::new("universe");
        ctx.set(labels(&["a", "b"]));
        ctx.remove(&labels(&["a"]));
        assert_eq!(ctx.labels(), &labels(&["b"])[..]);

        ctx.remove(&labels(&["b"]));
        assert!(ctx.is_universal());
    }

    #[test]
    fn test_set_empty_is_universal() {
        let mut ctx = ActiveContext::new("universe");
        ctx.set(Vec::new());
        assert!(ctx.is_universal());
    }

    #[test]
    fn test_visibility() {
        let mut ctx = ActiveContext::new("universe");
        let scoped = Scope::any(["editor"]);

        // universal context shows everything
        assert!(ctx.is_visible(&scoped));

        ctx.set(labels(&["viewer"]));
        assert!(!ctx.is_visible(&scoped));
        assert!(ctx.is_visible(&Scope::universal("universe")));

        ctx.set(labels(&["editor"]));
        assert!(ctx.is_visible(&scoped));
    }

    #[test]
    fn test_universal_scope_with_exclusions_is_not_a_shortcut() {
        let mut ctx = ActiveContext::new("universe");
        let scope = Scope::universal("universe").and_none(["x"]);

        assert!(ctx.is_visible(&scope));
        ctx.set(labels(&["x"]));
        assert!(!ctx.is_visible(&scope));
        assert!(!ctx.is_visible_in(&scope, &labels(&["x"])));
        assert!(ctx.is_visible(&Scope::universal("universe")));
    }

    #[test]
    fn test_visible_in_other_labels() {
        let ctx = ActiveContext::new("universe");
        let scoped = Scope::all(["a", "b"]);
        assert!(ctx.is_visible_in(&scoped, &labels(&["a", "b"])));
        assert!(!ctx.is_visible_in(&scoped, &labels(&["a"])));
        assert!(ctx.is_visible_in(&scoped, &labels(&["universe"])));
    }
}
