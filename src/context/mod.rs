/// Context scoping
///
/// Decides which wishes are visible given where the application is.

pub mod active;
pub mod path_rules;
pub mod scope;

pub use active::ActiveContext;
pub use path_rules::{PathContexts, PathRule, PathRuleSpec};
pub use scope::{MatchType, Scope, ScopeKind};
