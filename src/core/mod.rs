/// Core functionality modules
///
/// Contains the matching, recency and registry logic, and the engine that
/// puts them together.

pub mod engine;
pub mod handler;
pub mod matcher;
pub mod recency;
pub mod registry;

pub use engine::WishEngine;
pub use handler::{Handler, LogNavigationSink, NavigateTarget, NavigationSink};
pub use matcher::{MatchTier, StringMatcher};
pub use recency::RecencyIndex;
pub use registry::Registry;
