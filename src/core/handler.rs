/// What happens when a wish is made
///
/// Either a callback, or a navigation target that gets handed to whatever
/// `NavigationSink` the engine was built with.

use crate::core::engine::WishEngine;
use crate::store::models::Wish;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::info;

/// Callback signature. The engine is passed in so a wish can register or
/// remove other wishes while it runs.
pub type Callback = Rc<dyn Fn(&mut WishEngine, &Wish, Option<&str>)>;

#[derive(Clone)]
pub enum Handler {
    Callback(Callback),
    Navigate(NavigateTarget),
}

impl Handler {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut WishEngine, &Wish, Option<&str>) + 'static,
    {
        Handler::Callback(Rc::new(f))
    }

    pub fn navigate(target: impl Into<String>, open_in_new_surface: bool) -> Self {
        Handler::Navigate(NavigateTarget {
            target: target.into(),
            open_in_new_surface,
        })
    }

    pub fn navigation_target(&self) -> Option<&NavigateTarget> {
        match self {
            Handler::Navigate(target) => Some(target),
            Handler::Callback(_) => None,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Callback(_) => write!(f, "Handler::Callback(..)"),
            Handler::Navigate(target) => write!(f, "Handler::Navigate({:?})", target),
        }
    }
}

/// Where a navigation wish goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NavigateSpec")]
pub struct NavigateTarget {
    pub target: String,
    pub open_in_new_surface: bool,
}

// A bare string is shorthand for "open here"
#[derive(Deserialize)]
#[serde(untagged)]
enum NavigateSpec {
    Target(String),
    Full {
        target: String,
        #[serde(default)]
        open_in_new_surface: bool,
    },
}

impl From<NavigateSpec> for NavigateTarget {
    fn from(spec: NavigateSpec) -> Self {
        match spec {
            NavigateSpec::Target(target) => NavigateTarget {
                target,
                open_in_new_surface: false,
            },
            NavigateSpec::Full {
                target,
                open_in_new_surface,
            } => NavigateTarget {
                target,
                open_in_new_surface,
            },
        }
    }
}

/// Something that can actually go to a target (a window, a router, a shell)
pub trait NavigationSink {
    fn navigate(&self, target: &str, open_in_new_surface: bool);
}

/// Default sink: just logs where it would have gone
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigationSink;

impl NavigationSink for LogNavigationSink {
    fn navigate(&self, target: &str, open_in_new_surface: bool) {
        info!(destination = target, new_surface = open_in_new_surface, "navigate");
    }
}
