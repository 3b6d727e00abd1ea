/// The wish engine
///
/// Ties the registry, the recency index and the active context together.
/// Everything a caller does goes through `WishEngine`: registering wishes,
/// querying with a fragment, making a wish, moving the context around.
///
/// While the engine is disabled every call except the enable toggles is a
/// no-op that returns its empty value.

use crate::config::EngineConfig;
use crate::context::path_rules;
use crate::context::{ActiveContext, MatchType, PathRule, ScopeKind};
use crate::core::handler::{Handler, LogNavigationSink, NavigationSink};
use crate::core::matcher::{MatchTier, StringMatcher};
use crate::core::recency::RecencyIndex;
use crate::core::registry::Registry;
use crate::error::Result;
use crate::store::models::{parse_fragment, Wish, WishSpec};
use crate::store::snapshot::{RestoreMode, Snapshot};
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, trace, warn};

// Scope sets that tie a wish to a label when deregistering by context. A
// label listed in a wish's `none` set keeps the wish out of that context, it
// doesn't put the wish in it.
const DEREGISTER_KINDS: [ScopeKind; 2] = [ScopeKind::Any, ScopeKind::All];

pub struct WishEngine {
    config: EngineConfig,
    registry: Registry,
    recency: RecencyIndex,
    context: ActiveContext,
    path_rules: Vec<PathRule>,
    enabled: bool,
    navigation: Rc<dyn NavigationSink>,
}

impl Default for WishEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl WishEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a custom config. Fails if the config doesn't validate.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Send navigation wishes somewhere other than the log
    pub fn with_navigation_sink(mut self, sink: Rc<dyn NavigationSink>) -> Self {
        self.navigation = sink;
        self
    }

    fn build(config: EngineConfig) -> Self {
        let context = ActiveContext::new(&config.universal_label);
        Self {
            config,
            registry: Registry::new(),
            recency: RecencyIndex::new(),
            context,
            path_rules: Vec::new(),
            enabled: true,
            navigation: Rc::new(LogNavigationSink),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn is_gated(&self, operation: &str) -> bool {
        if !self.enabled {
            warn!(operation, "engine disabled, call ignored");
        }
        !self.enabled
    }

    // ---- registration ----

    /// Register one wish. A wish with an id that's already taken replaces
    /// the old one in place.
    pub fn register(&mut self, spec: WishSpec) -> Option<Wish> {
        if self.is_gated("register") {
            return None;
        }
        Some(self.registry.register(spec, &self.config).clone())
    }

    pub fn register_batch<I>(&mut self, specs: I) -> Vec<Wish>
    where
        I: IntoIterator<Item = WishSpec>,
    {
        if self.is_gated("register_batch") {
            return Vec::new();
        }
        specs
            .into_iter()
            .map(|spec| self.registry.register(spec, &self.config).clone())
            .collect()
    }

    /// Remove a wish and forget it in the recency index
    pub fn deregister(&mut self, id: &str) -> Option<Wish> {
        if self.is_gated("deregister") {
            return None;
        }
        self.remove_wish(id)
    }

    /// Deregister every wish whose `any` or `all` labels match `labels`
    pub fn deregister_with_context(&mut self, labels: &[String], match_type: MatchType) -> Vec<Wish> {
        if self.is_gated("deregister_with_context") {
            return Vec::new();
        }
        self.remove_matching(labels, match_type, &DEREGISTER_KINDS)
    }

    /// Wishes whose scope matches `labels`. Empty `kinds` means all three
    /// scope sets.
    pub fn wishes_with_context(
        &self,
        labels: &[String],
        match_type: MatchType,
        kinds: &[ScopeKind],
    ) -> Vec<Wish> {
        if self.is_gated("wishes_with_context") {
            return Vec::new();
        }
        self.registry
            .iter()
            .filter(|wish| wish.scope.matches(labels, match_type, kinds))
            .cloned()
            .collect()
    }

    /// Replace wishes by id, keeping live handlers. See `Registry::merge`.
    pub fn merge<I>(&mut self, batch: I) -> Vec<Wish>
    where
        I: IntoIterator<Item = (String, WishSpec)>,
    {
        if self.is_gated("merge") {
            return Vec::new();
        }
        let mut merged = Vec::new();
        for (id, mut spec) in batch {
            spec.id = Some(id);
            let wish = self.registry.build(spec, &self.config);
            if let Some(installed) = self.registry.merge(wish) {
                merged.push(installed.clone());
            }
        }
        merged
    }

    fn remove_wish(&mut self, id: &str) -> Option<Wish> {
        let wish = self.registry.remove(id)?;
        self.recency.purge(id);
        Some(wish)
    }

    fn remove_matching(
        &mut self,
        labels: &[String],
        match_type: MatchType,
        kinds: &[ScopeKind],
    ) -> Vec<Wish> {
        let ids: Vec<String> = self
            .registry
            .iter()
            .filter(|wish| wish.scope.matches(labels, match_type, kinds))
            .map(|wish| wish.id.clone())
            .collect();

        ids.iter().filter_map(|id| self.remove_wish(id)).collect()
    }

    // ---- lookup ----

    pub fn get(&self, id: &str) -> Option<Wish> {
        if self.is_gated("get") {
            return None;
        }
        self.registry.get(id).cloned()
    }

    /// One slot per id, in the order given. Unknown ids are `None`.
    pub fn get_many<I, S>(&self, ids: I) -> Vec<Option<Wish>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.is_gated("get_many") {
            return Vec::new();
        }
        ids.into_iter()
            .map(|id| self.registry.get(id.as_ref()).cloned())
            .collect()
    }

    /// Wishes that would be visible if `labels` were the active context.
    /// `None` stands for the universal context, i.e. every wish.
    pub fn wishes_in_context(&self, labels: Option<&[String]>) -> Vec<Wish> {
        if self.is_gated("wishes_in_context") {
            return Vec::new();
        }
        let universal = [self.config.universal_label.clone()];
        let labels = labels.unwrap_or(&universal);
        self.registry
            .iter()
            .filter(|wish| self.context.is_visible_in(&wish.scope, labels))
            .cloned()
            .collect()
    }

    /// Visible wishes for a fragment, best first.
    ///
    /// Wishes already made with this fragment come first in recency order.
    /// Every other visible wish follows, grouped by match tier and in
    /// registration order within a tier.
    pub fn query(&self, fragment: Option<&str>) -> Vec<Wish> {
        if self.is_gated("query") {
            return Vec::new();
        }
        self.matching_wishes(&fragment.unwrap_or_default().to_lowercase())
    }

    /// `query` with a JSON fragment. `null` is the empty fragment; arrays and
    /// objects are rejected.
    pub fn query_value(&self, fragment: &Value) -> Result<Vec<Wish>> {
        if self.is_gated("query_value") {
            return Ok(Vec::new());
        }
        let fragment = parse_fragment(fragment)?;
        Ok(self.matching_wishes(&fragment.to_lowercase()))
    }

    fn matching_wishes(&self, fragment: &str) -> Vec<Wish> {
        let remembered = self.recency.lookup(fragment, self.config.recency_lookup);

        let mut results: Vec<Wish> = remembered
            .iter()
            .filter_map(|id| self.registry.get(id))
            .filter(|wish| self.context.is_visible(&wish.scope))
            .cloned()
            .collect();

        let mut ranked: Vec<(MatchTier, &Wish)> = self
            .registry
            .iter()
            .filter(|wish| !remembered.contains(&wish.id))
            .filter(|wish| self.context.is_visible(&wish.scope))
            .map(|wish| (StringMatcher::best_match(&wish.magic_words, fragment).tier, wish))
            .filter(|(tier, _)| tier.is_match())
            .collect();
        // stable, so registration order survives inside a tier
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        trace!(
            fragment,
            remembered = results.len(),
            ranked = ranked.len(),
            "query"
        );
        results.extend(ranked.into_iter().map(|(_, wish)| wish.clone()));
        results
    }

    // ---- invocation ----

    /// Make a wish.
    ///
    /// Looks the wish up by `id`, falling back to the best match for
    /// `fragment`. Refuses (returns `None`) when nothing is found, the wish
    /// has no handler, or it isn't visible in the active context. Otherwise
    /// runs the handler, bumps the usage counters and, when a fragment was
    /// given, records it in the recency index.
    pub fn invoke(&mut self, id: Option<&str>, fragment: Option<&str>) -> Option<Wish> {
        if self.is_gated("invoke") {
            return None;
        }
        let fragment = fragment.map(str::to_lowercase);

        let found = id.and_then(|id| self.registry.get(id)).cloned().or_else(|| {
            self.matching_wishes(fragment.as_deref().unwrap_or_default())
                .into_iter()
                .next()
        });
        let wish = match found {
            Some(wish) => wish,
            None => {
                warn!(?id, ?fragment, "no wish to make");
                return None;
            }
        };

        let handler = match wish.handler.clone() {
            Some(handler) => handler,
            None => {
                warn!(id = %wish.id, "wish has no handler");
                return None;
            }
        };
        if !self.context.is_visible(&wish.scope) {
            warn!(id = %wish.id, context = ?self.context.labels(), "wish not visible in context");
            return None;
        }

        debug!(id = %wish.id, ?fragment, "making wish");
        match handler {
            Handler::Callback(callback) => callback(self, &wish, fragment.as_deref()),
            Handler::Navigate(nav) => self
                .navigation
                .navigate(&nav.target, nav.open_in_new_surface),
        }

        // The handler may have deregistered its own wish. Counters still go
        // on the returned copy, but nothing is remembered for it.
        match self.registry.get_mut(&wish.id) {
            Some(live) => {
                live.usage.record(fragment.as_deref());
                let made = live.clone();
                if let Some(fragment) = &fragment {
                    self.recency.record(fragment, &made.id);
                }
                Some(made)
            }
            None => {
                let mut made = wish;
                made.usage.record(fragment.as_deref());
                Some(made)
            }
        }
    }

    // ---- state ----

    /// Copy of the engine state. While disabled this is an empty snapshot or
    /// `None`, depending on `return_empty_when_disabled`.
    pub fn snapshot(&self) -> Option<Snapshot> {
        if self.is_gated("snapshot") {
            return self
                .config
                .return_empty_when_disabled
                .then(Snapshot::empty);
        }
        Some(self.current_snapshot())
    }

    fn current_snapshot(&self) -> Snapshot {
        Snapshot {
            wishes: self.registry.iter().map(Wish::to_record).collect(),
            next_id: self.registry.next_id(),
            recency: self.recency.clone(),
            context: self.context.labels().to_vec(),
            previous_context: self.context.previous().to_vec(),
            enabled: self.enabled,
        }
    }

    /// Load a snapshot.
    ///
    /// Recency, context and the enabled flag are taken over as they are.
    /// Wishes follow `mode`: `Replace` drops the registry first, `Merge`
    /// keeps live handlers and skips records that would end up without one.
    pub fn restore(&mut self, snapshot: Snapshot, mode: RestoreMode) {
        if self.is_gated("restore") {
            return;
        }

        match mode {
            RestoreMode::Replace => {
                self.registry.clear();
                self.registry.set_next_id(snapshot.next_id);
            }
            RestoreMode::Merge => {
                let next_id = self.registry.next_id().max(snapshot.next_id);
                self.registry.set_next_id(next_id);
            }
        }

        let total = snapshot.wishes.len();
        let mut installed = 0;
        for record in snapshot.wishes {
            let usage = record.usage.clone();
            let mut wish = self.registry.build(record.into_spec(), &self.config);
            wish.usage = usage;

            let added = match mode {
                RestoreMode::Replace => Some(self.registry.install(wish)),
                RestoreMode::Merge => self.registry.merge(wish),
            };
            if added.is_some() {
                installed += 1;
            }
        }

        self.recency = snapshot.recency;
        self.context
            .restore(snapshot.context, snapshot.previous_context);
        self.enabled = snapshot.enabled;
        debug!(?mode, installed, skipped = total - installed, "snapshot restored");
    }

    /// Drop every wish, the recency index and the context. Path rules stay.
    /// Returns the state as it was before.
    pub fn reset(&mut self) -> Option<Snapshot> {
        if self.is_gated("reset") {
            return None;
        }
        let previous = self.current_snapshot();
        self.registry = Registry::new();
        self.recency.clear();
        self.context = ActiveContext::new(&self.config.universal_label);
        self.enabled = true;
        debug!(dropped = previous.wishes.len(), "engine reset");
        Some(previous)
    }

    // ---- context ----

    pub fn context(&self) -> Vec<String> {
        if self.is_gated("context") {
            return Vec::new();
        }
        self.context.labels().to_vec()
    }

    pub fn previous_context(&self) -> Vec<String> {
        if self.is_gated("previous_context") {
            return Vec::new();
        }
        self.context.previous().to_vec()
    }

    pub fn set_context<I, S>(&mut self, labels: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.is_gated("set_context") {
            return Vec::new();
        }
        self.context
            .set(labels.into_iter().map(Into::into).collect())
            .to_vec()
    }

    pub fn add_context<I, S>(&mut self, labels: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.is_gated("add_context") {
            return Vec::new();
        }
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        self.context.add(&labels).to_vec()
    }

    pub fn remove_context<I, S>(&mut self, labels: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.is_gated("remove_context") {
            return Vec::new();
        }
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        self.context.remove(&labels).to_vec()
    }

    pub fn revert_context(&mut self) -> Vec<String> {
        if self.is_gated("revert_context") {
            return Vec::new();
        }
        self.context.revert().to_vec()
    }

    pub fn reset_context_to_default(&mut self) -> Vec<String> {
        if self.is_gated("reset_context_to_default") {
            return Vec::new();
        }
        self.context.reset_to_default().to_vec()
    }

    /// Move the context to match `path`.
    ///
    /// Labels from rules that don't apply (and stale placeholder labels) are
    /// removed, and unless `suppress_deregistration` is set, wishes scoped to
    /// them are deregistered. Then the rules' labels for this path are added.
    /// An empty path changes nothing.
    pub fn resolve_path_context(&mut self, path: &str, suppress_deregistration: bool) -> Vec<String> {
        if self.is_gated("resolve_path_context") {
            return Vec::new();
        }
        if path.is_empty() {
            return self.context.labels().to_vec();
        }

        let resolved = path_rules::resolve(&self.path_rules, path, self.context.labels());
        debug!(path, add = ?resolved.add, remove = ?resolved.remove, "path context resolved");

        if !resolved.remove.is_empty() {
            self.context.remove(&resolved.remove);
            if !suppress_deregistration {
                let dropped =
                    self.remove_matching(&resolved.remove, MatchType::Any, &DEREGISTER_KINDS);
                if !dropped.is_empty() {
                    debug!(count = dropped.len(), "deregistered wishes for removed labels");
                }
            }
        }
        if !resolved.add.is_empty() {
            self.context.add(&resolved.add);
        }
        self.context.labels().to_vec()
    }

    pub fn add_path_rule(&mut self, rule: PathRule) -> Vec<PathRule> {
        self.add_path_rules([rule])
    }

    /// Add rules, skipping ones that are already there
    pub fn add_path_rules<I>(&mut self, rules: I) -> Vec<PathRule>
    where
        I: IntoIterator<Item = PathRule>,
    {
        if self.is_gated("add_path_rules") {
            return Vec::new();
        }
        for rule in rules {
            if !self.path_rules.contains(&rule) {
                self.path_rules.push(rule);
            }
        }
        self.path_rules.clone()
    }

    pub fn remove_path_rule(&mut self, rule: &PathRule) -> Vec<PathRule> {
        if self.is_gated("remove_path_rule") {
            return Vec::new();
        }
        self.path_rules.retain(|existing| existing != rule);
        self.path_rules.clone()
    }

    pub fn path_rules(&self) -> Vec<PathRule> {
        if self.is_gated("path_rules") {
            return Vec::new();
        }
        self.path_rules.clone()
    }

    // ---- toggles (never gated) ----

    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        debug!(enabled, "engine toggled");
        self.enabled = enabled;
        self.enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_return_empty_when_disabled(&mut self, return_empty: bool) -> bool {
        self.config.return_empty_when_disabled = return_empty;
        return_empty
    }
}
