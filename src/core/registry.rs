/// Wish registry
///
/// Owns the wishes in registration order. Order matters: within one match
/// tier, earlier registrations come first.

use crate::config::EngineConfig;
use crate::context::Scope;
use crate::store::models::{Usage, Wish, WishSpec};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Registry {
    wishes: Vec<Wish>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn a spec into a wish without installing it.
    ///
    /// Assigns an id when the spec has none, defaults the scope to the
    /// universal context and starts usage at zero.
    pub fn build(&mut self, spec: WishSpec, config: &EngineConfig) -> Wish {
        let id = match spec.id {
            Some(id) => id,
            None => self.generate_id(&config.id_prefix),
        };

        Wish {
            id,
            magic_words: spec.magic_words,
            scope: spec
                .scope
                .unwrap_or_else(|| Scope::universal(&config.universal_label)),
            payload: spec
                .payload
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            usage: Usage::default(),
            handler: spec.handler,
        }
    }

    /// Build and install. Same id means the old wish is replaced outright.
    pub fn register(&mut self, spec: WishSpec, config: &EngineConfig) -> &Wish {
        let wish = self.build(spec, config);
        self.install(wish)
    }

    /// Put a wish in the table, replacing one with the same id in place
    pub fn install(&mut self, wish: Wish) -> &Wish {
        let index = match self.position(&wish.id) {
            Some(index) => {
                debug!(id = %wish.id, "replacing wish");
                self.wishes[index] = wish;
                index
            }
            None => {
                debug!(id = %wish.id, "registering wish");
                self.wishes.push(wish);
                self.wishes.len() - 1
            }
        };
        &self.wishes[index]
    }

    /// Install a wish, borrowing the handler of the wish it replaces when it
    /// has none of its own. Returns None (and changes nothing) if it still
    /// ends up without a handler.
    pub fn merge(&mut self, mut wish: Wish) -> Option<&Wish> {
        if wish.handler.is_none() {
            wish.handler = self.get(&wish.id).and_then(|existing| existing.handler.clone());
        }
        if wish.handler.is_none() {
            debug!(id = %wish.id, "skipping merge of wish without a handler");
            return None;
        }
        Some(self.install(wish))
    }

    pub fn remove(&mut self, id: &str) -> Option<Wish> {
        let index = self.position(id)?;
        debug!(id, "deregistering wish");
        Some(self.wishes.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Wish> {
        self.wishes.iter().find(|wish| wish.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Wish> {
        self.wishes.iter_mut().find(|wish| wish.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wish> {
        self.wishes.iter()
    }

    pub fn len(&self) -> usize {
        self.wishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wishes.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Only needed when restoring state. Ids handed out before can come
    /// back if this goes down.
    pub fn set_next_id(&mut self, next_id: u64) {
        self.next_id = next_id;
    }

    pub fn clear(&mut self) {
        self.wishes.clear();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.wishes.iter().position(|wish| wish.id == id)
    }

    fn generate_id(&mut self, prefix: &str) -> String {
        let id = format!("{}{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }
}
