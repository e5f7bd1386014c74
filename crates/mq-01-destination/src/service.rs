//! Destination registry.
//!
//! Interns `DestinationUid`s per (name, kind). Entries are weak: once every
//! holder of an identity drops it, the next lookup builds a fresh one and
//! the dead entry is pruned. Deleted destinations are evicted explicitly
//! with `clear_uid`.

use crate::domain::uid::Inner;
use crate::domain::DestinationUid;
use crate::error::DestinationResult;
use crate::ports::inbound::DestinationResolver;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Dead entries are swept once a map grows past this many entries.
const MIN_SWEEP_AT: usize = 64;

struct InternMap {
    entries: HashMap<String, Weak<Inner>>,
    sweep_at: usize,
}

impl Default for InternMap {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: MIN_SWEEP_AT,
        }
    }
}

impl InternMap {
    fn insert(&mut self, name: &str, inner: &Arc<Inner>) {
        self.entries.insert(name.to_string(), Arc::downgrade(inner));
        if self.entries.len() >= self.sweep_at {
            self.sweep();
            // amortized: the next sweep waits until the live set doubles
            self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP_AT);
        }
    }

    fn sweep(&mut self) {
        self.entries.retain(|_, weak| weak.strong_count() > 0);
    }
}

#[derive(Default)]
struct Maps {
    queues: InternMap,
    topics: InternMap,
}

impl Maps {
    fn for_kind(&mut self, is_queue: bool) -> &mut InternMap {
        if is_queue {
            &mut self.queues
        } else {
            &mut self.topics
        }
    }
}

/// Registry owned by the broker's destination manager.
///
/// Both maps sit behind one lock so a lookup and the insert that follows it
/// are atomic.
#[derive(Default)]
pub struct DestinationRegistry {
    maps: Mutex<Maps>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live interned identities. Reclaimed entries are pruned.
    pub fn len(&self) -> usize {
        let mut maps = self.maps.lock();
        maps.queues.sweep();
        maps.topics.sweep();
        maps.queues.entries.len() + maps.topics.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict every entry.
    pub fn clear(&self) {
        let mut maps = self.maps.lock();
        *maps = Maps::default();
        debug!("[mq-01] destination registry cleared");
    }
}

impl DestinationResolver for DestinationRegistry {
    fn get_uid(&self, name: &str, is_queue: bool) -> DestinationResult<DestinationUid> {
        let mut maps = self.maps.lock();
        let map = maps.for_kind(is_queue);

        if let Some(inner) = map.entries.get(name).and_then(Weak::upgrade) {
            return Ok(DestinationUid::from_inner(inner));
        }

        // a rejected name is never cached
        let inner = DestinationUid::build_inner(name, is_queue)?;
        map.insert(name, &inner);
        debug!(name, is_queue, "[mq-01] interned destination");
        Ok(DestinationUid::from_inner(inner))
    }

    fn contains(&self, name: &str, is_queue: bool) -> bool {
        let mut maps = self.maps.lock();
        maps.for_kind(is_queue)
            .entries
            .get(name)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    fn clear_uid(&self, name: &str, is_queue: bool) {
        let mut maps = self.maps.lock();
        if maps.for_kind(is_queue).entries.remove(name).is_some() {
            debug!(name, is_queue, "[mq-01] evicted destination");
        }
    }
}
