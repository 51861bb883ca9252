//! Listener registry keyed by event kind.
//!
//! Each kind maps to an ordered list of callback handles. A kind with no
//! listeners has no entry at all, so "registered with zero callbacks" can't
//! be observed.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

use super::Event;
use super::error::ListenerResult;

/// Shared callback handle invoked once per delivered event.
pub type Listener<E> = Rc<dyn Fn(&E) -> ListenerResult>;

/// Handle returned by `subscribe`, used to remove that one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Entry<E> {
    id: ListenerId,
    callback: Listener<E>,
}

/// Listeners snapshotted for one dispatch, in registration order.
pub(crate) type Snapshot<E> = SmallVec<[(ListenerId, Listener<E>); 4]>;

pub(crate) struct ListenerRegistry<E: Event> {
    map: FxHashMap<E::Kind, SmallVec<[Entry<E>; 4]>>,
    next_id: u64,
}

impl<E: Event> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
            next_id: 0,
        }
    }
}

impl<E: Event> ListenerRegistry<E> {
    /// Append a callback to the kind's list and hand back its id.
    pub fn add(&mut self, kind: E::Kind, callback: Listener<E>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.map.entry(kind).or_default().push(Entry { id, callback });
        id
    }

    /// Remove one registration. Returns false if the pair was not registered.
    pub fn remove(&mut self, kind: E::Kind, id: ListenerId) -> bool {
        let Some(list) = self.map.get_mut(&kind) else {
            return false;
        };
        let Some(pos) = list.iter().position(|entry| entry.id == id) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.map.remove(&kind);
        }
        true
    }

    /// Clone the handles for `kind` so they can run without borrowing the registry.
    pub fn snapshot(&self, kind: E::Kind) -> Snapshot<E> {
        self.map
            .get(&kind)
            .map(|list| {
                list.iter()
                    .map(|entry| (entry.id, Rc::clone(&entry.callback)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, kind: E::Kind) -> bool {
        self.map.contains_key(&kind)
    }

    pub fn len(&self, kind: E::Kind) -> usize {
        self.map.get(&kind).map_or(0, |list| list.len())
    }

    /// Number of kinds with at least one listener.
    pub fn kind_count(&self) -> usize {
        self.map.len()
    }
}
