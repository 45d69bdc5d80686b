//! Core, non-public data structures for the ambient registry.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A factory visible only to the thread that installed it.
pub(crate) type LocalFactory<T> = Rc<dyn Fn() -> T>;

/// A factory that may be invoked from any thread.
pub(crate) type SharedFactory<T> = Arc<dyn Fn() -> T + Send + Sync>;

thread_local! {
  // Every override installed on this thread, for every registry. Entries are
  // keyed by the owning registry's id so registries never observe each other.
  static LOCAL_SLOTS: RefCell<HashMap<(u64, SlotKey), Box<dyn Any>>> =
    RefCell::new(HashMap::new());
}

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_CLAIM_TOKEN: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_registry_id() -> u64 {
  NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed)
}

fn next_claim_token() -> u64 {
  NEXT_CLAIM_TOKEN.fetch_add(1, Ordering::Relaxed)
}

/// Identifies a slot: the resolvable type plus an optional owner type.
#[derive(Clone, Copy)]
pub(crate) struct SlotKey {
  pub(crate) type_id: TypeId,
  pub(crate) owner: Option<TypeId>,
  type_name: &'static str,
  owner_name: Option<&'static str>,
}

impl SlotKey {
  pub(crate) fn new<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      owner: None,
      type_name: type_name::<T>(),
      owner_name: None,
    }
  }

  pub(crate) fn new_with_owner<T: ?Sized + Any, O: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      owner: Some(TypeId::of::<O>()),
      type_name: type_name::<T>(),
      owner_name: Some(type_name::<O>()),
    }
  }
}

// Names are diagnostic only; identity is the pair of type ids.
impl PartialEq for SlotKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id && self.owner == other.owner
  }
}

impl Eq for SlotKey {}

impl std::hash::Hash for SlotKey {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
    self.owner.hash(state);
  }
}

impl fmt::Debug for SlotKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.owner_name {
      Some(owner) => write!(f, "Slot({}, Owner({}))", self.type_name, owner),
      None => write!(f, "Slot({})", self.type_name),
    }
  }
}

// --- Thread-local slots ---

/// Occupies the calling thread's slot if it is empty.
///
/// Returns `false`, leaving the slot untouched, when it is already occupied.
pub(crate) fn claim_local<T: 'static>(registry: u64, key: SlotKey, factory: LocalFactory<T>) -> bool {
  // Checked first so a rejected factory is dropped outside the borrow.
  if is_local_occupied(registry, key) {
    return false;
  }
  LOCAL_SLOTS.with(|slots| {
    slots.borrow_mut().insert((registry, key), Box::new(factory));
  });
  true
}

/// Returns a clone of the calling thread's factory for `key`, if any.
///
/// The borrow of the slot map ends before the caller invokes the factory, so
/// factories are free to resolve or install other types.
pub(crate) fn local_factory<T: 'static>(registry: u64, key: SlotKey) -> Option<LocalFactory<T>> {
  LOCAL_SLOTS.with(|slots| {
    slots
      .borrow()
      .get(&(registry, key))
      .and_then(|slot| slot.downcast_ref::<LocalFactory<T>>())
      .cloned()
  })
}

pub(crate) fn is_local_occupied(registry: u64, key: SlotKey) -> bool {
  LOCAL_SLOTS.with(|slots| slots.borrow().contains_key(&(registry, key)))
}

/// Empties the calling thread's slot for `key`.
pub(crate) fn clear_local(registry: u64, key: SlotKey) {
  // `try_with` because a guard may be dropped while the thread is tearing
  // down its locals; by then there is nothing left to clear.
  let removed = LOCAL_SLOTS.try_with(|slots| slots.borrow_mut().remove(&(registry, key)));
  // The factory is dropped here, outside the borrow, since its captures may
  // hold guards of their own.
  drop(removed);
}

// --- Shared fallback slots ---

struct SharedEntry {
  token: u64,
  factory: Box<dyn Any + Send + Sync>,
}

/// The cross-thread fallback slots of one registry.
#[derive(Default)]
pub(crate) struct SharedSlots {
  slots: DashMap<SlotKey, SharedEntry>,
}

impl SharedSlots {
  /// Publishes `factory` if the shared slot for `key` is empty.
  ///
  /// The check and the insert happen under the same shard lock. Returns the
  /// claim token needed to release the slot later.
  pub(crate) fn claim<T: 'static>(&self, key: SlotKey, factory: SharedFactory<T>) -> Option<u64> {
    match self.slots.entry(key) {
      Entry::Occupied(_) => None,
      Entry::Vacant(vacant) => {
        let token = next_claim_token();
        vacant.insert(SharedEntry {
          token,
          factory: Box::new(factory),
        });
        Some(token)
      }
    }
  }

  pub(crate) fn factory<T: 'static>(&self, key: SlotKey) -> Option<SharedFactory<T>> {
    let entry = self.slots.get(&key)?;
    entry.factory.downcast_ref::<SharedFactory<T>>().cloned()
  }

  /// Empties the shared slot for `key` only if it still holds `token`.
  pub(crate) fn release(&self, key: SlotKey, token: u64) -> bool {
    self
      .slots
      .remove_if(&key, |_, entry| entry.token == token)
      .is_some()
  }

  #[cfg(test)]
  pub(crate) fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }
}

// --- Default factories ---

/// The registered default-construction capability, one factory per type.
#[derive(Default)]
pub(crate) struct Defaults {
  factories: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Defaults {
  pub(crate) fn register<T: 'static>(&self, factory: SharedFactory<T>) -> bool {
    self
      .factories
      .insert(TypeId::of::<T>(), Box::new(factory))
      .is_some()
  }

  pub(crate) fn factory<T: 'static>(&self) -> Option<SharedFactory<T>> {
    let entry = self.factories.get(&TypeId::of::<T>())?;
    entry.value().downcast_ref::<SharedFactory<T>>().cloned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Owner;

  #[test]
  fn slot_keys_with_and_without_owner_differ() {
    let global = SlotKey::new::<String>();
    let owned = SlotKey::new_with_owner::<String, Owner>();

    assert_ne!(global, owned);
    assert_eq!(global, SlotKey::new::<String>());
    assert!(format!("{:?}", owned).contains("Owner("));
  }

  #[test]
  fn claim_local_is_first_claim_wins() {
    let registry = next_registry_id();
    let key = SlotKey::new::<u32>();

    assert!(claim_local::<u32>(registry, key, Rc::new(|| 1u32)));
    assert!(!claim_local::<u32>(registry, key, Rc::new(|| 2u32)));
    assert_eq!(local_factory::<u32>(registry, key).map(|f| f()), Some(1));

    clear_local(registry, key);
    assert!(!is_local_occupied(registry, key));
  }

  #[test]
  fn shared_release_requires_matching_token() {
    let shared = SharedSlots::default();
    let key = SlotKey::new::<u32>();

    let token = shared.claim::<u32>(key, Arc::new(|| 7u32)).unwrap();
    assert!(shared.claim::<u32>(key, Arc::new(|| 8u32)).is_none());

    assert!(!shared.release(key, token + 1));
    assert_eq!(shared.factory::<u32>(key).map(|f| f()), Some(7));
    assert!(shared.release(key, token));
    assert!(shared.is_empty());
  }
}
