//! The `Registry` struct and its associated methods.

use crate::builder::RegistryBuilder;
use crate::core::{self, Defaults, LocalFactory, SharedFactory, SharedSlots, SlotKey};
use crate::error::{Error, Result};
use crate::guard::ScopeGuard;
use once_cell::sync::OnceCell;
use std::any::type_name;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace, warn};

/// The ambient override registry.
///
/// A registry maps each resolvable type, optionally paired with an owner type,
/// to at most one override factory per thread. Installing returns a
/// [`ScopeGuard`]; while the guard lives, every resolution of that type on
/// the same thread produces the override.
///
/// Installs are **first-claim-wins**. Installing over a slot that is already
/// occupied is not an error: nothing changes and an inert guard comes back.
/// The outermost active override stays authoritative until it is released.
///
/// One thread may be designated the *outer* thread. Overrides it installs are
/// also published as a fallback for every other thread whose own slot is
/// empty.
pub struct Registry {
  id: u64,
  label: String,
  name: Option<String>,
  thread_inheritance: bool,
  outer_thread: OnceCell<ThreadId>,
  shared: SharedSlots,
  defaults: Defaults,
}

impl Default for Registry {
  fn default() -> Self {
    RegistryBuilder::default().build()
  }
}

impl fmt::Debug for Registry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registry")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("thread_inheritance", &self.thread_inheritance)
      .field("outer_thread", &self.outer_thread.get())
      .finish_non_exhaustive()
  }
}

impl Registry {
  /// Creates a new, empty `Registry` with the default configuration.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns a builder for a configured `Registry`.
  pub fn builder() -> RegistryBuilder {
    RegistryBuilder::new()
  }

  pub(crate) fn from_builder(builder: RegistryBuilder) -> Self {
    let id = core::next_registry_id();
    let label = match &builder.name {
      Some(name) => name.clone(),
      None => format!("registry-{}", id),
    };
    Self {
      id,
      label,
      name: builder.name,
      thread_inheritance: builder.thread_inheritance,
      outer_thread: OnceCell::new(),
      shared: SharedSlots::default(),
      defaults: Defaults::default(),
    }
  }

  pub(crate) fn id(&self) -> u64 {
    self.id
  }

  pub(crate) fn label(&self) -> &str {
    &self.label
  }

  pub(crate) fn shared_slots(&self) -> &SharedSlots {
    &self.shared
  }

  /// The name given to this registry by its builder, if any.
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  // --- PRIVATE HELPERS ---

  fn install_internal<T: 'static>(
    &self,
    key: SlotKey,
    local: LocalFactory<T>,
    shared: Option<SharedFactory<T>>,
  ) -> ScopeGuard<'_> {
    if !core::claim_local(self.id, key, local) {
      debug!(registry = %self.label, key = ?key, "slot already claimed, install is inert");
      return ScopeGuard::inert(self, key);
    }

    let shared_token = match shared {
      Some(factory) if self.is_outer_thread() => self.shared.claim(key, factory),
      _ => None,
    };
    debug!(
      registry = %self.label,
      key = ?key,
      published = shared_token.is_some(),
      "override installed"
    );
    ScopeGuard::claimed(self, key, shared_token)
  }

  fn install_shared<T: 'static>(&self, key: SlotKey, factory: SharedFactory<T>) -> ScopeGuard<'_> {
    let for_thread = Arc::clone(&factory);
    let local: LocalFactory<T> = Rc::new(move || for_thread());
    self.install_internal(key, local, Some(factory))
  }

  /// Runs the override for `key`: the thread's own slot first, then the
  /// outer thread's published fallback.
  fn resolve_override<T: 'static>(&self, key: SlotKey) -> Option<T> {
    if let Some(factory) = core::local_factory::<T>(self.id, key) {
      trace!(registry = %self.label, key = ?key, source = "local", "resolved override");
      return Some(factory());
    }
    if self.thread_inheritance {
      if let Some(factory) = self.shared.factory::<T>(key) {
        trace!(registry = %self.label, key = ?key, source = "inherited", "resolved override");
        return Some(factory());
      }
    }
    None
  }

  /// The full lookup chain short of `Default::default()`.
  fn lookup<T: 'static>(&self, owner: Option<SlotKey>) -> Option<T> {
    if let Some(owner_key) = owner {
      if let Some(instance) = self.resolve_override::<T>(owner_key) {
        return Some(instance);
      }
    }
    if let Some(instance) = self.resolve_override::<T>(SlotKey::new::<T>()) {
      return Some(instance);
    }
    let factory = self.defaults.factory::<T>()?;
    trace!(registry = %self.label, type_name = type_name::<T>(), source = "default", "resolved default");
    Some(factory())
  }

  fn owner_key<T: 'static, O: ?Sized + 'static>(owner: Option<&O>) -> Option<SlotKey> {
    owner.map(|_| SlotKey::new_with_owner::<T, O>())
  }

  // --- PUBLIC API ---

  // --- Outer Thread ---

  /// Designates the calling thread as the outer thread.
  ///
  /// Call once during start-up, on the thread that sets up the long-lived
  /// overrides. Overrides installed there afterwards are visible to every
  /// other thread as a fallback beneath that thread's own overrides.
  ///
  /// Returns `true` if the calling thread is (now) the outer thread. The
  /// first designation wins: a call from any other thread afterwards returns
  /// `false`, as does any call when thread inheritance is disabled.
  pub fn initialize_outer_thread(&self) -> bool {
    if !self.thread_inheritance {
      debug!(registry = %self.label, "thread inheritance is disabled, ignoring outer thread designation");
      return false;
    }
    let current = thread::current().id();
    let outer = *self.outer_thread.get_or_init(|| current);
    if outer == current {
      debug!(registry = %self.label, thread = ?current, "outer thread designated");
      true
    } else {
      warn!(
        registry = %self.label,
        thread = ?current,
        outer = ?outer,
        "outer thread already designated on another thread"
      );
      false
    }
  }

  /// Whether the calling thread is this registry's outer thread.
  pub fn is_outer_thread(&self) -> bool {
    self.thread_inheritance && self.outer_thread.get() == Some(&thread::current().id())
  }

  // --- Override Installation ---

  /// Installs `factory` as the override for `T` on the calling thread.
  ///
  /// If the slot is already occupied, including by an enclosing scope on the
  /// same thread, the returned guard is inert and `T` keeps resolving to the
  /// existing override.
  pub fn install<T: 'static>(
    &self,
    factory: impl Fn() -> T + Send + Sync + 'static,
  ) -> ScopeGuard<'_> {
    self.install_shared(SlotKey::new::<T>(), Arc::new(factory))
  }

  /// Installs `factory` as the override for `T` when resolved on behalf of
  /// an owner of type `O`.
  ///
  /// Owner-scoped overrides never affect resolutions without an owner, nor
  /// resolutions for a different owner type.
  pub fn install_for<T: 'static, O: ?Sized + 'static>(
    &self,
    factory: impl Fn() -> T + Send + Sync + 'static,
  ) -> ScopeGuard<'_> {
    self.install_shared(SlotKey::new_with_owner::<T, O>(), Arc::new(factory))
  }

  /// Like [`install`](Self::install), for factories that are not thread-safe.
  ///
  /// The override is never published to other threads, even from the outer
  /// thread.
  pub fn install_local<T: 'static>(&self, factory: impl Fn() -> T + 'static) -> ScopeGuard<'_> {
    self.install_internal(SlotKey::new::<T>(), Rc::new(factory), None)
  }

  /// Like [`install_for`](Self::install_for), for factories that are not
  /// thread-safe.
  pub fn install_local_for<T: 'static, O: ?Sized + 'static>(
    &self,
    factory: impl Fn() -> T + 'static,
  ) -> ScopeGuard<'_> {
    self.install_internal(SlotKey::new_with_owner::<T, O>(), Rc::new(factory), None)
  }

  // --- Default Construction ---

  /// Registers the factory used when no override for `T` is active.
  ///
  /// Unlike overrides, default factories are visible on every thread. A later
  /// registration replaces an earlier one.
  pub fn register_default<T: 'static>(&self, factory: impl Fn() -> T + Send + Sync + 'static) {
    if self.defaults.register::<T>(Arc::new(factory)) {
      debug!(registry = %self.label, type_name = type_name::<T>(), "default factory replaced");
    } else {
      debug!(registry = %self.label, type_name = type_name::<T>(), "default factory registered");
    }
  }

  // --- Resolution ---

  /// Produces a `T` from the active override or the registered default.
  ///
  /// Fails with [`Error::Construction`] if neither exists. A failed
  /// resolution changes no slot.
  pub fn try_resolve<T: 'static>(&self) -> Result<T> {
    self.lookup::<T>(None).ok_or(Error::Construction {
      type_name: type_name::<T>(),
    })
  }

  /// Produces a `T` on behalf of `owner`.
  ///
  /// With `Some(owner)`, an override installed for `(T, O)` wins; otherwise
  /// this behaves exactly like [`try_resolve`](Self::try_resolve).
  pub fn try_resolve_for<T: 'static, O: ?Sized + 'static>(&self, owner: Option<&O>) -> Result<T> {
    self
      .lookup::<T>(Self::owner_key::<T, O>(owner))
      .ok_or(Error::Construction {
        type_name: type_name::<T>(),
      })
  }

  /// Produces a `T`, falling back to `T::default()`.
  pub fn resolve<T: Default + 'static>(&self) -> T {
    self.lookup::<T>(None).unwrap_or_default()
  }

  /// Produces a `T` on behalf of `owner`, falling back to `T::default()`.
  pub fn resolve_for<T: Default + 'static, O: ?Sized + 'static>(&self, owner: Option<&O>) -> T {
    self
      .lookup::<T>(Self::owner_key::<T, O>(owner))
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Default, PartialEq)]
  struct Setting(&'static str);

  #[test]
  fn unnamed_registry_gets_a_generated_label() {
    let registry = Registry::new();
    assert_eq!(registry.name(), None);
    assert!(registry.label().starts_with("registry-"));

    let named = Registry::builder().name("app").build();
    assert_eq!(named.name(), Some("app"));
    assert_eq!(named.label(), "app");
  }

  #[test]
  fn registries_do_not_share_thread_local_slots() {
    let first = Registry::new();
    let second = Registry::new();

    let _scope = first.install(|| Setting("first"));

    assert_eq!(first.resolve::<Setting>(), Setting("first"));
    assert_eq!(second.resolve::<Setting>(), Setting::default());
  }

  #[test]
  fn disabled_inheritance_refuses_outer_thread() {
    let registry = Registry::builder().thread_inheritance(false).build();

    assert!(!registry.initialize_outer_thread());
    assert!(!registry.is_outer_thread());

    let scope = registry.install(|| Setting("local"));
    assert!(scope.is_claimed());
    assert!(!scope.is_published());
  }
}
