//! The RAII handle returned by every install operation.

use crate::core::{self, SlotKey};
use crate::registry::Registry;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
  /// This guard occupied the thread-local slot, and possibly the shared one.
  Claimed { shared_token: Option<u64> },
  /// The slot was already occupied when the install ran.
  Inert,
  Released,
}

/// Keeps an override installed for as long as it is alive.
///
/// A guard releases exactly the slot it claimed: if the install found the slot
/// already occupied, the guard is inert and releasing it changes nothing.
/// Release happens on drop, so the override is revoked on every exit path,
/// including `?` and unwinding.
///
/// Guards are neither `Send` nor `Sync`. The slot lives on the installing
/// thread, so the guard must be released there.
///
/// Moving a guard to another thread does not compile:
///
/// ```compile_fail
/// use fibre_ambient::global;
///
/// let guard = global().install(|| 1u32);
/// std::thread::spawn(move || drop(guard));
/// ```
///
/// Nor can a guard be shared between threads:
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
///
/// assert_sync::<fibre_ambient::ScopeGuard<'static>>();
/// ```
#[must_use = "the override is revoked as soon as the guard is dropped"]
pub struct ScopeGuard<'r> {
  registry: &'r Registry,
  key: SlotKey,
  state: GuardState,
  _thread_bound: PhantomData<Rc<()>>,
}

impl<'r> ScopeGuard<'r> {
  pub(crate) fn claimed(registry: &'r Registry, key: SlotKey, shared_token: Option<u64>) -> Self {
    Self {
      registry,
      key,
      state: GuardState::Claimed { shared_token },
      _thread_bound: PhantomData,
    }
  }

  pub(crate) fn inert(registry: &'r Registry, key: SlotKey) -> Self {
    Self {
      registry,
      key,
      state: GuardState::Inert,
      _thread_bound: PhantomData,
    }
  }

  /// Whether this guard's install took effect.
  ///
  /// `false` means an enclosing scope already holds the slot and keeps
  /// resolving to its own factory.
  pub fn is_claimed(&self) -> bool {
    matches!(self.state, GuardState::Claimed { .. })
  }

  /// Whether this guard also published its factory to other threads.
  pub fn is_published(&self) -> bool {
    matches!(
      self.state,
      GuardState::Claimed {
        shared_token: Some(_)
      }
    )
  }

  /// Revokes the override now instead of at the end of the scope.
  pub fn release(mut self) {
    self.release_slot();
  }

  fn release_slot(&mut self) {
    let state = std::mem::replace(&mut self.state, GuardState::Released);
    if let GuardState::Claimed { shared_token } = state {
      if let Some(token) = shared_token {
        self.registry.shared_slots().release(self.key, token);
      }
      core::clear_local(self.registry.id(), self.key);
      debug!(registry = %self.registry.label(), key = ?self.key, "override released");
    }
  }
}

impl Drop for ScopeGuard<'_> {
  fn drop(&mut self) {
    self.release_slot();
  }
}

impl fmt::Debug for ScopeGuard<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ScopeGuard")
      .field("registry", &self.registry.label())
      .field("key", &self.key)
      .field("state", &self.state)
      .finish()
  }
}
