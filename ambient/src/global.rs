//! The global registry instance and access functions.

use crate::error::Result;
use crate::guard::ScopeGuard;
use crate::registry::Registry;
use once_cell::sync::Lazy;

// The process-wide registry. Created on first access, lives until exit.
static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(|| Registry::builder().name("global").build());

/// Provides a reference to the global registry instance.
///
/// # Examples
///
/// ```
/// use fibre_ambient::global;
///
/// #[derive(Default)]
/// struct Clock { frozen_at: Option<u64> }
///
/// let _scope = global().install(|| Clock { frozen_at: Some(1_700_000_000) });
/// assert_eq!(global().resolve::<Clock>().frozen_at, Some(1_700_000_000));
/// ```
pub fn global() -> &'static Registry {
  &GLOBAL_REGISTRY
}

/// Designates the calling thread as the global registry's outer thread.
pub fn initialize_outer_thread() -> bool {
  global().initialize_outer_thread()
}

/// Installs an override for `T` in the global registry.
pub fn install<T: 'static>(factory: impl Fn() -> T + Send + Sync + 'static) -> ScopeGuard<'static> {
  global().install(factory)
}

/// Installs an owner-scoped override for `T` in the global registry.
pub fn install_for<T: 'static, O: ?Sized + 'static>(
  factory: impl Fn() -> T + Send + Sync + 'static,
) -> ScopeGuard<'static> {
  global().install_for::<T, O>(factory)
}

/// Installs a thread-bound override for `T` in the global registry.
pub fn install_local<T: 'static>(factory: impl Fn() -> T + 'static) -> ScopeGuard<'static> {
  global().install_local(factory)
}

/// Installs a thread-bound, owner-scoped override for `T` in the global registry.
pub fn install_local_for<T: 'static, O: ?Sized + 'static>(
  factory: impl Fn() -> T + 'static,
) -> ScopeGuard<'static> {
  global().install_local_for::<T, O>(factory)
}

/// Registers the global default factory for `T`.
pub fn register_default<T: 'static>(factory: impl Fn() -> T + Send + Sync + 'static) {
  global().register_default(factory)
}

/// Resolves `T` from the global registry, failing without a default factory.
pub fn try_resolve<T: 'static>() -> Result<T> {
  global().try_resolve::<T>()
}

/// Resolves `T` on behalf of `owner` from the global registry.
pub fn try_resolve_for<T: 'static, O: ?Sized + 'static>(owner: Option<&O>) -> Result<T> {
  global().try_resolve_for::<T, O>(owner)
}

/// Resolves `T` from the global registry, falling back to `T::default()`.
pub fn resolve<T: Default + 'static>() -> T {
  global().resolve::<T>()
}

/// Resolves `T` on behalf of `owner`, falling back to `T::default()`.
pub fn resolve_for<T: Default + 'static, O: ?Sized + 'static>(owner: Option<&O>) -> T {
  global().resolve_for::<T, O>(owner)
}
