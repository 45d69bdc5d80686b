//! # Fibre Ambient
//!
//! Scoped, thread-local type overrides: an ambient context for "which factory
//! produces a `T` right now".
//!
//! Code deep inside a call graph asks the registry for a `T` without knowing
//! who, if anyone, has overridden it. A caller further up installs an
//! override for the length of a scope; everything that runs inside that scope
//! on the same thread resolves to the override, and when the scope's guard is
//! dropped the type resolves as if the override had never existed.
//!
//! ## Core Concepts
//!
//! - **Registry**: holds one override slot per type, and per `(type, owner)`
//!   pair, on every thread. A process-wide instance is available via `global()`.
//! - **ScopeGuard**: returned by every install. Dropping it revokes the
//!   override it installed, and only that one.
//! - **First claim wins**: installing over an occupied slot is a silent no-op.
//!   The outermost override stays in effect until its guard is dropped. Use
//!   [`ScopeGuard::is_claimed`] to see whether an install took effect.
//! - **Owners**: an override can be limited to resolutions made on behalf of
//!   an owner type, leaving ownerless resolutions untouched.
//! - **Outer thread**: one thread may be designated with
//!   `initialize_outer_thread()`. Its overrides become a fallback for other
//!   threads whose own slots are empty.
//! - **Defaults**: without an override, `resolve` falls back to a registered
//!   default factory and then to `Default::default()`. `try_resolve` works for
//!   any type and reports [`Error::Construction`] when nothing can produce it.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_ambient::Registry;
//!
//! trait Shape {
//!     fn name(&self) -> &'static str;
//! }
//!
//! struct Plain;
//! impl Shape for Plain {
//!     fn name(&self) -> &'static str { "plain" }
//! }
//!
//! struct Circle;
//! impl Shape for Circle {
//!     fn name(&self) -> &'static str { "circle" }
//! }
//!
//! struct Square;
//! impl Shape for Square {
//!     fn name(&self) -> &'static str { "square" }
//! }
//!
//! let registry = Registry::new();
//! registry.register_default::<Box<dyn Shape>>(|| Box::new(Plain));
//!
//! {
//!     let _circle = registry.install::<Box<dyn Shape>>(|| Box::new(Circle));
//!     assert_eq!(registry.try_resolve::<Box<dyn Shape>>().unwrap().name(), "circle");
//!
//!     // The slot is already claimed, so this install has no effect.
//!     let square = registry.install::<Box<dyn Shape>>(|| Box::new(Square));
//!     assert!(!square.is_claimed());
//!     assert_eq!(registry.try_resolve::<Box<dyn Shape>>().unwrap().name(), "circle");
//! }
//!
//! assert_eq!(registry.try_resolve::<Box<dyn Shape>>().unwrap().name(), "plain");
//! ```

mod builder;
mod core;
mod error;
mod global;
mod guard;
mod macros;
mod registry;

pub use builder::RegistryBuilder;
pub use error::{Error, Result};
pub use global::{
  global, initialize_outer_thread, install, install_for, install_local, install_local_for,
  register_default, resolve, resolve_for, try_resolve, try_resolve_for,
};
pub use guard::ScopeGuard;
pub use registry::Registry;
