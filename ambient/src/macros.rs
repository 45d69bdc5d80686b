//! Public macros for ergonomic resolution.

/// Resolves a type from the global registry, or from an explicit one.
///
/// Uses the same chain as [`Registry::try_resolve`](crate::Registry::try_resolve):
/// the active override, then the registered default factory.
///
/// # Panics
///
/// Panics if neither an override nor a default factory exists for the type.
/// For a non-panicking version, use [`try_resolve!`](crate::try_resolve).
///
/// # Examples
///
/// ```
/// use fibre_ambient::{global, resolve};
///
/// struct Endpoint(&'static str);
///
/// global().register_default(|| Endpoint("https://api.example.com"));
///
/// struct Client;
/// impl Client {
///   fn endpoint(&self) -> Endpoint {
///     // Resolve on behalf of `Client`, so `Client`-scoped overrides apply.
///     resolve!(Endpoint, self)
///   }
/// }
///
/// let _scope = global().install_for::<Endpoint, Client>(|| Endpoint("http://localhost:8080"));
/// assert_eq!(Client.endpoint().0, "http://localhost:8080");
/// assert_eq!(resolve!(Endpoint).0, "https://api.example.com");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for an explicit registry: resolve!(from registry => MyType)
    (from $registry:expr => $type:ty) => {
        $crate::try_resolve!(from $registry => $type).unwrap_or_else(|err| {
            panic!("Failed to resolve required type: {}", err)
        })
    };

    // Arm for an explicit registry and owner: resolve!(from registry => MyType, owner)
    (from $registry:expr => $type:ty, $owner:expr) => {
        $crate::try_resolve!(from $registry => $type, $owner).unwrap_or_else(|err| {
            panic!("Failed to resolve required type: {}", err)
        })
    };

    // Arm for the global registry: resolve!(MyType)
    ($type:ty) => {
        $crate::resolve!(from $crate::global() => $type)
    };

    // Arm for the global registry with an owner: resolve!(MyType, owner)
    ($type:ty, $owner:expr) => {
        $crate::resolve!(from $crate::global() => $type, $owner)
    };
}

/// Like [`resolve!`](crate::resolve), but returns a
/// [`Result`](crate::Result) instead of panicking.
///
/// ```
/// use fibre_ambient::{try_resolve, Error, Registry};
///
/// struct Unregistered;
///
/// let registry = Registry::new();
/// let result = try_resolve!(from registry => Unregistered);
/// assert!(matches!(result, Err(Error::Construction { .. })));
/// ```
#[macro_export]
macro_rules! try_resolve {
    (from $registry:expr => $type:ty) => {
        $registry.try_resolve::<$type>()
    };

    (from $registry:expr => $type:ty, $owner:expr) => {
        $registry.try_resolve_for::<$type, _>(::core::option::Option::Some($owner))
    };

    ($type:ty) => {
        $crate::try_resolve!(from $crate::global() => $type)
    };

    ($type:ty, $owner:expr) => {
        $crate::try_resolve!(from $crate::global() => $type, $owner)
    };
}
