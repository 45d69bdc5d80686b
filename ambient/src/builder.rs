use crate::registry::Registry;

/// A builder for configuring a [`Registry`].
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
  pub(crate) name: Option<String>,
  pub(crate) thread_inheritance: bool,
}

impl Default for RegistryBuilder {
  fn default() -> Self {
    Self {
      name: None,
      thread_inheritance: true,
    }
  }
}

impl RegistryBuilder {
  /// Creates a builder with the default configuration.
  pub fn new() -> Self {
    Self::default()
  }

  /// Labels the registry in log output.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Enables or disables inheritance of the outer thread's overrides.
  ///
  /// Enabled by default. When disabled, `initialize_outer_thread` has no
  /// effect and every override stays strictly local to its thread.
  pub fn thread_inheritance(mut self, enabled: bool) -> Self {
    self.thread_inheritance = enabled;
    self
  }

  /// Builds the `Registry`.
  pub fn build(self) -> Registry {
    Registry::from_builder(self)
  }
}
