use fibre_ambient::Registry;
use std::thread;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
struct Region(String);

impl Default for Region {
  fn default() -> Self {
    Region("us-east-1".to_string())
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .init();

  let registry = Registry::builder().name("app").build();

  // Designate this thread before installing the process-wide overrides.
  registry.initialize_outer_thread();
  let _region = registry.install(|| Region("eu-west-2".to_string()));

  thread::scope(|s| {
    // Inherits the outer thread's override.
    s.spawn(|| {
      let region = registry.resolve::<Region>();
      println!("worker 1 resolved {:?}", region);
      assert_eq!(region, Region("eu-west-2".to_string()));
    });

    // Shadows it with an override of its own.
    s.spawn(|| {
      let _local = registry.install(|| Region("ap-south-1".to_string()));
      let region = registry.resolve::<Region>();
      println!("worker 2 resolved {:?}", region);
      assert_eq!(region, Region("ap-south-1".to_string()));
    });
  });
}
