use fibre_ambient::{install, register_default, resolve};

// --- Abstraction and Implementations ---
trait Mailer {
  fn send(&self, to: &str) -> String;
}

struct SmtpMailer;
impl Mailer for SmtpMailer {
  fn send(&self, to: &str) -> String {
    format!("SMTP delivery to {}", to)
  }
}

struct RecordingMailer;
impl Mailer for RecordingMailer {
  fn send(&self, to: &str) -> String {
    format!("recorded a message for {}", to)
  }
}

type AnyMailer = Box<dyn Mailer>;

// Business code that knows nothing about overrides.
fn send_welcome(to: &str) -> String {
  let mailer = resolve!(AnyMailer);
  mailer.send(to)
}

fn main() {
  register_default::<AnyMailer>(|| Box::new(SmtpMailer));

  println!("{}", send_welcome("ada@example.com"));

  {
    let _scope = install::<AnyMailer>(|| Box::new(RecordingMailer));
    // Everything called from here resolves to the recording mailer.
    let result = send_welcome("ada@example.com");
    println!("{}", result);
    assert_eq!(result, "recorded a message for ada@example.com");
  }

  // The guard is gone, so production behaviour is back.
  assert_eq!(send_welcome("ada@example.com"), "SMTP delivery to ada@example.com");
}
