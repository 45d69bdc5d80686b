//! Owner-scoped overrides: a `(type, owner)` slot only applies to resolutions
//! made on behalf of that owner type.

use fibre_ambient::{resolve, Registry};

// --- Test Fixtures ---

trait Child {
  fn kind(&self) -> &'static str;
}

struct ChildBase;
impl Child for ChildBase {
  fn kind(&self) -> &'static str {
    "base"
  }
}

struct ChildA;
impl Child for ChildA {
  fn kind(&self) -> &'static str {
    "a"
  }
}

struct ChildB;
impl Child for ChildB {
  fn kind(&self) -> &'static str {
    "b"
  }
}

type AnyChild = Box<dyn Child>;

/// Resolves its children on its own behalf.
struct OwnerWithChild;

impl OwnerWithChild {
  fn new_child(&self, registry: &Registry) -> AnyChild {
    resolve!(from registry => AnyChild, self)
  }
}

struct OtherOwner;

impl OtherOwner {
  fn new_child(&self, registry: &Registry) -> AnyChild {
    resolve!(from registry => AnyChild, self)
  }
}

fn child_registry() -> Registry {
  let registry = Registry::new();
  registry.register_default::<AnyChild>(|| Box::new(ChildBase));
  registry
}

fn ownerless_kind(registry: &Registry) -> &'static str {
  registry.try_resolve::<AnyChild>().unwrap().kind()
}

// --- Owner Tests ---

#[test]
fn test_owner_override_applies_when_resolved_by_owner() {
  // Arrange
  let registry = child_registry();
  let owner = OwnerWithChild;

  // Act
  let _scope = registry.install_for::<AnyChild, OwnerWithChild>(|| Box::new(ChildA));

  // Assert
  assert_eq!(owner.new_child(&registry).kind(), "a");
}

#[test]
fn test_owner_override_does_not_apply_without_owner() {
  let registry = child_registry();
  let _scope = registry.install_for::<AnyChild, OwnerWithChild>(|| Box::new(ChildA));

  assert_eq!(ownerless_kind(&registry), "base");
  assert_eq!(
    registry
      .try_resolve_for::<AnyChild, OwnerWithChild>(None)
      .unwrap()
      .kind(),
    "base"
  );
}

#[test]
fn test_owner_override_does_not_apply_to_other_owner() {
  let registry = child_registry();
  let _scope = registry.install_for::<AnyChild, OwnerWithChild>(|| Box::new(ChildA));

  assert_eq!(OtherOwner.new_child(&registry).kind(), "base");
}

#[test]
fn test_owner_falls_back_to_global_override() {
  let registry = child_registry();
  let _scope = registry.install::<AnyChild>(|| Box::new(ChildB));

  assert_eq!(OwnerWithChild.new_child(&registry).kind(), "b");
  assert_eq!(OtherOwner.new_child(&registry).kind(), "b");
}

#[test]
fn test_owner_override_shadows_global_override_for_that_owner() {
  let registry = child_registry();
  let _global = registry.install::<AnyChild>(|| Box::new(ChildB));
  let owned = registry.install_for::<AnyChild, OwnerWithChild>(|| Box::new(ChildA));

  // Owner and global slots are independent, so both claims succeed.
  assert!(owned.is_claimed());
  assert_eq!(OwnerWithChild.new_child(&registry).kind(), "a");
  assert_eq!(OtherOwner.new_child(&registry).kind(), "b");
  assert_eq!(ownerless_kind(&registry), "b");
}

#[test]
fn test_distinct_owners_have_independent_slots() {
  let registry = child_registry();
  let _a = registry.install_for::<AnyChild, OwnerWithChild>(|| Box::new(ChildA));
  let b = registry.install_for::<AnyChild, OtherOwner>(|| Box::new(ChildB));

  assert!(b.is_claimed());
  assert_eq!(OwnerWithChild.new_child(&registry).kind(), "a");
  assert_eq!(OtherOwner.new_child(&registry).kind(), "b");
}

#[test]
fn test_nested_owner_install_keeps_outer_override() {
  let registry = child_registry();
  let owner = OwnerWithChild;

  let _outer = registry.install_for::<AnyChild, OwnerWithChild>(|| Box::new(ChildA));
  {
    let inner = registry.install_for::<AnyChild, OwnerWithChild>(|| Box::new(ChildB));
    assert!(!inner.is_claimed());
    assert_eq!(owner.new_child(&registry).kind(), "a");
  }
  assert_eq!(owner.new_child(&registry).kind(), "a");
}

#[test]
fn test_owner_override_released_with_guard() {
  let registry = child_registry();
  let owner = OwnerWithChild;

  {
    let _scope = registry.install_for::<AnyChild, OwnerWithChild>(|| Box::new(ChildA));
    assert_eq!(owner.new_child(&registry).kind(), "a");
  }

  assert_eq!(owner.new_child(&registry).kind(), "base");
}

#[test]
fn test_child_created_by_owner_keeps_its_state() {
  #[derive(Default)]
  struct Named {
    name: String,
  }
  struct Holder {
    child: Named,
  }

  let registry = Registry::new();
  let _scope = registry.install_for::<Named, Holder>(|| Named {
    name: "owned".to_string(),
  });

  let mut holder = Holder {
    child: Named::default(),
  };
  holder.child = registry.resolve_for::<Named, Holder>(Some(&holder));
  holder.child.name.push_str(" and renamed");

  assert_eq!(holder.child.name, "owned and renamed");
  assert_eq!(registry.resolve::<Named>().name, "");
}

#[test]
fn test_local_owner_override() {
  use std::rc::Rc;

  let registry = child_registry();
  let marker = Rc::new(());

  let kept = Rc::clone(&marker);
  let scope = registry.install_local_for::<AnyChild, OwnerWithChild>(move || {
    let _keep = &kept;
    Box::new(ChildA)
  });

  assert!(scope.is_claimed());
  assert_eq!(OwnerWithChild.new_child(&registry).kind(), "a");
  assert_eq!(Rc::strong_count(&marker), 2);

  drop(scope);
  assert_eq!(Rc::strong_count(&marker), 1);
}
