//! End-to-end usage of the public API against an in-memory address bar.

use std::{
  cell::Cell,
  rc::Rc,
};

use the_query::{
  HistoryManager,
  HistoryPush,
  Location,
  MemoryLocation,
  ParamStore,
  QueryError,
  ValidationRule,
  ValidationRules,
  validate_params,
};

fn setup() -> (ParamStore, MemoryLocation) {
  let location = MemoryLocation::new("/");
  (ParamStore::new(location.clone()), location)
}

#[test]
fn set_and_remove_a_parameter() {
  let (store, location) = setup();
  store.update("name", "john").unwrap();
  assert_eq!(location.search(), "?name=john");
  assert_eq!(store.param_string(), "name=john");

  store.update("name", None::<String>).unwrap();
  assert_eq!(location.search(), "");
}

#[test]
fn invalid_key_is_rejected_without_mutation() {
  let (store, location) = setup();
  store.update("keep", "1").unwrap();
  let before = store.params();

  assert_eq!(store.update("", "x"), Err(QueryError::InvalidKey));
  assert_eq!(store.params(), before);
  assert_eq!(location.search(), "?keep=1");
}

#[test]
fn arrays_and_typed_reads() {
  let (store, _location) = setup();
  store.update("tags", vec!["one", "two", "three"]).unwrap();
  assert_eq!(store.get_array("tags"), vec!["one", "two", "three"]);

  assert_eq!(store.get_typed("age", 0), 0);
  store.update("age", "25").unwrap();
  assert_eq!(store.get_typed("age", 0), 25);
}

#[test]
fn transaction_commits_with_one_write() {
  let (store, location) = setup();
  let writes = Rc::new(Cell::new(0));
  {
    let writes = writes.clone();
    store.subscribe(move |_, _| {
      writes.set(writes.get() + 1);
      Ok(())
    });
  }

  store
    .transaction()
    .update("a", "1")
    .and_then(|tx| tx.update("b", "2"))
    .and_then(|tx| tx.commit())
    .unwrap();

  let search = location.search();
  assert!(search.contains("a=1"));
  assert!(search.contains("b=2"));
  assert_eq!(writes.get(), 1);
  assert_eq!(location.replace_count(), 1);
}

#[test]
fn preset_restores_alongside_other_params() {
  let (store, _location) = setup();
  store.save_preset("p", [("x", "1")]);

  store.update("x", "5").unwrap();
  store.update("other", "kept").unwrap();
  store.clear(["x"]).unwrap();

  assert!(store.apply_preset("p").unwrap());
  assert_eq!(store.get("x").as_deref(), Some("1"));
  assert_eq!(store.get("other").as_deref(), Some("kept"));
}

#[test]
fn history_push_back_and_native_navigation() {
  let (store, location) = setup();
  let mut history = HistoryManager::new(&store);

  store.update("view", "list").unwrap();
  history.push(HistoryPush::new());
  store.update("view", "grid").unwrap();
  history.push(HistoryPush::new().with_title("Grid"));
  assert_eq!(history.len(), 2);
  assert_eq!(location.push_count(), 2);

  assert!(history.back());
  assert_eq!(store.get("view").as_deref(), Some("list"));
  assert!(history.forward());
  assert_eq!(store.get("view").as_deref(), Some("grid"));

  location.go_back();
  let state = location.go_back();
  history.handle_navigation(state.as_ref());
  assert_eq!(store.get("view").as_deref(), Some("list"));
  assert_eq!(location.index(), 0);
}

#[test]
fn rules_are_checked_in_order() {
  let (store, _location) = setup();
  store.update("sort", "sideways").unwrap();

  let mut rules = ValidationRules::new();
  rules.insert("page".into(), ValidationRule::new().min_length(1));
  rules.insert(
    "sort".into(),
    ValidationRule::new().required().one_of(["asc", "desc"]),
  );

  assert!(matches!(
    validate_params(&store.params(), &rules),
    Err(QueryError::NotInEnum { ref key, .. }) if key == "sort"
  ));
}
