//! End-to-end archive round trips through real files

use fxsd::{Archive, FieldMut, FieldRef, FxsdError, Record, hash_name};

#[derive(Default, Debug, PartialEq)]
struct NestedState {
    a: i32,
    b: i32,
}

impl Record for NestedState {
    fn type_name(&self) -> &'static str {
        "roundtrip::NestedState"
    }
    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![FieldRef::I32(&self.a), FieldRef::I32(&self.b)]
    }
    fn fields_mut(&mut self) -> Vec<FieldMut<'_>> {
        vec![FieldMut::I32(&mut self.a), FieldMut::I32(&mut self.b)]
    }
}

#[derive(Default, Debug, PartialEq)]
struct GameState {
    x: i32,
    y: i32,
    z: f32,
    nested: NestedState,
    greeting: String,
    paused: bool,
}

impl Record for GameState {
    fn type_name(&self) -> &'static str {
        "roundtrip::GameState"
    }
    fn fields(&self) -> Vec<FieldRef<'_>> {
        vec![
            FieldRef::I32(&self.x),
            FieldRef::I32(&self.y),
            FieldRef::F32(&self.z),
            FieldRef::Nested(&self.nested),
            FieldRef::Text(&self.greeting),
            FieldRef::Bool(&self.paused),
        ]
    }
    fn fields_mut(&mut self) -> Vec<FieldMut<'_>> {
        vec![
            FieldMut::I32(&mut self.x),
            FieldMut::I32(&mut self.y),
            FieldMut::F32(&mut self.z),
            FieldMut::Nested(&mut self.nested),
            FieldMut::Text(&mut self.greeting),
            FieldMut::Bool(&mut self.paused),
        ]
    }
}

fn example_state() -> GameState {
    GameState {
        x: 30,
        y: 15,
        z: 3.0,
        nested: NestedState { a: 5, b: 10 },
        greeting: "Hello, World".to_string(),
        paused: true,
    }
}

#[test]
fn roundtrip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.fxsd");

    let mut writer = Archive::new();
    writer
        .write_record(&example_state(), hash_name("Example"))
        .unwrap();
    writer.persist(&path).unwrap();

    let mut reader = Archive::new();
    reader.load(&path).unwrap();

    let mut state = GameState::default();
    reader.read_record(&mut state, hash_name("Example")).unwrap();

    assert_eq!(state.x, 30);
    assert_eq!(state.y, 15);
    assert_eq!(state.z, 3.0);
    assert_eq!(state.nested.a, 5);
    assert_eq!(state.nested.b, 10);
    assert_eq!(state.greeting, "Hello, World");
    assert!(state.paused);
}

#[test]
fn wrong_name_hash_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.fxsd");

    let mut writer = Archive::new();
    writer
        .write_record(&example_state(), hash_name("Example"))
        .unwrap();
    writer.persist(&path).unwrap();

    let mut reader = Archive::new();
    reader.load(&path).unwrap();

    let mut state = GameState::default();
    let result = reader.read_record(&mut state, hash_name("SomethingElse"));
    assert!(matches!(result, Err(FxsdError::NameMismatch { .. })));
    assert_eq!(state, GameState::default());
}

#[test]
fn rejected_read_can_be_retried_in_place() {
    let mut archive = Archive::new();
    archive
        .write_record(&example_state(), hash_name("Example"))
        .unwrap();

    let mut state = GameState::default();
    let result = archive.read_record(&mut state, hash_name("WrongName"));
    assert!(matches!(result, Err(FxsdError::NameMismatch { .. })));

    // No rewind: the rejected frame is still at the cursor
    archive.read_record(&mut state, hash_name("Example")).unwrap();
    assert_eq!(state, example_state());
}

#[test]
fn zero_hash_reads_any_record() {
    let mut archive = Archive::new();
    archive
        .write_record(&example_state(), hash_name("Example"))
        .unwrap();

    let mut state = GameState::default();
    archive.read_record(&mut state, 0).unwrap();
    assert_eq!(state, example_state());
}

#[test]
fn multiple_records_read_in_sequence() {
    let mut archive = Archive::new();
    archive.write_record(&example_state(), hash_name("First")).unwrap();

    let second = GameState {
        x: -1,
        y: 99,
        z: -0.125,
        nested: NestedState { a: 7, b: 8 },
        greeting: String::new(),
        paused: false,
    };
    archive.write_record(&second, hash_name("Second")).unwrap();

    let mut a = GameState::default();
    let mut b = GameState::default();
    archive.read_record(&mut a, hash_name("First")).unwrap();
    archive.read_record(&mut b, hash_name("Second")).unwrap();

    assert_eq!(a, example_state());
    assert_eq!(b, second);
}

#[test]
fn schema_dedup_across_records() {
    let mut archive = Archive::new();
    archive.write_record(&example_state(), 0).unwrap();
    let schema_len = archive.schema().len();

    for _ in 0..10 {
        archive.write_record(&example_state(), 0).unwrap();
    }
    assert_eq!(archive.schema().len(), schema_len);
}

#[test]
fn schema_tree_matches_written_shape() {
    let mut archive = Archive::new();
    archive.write_record(&example_state(), 0).unwrap();

    let root_id = fxsd::TypeId::derive("roundtrip::GameState");
    let tree = archive.schema().read_schema_tree_for(root_id).unwrap();
    let root = tree.root();

    assert_eq!(root.type_id, root_id);
    assert_eq!(root.children.len(), 6);

    // Fourth member is the nested aggregate
    let nested = tree.node(root.children[3]).unwrap();
    assert_eq!(nested.type_id, fxsd::TypeId::derive("roundtrip::NestedState"));
    assert_eq!(nested.byte_size, 8);
    assert_eq!(nested.children.len(), 2);
}

#[test]
fn tiny_archive_rejects_large_record() {
    let mut archive = Archive::with_capacity(8);
    let result = archive.write_record(&example_state(), 0);
    assert!(matches!(result, Err(FxsdError::CapacityExceeded { .. })));
}

#[test]
fn rewind_allows_rereading() {
    let mut archive = Archive::new();
    archive.write_record(&example_state(), 0).unwrap();

    let mut first = GameState::default();
    archive.read_record(&mut first, 0).unwrap();

    archive.rewind();
    let mut second = GameState::default();
    archive.read_record(&mut second, 0).unwrap();
    assert_eq!(first, second);
}
