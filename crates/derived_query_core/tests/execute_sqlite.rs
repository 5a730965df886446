use derived_query_core::{
    DefaultSqlGenerator, DerivedQueryCompiler, DerivedQueryRegistry, EntityType, ExecError,
    MappingContext, PropertyType, QueryMethod, QueryOutcome, ScalarType,
    SqliteStatementExecutor,
};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Person {
    id: i64,
    first_name: String,
    last_name: String,
    pet: Option<String>,
}

fn person_mapping() -> MappingContext {
    MappingContext::from_entities(vec![
        EntityType::new("Person", "personId")
            .with_property("personId", ScalarType::Integer)
            .with_property("firstName", ScalarType::Text)
            .with_property("lastName", ScalarType::Text)
            .with_property("animal", PropertyType::entity("Animal")),
        EntityType::new("Animal", "personId")
            .with_property("personId", ScalarType::Integer)
            .with_property("nickName", ScalarType::Text),
    ])
    .unwrap()
}

fn seeded_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE person (
            person_id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL
         );
         CREATE TABLE animal (
            person_id INTEGER,
            nick_name TEXT,
            person INTEGER REFERENCES person(person_id)
         );
         INSERT INTO person VALUES (1, 'Franz', 'Lang'), (2, 'Anna', 'Lang'), (3, 'Franz', 'Berg');
         INSERT INTO animal VALUES (1, 'Rex', 1);",
    )
    .unwrap();
    conn
}

fn map_person(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get("person_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        pet: row.get("animal_nick_name")?,
    })
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

#[test]
fn collection_method_returns_matching_rows_with_child_columns() {
    let context = person_mapping();
    let conn = seeded_connection();
    let executor = SqliteStatementExecutor::new(&conn);
    let mut registry = DerivedQueryRegistry::new(DerivedQueryCompiler::new(
        &context,
        DefaultSqlGenerator::new(&context),
    ));
    let query = registry
        .register(&QueryMethod::collection("findByFirstName", "Person"))
        .unwrap();

    let mut people = query
        .execute(&executor, &[text("Franz")], &map_person)
        .unwrap()
        .into_vec();
    people.sort_by_key(|person| person.id);

    assert_eq!(
        people,
        vec![
            Person {
                id: 1,
                first_name: "Franz".to_string(),
                last_name: "Lang".to_string(),
                pet: Some("Rex".to_string()),
            },
            Person {
                id: 3,
                first_name: "Franz".to_string(),
                last_name: "Berg".to_string(),
                pet: None,
            },
        ]
    );
}

#[test]
fn single_method_returns_one_none_or_non_unique() {
    let context = person_mapping();
    let conn = seeded_connection();
    let executor = SqliteStatementExecutor::new(&conn);
    let mut registry = DerivedQueryRegistry::new(DerivedQueryCompiler::new(
        &context,
        DefaultSqlGenerator::new(&context),
    ));
    registry
        .register(&QueryMethod::single("findByFirstNameAndLastName", "Person"))
        .unwrap();
    registry
        .register(&QueryMethod::single("getByLastName", "Person"))
        .unwrap();

    let by_name = registry.get("findByFirstNameAndLastName").unwrap();
    let found = by_name
        .execute(&executor, &[text("Anna"), text("Lang")], &map_person)
        .unwrap();
    assert!(matches!(found, QueryOutcome::Single(Some(ref person)) if person.id == 2));

    let missing = by_name
        .execute(&executor, &[text("Anna"), text("Berg")], &map_person)
        .unwrap();
    assert_eq!(missing, QueryOutcome::Single(None));

    let err = registry
        .get("getByLastName")
        .unwrap()
        .execute(&executor, &[text("Lang")], &map_person)
        .unwrap_err();
    assert!(matches!(err, ExecError::NonUniqueResult { count: 2, .. }));
}

#[test]
fn count_and_exists_shape_their_outcomes() {
    let context = person_mapping();
    let conn = seeded_connection();
    let executor = SqliteStatementExecutor::new(&conn);
    let compiler = DerivedQueryCompiler::new(&context, DefaultSqlGenerator::new(&context));
    let mut registry = DerivedQueryRegistry::new(compiler);
    let methods = vec![
        QueryMethod::single("countByLastName", "Person"),
        QueryMethod::single("existsByFirstName", "Person"),
    ];
    for (name, result) in registry.register_all(&methods) {
        assert!(result.is_ok(), "{name} should register");
    }

    let count = registry
        .get("countByLastName")
        .unwrap()
        .execute(&executor, &[text("ignored")], &map_person)
        .unwrap();
    assert_eq!(count, QueryOutcome::Count(3));

    let exists = registry.get("existsByFirstName").unwrap();
    assert_eq!(
        exists
            .execute(&executor, &[text("Franz")], &map_person)
            .unwrap(),
        QueryOutcome::Exists(true)
    );
    assert_eq!(
        exists
            .execute(&executor, &[text("Nobody")], &map_person)
            .unwrap(),
        QueryOutcome::Exists(false)
    );
}

#[test]
fn wrong_argument_count_fails_before_touching_the_database() {
    let context = person_mapping();
    let conn = Connection::open_in_memory().unwrap();
    let executor = SqliteStatementExecutor::new(&conn);
    let compiler = DerivedQueryCompiler::new(&context, DefaultSqlGenerator::new(&context));
    let mut registry = DerivedQueryRegistry::new(compiler);
    let query = registry
        .register(&QueryMethod::collection("findByFirstNameAndLastName", "Person"))
        .unwrap();

    let err = query
        .execute(&executor, &[text("Franz")], &map_person)
        .unwrap_err();

    assert!(matches!(
        err,
        ExecError::ArgumentCountMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn compiled_queries_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<derived_query_core::CompiledQuery>();
    assert_send_sync::<derived_query_core::DerivedQuery>();
}
