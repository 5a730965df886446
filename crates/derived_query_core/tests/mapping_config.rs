use derived_query_core::{
    DefaultSqlGenerator, DerivedQueryCompiler, MappingContext, MappingError, PropertyType,
    ScalarType,
};
use std::fs;

const MAPPING_JSON: &str = r#"{
  "entities": [
    {
      "name": "Auditable",
      "id": "createdBy",
      "properties": [{ "name": "createdBy", "type": "text" }]
    },
    {
      "name": "Person",
      "table": "people",
      "id": "personId",
      "extends": "Auditable",
      "properties": [
        { "name": "personId", "type": "integer", "column": "id" },
        { "name": "firstName", "type": "text" },
        { "name": "animal", "type": { "entity": "Animal" } }
      ]
    },
    {
      "name": "Animal",
      "id": "nickName",
      "properties": [{ "name": "nickName", "type": "text" }]
    }
  ]
}"#;

#[test]
fn loads_mapping_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.json");
    fs::write(&path, MAPPING_JSON).unwrap();

    let context = MappingContext::from_json_file(&path).unwrap();

    assert_eq!(
        context.entity_names().collect::<Vec<_>>(),
        vec!["Animal", "Auditable", "Person"]
    );
    assert_eq!(context.table_name("Person").as_deref(), Some("people"));
    assert_eq!(context.id_column("Person").as_deref(), Some("id"));
    assert!(context.is_assignable_from("Auditable", "Person"));

    let animal = context.property("Person", "animal").unwrap();
    assert_eq!(animal.ty(), &PropertyType::entity("Animal"));
    let created_by = context.property("Person", "createdBy").unwrap();
    assert_eq!(created_by.owning_type, "Auditable");
    assert_eq!(created_by.ty(), &PropertyType::Scalar(ScalarType::Text));
}

#[test]
fn inherited_properties_are_inside_the_aggregate() {
    let context = MappingContext::from_json_str(MAPPING_JSON).unwrap();
    let compiler = DerivedQueryCompiler::new(&context, DefaultSqlGenerator::new(&context));

    let compiled = compiler
        .compile("Person", "findByCreatedByAndFirstName")
        .unwrap();

    assert_eq!(compiled.identifiers().names(), vec!["createdBy", "firstName"]);
    assert!(compiled.sql().contains("FROM people LEFT OUTER JOIN animal AS animal"));
    assert!(compiled
        .sql()
        .ends_with("WHERE people.created_by = :createdBy AND people.first_name = :firstName"));
}

#[test]
fn rejects_invalid_documents() {
    let missing_child = r#"{ "entities": [
        { "name": "Person", "id": "personId", "properties": [
            { "name": "personId", "type": "integer" },
            { "name": "pet", "type": { "entity": "Animal" } }
        ] }
    ] }"#;
    assert!(matches!(
        MappingContext::from_json_str(missing_child),
        Err(MappingError::UnknownChildEntity { .. })
    ));

    assert!(matches!(
        MappingContext::from_json_str("{ \"entities\": ["),
        Err(MappingError::Json(_))
    ));

    let missing_file = tempfile::tempdir().unwrap().path().join("absent.json");
    assert!(matches!(
        MappingContext::from_json_file(&missing_file),
        Err(MappingError::Io { .. })
    ));
}
