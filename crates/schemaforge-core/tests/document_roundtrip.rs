use schemaforge_core::{
    AttributeSpec, AttributeType, Error, LoadOptions, OnInconsistency, SchemaDocument, SchemaGraph,
    TableLayout,
};

fn sample_graph() -> SchemaGraph {
    let mut graph = SchemaGraph::new();
    graph.set_database_name("shop");

    let users = graph.add_table("Users").expect("add Users");
    let users_id = graph
        .add_attribute(
            users,
            AttributeSpec::new("id", AttributeType::Integer)
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .expect("add Users.id");
    graph
        .add_attribute(
            users,
            AttributeSpec::new("email", AttributeType::Varchar).length(255).unique(),
        )
        .expect("add Users.email");
    graph
        .set_table_layout(
            users,
            TableLayout {
                position_x: Some(20.0),
                position_y: Some(70.0),
                color: Some("red".to_string()),
            },
        )
        .expect("set layout");

    let posts = graph.add_table("Posts").expect("add Posts");
    graph
        .add_attribute(posts, AttributeSpec::new("id", AttributeType::Integer).primary_key())
        .expect("add Posts.id");
    graph
        .add_attribute(
            posts,
            AttributeSpec::new("size", AttributeType::Enum)
                .values(["small", "medium", "large"])
                .default_value("small"),
        )
        .expect("add Posts.size");
    graph
        .add_attribute(
            posts,
            AttributeSpec::new("authorId", AttributeType::Integer).references(users, users_id),
        )
        .expect("add Posts.authorId");

    graph
}

#[test]
fn round_trips_through_the_document_form() {
    let graph = sample_graph();
    let document = SchemaDocument::from_graph(&graph);

    let json = serde_json::to_string_pretty(&document).expect("serialize document");
    let reparsed: SchemaDocument = serde_json::from_str(&json).expect("reparse document");
    let reloaded = reparsed
        .into_graph(LoadOptions::default())
        .expect("reload graph");

    assert_eq!(SchemaDocument::from_graph(&reloaded), document);
}

#[test]
fn document_uses_the_editor_wire_shape() {
    let graph = sample_graph();
    let value = serde_json::to_value(SchemaDocument::from_graph(&graph)).expect("to value");

    assert_eq!(value["databaseName"], "shop");
    assert_eq!(value["tables"][0]["name"], "Users");
    assert_eq!(value["tables"][0]["positionX"], 20.0);
    assert_eq!(value["tables"][0]["color"], "red");

    let email = &value["tables"][0]["attributes"][2];
    assert_eq!(email["type"], "VARCHAR");
    assert_eq!(email["length"], "255");
    assert_eq!(email["constraints"]["unique"], true);

    let size = &value["tables"][1]["attributes"][2];
    assert_eq!(size["values"], "small,medium,large");
    assert_eq!(size["defaultValue"], "small");

    let author = &value["tables"][1]["attributes"][3];
    assert_eq!(author["constraints"]["foreignKey"]["table"], "Users");
    assert_eq!(author["constraints"]["foreignKey"]["attribute"], "id");

    assert_eq!(value["connections"][0]["source"], "Posts-authorId");
    assert_eq!(value["connections"][0]["target"], "Users-id");
}

#[test]
fn loads_documents_written_by_the_editor() {
    let raw = r#"{
      "databaseName": "blog",
      "tables": [
        {
          "id": 1,
          "name": "Users",
          "color": "green",
          "positionX": 20,
          "positionY": 70,
          "attributes": [
            {
              "name": "createdAt", "type": "TIMESTAMP",
              "length": "", "defaultValue": "", "values": "",
              "constraints": {
                "notNull": false, "unique": false,
                "primaryKey": false, "autoIncrement": true
              }
            },
            {
              "name": "id", "type": "INTEGER",
              "length": "", "defaultValue": "", "values": "",
              "constraints": {
                "notNull": true, "unique": false,
                "primaryKey": true, "autoIncrement": true
              }
            }
          ]
        },
        {
          "id": 2,
          "name": "Posts",
          "attributes": [
            {
              "name": "id", "type": "INTEGER",
              "length": "", "defaultValue": "", "values": "",
              "constraints": {
                "notNull": true, "unique": false,
                "primaryKey": true, "autoIncrement": true
              }
            },
            {
              "name": "authorId", "type": "INTEGER",
              "length": "", "defaultValue": "", "values": "",
              "constraints": {
                "notNull": false, "unique": false,
                "primaryKey": false, "autoIncrement": false,
                "foreignKey": { "table": "Users", "attribute": "id" }
              }
            }
          ]
        }
      ],
      "connections": [
        { "source": "Posts-authorId", "target": "Users-id" }
      ]
    }"#;

    let document: SchemaDocument = serde_json::from_str(raw).expect("parse document");
    let graph = document
        .into_graph(LoadOptions::default())
        .expect("load graph");

    assert_eq!(graph.database_name(), "blog");
    assert_eq!(graph.tables().len(), 2);
    assert_eq!(graph.connections().len(), 1);
    let users = graph.table_by_name("Users").expect("Users");
    assert_eq!(users.layout.color.as_deref(), Some("green"));
}

#[test]
fn rejects_a_connection_list_that_does_not_mirror_foreign_keys() {
    let mut document = SchemaDocument::from_graph(&sample_graph());
    document.connections.clear();

    let err = document
        .clone()
        .into_graph(LoadOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::MalformedDocument(_)));

    // Repair recomputes connections from the constraints instead.
    let graph = document
        .into_graph(LoadOptions {
            on_inconsistency: OnInconsistency::Repair,
        })
        .expect("repair load");
    assert_eq!(graph.connections().len(), 1);
}

#[test]
fn rejects_dangling_foreign_keys_and_repairs_them_on_request() {
    let mut document = SchemaDocument::from_graph(&sample_graph());
    // Point the FK at a table that does not exist.
    document.tables[1].attributes[3]
        .constraints
        .foreign_key
        .as_mut()
        .expect("foreign key")
        .table = "Ghosts".to_string();

    let err = document
        .clone()
        .into_graph(LoadOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidForeignKey(_)));

    let graph = document
        .into_graph(LoadOptions {
            on_inconsistency: OnInconsistency::Repair,
        })
        .expect("repair load");
    assert!(graph.connections().is_empty());
    let author = graph
        .table_by_name("Posts")
        .and_then(|table| table.attribute_by_name("authorId"))
        .expect("authorId");
    assert!(author.constraints.foreign_key.is_none());
}

#[test]
fn rejects_types_outside_the_closed_enumeration() {
    let mut document = SchemaDocument::from_graph(&sample_graph());
    document.tables[0].attributes[1].attribute_type = "JSONB".to_string();

    let err = document.into_graph(LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedType(_)));
}

#[test]
fn rejects_non_numeric_lengths() {
    let mut document = SchemaDocument::from_graph(&sample_graph());
    document.tables[0].attributes[2].length = "lots".to_string();

    let err = document.into_graph(LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MalformedDocument(_)));
}
