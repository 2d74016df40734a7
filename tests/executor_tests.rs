use procbind::memory::CallMode;
use procbind::{
    ConnectionConfig, Database, DbEntity, DbError, HydrationReport, InMemoryConnector,
    MapTokenSource, Parameter,
    QueryResult, Value, params,
};

#[derive(Debug, Default, Clone, PartialEq, DbEntity)]
#[db_info(save = "dbo.UserSave", return_id = "UserID")]
struct User {
    #[db_field("UserID", save = false, key)]
    id: i64,
    #[db_field("UserName")]
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq, DbEntity)]
struct Tag {
    #[db_field("TagName")]
    label: String,
}

#[derive(Debug, Default, Clone, PartialEq, DbEntity)]
#[db_info(save = "dbo.NoteSave", delete = "dbo.NoteDelete", return_id = "NoteID")]
struct Note {
    #[db_field("NoteID", save = false)]
    id: i64,
    #[db_field("Body")]
    body: String,
}

#[derive(Debug, Default, Clone, PartialEq, DbEntity)]
#[db_info(save = "dbo.DupSave", return_id = "Code")]
struct Duplicated {
    #[db_field("Code", save = false)]
    first: i64,
    #[db_field("Code", save = false)]
    second: i64,
    #[db_field("Label")]
    label: String,
}

#[derive(Debug, Default, Clone, PartialEq, DbEntity)]
#[db_info(save = "")]
struct Draft {
    #[db_field("Text")]
    text: String,
}

const CONN: &str = "APP_DB";

fn database(connector: InMemoryConnector) -> Database<InMemoryConnector, MapTokenSource> {
    Database::with_config(
        connector,
        MapTokenSource::new().with(CONN, "Server=mem;Database=app"),
        ConnectionConfig::new(),
    )
    .unwrap()
}

fn user_rows() -> QueryResult {
    QueryResult::new(
        vec!["UserID".into(), "UserName".into(), "LastLogin".into()],
        vec![
            vec![Value::Integer(1), Value::from("Ann"), Value::Null],
            vec![Value::Integer(2), Value::Null, Value::Null],
            vec![Value::Integer(3), Value::from("Cy"), Value::Null],
        ],
    )
}

#[tokio::test]
async fn scenario_save_assigns_returned_id() {
    let connector = InMemoryConnector::new().with_scalar("dbo.UserSave", 42i64);
    let db = database(connector.clone());
    let mut user = User {
        name: "Ann".into(),
        ..Default::default()
    };

    db.save(&mut user, CONN).await.unwrap();

    assert_eq!(user.id, 42);
    let calls = connector.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].procedure, "dbo.UserSave");
    assert_eq!(calls[0].mode, CallMode::Scalar);
    assert_eq!(calls[0].params, vec![Parameter::new("UserName", "Ann")]);
    assert_eq!(calls[0].connection_string, "Server=mem;Database=app");
    assert_eq!(connector.open_connections().await, 0);
}

#[tokio::test]
async fn save_coerces_textual_scalar_into_id() {
    let connector = InMemoryConnector::new().with_scalar("dbo.UserSave", "77");
    let db = database(connector);
    let mut user = User::default();

    db.save(&mut user, CONN).await.unwrap();

    assert_eq!(user.id, 77);
}

#[tokio::test]
async fn save_with_null_scalar_leaves_id_alone() {
    let connector = InMemoryConnector::new().with_scalar("dbo.UserSave", Value::Null);
    let db = database(connector);
    let mut user = User {
        id: 5,
        name: "Ann".into(),
    };

    db.save(&mut user, CONN).await.unwrap();

    assert_eq!(user.id, 5);
}

#[tokio::test]
async fn save_without_entity_descriptor_makes_no_call() {
    let connector = InMemoryConnector::new();
    let db = database(connector.clone());
    let mut tag = Tag {
        label: "rust".into(),
    };

    db.save(&mut tag, CONN).await.unwrap();

    assert_eq!(connector.call_count().await, 0);
    assert_eq!(connector.opened_connections().await, 0);
}

#[tokio::test]
async fn save_with_empty_procedure_makes_no_call() {
    let connector = InMemoryConnector::new();
    let db = database(connector.clone());

    db.save(&mut Draft::default(), CONN).await.unwrap();

    assert_eq!(connector.call_count().await, 0);
}

#[tokio::test]
async fn ambiguous_return_id_is_skipped() {
    let connector = InMemoryConnector::new().with_scalar("dbo.DupSave", 9i64);
    let db = database(connector.clone());
    let mut item = Duplicated {
        label: "x".into(),
        ..Default::default()
    };

    db.save(&mut item, CONN).await.unwrap();

    assert_eq!(item.first, 0);
    assert_eq!(item.second, 0);
    assert_eq!(connector.call_count().await, 1);
}

#[tokio::test]
async fn save_with_explicit_procedure_returns_raw_scalar() {
    let connector = InMemoryConnector::new().with_scalar("dbo.UserRename", "ok");
    let db = database(connector.clone());
    let user = User {
        id: 4,
        name: "Dee".into(),
    };

    let returned = db.save_with(&user, CONN, "dbo.UserRename").await.unwrap();

    assert_eq!(returned, Value::Text("ok".into()));
    assert_eq!(connector.calls().await[0].params, vec![Parameter::new("UserName", "Dee")]);
}

#[tokio::test]
async fn fetch_one_hydrates_first_row_in_place() {
    let connector = InMemoryConnector::new().with_result("dbo.UserGetByID", user_rows());
    let db = database(connector.clone());
    let mut user = User::default();

    let report = db
        .fetch_one(&mut user, CONN, "dbo.UserGetByID", &params!["UserID" => 1i64])
        .await
        .unwrap();

    assert_eq!(user, User { id: 1, name: "Ann".into() });
    assert_eq!(report.assigned, 2);
    assert_eq!(report.unmatched, 1);

    let calls = connector.calls().await;
    assert_eq!(calls[0].mode, CallMode::Rows);
    assert_eq!(calls[0].params, vec![Parameter::new("UserID", 1i64)]);
}

#[tokio::test]
async fn fetch_one_on_empty_result_leaves_instance_untouched() {
    let connector = InMemoryConnector::new().with_result("dbo.UserGetByID", QueryResult::empty());
    let db = database(connector);
    let mut user = User {
        id: 8,
        name: "Kept".into(),
    };

    let report = db
        .fetch_one(&mut user, CONN, "dbo.UserGetByID", &params![])
        .await
        .unwrap();

    assert_eq!(user, User { id: 8, name: "Kept".into() });
    assert_eq!(report, HydrationReport::default());
}

#[tokio::test]
async fn fetch_list_hydrates_rows_in_order() {
    let connector = InMemoryConnector::new().with_result("dbo.UserList", user_rows());
    let db = database(connector.clone());

    let users: Vec<User> = db.fetch_list(CONN, "dbo.UserList", &[], false).await.unwrap();

    assert_eq!(
        users,
        vec![
            User { id: 1, name: "Ann".into() },
            User { id: 2, name: String::new() },
            User { id: 3, name: "Cy".into() },
        ]
    );
    assert_eq!(connector.open_connections().await, 0);
}

#[tokio::test]
async fn fetch_list_appends_template() {
    let connector = InMemoryConnector::new().with_result("dbo.UserList", user_rows());
    let db = database(connector);

    let users: Vec<User> = db.fetch_list(CONN, "dbo.UserList", &[], true).await.unwrap();

    assert_eq!(users.len(), 4);
    assert_eq!(users[3], User::default());
}

#[tokio::test]
async fn fetch_list_over_empty_result() {
    let connector = InMemoryConnector::new().with_result("dbo.UserList", QueryResult::empty());
    let db = database(connector);

    let none: Vec<User> = db.fetch_list(CONN, "dbo.UserList", &[], false).await.unwrap();
    assert!(none.is_empty());

    let template_only: Vec<User> = db.fetch_list(CONN, "dbo.UserList", &[], true).await.unwrap();
    assert_eq!(template_only, vec![User::default()]);
}

#[tokio::test]
async fn scalar_is_a_passthrough() {
    let connector = InMemoryConnector::new().with_procedure("dbo.CountUsers", |params| {
        let min_id = params
            .iter()
            .find(|p| p.name == "MinID")
            .and_then(|p| p.value.as_i64())
            .unwrap_or(0);
        Ok(QueryResult::single([("Total", 10 - min_id)]))
    });
    let db = database(connector);

    let total = db
        .scalar("dbo.CountUsers", CONN, &params!["MinID" => 4i64])
        .await
        .unwrap();

    assert_eq!(total, Value::Integer(6));
}

#[tokio::test]
async fn delete_binds_key_fields() {
    let connector = InMemoryConnector::new().with_scalar("dbo.UserDelete", Value::Null);
    let db = database(connector.clone());

    // User declares no delete procedure.
    db.delete(&User { id: 1, name: "Ann".into() }, CONN).await.unwrap();
    assert_eq!(connector.call_count().await, 0);

    let connector = InMemoryConnector::new().with_scalar("dbo.NoteDelete", 1i64);
    let db = database(connector.clone());
    db.delete(&Note { id: 3, body: "hi".into() }, CONN).await.unwrap();

    let calls = connector.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].procedure, "dbo.NoteDelete");
    // Note marks no key, so save-eligible fields are bound.
    assert_eq!(calls[0].params, vec![Parameter::new("Body", "hi")]);
}

#[tokio::test]
async fn procedure_failures_propagate_and_release_connection() {
    let connector = InMemoryConnector::new().with_procedure("dbo.Broken", |_| {
        Err(DbError::procedure("dbo.Broken", "deadlock victim"))
    });
    let db = database(connector.clone());

    let err = db
        .fetch_list::<User>(CONN, "dbo.Broken", &[], false)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Procedure { .. }));

    let err = db.scalar("dbo.Missing", CONN, &[]).await.unwrap_err();
    assert!(matches!(err, DbError::ProcedureNotFound(_)));

    assert_eq!(connector.opened_connections().await, 2);
    assert_eq!(connector.open_connections().await, 0);
}

#[tokio::test]
async fn connection_failures_propagate() {
    let connector = InMemoryConnector::new().refuse_connections();
    let db = database(connector);
    let mut user = User::default();

    let err = db.save(&mut user, CONN).await.unwrap_err();

    assert!(matches!(err, DbError::Connection(_)));
}

#[tokio::test]
async fn unknown_token_is_used_as_connection_string() {
    let connector = InMemoryConnector::new().with_scalar("dbo.Ping", 1i64);
    let db = database(connector.clone());

    db.scalar("dbo.Ping", "Server=direct", &[]).await.unwrap();

    assert_eq!(connector.calls().await[0].connection_string, "Server=direct");
}

#[tokio::test]
async fn empty_token_reaches_connector_unchanged() {
    let connector = InMemoryConnector::new().with_scalar("dbo.Ping", 1i64);
    let db = database(connector.clone());

    db.scalar("dbo.Ping", "", &[]).await.unwrap();

    let calls = connector.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].connection_string, "");
    assert_eq!(connector.opened_connections().await, 1);
}

#[tokio::test]
async fn empty_token_uses_configured_default_connection() {
    let connector = InMemoryConnector::new().with_scalar("dbo.Ping", 1i64);
    let db = Database::with_config(
        connector.clone(),
        MapTokenSource::new().with(CONN, "Server=mem;Database=app"),
        ConnectionConfig::new().default_connection(CONN),
    )
    .unwrap();

    db.scalar("dbo.Ping", "", &[]).await.unwrap();

    assert_eq!(connector.calls().await[0].connection_string, "Server=mem;Database=app");
}

#[tokio::test]
async fn close_failure_after_successful_call_is_returned() {
    let connector = InMemoryConnector::new()
        .with_result("dbo.UserList", user_rows())
        .fail_close();
    let db = database(connector.clone());

    let err = db
        .fetch_list::<User>(CONN, "dbo.UserList", &[], false)
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Connection(ref message) if message.starts_with("close failed")));
    assert_eq!(connector.call_count().await, 1);
    assert_eq!(connector.open_connections().await, 0);
}

#[tokio::test]
async fn procedure_error_wins_over_close_failure() {
    let connector = InMemoryConnector::new()
        .with_procedure("dbo.Broken", |_| Err(DbError::procedure("dbo.Broken", "boom")))
        .fail_close();
    let db = database(connector.clone());

    let err = db.scalar("dbo.Broken", CONN, &[]).await.unwrap_err();

    assert!(matches!(
        err,
        DbError::Procedure { ref procedure, ref message } if procedure == "dbo.Broken" && message == "boom"
    ));
    assert_eq!(connector.open_connections().await, 0);
}

#[test]
fn invalid_config_is_rejected() {
    let result = Database::with_config(
        InMemoryConnector::new(),
        MapTokenSource::new(),
        ConnectionConfig::new().default_connection(" "),
    );
    assert!(matches!(result, Err(DbError::Config(_))));
}
