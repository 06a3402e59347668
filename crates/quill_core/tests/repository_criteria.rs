use quill_core::criteria::{Limit, OrderBy, Where};
use quill_core::db::open_db_in_memory;
use quill_core::query::{Columns, Direction, Operator, Query, WhereClause};
use quill_core::{Attributes, Model, RepoError, Repository};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
struct Member {
    id: i64,
    name: String,
    status: String,
    age: i64,
}

impl Model for Member {
    const TABLE: &'static str = "members";
    const COLUMNS: &'static [&'static str] = &["id", "name", "status", "age"];
}

#[derive(Debug, Default, Deserialize)]
struct Ghost {}

impl Model for Ghost {
    const TABLE: &'static str = "ghosts";
    const COLUMNS: &'static [&'static str] = &["id"];
}

#[derive(Debug, Default, Deserialize)]
struct MemberWithEmail {}

impl Model for MemberWithEmail {
    const TABLE: &'static str = "members";
    const COLUMNS: &'static [&'static str] = &["id", "email"];
}

fn setup() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            status TEXT NOT NULL,
            age INTEGER NOT NULL
        );
        INSERT INTO members (name, status, age) VALUES
            ('alice', 'active', 30),
            ('bob', 'active', 17),
            ('carol', 'inactive', 40),
            ('dave', 'active', 19);",
    )
    .unwrap();
    conn
}

fn attrs(value: serde_json::Value) -> Attributes {
    value.as_object().unwrap().clone()
}

fn names(members: &[Member]) -> Vec<&str> {
    members.iter().map(|member| member.name.as_str()).collect()
}

#[test]
fn criteria_fold_in_registration_order() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(OrderBy::new("age", Direction::Desc))
        .push_criteria(OrderBy::new("name", Direction::Asc))
        .push_criteria(Limit(3))
        .push_criteria(Limit(2));

    let query = repo.apply_criteria();
    assert_eq!(
        query.orders(),
        &[
            ("age".to_string(), Direction::Desc),
            ("name".to_string(), Direction::Asc)
        ]
    );
    assert_eq!(query.limit_value(), Some(2));
    assert_eq!(repo.criteria().names(), vec!["order_by", "order_by", "limit", "limit"]);

    let members = repo.all(&Columns::All).unwrap();
    assert_eq!(names(&members), vec!["carol", "alice"]);
}

#[test]
fn closures_are_criteria() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(|query: Query<Member>, _repo: &Repository<'_, Member>| {
        query.where_op("age", Operator::Gte, 30)
    });

    let members = repo.all(&Columns::All).unwrap();
    assert_eq!(names(&members), vec!["alice", "carol"]);
    assert_eq!(repo.criteria().names(), vec!["closure"]);
}

#[test]
fn skip_criteria_persists_until_reset_scope() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(Where::eq("status", "active"));
    assert_eq!(repo.count().unwrap(), 3);

    repo.skip_criteria(true);
    assert_eq!(repo.count().unwrap(), 4);
    assert_eq!(repo.all(&Columns::All).unwrap().len(), 4);
    assert!(repo.criteria().is_skipped());

    repo.reset_scope();
    assert!(!repo.criteria().is_skipped());
    assert_eq!(repo.count().unwrap(), 3);
    assert_eq!(repo.criteria().len(), 1, "reset_scope keeps registered criteria");

    repo.skip_criteria(true).skip_criteria(false);
    assert_eq!(repo.count().unwrap(), 3);
}

#[test]
fn without_criteria_bypasses_exactly_one_read() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(Where::eq("status", "active"));

    assert_eq!(repo.without_criteria().all(&Columns::All).unwrap().len(), 4);
    assert_eq!(repo.all(&Columns::All).unwrap().len(), 3);

    let carol = repo.without_criteria().find_by("name", "carol", &Columns::All).unwrap();
    assert_eq!(carol.status, "inactive");
    let err = repo.find_by("name", "carol", &Columns::All).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn criteria_pushed_later_only_affect_later_reads() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();

    let before = repo.all(&Columns::All).unwrap();
    repo.push_criteria(Where::new("age", Operator::Lt, 20));
    let after = repo.all(&Columns::All).unwrap();

    assert_eq!(before.len(), 4);
    assert_eq!(names(&after), vec!["bob", "dave"]);
}

#[test]
fn find_missing_id_is_not_found() {
    let conn = setup();
    let repo = Repository::<Member>::try_new(&conn).unwrap();

    let err = repo.find(999, &Columns::All).unwrap_err();
    match err {
        RepoError::NotFound { table, key } => {
            assert_eq!(table, "members");
            assert_eq!(key, "id=999");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn find_where_combines_clauses_with_and() {
    let conn = setup();
    let repo = Repository::<Member>::try_new(&conn).unwrap();

    let clauses = vec![
        WhereClause::Eq("status".to_string(), json!("active")),
        WhereClause::Op("age".to_string(), Operator::Gt, json!(18)),
    ];
    let members = repo.find_where(&clauses, &Columns::All).unwrap();
    assert_eq!(names(&members), vec!["alice", "dave"]);

    let from_json = WhereClause::from_json(&json!({
        "status": "active",
        "age": [">", 18],
    }))
    .unwrap();
    assert_eq!(repo.find_where(&from_json, &Columns::All).unwrap(), members);
}

#[test]
fn find_where_applies_on_top_of_criteria() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(Where::new("age", Operator::Gte, 20));

    let clauses = vec![WhereClause::Eq("status".to_string(), json!("active"))];
    let members = repo.find_where(&clauses, &Columns::All).unwrap();
    assert_eq!(names(&members), vec!["alice"]);

    let members = repo.find_all_by("status", "inactive", &Columns::All).unwrap();
    assert_eq!(names(&members), vec!["carol"]);
    assert!(repo
        .find_all_by("status", "retired", &Columns::All)
        .unwrap()
        .is_empty());
}

#[test]
fn create_never_consults_criteria() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(Where::eq("status", "inactive"));

    let created = repo
        .create(&attrs(json!({"name": "erin", "status": "active", "age": 25})))
        .unwrap();
    assert_eq!(created.name, "erin");
    assert_eq!(created.status, "active");

    assert!(repo.find(created.id, &Columns::All).unwrap_err().is_not_found());
    assert_eq!(repo.without_criteria().find(created.id, &Columns::All).unwrap(), created);
}

#[test]
fn create_then_find_round_trips_fields() {
    let conn = setup();
    let repo = Repository::<Member>::try_new(&conn).unwrap();

    let created = repo
        .create(&attrs(json!({"name": "frank", "status": "active", "age": 52})))
        .unwrap();
    let found = repo.find(created.id, &Columns::All).unwrap();
    assert_eq!(found, created);
    assert_eq!(found.age, 52);
}

#[test]
fn projections_leave_unselected_fields_defaulted() {
    let conn = setup();
    let repo = Repository::<Member>::try_new(&conn).unwrap();

    let alice = repo
        .find_by("name", "alice", &Columns::only(["id", "name"]))
        .unwrap();
    assert_eq!(alice.name, "alice");
    assert_eq!(alice.status, "");
    assert_eq!(alice.age, 0);
}

#[test]
fn update_paths_ignore_criteria() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(Where::eq("status", "nobody"));

    let changed = repo
        .update(&attrs(json!({"status": "archived"})), "active", "status")
        .unwrap();
    assert_eq!(changed, 3);

    let saved = repo.update_rich(&attrs(json!({"age": 41})), 3).unwrap();
    assert!(saved);

    repo.reset_scope().skip_criteria(true);
    let carol = repo.find(3, &Columns::All).unwrap();
    assert_eq!(carol.age, 41);
    assert_eq!(carol.name, "carol");
    assert_eq!(repo.find_all_by("status", "archived", &Columns::All).unwrap().len(), 3);

    let err = repo.update_rich(&attrs(json!({"age": 1})), 999).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn delete_ignores_criteria_and_reports_rows() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(Where::eq("status", "nobody"));

    assert_eq!(repo.delete(2).unwrap(), 1);
    assert_eq!(repo.delete(2).unwrap(), 0);
    assert_eq!(repo.without_criteria().count().unwrap(), 3);
}

#[test]
fn paginate_reports_window_and_totals() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(OrderBy::new("id", Direction::Asc))
        .push_criteria(Limit(1));

    let page = repo.paginate(3, 2, &Columns::All).unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.per_page, 3);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.last_page, 2);
    assert_eq!(names(&page.items), vec!["dave"]);
    assert!(!page.has_more_pages());

    let first = repo.paginate(0, 0, &Columns::All).unwrap();
    assert_eq!(first.per_page, 15);
    assert_eq!(first.current_page, 1);
    assert_eq!(first.items.len(), 4);
}

#[test]
fn lists_and_get_by_criteria_respect_registered_criteria() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();
    repo.push_criteria(Where::eq("status", "active"))
        .push_criteria(OrderBy::new("name", Direction::Asc));

    let pairs = repo.lists("name", "id").unwrap();
    assert_eq!(
        pairs,
        vec![
            (json!(1), json!("alice")),
            (json!(2), json!("bob")),
            (json!(4), json!("dave")),
        ]
    );

    let adults = repo
        .get_by_criteria(&Where::new("age", Operator::Gte, 18), &Columns::All)
        .unwrap();
    assert_eq!(names(&adults), vec!["alice", "dave"]);
    assert_eq!(repo.criteria().len(), 2, "ad-hoc criterion is not registered");
}

#[test]
fn missing_table_is_a_configuration_error() {
    let conn = setup();
    let err = Repository::<Ghost>::try_new(&conn).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, RepoError::MissingRequiredTable("ghosts")));

    let err = Repository::<MemberWithEmail>::try_new(&conn).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(
        err,
        RepoError::MissingRequiredColumn {
            table: "members",
            column: "email"
        }
    ));
}

#[test]
fn undeclared_columns_are_rejected_before_sql() {
    let conn = setup();
    let mut repo = Repository::<Member>::try_new(&conn).unwrap();

    let err = repo.find_by("email", "a@b.c", &Columns::All).unwrap_err();
    assert!(matches!(err, RepoError::UnknownColumn { .. }));

    repo.push_criteria(OrderBy::new("name; DROP TABLE members", Direction::Asc));
    let err = repo.all(&Columns::All).unwrap_err();
    assert!(matches!(err, RepoError::UnknownColumn { .. }));
    assert_eq!(repo.without_criteria().count().unwrap(), 4);
}

#[test]
fn boot_hook_failure_fails_construction() {
    let conn = setup();
    let err = Repository::<Member>::boot(&conn, |repo| {
        repo.push_criteria(quill_core::criteria::WithRelation::for_model::<Member>("owner")?);
        Ok(())
    })
    .unwrap_err();
    assert!(err.is_configuration());

    let repo = Repository::<Member>::boot(&conn, |repo| {
        repo.push_criteria(Where::eq("status", "active"));
        Ok(())
    })
    .unwrap();
    assert_eq!(repo.count().unwrap(), 3);
}

#[test]
fn update_rich_writes_the_loaded_row_even_if_data_names_another_id() {
    let conn = setup();
    let repo = Repository::<Member>::try_new(&conn).unwrap();

    let saved = repo
        .update_rich(&attrs(json!({"id": 3, "age": 99})), 1)
        .unwrap();
    assert!(saved);

    let alice = repo.find(1, &Columns::All).unwrap();
    assert_eq!(alice.name, "alice");
    assert_eq!(alice.age, 99);

    let carol = repo.find(3, &Columns::All).unwrap();
    assert_eq!(carol.name, "carol");
    assert_eq!(carol.status, "inactive");
    assert_eq!(carol.age, 40);
}
