use quill_core::criteria::{ByAuthor, LatestFirst, Published, WithRelation, WithTag, WithTags};
use quill_core::db::open_db_in_memory;
use quill_core::query::Columns;
use quill_core::{
    Attributes, EntityId, Post, PostRepository, RequestParams, TagRepository, User,
    UserRepository,
};
use rusqlite::Connection;
use serde_json::json;

const NOW_MS: i64 = 1_700_000_000_000;

fn attrs(value: serde_json::Value) -> Attributes {
    value.as_object().unwrap().clone()
}

fn insert_user(conn: &Connection, id: EntityId, name: &str) {
    conn.execute(
        "INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3);",
        rusqlite::params![id, name, format!("{name}@example.com")],
    )
    .unwrap();
}

fn insert_post(
    repo: &PostRepository<'_>,
    author_id: Option<EntityId>,
    title: &str,
    published: bool,
    published_at: Option<i64>,
) -> Post {
    repo.create_post(&attrs(json!({
        "author_id": author_id,
        "title": title,
        "content": format!("# {title}"),
        "published": published,
        "published_at": published_at,
    })))
    .unwrap()
}

fn titles(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|post| post.title.as_str()).collect()
}

#[test]
fn by_author_with_latest_first_returns_only_that_author_newest_first() {
    let conn = open_db_in_memory().unwrap();
    insert_user(&conn, 5, "ada");
    insert_user(&conn, 7, "grace");
    let mut repo = PostRepository::try_new(&conn).unwrap();
    insert_post(&repo, Some(5), "first", true, Some(100));
    insert_post(&repo, Some(5), "third", true, Some(300));
    insert_post(&repo, Some(5), "second", true, Some(200));
    insert_post(&repo, Some(7), "other", true, Some(400));

    repo.push_criteria(ByAuthor(5)).push_criteria(LatestFirst);
    let posts = repo.all(&Columns::All).unwrap();

    assert_eq!(titles(&posts), vec!["third", "second", "first"]);
    for post in &posts {
        assert_eq!(post.author_id, Some(5));
        assert_eq!(post.author.as_ref().map(|user| user.name.as_str()), Some("ada"));
    }
}

#[test]
fn relation_criteria_on_an_empty_table_return_no_rows() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = PostRepository::try_new(&conn).unwrap();
    repo.push_criteria(WithTags);

    assert!(repo.all(&Columns::All).unwrap().is_empty());
    assert_eq!(repo.paginate(10, 1, &Columns::All).unwrap().total, 0);
}

#[test]
fn post_repository_boots_with_author_eager_loaded() {
    let conn = open_db_in_memory().unwrap();
    insert_user(&conn, 1, "ada");
    let repo = PostRepository::try_new(&conn).unwrap();
    assert_eq!(repo.criteria().names(), vec!["with_author"]);

    let with_author = insert_post(&repo, Some(1), "signed", true, None);
    let orphan = insert_post(&repo, None, "anonymous", true, None);

    let found = repo.find(with_author.id, &Columns::All).unwrap();
    assert_eq!(found.author.map(|user| user.email), Some("ada@example.com".to_string()));
    assert_eq!(repo.find(orphan.id, &Columns::All).unwrap().author, None);

    let bare = repo.without_criteria().find(with_author.id, &Columns::All).unwrap();
    assert_eq!(bare.author, None);
}

#[test]
fn create_post_allocates_unique_slugs() {
    let conn = open_db_in_memory().unwrap();
    let repo = PostRepository::try_new(&conn).unwrap();

    let first = insert_post(&repo, None, "Hello, World!", false, None);
    let second = insert_post(&repo, None, "Hello World", false, None);
    let third = insert_post(&repo, None, "hello world", false, None);
    let symbols = insert_post(&repo, None, "!!!", false, None);
    let explicit = repo
        .create_post(&attrs(json!({"title": "Hello World", "slug": "custom"})))
        .unwrap();

    assert_eq!(first.slug, "hello-world");
    assert_eq!(second.slug, "hello-world-2");
    assert_eq!(third.slug, "hello-world-3");
    assert_eq!(symbols.slug, "untitled");
    assert_eq!(explicit.slug, "custom");
}

#[test]
fn sync_tags_replaces_the_tag_set() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = PostRepository::try_new(&conn).unwrap();
    let tags = TagRepository::try_new(&conn, &RequestParams::new()).unwrap();
    let rust = tags.create_tag("Rust").unwrap();
    let sqlite = tags.create_tag("SQLite").unwrap();
    let web = tags.create_tag("Web").unwrap();
    let post = insert_post(&repo, None, "tagged", true, None);

    assert_eq!(repo.sync_tags(post.id, &[web.id, rust.id]).unwrap(), 2);
    assert_eq!(repo.sync_tags(post.id, &[sqlite.id, rust.id, rust.id]).unwrap(), 2);

    repo.push_criteria(WithTags);
    let loaded = repo.find(post.id, &Columns::All).unwrap();
    let slugs: Vec<&str> = loaded.tags.iter().map(|tag| tag.slug.as_str()).collect();
    assert_eq!(slugs, vec!["rust", "sqlite"]);

    let err = repo.sync_tags(999, &[rust.id]).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn sync_tags_rolls_back_on_unknown_tag() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = PostRepository::try_new(&conn).unwrap();
    let tags = TagRepository::try_new(&conn, &RequestParams::new()).unwrap();
    let rust = tags.create_tag("Rust").unwrap();
    let post = insert_post(&repo, None, "tagged", true, None);
    repo.sync_tags(post.id, &[rust.id]).unwrap();

    assert!(repo.sync_tags(post.id, &[rust.id, 404]).is_err());

    repo.push_criteria(WithTags);
    let loaded = repo.find(post.id, &Columns::All).unwrap();
    assert_eq!(loaded.tags.len(), 1, "failed sync must keep the old set");
}

#[test]
fn with_tag_filters_through_the_pivot() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = PostRepository::try_new(&conn).unwrap();
    let tags = TagRepository::try_new(&conn, &RequestParams::new()).unwrap();
    let rust = tags.create_tag("Rust").unwrap();
    let go = tags.create_tag("Go").unwrap();
    let a = insert_post(&repo, None, "a", true, Some(1));
    let b = insert_post(&repo, None, "b", true, Some(2));
    insert_post(&repo, None, "c", true, Some(3));
    repo.sync_tags(a.id, &[rust.id]).unwrap();
    repo.sync_tags(b.id, &[rust.id, go.id]).unwrap();

    repo.push_criteria(WithTag("rust".to_string()))
        .push_criteria(LatestFirst);
    assert_eq!(titles(&repo.all(&Columns::All).unwrap()), vec!["b", "a"]);

    let mut go_only = PostRepository::try_new(&conn).unwrap();
    go_only.push_criteria(WithTag("go".to_string()));
    assert_eq!(titles(&go_only.all(&Columns::All).unwrap()), vec!["b"]);
}

#[test]
fn published_hides_drafts_and_scheduled_posts() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = PostRepository::try_new(&conn).unwrap();
    insert_post(&repo, None, "live", true, Some(NOW_MS - 1));
    insert_post(&repo, None, "undated", true, None);
    insert_post(&repo, None, "draft", false, Some(NOW_MS - 1));
    insert_post(&repo, None, "scheduled", true, Some(NOW_MS + 60_000));

    repo.push_criteria(Published::at(NOW_MS))
        .push_criteria(LatestFirst);
    let posts = repo.all(&Columns::All).unwrap();
    assert_eq!(titles(&posts), vec!["live", "undated"]);
    assert!(posts.iter().all(|post| post.is_visible_at(NOW_MS)));
}

#[test]
fn has_many_and_belongs_to_many_nest_related_rows() {
    let conn = open_db_in_memory().unwrap();
    insert_user(&conn, 1, "ada");
    insert_user(&conn, 2, "grace");
    let posts = PostRepository::try_new(&conn).unwrap();
    let first = insert_post(&posts, Some(1), "one", true, None);
    let second = insert_post(&posts, Some(1), "two", true, None);

    let mut users = UserRepository::try_new(&conn).unwrap();
    users.push_criteria(WithRelation::for_model::<User>("posts").unwrap());
    let loaded = users.all(&Columns::All).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(titles(&loaded[0].posts), vec!["one", "two"]);
    assert!(loaded[1].posts.is_empty());

    let mut tags = TagRepository::try_new(&conn, &RequestParams::from_pairs([("with", "posts")]))
        .unwrap();
    let rust = tags.create_tag("Rust").unwrap();
    posts.sync_tags(first.id, &[rust.id]).unwrap();
    posts.sync_tags(second.id, &[rust.id]).unwrap();
    let rust = tags.find(rust.id, &Columns::All).unwrap();
    assert_eq!(titles(&rust.posts), vec!["one", "two"]);

    tags.skip_criteria(true);
    assert!(tags.find(rust.id, &Columns::All).unwrap().posts.is_empty());
}

#[test]
fn update_rich_refreshes_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = PostRepository::try_new(&conn).unwrap();
    let post = insert_post(&repo, None, "before", false, None);
    conn.execute("UPDATE posts SET updated_at = 0 WHERE id = ?1;", [post.id])
        .unwrap();

    assert!(repo
        .update_rich(&attrs(json!({"title": "after", "published": true})), post.id)
        .unwrap());

    let saved = repo.find(post.id, &Columns::All).unwrap();
    assert_eq!(saved.title, "after");
    assert!(saved.published);
    assert_eq!(saved.slug, post.slug);
    assert!(saved.updated_at > 0);
}

#[test]
fn deleting_a_post_cascades_pivot_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = PostRepository::try_new(&conn).unwrap();
    let tags = TagRepository::try_new(&conn, &RequestParams::new()).unwrap();
    let rust = tags.create_tag("Rust").unwrap();
    let post = insert_post(&repo, None, "doomed", true, None);
    repo.sync_tags(post.id, &[rust.id]).unwrap();

    assert_eq!(repo.delete(post.id).unwrap(), 1);
    let pivots: i64 = conn
        .query_row("SELECT COUNT(*) FROM post_tag;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(pivots, 0);
    assert_eq!(tags.count().unwrap(), 1);
}
