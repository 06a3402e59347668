//! Post repository.
//!
//! # Responsibility
//! - Serve posts with their author eager loaded by default.
//! - Own slug allocation and the `post_tag` pivot.
//!
//! # Invariants
//! - `create_post` never produces a slug collision.
//! - `sync_tags` replaces the whole tag set in a single transaction.

use crate::criteria::WithAuthor;
use crate::model::entity::{Attributes, EntityId, Model};
use crate::model::post::Post;
use crate::query::Query;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::repository::Repository;
use crate::repo::slug::unique_slug;
use log::info;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::ops::{Deref, DerefMut};

pub struct PostRepository<'conn>(Repository<'conn, Post>);

impl<'conn> PostRepository<'conn> {
    /// Builds the repository with `WithAuthor` registered.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Repository::boot(conn, |repository| {
            repository.push_criteria(WithAuthor);
            Ok(())
        })
        .map(Self)
    }

    /// Creates a post, deriving `slug` from `title` when none is given.
    pub fn create_post(&self, data: &Attributes) -> RepoResult<Post> {
        let mut data = data.clone();
        let has_slug = data
            .get("slug")
            .and_then(Value::as_str)
            .is_some_and(|slug| !slug.trim().is_empty());
        if !has_slug {
            let title = data.get("title").and_then(Value::as_str).unwrap_or_default();
            let slug = unique_slug::<Post>(self.connection(), title)?;
            data.insert("slug".to_string(), Value::String(slug));
        }
        self.create(&data)
    }

    /// Replaces the tags of `post_id` with `tag_ids`; returns the new count.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the post does not exist.
    /// - `RepoError::Db` when a tag id does not exist (foreign key).
    pub fn sync_tags(&self, post_id: EntityId, tag_ids: &[EntityId]) -> RepoResult<usize> {
        let tx = self.connection().unchecked_transaction()?;
        if Query::<Post>::new().where_eq("id", post_id).count(&tx)? == 0 {
            return Err(RepoError::not_found(
                Post::TABLE,
                format!("{}={post_id}", Post::PRIMARY_KEY),
            ));
        }

        tx.execute("DELETE FROM post_tag WHERE post_id = ?1;", [post_id])?;
        let mut attached = 0;
        for tag_id in tag_ids {
            attached += tx.execute(
                "INSERT OR IGNORE INTO post_tag (post_id, tag_id) VALUES (?1, ?2);",
                params![post_id, tag_id],
            )?;
        }
        tx.execute(
            "UPDATE posts
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [post_id],
        )?;
        tx.commit()?;

        info!("event=post_tags_sync module=repo status=ok post_id={post_id} tags={attached}");
        Ok(attached)
    }
}

impl<'conn> Deref for PostRepository<'conn> {
    type Target = Repository<'conn, Post>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PostRepository<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
