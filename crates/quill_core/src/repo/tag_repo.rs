//! Tag repository driven by listing-screen request parameters.

use crate::criteria::{RequestCriteria, RequestParams};
use crate::model::entity::Attributes;
use crate::model::tag::Tag;
use crate::repo::error::RepoResult;
use crate::repo::repository::Repository;
use crate::repo::slug::unique_slug;
use rusqlite::Connection;
use serde_json::Value;
use std::ops::{Deref, DerefMut};

pub struct TagRepository<'conn>(Repository<'conn, Tag>);

impl<'conn> TagRepository<'conn> {
    /// Builds the repository with a `RequestCriteria` over `params`.
    ///
    /// Pass `RequestParams::new()` for unfiltered listings.
    pub fn try_new(conn: &'conn Connection, params: &RequestParams) -> RepoResult<Self> {
        let criteria = RequestCriteria::new(params.clone());
        Repository::boot(conn, move |repository| {
            repository.push_criteria(criteria);
            Ok(())
        })
        .map(Self)
    }

    /// Creates a tag named `name` with a freshly allocated slug.
    pub fn create_tag(&self, name: &str) -> RepoResult<Tag> {
        let slug = unique_slug::<Tag>(self.connection(), name)?;
        let mut data = Attributes::new();
        data.insert("name".to_string(), Value::String(name.trim().to_string()));
        data.insert("slug".to_string(), Value::String(slug));
        self.create(&data)
    }
}

impl<'conn> Deref for TagRepository<'conn> {
    type Target = Repository<'conn, Tag>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for TagRepository<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
