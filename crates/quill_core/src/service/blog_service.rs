//! Public blog pages.
//!
//! # Responsibility
//! - Serve the index, single-post and per-tag listings readers see.
//!
//! # Invariants
//! - Only posts visible at the service clock are ever returned.
//! - Listings are newest first and paginated.

use crate::criteria::{LatestFirst, Published, RequestParams, WithTag, WithTags};
use crate::model::post::Post;
use crate::model::tag::Tag;
use crate::query::{Columns, Page, DEFAULT_PER_PAGE};
use crate::repo::{PostRepository, RepoError, TagRepository};
use log::debug;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for blog pages.
#[derive(Debug)]
pub enum BlogServiceError {
    /// No visible post carries this slug.
    PostNotFound(String),
    /// No tag carries this slug.
    TagNotFound(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for BlogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostNotFound(slug) => write!(f, "post not found: `{slug}`"),
            Self::TagNotFound(slug) => write!(f, "tag not found: `{slug}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BlogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BlogServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type BlogResult<T> = Result<T, BlogServiceError>;

/// One page of posts under a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPage {
    pub tag: Tag,
    pub posts: Page<Post>,
}

pub struct BlogService<'conn> {
    conn: &'conn Connection,
    per_page: u32,
    now_ms: Option<i64>,
}

impl<'conn> BlogService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            per_page: DEFAULT_PER_PAGE,
            now_ms: None,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Pins the visibility clock (epoch milliseconds) instead of reading it
    /// per call.
    pub fn at(mut self, now_ms: i64) -> Self {
        self.now_ms = Some(now_ms);
        self
    }

    /// Front page: visible posts with their authors, newest first.
    pub fn index(&self, page: u32) -> BlogResult<Page<Post>> {
        let posts = self.visible_posts()?;
        let listing = posts.paginate(self.per_page, page, &Columns::All)?;
        debug!(
            "event=blog_index module=service status=ok page={} items={} total={}",
            listing.current_page,
            listing.items.len(),
            listing.total
        );
        Ok(listing)
    }

    /// Single post page with author and tags.
    pub fn show(&self, slug: &str) -> BlogResult<Post> {
        let mut posts = self.visible_posts()?;
        posts.push_criteria(WithTags);
        posts
            .find_by("slug", slug, &Columns::All)
            .map_err(|err| match err {
                RepoError::NotFound { .. } => BlogServiceError::PostNotFound(slug.to_string()),
                other => other.into(),
            })
    }

    /// Visible posts carrying the tag `slug`, newest first.
    pub fn posts_for_tag(&self, slug: &str, page: u32) -> BlogResult<TagPage> {
        let tags = TagRepository::try_new(self.conn, &RequestParams::new())?;
        let tag = tags
            .find_by("slug", slug, &Columns::All)
            .map_err(|err| match err {
                RepoError::NotFound { .. } => BlogServiceError::TagNotFound(slug.to_string()),
                other => other.into(),
            })?;

        let mut posts = self.visible_posts()?;
        posts.push_criteria(WithTag(tag.slug.clone()));
        let listing = posts.paginate(self.per_page, page, &Columns::All)?;
        Ok(TagPage { tag, posts: listing })
    }

    fn visible_posts(&self) -> BlogResult<PostRepository<'conn>> {
        let published = self.now_ms.map_or_else(Published::now, Published::at);
        let mut posts = PostRepository::try_new(self.conn)?;
        posts.push_criteria(published).push_criteria(LatestFirst);
        Ok(posts)
    }
}
