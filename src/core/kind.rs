//! Content kind descriptors.
//!
//! Each kind of content lives in its own set of tables. A [`ContentKind`] maps
//! the kind onto those tables so that comment, lifecycle and sweep logic is
//! written once and driven by the descriptor.

use sea_orm::sea_query::Alias;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of content the newsroom publishes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Written news articles
    Article,
    /// Scanned newspaper editions
    ENewspaper,
    /// Video news items
    VideoNews,
    /// Time-bound business-promotional posts
    BusinessPost,
}

impl ContentKind {
    /// Every kind, in schema creation order.
    pub const ALL: [Self; 4] = [
        Self::Article,
        Self::ENewspaper,
        Self::VideoNews,
        Self::BusinessPost,
    ];

    /// Name used in logs and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::ENewspaper => "e-newspaper",
            Self::VideoNews => "video news",
            Self::BusinessPost => "business post",
        }
    }

    /// Table holding the content items.
    #[must_use]
    pub const fn content_table_name(self) -> &'static str {
        match self {
            Self::Article => "articles",
            Self::ENewspaper => "e_newspapers",
            Self::VideoNews => "video_news",
            Self::BusinessPost => "business_posts",
        }
    }

    /// Table holding comments on the content items.
    #[must_use]
    pub const fn comment_table_name(self) -> &'static str {
        match self {
            Self::Article => "article_comments",
            Self::ENewspaper => "e_newspaper_comments",
            Self::VideoNews => "video_news_comments",
            Self::BusinessPost => "business_post_comments",
        }
    }

    /// Table holding media attached to the content items.
    #[must_use]
    pub const fn media_table_name(self) -> &'static str {
        match self {
            Self::Article => "article_media",
            Self::ENewspaper => "e_newspaper_pages",
            Self::VideoNews => "video_news_media",
            Self::BusinessPost => "business_post_photos",
        }
    }

    /// Whether items of this kind carry an expiration and are swept.
    #[must_use]
    pub const fn expires(self) -> bool {
        matches!(self, Self::BusinessPost)
    }

    pub(crate) fn content_table(self) -> Alias {
        Alias::new(self.content_table_name())
    }

    pub(crate) fn comment_table(self) -> Alias {
        Alias::new(self.comment_table_name())
    }

    pub(crate) fn media_table(self) -> Alias {
        Alias::new(self.media_table_name())
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
