//! Moderation gateway - the policy layer in front of the lifecycle and
//! comment engines.
//!
//! Every call carries the caller's [`Role`] explicitly; nothing is looked up
//! from ambient session state. Admins may do everything. Public callers may
//! read and comment, and only on content that is published (not archived and
//! completed). A denied call fails with [`Error::Forbidden`], never with
//! [`Error::NotFound`], so callers can tell the two apart.
//!
//! The gateway is also where storage calls get their deadline: when a
//! timeout is configured, an overrunning call is dropped, which rolls back
//! any open transaction.

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::{
    core::{
        comment::{self, NewComment, Visibility},
        kind::ContentKind,
        lifecycle::{self, ContentFilter, ContentPatch, NewContent, NewMedia},
        pager::{PageRequest, PageResult},
    },
    entities::{Comment, CommentView, ContentItem, Media},
    errors::{Error, Result},
};

/// Who is calling, as resolved by the session layer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Newsroom staff
    Admin,
    /// Anonymous reader
    Public,
}

impl Role {
    /// Comment visibility granted to this role.
    #[must_use]
    pub const fn visibility(self) -> Visibility {
        match self {
            Self::Admin => Visibility::Admin,
            Self::Public => Visibility::Public,
        }
    }
}

/// Operations subject to authorization
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Read one content item
    ReadContent,
    /// List content items
    ListContent,
    /// Read or count comments
    ReadComments,
    /// Submit a comment
    AddComment,
    /// Author a new content item
    CreateContent,
    /// Edit, delete or attach media
    Mutate,
    /// Flip the completed flag
    ToggleCompleted,
    /// Archive an item
    Archive,
    /// Unarchive an item
    Unarchive,
    /// Toggle or set comment approval
    ModerateComment,
}

impl Operation {
    const fn name(self) -> &'static str {
        match self {
            Self::ReadContent => "read content",
            Self::ListContent => "list content",
            Self::ReadComments => "read comments",
            Self::AddComment => "add comment",
            Self::CreateContent => "create content",
            Self::Mutate => "modify content",
            Self::ToggleCompleted => "toggle completed",
            Self::Archive => "archive",
            Self::Unarchive => "unarchive",
            Self::ModerateComment => "moderate comment",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn forbidden(operation: Operation) -> Error {
    Error::Forbidden {
        operation: operation.to_string(),
    }
}

/// Decides whether `role` may perform `operation` at all.
pub fn authorize(role: Role, operation: Operation) -> Result<()> {
    match (role, operation) {
        (Role::Admin, _)
        | (
            Role::Public,
            Operation::ReadContent
            | Operation::ListContent
            | Operation::ReadComments
            | Operation::AddComment,
        ) => Ok(()),
        (Role::Public, _) => {
            warn!("Public caller denied: {}", operation);
            Err(forbidden(operation))
        }
    }
}

/// Role-aware entry point for every content and comment operation
#[derive(Debug)]
pub struct ModerationGateway {
    db: DatabaseConnection,
    timeout: Option<Duration>,
}

impl ModerationGateway {
    /// A gateway with no storage deadline.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, timeout: None }
    }

    /// Abandons any storage call that runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn within<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| Error::Timeout)?,
            None => call.await,
        }
    }

    /// Loads an item the caller is allowed to see.
    async fn visible_content(
        &self,
        role: Role,
        kind: ContentKind,
        id: i64,
        operation: Operation,
    ) -> Result<ContentItem> {
        let item = lifecycle::get_content(&self.db, kind, id)
            .await?
            .ok_or(Error::NotFound {
                entity: kind.label(),
                id,
            })?;
        if role == Role::Public && !item.is_publicly_visible() {
            warn!("Public caller denied {} on unpublished {} {}", operation, kind, id);
            return Err(forbidden(operation));
        }
        Ok(item)
    }

    /// Reads one item.
    pub async fn get_content(&self, role: Role, kind: ContentKind, id: i64) -> Result<ContentItem> {
        authorize(role, Operation::ReadContent)?;
        self.within(self.visible_content(role, kind, id, Operation::ReadContent))
            .await
    }

    /// Lists items; public callers only see published ones.
    pub async fn list_content(
        &self,
        role: Role,
        kind: ContentKind,
        page: PageRequest,
    ) -> Result<PageResult<ContentItem>> {
        authorize(role, Operation::ListContent)?;
        let filter = match role {
            Role::Admin => ContentFilter::All,
            Role::Public => ContentFilter::Published,
        };
        self.within(lifecycle::list_content(&self.db, kind, filter, page))
            .await
    }

    /// Media attached to an item the caller may see.
    pub async fn list_media(&self, role: Role, kind: ContentKind, id: i64) -> Result<Vec<Media>> {
        authorize(role, Operation::ReadContent)?;
        self.within(async {
            self.visible_content(role, kind, id, Operation::ReadContent)
                .await?;
            lifecycle::list_media(&self.db, kind, id).await
        })
        .await
    }

    /// Authors an item with its media.
    pub async fn create_content(
        &self,
        role: Role,
        kind: ContentKind,
        new: NewContent,
        media: Vec<NewMedia>,
    ) -> Result<ContentItem> {
        authorize(role, Operation::CreateContent)?;
        self.within(lifecycle::create_content(&self.db, kind, new, media))
            .await
    }

    /// Edits an active item.
    pub async fn update_content(
        &self,
        role: Role,
        kind: ContentKind,
        id: i64,
        patch: ContentPatch,
    ) -> Result<ContentItem> {
        authorize(role, Operation::Mutate)?;
        self.within(lifecycle::update_content(&self.db, kind, id, patch))
            .await
    }

    /// Deletes an active item with its media and comments.
    pub async fn delete_content(&self, role: Role, kind: ContentKind, id: i64) -> Result<()> {
        authorize(role, Operation::Mutate)?;
        self.within(lifecycle::delete_content(&self.db, kind, id))
            .await
    }

    /// Attaches media to an active item.
    pub async fn add_media(
        &self,
        role: Role,
        kind: ContentKind,
        id: i64,
        media: Vec<NewMedia>,
    ) -> Result<Vec<i64>> {
        authorize(role, Operation::Mutate)?;
        self.within(lifecycle::add_media(&self.db, kind, id, media))
            .await
    }

    /// Flips `completed` on an active item.
    pub async fn toggle_completed(
        &self,
        role: Role,
        kind: ContentKind,
        id: i64,
    ) -> Result<ContentItem> {
        authorize(role, Operation::ToggleCompleted)?;
        self.within(lifecycle::toggle_completed(&self.db, kind, id))
            .await
    }

    /// Archives an item.
    pub async fn archive(&self, role: Role, kind: ContentKind, id: i64) -> Result<ContentItem> {
        authorize(role, Operation::Archive)?;
        self.within(lifecycle::archive(&self.db, kind, id)).await
    }

    /// Unarchives an item.
    pub async fn unarchive(&self, role: Role, kind: ContentKind, id: i64) -> Result<ContentItem> {
        authorize(role, Operation::Unarchive)?;
        self.within(lifecycle::unarchive(&self.db, kind, id)).await
    }

    /// Submits a comment; public callers may only comment on published content.
    pub async fn add_comment(
        &self,
        role: Role,
        kind: ContentKind,
        parent_id: i64,
        new: NewComment,
    ) -> Result<i64> {
        authorize(role, Operation::AddComment)?;
        self.within(async {
            if role == Role::Public {
                self.visible_content(role, kind, parent_id, Operation::AddComment)
                    .await?;
            }
            comment::add_comment(&self.db, kind, parent_id, new).await
        })
        .await
    }

    /// Lists comments shaped for the caller's role.
    pub async fn list_comments(
        &self,
        role: Role,
        kind: ContentKind,
        parent_id: i64,
        page: PageRequest,
    ) -> Result<PageResult<CommentView>> {
        authorize(role, Operation::ReadComments)?;
        self.within(async {
            self.visible_content(role, kind, parent_id, Operation::ReadComments)
                .await?;
            comment::list_comments(&self.db, kind, parent_id, role.visibility(), page).await
        })
        .await
    }

    /// Counts comments the caller could list.
    pub async fn count_comments(&self, role: Role, kind: ContentKind, parent_id: i64) -> Result<u64> {
        authorize(role, Operation::ReadComments)?;
        self.within(async {
            self.visible_content(role, kind, parent_id, Operation::ReadComments)
                .await?;
            comment::count_comments(&self.db, kind, parent_id, role.visibility()).await
        })
        .await
    }

    /// Fetches one comment with its contact and approval state (admin only).
    pub async fn get_comment(
        &self,
        role: Role,
        kind: ContentKind,
        parent_id: i64,
        comment_id: i64,
    ) -> Result<Comment> {
        authorize(role, Operation::ModerateComment)?;
        self.within(comment::get_comment(&self.db, kind, parent_id, comment_id))
            .await?
            .ok_or(Error::NotFound {
                entity: "comment",
                id: comment_id,
            })
    }

    /// Flips a comment's approval and returns the new value.
    pub async fn toggle_approval(
        &self,
        role: Role,
        kind: ContentKind,
        parent_id: i64,
        comment_id: i64,
    ) -> Result<bool> {
        authorize(role, Operation::ModerateComment)?;
        self.within(comment::toggle_approval(&self.db, kind, parent_id, comment_id))
            .await
    }

    /// Approves or rejects a comment outright.
    pub async fn set_approved(
        &self,
        role: Role,
        kind: ContentKind,
        parent_id: i64,
        comment_id: i64,
        approved: bool,
    ) -> Result<()> {
        authorize(role, Operation::ModerateComment)?;
        self.within(comment::set_approved(
            &self.db, kind, parent_id, comment_id, approved,
        ))
        .await
    }
}
