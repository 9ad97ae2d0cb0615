//! Comment store - one generic engine over every kind's comment table.
//!
//! New comments start unapproved. Public readers only ever see approved
//! comments, reduced to `id`, `text` and `created_at`; admins see everything.
//! `approved` is the only field that changes after creation.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Order, Query, SelectStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult, TransactionTrait};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    core::{
        kind::ContentKind,
        lifecycle::require_content,
        pager::{PageRequest, PageResult},
        query::{build, count_rows, insert_returning_id, lock_for_update},
    },
    entities::{Comment, CommentColumn, CommentView, PublicComment},
    errors::{Error, Result},
};

/// Which comments, and which fields, a reader gets
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Every comment with every field
    Admin,
    /// Approved comments only, without contact or approval state
    Public,
}

/// A comment as submitted by a reader
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewComment {
    /// Comment body, required
    pub text: String,
    /// Optional free-text contact
    #[serde(default)]
    pub contact: Option<String>,
}

impl NewComment {
    /// A comment with no contact.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            contact: None,
        }
    }

    /// Sets the contact field.
    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }
}

const COMMENT_COLUMNS: [CommentColumn; 6] = [
    CommentColumn::Id,
    CommentColumn::ParentId,
    CommentColumn::Text,
    CommentColumn::Contact,
    CommentColumn::Approved,
    CommentColumn::CreatedAt,
];

fn comment_not_found(comment_id: i64) -> Error {
    Error::NotFound {
        entity: "comment",
        id: comment_id,
    }
}

fn apply_visibility(
    query: &mut SelectStatement,
    kind: ContentKind,
    parent_id: i64,
    visibility: Visibility,
) {
    query
        .from(kind.comment_table())
        .and_where(Expr::col(CommentColumn::ParentId).eq(parent_id));
    if visibility == Visibility::Public {
        query.and_where(Expr::col(CommentColumn::Approved).eq(true));
    }
}

/// Adds an unapproved comment to a non-archived item and returns its id.
///
/// This is what a reader's comment form ends up calling. The parent is looked
/// up inside the insert's transaction; a missing or archived parent is
/// `NotFound`, and blank contact details are stored as absent.
pub async fn add_comment(
    db: &DatabaseConnection,
    kind: ContentKind,
    parent_id: i64,
    comment: NewComment,
) -> Result<i64> {
    if comment.text.trim().is_empty() {
        return Err(Error::validation("Comment text cannot be empty"));
    }
    let contact = comment
        .contact
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let txn = db.begin().await?;
    let parent = require_content(&txn, kind, parent_id).await?;
    if parent.archived {
        warn!("Comment rejected: {} {} is archived", kind, parent_id);
        return Err(Error::NotFound {
            entity: kind.label(),
            id: parent_id,
        });
    }

    let mut insert = Query::insert();
    insert
        .into_table(kind.comment_table())
        .columns([
            CommentColumn::ParentId,
            CommentColumn::Text,
            CommentColumn::Contact,
            CommentColumn::Approved,
            CommentColumn::CreatedAt,
        ])
        .values_panic([
            parent_id.into(),
            comment.text.into(),
            contact.into(),
            false.into(),
            Utc::now().into(),
        ])
        .returning_col(CommentColumn::Id);
    let id = insert_returning_id(&txn, &insert).await?;
    txn.commit().await?;

    info!("New comment {} on {} {} awaiting approval", id, kind, parent_id);
    Ok(id)
}

/// Lists comments on an item newest first, filtered and shaped by `visibility`.
///
/// Moderators pass [`Visibility::Admin`] to review the queue with contact and
/// approval state. Public pages pass [`Visibility::Public`] and only ever get
/// approved comments as [`PublicComment`]s.
pub async fn list_comments(
    db: &DatabaseConnection,
    kind: ContentKind,
    parent_id: i64,
    visibility: Visibility,
    page: PageRequest,
) -> Result<PageResult<CommentView>> {
    let mut query = Query::select();
    apply_visibility(&mut query, kind, parent_id, visibility);
    query
        .order_by(CommentColumn::Id, Order::Desc)
        .limit(page.limit())
        .offset(page.offset());

    let items: Vec<CommentView> = match visibility {
        Visibility::Admin => {
            query.columns(COMMENT_COLUMNS);
            Comment::find_by_statement(build(db, &query))
                .all(db)
                .await?
                .into_iter()
                .map(CommentView::Full)
                .collect()
        }
        Visibility::Public => {
            query.columns([CommentColumn::Id, CommentColumn::Text, CommentColumn::CreatedAt]);
            PublicComment::find_by_statement(build(db, &query))
                .all(db)
                .await?
                .into_iter()
                .map(CommentView::Public)
                .collect()
        }
    };

    let total = count_comments(db, kind, parent_id, visibility).await?;
    debug!(
        "Listed {} of {} comments on {} {} ({:?})",
        items.len(),
        total,
        kind,
        parent_id,
        visibility
    );
    Ok(PageResult::new(items, page, total))
}

/// Counts comments on an item with the same filter as [`list_comments`].
pub async fn count_comments<C: ConnectionTrait>(
    db: &C,
    kind: ContentKind,
    parent_id: i64,
    visibility: Visibility,
) -> Result<u64> {
    let mut query = Query::select();
    apply_visibility(&mut query, kind, parent_id, visibility);
    count_rows(db, &mut query, CommentColumn::Id).await
}

async fn find_comment<C: ConnectionTrait>(
    db: &C,
    kind: ContentKind,
    parent_id: i64,
    comment_id: i64,
    for_update: bool,
) -> Result<Option<Comment>> {
    let mut query = Query::select();
    query
        .columns(COMMENT_COLUMNS)
        .from(kind.comment_table())
        .and_where(Expr::col(CommentColumn::Id).eq(comment_id))
        .and_where(Expr::col(CommentColumn::ParentId).eq(parent_id));
    if for_update {
        lock_for_update(db, &mut query);
    }
    Comment::find_by_statement(build(db, &query))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Fetches one comment with every field.
pub async fn get_comment(
    db: &DatabaseConnection,
    kind: ContentKind,
    parent_id: i64,
    comment_id: i64,
) -> Result<Option<Comment>> {
    find_comment(db, kind, parent_id, comment_id, false).await
}

async fn write_approval<C: ConnectionTrait>(
    db: &C,
    kind: ContentKind,
    comment_id: i64,
    approved: bool,
) -> Result<()> {
    let mut update = Query::update();
    update
        .table(kind.comment_table())
        .value(CommentColumn::Approved, approved)
        .and_where(Expr::col(CommentColumn::Id).eq(comment_id));
    db.execute(build(db, &update)).await?;
    Ok(())
}

/// Flips `approved` and returns the new value.
///
/// Calling it twice restores the original state. Use [`set_approved`] for
/// a one-way approve or reject.
pub async fn toggle_approval(
    db: &DatabaseConnection,
    kind: ContentKind,
    parent_id: i64,
    comment_id: i64,
) -> Result<bool> {
    let txn = db.begin().await?;
    let comment = find_comment(&txn, kind, parent_id, comment_id, true)
        .await?
        .ok_or_else(|| comment_not_found(comment_id))?;
    let approved = !comment.approved;
    write_approval(&txn, kind, comment_id, approved).await?;
    txn.commit().await?;

    info!(
        "Comment {} on {} {} approved={}",
        comment_id, kind, parent_id, approved
    );
    Ok(approved)
}

/// Sets `approved` to an explicit value. Setting the current value is a no-op.
pub async fn set_approved(
    db: &DatabaseConnection,
    kind: ContentKind,
    parent_id: i64,
    comment_id: i64,
    approved: bool,
) -> Result<()> {
    let txn = db.begin().await?;
    let comment = find_comment(&txn, kind, parent_id, comment_id, true)
        .await?
        .ok_or_else(|| comment_not_found(comment_id))?;
    if comment.approved != approved {
        write_approval(&txn, kind, comment_id, approved).await?;
    }
    txn.commit().await?;

    info!(
        "Comment {} on {} {} approved={}",
        comment_id, kind, parent_id, approved
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::lifecycle::archive;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    #[tokio::test]
    async fn test_add_comment_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = add_comment(&db, ContentKind::Article, 1, NewComment::new("")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = add_comment(&db, ContentKind::Article, 1, NewComment::new("  \n ")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_comment_requires_existing_active_parent() -> Result<()> {
        let (db, item) = setup_with_content(ContentKind::Article).await?;

        let missing = add_comment(&db, ContentKind::Article, item.id + 100, NewComment::new("hi")).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        archive(&db, ContentKind::Article, item.id).await?;
        let archived = add_comment(&db, ContentKind::Article, item.id, NewComment::new("hi")).await;
        assert!(matches!(archived, Err(Error::NotFound { .. })));
        assert_eq!(
            count_comments(&db, ContentKind::Article, item.id, Visibility::Admin).await?,
            0
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_new_comment_is_hidden_until_approved() -> Result<()> {
        let kind = ContentKind::Article;
        let (db, a1) = setup_with_content(kind).await?;

        let c1 = add_comment(&db, kind, a1.id, NewComment::new("hello")).await?;
        let stored = get_comment(&db, kind, a1.id, c1).await?.unwrap();
        assert!(!stored.approved);
        assert!(stored.contact.is_none());

        let public = list_comments(&db, kind, a1.id, Visibility::Public, PageRequest::new(1, 10)).await?;
        assert!(public.items.is_empty());
        assert_eq!(public.total, 0);

        let admin = list_comments(&db, kind, a1.id, Visibility::Admin, PageRequest::new(1, 10)).await?;
        assert_eq!(admin.items.len(), 1);
        assert_eq!(admin.items[0].id(), c1);

        assert!(toggle_approval(&db, kind, a1.id, c1).await?);

        let public = list_comments(&db, kind, a1.id, Visibility::Public, PageRequest::new(1, 10)).await?;
        assert_eq!(public.items.len(), 1);
        assert_eq!(public.items[0].text(), "hello");

        let json = serde_json::to_value(&public.items[0]).unwrap();
        let fields = json.as_object().unwrap();
        assert_eq!(fields["text"], "hello");
        assert!(!fields.contains_key("contact"));
        assert!(!fields.contains_key("approved"));
        assert!(!fields.contains_key("parent_id"));
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() -> Result<()> {
        let kind = ContentKind::VideoNews;
        let (db, item) = setup_with_content(kind).await?;
        let id = add_comment(&db, kind, item.id, NewComment::new("first")).await?;

        assert!(toggle_approval(&db, kind, item.id, id).await?);
        assert!(!toggle_approval(&db, kind, item.id, id).await?);
        assert!(!get_comment(&db, kind, item.id, id).await?.unwrap().approved);
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_approval_requires_matching_pair() -> Result<()> {
        let kind = ContentKind::Article;
        let db = setup_test_db().await?;
        let first = create_test_content(&db, kind, "First").await?;
        let second = create_test_content(&db, kind, "Second").await?;
        let id = add_comment(&db, kind, first.id, NewComment::new("on first")).await?;

        let wrong_parent = toggle_approval(&db, kind, second.id, id).await;
        assert!(matches!(wrong_parent, Err(Error::NotFound { entity: "comment", .. })));

        let missing = toggle_approval(&db, kind, first.id, id + 1).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        assert!(!get_comment(&db, kind, first.id, id).await?.unwrap().approved);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_approved_is_one_way() -> Result<()> {
        let kind = ContentKind::ENewspaper;
        let (db, item) = setup_with_content(kind).await?;
        let id = add_comment(&db, kind, item.id, NewComment::new("good read")).await?;

        set_approved(&db, kind, item.id, id, true).await?;
        set_approved(&db, kind, item.id, id, true).await?;
        assert!(get_comment(&db, kind, item.id, id).await?.unwrap().approved);

        set_approved(&db, kind, item.id, id, false).await?;
        assert!(!get_comment(&db, kind, item.id, id).await?.unwrap().approved);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_sees_contact_public_does_not() -> Result<()> {
        let kind = ContentKind::BusinessPost;
        let (db, item) = setup_with_content(kind).await?;
        let with_contact = add_comment(
            &db,
            kind,
            item.id,
            NewComment::new("Call me").with_contact(" reader@example.com "),
        )
        .await?;
        let blank_contact = add_comment(
            &db,
            kind,
            item.id,
            NewComment::new("No contact").with_contact("   "),
        )
        .await?;
        toggle_approval(&db, kind, item.id, with_contact).await?;

        let admin = list_comments(&db, kind, item.id, Visibility::Admin, PageRequest::default()).await?;
        assert_eq!(admin.total, 2);
        // newest first
        match (&admin.items[0], &admin.items[1]) {
            (CommentView::Full(newest), CommentView::Full(oldest)) => {
                assert_eq!(newest.id, blank_contact);
                assert!(newest.contact.is_none());
                assert!(!newest.approved);
                assert_eq!(oldest.contact.as_deref(), Some("reader@example.com"));
                assert!(oldest.approved);
            }
            other => panic!("expected full views, got {other:?}"),
        }

        let public = list_comments(&db, kind, item.id, Visibility::Public, PageRequest::default()).await?;
        assert_eq!(public.total, 1);
        assert!(matches!(&public.items[0], CommentView::Public(c) if c.id == with_contact));
        Ok(())
    }

    #[tokio::test]
    async fn test_comment_pagination() -> Result<()> {
        let kind = ContentKind::Article;
        let (db, item) = setup_with_content(kind).await?;
        let mut ids = Vec::new();
        for n in 0..5 {
            ids.push(add_comment(&db, kind, item.id, NewComment::new(format!("comment {n}"))).await?);
        }

        let page = list_comments(&db, kind, item.id, Visibility::Admin, PageRequest::new(2, 2)).await?;
        assert_eq!(page.total, 5);
        assert!(page.has_previous);
        assert!(page.has_next);
        let seen: Vec<i64> = page.items.iter().map(CommentView::id).collect();
        assert_eq!(seen, vec![ids[2], ids[1]]);

        let last = list_comments(&db, kind, item.id, Visibility::Admin, PageRequest::new(3, 2)).await?;
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_next);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_comments_with_oversized_paging() -> Result<()> {
        let kind = ContentKind::Article;
        let (db, item) = setup_with_content(kind).await?;
        let id = add_comment(&db, kind, item.id, NewComment::new("only one")).await?;
        toggle_approval(&db, kind, item.id, id).await?;

        let huge_limit = PageRequest::from_query(Some("1"), Some("18446744073709551615"));
        let admin = list_comments(&db, kind, item.id, Visibility::Admin, huge_limit).await?;
        assert_eq!(admin.items.len(), 1);
        assert!(!admin.has_next);

        let huge_page = PageRequest::from_query(Some("9223372036854775807"), Some("10"));
        let public = list_comments(&db, kind, item.id, Visibility::Public, huge_page).await?;
        assert!(public.items.is_empty());
        assert_eq!(public.total, 1);
        assert!(public.has_previous);
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_as_database_error() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_errors([DbErr::Custom("database is locked".to_string())])
            .into_connection();
        let result = add_comment(&db, ContentKind::Article, 1, NewComment::new("hello")).await;
        assert!(matches!(result, Err(Error::Database(_))));

        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_errors([DbErr::Custom("database is locked".to_string())])
            .into_connection();
        let result = toggle_approval(&db, ContentKind::Article, 1, 1).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
