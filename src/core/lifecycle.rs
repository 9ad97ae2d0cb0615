//! Content lifecycle - authoring, archival and the mutation guard.
//!
//! An item is either `Active` or `Archived`; `completed` is an independent
//! flag. While archived, every mutation (edit, delete, add media, toggle
//! completed, archive) is refused until the item is explicitly unarchived.
//! Each operation checks existence, then state, and performs its write in the
//! same database transaction; the write itself is additionally filtered on
//! `archived = false` so a concurrent archive cannot slip in between.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Order, Query, SelectStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult, TransactionTrait};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    core::{
        kind::ContentKind,
        pager::{PageRequest, PageResult},
        query::{build, count_rows, insert_returning_id, lock_for_update},
    },
    entities::{CommentColumn, ContentColumn, ContentItem, Media, MediaColumn},
    errors::{Error, Result},
};

/// Position of an item on the archival axis
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Mutable
    Active,
    /// Frozen until unarchived
    Archived,
}

impl From<&ContentItem> for LifecycleState {
    fn from(item: &ContentItem) -> Self {
        if item.archived {
            Self::Archived
        } else {
            Self::Active
        }
    }
}

/// Fields for a new content item
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewContent {
    /// Headline, required
    pub title: String,
    /// Body text
    #[serde(default)]
    pub body: String,
    /// Only accepted for kinds that expire
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

/// Partial edit of a content item; `None` leaves a field untouched
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContentPatch {
    /// New headline
    pub title: Option<String>,
    /// New body text
    pub body: Option<String>,
    /// New expiration (expiring kinds only)
    pub expiration: Option<DateTime<Utc>>,
    /// Drop the expiration so the item is never swept
    #[serde(default)]
    pub clear_expiration: bool,
}

impl ContentPatch {
    const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.expiration.is_none()
            && !self.clear_expiration
    }
}

/// A media file to attach, already stored by the upload layer
#[derive(Clone, Debug, Deserialize)]
pub struct NewMedia {
    /// Stored location
    pub url: String,
}

impl NewMedia {
    /// Wraps a stored location.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Which items a listing returns
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContentFilter {
    /// Every item regardless of state (admin)
    All,
    /// Only non-archived, completed items (public)
    Published,
}

fn not_found(kind: ContentKind, id: i64) -> Error {
    Error::NotFound {
        entity: kind.label(),
        id,
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("Title cannot be empty"));
    }
    Ok(())
}

fn validate_expiration(kind: ContentKind, expiration: Option<DateTime<Utc>>) -> Result<()> {
    if expiration.is_some() && !kind.expires() {
        return Err(Error::validation(format!(
            "Content kind '{kind}' does not support an expiration"
        )));
    }
    Ok(())
}

fn validate_media(media: &[NewMedia]) -> Result<()> {
    if media.iter().any(|m| m.url.trim().is_empty()) {
        return Err(Error::validation("Media location cannot be empty"));
    }
    Ok(())
}

async fn find_content<C: ConnectionTrait>(
    db: &C,
    kind: ContentKind,
    id: i64,
    for_update: bool,
) -> Result<Option<ContentItem>> {
    let mut query = Query::select();
    query
        .columns(ContentColumn::ALL)
        .from(kind.content_table())
        .and_where(Expr::col(ContentColumn::Id).eq(id));
    if for_update {
        lock_for_update(db, &mut query);
    }
    ContentItem::find_by_statement(build(db, &query))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an item for a write, failing with `NotFound` if it does not exist.
pub(crate) async fn require_content<C: ConnectionTrait>(
    db: &C,
    kind: ContentKind,
    id: i64,
) -> Result<ContentItem> {
    find_content(db, kind, id, true)
        .await?
        .ok_or_else(|| not_found(kind, id))
}

/// Refuses any mutation of an archived item.
pub fn guard_mutable(item: &ContentItem) -> Result<()> {
    match LifecycleState::from(item) {
        LifecycleState::Active => Ok(()),
        LifecycleState::Archived => Err(Error::invalid_state("cannot mutate archived content")),
    }
}

/// Existence check followed by the archived-state check, in that order.
///
/// Call this inside the transaction that performs the mutating write.
pub async fn check_mutable<C: ConnectionTrait>(
    db: &C,
    kind: ContentKind,
    id: i64,
) -> Result<ContentItem> {
    let item = require_content(db, kind, id).await?;
    guard_mutable(&item).inspect_err(|_| {
        warn!("Refusing to mutate archived {} {}", kind, id);
    })?;
    Ok(item)
}

async fn insert_media<C: ConnectionTrait>(
    db: &C,
    kind: ContentKind,
    parent_id: i64,
    media: &[NewMedia],
    now: DateTime<Utc>,
) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(media.len());
    for item in media {
        let mut insert = Query::insert();
        insert
            .into_table(kind.media_table())
            .columns([MediaColumn::ParentId, MediaColumn::Url, MediaColumn::CreatedAt])
            .values_panic([parent_id.into(), item.url.trim().into(), now.into()])
            .returning_col(MediaColumn::Id);
        ids.push(insert_returning_id(db, &insert).await?);
    }
    Ok(ids)
}

/// Creates an item together with its media in one transaction.
///
/// This is the authoring entry point for every kind. Either the item and every
/// media row are stored, or nothing is; new items start active and incomplete,
/// so they stay hidden from the public until someone marks them completed.
pub async fn create_content(
    db: &DatabaseConnection,
    kind: ContentKind,
    new: NewContent,
    media: Vec<NewMedia>,
) -> Result<ContentItem> {
    validate_title(&new.title)?;
    validate_expiration(kind, new.expiration)?;
    validate_media(&media)?;

    let now = Utc::now();
    let txn = db.begin().await?;

    let mut insert = Query::insert();
    insert
        .into_table(kind.content_table())
        .columns([
            ContentColumn::Title,
            ContentColumn::Body,
            ContentColumn::Archived,
            ContentColumn::Completed,
            ContentColumn::Expiration,
            ContentColumn::CreatedAt,
            ContentColumn::UpdatedAt,
        ])
        .values_panic([
            new.title.trim().into(),
            new.body.into(),
            false.into(),
            false.into(),
            new.expiration.into(),
            now.into(),
            now.into(),
        ])
        .returning_col(ContentColumn::Id);
    let id = insert_returning_id(&txn, &insert).await?;

    insert_media(&txn, kind, id, &media, now).await?;

    let item = find_content(&txn, kind, id, false)
        .await?
        .ok_or_else(|| not_found(kind, id))?;
    txn.commit().await?;

    info!("Created {} {} with {} media", kind, id, media.len());
    Ok(item)
}

/// Fetches an item by id, `None` if it does not exist.
pub async fn get_content(
    db: &DatabaseConnection,
    kind: ContentKind,
    id: i64,
) -> Result<Option<ContentItem>> {
    find_content(db, kind, id, false).await
}

fn apply_filter(query: &mut SelectStatement, filter: ContentFilter) {
    if filter == ContentFilter::Published {
        query
            .and_where(Expr::col(ContentColumn::Archived).eq(false))
            .and_where(Expr::col(ContentColumn::Completed).eq(true));
    }
}

/// Lists items newest first.
///
/// Admin screens use [`ContentFilter::All`]; public listings pass
/// [`ContentFilter::Published`] so archived and unfinished items never show.
pub async fn list_content(
    db: &DatabaseConnection,
    kind: ContentKind,
    filter: ContentFilter,
    page: PageRequest,
) -> Result<PageResult<ContentItem>> {
    let mut query = Query::select();
    query
        .columns(ContentColumn::ALL)
        .from(kind.content_table())
        .order_by(ContentColumn::Id, Order::Desc)
        .limit(page.limit())
        .offset(page.offset());
    apply_filter(&mut query, filter);
    let items = ContentItem::find_by_statement(build(db, &query))
        .all(db)
        .await?;

    let mut count = Query::select();
    count.from(kind.content_table());
    apply_filter(&mut count, filter);
    let total = count_rows(db, &mut count, ContentColumn::Id).await?;

    debug!("Listed {} of {} {} items", items.len(), total, kind);
    Ok(PageResult::new(items, page, total))
}

async fn set_archived(
    db: &DatabaseConnection,
    kind: ContentKind,
    id: i64,
    archived: bool,
) -> Result<ContentItem> {
    let reason = if archived {
        "already archived"
    } else {
        "not archived"
    };

    let txn = db.begin().await?;
    let item = require_content(&txn, kind, id).await?;
    if item.archived == archived {
        warn!("Refusing to change archival of {} {}: {}", kind, id, reason);
        return Err(Error::invalid_state(reason));
    }

    let mut update = Query::update();
    update
        .table(kind.content_table())
        .value(ContentColumn::Archived, archived)
        .and_where(Expr::col(ContentColumn::Id).eq(id))
        .and_where(Expr::col(ContentColumn::Archived).eq(!archived));
    let result = txn.execute(build(&txn, &update)).await?;
    if result.rows_affected() == 0 {
        return Err(Error::invalid_state(reason));
    }
    txn.commit().await?;

    info!(
        "{} {} {}",
        if archived { "Archived" } else { "Unarchived" },
        kind,
        id
    );
    Ok(ContentItem { archived, ..item })
}

/// Moves an active item to `Archived`, hiding it from the public.
///
/// Archiving an already archived item is an `InvalidState` error and writes
/// nothing. `updated_at` is left alone since this is not an edit.
pub async fn archive(db: &DatabaseConnection, kind: ContentKind, id: i64) -> Result<ContentItem> {
    set_archived(db, kind, id, true).await
}

/// Brings an archived item back to `Active`.
///
/// Used by admins to relist content, including business posts the sweeper
/// archived; a post that is still past its expiration is archived again on
/// the next sweep.
pub async fn unarchive(db: &DatabaseConnection, kind: ContentKind, id: i64) -> Result<ContentItem> {
    set_archived(db, kind, id, false).await
}

/// Flips the `completed` flag of an active item.
///
/// Completion is what publishes an item to the public, so this is the usual
/// last step of authoring. Archived items are refused.
pub async fn toggle_completed(
    db: &DatabaseConnection,
    kind: ContentKind,
    id: i64,
) -> Result<ContentItem> {
    let txn = db.begin().await?;
    let item = check_mutable(&txn, kind, id).await?;
    let completed = !item.completed;
    let now = Utc::now();

    let mut update = Query::update();
    update
        .table(kind.content_table())
        .values([
            (ContentColumn::Completed, completed.into()),
            (ContentColumn::UpdatedAt, now.into()),
        ])
        .and_where(Expr::col(ContentColumn::Id).eq(id))
        .and_where(Expr::col(ContentColumn::Archived).eq(false));
    if txn.execute(build(&txn, &update)).await?.rows_affected() == 0 {
        return Err(Error::invalid_state("cannot mutate archived content"));
    }
    txn.commit().await?;

    info!("Set completed={} on {} {}", completed, kind, id);
    Ok(ContentItem {
        completed,
        updated_at: now,
        ..item
    })
}

/// Edits an active item; nothing is written if it is archived.
///
/// Only the fields set in `patch` change. `clear_expiration` removes a
/// business post's expiration so the sweeper no longer touches it.
pub async fn update_content(
    db: &DatabaseConnection,
    kind: ContentKind,
    id: i64,
    patch: ContentPatch,
) -> Result<ContentItem> {
    if patch.is_empty() {
        return Err(Error::validation("Nothing to update"));
    }
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    validate_expiration(kind, patch.expiration)?;
    if patch.clear_expiration && patch.expiration.is_some() {
        return Err(Error::validation(
            "Cannot set and clear the expiration in one update",
        ));
    }

    let txn = db.begin().await?;
    check_mutable(&txn, kind, id).await?;

    let mut update = Query::update();
    update
        .table(kind.content_table())
        .value(ContentColumn::UpdatedAt, Utc::now())
        .and_where(Expr::col(ContentColumn::Id).eq(id))
        .and_where(Expr::col(ContentColumn::Archived).eq(false));
    if let Some(title) = patch.title {
        update.value(ContentColumn::Title, title.trim());
    }
    if let Some(body) = patch.body {
        update.value(ContentColumn::Body, body);
    }
    if let Some(expiration) = patch.expiration {
        update.value(ContentColumn::Expiration, expiration);
    } else if patch.clear_expiration {
        update.value(ContentColumn::Expiration, Option::<DateTime<Utc>>::None);
    }
    if txn.execute(build(&txn, &update)).await?.rows_affected() == 0 {
        return Err(Error::invalid_state("cannot mutate archived content"));
    }

    let item = find_content(&txn, kind, id, false)
        .await?
        .ok_or_else(|| not_found(kind, id))?;
    txn.commit().await?;

    info!("Updated {} {}", kind, id);
    Ok(item)
}

/// Deletes an active item along with its media and comments.
pub async fn delete_content(db: &DatabaseConnection, kind: ContentKind, id: i64) -> Result<()> {
    let txn = db.begin().await?;
    check_mutable(&txn, kind, id).await?;

    let mut media = Query::delete();
    media
        .from_table(kind.media_table())
        .and_where(Expr::col(MediaColumn::ParentId).eq(id));
    let media_removed = txn.execute(build(&txn, &media)).await?.rows_affected();

    let mut comments = Query::delete();
    comments
        .from_table(kind.comment_table())
        .and_where(Expr::col(CommentColumn::ParentId).eq(id));
    let comments_removed = txn.execute(build(&txn, &comments)).await?.rows_affected();

    let mut item = Query::delete();
    item.from_table(kind.content_table())
        .and_where(Expr::col(ContentColumn::Id).eq(id))
        .and_where(Expr::col(ContentColumn::Archived).eq(false));
    if txn.execute(build(&txn, &item)).await?.rows_affected() == 0 {
        return Err(Error::invalid_state("cannot mutate archived content"));
    }
    txn.commit().await?;

    info!(
        "Deleted {} {} ({} media, {} comments)",
        kind, id, media_removed, comments_removed
    );
    Ok(())
}

/// Attaches media to an active item in one transaction.
pub async fn add_media(
    db: &DatabaseConnection,
    kind: ContentKind,
    id: i64,
    media: Vec<NewMedia>,
) -> Result<Vec<i64>> {
    if media.is_empty() {
        return Err(Error::validation("No media given"));
    }
    validate_media(&media)?;

    let now = Utc::now();
    let txn = db.begin().await?;
    check_mutable(&txn, kind, id).await?;

    let ids = insert_media(&txn, kind, id, &media, now).await?;

    let mut touch = Query::update();
    touch
        .table(kind.content_table())
        .value(ContentColumn::UpdatedAt, now)
        .and_where(Expr::col(ContentColumn::Id).eq(id))
        .and_where(Expr::col(ContentColumn::Archived).eq(false));
    if txn.execute(build(&txn, &touch)).await?.rows_affected() == 0 {
        return Err(Error::invalid_state("cannot mutate archived content"));
    }
    txn.commit().await?;

    info!("Attached {} media to {} {}", ids.len(), kind, id);
    Ok(ids)
}

/// Media attached to an item, oldest first.
pub async fn list_media(db: &DatabaseConnection, kind: ContentKind, id: i64) -> Result<Vec<Media>> {
    let mut query = Query::select();
    query
        .columns([
            MediaColumn::Id,
            MediaColumn::ParentId,
            MediaColumn::Url,
            MediaColumn::CreatedAt,
        ])
        .from(kind.media_table())
        .and_where(Expr::col(MediaColumn::ParentId).eq(id))
        .order_by(MediaColumn::Id, Order::Asc);
    Media::find_by_statement(build(db, &query))
        .all(db)
        .await
        .map_err(Into::into)
}
