//! Database configuration module for newsdesk.
//!
//! This module handles the database connection and table creation. Every
//! content kind gets three tables (items, comments, media) with identical
//! column sets, so the schema is generated from [`ContentKind`] descriptors
//! with `sea-query` table builders instead of one entity per table.

use crate::core::kind::ContentKind;
use crate::entities::{CommentColumn, ContentColumn, MediaColumn};
use crate::errors::Result;
use sea_orm::sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Index, Table};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection};
use tracing::{debug, info};

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

// SQLite only auto-increments an `integer` primary key; elsewhere ids are 64-bit.
fn id_column<T>(backend: DatabaseBackend, name: T) -> ColumnDef
where
    T: sea_orm::sea_query::IntoIden,
{
    let mut column = ColumnDef::new(name);
    if backend == DatabaseBackend::Sqlite {
        column.integer();
    } else {
        column.big_integer();
    }
    column.not_null().auto_increment().primary_key();
    column
}

/// Creates every kind's content, comment and media tables if missing.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();

    for kind in ContentKind::ALL {
        let content = Table::create()
            .table(kind.content_table())
            .if_not_exists()
            .col(&mut id_column(builder, ContentColumn::Id))
            .col(ColumnDef::new(ContentColumn::Title).text().not_null())
            .col(ColumnDef::new(ContentColumn::Body).text().not_null())
            .col(
                ColumnDef::new(ContentColumn::Archived)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(ContentColumn::Completed)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(ContentColumn::Expiration)
                    .timestamp_with_time_zone()
                    .null(),
            )
            .col(
                ColumnDef::new(ContentColumn::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(ContentColumn::UpdatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .to_owned();

        let comments = Table::create()
            .table(kind.comment_table())
            .if_not_exists()
            .col(&mut id_column(builder, CommentColumn::Id))
            .col(ColumnDef::new(CommentColumn::ParentId).big_integer().not_null())
            .col(ColumnDef::new(CommentColumn::Text).text().not_null())
            .col(ColumnDef::new(CommentColumn::Contact).text().null())
            .col(
                ColumnDef::new(CommentColumn::Approved)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(CommentColumn::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .foreign_key(
                ForeignKey::create()
                    .name(format!("fk_{}_parent", kind.comment_table_name()))
                    .from(kind.comment_table(), CommentColumn::ParentId)
                    .to(kind.content_table(), ContentColumn::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();

        let media = Table::create()
            .table(kind.media_table())
            .if_not_exists()
            .col(&mut id_column(builder, MediaColumn::Id))
            .col(ColumnDef::new(MediaColumn::ParentId).big_integer().not_null())
            .col(ColumnDef::new(MediaColumn::Url).text().not_null())
            .col(
                ColumnDef::new(MediaColumn::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .foreign_key(
                ForeignKey::create()
                    .name(format!("fk_{}_parent", kind.media_table_name()))
                    .from(kind.media_table(), MediaColumn::ParentId)
                    .to(kind.content_table(), ContentColumn::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();

        let comment_parent_index = Index::create()
            .if_not_exists()
            .name(format!("idx_{}_parent_id", kind.comment_table_name()))
            .table(kind.comment_table())
            .col(CommentColumn::ParentId)
            .to_owned();

        db.execute(builder.build(&content)).await?;
        db.execute(builder.build(&comments)).await?;
        db.execute(builder.build(&media)).await?;
        db.execute(builder.build(&comment_parent_index)).await?;
        debug!("Ensured tables for {}", kind);
    }

    info!("Database tables ensured for {} content kinds", ContentKind::ALL.len());
    Ok(())
}
