//! Shared test utilities for newsdesk.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test content with sensible defaults.

use crate::{
    core::{
        kind::ContentKind,
        lifecycle::{self, NewContent},
    },
    entities::ContentItem,
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test item with the given title.
///
/// # Defaults
/// * `body`: `"Test body"`
/// * `expiration`: None
pub async fn create_test_content(
    db: &DatabaseConnection,
    kind: ContentKind,
    title: &str,
) -> Result<ContentItem> {
    lifecycle::create_content(
        db,
        kind,
        NewContent {
            title: title.to_string(),
            body: "Test body".to_string(),
            expiration: None,
        },
        vec![],
    )
    .await
}

/// Creates a business post expiring at `expiration`.
pub async fn create_test_post(
    db: &DatabaseConnection,
    title: &str,
    expiration: DateTime<Utc>,
) -> Result<ContentItem> {
    lifecycle::create_content(
        db,
        ContentKind::BusinessPost,
        NewContent {
            title: title.to_string(),
            body: "Test promotion".to_string(),
            expiration: Some(expiration),
        },
        vec![],
    )
    .await
}

/// Sets up a complete test environment with one active, incomplete item.
/// Returns (db, item) for common test scenarios.
pub async fn setup_with_content(kind: ContentKind) -> Result<(DatabaseConnection, ContentItem)> {
    let db = setup_test_db().await?;
    let item = create_test_content(&db, kind, "Test Content").await?;
    Ok((db, item))
}
