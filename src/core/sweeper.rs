//! Expiry sweeper - archives time-bound content once its expiration passes.
//!
//! The sweep is timer-driven, never request-driven. Each run issues one bulk
//! `UPDATE ... WHERE expiration < now AND archived = false` per expiring kind,
//! all inside one transaction, so a failed run leaves nothing half-archived.
//! Items only ever move `Active -> Archived` here; a failed run is simply
//! picked up by the next tick because its guard condition still holds.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::{
    core::{kind::ContentKind, query::build},
    entities::ContentColumn,
    errors::{Error, Result},
};

/// Outcome of one sweep
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Items archived, per expiring kind
    pub archived: Vec<(ContentKind, u64)>,
}

impl SweepReport {
    /// Items archived across all kinds.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.archived.iter().map(|(_, n)| n).sum()
    }
}

/// Archives every expiring item whose `expiration` is before `now`.
#[instrument(skip(db))]
pub async fn sweep(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<SweepReport> {
    let txn = db.begin().await?;
    let mut report = SweepReport::default();

    for kind in ContentKind::ALL.into_iter().filter(|k| k.expires()) {
        let mut update = Query::update();
        update
            .table(kind.content_table())
            .value(ContentColumn::Archived, true)
            .and_where(Expr::col(ContentColumn::Expiration).is_not_null())
            .and_where(Expr::col(ContentColumn::Expiration).lt(now))
            .and_where(Expr::col(ContentColumn::Archived).eq(false));
        let archived = txn.execute(build(&txn, &update)).await?.rows_affected();
        debug!("Sweep archived {} expired {} items", archived, kind);
        report.archived.push((kind, archived));
    }

    txn.commit().await?;
    if report.total() > 0 {
        info!("Sweep archived {} expired items", report.total());
    }
    Ok(report)
}

/// Runs [`sweep`] every `interval` until `shutdown` resolves.
///
/// The first sweep happens immediately. When `deadline` is set, a sweep that
/// overruns it is abandoned and its transaction rolled back. A failed or
/// abandoned sweep is logged and left for the next tick.
pub async fn run_sweeper<F>(
    db: &DatabaseConnection,
    interval: Duration,
    deadline: Option<Duration>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!("Expiry sweeper running every {:?}", interval);
    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Expiry sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = sweep_within(db, Utc::now(), deadline).await {
                    error!("Sweep failed, retrying on next tick: {}", e);
                }
            }
        }
    }
}

async fn sweep_within(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    deadline: Option<Duration>,
) -> Result<SweepReport> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, sweep(db, now))
            .await
            .map_err(|_| Error::Timeout)?,
        None => sweep(db, now).await,
    }
}
