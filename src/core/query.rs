//! Statement helpers shared by the per-kind engines.

use sea_orm::sea_query::{
    Alias, Expr, Func, InsertStatement, IntoColumnRef, LockType, SelectStatement,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement, StatementBuilder};

use crate::errors::Result;

/// Builds a statement for whichever backend `db` talks to.
pub(crate) fn build<C, S>(db: &C, statement: &S) -> Statement
where
    C: ConnectionTrait,
    S: StatementBuilder,
{
    db.get_database_backend().build(statement)
}

/// Adds `FOR UPDATE` where the backend supports row locks.
/// SQLite serializes writers per database, so it needs none.
pub(crate) fn lock_for_update<C: ConnectionTrait>(db: &C, query: &mut SelectStatement) {
    if db.get_database_backend() != DatabaseBackend::Sqlite {
        query.lock(LockType::Update);
    }
}

/// Runs an `INSERT ... RETURNING id` and yields the new id.
pub(crate) async fn insert_returning_id<C: ConnectionTrait>(
    db: &C,
    insert: &InsertStatement,
) -> Result<i64> {
    let row = db
        .query_one(build(db, insert))
        .await?
        .ok_or(DbErr::RecordNotInserted)?;
    Ok(row.try_get::<i64>("", "id")?)
}

/// Counts rows of `table` matching the filters already placed on `query`'s
/// WHERE clause. `query` must only carry the table and conditions.
pub(crate) async fn count_rows<C, T>(db: &C, query: &mut SelectStatement, id_column: T) -> Result<u64>
where
    C: ConnectionTrait,
    T: IntoColumnRef,
{
    query.expr_as(Func::count(Expr::col(id_column)), Alias::new("count"));
    let count = match db.query_one(build(db, &*query)).await? {
        Some(row) => row.try_get::<i64>("", "count")?,
        None => 0,
    };
    Ok(u64::try_from(count).unwrap_or_default())
}
