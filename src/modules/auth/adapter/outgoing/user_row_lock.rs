use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseTransaction, DbErr, Statement};
use uuid::Uuid;

/// Row lock on the account, taken as the first statement of every
/// transaction that writes `users.is_active`.
///
/// A concurrent writer blocks here until the holder commits, and under
/// READ COMMITTED each later statement then reads a fresh snapshot that
/// includes the holder's `pending_deletions` change. `NO KEY UPDATE` leaves
/// the foreign-key share locks taken by token inserts unblocked.
pub(super) fn lock_user_stmt(user_id: Uuid) -> Statement {
    Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        r#"
        SELECT id
        FROM users
        WHERE id = $1
        FOR NO KEY UPDATE
        "#,
        vec![user_id.into()],
    )
}

/// Returns `false` when the account row does not exist.
pub(super) async fn lock_user_row(
    txn: &DatabaseTransaction,
    user_id: Uuid,
) -> Result<bool, DbErr> {
    Ok(txn.query_one(lock_user_stmt(user_id)).await?.is_some())
}
