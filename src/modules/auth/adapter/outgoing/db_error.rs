use sea_orm::DbErr;

/// Postgres failures the repositories react to. Everything else is reported
/// as a plain database error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbFault {
    /// 23505, with the message so callers can tell indexes apart.
    UniqueViolation(String),
    /// 23503
    ForeignKeyViolation,
    /// 40001 / 40P01: the transaction can be replayed.
    TransactionConflict,
    Other,
}

pub fn classify(e: &DbErr) -> DbFault {
    let msg = e.to_string().to_lowercase();

    if msg.contains("23505") || msg.contains("duplicate key") {
        return DbFault::UniqueViolation(msg);
    }
    if msg.contains("23503") || msg.contains("violates foreign key constraint") {
        return DbFault::ForeignKeyViolation;
    }
    if msg.contains("40001")
        || msg.contains("40p01")
        || msg.contains("could not serialize access")
        || msg.contains("deadlock detected")
    {
        return DbFault::TransactionConflict;
    }
    DbFault::Other
}
