use serde::Serialize;

/// Coarse classification shared by every use-case error.
/// Routes still match on concrete variants; the kind is what gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    StateConflict,
    RateLimit,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::StateConflict => "STATE_CONFLICT",
            ErrorKind::RateLimit => "RATE_LIMIT",
            ErrorKind::Storage => "STORAGE",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
