/// Domain-level failures.
///
/// These are reported to clients inside a normal JSON body carrying a
/// numeric `status` field (see [`CoreError::status_code`]), not as HTTP
/// error statuses. `Internal` is the exception and always becomes a 500.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A user or other top-level record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An owned resource (dashboard, source) does not exist for the caller.
    /// Reported with 409 to stay compatible with existing clients.
    #[error("{0}")]
    Missing(String),

    /// A name or identity is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Credentials did not match.
    #[error("{0}")]
    Unauthorized(String),

    /// A single-use credential was already consumed or never issued.
    #[error("{0}")]
    Expired(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The status code embedded in the response body for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::NotFound(_) => 404,
            CoreError::Missing(_) | CoreError::Conflict(_) => 409,
            CoreError::Unauthorized(_) => 401,
            CoreError::Expired(_) => 410,
            CoreError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_kind() {
        assert_eq!(CoreError::NotFound("x".into()).status_code(), 404);
        assert_eq!(CoreError::Missing("x".into()).status_code(), 409);
        assert_eq!(CoreError::Conflict("x".into()).status_code(), 409);
        assert_eq!(CoreError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(CoreError::Expired("x".into()).status_code(), 410);
        assert_eq!(CoreError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn display_is_the_bare_message() {
        let err = CoreError::Conflict("A source with that name already exists.".into());
        assert_eq!(err.to_string(), "A source with that name already exists.");
    }
}
