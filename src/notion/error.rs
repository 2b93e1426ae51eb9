use thiserror::Error;

/// Failures talking to the Notion API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network failure, timeout, rate limit or server error
    #[error("API unavailable: {message}")]
    Unavailable { message: String },

    /// HTTP 401/403/404: bad token or the page is not shared with the integration
    #[error("permission denied (status {status}): {message}")]
    PermissionDenied { status: u16, message: String },

    /// HTTP 400/409/422: the request itself was refused
    #[error("request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// A 2xx response with a body we could not read
    #[error("could not decode response: {message}")]
    Decode { message: String },
}

impl ApiError {
    /// Map a non-success status and its body text
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 | 404 => ApiError::PermissionDenied { status, message },
            400 | 409 | 422 => ApiError::Rejected { status, message },
            _ => ApiError::Unavailable {
                message: format!("status {}: {}", status, message),
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        ApiError::Unavailable { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ApiError::from_status(401, "unauthorized"),
            ApiError::PermissionDenied { status: 401, .. }
        ));
        assert!(matches!(
            ApiError::from_status(404, "object_not_found"),
            ApiError::PermissionDenied { status: 404, .. }
        ));
        assert!(matches!(
            ApiError::from_status(400, "validation_error"),
            ApiError::Rejected { status: 400, .. }
        ));
        assert!(matches!(
            ApiError::from_status(429, "rate_limited"),
            ApiError::Unavailable { .. }
        ));
        assert!(matches!(
            ApiError::from_status(502, "bad gateway"),
            ApiError::Unavailable { .. }
        ));
    }
}
