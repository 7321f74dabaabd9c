use axum::http::StatusCode;
use thiserror::Error;

/// Failures from the model service, classified by how they surface to the
/// user. None of these are retried.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("no OpenAI API key is configured")]
    MissingApiKey,
    #[error("the configured OpenAI API key was rejected")]
    InvalidApiKey,
    #[error("too many requests to the model service; wait a moment and retry")]
    RateLimited,
    #[error("model service failure (status {0})")]
    Upstream(u16),
    #[error("could not reach the model service")]
    Network(#[source] reqwest::Error),
    #[error("the model returned an empty response")]
    EmptyResponse,
    #[error("the model response could not be interpreted")]
    Unparsable,
}

impl AiError {
    pub fn status(&self) -> StatusCode {
        match self {
            AiError::MissingApiKey => StatusCode::BAD_REQUEST,
            AiError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AiError::Upstream(_)
            | AiError::Network(_)
            | AiError::EmptyResponse
            | AiError::Unparsable => StatusCode::BAD_GATEWAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_failure_maps_to_its_own_surface() {
        assert_eq!(AiError::MissingApiKey.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AiError::InvalidApiKey.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AiError::Upstream(500).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(AiError::Unparsable.status(), StatusCode::BAD_GATEWAY);
    }
}
