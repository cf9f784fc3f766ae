//! Error types for jmx-elastic-writer
//!
//! This module defines the error types used throughout the writer.

use thiserror::Error;

/// Elasticsearch 백엔드 호출 에러
#[derive(Error, Debug)]
pub enum BackendError {
    /// HTTP 클라이언트 초기화 실패
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// 잘못된 접속 URL
    #[error("Invalid connection url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP 요청 실패
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// 타임아웃
    #[error("Request timed out")]
    Timeout,

    /// 연결 실패
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP 상태 코드 에러 (응답 본문 포함)
    #[error("HTTP error status {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

impl BackendError {
    /// HTTP 상태 코드 추출
    pub fn http_status(&self) -> Option<u16> {
        match self {
            BackendError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_connect() {
            BackendError::ConnectionFailed(err.to_string())
        } else {
            BackendError::HttpRequest(err)
        }
    }
}

/// Schema bootstrap errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Backend call failed during bootstrap
    #[error("Backend error during schema bootstrap: {0}")]
    Backend(#[from] BackendError),

    /// Index was created but the mapping was rejected
    #[error("Failed to create mapping for index '{index}': {source}")]
    MappingRejected {
        index: String,
        #[source]
        source: BackendError,
    },

    /// The bundled mapping resource is not valid JSON
    #[error("Bundled mapping is not valid JSON: {0}")]
    InvalidMapping(String),

    /// The bundled mapping does not describe the document fields
    #[error("Bundled mapping does not match document fields: missing {missing:?}, unexpected {unexpected:?}")]
    MappingDrift {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

/// Writer lifecycle and write errors
#[derive(Error, Debug)]
pub enum WriterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Startup failed; the writer never becomes usable
    #[error("{message}: {source}")]
    Lifecycle {
        message: &'static str,
        #[source]
        source: SchemaError,
    },

    /// A lifecycle call was made in the wrong state
    #[error("Invalid writer state: {operation} is not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

/// Result type alias for writer errors
pub type WriterResult<T> = Result<T, WriterError>;
