//! Elasticsearch HTTP 클라이언트
//!
//! Connection pooling과 타임아웃을 지원하는 비동기 REST 클라이언트입니다.
//! 쓰기 경로는 `ElasticBackend` 트레이트에만 의존하므로 테스트에서는
//! 메모리 백엔드로 교체할 수 있습니다.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use super::document::Document;
use crate::config::ElasticWriterConfig;
use crate::error::BackendError;

/// 인덱스 생성 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateIndexOutcome {
    /// 새로 생성됨
    Created,
    /// 이미 존재함 (다른 프로세스가 먼저 생성)
    AlreadyExists,
}

/// 문서 저장소 백엔드
///
/// 존재 확인은 읽기 전용이며, 생성과 매핑 적용은 인덱스가 이미 있을 때
/// 멱등이어야 합니다.
#[async_trait]
pub trait ElasticBackend: Send + Sync {
    /// 인덱스 존재 여부 확인
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError>;

    /// 인덱스 생성
    async fn create_index(&self, index: &str) -> Result<CreateIndexOutcome, BackendError>;

    /// 타입 매핑 적용
    async fn put_mapping(
        &self,
        index: &str,
        type_name: &str,
        mapping: &Value,
    ) -> Result<(), BackendError>;

    /// 문서 하나 저장
    async fn index_document(
        &self,
        index: &str,
        type_name: &str,
        document: &Document,
    ) -> Result<(), BackendError>;

    /// 연결 해제
    async fn close(&self) {}
}

/// Elasticsearch REST 클라이언트
#[derive(Clone)]
pub struct ElasticClient {
    client: Client,
    base_url: String,
    auth: Option<(String, String)>,
}

impl ElasticClient {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `base_url` - Elasticsearch 엔드포인트 URL (예: "http://localhost:9200")
    /// * `timeout_ms` - 요청 타임아웃 (밀리초)
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, BackendError> {
        url::Url::parse(base_url).map_err(|e| BackendError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(BackendError::HttpClientInit)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: None,
        })
    }

    /// 설정으로부터 클라이언트 생성
    pub fn from_config(config: &ElasticWriterConfig) -> Result<Self, BackendError> {
        let mut client = Self::new(&config.connection_url, config.timeout_ms)?;
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            client = client.with_auth(username, password);
        }
        Ok(client)
    }

    /// Basic Auth 설정
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.auth = Some((username.to_string(), password.to_string()));
        self
    }

    /// 엔드포인트 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, BackendError> {
        let req = match &self.auth {
            Some((username, password)) => req.basic_auth(username, Some(password)),
            None => req,
        };

        Ok(req.send().await?)
    }
}

/// 실패 응답을 본문과 함께 에러로 변환
async fn status_error(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BackendError::HttpStatus { status, body }
}

#[async_trait]
impl ElasticBackend for ElasticClient {
    #[instrument(skip(self))]
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError> {
        let response = self.send(self.client.head(self.url(index))).await?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(response).await),
        }
    }

    #[instrument(skip(self))]
    async fn create_index(&self, index: &str) -> Result<CreateIndexOutcome, BackendError> {
        let response = self.send(self.client.put(self.url(index))).await?;

        if response.status().is_success() {
            debug!("Index created");
            return Ok(CreateIndexOutcome::Created);
        }

        let err = status_error(response).await;
        let already_exists = matches!(
            &err,
            BackendError::HttpStatus { status: 400, body }
                if body.contains("resource_already_exists_exception")
                    || body.contains("index_already_exists_exception")
        );

        if already_exists {
            debug!("Index already exists");
            return Ok(CreateIndexOutcome::AlreadyExists);
        }
        Err(err)
    }

    #[instrument(skip(self, mapping))]
    async fn put_mapping(
        &self,
        index: &str,
        type_name: &str,
        mapping: &Value,
    ) -> Result<(), BackendError> {
        let url = self.url(&format!("{}/_mapping/{}", index, type_name));
        let response = self.send(self.client.put(url).json(mapping)).await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    #[instrument(skip(self, document), fields(metric = %document.metric))]
    async fn index_document(
        &self,
        index: &str,
        type_name: &str,
        document: &Document,
    ) -> Result<(), BackendError> {
        let url = self.url(&format!("{}/{}", index, type_name));
        let response = self.send(self.client.post(url).json(document)).await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    async fn close(&self) {
        debug!(url = %self.base_url, "Closing Elasticsearch client");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = ElasticClient::new("http://localhost:9200/", 5000).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9200");
        assert_eq!(client.url("idx"), "http://localhost:9200/idx");
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        let result = ElasticClient::new("localhost without scheme", 5000);
        assert!(matches!(result, Err(BackendError::InvalidUrl { .. })));
    }

    #[test]
    fn test_client_from_config_with_auth() {
        let config = ElasticWriterConfig {
            username: Some("elastic".to_string()),
            password: Some("changeme".to_string()),
            ..Default::default()
        };
        let client = ElasticClient::from_config(&config).unwrap();
        assert!(client.auth.is_some());
    }
}
