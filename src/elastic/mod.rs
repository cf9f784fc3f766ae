//! Elasticsearch output writer
//!
//! Flattens polled JMX results into one document per numeric sub-value and
//! indexes them one at a time.
//!
//! # Example
//!
//! ```ignore
//! use jmx_elastic_writer::config::ElasticWriterConfig;
//! use jmx_elastic_writer::elastic::ElasticWriter;
//! use jmx_elastic_writer::writer::OutputWriter;
//!
//! let mut writer = ElasticWriter::new(ElasticWriterConfig::default())?;
//! writer.start().await?;
//! let report = writer.write(&server, &query, &results).await?;
//! writer.stop().await?;
//! ```

mod client;
mod document;
mod schema;

pub use client::{CreateIndexOutcome, ElasticBackend, ElasticClient};
pub use document::{Document, Flattener, DOCUMENT_FIELDS};
pub use schema::{ensure_schema, Mapping, SchemaOutcome, MAPPING_RESOURCE};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::ElasticWriterConfig;
use crate::error::{SchemaError, WriterError, WriterResult};
use crate::model::{JmxResult, Query, Server};
use crate::writer::{OutputWriter, WriteReport};

/// Document type name used for the index and the mapping
pub const TYPE_NAME: &str = "jmx-entry";

/// Lifecycle state of a writer
enum State {
    Created,
    Started(Arc<dyn ElasticBackend>),
    Stopped,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Created => "created",
            State::Started(_) => "started",
            State::Stopped => "stopped",
        }
    }
}

/// Elasticsearch output writer
///
/// `Created → Started → Stopped`. Writes are only accepted while started.
pub struct ElasticWriter {
    config: ElasticWriterConfig,
    root_prefix: String,
    index_name: String,
    flattener: Flattener,
    injected: Option<Arc<dyn ElasticBackend>>,
    state: State,
}

impl ElasticWriter {
    /// Create a writer from configuration. No connection is made until `start`.
    pub fn new(config: ElasticWriterConfig) -> WriterResult<Self> {
        config.validate()?;

        let root_prefix = config.resolved_root_prefix();
        let index_name = config.index_name();
        let flattener = Flattener::new(root_prefix.clone())
            .with_boolean_as_number(config.boolean_as_number)
            .with_type_names(config.type_names.clone());

        Ok(Self {
            config,
            root_prefix,
            index_name,
            flattener,
            injected: None,
            state: State::Created,
        })
    }

    /// Use `backend` instead of building an HTTP client on start.
    pub fn with_backend(mut self, backend: Arc<dyn ElasticBackend>) -> Self {
        info!("Using injected backend instead of the default Elasticsearch client");
        self.injected = Some(backend);
        self
    }

    /// Resolved root prefix
    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    /// Destination index name
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Whether `start` has succeeded and `stop` has not been called
    pub fn is_started(&self) -> bool {
        matches!(self.state, State::Started(_))
    }

    fn connect(&mut self) -> Result<Arc<dyn ElasticBackend>, SchemaError> {
        if let Some(backend) = self.injected.take() {
            return Ok(backend);
        }

        info!(
            url = %self.config.connection_url,
            "Creating Elasticsearch client"
        );
        let client = ElasticClient::from_config(&self.config)?;
        Ok(Arc::new(client))
    }

    /// Index one document. Failures are logged with enough context to replay.
    async fn write_document(&self, backend: &dyn ElasticBackend, document: &Document) -> bool {
        if self.config.debug {
            info!(index = %self.index_name, type_name = TYPE_NAME, document = ?document, "Insert into Elastic");
        } else {
            debug!(index = %self.index_name, type_name = TYPE_NAME, document = ?document, "Insert into Elastic");
        }

        match backend
            .index_document(&self.index_name, TYPE_NAME, document)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                let payload =
                    serde_json::to_string(document).unwrap_or_else(|_| format!("{:?}", document));
                error!(
                    index = %self.index_name,
                    type_name = TYPE_NAME,
                    document = %payload,
                    error = %e,
                    "Failed to index document"
                );
                false
            }
        }
    }
}

#[async_trait]
impl OutputWriter for ElasticWriter {
    async fn start(&mut self) -> WriterResult<()> {
        if !matches!(self.state, State::Created) {
            return Err(WriterError::InvalidState {
                operation: "start",
                state: self.state.name(),
            });
        }

        let backend = match self.connect() {
            Ok(backend) => backend,
            Err(source) => {
                self.state = State::Stopped;
                return Err(WriterError::Lifecycle {
                    message: "Failed to create Elasticsearch client",
                    source,
                });
            }
        };

        if let Err(source) = ensure_schema(backend.as_ref(), &self.index_name, TYPE_NAME).await {
            self.state = State::Stopped;
            return Err(WriterError::Lifecycle {
                message: "Failed to create elastic mapping",
                source,
            });
        }

        info!(index = %self.index_name, "Elastic writer started");
        self.state = State::Started(backend);
        Ok(())
    }

    async fn write(
        &mut self,
        server: &Server,
        query: &Query,
        results: &[JmxResult],
    ) -> WriterResult<WriteReport> {
        let backend = match &self.state {
            State::Started(backend) => Arc::clone(backend),
            other => {
                return Err(WriterError::InvalidState {
                    operation: "write",
                    state: other.name(),
                })
            }
        };

        let mut report = WriteReport::default();

        for result in results {
            debug!(result = ?result, "Query result");
            report.skipped += self.flattener.count_skipped(result);

            for document in self.flattener.flatten(server, query, result) {
                if self.write_document(backend.as_ref(), &document).await {
                    report.written += 1;
                } else {
                    report.failed += 1;
                }
            }
        }

        if report.failed > 0 {
            tracing::warn!(
                index = %self.index_name,
                written = report.written,
                failed = report.failed,
                "Some documents were not indexed"
            );
        }

        Ok(report)
    }

    async fn stop(&mut self) -> WriterResult<()> {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Started(backend) => {
                backend.close().await;
                info!(index = %self.index_name, "Elastic writer stopped");
            }
            State::Created => debug!("Stop called before start, nothing to release"),
            State::Stopped => debug!("Writer already stopped"),
        }
        Ok(())
    }

    fn validate(&self, _server: &Server, _query: &Query) -> WriterResult<()> {
        Ok(())
    }
}

impl fmt::Display for ElasticWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ElasticWriter{{rootPrefix='{}', connectionUrl='{}', indexName='{}'}}",
            self.root_prefix, self.config.connection_url, self.index_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_names() {
        let config = ElasticWriterConfig {
            root_prefix: Some("jon.foo.bar".to_string()),
            ..Default::default()
        };
        let writer = ElasticWriter::new(config).unwrap();
        assert_eq!(writer.root_prefix(), "jon.foo.bar");
        assert_eq!(writer.index_name(), "jon.foo.bar_jmx-entries");
        assert!(!writer.is_started());
        assert_eq!(
            writer.to_string(),
            "ElasticWriter{rootPrefix='jon.foo.bar', connectionUrl='http://localhost:9200', indexName='jon.foo.bar_jmx-entries'}"
        );
    }

    #[test]
    fn test_writer_rejects_invalid_config() {
        let config = ElasticWriterConfig {
            connection_url: "nope".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ElasticWriter::new(config),
            Err(WriterError::Config(_))
        ));
    }

    #[test]
    fn test_validate_is_noop() {
        let writer = ElasticWriter::new(ElasticWriterConfig::default()).unwrap();
        let server = Server::new("w2", 1099);
        assert!(writer
            .validate(&server, &Query::new("java.lang:type=Memory"))
            .is_ok());
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let mut writer = ElasticWriter::new(ElasticWriterConfig::default()).unwrap();
        assert!(writer.stop().await.is_ok());
        assert!(writer.stop().await.is_ok());
        assert!(!writer.is_started());
    }

    #[tokio::test]
    async fn test_write_before_start_is_rejected() {
        let mut writer = ElasticWriter::new(ElasticWriterConfig::default()).unwrap();
        let result = writer
            .write(
                &Server::new("w2", 1099),
                &Query::new("java.lang:type=Memory"),
                &[],
            )
            .await;
        assert!(matches!(
            result,
            Err(WriterError::InvalidState {
                operation: "write",
                state: "created"
            })
        ));
    }
}
