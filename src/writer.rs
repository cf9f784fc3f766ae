//! Output writer contract
//!
//! The polling agent drives every output backend through these four calls.
//! Each backend is a concrete implementer; there is no shared base state.

use async_trait::async_trait;

use crate::error::WriterResult;
use crate::model::{JmxResult, Query, Server};

/// Outcome of one `write` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Documents accepted by the backend
    pub written: usize,
    /// Documents the backend rejected
    pub failed: usize,
    /// Sub-values skipped because they were not numeric
    pub skipped: usize,
}

impl WriteReport {
    /// Merge another report into this one
    pub fn merge(&mut self, other: WriteReport) {
        self.written += other.written;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// A pluggable metric output destination
#[async_trait]
pub trait OutputWriter: Send {
    /// Prepare the destination. Errors are fatal for this writer.
    async fn start(&mut self) -> WriterResult<()>;

    /// Deliver one batch of results polled from `server` for `query`.
    async fn write(
        &mut self,
        server: &Server,
        query: &Query,
        results: &[JmxResult],
    ) -> WriterResult<WriteReport>;

    /// Release the destination. Calling it again is a no-op.
    async fn stop(&mut self) -> WriterResult<()>;

    /// Check that this writer can serve `query` on `server`.
    fn validate(&self, server: &Server, query: &Query) -> WriterResult<()>;
}
