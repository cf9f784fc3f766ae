//! 폴링 결과 평탄화
//!
//! 하나의 `JmxResult`를 숫자 하위 값마다 하나의 `Document`로 펼칩니다.
//! 숫자로 변환할 수 없는 값은 경고 로그를 남기고 건너뜁니다.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::warn;

use crate::model::{AttributeValue, JmxResult, Query, Server};
use crate::naming::{resolve_alias, resolve_metric_key};

/// 문서의 JSON 필드 이름 (번들 매핑과 정확히 일치해야 함)
pub const DOCUMENT_FIELDS: &[&str] = &[
    "server",
    "metric",
    "value",
    "resultAlias",
    "attributeName",
    "key",
    "timestamp",
];

/// Elasticsearch에 저장되는 평탄한 메트릭 문서
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// 서버 별칭
    pub server: String,
    /// 점으로 구분된 메트릭 키
    pub metric: String,
    /// 숫자 값
    pub value: f64,
    /// 결과 키 별칭 (없으면 null)
    pub result_alias: Option<String>,
    /// 속성 이름
    pub attribute_name: String,
    /// 하위 키
    pub key: String,
    /// 수집 시각 (Unix epoch, 밀리초)
    pub timestamp: i64,
}

/// 결과 평탄화기
#[derive(Debug, Clone)]
pub struct Flattener {
    root_prefix: String,
    boolean_as_number: bool,
    type_names: Vec<String>,
}

impl Flattener {
    /// 새 평탄화기 생성
    pub fn new(root_prefix: impl Into<String>) -> Self {
        Self {
            root_prefix: root_prefix.into(),
            boolean_as_number: false,
            type_names: Vec::new(),
        }
    }

    /// 불리언을 1/0으로 저장할지 설정
    pub fn with_boolean_as_number(mut self, enabled: bool) -> Self {
        self.boolean_as_number = enabled;
        self
    }

    /// 쿼리에 typeNames가 없을 때 사용할 기본값 설정
    pub fn with_type_names(mut self, type_names: Vec<String>) -> Self {
        self.type_names = type_names;
        self
    }

    /// 루트 접두사
    pub fn root_prefix(&self) -> &str {
        &self.root_prefix
    }

    /// 결과 하나를 문서 시퀀스로 변환 (지연 평가)
    ///
    /// 순서는 하위 키의 문자열 정렬 순서를 따릅니다.
    pub fn flatten<'a>(
        &'a self,
        server: &'a Server,
        query: &'a Query,
        result: &'a JmxResult,
    ) -> impl Iterator<Item = Document> + 'a {
        let alias = resolve_alias(server);
        let query = self.effective_query(query);

        result.values.iter().filter_map(move |(sub_key, raw)| {
            let Some(value) = raw.as_f64(self.boolean_as_number) else {
                warn!(
                    value = %raw,
                    attribute = %result.attribute_name,
                    key = %sub_key,
                    result = ?result,
                    "Unable to submit non-numeric value to Elastic"
                );
                return None;
            };

            Some(Document {
                server: alias.clone(),
                metric: resolve_metric_key(server, &query, result, sub_key, &self.root_prefix),
                value,
                result_alias: result.key_alias.clone(),
                attribute_name: result.attribute_name.clone(),
                key: sub_key.clone(),
                timestamp: result.epoch,
            })
        })
    }

    /// 숫자로 변환할 수 없는 하위 값 개수
    pub fn count_skipped(&self, result: &JmxResult) -> usize {
        result
            .values
            .values()
            .filter(|v| !is_numeric(v, self.boolean_as_number))
            .count()
    }

    fn effective_query<'q>(&self, query: &'q Query) -> Cow<'q, Query> {
        if query.type_names.is_empty() && !self.type_names.is_empty() {
            let mut owned = query.clone();
            owned.type_names = self.type_names.clone();
            Cow::Owned(owned)
        } else {
            Cow::Borrowed(query)
        }
    }
}

fn is_numeric(value: &AttributeValue, boolean_as_number: bool) -> bool {
    value.as_f64(boolean_as_number).is_some()
}
