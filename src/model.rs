//! 폴링 결과 모델
//!
//! 상위 수집기(poller)가 넘겨주는 `Server`, `Query`, `JmxResult` 타입입니다.
//! 이 크레이트는 이 값들을 읽기만 하며 소유하지 않습니다.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// 모니터링 대상 JVM 프로세스
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Server {
    /// 호스트명
    pub host: String,
    /// JMX 포트
    pub port: u16,
    /// 사람이 읽기 위한 별칭 (없으면 host_port에서 유도)
    #[serde(default)]
    pub alias: Option<String>,
}

impl Server {
    /// 별칭 없는 서버 생성
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            alias: None,
        }
    }

    /// 별칭 설정
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// 폴링 대상 MBean 쿼리
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Query {
    /// MBean ObjectName (예: "java.lang:type=Memory")
    pub obj: String,
    /// 메트릭 키에 포함할 ObjectName 속성 키 목록 (비어 있으면 전체)
    #[serde(default, alias = "typeNames")]
    pub type_names: Vec<String>,
    /// 키 세그먼트에서 '.'을 유지할지 여부
    #[serde(default, alias = "allowDottedKeys")]
    pub allow_dotted_keys: bool,
}

impl Query {
    /// ObjectName으로 쿼리 생성
    pub fn new(obj: impl Into<String>) -> Self {
        Self {
            obj: obj.into(),
            type_names: Vec::new(),
            allow_dotted_keys: false,
        }
    }

    /// typeNames 설정
    pub fn with_type_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// 파싱된 ObjectName 반환
    pub fn object_name(&self) -> Option<ObjectName> {
        ObjectName::parse(&self.obj)
    }
}

/// 한 번의 폴링 샘플
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JmxResult {
    /// 속성 이름 (예: "HeapMemoryUsage")
    pub attribute_name: String,
    /// MBean 클래스 이름
    #[serde(default)]
    pub class_name: Option<String>,
    /// ObjectName의 키 속성 문자열 (예: "type=Memory")
    #[serde(default)]
    pub type_name: Option<String>,
    /// 하위 키 -> 원시 값. 키 순서는 문자열 정렬 순서로 고정
    #[serde(default)]
    pub values: BTreeMap<String, AttributeValue>,
    /// 결과 키 별칭
    #[serde(default)]
    pub key_alias: Option<String>,
    /// 수집 시각 (Unix epoch, 밀리초)
    pub epoch: i64,
}

impl JmxResult {
    /// 값 없는 결과 생성
    pub fn new(attribute_name: impl Into<String>, epoch: i64) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            class_name: None,
            type_name: None,
            values: BTreeMap::new(),
            key_alias: None,
            epoch,
        }
    }

    /// 하위 값 추가
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// 키 별칭 설정
    pub fn with_key_alias(mut self, alias: impl Into<String>) -> Self {
        self.key_alias = Some(alias.into());
        self
    }
}

/// 개별 속성 값
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum AttributeValue {
    /// 정수
    Integer(i64),
    /// 실수
    Float(f64),
    /// 문자열
    String(String),
    /// 불리언
    Boolean(bool),
    /// Null
    Null,
    /// 중첩 객체
    Object(HashMap<String, AttributeValue>),
    /// 배열
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// 숫자로 변환 시도
    ///
    /// 문자열은 유한한 10진수로 파싱될 때만 숫자로 취급합니다.
    /// 불리언은 `boolean_as_number`가 켜져 있을 때 1.0/0.0이 됩니다.
    pub fn as_f64(&self, boolean_as_number: bool) -> Option<f64> {
        match self {
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::Float(f) if f.is_finite() => Some(*f),
            AttributeValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            AttributeValue::Boolean(b) if boolean_as_number => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Integer(i),
                None => n
                    .as_f64()
                    .map(AttributeValue::Float)
                    .unwrap_or_else(|| AttributeValue::String(n.to_string())),
            },
            Value::String(s) => AttributeValue::String(s),
            Value::Array(arr) => {
                AttributeValue::Array(arr.into_iter().map(AttributeValue::from).collect())
            }
            Value::Object(map) => AttributeValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, AttributeValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Integer(i64::from(v))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Boolean(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Boolean(b) => write!(f, "{}", b),
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::Object(map) => write!(f, "{{{} entries}}", map.len()),
            AttributeValue::Array(items) => write!(f, "[{} items]", items.len()),
        }
    }
}

/// MBean ObjectName 구조
///
/// 키 속성은 선언된 순서를 유지합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    /// 도메인 (예: "java.lang")
    pub domain: String,
    /// 속성 (예: [("type", "Memory")])
    pub properties: Vec<(String, String)>,
}

impl ObjectName {
    /// ObjectName 문자열 파싱
    ///
    /// # Limitations
    /// - Quoted values containing ',' are NOT supported
    pub fn parse(s: &str) -> Option<Self> {
        let (domain, props) = s.split_once(':')?;

        Some(Self {
            domain: domain.to_string(),
            properties: parse_key_properties(props),
        })
    }

    /// 키로 속성 값 조회
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// "type=Memory,name=heap" 형태의 키 속성 목록 파싱
pub fn parse_key_properties(s: &str) -> Vec<(String, String)> {
    s.split(',')
        .filter_map(|prop| prop.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_name_parse_keeps_order() {
        let name =
            ObjectName::parse("java.lang:type=GarbageCollector,name=ConcurrentMarkSweep").unwrap();
        assert_eq!(name.domain, "java.lang");
        assert_eq!(
            name.properties,
            vec![
                ("type".to_string(), "GarbageCollector".to_string()),
                ("name".to_string(), "ConcurrentMarkSweep".to_string()),
            ]
        );
        assert_eq!(name.get("name"), Some("ConcurrentMarkSweep"));
        assert_eq!(name.get("missing"), None);
    }

    #[test]
    fn test_object_name_without_domain_separator() {
        assert!(ObjectName::parse("not-an-object-name").is_none());
    }

    #[test]
    fn test_as_f64_coercion() {
        assert_eq!(AttributeValue::Integer(42).as_f64(false), Some(42.0));
        assert_eq!(AttributeValue::Float(1.5).as_f64(false), Some(1.5));
        assert_eq!(AttributeValue::from("3.25").as_f64(false), Some(3.25));
        assert_eq!(AttributeValue::from("N/A").as_f64(false), None);
        assert_eq!(AttributeValue::from("NaN").as_f64(false), None);
        assert_eq!(AttributeValue::Null.as_f64(true), None);
    }

    #[test]
    fn test_boolean_coercion_depends_on_flag() {
        assert_eq!(AttributeValue::Boolean(true).as_f64(false), None);
        assert_eq!(AttributeValue::Boolean(true).as_f64(true), Some(1.0));
        assert_eq!(AttributeValue::Boolean(false).as_f64(true), Some(0.0));
    }

    #[test]
    fn test_result_deserialize() {
        let result: JmxResult = serde_json::from_value(json!({
            "attributeName": "HeapMemoryUsage",
            "typeName": "type=Memory",
            "values": {"used": 52428800_i64, "max": 4294967296_i64, "name": "heap"},
            "epoch": 1609459200000_i64
        }))
        .unwrap();

        assert_eq!(result.attribute_name, "HeapMemoryUsage");
        assert_eq!(result.values.len(), 3);
        assert_eq!(
            result.values.get("used"),
            Some(&AttributeValue::Integer(52428800))
        );
        assert!(result.key_alias.is_none());
        assert_eq!(
            result.values.keys().collect::<Vec<_>>(),
            vec!["max", "name", "used"]
        );
    }
}
