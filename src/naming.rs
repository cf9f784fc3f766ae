//! Naming policy for server aliases and metric keys
//!
//! Downstream dashboards key off the metric strings produced here, so the
//! format must stay stable:
//!
//! ```text
//! <rootPrefix>.<identifier>.<attribute>.<subKey>
//! ```
//!
//! where `identifier` is the result's key alias or the object name's key
//! property values, and the attribute segment is dropped when the sub-key
//! already starts with the attribute name.

use crate::model::{parse_key_properties, JmxResult, Query, Server};

/// Resolve the alias under which a server's documents are stored.
///
/// An explicit alias is returned unchanged; otherwise `host_port` is cleaned
/// with [`clean_segment`].
pub fn resolve_alias(server: &Server) -> String {
    match &server.alias {
        Some(alias) => alias.clone(),
        None => clean_segment(&format!("{}_{}", server.host, server.port), false),
    }
}

/// Build the dotted metric key for one sub-value of a result.
///
/// The server is carried in the document's own `server` field and does not
/// enter the key.
pub fn resolve_metric_key(
    _server: &Server,
    query: &Query,
    result: &JmxResult,
    sub_key: &str,
    root_prefix: &str,
) -> String {
    let allow_dots = query.allow_dotted_keys;
    let mut segments: Vec<String> = Vec::with_capacity(4);

    if !root_prefix.is_empty() {
        segments.push(root_prefix.to_string());
    }

    let identifier = mbean_identifier(query, result);
    if !identifier.is_empty() {
        segments.push(identifier);
    }

    if sub_key.starts_with(&result.attribute_name) {
        segments.push(clean_segment(sub_key, allow_dots));
    } else {
        segments.push(clean_segment(&result.attribute_name, allow_dots));
        segments.push(clean_segment(sub_key, allow_dots));
    }

    segments.retain(|s| !s.is_empty());
    segments.join(".")
}

/// Identifier segment(s) for a result.
fn mbean_identifier(query: &Query, result: &JmxResult) -> String {
    let allow_dots = query.allow_dotted_keys;

    if let Some(alias) = &result.key_alias {
        return clean_segment(alias, allow_dots);
    }

    // Prefer the concrete object's properties; the query may be a wildcard.
    let properties = match &result.type_name {
        Some(type_name) => parse_key_properties(type_name),
        None => match query.object_name() {
            Some(name) => name.properties,
            None => return clean_segment(&query.obj, allow_dots),
        },
    };

    let selected: Vec<&str> = if query.type_names.is_empty() {
        properties.iter().map(|(_, v)| v.as_str()).collect()
    } else {
        query
            .type_names
            .iter()
            .filter_map(|name| {
                properties
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| v.as_str())
            })
            .collect()
    };

    selected
        .into_iter()
        .map(|v| clean_segment(v, allow_dots))
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Strip characters that are unsafe inside a single key segment.
///
/// Quotes are removed; `/`, whitespace and (unless `allow_dots`) `.` become
/// `_`; trailing `.` and `_` are trimmed.
pub fn clean_segment(s: &str, allow_dots: bool) -> String {
    let cleaned: String = s
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .map(|c| match c {
            '/' => '_',
            '.' if !allow_dots => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    cleaned.trim_end_matches(&['.', '_'][..]).to_string()
}
