//! Request body and cookie decoding.
//!
//! Only `application/json` and `application/x-www-form-urlencoded` bodies are
//! decoded; every other content type (multipart uploads in particular) is left
//! untouched for the handler that owns it.
//!
//! Form bodies use bracket nesting: `shipping[city]=Manila&items[]=a&items[]=b`
//! decodes to `{"shipping": {"city": "Manila"}, "items": ["a", "b"]}`. Small
//! numeric segments (`items[0]`, up to [`FORM_ARRAY_LIMIT`]) are array indices;
//! gaps are closed up, so `a[1]=x&a[5]=y` is `["x", "y"]`.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, header::COOKIE};
use serde_json::{Map, Value};
use thiserror::Error;

/// Most parameters accepted in one form body.
pub const FORM_PARAMETER_LIMIT: usize = 1000;

/// Deepest bracket nesting honoured in a form key. Anything deeper is kept
/// as a literal key segment.
pub const FORM_NESTING_DEPTH: usize = 5;

/// Largest bracket index read as an array position. Bigger indices stay
/// object keys.
pub const FORM_ARRAY_LIMIT: usize = 20;

/// Errors decoding a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON body must be an object or an array")]
    NotStructured,

    #[error("too many parameters in form body (limit {FORM_PARAMETER_LIMIT})")]
    TooManyParameters,

    #[error("failed to read request body: {0}")]
    Read(String),
}

/// Body media types the decoding stage understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    Form,
    Other,
}

impl MediaType {
    /// Classify a `Content-Type` header value, ignoring parameters such as
    /// `charset`.
    #[must_use]
    pub fn from_content_type(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Other;
        };
        let essence = value.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("application/json") {
            Self::Json
        } else if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Self::Form
        } else {
            Self::Other
        }
    }

    #[must_use]
    pub const fn is_decoded(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Structured form of a request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DecodedBody {
    /// No body, or a decodable content type with zero bytes.
    #[default]
    Empty,
    Json(Value),
    Form(Value),
    /// A content type this stage does not decode; the raw body is still
    /// available to the handler.
    Unparsed,
}

impl DecodedBody {
    /// The decoded value for JSON or form bodies.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Json(value) | Self::Form(value) => Some(value),
            Self::Empty | Self::Unparsed => None,
        }
    }
}

/// Decode `bytes` according to `media_type`.
///
/// # Errors
///
/// Returns `BodyError` when the bytes are malformed for the media type.
pub fn decode(media_type: MediaType, bytes: &Bytes) -> Result<DecodedBody, BodyError> {
    if bytes.is_empty() {
        return Ok(match media_type {
            MediaType::Other => DecodedBody::Unparsed,
            MediaType::Json | MediaType::Form => DecodedBody::Empty,
        });
    }
    match media_type {
        MediaType::Json => parse_json(bytes).map(DecodedBody::Json),
        MediaType::Form => parse_form(bytes).map(DecodedBody::Form),
        MediaType::Other => Ok(DecodedBody::Unparsed),
    }
}

/// Parse a JSON body. Only objects and arrays are accepted at the top level.
///
/// # Errors
///
/// Returns `BodyError::Json` for invalid JSON and `BodyError::NotStructured`
/// for scalar documents.
pub fn parse_json(bytes: &[u8]) -> Result<Value, BodyError> {
    let value: Value = serde_json::from_slice(bytes)?;
    if value.is_object() || value.is_array() {
        Ok(value)
    } else {
        Err(BodyError::NotStructured)
    }
}

/// Parse a URL-encoded form body with bracket nesting.
///
/// # Errors
///
/// Returns `BodyError::TooManyParameters` past [`FORM_PARAMETER_LIMIT`].
pub fn parse_form(bytes: &[u8]) -> Result<Value, BodyError> {
    let mut root = Map::new();
    for (count, (key, value)) in url::form_urlencoded::parse(bytes).enumerate() {
        if count >= FORM_PARAMETER_LIMIT {
            return Err(BodyError::TooManyParameters);
        }
        if key.is_empty() {
            continue;
        }
        let (head, path) = split_key(&key);
        let existing = root.remove(&head);
        root.insert(head, assign(existing, &path, value.into_owned()));
    }
    Ok(Value::Object(
        root.into_iter()
            .map(|(key, value)| (key, compact_indices(value)))
            .collect(),
    ))
}

/// `Some(i)` when `segment` is a canonical array index within the limit.
fn array_index(segment: &str) -> Option<usize> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|index| *index <= FORM_ARRAY_LIMIT && index.to_string() == segment)
}

/// Turn objects keyed only by array indices into arrays, in index order.
fn compact_indices(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(key, item)| (key, compact_indices(item)))
                .collect();
            if map.is_empty() || !map.keys().all(|key| array_index(key).is_some()) {
                return Value::Object(map);
            }
            let mut indexed: Vec<(usize, Value)> = map
                .into_iter()
                .filter_map(|(key, item)| array_index(&key).map(|index| (index, item)))
                .collect();
            indexed.sort_by_key(|(index, _)| *index);
            Value::Array(indexed.into_iter().map(|(_, item)| item).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(compact_indices).collect()),
        other => other,
    }
}

/// Split `a[b][]` into `("a", ["b", ""])`.
///
/// Keys that do not follow the bracket grammar are returned whole.
fn split_key(key: &str) -> (String, Vec<String>) {
    let Some(open) = key.find('[').filter(|i| *i > 0) else {
        return (key.to_string(), Vec::new());
    };
    let (head, mut rest) = key.split_at(open);
    let mut segments = Vec::new();

    while !rest.is_empty() {
        if segments.len() == FORM_NESTING_DEPTH {
            segments.push(rest.to_string());
            break;
        }
        let Some(inner) = rest.strip_prefix('[') else {
            return (key.to_string(), Vec::new());
        };
        let Some(close) = inner.find(']') else {
            return (key.to_string(), Vec::new());
        };
        let (segment, tail) = inner.split_at(close);
        segments.push(segment.to_string());
        rest = tail.get(1..).unwrap_or_default();
    }
    (head.to_string(), segments)
}

/// Insert `value` at `path` beneath `slot`, returning the new slot contents.
///
/// An empty segment appends to an array; repeated leaf keys collect into an
/// array. Named segments turn an existing array into an object keyed by
/// position, which [`compact_indices`] folds back when every key is an index.
fn assign(slot: Option<Value>, path: &[String], value: String) -> Value {
    match path.split_first() {
        None => match slot {
            None => Value::String(value),
            Some(Value::Array(mut items)) => {
                items.push(Value::String(value));
                Value::Array(items)
            }
            Some(existing) => Value::Array(vec![existing, Value::String(value)]),
        },
        Some((segment, rest)) if segment.is_empty() => {
            let mut items = match slot {
                Some(Value::Array(items)) => items,
                Some(Value::Object(mut map)) => {
                    let next = map
                        .keys()
                        .filter_map(|key| array_index(key))
                        .max()
                        .map_or(0, |last| last + 1);
                    map.insert(next.to_string(), assign(None, rest, value));
                    return Value::Object(map);
                }
                Some(other) => vec![other],
                None => Vec::new(),
            };
            items.push(assign(None, rest, value));
            Value::Array(items)
        }
        Some((segment, rest)) => {
            let mut map = match slot {
                Some(Value::Object(map)) => map,
                Some(Value::Array(items)) => items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| (index.to_string(), item))
                    .collect(),
                _ => Map::new(),
            };
            let existing = map.remove(segment);
            map.insert(segment.clone(), assign(existing, rest, value));
            Value::Object(map)
        }
    }
}

/// Cookies sent with a request, percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cookies(BTreeMap<String, String>);

impl Cookies {
    /// Parse every `Cookie` header. The first occurrence of a name wins.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = BTreeMap::new();
        let pairs = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'));

        for pair in pairs {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() || cookies.contains_key(name) {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            let decoded = urlencoding::decode(value)
                .map_or_else(|_| value.to_string(), std::borrow::Cow::into_owned);
            cookies.insert(name.to_string(), decoded);
        }
        Self(cookies)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_media_type() {
        assert_eq!(
            MediaType::from_content_type(Some("application/json; charset=utf-8")),
            MediaType::Json
        );
        assert_eq!(
            MediaType::from_content_type(Some("Application/X-WWW-Form-Urlencoded")),
            MediaType::Form
        );
        assert_eq!(
            MediaType::from_content_type(Some("multipart/form-data; boundary=x")),
            MediaType::Other
        );
        assert_eq!(MediaType::from_content_type(None), MediaType::Other);
    }

    #[test]
    fn test_json_accepts_objects_and_arrays_only() {
        assert_eq!(
            parse_json(br#"{"email":"a@b.c"}"#).unwrap(),
            json!({"email": "a@b.c"})
        );
        assert_eq!(parse_json(b"[1,2]").unwrap(), json!([1, 2]));
        assert!(matches!(parse_json(b"42"), Err(BodyError::NotStructured)));
        assert!(matches!(parse_json(b"{\"a\":"), Err(BodyError::Json(_))));
    }

    #[test]
    fn test_form_nesting() {
        let value =
            parse_form(b"name=Juan&shipping[address]=1+Rizal+St&shipping[city]=Manila").unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Juan",
                "shipping": {"address": "1 Rizal St", "city": "Manila"}
            })
        );
    }

    #[test]
    fn test_form_arrays() {
        let value = parse_form(b"items[]=a&items[]=b&tag=x&tag=y").unwrap();
        assert_eq!(value, json!({"items": ["a", "b"], "tag": ["x", "y"]}));

        let value = parse_form(b"rows[][qty]=1&rows[][qty]=2").unwrap();
        assert_eq!(value, json!({"rows": [{"qty": "1"}, {"qty": "2"}]}));
    }

    #[test]
    fn test_form_indexed_arrays() {
        let value = parse_form(b"items[0]=a&items[1]=b").unwrap();
        assert_eq!(value, json!({"items": ["a", "b"]}));

        let value = parse_form(b"a[5]=y&a[1]=x").unwrap();
        assert_eq!(value, json!({"a": ["x", "y"]}));

        let value = parse_form(b"rows[0][qty]=1&rows[1][qty]=2&rows[0][sku]=A").unwrap();
        assert_eq!(
            value,
            json!({"rows": [{"qty": "1", "sku": "A"}, {"qty": "2"}]})
        );

        let value = parse_form(b"tags[]=new&tags[1]=vip&tags[]=sale").unwrap();
        assert_eq!(value, json!({"tags": ["new", "vip", "sale"]}));
    }

    #[test]
    fn test_form_large_or_mixed_indices_stay_objects() {
        let value = parse_form(b"a[21]=x").unwrap();
        assert_eq!(value, json!({"a": {"21": "x"}}));

        let value = parse_form(b"a[0]=x&a[b]=y").unwrap();
        assert_eq!(value, json!({"a": {"0": "x", "b": "y"}}));

        let value = parse_form(b"a[01]=x").unwrap();
        assert_eq!(value, json!({"a": {"01": "x"}}));

        let value = parse_form(b"0=top").unwrap();
        assert_eq!(value, json!({"0": "top"}));
    }

    #[test]
    fn test_form_malformed_keys_are_literal() {
        let value = parse_form(b"a[b=1&[c]=2&d]=3").unwrap();
        assert_eq!(value, json!({"a[b": "1", "[c]": "2", "d]": "3"}));
    }

    #[test]
    fn test_form_depth_limit() {
        let value = parse_form(b"a[b][c][d][e][f][g]=deep").unwrap();
        assert_eq!(
            value,
            json!({"a": {"b": {"c": {"d": {"e": {"f": {"[g]": "deep"}}}}}}})
        );
    }

    #[test]
    fn test_form_parameter_limit() {
        let body = (0..=FORM_PARAMETER_LIMIT)
            .map(|i| format!("k{i}=v"))
            .collect::<Vec<_>>()
            .join("&");
        assert!(matches!(
            parse_form(body.as_bytes()),
            Err(BodyError::TooManyParameters)
        ));
    }

    #[test]
    fn test_decode_empty_and_other() {
        let empty = Bytes::new();
        assert_eq!(
            decode(MediaType::Json, &empty).unwrap(),
            DecodedBody::Empty
        );
        assert_eq!(
            decode(MediaType::Other, &Bytes::from_static(b"\x89PNG")).unwrap(),
            DecodedBody::Unparsed
        );
        assert_eq!(
            decode(MediaType::Json, &Bytes::from_static(b"{}"))
                .unwrap()
                .value(),
            Some(&json!({}))
        );
    }

    #[test]
    fn test_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(
            COOKIE,
            HeaderValue::from_static("jwt=abc.def; theme=\"dark\"; cart=%7B%22n%22%3A1%7D"),
        );
        headers.append(COOKIE, HeaderValue::from_static("jwt=ignored; lang=fil"));

        let cookies = Cookies::from_headers(&headers);
        assert_eq!(cookies.get("jwt"), Some("abc.def"));
        assert_eq!(cookies.get("theme"), Some("dark"));
        assert_eq!(cookies.get("cart"), Some("{\"n\":1}"));
        assert_eq!(cookies.get("lang"), Some("fil"));
        assert_eq!(cookies.len(), 4);
    }

    #[test]
    fn test_cookies_skip_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("novalue; =x; ok=1"));
        let cookies = Cookies::from_headers(&headers);
        assert_eq!(cookies.iter().collect::<Vec<_>>(), vec![("ok", "1")]);
    }
}
