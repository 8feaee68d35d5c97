//! String-to-sign construction.

use super::MNS_HEADER_PREFIX;
use http::header::{CONTENT_TYPE, DATE};
use http::{HeaderMap, HeaderValue, Method};
use url::{Position, Url};

const CONTENT_MD5: &str = "content-md5";

fn header_text(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

fn first_value(headers: &HeaderMap, name: impl http::header::AsHeaderName) -> String {
    headers.get(name).map(header_text).unwrap_or_default()
}

/// Collect the `x-mns-*` headers as `(lowercase name, first value)` pairs,
/// sorted by name. The sort is stable, so equal names keep insertion order.
pub fn canonicalized_mns_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = headers
        .keys()
        .filter_map(|name| {
            let lower = name.as_str().to_ascii_lowercase();
            if !lower.starts_with(MNS_HEADER_PREFIX) {
                return None;
            }
            headers.get(name).map(|value| (lower, header_text(value)))
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

/// The path and query of `url`, as sent on the request line.
pub fn canonicalized_resource(url: &Url) -> &str {
    &url[Position::BeforePath..Position::AfterQuery]
}

/// Build the string to sign.
///
/// Format:
/// ```text
/// METHOD\n
/// Content-MD5\n
/// Content-Type\n
/// Date\n
/// name:value\n   (one line per canonicalized x-mns-* header, possibly none)
/// PathAndQuery
/// ```
pub fn build_string_to_sign(
    method: &Method,
    headers: &HeaderMap,
    canonicalized_resource: &str,
) -> String {
    let mut out = String::with_capacity(256);

    out.push_str(method.as_str());
    out.push('\n');
    out.push_str(&first_value(headers, CONTENT_MD5));
    out.push('\n');
    out.push_str(&first_value(headers, CONTENT_TYPE));
    out.push('\n');
    out.push_str(&first_value(headers, DATE));
    out.push('\n');

    for (name, value) in canonicalized_mns_headers(headers) {
        out.push_str(&name);
        out.push(':');
        out.push_str(&value);
        out.push('\n');
    }

    out.push_str(canonicalized_resource);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_header_order() {
        let mut headers = HeaderMap::new();
        headers.insert("x-svc-b", HeaderValue::from_static("2"));
        headers.insert("x-mns-b", HeaderValue::from_static("2"));
        headers.insert("x-mns-a", HeaderValue::from_static("1"));
        headers.insert("X-Mns-Version", HeaderValue::from_static("2015-06-06"));

        let pairs = canonicalized_mns_headers(&headers);
        assert_eq!(
            pairs,
            vec![
                ("x-mns-a".to_string(), "1".to_string()),
                ("x-mns-b".to_string(), "2".to_string()),
                ("x-mns-version".to_string(), "2015-06-06".to_string()),
            ]
        );

        let string_to_sign = build_string_to_sign(&Method::GET, &headers, "/queues/q");
        let a = string_to_sign.find("x-mns-a:1\n").unwrap();
        let b = string_to_sign.find("x-mns-b:2\n").unwrap();
        assert!(a < b);
        assert!(!string_to_sign.contains("x-svc-b"));
    }

    #[test]
    fn test_first_value_wins() {
        let mut headers = HeaderMap::new();
        headers.append("x-mns-tag", HeaderValue::from_static("first"));
        headers.append("x-mns-tag", HeaderValue::from_static("second"));

        assert_eq!(
            canonicalized_mns_headers(&headers),
            vec![("x-mns-tag".to_string(), "first".to_string())]
        );
    }

    #[test]
    fn test_string_to_sign_layout() {
        let mut headers = HeaderMap::new();
        headers.insert(DATE, HeaderValue::from_static("Tue, 01 May 2018 15:04:05 GMT"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml;charset=utf-8"));
        headers.insert("content-md5", HeaderValue::from_static("6Afx/PgtEy+bsBjKZzihnw=="));
        headers.insert("x-mns-version", HeaderValue::from_static("2015-06-06"));

        assert_eq!(
            build_string_to_sign(&Method::POST, &headers, "/queues/q/messages"),
            "POST\n\
             6Afx/PgtEy+bsBjKZzihnw==\n\
             text/xml;charset=utf-8\n\
             Tue, 01 May 2018 15:04:05 GMT\n\
             x-mns-version:2015-06-06\n\
             /queues/q/messages"
        );
    }

    #[test]
    fn test_no_mns_headers_adds_no_blank_line() {
        let mut headers = HeaderMap::new();
        headers.insert(DATE, HeaderValue::from_static("Tue, 01 May 2018 15:04:05 GMT"));

        assert_eq!(
            build_string_to_sign(&Method::GET, &headers, "/queues/q?peekonly=true"),
            "GET\n\n\nTue, 01 May 2018 15:04:05 GMT\n/queues/q?peekonly=true"
        );
    }

    #[test]
    fn test_canonicalized_resource() {
        let url = Url::parse("https://123.mns.cn-hangzhou.aliyuncs.com/queues/q/messages?waitseconds=10").unwrap();
        assert_eq!(canonicalized_resource(&url), "/queues/q/messages?waitseconds=10");

        let url = Url::parse("https://123.mns.cn-hangzhou.aliyuncs.com").unwrap();
        assert_eq!(canonicalized_resource(&url), "/");
    }
}
