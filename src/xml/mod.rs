//! XML helpers for MNS request and response documents.

use crate::error::{MnsError, RequestError, ResponseError};
use bytes::BytesMut;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Fields of an MNS `<Error>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDocument {
    /// Error code, e.g. `QueueNotExist`.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Request id, if the document carries one.
    pub request_id: Option<String>,
    /// Host id, if the document carries one.
    pub host_id: Option<String>,
}

/// Parse an MNS error document.
///
/// The root element must be `Error`. Any other shape, including plain text
/// and HTML error pages, is rejected with a description of the problem.
pub fn parse_error_document(body: &[u8]) -> Result<ErrorDocument, String> {
    let xml = std::str::from_utf8(body).map_err(|e| format!("body is not UTF-8: {}", e))?;
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut document = ErrorDocument::default();
    let mut root_seen = false;
    let mut depth = 0usize;
    let mut current_element = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if depth == 0 {
                    if root_seen || name != "Error" {
                        return Err(format!("unexpected root element <{}>", name));
                    }
                    root_seen = true;
                }
                depth += 1;
                current_element = name;
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if root_seen || name != "Error" {
                        return Err(format!("unexpected root element <{}/>", name));
                    }
                    root_seen = true;
                }
                current_element.clear();
            }
            Ok(Event::Text(e)) => {
                if depth == 0 {
                    return Err("text outside of the Error element".to_string());
                }
                if depth != 2 {
                    continue;
                }
                let text = e.unescape().map_err(|e| e.to_string())?.into_owned();
                match current_element.as_str() {
                    "Code" => document.code = text,
                    "Message" => document.message = text,
                    "RequestId" => document.request_id = Some(text),
                    "HostId" => document.host_id = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    if !root_seen {
        return Err("missing Error element".to_string());
    }
    if depth != 0 {
        return Err("unexpected end of document".to_string());
    }
    Ok(document)
}

/// Serialize `value` as XML into `buf`.
pub fn write_xml<T: Serialize>(buf: &mut BytesMut, value: &T) -> Result<(), MnsError> {
    quick_xml::se::to_writer(&mut *buf, value)
        .map(|_| ())
        .map_err(|e| {
            RequestError::Serialization {
                message: e.to_string(),
            }
            .into()
        })
}

/// Deserialize a successful response body.
pub fn read_xml<T: DeserializeOwned>(body: &[u8]) -> Result<T, MnsError> {
    let parse_error = |message: String| -> MnsError {
        ResponseError::XmlParseError {
            message,
            body: body.to_vec(),
        }
        .into()
    };

    let xml = std::str::from_utf8(body).map_err(|e| parse_error(e.to_string()))?;
    quick_xml::de::from_str(xml).map_err(|e| parse_error(e.to_string()))
}

/// Collect the text of every `element` in document order, whitespace intact.
///
/// Serde deserialization trims text nodes, which corrupts message bodies
/// whose MD5 was computed over leading or trailing whitespace. An empty
/// element yields an empty string.
pub fn element_texts(body: &[u8], element: &str) -> Result<Vec<String>, MnsError> {
    let parse_error = |message: String| -> MnsError {
        ResponseError::XmlParseError {
            message,
            body: body.to_vec(),
        }
        .into()
    };

    let xml = std::str::from_utf8(body).map_err(|e| parse_error(e.to_string()))?;
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut texts = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == element.as_bytes() => {
                current = Some(String::new());
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == element.as_bytes() => {
                texts.push(String::new());
            }
            Ok(Event::Text(e)) => {
                if let Some(text) = current.as_mut() {
                    let unescaped = e.unescape().map_err(|e| parse_error(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(text) = current.as_mut() {
                    let raw = e.into_inner();
                    let raw = std::str::from_utf8(&raw).map_err(|e| parse_error(e.to_string()))?;
                    text.push_str(raw);
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == element.as_bytes() => {
                if let Some(text) = current.take() {
                    texts.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(e.to_string())),
            _ => {}
        }
    }

    Ok(texts)
}

/// Returns true if `needle` occurs in `haystack`.
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}
