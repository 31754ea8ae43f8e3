//! Body codecs.
//!
//! Requests decode from JSON or YAML by `Content-Type`; anything else is
//! handed to the target type as the raw body string. Responses encode into
//! whichever [`Format`] the negotiated media type selects.

use serde::de::{DeserializeOwned, IntoDeserializer};
use serde_json::Value;

use crate::error::{DecodeError, Error};
use crate::mime::MimeType;
use crate::response::{RouteResponse, SerializeAs};

/// Wire formats the router can write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Json,
    Yaml,
    PlainText,
    Html,
    Xml,
}

impl Format {
    /// Picks the encoder for a negotiated media type. Unknown types fall back
    /// to plain text.
    pub fn for_mime(mime: &MimeType) -> Self {
        match (mime.kind(), mime.subtype()) {
            (_, "json")                               => Self::Json,
            (_, "yaml" | "x-yaml")                    => Self::Yaml,
            ("text", "html")                          => Self::Html,
            ("application" | "text", "xml")           => Self::Xml,
            _                                         => Self::PlainText,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Json      => "json",
            Self::Yaml      => "yaml",
            Self::PlainText => "plain text",
            Self::Html      => "html",
            Self::Xml       => "xml",
        }
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Decodes `raw` into `I` according to the request's content type.
pub(crate) fn decode<I: DeserializeOwned>(
    raw: &str,
    content_type: Option<&MimeType>,
) -> Result<I, DecodeError> {
    match content_type.map(Format::for_mime) {
        Some(Format::Json) => serde_json::from_str(raw).map_err(DecodeError::from_json),
        Some(Format::Yaml) => serde_yaml::from_str(raw).map_err(DecodeError::from_yaml),
        _ => decode_raw(raw),
    }
}

/// Hands `raw` to `I` as a plain string, whatever the content type.
pub(crate) fn decode_raw<I: DeserializeOwned>(raw: &str) -> Result<I, DecodeError> {
    let deserializer: serde::de::value::StrDeserializer<'_, serde::de::value::Error> = raw.into_deserializer();
    I::deserialize(deserializer).map_err(DecodeError::from_raw)
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Encodes the body of `response`. No body encodes to an empty string.
pub(crate) fn encode(response: &RouteResponse, format: Format) -> Result<String, Error> {
    let Some(body) = response.body() else {
        return Ok(String::new());
    };

    if response.serialize_as() == &SerializeAs::PlainString {
        return Ok(plain_text(body));
    }

    let failed = |message: String| Error::Encode { format: format.name(), message };

    match format {
        Format::Json      => serde_json::to_string(body).map_err(|e| failed(e.to_string())),
        Format::Yaml      => serde_yaml::to_string(body).map_err(|e| failed(e.to_string())),
        Format::PlainText => Ok(plain_text(body)),
        Format::Html      => Ok(format!(
            "<html><body>{}</body></html>",
            quick_xml::escape::escape(plain_text(body).as_str())
        )),
        Format::Xml       => xml(body).map_err(|e| failed(e.to_string())),
    }
}

/// A sequence is written as `<item>` children of one `<response>` root.
fn xml(body: &Value) -> Result<String, quick_xml::SeError> {
    match body {
        Value::Array(items) => {
            quick_xml::se::to_string_with_root("response", &serde_json::json!({ "item": items }))
        }
        other => quick_xml::se::to_string_with_root("response", other),
    }
}

fn plain_text(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        Value::Null      => String::new(),
        other            => other.to_string(),
    }
}
