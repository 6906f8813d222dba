//! Parameter encoding strategies.
//!
//! A [`ParameterEncoding`] decides where a [`Parameters`] map ends up on a
//! [`Request`] (URL query or body) and how it is serialized. Three strategies
//! ship with the crate:
//!
//! - [`UrlEncoding`]: `application/x-www-form-urlencoded` in the query or body
//! - [`JsonEncoding`]: JSON body
//! - [`PropertyListEncoding`]: XML property list body
//!
//! Anything else can be plugged in by implementing the trait.

use crate::{error::BoxError, Request};
use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderValue, Method};
use serde_json::Value;
use std::fmt;

/// A heterogeneous parameter map.
pub type Parameters = serde_json::Map<String, Value>;

/// Errors raised by the built-in encodings.
#[derive(thiserror::Error, Debug)]
pub enum EncodingError {
    /// Property lists have no representation for `null`.
    #[error("property list cannot represent null value for key `{key}`")]
    UnsupportedNull {
        /// The parameter path holding the null.
        key: String,
    },

    /// Property lists are XML 1.0, which forbids most control characters.
    #[error("property list cannot represent character U+{code:04X} in `{key}`")]
    InvalidXmlCharacter {
        /// The parameter path holding the character.
        key: String,
        /// The offending code point.
        code: u32,
    },

    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Embeds a parameter map into a request.
///
/// # Examples
///
/// ```
/// use moya::encoding::{ParameterEncoding, Parameters};
/// use moya::{BoxError, Request};
///
/// /// Sends parameters as a single `X-Params` header.
/// #[derive(Debug)]
/// struct HeaderEncoding;
///
/// impl ParameterEncoding for HeaderEncoding {
///     fn encode(&self, mut request: Request, parameters: &Parameters) -> Result<Request, BoxError> {
///         let value = serde_json::to_string(parameters)?;
///         request.headers.insert("x-params", value.parse()?);
///         Ok(request)
///     }
/// }
/// ```
pub trait ParameterEncoding: fmt::Debug + Send + Sync {
    /// Returns `request` with `parameters` embedded.
    fn encode(&self, request: Request, parameters: &Parameters) -> Result<Request, BoxError>;
}

/// Where [`UrlEncoding`] places the encoded string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Destination {
    /// Query for `GET`, `HEAD` and `DELETE`; body otherwise.
    #[default]
    MethodDependent,
    /// Always the URL query.
    QueryString,
    /// Always the body.
    HttpBody,
}

/// How array values are keyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrayEncoding {
    /// `key[]=a&key[]=b`
    #[default]
    Brackets,
    /// `key=a&key=b`
    NoBrackets,
}

impl ArrayEncoding {
    fn encode(&self, key: &str) -> String {
        match self {
            ArrayEncoding::Brackets => format!("{key}[]"),
            ArrayEncoding::NoBrackets => key.to_string(),
        }
    }
}

/// How boolean values are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoolEncoding {
    /// `1` / `0`
    #[default]
    Numeric,
    /// `true` / `false`
    Literal,
}

impl BoolEncoding {
    fn encode(&self, value: bool) -> &'static str {
        match (self, value) {
            (BoolEncoding::Numeric, true) => "1",
            (BoolEncoding::Numeric, false) => "0",
            (BoolEncoding::Literal, true) => "true",
            (BoolEncoding::Literal, false) => "false",
        }
    }
}

/// Form URL encoding.
///
/// Keys are emitted in sorted order. Nested maps become `key[nested]=value`.
/// An empty parameter map leaves the request untouched.
///
/// # Examples
///
/// ```
/// use moya::encoding::{Parameters, UrlEncoding};
/// use serde_json::json;
///
/// let params: Parameters = json!({"q": "cats", "page": 2}).as_object().unwrap().clone();
/// assert_eq!(UrlEncoding::default().query(&params), "page=2&q=cats");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlEncoding {
    /// Where the encoded string goes.
    pub destination: Destination,
    /// Array key style.
    pub array_encoding: ArrayEncoding,
    /// Boolean value style.
    pub bool_encoding: BoolEncoding,
}

impl UrlEncoding {
    /// Always encodes into the URL query.
    pub fn query_string() -> Self {
        Self {
            destination: Destination::QueryString,
            ..Self::default()
        }
    }

    /// Always encodes into the body.
    pub fn http_body() -> Self {
        Self {
            destination: Destination::HttpBody,
            ..Self::default()
        }
    }

    /// Sets the array key style.
    pub fn array_encoding(mut self, array_encoding: ArrayEncoding) -> Self {
        self.array_encoding = array_encoding;
        self
    }

    /// Sets the boolean value style.
    pub fn bool_encoding(mut self, bool_encoding: BoolEncoding) -> Self {
        self.bool_encoding = bool_encoding;
        self
    }

    /// Builds the percent-encoded `key=value&...` string.
    pub fn query(&self, parameters: &Parameters) -> String {
        let mut entries: Vec<(&String, &Value)> = parameters.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut components = Vec::new();
        for (key, value) in entries {
            self.query_components(key, value, &mut components);
        }

        components
            .iter()
            .map(|(key, value)| format!("{}={}", escape(key), escape(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn query_components(&self, key: &str, value: &Value, out: &mut Vec<(String, String)>) {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                for (nested_key, nested) in entries {
                    self.query_components(&format!("{key}[{nested_key}]"), nested, out);
                }
            }
            Value::Array(items) => {
                let array_key = self.array_encoding.encode(key);
                for item in items {
                    self.query_components(&array_key, item, out);
                }
            }
            Value::Bool(flag) => {
                out.push((key.to_string(), self.bool_encoding.encode(*flag).to_string()))
            }
            Value::Number(number) => out.push((key.to_string(), number.to_string())),
            Value::String(text) => out.push((key.to_string(), text.clone())),
            Value::Null => out.push((key.to_string(), String::new())),
        }
    }

    fn encodes_in_url(&self, method: &Method) -> bool {
        match self.destination {
            Destination::MethodDependent => {
                *method == Method::GET || *method == Method::HEAD || *method == Method::DELETE
            }
            Destination::QueryString => true,
            Destination::HttpBody => false,
        }
    }
}

impl ParameterEncoding for UrlEncoding {
    fn encode(&self, mut request: Request, parameters: &Parameters) -> Result<Request, BoxError> {
        if parameters.is_empty() {
            return Ok(request);
        }

        let query = self.query(parameters);
        if self.encodes_in_url(&request.method) {
            request.append_query(&query);
        } else {
            request.set_header_if_absent(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded; charset=utf-8"),
            );
            request.body = Some(Bytes::from(query));
        }
        Ok(request)
    }
}

fn escape(component: &str) -> String {
    url::form_urlencoded::byte_serialize(component.as_bytes()).collect()
}

/// JSON body encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonEncoding {
    /// Pretty-print the body.
    pub pretty: bool,
}

impl JsonEncoding {
    /// Pretty-printed JSON.
    pub fn pretty_printed() -> Self {
        Self { pretty: true }
    }
}

impl ParameterEncoding for JsonEncoding {
    fn encode(&self, mut request: Request, parameters: &Parameters) -> Result<Request, BoxError> {
        let body = if self.pretty {
            serde_json::to_vec_pretty(parameters).map_err(EncodingError::from)?
        } else {
            serde_json::to_vec(parameters).map_err(EncodingError::from)?
        };
        request.set_header_if_absent(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request.body = Some(Bytes::from(body));
        Ok(request)
    }
}

/// XML property list body encoding.
///
/// `null` values cannot be represented and fail with
/// [`EncodingError::UnsupportedNull`]. Keys and strings containing characters
/// XML 1.0 forbids fail with [`EncodingError::InvalidXmlCharacter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyListEncoding;

impl PropertyListEncoding {
    /// Serializes a parameter map as an XML property list document.
    pub fn document(parameters: &Parameters) -> Result<String, EncodingError> {
        let mut out = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
             \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
             <plist version=\"1.0\">\n",
        );
        write_dict(parameters, "", 0, &mut out)?;
        out.push_str("</plist>\n");
        Ok(out)
    }
}

impl ParameterEncoding for PropertyListEncoding {
    fn encode(&self, mut request: Request, parameters: &Parameters) -> Result<Request, BoxError> {
        let body = Self::document(parameters)?;
        request.set_header_if_absent(CONTENT_TYPE, HeaderValue::from_static("application/x-plist"));
        request.body = Some(Bytes::from(body));
        Ok(request)
    }
}

fn write_dict(
    map: &Parameters,
    path: &str,
    depth: usize,
    out: &mut String,
) -> Result<(), EncodingError> {
    line(depth, "<dict>", out);
    for (key, value) in map {
        let child = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        line(depth + 1, &format!("<key>{}</key>", xml_escape(key, &child)?), out);
        write_value(value, &child, depth + 1, out)?;
    }
    line(depth, "</dict>", out);
    Ok(())
}

fn write_value(value: &Value, path: &str, depth: usize, out: &mut String) -> Result<(), EncodingError> {
    match value {
        Value::Object(map) => write_dict(map, path, depth, out)?,
        Value::Array(items) => {
            line(depth, "<array>", out);
            for (index, item) in items.iter().enumerate() {
                write_value(item, &format!("{path}[{index}]"), depth + 1, out)?;
            }
            line(depth, "</array>", out);
        }
        Value::Null => {
            return Err(EncodingError::UnsupportedNull {
                key: path.to_string(),
            })
        }
        Value::Bool(true) => line(depth, "<true/>", out),
        Value::Bool(false) => line(depth, "<false/>", out),
        Value::Number(number) if number.is_f64() => {
            line(depth, &format!("<real>{number}</real>"), out)
        }
        Value::Number(number) => line(depth, &format!("<integer>{number}</integer>"), out),
        Value::String(text) => line(
            depth,
            &format!("<string>{}</string>", xml_escape(text, path)?),
            out,
        ),
    }
    Ok(())
}

fn line(depth: usize, text: &str, out: &mut String) {
    for _ in 0..depth {
        out.push('\t');
    }
    out.push_str(text);
    out.push('\n');
}

fn xml_escape(text: &str, path: &str) -> Result<String, EncodingError> {
    if let Some(invalid) = text.chars().find(|c| !is_xml_char(*c)) {
        return Err(EncodingError::InvalidXmlCharacter {
            key: path.to_string(),
            code: u32::from(invalid),
        });
    }
    Ok(text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;"))
}

// XML 1.0 `Char` production; surrogates are already excluded by `char`.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
