use crate::error::{Result, VkError};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Response is the decoded top-level body of a call, e.g. `{"response": [...]}`.
pub type Response = serde_json::Map<String, Value>;

/// Format requested from the API and used to decode response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    /// Suffix appended to the method name in the request path
    pub fn method_suffix(self) -> &'static str {
        match self {
            ResponseFormat::Json => "",
            ResponseFormat::Xml => ".xml",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFormat::Json => f.write_str("JSON"),
            ResponseFormat::Xml => f.write_str("XML"),
        }
    }
}

/// Error envelope returned by API methods:
/// `{"error": {"error_code": 5, "error_msg": "...", "request_params": [...]}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
    #[serde(default)]
    pub request_params: Vec<RequestParam>,
}

/// One echoed request parameter in an error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestParam {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// XML shape of the error envelope, where parameters are wrapped in
/// `<request_params><param>...</param></request_params>`.
#[derive(Debug, Deserialize)]
struct XmlErrorBody {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
    #[serde(default)]
    request_params: Option<XmlRequestParams>,
}

#[derive(Debug, Deserialize)]
struct XmlRequestParams {
    #[serde(default)]
    param: Vec<RequestParam>,
}

impl From<XmlErrorBody> for ApiErrorBody {
    fn from(body: XmlErrorBody) -> Self {
        ApiErrorBody {
            error_code: body.error_code,
            error_msg: body.error_msg,
            request_params: body.request_params.map(|p| p.param).unwrap_or_default(),
        }
    }
}

/// Deserialize a body in the given format without looking at its shape.
pub fn decode<T>(body: &[u8], format: ResponseFormat) -> Result<T>
where
    T: DeserializeOwned,
{
    match format {
        ResponseFormat::Json => {
            serde_json::from_slice(body).map_err(|e| VkError::decode(format, e))
        }
        ResponseFormat::Xml => {
            let text = std::str::from_utf8(body).map_err(|e| VkError::decode(format, e))?;
            quick_xml::de::from_str(text).map_err(|e| VkError::decode(format, e))
        }
    }
}

/// Deserialize an API method response, turning an error envelope into
/// [`VkError::Api`]. A body that fails to decode is a [`VkError::Decode`].
pub fn decode_api<T>(body: &[u8], format: ResponseFormat) -> Result<T>
where
    T: DeserializeOwned,
{
    match format {
        ResponseFormat::Json => {
            let value: Value = decode(body, format)?;
            if let Some(error) = value.get("error") {
                return Err(api_error_from_json(error));
            }
            serde_json::from_value(value).map_err(|e| VkError::decode(format, e))
        }
        ResponseFormat::Xml => {
            let text = std::str::from_utf8(body).map_err(|e| VkError::decode(format, e))?;
            if xml_root_name(text)?.as_deref() == Some("error") {
                let error: XmlErrorBody =
                    quick_xml::de::from_str(text).map_err(|e| VkError::decode(format, e))?;
                return Err(VkError::from_api_error(error.into()));
            }
            quick_xml::de::from_str(text).map_err(|e| VkError::decode(format, e))
        }
    }
}

/// Deserialize an OAuth endpoint response. The token endpoint always answers
/// in JSON; a body carrying an `error` field becomes [`VkError::Auth`].
pub fn decode_oauth<T>(body: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let value: Value = decode(body, ResponseFormat::Json)?;

    if let Some(error) = value.get("error") {
        let (error, fallback) = match error {
            Value::String(s) => (s.clone(), String::new()),
            Value::Object(obj) => (
                obj.get("error_code")
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "error".to_string()),
                obj.get("error_msg")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            other => (other.to_string(), String::new()),
        };
        let description = value
            .get("error_description")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(fallback);
        return Err(VkError::Auth { error, description });
    }

    serde_json::from_value(value).map_err(|e| VkError::decode(ResponseFormat::Json, e))
}

fn api_error_from_json(error: &Value) -> VkError {
    match ApiErrorBody::deserialize(error) {
        Ok(body) => VkError::from_api_error(body),
        Err(_) => VkError::Api {
            code: 0,
            message: error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
            response: ApiErrorBody {
                error_code: 0,
                error_msg: error.to_string(),
                request_params: Vec::new(),
            },
        },
    }
}

/// Name of the first element in an XML document, if any
fn xml_root_name(text: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned()));
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => continue,
            Err(e) => return Err(VkError::decode(ResponseFormat::Xml, e)),
        }
    }
}
