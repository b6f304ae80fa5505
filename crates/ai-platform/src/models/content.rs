use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::tool::ToolCall;
use crate::errors::{PlatformError, PlatformResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
}

/// An image referenced by URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ImageUrlRepr")]
pub struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ImageUrlRepr {
    url: String,
}

impl TryFrom<ImageUrlRepr> for ImageUrl {
    type Error = PlatformError;

    fn try_from(repr: ImageUrlRepr) -> PlatformResult<Self> {
        ImageUrl::new(repr.url)
    }
}

impl ImageUrl {
    pub fn new<S: Into<String>>(url: S) -> PlatformResult<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(PlatformError::InvalidArgument(
                "The image url must be given.".to_string(),
            ));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// An inline image, base64 encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub data: String,
    pub mime_type: String,
}

impl Image {
    pub fn from_bytes<T: Into<String>>(bytes: &[u8], mime_type: T) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    pub fn from_data_url(url: &str) -> PlatformResult<Self> {
        let (mime_type, data) = parse_data_url(url)?;
        Ok(Self { data, mime_type })
    }

    pub fn as_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Inline audio, base64 encoded; `format` is the short codec name such as "mp3" or "wav"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audio {
    pub data: String,
    pub format: String,
}

impl Audio {
    pub fn from_bytes<T: Into<String>>(bytes: &[u8], format: T) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            format: format.into(),
        }
    }
}

/// An inline document such as a PDF, base64 encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub data: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl File {
    pub fn from_bytes<T: Into<String>>(bytes: &[u8], mime_type: T) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
            filename: None,
        }
    }

    pub fn from_data_url(url: &str) -> PlatformResult<Self> {
        let (mime_type, data) = parse_data_url(url)?;
        Ok(Self {
            data,
            mime_type,
            filename: None,
        })
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn as_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// The outcome of a tool call, sent back to the model in a tool message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub tool_call: ToolCall,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Content passed inside a message
pub enum Content {
    Text(Text),
    ImageUrl(ImageUrl),
    Image(Image),
    Audio(Audio),
    File(File),
    ToolCall(ToolCall),
    ToolCallResult(ToolCallResult),
}

impl Content {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Content::Text(Text { text: text.into() })
    }

    pub fn image_url<S: Into<String>>(url: S) -> PlatformResult<Self> {
        Ok(Content::ImageUrl(ImageUrl::new(url)?))
    }

    pub fn image<S: Into<String>, T: Into<String>>(data: S, mime_type: T) -> Self {
        Content::Image(Image {
            data: data.into(),
            mime_type: mime_type.into(),
        })
    }

    pub fn audio<S: Into<String>, T: Into<String>>(data: S, format: T) -> Self {
        Content::Audio(Audio {
            data: data.into(),
            format: format.into(),
        })
    }

    pub fn file<S: Into<String>, T: Into<String>>(data: S, mime_type: T) -> Self {
        Content::File(File {
            data: data.into(),
            mime_type: mime_type.into(),
            filename: None,
        })
    }

    pub fn tool_call(tool_call: ToolCall) -> Self {
        Content::ToolCall(tool_call)
    }

    pub fn tool_call_result<S: Into<String>>(tool_call: ToolCall, result: S) -> Self {
        Content::ToolCallResult(ToolCallResult {
            tool_call,
            result: result.into(),
        })
    }

    /// Get the text content if this is a Text variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            Content::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_tool_call_result(&self) -> Option<&ToolCallResult> {
        match self {
            Content::ToolCallResult(result) => Some(result),
            _ => None,
        }
    }
}

fn parse_data_url(url: &str) -> PlatformResult<(String, String)> {
    let invalid = || PlatformError::InvalidArgument(format!("Not a base64 data url: {url}"));
    let rest = url.strip_prefix("data:").ok_or_else(invalid)?;
    let (header, data) = rest.split_once(',').ok_or_else(invalid)?;
    let mime_type = header.strip_suffix(";base64").ok_or_else(invalid)?;
    Ok((mime_type.to_string(), data.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_requires_url() {
        let err = ImageUrl::new("").unwrap_err();
        assert_eq!(err.to_string(), "The image url must be given.");

        let image = ImageUrl::new("https://example.com/cat.png").unwrap();
        assert_eq!(image.url(), "https://example.com/cat.png");
    }

    #[test]
    fn test_image_url_deserialization_is_validated() {
        let result: Result<Content, _> =
            serde_json::from_str(r#"{"type": "image_url", "url": ""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_image_data_url() {
        let image = Image::from_bytes(b"png-bytes", "image/png");
        assert_eq!(image.data, "cG5nLWJ5dGVz");

        let url = image.as_data_url();
        assert_eq!(url, "data:image/png;base64,cG5nLWJ5dGVz");
        assert_eq!(Image::from_data_url(&url).unwrap(), image);
    }

    #[test]
    fn test_invalid_data_url() {
        assert!(Image::from_data_url("https://example.com/cat.png").is_err());
        assert!(File::from_data_url("data:application/pdf,raw").is_err());
    }

    #[test]
    fn test_content_serialization_tag() {
        let value = serde_json::to_value(Content::text("hi")).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["text"], "hi");
    }
}
