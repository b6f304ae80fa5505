use serde::{Deserialize, Serialize};

use crate::errors::{PlatformError, PlatformResult};

/// A generated image hosted by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UrlImageRepr")]
pub struct UrlImage {
    url: String,
}

#[derive(Deserialize)]
struct UrlImageRepr {
    url: String,
}

impl TryFrom<UrlImageRepr> for UrlImage {
    type Error = PlatformError;

    fn try_from(repr: UrlImageRepr) -> PlatformResult<Self> {
        UrlImage::new(repr.url)
    }
}

impl UrlImage {
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

/// A generated image returned inline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Base64ImageRepr")]
pub struct Base64Image {
    encoded_image: String,
}

#[derive(Deserialize)]
struct Base64ImageRepr {
    encoded_image: String,
}

impl TryFrom<Base64ImageRepr> for Base64Image {
    type Error = PlatformError;

    fn try_from(repr: Base64ImageRepr) -> PlatformResult<Self> {
        Base64Image::new(repr.encoded_image)
    }
}

impl Base64Image {
    pub fn new<S: Into<String>>(encoded_image: S) -> PlatformResult<Self> {
        let encoded_image = encoded_image.into();
        if encoded_image.is_empty() {
            return Err(PlatformError::InvalidArgument(
                "The base64 encoded image generated must be given.".to_string(),
            ));
        }
        Ok(Self { encoded_image })
    }

    pub fn encoded_image(&self) -> &str {
        &self.encoded_image
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedImage {
    Url(UrlImage),
    Base64(Base64Image),
}
