//! External image-upload client.
//!
//! The storefront never stores image bytes itself; profile and catalog
//! image fields hold URLs returned by an external object host. The
//! contract is small: POST a multipart image, get back a stable URL, or
//! fail.

use async_trait::async_trait;
use serde::Deserialize;
use storefront_types::SecretString;
use thiserror::Error;

/// Errors that can occur during an image upload.
#[derive(Debug, Error)]
pub enum UploadError {
	/// The request never completed.
	#[error("Upload request failed: {0}")]
	Http(String),
	/// The host refused the upload.
	#[error("Upload rejected with status {0}")]
	Rejected(u16),
	/// The host answered with a body we cannot extract a URL from.
	#[error("Invalid upload response: {0}")]
	InvalidResponse(String),
}

/// Trait for image-upload backends.
#[async_trait]
pub trait ImageUploader: Send + Sync {
	/// Uploads one image and returns its stable URL.
	async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, UploadError>;
}

/// Response shapes of common image hosts: either a flat `{"url": ...}`
/// or a nested `{"data": {"url": ...}}`.
#[derive(Debug, Deserialize)]
struct HostResponse {
	url: Option<String>,
	data: Option<HostResponseData>,
}

#[derive(Debug, Deserialize)]
struct HostResponseData {
	url: String,
}

/// Extracts the image URL from a host response body.
fn extract_url(body: &str) -> Result<String, UploadError> {
	let parsed: HostResponse =
		serde_json::from_str(body).map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
	parsed
		.url
		.or(parsed.data.map(|d| d.url))
		.ok_or_else(|| UploadError::InvalidResponse("no url field in response".to_string()))
}

/// HTTP multipart implementation of [`ImageUploader`].
pub struct HttpImageUploader {
	client: reqwest::Client,
	endpoint: String,
	api_key: Option<SecretString>,
}

impl HttpImageUploader {
	pub fn new(endpoint: String, api_key: Option<SecretString>) -> Self {
		Self {
			client: reqwest::Client::new(),
			endpoint,
			api_key,
		}
	}
}

#[async_trait]
impl ImageUploader for HttpImageUploader {
	async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, UploadError> {
		let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
		let form = reqwest::multipart::Form::new().part("image", part);

		let mut request = self.client.post(&self.endpoint).multipart(form);
		if let Some(key) = &self.api_key {
			request = request.query(&[("key", key.expose_secret())]);
		}

		let response = request
			.send()
			.await
			.map_err(|e| UploadError::Http(e.to_string()))?;
		let status = response.status();
		if !status.is_success() {
			return Err(UploadError::Rejected(status.as_u16()));
		}

		let body = response
			.text()
			.await
			.map_err(|e| UploadError::Http(e.to_string()))?;
		extract_url(&body)
	}
}
