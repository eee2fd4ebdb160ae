//! File upload request and response bodies.

// crates.io
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
// self
use crate::{
	_prelude::*,
	api,
	auth::{Credential, FileId},
	error::ConfigError,
	http::{HttpRequest, HttpResponse, Method},
};

/// Value of the `purpose` form field sent with every upload.
pub const UPLOAD_PURPOSE: &str = "general";

/// Multipart upload body, encoded once and reused across retries.
#[derive(Clone, Debug)]
pub struct EncodedUpload {
	/// `Content-Type` header including the boundary.
	pub content_type: String,
	/// Encoded multipart bytes.
	pub body: Vec<u8>,
}
impl EncodedUpload {
	/// Encodes the `file` part followed by `purpose=general` into one buffer.
	///
	/// Filenames and MIME types end up in part headers, so control characters are rejected
	/// with [`ConfigError::InvalidUploadField`] and the MIME type must parse.
	pub async fn encode(filename: &str, mime_type: &str, bytes: &[u8]) -> Result<Self> {
		ensure_header_safe("filename", filename)?;
		ensure_header_safe("MIME type", mime_type)?;

		let file = Part::bytes(bytes.to_vec())
			.file_name(filename.to_owned())
			.mime_str(mime_type)
			.map_err(|source| ConfigError::UploadEncoding { source })?;
		let form = Form::new().part("file", file).text("purpose", UPLOAD_PURPOSE);
		let content_type = format!("multipart/form-data; boundary={}", form.boundary());
		let body = form
			.into_stream()
			.try_fold(Vec::with_capacity(bytes.len() + 512), |mut body, chunk| async move {
				body.extend_from_slice(&chunk);

				Ok::<_, ReqwestError>(body)
			})
			.await
			.map_err(|source| ConfigError::UploadEncoding { source })?;

		Ok(Self { content_type, body })
	}

	/// Builds an authorized `POST <api>/files` request.
	pub fn to_request(&self, url: &Url, credential: &Credential) -> Result<HttpRequest> {
		api::authorized_request(Method::POST, url, credential, &self.content_type, self.body.clone())
	}
}

fn ensure_header_safe(field: &'static str, value: &str) -> Result<(), ConfigError> {
	if value.chars().any(char::is_control) {
		return Err(ConfigError::InvalidUploadField { field });
	}

	Ok(())
}

#[derive(Deserialize)]
struct UploadResponse {
	id: Option<FileId>,
}

/// Extracts the identifier assigned to an uploaded file.
///
/// A missing or `null` id is an [`Error::EmptyResult`]; an id that fails identifier
/// validation is reported as [`Error::MalformedResponse`].
pub fn decode_upload(response: HttpResponse) -> Result<FileId> {
	let parsed: UploadResponse = api::decode_json("upload", response.body())?;

	parsed.id.ok_or(Error::EmptyResult { operation: "upload" })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn upload_body_carries_file_and_purpose() {
		let upload = EncodedUpload::encode("cat.png", "image/png", b"pixels")
			.await
			.expect("Upload should encode.");
		let rendered = String::from_utf8(upload.body.clone()).expect("Body should be UTF-8.");
		let boundary = upload
			.content_type
			.strip_prefix("multipart/form-data; boundary=")
			.expect("Content type should carry the boundary.");

		assert!(rendered.starts_with(&format!("--{boundary}\r\n")));
		assert!(rendered.contains(
			"name=\"file\"; filename=\"cat.png\"\r\nContent-Type: image/png\r\n\r\npixels\r\n"
		));
		assert!(rendered.contains("name=\"purpose\"\r\n\r\ngeneral\r\n"));
		assert!(rendered.ends_with(&format!("--{boundary}--\r\n")));
	}

	#[tokio::test]
	async fn each_upload_gets_its_own_boundary() {
		let a = EncodedUpload::encode("a.png", "image/png", b"a").await.expect("Upload should encode.");
		let b = EncodedUpload::encode("b.png", "image/png", b"b").await.expect("Upload should encode.");

		assert_ne!(a.content_type, b.content_type);
	}

	#[tokio::test]
	async fn header_fields_cannot_smuggle_line_breaks() {
		let err = EncodedUpload::encode("cat.png", "image/png\r\nX-Injected: 1", b"")
			.await
			.expect_err("CR/LF in the MIME type should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidUploadField { field: "MIME type" })));

		let err = EncodedUpload::encode("a\nb.png", "image/png", b"")
			.await
			.expect_err("Line breaks in the filename should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidUploadField { field: "filename" })));

		let err = EncodedUpload::encode("cat.png", "not a mime", b"")
			.await
			.expect_err("Unparseable MIME types should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::UploadEncoding { .. })));
	}

	#[test]
	fn decode_upload_reads_id() {
		let id = decode_upload(HttpResponse::new(br#"{"id":"file-9","bytes":6}"#.to_vec()))
			.expect("Upload response should decode.");

		assert_eq!(id.as_ref(), "file-9");
	}

	#[test]
	fn decode_upload_distinguishes_empty_and_malformed() {
		let err = decode_upload(HttpResponse::new(b"{}".to_vec()))
			.expect_err("Missing id should be rejected.");

		assert!(matches!(err, Error::EmptyResult { operation: "upload" }));

		let err = decode_upload(HttpResponse::new(br#"{"id":"has space"}"#.to_vec()))
			.expect_err("Invalid id should be rejected.");

		assert!(matches!(err, Error::MalformedResponse { operation: "upload", .. }));
	}
}
