//! Content addressing and the download collaborator.
//!
//! [`ContentHash`] is the deduplication key: the SHA-256 digest of the raw bytes rendered
//! as 64 lowercase hex characters. Identical bytes always map to the same hash, and a single
//! flipped bit produces a different one.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, provider::DEFAULT_MAX_UPLOAD_BYTES};

const HASH_HEX_LEN: usize = 64;

/// SHA-256 digest of a piece of content, stored as lowercase hex.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);
impl ContentHash {
	/// Hashes `bytes`.
	pub fn compute(bytes: &[u8]) -> Self {
		Self(hex::encode(Sha256::digest(bytes)))
	}

	/// Parses a hex digest, accepting either case and normalizing to lowercase.
	pub fn parse(value: &str) -> Result<Self, ContentHashError> {
		if value.len() != HASH_HEX_LEN {
			return Err(ContentHashError::Length { len: value.len() });
		}
		if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
			return Err(ContentHashError::NonHex);
		}

		Ok(Self(value.to_ascii_lowercase()))
	}

	/// Returns the hex digest.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for ContentHash {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<ContentHash> for String {
	fn from(value: ContentHash) -> Self {
		value.0
	}
}
impl TryFrom<String> for ContentHash {
	type Error = ContentHashError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}
impl FromStr for ContentHash {
	type Err = ContentHashError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Debug for ContentHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ContentHash({})", self.0)
	}
}
impl Display for ContentHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Error returned when a string is not a SHA-256 hex digest.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ContentHashError {
	/// Wrong number of characters.
	#[error("Content hash must be 64 hex characters, got {len}.")]
	Length {
		/// Length of the rejected value.
		len: usize,
	},
	/// Non-hex characters present.
	#[error("Content hash contains non-hex characters.")]
	NonHex,
}

/// Bytes returned by a [`ContentSource`] together with their upload metadata.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchedContent {
	/// Raw content.
	pub bytes: Vec<u8>,
	/// File name used for the upload part.
	pub filename: String,
	/// MIME type used for the upload part.
	pub mime_type: String,
}
impl FetchedContent {
	/// Bundles downloaded bytes with their metadata.
	pub fn new(bytes: Vec<u8>, filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
		Self { bytes, filename: filename.into(), mime_type: mime_type.into() }
	}

	/// Hash of the downloaded bytes.
	pub fn hash(&self) -> ContentHash {
		ContentHash::compute(&self.bytes)
	}
}
impl Debug for FetchedContent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FetchedContent")
			.field("len", &self.bytes.len())
			.field("filename", &self.filename)
			.field("mime_type", &self.mime_type)
			.finish()
	}
}

/// Failure reported by a [`ContentSource`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum FetchError {
	/// Nothing exists at the location.
	#[error("No content found at {location}.")]
	NotFound {
		/// Requested location.
		location: String,
	},
	/// The content is larger than the source accepts; reading stopped at the limit.
	#[error("Content at {location} exceeds the {limit}-byte limit.")]
	TooLarge {
		/// Requested location.
		location: String,
		/// Byte ceiling of the source.
		limit: usize,
	},
	/// The download failed for any other reason.
	#[error("Downloading {location} failed: {message}.")]
	Failed {
		/// Requested location.
		location: String,
		/// Human-readable error payload.
		message: String,
	},
}

/// Boxed future returned by [`ContentSource::fetch`].
pub type FetchFuture<'a> =
	Pin<Box<dyn Future<Output = Result<FetchedContent, FetchError>> + 'a + Send>>;

/// Download collaborator used by the ingest flow.
pub trait ContentSource
where
	Self: Send + Sync,
{
	/// Downloads the content stored at `location`.
	fn fetch<'a>(&'a self, location: &'a str) -> FetchFuture<'a>;
}

/// [`ContentSource`] that downloads absolute URLs with reqwest.
///
/// Bodies are read chunk by chunk and abandoned once they pass `max_bytes`, which defaults
/// to [`DEFAULT_MAX_UPLOAD_BYTES`].
#[derive(Clone, Debug)]
pub struct ReqwestContentSource {
	client: ReqwestClient,
	max_bytes: usize,
}
impl ReqwestContentSource {
	const FALLBACK_FILENAME: &'static str = "content";
	const FALLBACK_MIME: &'static str = "application/octet-stream";

	/// Downloads through `client` with the default byte ceiling.
	pub fn new(client: ReqwestClient) -> Self {
		Self { client, max_bytes: DEFAULT_MAX_UPLOAD_BYTES }
	}

	/// Overrides the byte ceiling, usually with the descriptor's `max_upload_bytes`.
	pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
		self.max_bytes = max_bytes;

		self
	}

	async fn fetch_now(&self, location: &str) -> Result<FetchedContent, FetchError> {
		let failed =
			|message: String| FetchError::Failed { location: location.to_owned(), message };
		let too_large =
			|| FetchError::TooLarge { location: location.to_owned(), limit: self.max_bytes };
		let url = Url::parse(location).map_err(|e| failed(e.to_string()))?;
		let mut response =
			self.client.get(url.clone()).send().await.map_err(|e| failed(e.to_string()))?;
		let status = response.status();

		if status == reqwest::StatusCode::NOT_FOUND {
			return Err(FetchError::NotFound { location: location.to_owned() });
		}
		if !status.is_success() {
			return Err(failed(format!("status {}", status.as_u16())));
		}

		let limit = u64::try_from(self.max_bytes).unwrap_or(u64::MAX);

		if response.content_length().is_some_and(|len| len > limit) {
			return Err(too_large());
		}

		let mime_type = response
			.headers()
			.get(reqwest::header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.split(';').next())
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.unwrap_or(Self::FALLBACK_MIME)
			.to_owned();
		let filename = url
			.path_segments()
			.and_then(|mut segments| segments.next_back())
			.filter(|segment| !segment.is_empty())
			.unwrap_or(Self::FALLBACK_FILENAME)
			.to_owned();
		let mut bytes = Vec::new();

		while let Some(chunk) = response.chunk().await.map_err(|e| failed(e.to_string()))? {
			if bytes.len() + chunk.len() > self.max_bytes {
				return Err(too_large());
			}

			bytes.extend_from_slice(&chunk);
		}

		Ok(FetchedContent::new(bytes, filename, mime_type))
	}
}
impl Default for ReqwestContentSource {
	fn default() -> Self {
		Self::new(ReqwestClient::default())
	}
}
impl ContentSource for ReqwestContentSource {
	fn fetch<'a>(&'a self, location: &'a str) -> FetchFuture<'a> {
		Box::pin(self.fetch_now(location))
	}
}
