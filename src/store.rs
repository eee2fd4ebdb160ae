//! Content-addressed result storage and the deduplication wrapper around it.
//!
//! A [`ContentStore`] owns the uniqueness rule: at most one [`ContentRecord`] per
//! [`ContentHash`]. [`DedupStore`] layers the lookup-before-insert protocol on top and
//! resolves the race where two callers both saw a hash as new.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, content::ContentHash};

/// Boxed future returned by [`ContentStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Backing store contract for analysis results keyed by content hash.
pub trait ContentStore
where
	Self: Send + Sync,
{
	/// Fetches the record stored for `hash`, if any.
	fn find_by_hash<'a>(&'a self, hash: &'a ContentHash) -> StoreFuture<'a, Option<ContentRecord>>;

	/// Inserts a record, reporting [`InsertOutcome::Duplicate`] when the hash already exists.
	fn insert(&self, record: NewContentRecord) -> StoreFuture<'_, InsertOutcome>;
}

/// Result of a raw [`ContentStore::insert`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
	/// The record was created.
	Inserted(ContentRecord),
	/// Another record already owns the hash; nothing was written.
	Duplicate,
}

/// Error type produced by [`ContentStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The store reported a duplicate but the winning record could not be read back.
	#[error("Record for {hash} vanished after a duplicate insert.")]
	MissingAfterDuplicate {
		/// Hash whose record was expected.
		hash: ContentHash,
	},
}

/// Store-assigned record identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(uuid::Uuid);
impl RecordId {
	/// Generates a random identifier.
	pub fn generate() -> Self {
		Self(uuid::Uuid::new_v4())
	}
}
impl Debug for RecordId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "RecordId({})", self.0)
	}
}
impl Display for RecordId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}

/// Stored analysis result. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
	/// Store-assigned identifier.
	pub id: RecordId,
	/// Hash of the analyzed content.
	pub hash: ContentHash,
	/// Model output for the content.
	pub analysis: String,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl ContentRecord {
	/// Materializes a new record with a fresh id and the current timestamp.
	pub fn create(new: NewContentRecord) -> Self {
		Self {
			id: RecordId::generate(),
			hash: new.hash,
			analysis: new.analysis,
			created_at: OffsetDateTime::now_utc(),
		}
	}
}

/// Fields supplied by the caller for a record that does not exist yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewContentRecord {
	/// Hash of the analyzed content.
	pub hash: ContentHash,
	/// Model output for the content.
	pub analysis: String,
}
impl NewContentRecord {
	/// Pairs a hash with its analysis.
	pub fn new(hash: ContentHash, analysis: impl Into<String>) -> Self {
		Self { hash, analysis: analysis.into() }
	}
}

/// Whether [`DedupStore::insert_or_existing`] created the record or found a prior one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stored {
	/// The caller's fields were stored.
	Inserted(ContentRecord),
	/// Another caller's record won; the caller's fields were discarded.
	Existing(ContentRecord),
}
impl Stored {
	/// Returns the stored record regardless of who created it.
	pub fn record(&self) -> &ContentRecord {
		match self {
			Self::Inserted(record) | Self::Existing(record) => record,
		}
	}

	/// Consumes the tag and returns the record.
	pub fn into_record(self) -> ContentRecord {
		match self {
			Self::Inserted(record) | Self::Existing(record) => record,
		}
	}

	/// Returns `true` when this call created the record.
	pub fn is_inserted(&self) -> bool {
		matches!(self, Self::Inserted(_))
	}
}

/// Lookup-then-insert wrapper that guarantees one record per hash.
#[derive(Clone)]
pub struct DedupStore {
	inner: Arc<dyn ContentStore>,
}
impl DedupStore {
	/// Wraps a backing store.
	pub fn new(inner: Arc<dyn ContentStore>) -> Self {
		Self { inner }
	}

	/// Returns the previous result for `hash`, if any.
	pub async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<ContentRecord>> {
		Ok(self.inner.find_by_hash(hash).await?)
	}

	/// Stores `new` unless a record for its hash exists, returning whichever record is kept.
	pub async fn insert_if_absent(&self, new: NewContentRecord) -> Result<ContentRecord> {
		Ok(self.insert_or_existing(new).await?.into_record())
	}

	/// Like [`insert_if_absent`](Self::insert_if_absent), tagging whether this call won.
	pub async fn insert_or_existing(&self, new: NewContentRecord) -> Result<Stored> {
		if let Some(existing) = self.inner.find_by_hash(&new.hash).await? {
			return Ok(Stored::Existing(existing));
		}

		let hash = new.hash.clone();

		match self.inner.insert(new).await? {
			InsertOutcome::Inserted(record) => Ok(Stored::Inserted(record)),
			InsertOutcome::Duplicate => {
				#[cfg(feature = "tracing")]
				tracing::debug!(%hash, "Concurrent insert won; reading back the stored record.");

				self.inner
					.find_by_hash(&hash)
					.await?
					.map(Stored::Existing)
					.ok_or_else(|| StoreError::MissingAfterDuplicate { hash }.into())
			},
		}
	}
}
impl Debug for DedupStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DedupStore").finish_non_exhaustive()
	}
}
