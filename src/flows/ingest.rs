//! Download, deduplicate, and analyze external content.
//!
//! Ingesting a location costs at most one paid analysis per distinct content hash: the
//! bytes are hashed first, a stored result short-circuits the model call, and when two
//! callers race on the same new hash the store keeps the first record and both callers
//! receive it.

// self
use crate::{
	_prelude::*,
	content::{ContentHash, ContentSource, FetchedContent},
	deadline::Deadline,
	flows::{Broker, observe},
	http::ApiHttpClient,
	obs::OperationKind,
	store::{ContentRecord, DedupStore, NewContentRecord, Stored},
};

/// How an ingest call obtained its record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
	/// A stored result existed; no model call was made.
	Reused(ContentRecord),
	/// This call analyzed the content and stored the result.
	Analyzed(ContentRecord),
	/// This call analyzed the content but a concurrent caller stored first; its record wins.
	Superseded(ContentRecord),
}
impl IngestOutcome {
	/// Returns the stored record.
	pub fn record(&self) -> &ContentRecord {
		match self {
			Self::Reused(record) | Self::Analyzed(record) | Self::Superseded(record) => record,
		}
	}

	/// Consumes the outcome and returns the stored record.
	pub fn into_record(self) -> ContentRecord {
		match self {
			Self::Reused(record) | Self::Analyzed(record) | Self::Superseded(record) => record,
		}
	}
}

/// Runs the download → hash → lookup → analyze → insert pipeline.
pub struct ImageIngestor<C>
where
	C: ?Sized + ApiHttpClient,
{
	broker: Broker<C>,
	source: Arc<dyn ContentSource>,
	store: DedupStore,
	download_deadline: Deadline,
	prompt: String,
}
impl<C> ImageIngestor<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates an ingestor that analyzes new content with `prompt`.
	pub fn new(
		broker: Broker<C>,
		source: Arc<dyn ContentSource>,
		store: DedupStore,
		prompt: impl Into<String>,
	) -> Result<Self> {
		let prompt = prompt.into();

		if prompt.trim().is_empty() {
			return Err(crate::error::ConfigError::EmptyPrompt.into());
		}

		Ok(Self {
			download_deadline: Deadline::new(broker.descriptor().policy.download_timeout)?,
			broker,
			source,
			store,
			prompt,
		})
	}

	/// Dedup store backing this ingestor.
	pub fn store(&self) -> &DedupStore {
		&self.store
	}

	/// Downloads `location` under the download deadline, then ingests the bytes.
	pub async fn ingest(&self, location: &str) -> Result<IngestOutcome> {
		observe(OperationKind::Ingest, "ingest", async {
			let content = self
				.download_deadline
				.run(async { Ok(self.source.fetch(location).await?) })
				.await?;

			self.ingest_fetched(content).await
		})
		.await
	}

	/// Ingests content that is already in memory.
	pub async fn ingest_content(&self, content: FetchedContent) -> Result<IngestOutcome> {
		observe(OperationKind::Ingest, "ingest_content", self.ingest_fetched(content)).await
	}

	async fn ingest_fetched(&self, content: FetchedContent) -> Result<IngestOutcome> {
		let hash = ContentHash::compute(&content.bytes);

		if let Some(existing) = self.store.find_by_hash(&hash).await? {
			#[cfg(feature = "tracing")]
			tracing::debug!(%hash, record = %existing.id, "Reusing stored analysis.");

			return Ok(IngestOutcome::Reused(existing));
		}

		let analysis = self.broker.analyze_bytes(&content, &self.prompt).await?;

		Ok(match self.store.insert_or_existing(NewContentRecord::new(hash, analysis)).await? {
			Stored::Inserted(record) => IngestOutcome::Analyzed(record),
			Stored::Existing(record) => IngestOutcome::Superseded(record),
		})
	}
}
impl<C> Debug for ImageIngestor<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ImageIngestor")
			.field("broker", &self.broker)
			.field("download_deadline", &self.download_deadline)
			.finish_non_exhaustive()
	}
}
