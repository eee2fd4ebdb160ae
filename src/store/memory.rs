//! Thread-safe in-memory [`ContentStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	content::ContentHash,
	store::{ContentRecord, ContentStore, InsertOutcome, NewContentRecord, StoreFuture},
};

type RecordMap = Arc<RwLock<HashMap<ContentHash, ContentRecord>>>;

/// Process-local store; uniqueness per hash is enforced under the write lock.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(RecordMap);
impl MemoryStore {
	/// Number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing has been stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn insert_now(map: RecordMap, new: NewContentRecord) -> InsertOutcome {
		let mut guard = map.write();

		if guard.contains_key(&new.hash) {
			return InsertOutcome::Duplicate;
		}

		let record = ContentRecord::create(new);

		guard.insert(record.hash.clone(), record.clone());

		InsertOutcome::Inserted(record)
	}
}
impl ContentStore for MemoryStore {
	fn find_by_hash<'a>(&'a self, hash: &'a ContentHash) -> StoreFuture<'a, Option<ContentRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(hash).cloned()) })
	}

	fn insert(&self, record: NewContentRecord) -> StoreFuture<'_, InsertOutcome> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::insert_now(map, record)) })
	}
}
