//! Simple file-backed [`ContentStore`] for lightweight deployments and bots.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	content::ContentHash,
	store::{
		ContentRecord, ContentStore, InsertOutcome, NewContentRecord, StoreError, StoreFuture,
	},
};

/// Persists content records to a JSON file after each insert.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<ContentHash, ContentRecord>>>,
}
impl FileStore {
	/// Loads the snapshot at `path`, starting empty when the file does not exist yet.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		ensure_parent_exists(&path)?;

		let snapshot = load_snapshot(&path)?;

		Ok(Self { inner: Arc::new(RwLock::new(snapshot)), path })
	}

	/// Location of the JSON snapshot.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn persist_locked(&self, contents: &HashMap<ContentHash, ContentRecord>) -> Result<(), StoreError> {
		ensure_parent_exists(&self.path)?;

		let mut records = contents.values().collect::<Vec<_>>();

		records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.hash.cmp(&b.hash)));

		let serialized =
			serde_json::to_vec_pretty(&records).map_err(|e| StoreError::Serialization {
				message: format!("Content records could not be encoded: {e}"),
			})?;

		write_replacing(&self.path, &serialized)
	}
}
impl ContentStore for FileStore {
	fn find_by_hash<'a>(&'a self, hash: &'a ContentHash) -> StoreFuture<'a, Option<ContentRecord>> {
		Box::pin(async move { Ok(self.inner.read().get(hash).cloned()) })
	}

	fn insert(&self, new: NewContentRecord) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if guard.contains_key(&new.hash) {
				return Ok(InsertOutcome::Duplicate);
			}

			let record = ContentRecord::create(new);

			guard.insert(record.hash.clone(), record.clone());

			if let Err(e) = self.persist_locked(&guard) {
				// Keep memory and disk in agreement.
				guard.remove(&record.hash);

				return Err(e);
			}

			Ok(InsertOutcome::Inserted(record))
		})
	}
}

fn load_snapshot(path: &Path) -> Result<HashMap<ContentHash, ContentRecord>, StoreError> {
	if !path.exists() {
		return Ok(HashMap::new());
	}

	let bytes = fs::read(path).map_err(|e| StoreError::Backend {
		message: format!("Failed to read {}: {e}", path.display()),
	})?;

	if bytes.is_empty() {
		return Ok(HashMap::new());
	}

	let records: Vec<ContentRecord> =
		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})?;
	let mut map = HashMap::with_capacity(records.len());

	for record in records {
		if map.contains_key(&record.hash) {
			return Err(StoreError::Serialization {
				message: format!("Duplicate record for {} in {}", record.hash, path.display()),
			});
		}

		map.insert(record.hash.clone(), record);
	}

	Ok(map)
}

/// Writes `bytes` next to `path` and renames over it, so readers only ever see a complete snapshot.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
	let staging = path.with_extension("json.partial");
	let io_failure = |action: &str, target: &Path, e: std::io::Error| StoreError::Backend {
		message: format!("Could not {action} snapshot at {}: {e}", target.display()),
	};
	let mut file = File::create(&staging).map_err(|e| io_failure("create", &staging, e))?;

	file.write_all(bytes).map_err(|e| io_failure("write", &staging, e))?;
	file.sync_all().map_err(|e| io_failure("flush", &staging, e))?;
	drop(file);

	fs::rename(&staging, path).map_err(|e| io_failure("publish", path, e))
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
			message: format!("Failed to create store directory {}: {e}", parent.display()),
		})?;
	}

	Ok(())
}
