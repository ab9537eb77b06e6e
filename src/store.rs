//! JSON-file item store.
//!
//! The whole collection lives in one document, `{"items": [...]}`, which is
//! read in full, merged in memory, and rewritten in full on every save.
//! Items are written in canonical order (see [`Item`]'s `Ord`), so loading
//! returns them in that order too.
//!
//! The store assumes a single writer; nothing here locks the file.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StorageError, StorageResult, ValidationError};
use crate::item::{parse_published, Item, ItemRecord};

/// Store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonItemStore {
    path: PathBuf,
}

#[derive(Serialize)]
struct Document<'a> {
    items: &'a [Item],
}

impl JsonItemStore {
    /// Point a store at `path`.  Nothing is read or created until the first
    /// load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored item in canonical order.
    ///
    /// A missing file is an empty store.  Any malformed element aborts the
    /// whole load.
    pub fn load_all(&self) -> StorageResult<Vec<Item>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let document: Value =
            serde_json::from_str(&text).map_err(|source| StorageError::InvalidJson {
                path: self.path.clone(),
                source,
            })?;

        let entries = match document.get("items") {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(StorageError::ItemsNotArray {
                    path: self.path.clone(),
                })
            }
            // Covers both a non-object document and an object without the key.
            None => {
                return Err(StorageError::MissingItems {
                    path: self.path.clone(),
                })
            }
        };

        let mut items = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| self.decode_entry(index, entry))
            .collect::<StorageResult<Vec<_>>>()?;
        items.sort();

        tracing::debug!(path = %self.path.display(), count = items.len(), "loaded items");
        Ok(items)
    }

    /// Merge `items` into the store and rewrite the file.
    ///
    /// Incoming items replace stored ones with the same `item_id` wholesale.
    /// Items with a blank id are skipped.  The existing file is read before
    /// anything is written, so a corrupt store is reported, not overwritten.
    pub fn save_many<'a, I>(&self, items: I) -> StorageResult<()>
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let mut merged: HashMap<String, Item> = self
            .load_all()?
            .into_iter()
            .filter(|item| !is_blank_id(item))
            .map(|item| (item.item_id().to_string(), item))
            .collect();

        let before = merged.len();
        let mut incoming = 0usize;
        for item in items {
            if is_blank_id(item) {
                tracing::debug!(title = item.title(), "skipping item without an id");
                continue;
            }
            incoming += 1;
            merged.insert(item.item_id().to_string(), item.clone());
        }

        let mut ordered: Vec<Item> = merged.into_values().collect();
        ordered.sort();

        self.write_document(&ordered)?;
        tracing::info!(
            path = %self.path.display(),
            incoming,
            added = ordered.len() - before,
            total = ordered.len(),
            "saved items"
        );
        Ok(())
    }

    fn decode_entry(&self, index: usize, entry: &Value) -> StorageResult<Item> {
        if !entry.is_object() {
            return Err(StorageError::ItemNotObject {
                path: self.path.clone(),
                index,
            });
        }

        let timestamp_err = |source| StorageError::InvalidTimestamp {
            path: self.path.clone(),
            index,
            source,
        };
        let item_err = |reason: String| StorageError::InvalidItem {
            path: self.path.clone(),
            index,
            reason,
        };

        if let Some(published) = entry.get("published").filter(|v| !v.is_string()) {
            return Err(timestamp_err(ValidationError::TimestampNotString(
                published.to_string(),
            )));
        }

        let record = ItemRecord::deserialize(entry).map_err(|e| item_err(e.to_string()))?;
        let published = parse_published(&record.published).map_err(timestamp_err)?;

        Item::new(
            record.item_id,
            record.source_type,
            record.source_url,
            record.title,
            record.link,
            published,
            record.seen,
        )
        .map_err(|e| item_err(e.to_string()))
    }

    /// Write the document next to the store and rename it into place, so a
    /// reader never sees a half-written file.
    fn write_document(&self, items: &[Item]) -> StorageResult<()> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut json = serde_json::to_string_pretty(&Document { items }).map_err(|source| {
            StorageError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;
        json.push('\n');

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(io_err)?;
        if let Err(source) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_err(source));
        }
        Ok(())
    }
}

fn is_blank_id(item: &Item) -> bool {
    item.item_id().trim().is_empty()
}

/// Items from `incoming` whose id is not in `existing`, in incoming order.
///
/// An id repeated within `incoming` is reported once (first occurrence).
/// Blank ids are dropped, matching what [`JsonItemStore::save_many`] keeps.
pub fn diff_new_items(existing: &[Item], incoming: &[Item]) -> Vec<Item> {
    let mut known: HashSet<&str> = existing.iter().map(Item::item_id).collect();
    incoming
        .iter()
        .filter(|item| !is_blank_id(item) && known.insert(item.item_id()))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
