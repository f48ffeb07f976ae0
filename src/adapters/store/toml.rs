//! TOML-backed key/value store built on `toml_edit`.
//!
//! Dotted keys map onto nested tables (`meta.file_version` is `[meta] file_version = "..."`).
//! Comments and formatting of untouched entries survive a flush.
use std::path::{Path, PathBuf};

use toml_edit::{DocumentMut, Item, Table, TableLike};

use super::{KeyValueStore, StoreError, StoreOpener, StoreResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct TomlStoreOpener;

impl StoreOpener for TomlStoreOpener {
    fn open(&self, path: &Path) -> StoreResult<Box<dyn KeyValueStore>> {
        Ok(Box::new(TomlStore::open(path)?))
    }
}

#[derive(Debug)]
pub struct TomlStore {
    path: PathBuf,
    doc: DocumentMut,
    /// Changes not yet flushed, in the order they were made.
    pending: Vec<(String, String)>,
    /// Parse failure recorded at open; the store refuses to flush over a file it could not read.
    failure: Option<String>,
}

enum Loaded {
    Doc(DocumentMut, String),
    Malformed(String),
}

fn load(path: &Path) -> StoreResult<Loaded> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };
    Ok(match text.parse::<DocumentMut>() {
        Ok(doc) => Loaded::Doc(doc, text),
        Err(e) => Loaded::Malformed(e.to_string()),
    })
}

fn split_key(key: &str) -> Vec<&str> {
    key.split('.').filter(|p| !p.is_empty()).collect()
}

fn implicit_table() -> Item {
    let mut t = Table::new();
    t.set_implicit(true);
    Item::Table(t)
}

fn set_path(root: &mut dyn TableLike, parts: &[&str], value: &str) {
    match parts {
        [] => {}
        [leaf] => {
            root.insert(leaf, toml_edit::value(value));
        }
        [head, rest @ ..] => {
            let is_table = root.get(head).is_some_and(Item::is_table_like);
            if !is_table {
                root.insert(head, implicit_table());
            }
            if let Some(child) = root.get_mut(head).and_then(Item::as_table_like_mut) {
                set_path(child, rest, value);
            }
        }
    }
}

fn get_path<'a>(root: &'a dyn TableLike, parts: &[&str]) -> Option<&'a Item> {
    match parts {
        [] => None,
        [leaf] => root.get(leaf),
        [head, rest @ ..] => get_path(root.get(head)?.as_table_like()?, rest),
    }
}

impl TomlStore {
    /// Bind a store to `path`. A malformed file does not fail here; it is reported by `status()`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file exists but cannot be read.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let (doc, failure) = match load(path)? {
            Loaded::Doc(doc, _) => (doc, None),
            Loaded::Malformed(msg) => (DocumentMut::new(), Some(msg)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            pending: Vec::new(),
            failure,
        })
    }
}

impl KeyValueStore for TomlStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn get(&self, key: &str) -> Option<String> {
        let item = get_path(self.doc.as_table(), &split_key(key))?;
        if let Some(s) = item.as_str() {
            return Some(s.to_string());
        }
        let mut v = item.as_value()?.clone();
        v.decor_mut().clear();
        Some(v.to_string())
    }

    fn set(&mut self, key: &str, value: &str) {
        set_path(self.doc.as_table_mut(), &split_key(key), value);
        self.pending.push((key.to_string(), value.to_string()));
    }

    fn flush(&mut self) -> StoreResult<()> {
        self.status()?;
        // Merge: start from what is on disk now so other stores' flushed changes survive.
        let (mut doc, on_disk) = match load(&self.path)? {
            Loaded::Doc(doc, text) => (doc, text),
            Loaded::Malformed(msg) => {
                return Err(StoreError::Format {
                    path: self.path.display().to_string(),
                    msg,
                })
            }
        };
        for (k, v) in &self.pending {
            set_path(doc.as_table_mut(), &split_key(k), v);
        }
        let rendered = doc.to_string();
        if rendered != on_disk || !self.path.exists() {
            std::fs::write(&self.path, rendered.as_bytes()).map_err(|source| StoreError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        self.doc = doc;
        self.pending.clear();
        Ok(())
    }

    fn status(&self) -> StoreResult<()> {
        match &self.failure {
            None => Ok(()),
            Some(msg) => Err(StoreError::Format {
                path: self.path.display().to_string(),
                msg: msg.clone(),
            }),
        }
    }
}
