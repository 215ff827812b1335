//! Memoized module records and their `url_name`s.
//!
//! HTML content can link to a page activity before the traversal reaches it,
//! so a page's `url_name` may be minted while rendering some other activity.
//! Records are cached by activity directory so the later visit, and every
//! repeated link, reuses the name minted first.

use std::collections::HashMap;

use crate::edx::{NameRegistry, PageLinkResolver};
use crate::error::{Error, Result};
use crate::moodle::{ActivityCategory, ModuleRecord, MoodleBackup, basename};

/// A loaded module record with its assigned `url_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub url_name: String,
    pub record: ModuleRecord,
}

/// Cache of module records keyed by activity directory.
#[derive(Debug, Default)]
pub struct PageIndex {
    entries: HashMap<String, PageEntry>,
}

impl PageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the module record in `directory` and mint its `url_name`, or
    /// return the cached entry.
    pub fn resolve(
        &mut self,
        backup: &MoodleBackup,
        names: &mut NameRegistry,
        directory: &str,
        category: &ActivityCategory,
    ) -> Result<&PageEntry> {
        if !self.entries.contains_key(directory) {
            let record = backup.module(directory, category)?;
            let url_name = names.make_shared_url_name(&module_stem(directory, &record.name), "");
            self.entries
                .insert(directory.to_string(), PageEntry { url_name, record });
        }
        Ok(&self.entries[directory])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `<dir basename>__<name>` with spaces and slashes as underscores.
pub fn module_stem(directory: &str, name: &str) -> String {
    format!(
        "{}__{}",
        basename(directory),
        name.replace(' ', "_").replace('/', "_")
    )
}

/// Resolves page links by module id through a [`PageIndex`].
pub struct PageLookup<'a> {
    pub backup: &'a MoodleBackup,
    pub names: &'a mut NameRegistry,
    pub index: &'a mut PageIndex,
}

impl PageLinkResolver for PageLookup<'_> {
    fn resolve_page(&mut self, module_id: &str) -> Result<String> {
        let directory = MoodleBackup::page_directory(module_id);
        match self
            .index
            .resolve(self.backup, self.names, &directory, &ActivityCategory::Page)
        {
            Ok(entry) => Ok(entry.url_name.clone()),
            Err(Error::MissingResource { .. }) => Err(Error::missing("page", module_id)),
            Err(e) => Err(e),
        }
    }
}
