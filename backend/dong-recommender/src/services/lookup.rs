/// Display-name lookups (category code → name, location code → name).
///
/// Both tables are optional at startup; callers hold `Option<NameLookup>`
/// and treat absence as "no names".
use crate::error::{AppError, Result};
use crate::utils::normalize_key;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct NameLookup {
    /// (code, name) pairs in file order
    entries: Vec<(String, String)>,
    /// code -> index of its first entry
    index: HashMap<String, usize>,
}

impl NameLookup {
    pub fn from_entries<I, C, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let mut lookup = Self::default();
        for (code, name) in entries {
            let code: String = code.into();
            let name: String = name.into();
            let code = normalize_key(&code).to_string();
            let name = name.trim().to_string();
            lookup
                .index
                .entry(code.clone())
                .or_insert(lookup.entries.len());
            lookup.entries.push((code, name));
        }
        lookup
    }

    /// Load a lookup table, returning `None` when the file does not exist.
    pub fn load_optional<P: AsRef<Path>>(
        path: P,
        code_column: &str,
        name_column: &str,
    ) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Lookup table not found, names will be omitted");
            return Ok(None);
        }

        let file = File::open(path)?;
        let lookup = Self::from_reader(file, code_column, name_column)?;
        info!(path = %path.display(), entries = lookup.len(), "Lookup table loaded");
        Ok(Some(lookup))
    }

    pub fn from_reader<R: Read>(reader: R, code_column: &str, name_column: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let code_idx = headers.iter().position(|h| h == code_column).ok_or_else(|| {
            AppError::DataLoad(format!("Lookup table is missing the '{}' column", code_column))
        })?;
        let Some(name_idx) = headers.iter().position(|h| h == name_column) else {
            warn!(column = name_column, "Lookup table has no name column");
            return Ok(Self::default());
        };

        let mut entries = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let code = record.get(code_idx).unwrap_or_default().to_string();
            let name = record.get(name_idx).unwrap_or_default().to_string();
            entries.push((code, name));
        }

        Ok(Self::from_entries(entries))
    }

    /// Name of the first entry for `code`.
    pub fn name(&self, code: &str) -> Option<&str> {
        self.index
            .get(normalize_key(code))
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(code, name)| (code.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
