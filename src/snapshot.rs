use crate::params::{ParamError, ParameterStore};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SNAPSHOT_HEADER: &str = "# fluid_pilot settings v1";

/// Immutable capture of a parameter set, values kept as raw strings.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSnapshot {
    source: String,
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotError {
    Io(String),
    NotFound(PathBuf),
    Parse { line: usize, message: String },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::NotFound(path) => write!(f, "snapshot not found: {}", path.display()),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Outcome of writing a snapshot into the live store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub unknown: usize,
    pub invalid: usize,
}

impl SettingsSnapshot {
    pub fn from_entries<K, V>(source: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut snap = Self {
            source: source.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        };
        for (k, v) in entries {
            snap.insert(k.into(), v.into());
        }
        snap
    }

    /// Captures every store entry for which `keep` holds.
    pub fn capture(
        source: impl Into<String>,
        store: &ParameterStore,
        keep: impl Fn(&str) -> bool,
    ) -> Self {
        Self::from_entries(
            source,
            store
                .for_each("")
                .filter(|(key, _)| keep(key))
                .map(|(key, value)| (key.to_string(), value.to_raw())),
        )
    }

    pub fn parse(source: impl Into<String>, text: &str) -> Result<Self, SnapshotError> {
        let mut snap = Self::from_entries(source, std::iter::empty::<(String, String)>());

        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key_raw, value_raw)) = line.split_once('=') else {
                return Err(SnapshotError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let key = key_raw.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(SnapshotError::Parse {
                    line: line_no,
                    message: format!("invalid key '{key}'"),
                });
            }
            if snap.index.contains_key(key) {
                warn!(source = %snap.source, line = line_no, key, "duplicate key; keeping the last value");
            }
            snap.insert(key.to_string(), value_raw.trim().to_string());
        }

        Ok(snap)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound(path.to_path_buf()));
            }
            Err(err) => return Err(SnapshotError::Io(err.to_string())),
        };
        Self::parse(path.display().to_string(), &text)
    }

    /// Writes through a temp file so readers never see a half-written snapshot.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SnapshotError::Io(e.to_string()))?;
            }
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_text()).map_err(|e| SnapshotError::Io(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| SnapshotError::Io(e.to_string()))
    }

    pub fn to_text(&self) -> String {
        let mut out = String::from(SNAPSHOT_HEADER);
        out.push('\n');
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn retain(&self, keep: impl Fn(&str) -> bool) -> Self {
        Self::from_entries(
            self.source.clone(),
            self.entries
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }

    /// Writes every entry into `store`. Unknown keys and unparseable values
    /// are skipped one at a time; the rest still land.
    pub fn apply_to(&self, store: &mut ParameterStore) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (key, raw) in &self.entries {
            match store.set_raw(key, raw) {
                Ok(()) => report.applied += 1,
                Err(ParamError::KeyNotFound(_)) => report.unknown += 1,
                Err(ParamError::InvalidValue { .. }) => report.invalid += 1,
            }
        }
        if report.unknown > 0 || report.invalid > 0 {
            debug!(
                source = %self.source,
                unknown = report.unknown,
                invalid = report.invalid,
                "snapshot entries skipped"
            );
        }
        report
    }

    fn insert(&mut self, key: String, value: String) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = value;
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }
}
