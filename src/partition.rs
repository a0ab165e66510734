use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * 1024;

const COL_NAME: usize = 0;
const COL_TYPE: usize = 1;
const COL_SUBTYPE: usize = 2;
const COL_OFFSET: usize = 3;
const COL_SIZE: usize = 4;
const COL_FLAGS: usize = 5;

/// One non-comment, non-blank line of a partition table, split on commas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRow {
    pub line_no: usize,
    pub columns: Vec<String>,
}

impl PartitionRow {
    fn column(&self, idx: usize) -> Option<&str> {
        self.columns.get(idx).map(String::as_str)
    }
}

/// A full row (name, type, subtype, offset, size[, flags]) as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionEntry {
    pub line_no: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: String,
    pub offset: String,
    pub size: String,
    pub flags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionQuery {
    Name(String),
    /// Matches the filesystem-type tag (third column, e.g. `littlefs`).
    Type(String),
}

impl fmt::Display for PartitionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionQuery::Name(n) => write!(f, "name:{n}"),
            PartitionQuery::Type(t) => write!(f, "type:{t}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSize {
    /// Size text as written in the table (e.g. `480k`).
    pub raw: String,
    pub bytes: u64,
}

impl PartitionSize {
    /// True when the table used a unit suffix or hex literal.
    pub fn converted(&self) -> bool {
        self.raw != self.bytes.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPartition {
    pub name: String,
    pub line_no: usize,
    /// Offset text passed through untouched (esptool accepts the same encoding).
    pub offset: String,
    pub size: Option<PartitionSize>,
}

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("unable to read partition table {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("partition table {path:?} is not valid UTF-8 text")]
    NotText { path: PathBuf },

    #[error("partition not found: {query}")]
    NotFound { query: String },

    #[error("malformed size '{value}' for partition '{name}' at line {line_no}")]
    MalformedSize {
        name: String,
        line_no: usize,
        value: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionTable {
    rows: Vec<PartitionRow>,
}

impl PartitionTable {
    pub fn load(path: &Path) -> Result<Self, PartitionError> {
        let text = fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidData {
                PartitionError::NotText {
                    path: path.to_path_buf(),
                }
            } else {
                PartitionError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let table = Self::parse(&text);
        tracing::debug!(path = %path.display(), rows = table.rows.len(), "partition table loaded");
        Ok(table)
    }

    pub fn parse(text: &str) -> Self {
        let mut rows = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let columns: Vec<String> = line.split(',').map(|c| c.trim().to_string()).collect();
            if columns[COL_NAME].starts_with('#') {
                continue;
            }
            rows.push(PartitionRow {
                line_no: idx + 1,
                columns,
            });
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[PartitionRow] {
        &self.rows
    }

    /// Rows that carry every mandatory column; short rows are left out.
    pub fn entries(&self) -> Vec<PartitionEntry> {
        self.rows
            .iter()
            .filter(|r| r.columns.len() > COL_SIZE)
            .map(|r| PartitionEntry {
                line_no: r.line_no,
                name: r.columns[COL_NAME].clone(),
                kind: r.columns[COL_TYPE].clone(),
                subtype: r.columns[COL_SUBTYPE].clone(),
                offset: r.columns[COL_OFFSET].clone(),
                size: r.columns[COL_SIZE].clone(),
                flags: r
                    .column(COL_FLAGS)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string),
            })
            .collect()
    }

    /// Offset and normalized size of the first row named `name`.
    pub fn find_by_name(&self, name: &str) -> Result<ResolvedPartition, PartitionError> {
        self.resolve(&PartitionQuery::Name(name.to_string()), true)
    }

    /// Offset of the first row named `name`; the size column is not consulted.
    pub fn find_offset_by_name(&self, name: &str) -> Result<ResolvedPartition, PartitionError> {
        self.resolve(&PartitionQuery::Name(name.to_string()), false)
    }

    /// Offset of the first row whose filesystem-type tag equals `kind`.
    pub fn find_by_type(&self, kind: &str) -> Result<ResolvedPartition, PartitionError> {
        self.resolve(&PartitionQuery::Type(kind.to_string()), false)
    }

    pub fn resolve(
        &self,
        query: &PartitionQuery,
        with_size: bool,
    ) -> Result<ResolvedPartition, PartitionError> {
        let (column, wanted) = match query {
            PartitionQuery::Name(n) => (COL_NAME, n.trim()),
            PartitionQuery::Type(t) => (COL_SUBTYPE, t.trim()),
        };
        let required = if with_size { COL_SIZE } else { COL_OFFSET };

        let row = self
            .rows
            .iter()
            .filter(|r| r.columns.len() > required)
            .find(|r| r.column(column) == Some(wanted))
            .ok_or_else(|| PartitionError::NotFound {
                query: query.to_string(),
            })?;

        let name = row.columns[COL_NAME].clone();
        let offset = row.columns[COL_OFFSET].clone();
        if offset.is_empty() {
            tracing::debug!(%query, line_no = row.line_no, "matched row has an empty offset");
            return Err(PartitionError::NotFound {
                query: query.to_string(),
            });
        }

        let size = if with_size {
            let raw = row.columns[COL_SIZE].clone();
            if raw.is_empty() {
                tracing::debug!(%query, line_no = row.line_no, "matched row has an empty size");
                return Err(PartitionError::NotFound {
                    query: query.to_string(),
                });
            }
            let bytes = parse_size(&raw).ok_or_else(|| PartitionError::MalformedSize {
                name: name.clone(),
                line_no: row.line_no,
                value: raw.clone(),
            })?;
            Some(PartitionSize { raw, bytes })
        } else {
            None
        };

        tracing::debug!(%query, line_no = row.line_no, %offset, "partition matched");

        Ok(ResolvedPartition {
            name,
            line_no: row.line_no,
            offset,
            size,
        })
    }
}

/// Normalize a size literal to bytes: `480` -> 480, `480k` -> 491520, `1M` -> 1048576.
///
/// A `0x` hex literal is accepted as well. Returns `None` for anything else,
/// including values that overflow `u64`.
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(v) = s.strip_suffix('k') {
        return parse_plain(v)?.checked_mul(KIB);
    }
    if let Some(v) = s.strip_suffix('M') {
        return parse_plain(v)?.checked_mul(MIB);
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        return u64::from_str_radix(hex, 16).ok();
    }
    parse_plain(s)
}

fn parse_plain(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
