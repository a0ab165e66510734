use std::fmt;
use std::path::PathBuf;

use crate::partition::{PartitionQuery, KIB};

pub const DEFAULT_PARTITIONS_CSV: &str = "partitions.csv";
pub const DEFAULT_SETTINGS_JSON: &str = ".vscode/settings.json";
pub const READ_IMAGE: &str = "build/fs_r.bin";
pub const LITTLEFS_TYPE: &str = "littlefs";

/// Size the legacy read script always requested, regardless of the table.
pub const LEGACY_READ_SIZE: u64 = 480 * KIB;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Write,
    Read,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Write => "write",
            Operation::Read => "read",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSize {
    FromTable,
    Fixed(u64),
}

/// Named partition layout with the default paths of the matching build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// A/B filesystem partitions `fs_0`, `fs_1`, ...
    Ota { index: u32 },
    /// Single `fs` partition.
    NoOta,
    /// Write by `littlefs` type tag, read `fs_0` with a fixed 480 KiB size.
    Legacy,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Ota { index: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub query: PartitionQuery,
    pub image: PathBuf,
    pub read_size: ReadSize,
}

impl Profile {
    pub fn name(&self) -> &'static str {
        match self {
            Profile::Ota { .. } => "ota",
            Profile::NoOta => "no-ota",
            Profile::Legacy => "legacy",
        }
    }

    pub fn defaults(&self, op: Operation) -> ProfileDefaults {
        match (self, op) {
            (Profile::Ota { index }, Operation::Write) => ProfileDefaults {
                query: PartitionQuery::Name(format!("fs_{index}")),
                image: PathBuf::from(format!("build/fs_{index}.bin")),
                read_size: ReadSize::FromTable,
            },
            (Profile::Ota { index }, Operation::Read) => ProfileDefaults {
                query: PartitionQuery::Name(format!("fs_{index}")),
                image: PathBuf::from(READ_IMAGE),
                read_size: ReadSize::FromTable,
            },
            (Profile::NoOta, Operation::Write) => ProfileDefaults {
                query: PartitionQuery::Name("fs".to_string()),
                image: PathBuf::from("build/fs.bin"),
                read_size: ReadSize::FromTable,
            },
            (Profile::NoOta, Operation::Read) => ProfileDefaults {
                query: PartitionQuery::Name("fs".to_string()),
                image: PathBuf::from(READ_IMAGE),
                read_size: ReadSize::FromTable,
            },
            (Profile::Legacy, Operation::Write) => ProfileDefaults {
                query: PartitionQuery::Type(LITTLEFS_TYPE.to_string()),
                image: PathBuf::from("build/fs.bin"),
                read_size: ReadSize::FromTable,
            },
            (Profile::Legacy, Operation::Read) => ProfileDefaults {
                query: PartitionQuery::Name("fs_0".to_string()),
                image: PathBuf::from(READ_IMAGE),
                read_size: ReadSize::Fixed(LEGACY_READ_SIZE),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ota_index_drives_name_and_image() {
        let d = Profile::Ota { index: 1 }.defaults(Operation::Write);
        assert_eq!(d.query, PartitionQuery::Name("fs_1".to_string()));
        assert_eq!(d.image, PathBuf::from("build/fs_1.bin"));

        let d = Profile::Ota { index: 1 }.defaults(Operation::Read);
        assert_eq!(d.image, PathBuf::from(READ_IMAGE));
        assert_eq!(d.read_size, ReadSize::FromTable);
    }

    #[test]
    fn test_lookup_modes_differ_per_profile() {
        assert_eq!(
            Profile::NoOta.defaults(Operation::Write).query,
            PartitionQuery::Name("fs".to_string())
        );
        assert_eq!(
            Profile::Legacy.defaults(Operation::Write).query,
            PartitionQuery::Type("littlefs".to_string())
        );
        assert_eq!(
            Profile::Legacy.defaults(Operation::Read).read_size,
            ReadSize::Fixed(491_520)
        );
    }
}
