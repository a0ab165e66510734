use std::path::PathBuf;

use crate::profile::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialSource {
    Settings,
    Override,
}

impl SerialSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SerialSource::Settings => "settings",
            SerialSource::Override => "override",
        }
    }
}

#[derive(Debug, Clone)]
pub enum OperationEvent {
    TableLoaded {
        path: PathBuf,
        entries: usize,
    },
    PartitionResolved {
        query: String,
        name: String,
        offset: String,
        size: Option<u64>,
    },
    SizeConverted {
        raw: String,
        bytes: u64,
    },
    FixedSizeMismatch {
        fixed: u64,
        table: u64,
    },
    SerialResolved {
        port: String,
        baud: String,
        source: SerialSource,
    },
    PortNotDetected {
        port: String,
    },
    ToolStart {
        operation: Operation,
        command_line: String,
    },
    ToolExited {
        code: i32,
    },
}
