use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{
    esptool::{self, EsptoolCommand, EsptoolInvocation, FlashAction, ToolStdout},
    operation::{OperationEvent, SerialSource},
    partition::{PartitionError, PartitionQuery, PartitionTable, ResolvedPartition},
    ports,
    profile::{self, Operation, Profile, ReadSize},
    settings::{self, SerialSettings, SettingsError, SettingsPlatform},
};

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Supplies the lookup, image path and read size unless overridden below.
    pub profile: Profile,

    pub partitions: PathBuf,
    pub settings: PathBuf,
    /// Selects `idf.portWin` vs `idf.port`.
    pub platform: SettingsPlatform,

    pub query: Option<PartitionQuery>,
    pub image: Option<PathBuf>,
    /// Read length in bytes; replaces the profile's read size.
    pub size: Option<u64>,

    /// With both `port` and `baud` set, the settings file is not read.
    pub port: Option<String>,
    pub baud: Option<String>,

    pub chip: String,
    pub esptool: EsptoolCommand,
    pub tool_stdout: ToolStdout,

    /// Warn when the serial port is not among the detected ports.
    pub check_port: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            partitions: PathBuf::from(profile::DEFAULT_PARTITIONS_CSV),
            settings: PathBuf::from(profile::DEFAULT_SETTINGS_JSON),
            platform: SettingsPlatform::host(),
            query: None,
            image: None,
            size: None,
            port: None,
            baud: None,
            chip: esptool::DEFAULT_CHIP.to_string(),
            esptool: EsptoolCommand::default(),
            tool_stdout: ToolStdout::Inherit,
            check_port: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoaderErrorKind {
    MissingFile,
    NotFound,
    InvalidTable,
    InvalidSettings,
    ToolFailed,
    Unexpected,
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("{what} not found: {path:?}")]
    MissingFile { what: &'static str, path: PathBuf },

    #[error("{source}")]
    Table {
        #[source]
        source: PartitionError,
    },

    #[error("{source}")]
    Settings {
        #[source]
        source: SettingsError,
    },

    #[error("unable to create output directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("flashing tool failed: {source}")]
    Tool {
        #[source]
        source: esptool::EsptoolError,
    },
}

impl LoaderError {
    pub fn kind(&self) -> LoaderErrorKind {
        match self {
            LoaderError::MissingFile { .. } => LoaderErrorKind::MissingFile,
            LoaderError::Table { source } => match source {
                PartitionError::NotFound { .. } => LoaderErrorKind::NotFound,
                PartitionError::MalformedSize { .. } | PartitionError::NotText { .. } => {
                    LoaderErrorKind::InvalidTable
                }
                PartitionError::Io { .. } => LoaderErrorKind::Unexpected,
            },
            LoaderError::Settings { .. } => LoaderErrorKind::InvalidSettings,
            LoaderError::CreateDir { .. } => LoaderErrorKind::Unexpected,
            LoaderError::Tool { .. } => LoaderErrorKind::ToolFailed,
        }
    }
}

impl From<PartitionError> for LoaderError {
    fn from(source: PartitionError) -> Self {
        LoaderError::Table { source }
    }
}

impl From<SettingsError> for LoaderError {
    fn from(source: SettingsError) -> Self {
        LoaderError::Settings { source }
    }
}

/// Everything needed to run the flashing tool, resolved but not executed.
#[derive(Debug, Clone)]
pub struct FlashPlan {
    pub operation: Operation,
    pub partition: ResolvedPartition,
    pub serial: SerialSettings,
    pub invocation: EsptoolInvocation,
    pub command_line: String,
}

pub fn plan_write<F>(opts: &LoaderOptions, on_event: F) -> Result<FlashPlan, LoaderError>
where
    F: FnMut(OperationEvent),
{
    plan(Operation::Write, opts, on_event)
}

pub fn plan_read<F>(opts: &LoaderOptions, on_event: F) -> Result<FlashPlan, LoaderError>
where
    F: FnMut(OperationEvent),
{
    plan(Operation::Read, opts, on_event)
}

/// Write the filesystem image into its partition. Returns the tool's exit code.
pub fn write_image<F>(opts: &LoaderOptions, on_event: F) -> Result<i32, LoaderError>
where
    F: FnMut(OperationEvent),
{
    execute(Operation::Write, opts, on_event)
}

/// Read the partition back into the image path. Returns the tool's exit code.
pub fn read_image<F>(opts: &LoaderOptions, on_event: F) -> Result<i32, LoaderError>
where
    F: FnMut(OperationEvent),
{
    execute(Operation::Read, opts, on_event)
}

#[tracing::instrument(level = "debug", skip(opts, on_event))]
pub fn execute<F>(
    op: Operation,
    opts: &LoaderOptions,
    mut on_event: F,
) -> Result<i32, LoaderError>
where
    F: FnMut(OperationEvent),
{
    let plan = plan(op, opts, &mut on_event)?;

    if op == Operation::Read {
        let image = plan.invocation_image();
        if let Some(parent) = image.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LoaderError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    on_event(OperationEvent::ToolStart {
        operation: op,
        command_line: plan.command_line.clone(),
    });

    let code = esptool::run(&opts.esptool, &plan.invocation, opts.tool_stdout)
        .map_err(|e| LoaderError::Tool { source: e })?;

    on_event(OperationEvent::ToolExited { code });
    Ok(code)
}

pub fn plan<F>(
    op: Operation,
    opts: &LoaderOptions,
    mut on_event: F,
) -> Result<FlashPlan, LoaderError>
where
    F: FnMut(OperationEvent),
{
    let defaults = opts.profile.defaults(op);
    let query = opts.query.clone().unwrap_or(defaults.query);
    let image = opts.image.clone().unwrap_or(defaults.image);
    let settings_needed = opts.port.is_none() || opts.baud.is_none();

    require_file("partition table", &opts.partitions)?;
    if settings_needed {
        require_file("settings file", &opts.settings)?;
    }
    if op == Operation::Write {
        require_file("filesystem image", &image)?;
    }

    let table = load_table(&opts.partitions, &mut on_event)?;

    let read_size = match (op, opts.size) {
        (Operation::Write, _) => None,
        (Operation::Read, Some(bytes)) => Some(ReadSize::Fixed(bytes)),
        (Operation::Read, None) => Some(defaults.read_size),
    };

    let partition = table.resolve(&query, read_size == Some(ReadSize::FromTable))?;
    on_event(OperationEvent::PartitionResolved {
        query: query.to_string(),
        name: partition.name.clone(),
        offset: partition.offset.clone(),
        size: partition.size.as_ref().map(|s| s.bytes),
    });
    tracing::info!(
        %query,
        name = %partition.name,
        offset = %partition.offset,
        "partition resolved"
    );

    let read_bytes = match read_size {
        None => None,
        Some(ReadSize::FromTable) => partition.size.as_ref().map(|size| {
            if size.converted() {
                on_event(OperationEvent::SizeConverted {
                    raw: size.raw.clone(),
                    bytes: size.bytes,
                });
            }
            size.bytes
        }),
        Some(ReadSize::Fixed(fixed)) => {
            // Only a hint: a bad size column must not block a fixed-size read.
            let table_size = match opts.size {
                Some(_) => None,
                None => table.resolve(&query, true).ok().and_then(|p| p.size),
            };
            if let Some(table_size) = table_size {
                if table_size.bytes != fixed {
                    tracing::warn!(
                        fixed,
                        table = table_size.bytes,
                        "read size differs from partition table"
                    );
                    on_event(OperationEvent::FixedSizeMismatch {
                        fixed,
                        table: table_size.bytes,
                    });
                }
            }
            Some(fixed)
        }
    };

    let (serial, source) = resolve_serial(opts, settings_needed)?;
    on_event(OperationEvent::SerialResolved {
        port: serial.port.clone(),
        baud: serial.baud.clone(),
        source,
    });

    if opts.check_port && ports::is_port_present(&serial.port) == Some(false) {
        tracing::warn!(port = %serial.port, "serial port not detected");
        on_event(OperationEvent::PortNotDetected {
            port: serial.port.clone(),
        });
    }

    let action = match read_bytes {
        None => FlashAction::WriteFlash {
            offset: partition.offset.clone(),
            image,
        },
        Some(size) => FlashAction::ReadFlash {
            offset: partition.offset.clone(),
            size,
            image,
        },
    };

    let invocation = EsptoolInvocation {
        chip: opts.chip.clone(),
        port: serial.port.clone(),
        baud: serial.baud.clone(),
        action,
    };
    let command_line = invocation.command_line(&opts.esptool);

    Ok(FlashPlan {
        operation: op,
        partition,
        serial,
        invocation,
        command_line,
    })
}

impl FlashPlan {
    fn invocation_image(&self) -> &Path {
        match &self.invocation.action {
            FlashAction::WriteFlash { image, .. } | FlashAction::ReadFlash { image, .. } => image,
        }
    }
}

/// Look up one partition; `with_size` also normalizes its size column.
pub fn resolve_partition<F>(
    partitions: &Path,
    query: &PartitionQuery,
    with_size: bool,
    mut on_event: F,
) -> Result<ResolvedPartition, LoaderError>
where
    F: FnMut(OperationEvent),
{
    require_file("partition table", partitions)?;
    let table = load_table(partitions, &mut on_event)?;
    let partition = table.resolve(query, with_size)?;
    on_event(OperationEvent::PartitionResolved {
        query: query.to_string(),
        name: partition.name.clone(),
        offset: partition.offset.clone(),
        size: partition.size.as_ref().map(|s| s.bytes),
    });
    if let Some(size) = partition.size.as_ref().filter(|s| s.converted()) {
        on_event(OperationEvent::SizeConverted {
            raw: size.raw.clone(),
            bytes: size.bytes,
        });
    }
    Ok(partition)
}

pub fn load_partition_table(partitions: &Path) -> Result<PartitionTable, LoaderError> {
    require_file("partition table", partitions)?;
    Ok(PartitionTable::load(partitions)?)
}

fn load_table<F>(path: &Path, on_event: &mut F) -> Result<PartitionTable, LoaderError>
where
    F: FnMut(OperationEvent),
{
    let table = PartitionTable::load(path)?;
    on_event(OperationEvent::TableLoaded {
        path: path.to_path_buf(),
        entries: table.rows().len(),
    });
    Ok(table)
}

fn resolve_serial(
    opts: &LoaderOptions,
    settings_needed: bool,
) -> Result<(SerialSettings, SerialSource), LoaderError> {
    if !settings_needed {
        if let (Some(port), Some(baud)) = (&opts.port, &opts.baud) {
            return Ok((
                SerialSettings {
                    port: port.clone(),
                    baud: baud.clone(),
                },
                SerialSource::Override,
            ));
        }
    }

    let mut serial = settings::load_serial_settings(&opts.settings, opts.platform)?;
    let mut source = SerialSource::Settings;
    if let Some(port) = &opts.port {
        serial.port = port.clone();
        source = SerialSource::Override;
    }
    if let Some(baud) = &opts.baud {
        serial.baud = baud.clone();
        source = SerialSource::Override;
    }
    Ok((serial, source))
}

fn require_file(what: &'static str, path: &Path) -> Result<(), LoaderError> {
    if path.exists() {
        Ok(())
    } else {
        Err(LoaderError::MissingFile {
            what,
            path: path.to_path_buf(),
        })
    }
}
