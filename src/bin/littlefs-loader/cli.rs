use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use littlefs_loader::{esptool, partition, profile};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileArg {
    /// A/B filesystem partitions fs_0, fs_1, ... (see --index).
    Ota,
    /// Single `fs` partition.
    NoOta,
    /// Write by `littlefs` type, read fs_0 with a fixed 480 KiB size.
    Legacy,
}

#[derive(Parser)]
#[command(name = "littlefs-loader")]
#[command(about = "Write/read littlefs images to/from ESP32 flash partitions (esptool)")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a littlefs image into its flash partition.
    Write(WriteArgs),

    /// Read a flash partition back into an image file.
    Read(ReadArgs),

    /// Print the offset (and size) of a partition.
    Resolve(ResolveArgs),

    /// List the entries of a partition table.
    Partitions(PartitionsArgs),

    /// List detected serial ports.
    Ports(PortsArgs),
}

impl Command {
    pub fn output(&self) -> &OutputArgs {
        match self {
            Command::Write(args) => &args.output,
            Command::Read(args) => &args.output,
            Command::Resolve(args) => &args.output,
            Command::Partitions(args) => &args.output,
            Command::Ports(args) => &args.output,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct OutputArgs {
    /// Emit JSON line events to stdout.
    #[arg(long)]
    pub json: bool,

    /// Include monotonic timestamps in JSON events (milliseconds since process start).
    #[arg(long, requires = "json")]
    pub json_timestamps: bool,

    /// Reduce output (only errors).
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// More detail on stderr, including library debug logs.
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Args, Clone, Debug)]
#[group(multiple = false)]
pub struct QueryArgs {
    /// Look the partition up by name (overrides the profile).
    #[arg(long)]
    pub name: Option<String>,

    /// Look the partition up by filesystem type, e.g. littlefs (overrides the profile).
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct JobArgs {
    /// Partition layout preset supplying default names and paths.
    #[arg(long, value_enum, default_value_t = ProfileArg::Ota)]
    pub profile: ProfileArg,

    /// Filesystem partition index for the ota profile (fs_<index>).
    #[arg(long, default_value_t = 0)]
    pub index: u32,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Image path (default depends on profile and operation).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Partition table CSV.
    #[arg(long, default_value = profile::DEFAULT_PARTITIONS_CSV)]
    pub partitions: PathBuf,

    /// Editor settings JSON providing idf.port / idf.portWin / idf.flashBaudRate.
    #[arg(long, default_value = profile::DEFAULT_SETTINGS_JSON)]
    pub settings: PathBuf,

    /// Serial port (overrides the settings file).
    #[arg(long)]
    pub port: Option<String>,

    /// Flash baud rate (overrides the settings file).
    #[arg(long)]
    pub baud: Option<String>,

    /// Chip passed to esptool.
    #[arg(long, default_value = esptool::DEFAULT_CHIP)]
    pub chip: String,

    /// Flashing tool executable.
    #[arg(long, default_value = esptool::DEFAULT_PROGRAM)]
    pub esptool: PathBuf,

    /// Extra argument placed before the esptool arguments (repeatable), e.g.
    /// `--esptool python --esptool-arg=-m --esptool-arg esptool`.
    #[arg(long, allow_hyphen_values = true)]
    pub esptool_arg: Vec<String>,

    /// Do not warn when the serial port is not detected.
    #[arg(long)]
    pub no_port_check: bool,

    /// Resolve everything and print the esptool command without running it.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct WriteArgs {
    #[command(flatten)]
    pub job: JobArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct ReadArgs {
    #[command(flatten)]
    pub job: JobArgs,

    /// Bytes to read (e.g. 491520, 480k, 1M); default comes from the profile.
    #[arg(long, value_parser = parse_size_arg)]
    pub size: Option<u64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct ResolveQueryArgs {
    /// Partition name, e.g. fs_0.
    #[arg(long)]
    pub name: Option<String>,

    /// Filesystem type, e.g. littlefs.
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub query: ResolveQueryArgs,

    /// Also report the partition size in bytes.
    #[arg(long)]
    pub with_size: bool,

    /// Partition table CSV.
    #[arg(long, default_value = profile::DEFAULT_PARTITIONS_CSV)]
    pub partitions: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct PartitionsArgs {
    /// Partition table CSV.
    #[arg(long, default_value = profile::DEFAULT_PARTITIONS_CSV)]
    pub partitions: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct PortsArgs {
    #[command(flatten)]
    pub output: OutputArgs,
}

fn parse_size_arg(s: &str) -> Result<u64, String> {
    partition::parse_size(s)
        .ok_or_else(|| format!("invalid size '{s}' (expected e.g. 491520, 480k, 1M or 0x78000)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_read_with_suffix_size() {
        let cli = Cli::try_parse_from([
            "littlefs-loader",
            "read",
            "--profile",
            "no-ota",
            "--size",
            "480k",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Command::Read(args) => {
                assert_eq!(args.size, Some(491_520));
                assert_eq!(args.job.profile, ProfileArg::NoOta);
                assert!(args.output.json);
            }
            _ => panic!("expected read"),
        }
    }

    #[test]
    fn test_cli_rejects_name_and_type_together() {
        let r = Cli::try_parse_from([
            "littlefs-loader",
            "write",
            "--name",
            "fs",
            "--type",
            "littlefs",
        ]);
        assert!(r.is_err());
    }

    #[test]
    fn test_cli_resolve_requires_a_query() {
        assert!(Cli::try_parse_from(["littlefs-loader", "resolve"]).is_err());
        assert!(Cli::try_parse_from(["littlefs-loader", "resolve", "--type", "littlefs"]).is_ok());
    }

    #[test]
    fn test_cli_accepts_hyphenated_esptool_args() {
        let cli = Cli::try_parse_from([
            "littlefs-loader",
            "write",
            "--esptool",
            "python",
            "--esptool-arg",
            "-m",
            "--esptool-arg",
            "esptool",
        ])
        .unwrap();
        match cli.command {
            Command::Write(args) => assert_eq!(args.job.esptool_arg, ["-m", "esptool"]),
            _ => panic!("expected write"),
        }
    }
}
