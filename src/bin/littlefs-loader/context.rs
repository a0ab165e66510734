use littlefs_loader::api::{LoaderErrorKind, LoaderOptions};
use littlefs_loader::esptool::{EsptoolCommand, ToolStdout};
use littlefs_loader::partition::PartitionQuery;
use littlefs_loader::profile::Profile;
use littlefs_loader::settings::SettingsPlatform;

use crate::cli;
use crate::exit_codes;

pub fn profile(args: &cli::JobArgs) -> Profile {
    match args.profile {
        cli::ProfileArg::Ota => Profile::Ota { index: args.index },
        cli::ProfileArg::NoOta => Profile::NoOta,
        cli::ProfileArg::Legacy => Profile::Legacy,
    }
}

pub fn query(name: Option<&str>, kind: Option<&str>) -> Option<PartitionQuery> {
    match (name, kind) {
        (Some(n), _) => Some(PartitionQuery::Name(n.to_string())),
        (None, Some(k)) => Some(PartitionQuery::Type(k.to_string())),
        (None, None) => None,
    }
}

/// clap guarantees exactly one of `--name` / `--type` for `resolve`.
pub fn resolve_query(args: &cli::ResolveQueryArgs) -> PartitionQuery {
    match (&args.name, &args.kind) {
        (Some(n), _) => PartitionQuery::Name(n.clone()),
        (None, kind) => PartitionQuery::Type(kind.clone().unwrap_or_default()),
    }
}

pub fn loader_opts(args: &cli::JobArgs, size: Option<u64>, json: bool) -> LoaderOptions {
    LoaderOptions {
        profile: profile(args),
        partitions: args.partitions.clone(),
        settings: args.settings.clone(),
        platform: SettingsPlatform::host(),
        query: query(args.query.name.as_deref(), args.query.kind.as_deref()),
        image: args.image.clone(),
        size,
        port: args.port.clone(),
        baud: args.baud.clone(),
        chip: args.chip.clone(),
        esptool: EsptoolCommand {
            program: args.esptool.clone(),
            prefix_args: args.esptool_arg.clone(),
        },
        tool_stdout: if json {
            ToolStdout::Stderr
        } else {
            ToolStdout::Inherit
        },
        check_port: !args.no_port_check,
    }
}

pub fn exit_code(kind: LoaderErrorKind) -> i32 {
    match kind {
        LoaderErrorKind::NotFound => exit_codes::EXIT_NOT_FOUND,
        LoaderErrorKind::MissingFile => exit_codes::EXIT_MISSING_FILE,
        LoaderErrorKind::InvalidTable => exit_codes::EXIT_INVALID_TABLE,
        LoaderErrorKind::InvalidSettings => exit_codes::EXIT_INVALID_SETTINGS,
        LoaderErrorKind::ToolFailed => exit_codes::EXIT_TOOL_FAILED,
        LoaderErrorKind::Unexpected => exit_codes::EXIT_UNEXPECTED,
    }
}
