use std::path::PathBuf;

use crate::cli;

use littlefs_loader::{
    api::FlashPlan, operation::OperationEvent, partition, ports::SerialPortEntry,
};

pub mod human;
pub mod json;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub verbose: bool,
    pub quiet: bool,
    pub json_timestamps: bool,
}

#[derive(Debug, Clone)]
pub struct DryRunSummary {
    pub operation: String,
    pub partition: String,
    pub offset: String,
    pub size: Option<u64>,
    pub port: String,
    pub baud: String,
    pub command_line: String,
    pub args: Vec<String>,
}

impl DryRunSummary {
    pub fn from_plan(plan: &FlashPlan) -> Self {
        let size = match &plan.invocation.action {
            littlefs_loader::esptool::FlashAction::ReadFlash { size, .. } => Some(*size),
            littlefs_loader::esptool::FlashAction::WriteFlash { .. } => None,
        };
        Self {
            operation: plan.operation.to_string(),
            partition: plan.partition.name.clone(),
            offset: plan.partition.offset.clone(),
            size,
            port: plan.serial.port.clone(),
            baud: plan.serial.baud.clone(),
            command_line: plan.command_line.clone(),
            args: plan
                .invocation
                .args()
                .into_iter()
                .map(|a| a.to_string_lossy().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Operation(OperationEvent),
    DryRun(DryRunSummary),
    Resolved(partition::ResolvedPartition),
    Partitions {
        path: PathBuf,
        entries: Vec<partition::PartitionEntry>,
    },
    Ports(Vec<SerialPortEntry>),
    /// The flashing tool ran but reported failure; its code becomes ours.
    ToolFailed { code: i32 },
    Error { code: i32, message: String },
}

pub trait Reporter {
    fn emit(&mut self, event: Event);
    fn finish(&mut self);
}

pub fn make(args: &cli::OutputArgs) -> Box<dyn Reporter> {
    let opts = OutputOptions {
        verbose: args.verbose,
        quiet: args.quiet,
        json_timestamps: args.json_timestamps,
    };
    if args.json {
        Box::new(json::JsonOutput::new(opts))
    } else {
        Box::new(human::HumanOutput::new(opts))
    }
}

pub fn format_port_line(index: usize, p: &SerialPortEntry) -> String {
    match (p.vid, p.pid) {
        (Some(vid), Some(pid)) => format!(
            "[{index}] {} {:04X}:{:04X} {}",
            p.port_name,
            vid,
            pid,
            p.product.as_deref().unwrap_or("")
        )
        .trim_end()
        .to_string(),
        _ => format!("[{index}] {}", p.port_name),
    }
}

pub fn format_size(bytes: u64) -> String {
    if bytes >= partition::MIB && bytes.is_multiple_of(partition::MIB) {
        format!("{bytes} ({}M)", bytes / partition::MIB)
    } else if bytes >= partition::KIB && bytes.is_multiple_of(partition::KIB) {
        format!("{bytes} ({}k)", bytes / partition::KIB)
    } else {
        bytes.to_string()
    }
}
