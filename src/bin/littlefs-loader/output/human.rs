use littlefs_loader::{operation::OperationEvent, partition::PartitionEntry};

use crate::output::{format_port_line, format_size, DryRunSummary, Event, OutputOptions, Reporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Quiet,
    Verbose,
    Normal,
}

pub struct HumanOutput {
    opts: OutputOptions,
}

impl HumanOutput {
    pub fn new(opts: OutputOptions) -> Self {
        Self { opts }
    }

    fn mode(&self) -> Mode {
        if self.opts.quiet {
            Mode::Quiet
        } else if self.opts.verbose {
            Mode::Verbose
        } else {
            Mode::Normal
        }
    }

    fn println(&mut self, msg: &str) {
        if self.mode() == Mode::Quiet {
            return;
        }
        eprintln!("{msg}");
    }

    /// Query results go to stdout so they can be captured by scripts.
    fn result_line(&mut self, msg: &str) {
        println!("{msg}");
    }

    pub(crate) fn partition_table_lines(entries: &[PartitionEntry]) -> Vec<String> {
        let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(4).max(4);
        let mut lines = vec![format!(
            "{:<width$}  {:<5}  {:<9}  {:<10}  {:<8}  flags",
            "name", "type", "subtype", "offset", "size"
        )];
        for e in entries {
            lines.push(
                format!(
                    "{:<width$}  {:<5}  {:<9}  {:<10}  {:<8}  {}",
                    e.name,
                    e.kind,
                    e.subtype,
                    e.offset,
                    e.size,
                    e.flags.as_deref().unwrap_or("")
                )
                .trim_end()
                .to_string(),
            );
        }
        lines
    }

    fn on_operation_event(&mut self, ev: OperationEvent) {
        match ev {
            OperationEvent::TableLoaded { path, entries } => {
                if self.mode() == Mode::Verbose {
                    self.println(&format!(
                        "partition table: {} ({entries} rows)",
                        path.display()
                    ));
                }
            }
            OperationEvent::PartitionResolved {
                query,
                name,
                offset,
                size,
            } => {
                if self.mode() == Mode::Verbose {
                    match size {
                        Some(size) => self.println(&format!(
                            "partition {name} ({query}): offset {offset}, size {}",
                            format_size(size)
                        )),
                        None => {
                            self.println(&format!("partition {name} ({query}): offset {offset}"))
                        }
                    }
                } else if self.mode() == Mode::Normal {
                    self.println(&format!("partition: {name} @ {offset}"));
                }
            }
            OperationEvent::SizeConverted { raw, bytes } => {
                self.println(&format!("Partition size conversion: {raw} -> {bytes} bytes"));
            }
            OperationEvent::FixedSizeMismatch { fixed, table } => {
                self.println(&format!(
                    "warning: reading a fixed {} bytes, partition table says {}",
                    format_size(fixed),
                    format_size(table)
                ));
            }
            OperationEvent::SerialResolved { port, baud, source } => {
                if self.mode() == Mode::Verbose {
                    self.println(&format!(
                        "serial: {port} @ {baud} baud (from {})",
                        source.as_str()
                    ));
                } else if self.mode() == Mode::Normal {
                    self.println(&format!("serial: {port} @ {baud}"));
                }
            }
            OperationEvent::PortNotDetected { port } => {
                self.println(&format!(
                    "warning: serial port {port} not detected (run `littlefs-loader ports`)"
                ));
            }
            OperationEvent::ToolStart {
                operation,
                command_line,
            } => {
                if self.mode() == Mode::Verbose {
                    self.println(&format!("{operation}: {command_line}"));
                } else if self.mode() == Mode::Normal {
                    self.println(&format!("{operation}: running esptool..."));
                }
            }
            OperationEvent::ToolExited { code } => {
                if self.mode() == Mode::Verbose {
                    self.println(&format!("esptool exited with code {code}"));
                }
            }
        }
    }

    fn on_dry_run(&mut self, summary: DryRunSummary) {
        if self.mode() == Mode::Quiet {
            return;
        }
        self.println(&format!("Dry run OK ({})", summary.operation));
        self.println(&format!(
            "Partition: {} @ {}",
            summary.partition, summary.offset
        ));
        if let Some(size) = summary.size {
            self.println(&format!("Size: {}", format_size(size)));
        }
        self.println(&format!("Serial: {} @ {}", summary.port, summary.baud));
        self.result_line(&summary.command_line);
    }
}

impl Reporter for HumanOutput {
    fn emit(&mut self, event: Event) {
        match event {
            Event::Operation(ev) => self.on_operation_event(ev),
            Event::DryRun(summary) => self.on_dry_run(summary),
            Event::Resolved(p) => match &p.size {
                Some(size) => self.result_line(&format!("{} {}", p.offset, size.bytes)),
                None => self.result_line(&p.offset),
            },
            Event::Partitions { path, entries } => {
                if entries.is_empty() {
                    self.println(&format!("No partitions found in {}", path.display()));
                } else {
                    for line in Self::partition_table_lines(&entries) {
                        self.result_line(&line);
                    }
                }
            }
            Event::Ports(ports) => {
                if ports.is_empty() {
                    self.println("No serial ports found");
                } else {
                    for (i, p) in ports.iter().enumerate() {
                        self.result_line(&format_port_line(i, p));
                    }
                }
            }
            Event::ToolFailed { code } => {
                eprintln!("error: esptool exited with code {code}");
            }
            Event::Error { message, .. } => {
                eprintln!("error: {message}");
            }
        }
    }

    fn finish(&mut self) {}
}
