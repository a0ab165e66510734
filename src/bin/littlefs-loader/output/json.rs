use std::collections::BTreeMap;
use std::time::Instant;

use littlefs_loader::{
    operation::OperationEvent,
    partition::{PartitionEntry, ResolvedPartition},
    ports::SerialPortEntry,
};

use crate::output::{DryRunSummary, Event, OutputOptions, Reporter};

#[derive(serde::Serialize)]
pub struct JsonEvent {
    schema: u32,
    event: &'static str,
    #[serde(flatten)]
    fields: BTreeMap<&'static str, serde_json::Value>,
}

impl JsonEvent {
    pub fn status(event: &'static str) -> Self {
        Self {
            schema: 1,
            event,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_u64(mut self, k: &'static str, v: u64) -> Self {
        self.fields.insert(k, serde_json::Value::from(v));
        self
    }

    pub fn with_i64(mut self, k: &'static str, v: i64) -> Self {
        self.fields.insert(k, serde_json::Value::from(v));
        self
    }

    pub fn with_str(mut self, k: &'static str, v: &str) -> Self {
        self.fields.insert(k, serde_json::Value::from(v));
        self
    }

    pub fn with_value(mut self, k: &'static str, v: serde_json::Value) -> Self {
        self.fields.insert(k, v);
        self
    }
}

pub struct JsonOutput {
    opts: OutputOptions,
    start: Instant,
}

impl JsonOutput {
    pub fn new(opts: OutputOptions) -> Self {
        Self {
            opts,
            start: Instant::now(),
        }
    }

    pub(crate) fn render_event_json(&mut self, ev: JsonEvent) -> String {
        let mut ev = ev;
        if self.opts.json_timestamps {
            ev.fields.insert(
                "t_ms",
                serde_json::Value::from(self.start.elapsed().as_millis() as u64),
            );
        }
        serde_json::to_string(&ev).unwrap_or_else(|_| "{}".to_string())
    }

    fn json_event(&mut self, ev: JsonEvent) {
        println!("{}", self.render_event_json(ev));
    }

    fn error_event(&mut self, code: i32, msg: &str) {
        self.json_event(
            JsonEvent::status("error")
                .with_i64("code", code as i64)
                .with_str("message", msg),
        );

        if self.opts.verbose {
            eprintln!("error: {msg}");
        }
    }
}

impl Reporter for JsonOutput {
    fn emit(&mut self, event: Event) {
        match event {
            Event::Operation(ev) => self.json_event(operation_event_to_json(ev)),
            Event::DryRun(summary) => self.json_event(dry_run_to_json(summary)),
            Event::Resolved(p) => self.json_event(resolved_to_json(&p)),
            Event::Partitions { path, entries } => {
                self.json_event(partitions_to_json(&path.display().to_string(), &entries))
            }
            Event::Ports(ports) => self.json_event(ports_to_json(&ports)),
            Event::ToolFailed { code } => {
                self.error_event(code, &format!("flashing tool exited with code {code}"))
            }
            Event::Error { code, message } => self.error_event(code, &message),
        }
    }

    fn finish(&mut self) {}
}

pub fn resolved_to_json(p: &ResolvedPartition) -> JsonEvent {
    let mut ev = JsonEvent::status("partition")
        .with_str("name", &p.name)
        .with_str("offset", &p.offset)
        .with_u64("line", p.line_no as u64);
    if let Some(size) = &p.size {
        ev = ev
            .with_u64("size", size.bytes)
            .with_str("size_raw", &size.raw);
    }
    ev
}

pub fn partitions_to_json(path: &str, entries: &[PartitionEntry]) -> JsonEvent {
    JsonEvent::status("partitions")
        .with_str("path", path)
        .with_u64("count", entries.len() as u64)
        .with_value(
            "entries",
            serde_json::to_value(entries).unwrap_or_else(|_| serde_json::Value::Array(Vec::new())),
        )
}

pub fn ports_to_json(ports: &[SerialPortEntry]) -> JsonEvent {
    JsonEvent::status("ports")
        .with_u64("count", ports.len() as u64)
        .with_value(
            "ports",
            serde_json::to_value(ports).unwrap_or_else(|_| serde_json::Value::Array(Vec::new())),
        )
}

pub fn dry_run_to_json(summary: DryRunSummary) -> JsonEvent {
    let mut ev = JsonEvent::status("dry_run")
        .with_str("operation", &summary.operation)
        .with_str("partition", &summary.partition)
        .with_str("offset", &summary.offset)
        .with_str("port", &summary.port)
        .with_str("baud", &summary.baud)
        .with_str("command", &summary.command_line)
        .with_value(
            "args",
            serde_json::Value::Array(summary.args.into_iter().map(Into::into).collect()),
        );
    if let Some(size) = summary.size {
        ev = ev.with_u64("size", size);
    }
    ev
}

pub fn operation_event_to_json(ev: OperationEvent) -> JsonEvent {
    match ev {
        OperationEvent::TableLoaded { path, entries } => JsonEvent::status("table_loaded")
            .with_str("path", &path.display().to_string())
            .with_u64("rows", entries as u64),
        OperationEvent::PartitionResolved {
            query,
            name,
            offset,
            size,
        } => {
            let mut ev = JsonEvent::status("partition_resolved")
                .with_str("query", &query)
                .with_str("name", &name)
                .with_str("offset", &offset);
            if let Some(size) = size {
                ev = ev.with_u64("size", size);
            }
            ev
        }
        OperationEvent::SizeConverted { raw, bytes } => JsonEvent::status("size_converted")
            .with_str("raw", &raw)
            .with_u64("bytes", bytes),
        OperationEvent::FixedSizeMismatch { fixed, table } => {
            JsonEvent::status("fixed_size_mismatch")
                .with_u64("fixed", fixed)
                .with_u64("table", table)
        }
        OperationEvent::SerialResolved { port, baud, source } => {
            JsonEvent::status("serial_resolved")
                .with_str("port", &port)
                .with_str("baud", &baud)
                .with_str("source", source.as_str())
        }
        OperationEvent::PortNotDetected { port } => {
            JsonEvent::status("port_not_detected").with_str("port", &port)
        }
        OperationEvent::ToolStart {
            operation,
            command_line,
        } => JsonEvent::status("tool_start")
            .with_str("operation", &operation.to_string())
            .with_str("command", &command_line),
        OperationEvent::ToolExited { code } => {
            JsonEvent::status("tool_exited").with_i64("code", code as i64)
        }
    }
}
