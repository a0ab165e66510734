use littlefs_loader::operation::{OperationEvent, SerialSource};
use littlefs_loader::partition::PartitionTable;
use littlefs_loader::ports::{PortKind, SerialPortEntry};

use super::human::HumanOutput;
use super::json::JsonOutput;
use super::OutputOptions;

#[test]
fn json_event_has_schema_and_event() {
    let ev = super::json::operation_event_to_json(OperationEvent::SizeConverted {
        raw: "480k".to_string(),
        bytes: 491_520,
    });
    let v = serde_json::to_value(&ev).unwrap();
    assert_eq!(v.get("schema").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(v.get("event").and_then(|v| v.as_str()), Some("size_converted"));
    assert_eq!(v.get("raw").and_then(|v| v.as_str()), Some("480k"));
    assert_eq!(v.get("bytes").and_then(|v| v.as_u64()), Some(491_520));
}

#[test]
fn json_serial_event_reports_source() {
    let ev = super::json::operation_event_to_json(OperationEvent::SerialResolved {
        port: "COM6".to_string(),
        baud: "921600".to_string(),
        source: SerialSource::Settings,
    });
    let v = serde_json::to_value(&ev).unwrap();
    assert_eq!(v.get("source").and_then(|v| v.as_str()), Some("settings"));
    assert_eq!(v.get("baud").and_then(|v| v.as_str()), Some("921600"));
}

#[test]
fn json_timestamps_are_opt_in() {
    let mut out = JsonOutput::new(OutputOptions {
        verbose: false,
        quiet: false,
        json_timestamps: true,
    });
    let line = out.render_event_json(super::json::JsonEvent::status("tool_exited"));
    let v: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert!(v.get("t_ms").is_some());
}

#[test]
fn json_partitions_use_type_key() {
    let table = PartitionTable::parse("fs_0,data,littlefs,0x110000,480k\n");
    let ev = super::json::partitions_to_json("partitions.csv", &table.entries());
    let v = serde_json::to_value(&ev).unwrap();
    let first = &v["entries"][0];
    assert_eq!(first["type"].as_str(), Some("data"));
    assert_eq!(first["subtype"].as_str(), Some("littlefs"));
    assert_eq!(first["size"].as_str(), Some("480k"));
}

#[test]
fn human_table_lines_are_aligned() {
    let table = PartitionTable::parse(
        "nvs,data,nvs,0x9000,0x5000,\nfs_0,data,littlefs,0x110000,480k,\n",
    );
    let lines = HumanOutput::partition_table_lines(&table.entries());
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("name"));
    assert!(lines[2].starts_with("fs_0  data   littlefs   0x110000    480k"));
}

#[test]
fn port_line_includes_usb_ids() {
    let p = SerialPortEntry {
        port_name: "/dev/ttyUSB0".to_string(),
        kind: PortKind::Usb,
        vid: Some(0x10C4),
        pid: Some(0xEA60),
        serial_number: None,
        manufacturer: None,
        product: Some("CP2102 USB to UART".to_string()),
    };
    assert_eq!(
        super::format_port_line(0, &p),
        "[0] /dev/ttyUSB0 10C4:EA60 CP2102 USB to UART"
    );
}

#[test]
fn size_formatting_shows_units() {
    assert_eq!(super::format_size(491_520), "491520 (480k)");
    assert_eq!(super::format_size(1_048_576), "1048576 (1M)");
    assert_eq!(super::format_size(1000), "1000");
}
