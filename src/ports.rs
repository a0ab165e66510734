use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    Usb,
    Pci,
    Bluetooth,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerialPortEntry {
    pub port_name: String,
    pub kind: PortKind,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl SerialPortEntry {
    fn plain(port_name: String, kind: PortKind) -> Self {
        Self {
            port_name,
            kind,
            vid: None,
            pid: None,
            serial_number: None,
            manufacturer: None,
            product: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum PortsError {
    #[error("serial discovery failed: {0}")]
    Serial(#[from] serialport::Error),
}

pub fn list_ports() -> Result<Vec<SerialPortEntry>, PortsError> {
    let mut out: Vec<SerialPortEntry> = Vec::new();

    for p in serialport::available_ports()? {
        let serialport::SerialPortInfo {
            port_name,
            port_type,
        } = p;

        out.push(match port_type {
            serialport::SerialPortType::UsbPort(usb) => SerialPortEntry {
                port_name,
                kind: PortKind::Usb,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                serial_number: usb.serial_number,
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            serialport::SerialPortType::PciPort => SerialPortEntry::plain(port_name, PortKind::Pci),
            serialport::SerialPortType::BluetoothPort => {
                SerialPortEntry::plain(port_name, PortKind::Bluetooth)
            }
            serialport::SerialPortType::Unknown => {
                SerialPortEntry::plain(port_name, PortKind::Unknown)
            }
        });
    }

    out.sort_by(|a, b| a.port_name.cmp(&b.port_name));
    Ok(out)
}

/// `None` when discovery itself fails; the flashing tool gets the last word then.
pub fn is_port_present(port: &str) -> Option<bool> {
    match list_ports() {
        Ok(ports) => Some(contains_port(&ports, port)),
        Err(e) => {
            tracing::debug!(error = %e, "serial discovery unavailable");
            None
        }
    }
}

fn contains_port(ports: &[SerialPortEntry], port: &str) -> bool {
    ports.iter().any(|p| {
        if cfg!(windows) {
            p.port_name.eq_ignore_ascii_case(port)
        } else {
            p.port_name == port
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_port() {
        let ports = vec![
            SerialPortEntry {
                port_name: "/dev/ttyUSB0".to_string(),
                kind: PortKind::Usb,
                vid: Some(0x10C4),
                pid: Some(0xEA60),
                serial_number: None,
                manufacturer: Some("Silicon Labs".to_string()),
                product: Some("CP2102".to_string()),
            },
            SerialPortEntry::plain("/dev/ttyS0".to_string(), PortKind::Unknown),
        ];
        assert!(contains_port(&ports, "/dev/ttyUSB0"));
        assert!(contains_port(&ports, "/dev/ttyS0"));
        assert!(!contains_port(&ports, "/dev/ttyACM0"));
    }

    #[test]
    fn test_entry_serializes_kind_snake_case() {
        let e = SerialPortEntry::plain("COM3".to_string(), PortKind::Bluetooth);
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v.get("kind").and_then(|v| v.as_str()), Some("bluetooth"));
        assert_eq!(v.get("port_name").and_then(|v| v.as_str()), Some("COM3"));
    }
}
