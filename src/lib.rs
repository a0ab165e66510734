//! Write and read littlefs images to/from ESP32 flash partitions.
//!
//! The partition offset (and, for reads, the size) comes from an ESP-IDF
//! `partitions.csv`; the serial port and baud rate come from the editor's
//! `.vscode/settings.json`; the transfer itself is done by `esptool`.

pub mod api;
pub mod esptool;
pub mod operation;
pub mod partition;
pub mod ports;
pub mod profile;
pub mod settings;
