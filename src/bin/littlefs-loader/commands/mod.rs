pub mod flash;
pub mod partitions;
pub mod ports;
pub mod resolve;
