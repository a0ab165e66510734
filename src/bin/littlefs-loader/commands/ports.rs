use littlefs_loader::ports;

use crate::cli;
use crate::exit_codes;
use crate::output::{Event, Reporter};

pub fn run(_args: cli::PortsArgs, out: &mut dyn Reporter) -> i32 {
    match ports::list_ports() {
        Ok(ps) => {
            out.emit(Event::Ports(ps));
            exit_codes::EXIT_OK
        }
        Err(e) => {
            out.emit(Event::Error {
                code: exit_codes::EXIT_UNEXPECTED,
                message: e.to_string(),
            });
            exit_codes::EXIT_UNEXPECTED
        }
    }
}
