use littlefs_loader::api;

use crate::cli;
use crate::context;
use crate::exit_codes;
use crate::output::{Event, Reporter};

pub fn run(args: cli::PartitionsArgs, out: &mut dyn Reporter) -> i32 {
    match api::load_partition_table(&args.partitions) {
        Ok(table) => {
            out.emit(Event::Partitions {
                path: args.partitions,
                entries: table.entries(),
            });
            exit_codes::EXIT_OK
        }
        Err(e) => {
            let code = context::exit_code(e.kind());
            out.emit(Event::Error {
                code,
                message: e.to_string(),
            });
            code
        }
    }
}
