use littlefs_loader::api;

use crate::cli;
use crate::context;
use crate::exit_codes;
use crate::output::{Event, Reporter};

pub fn run(args: cli::ResolveArgs, out: &mut dyn Reporter) -> i32 {
    let query = context::resolve_query(&args.query);

    let r = api::resolve_partition(&args.partitions, &query, args.with_size, |ev| {
        out.emit(Event::Operation(ev))
    });
    match r {
        Ok(p) => {
            out.emit(Event::Resolved(p));
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
