use littlefs_loader::api::{self, LoaderOptions};
use littlefs_loader::profile::Operation;

use crate::cli;
use crate::context;
use crate::exit_codes;
use crate::output::{DryRunSummary, Event, Reporter};

pub fn run_write(args: cli::WriteArgs, out: &mut dyn Reporter) -> i32 {
    let opts = context::loader_opts(&args.job, None, args.output.json);
    run(Operation::Write, &opts, args.job.dry_run, out)
}

pub fn run_read(args: cli::ReadArgs, out: &mut dyn Reporter) -> i32 {
    let opts = context::loader_opts(&args.job, args.size, args.output.json);
    run(Operation::Read, &opts, args.job.dry_run, out)
}

fn run(op: Operation, opts: &LoaderOptions, dry_run: bool, out: &mut dyn Reporter) -> i32 {
    if dry_run {
        return match api::plan(op, opts, |ev| out.emit(Event::Operation(ev))) {
            Ok(plan) => {
                out.emit(Event::DryRun(DryRunSummary::from_plan(&plan)));
                exit_codes::EXIT_OK
            }
            Err(e) => fail(&e, out),
        };
    }

    match api::execute(op, opts, |ev| out.emit(Event::Operation(ev))) {
        Ok(code) => {
            if code != exit_codes::EXIT_OK {
                out.emit(Event::ToolFailed { code });
            }
            code
        }
        Err(e) => fail(&e, out),
    }
}

fn fail(e: &api::LoaderError, out: &mut dyn Reporter) -> i32 {
    let code = context::exit_code(e.kind());
    out.emit(Event::Error {
        code,
        message: e.to_string(),
    });
    code
}
