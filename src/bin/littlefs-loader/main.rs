use std::process;

use clap::Parser;

mod cli;
mod commands;
mod context;
mod exit_codes;
mod logging;
mod output;

fn main() {
    let cli = cli::Cli::parse();
    logging::init_tracing(cli.command.output().verbose);

    let exit_code = match cli.command {
        cli::Command::Write(args) => {
            let mut out = output::make(&args.output);
            let code = commands::flash::run_write(args, &mut *out);
            out.finish();
            code
        }
        cli::Command::Read(args) => {
            let mut out = output::make(&args.output);
            let code = commands::flash::run_read(args, &mut *out);
            out.finish();
            code
        }
        cli::Command::Resolve(args) => {
            let mut out = output::make(&args.output);
            let code = commands::resolve::run(args, &mut *out);
            out.finish();
            code
        }
        cli::Command::Partitions(args) => {
            let mut out = output::make(&args.output);
            let code = commands::partitions::run(args, &mut *out);
            out.finish();
            code
        }
        cli::Command::Ports(args) => {
            let mut out = output::make(&args.output);
            let code = commands::ports::run(args, &mut *out);
            out.finish();
            code
        }
    };

    process::exit(exit_code);
}
