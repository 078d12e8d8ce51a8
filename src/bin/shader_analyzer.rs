//! shader-analyzer binary.
//!
//! Exit status is 0 on success and 1 on any reported failure.

use std::process::ExitCode;

use clap::Parser;
use shader_analyzer::cli::{Cli, Command};
use shader_analyzer::core::StdoutReporter;
use shader_analyzer::pipeline::{self, NativeLoader};

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    let mut reporter = StdoutReporter;
    let result = cli.into_command().and_then(|command| match command {
        Command::ListPlatforms(opts) => {
            pipeline::list_platforms(&NativeLoader, &opts, &mut reporter).map(|_| ())
        }
        Command::Generate(config) => {
            pipeline::run(&NativeLoader, &config, &mut reporter).map(|_| ())
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", e);
            ExitCode::FAILURE
        }
    }
}
