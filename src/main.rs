use clap::Parser;
use compress_images::cli::Args;
use compress_images::constants::SUMMARY_PREFIX;
use compress_images::{error, logger, run, verbose, RunSummary};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    logger::set_quiet_mode(args.quiet);
    logger::set_verbose_mode(args.verbose);

    match run(&args.path, &args.run_options()) {
        Ok(RunSummary::SingleFile { success }) => {
            verbose!("Single file {:?} updated: {}", args.path, success);
            ExitCode::SUCCESS
        }
        Ok(RunSummary::Directory { file_count }) => {
            println!("\n{} Successfully updated file count: {}", SUMMARY_PREFIX, file_count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
