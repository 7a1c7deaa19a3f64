//! Bastion CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use bastion_cli::{Args, error_adapter::to_reportables};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    let command = args.command.name();
    info!(command = command, input = args.command.input(), log_level:?; "Starting Bastion");
    debug!(args:?; "Parsed arguments");

    let Err(err) = bastion_cli::run(&args) else {
        info!(command = command; "Completed successfully");
        return;
    };

    let reporter = miette::GraphicalReportHandler::new();
    let reportables = to_reportables(&err);
    error!(command = command, errors = reportables.len(); "Analysis stage failed");

    for reportable in reportables {
        let mut writer = String::new();
        reporter
            .render_report(&mut writer, &reportable)
            .expect("Writing to String buffer is infallible");
        error!("{writer}");
    }

    process::exit(1);
}
