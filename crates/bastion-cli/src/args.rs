//! Command-line argument definitions for the Bastion CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Each pipeline stage is a subcommand; configuration file
//! selection and logging verbosity apply to all of them.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Bastion threat-model analyzer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

/// Pipeline stages.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract the intermediate model of a diagram as JSON
    Extract {
        /// Path to the diagram document (JSON)
        input: String,

        /// Write the model here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Render a diagram into a specification template
    Render {
        /// Path to the diagram document (JSON)
        input: String,

        /// Path to the specification template
        #[arg(short, long)]
        template: String,

        /// Path to the generated specification
        #[arg(short, long, default_value = "out.als")]
        output: String,
    },

    /// Interpret a checker result document
    Interpret {
        /// Path to the result document (XML)
        input: String,

        /// Fail on an unreadable result instead of reporting an error record
        #[arg(long)]
        strict: bool,

        /// Write the violations here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Extract, render, run the configured checker and interpret its result
    Analyze {
        /// Path to the diagram document (JSON)
        input: String,

        /// Path to the specification template
        #[arg(short, long)]
        template: String,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Extract { .. } => "extract",
            Command::Render { .. } => "render",
            Command::Interpret { .. } => "interpret",
            Command::Analyze { .. } => "analyze",
        }
    }

    /// The file the stage reads.
    pub fn input(&self) -> &str {
        match self {
            Command::Extract { input, .. }
            | Command::Render { input, .. }
            | Command::Interpret { input, .. }
            | Command::Analyze { input, .. } => input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommand_with_global_flags() {
        let args = Args::try_parse_from([
            "bastion",
            "interpret",
            "result.xml",
            "--strict",
            "--log-level",
            "debug",
            "-c",
            "bastion.toml",
        ])
        .unwrap();

        assert_eq!(args.command.name(), "interpret");
        assert_eq!(args.command.input(), "result.xml");
        assert_eq!(args.log_level, "debug");
        assert_eq!(args.config.as_deref(), Some("bastion.toml"));
        assert!(matches!(args.command, Command::Interpret { strict: true, .. }));
    }

    #[test]
    fn test_render_output_default() {
        let args = Args::try_parse_from(["bastion", "render", "d.json", "-t", "t.als"]).unwrap();

        match args.command {
            Command::Render { output, .. } => assert_eq!(output, "out.als"),
            other => panic!("expected render, got {other:?}"),
        }
    }
}
