pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::operations::Operation;

#[derive(Debug, Parser)]
#[command(
    name = "ndaflow",
    about = "NDA workflow operator CLI",
    long_about = "Create, send and track NDAs through PandaDoc, log them to Google Sheets and email the team.",
    after_help = "Examples:\n  ndaflow health\n  ndaflow create --template tmpl-123 --email jane@acme.test --name \"Jane Doe\" --company \"Acme Corp\" --send\n  ndaflow ask \"list pending signatures\"\n  ndaflow chat"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Operation(Operation),
    #[command(about = "Handle one conversational request and print the reply")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "Request text, e.g. \"list sent documents\"")]
        text: Vec<String>,
    },
    #[command(about = "Interactive conversational session (quit, exit or q to leave)")]
    Chat,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Operation(operation) => commands::operations::run(operation),
        Command::Ask { text } => commands::chat::ask(&text.join(" ")),
        Command::Chat => commands::chat::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
