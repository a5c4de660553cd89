use crate::demo::{run_simulation, run_table, SimulateArgs, TableArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lingo_tutor::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Lingo Tutor",
    about = "Run the language tutor service or explore its progression rules",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect XP, level and badge rules without a running server
    Progress {
        #[command(subcommand)]
        command: ProgressCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProgressCommand {
    /// Replay a sequence of message lengths for a fresh learner
    Simulate(SimulateArgs),
    /// Print the level ladder and badge registry
    Table(TableArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Progress {
            command: ProgressCommand::Simulate(args),
        } => run_simulation(args).await,
        Command::Progress {
            command: ProgressCommand::Table(args),
        } => run_table(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_accepts_comma_separated_lengths() {
        let cli = Cli::try_parse_from([
            "lingo-tutor",
            "progress",
            "simulate",
            "--lengths",
            "0,180,12",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Progress {
                command: ProgressCommand::Simulate(args),
            }) => assert_eq!(args.lengths, vec![0, 180, 12]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn simulate_passes_negative_lengths_through() {
        let cli = Cli::try_parse_from([
            "lingo-tutor",
            "progress",
            "simulate",
            "--lengths",
            "-5",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Progress {
                command: ProgressCommand::Simulate(args),
            }) => assert_eq!(args.lengths, vec![-5]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["lingo-tutor"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
