use crate::report::{run_export, run_finance_report, run_monthly_report, ExportArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use conduct_score::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Conduct Score",
    about = "Run the conduct scoring service or produce monthly incentive reports from a snapshot",
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
    /// Print the monthly finance statement for a ledger snapshot file
    Report(ReportArgs),
    /// Print the monthly approval roster for a ledger snapshot file
    Roster(ReportArgs),
    /// Write the monthly deduction log of a ledger snapshot file as CSV
    Export(ExportArgs),
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
        Command::Report(args) => run_finance_report(args),
        Command::Roster(args) => run_monthly_report(args),
        Command::Export(args) => run_export(args),
    }
}
