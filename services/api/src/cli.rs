use crate::demo::{run_demo, run_describe, DemoArgs, DescribeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use tenancy_processes::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Tenancy Processes",
    about = "Run and explore the tenancy process workflow engine from the command line",
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
    /// Walk a sole-to-joint application end to end against in-memory collaborators
    Demo(DemoArgs),
    /// Print the states, triggers, and edges of the registered workflows
    Describe(DescribeArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Describe(args) => run_describe(args),
    }
}
