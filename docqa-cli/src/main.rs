use clap::Parser;
use docqa_cli::{Cli, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let mut stdout = std::io::stdout();
    docqa_cli::run(cli, &mut stdout).await
}
