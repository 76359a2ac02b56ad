use anyhow::Result;
use campus_assistant::cli::CliArgs;
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    campus_assistant::run(args).await
}
