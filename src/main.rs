use anyhow::Result;
use mailtag::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
