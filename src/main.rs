/*
 * Responsibility
 * - Start the tokio runtime
 * - Hand over to app::run() (no logic here)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    credgate::app::run().await
}
