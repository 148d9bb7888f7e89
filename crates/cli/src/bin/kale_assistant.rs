use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    kale_cli::main_entry().await
}
