use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    docsearch_cli::main_entry().await
}
