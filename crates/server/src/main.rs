#[tokio::main]
async fn main() -> anyhow::Result<()> {
    consultkit_server::start().await
}
