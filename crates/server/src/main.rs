#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cpiquery_server::start().await
}
