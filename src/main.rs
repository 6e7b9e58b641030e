#[tokio::main]
async fn main() -> anyhow::Result<()> {
    typeassist::run().await
}
