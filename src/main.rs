#[tokio::main]
async fn main() -> anyhow::Result<()> {
    formpulse::start_server().await
}
