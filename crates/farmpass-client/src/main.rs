#[tokio::main]
async fn main() -> anyhow::Result<()> {
    farmpass_client_lib::run().await
}
