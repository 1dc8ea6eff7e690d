use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    web3_state_sim::run().await?;
    Ok(())
}
