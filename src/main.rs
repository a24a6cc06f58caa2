#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = proctora::run().await {
        eprintln!("proctora fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
