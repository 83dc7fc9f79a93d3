#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = pmprep_rust::run().await {
        eprintln!("pmprep-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
