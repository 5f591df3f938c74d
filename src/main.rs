#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = campus_enrollment::run().await {
        eprintln!("campus-enrollment fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
