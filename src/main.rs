use onboard_flow::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    eprintln!("Onboard Flow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Config API: http://{}/api/admin/config", config.listen_addr());
    eprintln!("   Onboarding API: http://{}/api/onboarding", config.listen_addr());
    eprintln!("   Database: {}", config.db_path.display());

    onboard_flow::server::serve(&config, async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutting down");
    })
    .await?;

    Ok(())
}
