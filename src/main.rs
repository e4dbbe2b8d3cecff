use anyhow::Context;
use civic_voice::config::Config;
use civic_voice::server::{ApiServer, AppState};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(
        gemini = config.gemini.has_key(),
        groq = config.groq.has_key(),
        tts = config.tts.provider.has_key(),
        "credentials loaded"
    );

    let state = AppState::from_config(&config);
    let mut server = ApiServer::start(state, &config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    tracing::info!("Server running on http://{}", server.addr());

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            tracing::info!("shutdown requested");
        }
        _ = server.wait() => {
            tracing::warn!("server task exited");
            return Ok(());
        }
    }

    server.shutdown().await;
    Ok(())
}
