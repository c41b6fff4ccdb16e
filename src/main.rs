use agentdesk::AppConfig;
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_arch = "wasm32"))]
fn load_dotenv() {
    // A missing .env is normal outside development
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("ignoring unreadable .env: {err}");
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn load_dotenv() {}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    load_dotenv();
    init_tracing();

    let config = AppConfig::from_env().context("invalid agentdesk configuration")?;
    tracing::info!(
        endpoint = %config.endpoint,
        mode = config.response_mode.as_str(),
        "starting agentdesk"
    );
    agentdesk::ui::launch(config);
    Ok(())
}
