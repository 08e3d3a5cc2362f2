use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use blueprint_forge::client::HttpChatService;
use blueprint_forge::config::ForgeConfig;
use blueprint_forge::health;
use blueprint_forge::orchestrator::Orchestrator;
use blueprint_forge::store::BlueprintStore;
use blueprint_forge::transport::telegram::TelegramNotifier;

#[derive(Parser, Debug)]
#[command(name = "blueprint-forge", about = "Chat-driven project scaffolder")]
struct Cli {
    /// Port for the hosting platform's liveness probe.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    health_port: u16,

    /// Server-side long-poll window for transport updates, in seconds.
    #[arg(long, default_value_t = 50)]
    poll_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = ForgeConfig::from_env()?;
    info!(
        model = %config.model,
        max_files = config.max_files,
        ttl_secs = config.blueprint_ttl.as_secs(),
        "blueprint-forge starting"
    );

    tokio::spawn(async move {
        if let Err(e) = health::serve(cli.health_port).await {
            warn!("liveness endpoint failed: {e}");
        }
    });

    let notifier = Arc::new(TelegramNotifier::new(&config.telegram_token));
    let service = Arc::new(HttpChatService::new(
        config.generation_base_url.clone(),
        config.generation_api_key.clone(),
    ));
    let store = Arc::new(BlueprintStore::new(config.blueprint_ttl));
    let orchestrator = Arc::new(Orchestrator::new(
        config,
        store,
        service,
        notifier.clone(),
    ));

    run_polling(notifier, orchestrator, cli.poll_timeout_secs).await
}

/// Long-poll the transport and dispatch each update on its own task, so a
/// multi-minute build in one chat never stalls another.
async fn run_polling(
    notifier: Arc<TelegramNotifier>,
    orchestrator: Arc<Orchestrator>,
    poll_timeout_secs: u64,
) -> Result<()> {
    let mut offset: i64 = 0;
    info!("polling for updates");

    loop {
        let updates = match notifier.get_updates(offset, poll_timeout_secs).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("update poll failed, backing off: {e}");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            if let Some(message) = update.message {
                let Some(text) = message.text.clone() else { continue };
                if let Some(request) = text.strip_prefix("/create") {
                    if !request.is_empty() && !request.starts_with(char::is_whitespace) {
                        continue;
                    }
                    let orchestrator = orchestrator.clone();
                    let chat = message.chat.id;
                    let request = request.to_string();
                    tokio::spawn(async move {
                        orchestrator.handle_create(chat, &request).await;
                    });
                }
            } else if let Some(callback) = update.callback_query {
                if let Err(e) = notifier.answer_callback(&callback.id).await {
                    warn!("failed to ack callback: {e}");
                }
                let (Some(data), Some(message)) = (callback.data, callback.message) else {
                    continue;
                };
                if !data.starts_with("build|") {
                    continue;
                }
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator
                        .handle_confirm(message.chat.id, &data, message.msg_ref())
                        .await;
                });
            }
        }
    }
}
