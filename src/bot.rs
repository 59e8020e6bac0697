//! Discord client setup, event dispatch and shutdown.

use std::{error::Error as StdError, sync::Arc};

use log::{debug, info, warn};
use poise::{
    BoxFuture, Framework, FrameworkOptions,
    serenity_prelude::{ActivityData, ClientBuilder, Context, FullEvent, GatewayIntents},
};

use crate::config::{Config, ModerationSet};
use crate::error::Result;
use crate::gateway::{IncomingMessage, SerenityGateway};
use crate::moderation::{ModerationOutcome, moderate};

type EventResult = std::result::Result<(), Box<dyn StdError + Send + Sync>>;

const STATUS: &str = "for flags (´･ω･`)";

struct Data {
    moderation: Arc<ModerationSet>,
}

/// Run the Discord bot until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the moderation configuration cannot be loaded or the
/// Discord client fails to start.
pub async fn run(config: Config) -> Result<()> {
    info!("Initializing bot");
    let moderation = Arc::new(ModerationSet::load(&config.config_dir)?);

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            event_handler: |ctx, event, _framework, data| event_handler(ctx, event, data),
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                info!("Bot is ready and connected to Discord as {}", ready.user.name);
                ctx.set_activity(Some(ActivityData::watching(STATUS)));
                Ok(Data { moderation })
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(config.discord_token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        info!("Shutdown signal received, closing Discord session");
        shard_manager.shutdown_all().await;
    });

    info!("flagbot is now running. Press CTRL-C to exit.");
    client.start().await?;

    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                let ctrl_c = async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("Failed to listen for CTRL-C, waiting for SIGTERM only: {e}");
                        std::future::pending::<()>().await;
                    }
                };
                tokio::select! {
                    () = ctrl_c => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL-C, shutdown signals are disabled: {e}");
        std::future::pending::<()>().await;
    }
}

/// Spawns one detached moderation task per message; never waits on it.
fn event_handler<'a>(
    ctx: &'a Context,
    event: &'a FullEvent,
    data: &'a Data,
) -> BoxFuture<'a, EventResult> {
    if let FullEvent::Message { new_message } = event {
        let message = IncomingMessage::from(new_message);
        let gateway = SerenityGateway::new(ctx.http.clone());
        let moderation = Arc::clone(&data.moderation);

        tokio::spawn(async move {
            if let ModerationOutcome::Moderated {
                deleted,
                response_sent,
                media_sent,
            } = moderate(&gateway, &moderation, &message).await
            {
                debug!(
                    "Finished moderating message {} (deleted: {deleted}, response: {response_sent}, media: {media_sent})",
                    message.id
                );
            }
        });
    }
    Box::pin(async { Ok(()) })
}
