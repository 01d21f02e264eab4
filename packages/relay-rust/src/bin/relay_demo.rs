//! Runs a scripted lobby session against the in-memory store and logs
//! every UI event the relay emits.
//!
//! Log output follows `RUST_LOG` (default `lobby_relay=info`); set
//! `LOBBY_LOG_JSON=1` at build time for JSON lines.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lobby_core::{status, ChatMessage, Command, Game, GameRequest, Player, UiEvent};
use lobby_relay::storage::{MutationObserver, TracingObserver};
use lobby_relay::tracing_init::{init_tracing, DEFAULT_FILTER};
use lobby_relay::{DocumentStore, EventRelay, RelayConfig, UiPort};
use serde_json::json;
use tracing::info;

const SETTLE: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(DEFAULT_FILTER, option_env!("LOBBY_LOG_JSON").is_some())
        .context("installing tracing subscriber")?;

    let config = RelayConfig::default();
    info!(store = ?config.store, "starting lobby relay demo");

    let store = Arc::new(
        config
            .store
            .memory_store(vec![Arc::new(TracingObserver) as Arc<dyn MutationObserver>])
            .context("opening store")?,
    );
    let relay = EventRelay::new(Arc::clone(&store) as Arc<dyn DocumentStore>, config);
    let (handle, mut port) = relay.start().await.context("starting relay")?;

    let host = register(&mut port, "Ann").await?;
    port.send(Command::OpenGame(Game::with_status(status::OPEN)))
        .await?;
    let game_id = loop {
        match next(&mut port).await? {
            UiEvent::GameOpened(id) => break id,
            other => log_event(&other),
        }
    };

    port.send(Command::RequestToJoinGame(GameRequest {
        game_id: game_id.clone(),
        player: Player {
            id: Some(host.clone()),
            ..Player::named("Ann")
        },
    }))
    .await?;

    let mut running = Game::with_status(status::RUNNING);
    running.id = Some(game_id.clone());
    port.send(Command::ChangeGame(running)).await?;

    let mut chat = ChatMessage::default();
    chat.body.insert("from".to_string(), json!(host));
    chat.body.insert("text".to_string(), json!("good luck"));
    port.send(Command::SendChat(chat)).await?;

    drain(&mut port).await;

    info!("simulating connection loss");
    let fired = store.disconnect();
    info!(fired, "disconnect hooks fired");
    drain(&mut port).await;

    handle.shutdown().await;
    Ok(())
}

async fn register(port: &mut UiPort, name: &str) -> anyhow::Result<String> {
    port.send(Command::RegisterPlayer(Player::named(name)))
        .await?;
    loop {
        match next(port).await? {
            UiEvent::PlayerRegistered(player) => {
                return player.id.context("registered player without id");
            }
            other => log_event(&other),
        }
    }
}

async fn next(port: &mut UiPort) -> anyhow::Result<UiEvent> {
    let event = tokio::time::timeout(Duration::from_secs(5), port.next_event())
        .await
        .context("timed out waiting for relay")?
        .context("relay stopped")?;
    Ok(event)
}

async fn drain(port: &mut UiPort) {
    while let Ok(Some(event)) = tokio::time::timeout(SETTLE, port.next_event()).await {
        log_event(&event);
    }
}

fn log_event(event: &UiEvent) {
    match serde_json::to_string(event) {
        Ok(line) => info!(event = %line, "ui event"),
        Err(err) => info!(error = %err, "ui event not encodable"),
    }
}
