//! Command path: UI commands to gateway calls to acknowledgement events.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use lobby_core::{Command, CommandFailure, RequestAck, UiEvent};
use tower::Service;
use tracing::{debug, warn};

use crate::gateway::{GatewayError, RecordGateway};

type BoxedFuture = Pin<Box<dyn Future<Output = Result<UiEvent, Infallible>> + Send>>;

/// Executes one [`Command`] and answers with exactly one [`UiEvent`].
///
/// Success yields the command's acknowledgement; any failure yields
/// [`UiEvent::CommandFailed`]. The service itself never errors.
///
/// Beyond the write itself:
/// - `openGame` arms abandon-on-disconnect for the new game
/// - `registerPlayer` arms delete-on-disconnect for the new player
/// - `finishGame` disarms the game's abandon hook
///
/// A hook that cannot be armed is logged; the command still succeeds.
#[derive(Clone)]
pub struct CommandService {
    gateway: RecordGateway,
}

impl CommandService {
    #[must_use]
    pub fn new(gateway: RecordGateway) -> Self {
        Self { gateway }
    }

    /// Runs `command` to its single result event.
    pub async fn execute(&self, command: Command) -> UiEvent {
        let name = command.name();
        match self.dispatch(command).await {
            Ok(event) => {
                debug!(command = name, "command acknowledged");
                event
            }
            Err(err) => {
                warn!(command = name, error = %err, "command failed");
                UiEvent::CommandFailed(CommandFailure {
                    command: name.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn dispatch(&self, command: Command) -> Result<UiEvent, GatewayError> {
        match command {
            Command::OpenGame(game) => {
                let id = self.gateway.open(&game).await?;
                if let Err(err) = self.gateway.abandon_on_disconnect(&id).await {
                    warn!(game_id = %id, error = %err, "abandon hook not armed");
                }
                Ok(UiEvent::GameOpened(id))
            }
            Command::ChangeGame(game) => Ok(UiEvent::GameUpdated(self.gateway.update(&game).await?)),
            Command::RegisterPlayer(mut player) => {
                let id = self.gateway.register_player(&player).await?;
                if let Err(err) = self.gateway.delete_on_disconnect(&id).await {
                    warn!(player_id = %id, error = %err, "delete hook not armed");
                }
                player.id = Some(id);
                Ok(UiEvent::PlayerRegistered(player))
            }
            Command::RequestToJoinGame(request) => {
                let request_id = self.gateway.request_to_join_game(&request).await?;
                Ok(UiEvent::JoinRequested(RequestAck {
                    game_id: request.game_id,
                    request_id,
                }))
            }
            Command::WatchGame(request) => {
                let request_id = self.gateway.watch_game(&request).await?;
                Ok(UiEvent::WatchRequested(RequestAck {
                    game_id: request.game_id,
                    request_id,
                }))
            }
            Command::FinishGame(game_id) => {
                self.gateway.cancel_abandon_on_disconnect(&game_id).await?;
                Ok(UiEvent::GameFinished(game_id))
            }
            Command::SendChat(message) => Ok(UiEvent::ChatSent(self.gateway.send_chat(&message).await?)),
        }
    }
}

impl Service<Command> for CommandService {
    type Response = UiEvent;
    type Error = Infallible;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, command: Command) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { Ok(this.execute(command).await) })
    }
}
