//! Async driver for one stage client
//!
//! Feeds host commands and hub messages into a [`StageController`] and
//! wakes it when its next timer is due. The controller's virtual clock is
//! kept at the milliseconds elapsed since the runtime started.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use crate::application::services::{StageCommand, StageController};
use crate::infrastructure::messaging::{BroadcastHub, HubMessage};

/// Commands a host may queue before the runtime catches up
pub const COMMAND_BUFFER: usize = 32;

pub struct StageRuntime {
    controller: StageController,
    commands: mpsc::Receiver<StageCommand>,
    broadcasts: broadcast::Receiver<HubMessage>,
    origin: Instant,
}

impl StageRuntime {
    /// Subscribe `controller` to `hub`; the sender queues host commands
    ///
    /// Dropping every sender stops the runtime.
    pub fn new(
        controller: StageController,
        hub: &BroadcastHub,
    ) -> (Self, mpsc::Sender<StageCommand>) {
        let (sender, commands) = mpsc::channel(COMMAND_BUFFER);
        let runtime = Self {
            controller,
            commands,
            broadcasts: hub.subscribe(),
            origin: Instant::now(),
        };
        (runtime, sender)
    }

    /// Run until the command senders are gone, then hand the controller back
    pub async fn run(mut self) -> StageController {
        let user = self.controller.user().id.clone();
        tracing::info!(user = %user, "Stage runtime started");
        let mut hub_open = true;

        loop {
            let deadline = self
                .controller
                .next_deadline()
                .map(|ms| self.origin + Duration::from_millis(ms));

            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    self.catch_up();
                    tracing::debug!(user = %user, command = ?command, "Stage command");
                    self.controller.execute(command);
                }
                message = self.broadcasts.recv(), if hub_open => {
                    match message {
                        Ok(message) => {
                            self.catch_up();
                            self.controller.on_broadcast(&message.topic, &message.payload);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(user = %user, skipped, "Missed stage broadcasts");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::warn!(user = %user, "Broadcast hub closed");
                            hub_open = false;
                        }
                    }
                }
                _ = wait_until(deadline) => {
                    self.catch_up();
                }
            }
        }

        self.catch_up();
        tracing::info!(user = %user, "Stage runtime stopped");
        self.controller
    }

    fn catch_up(&mut self) {
        let elapsed = self.origin.elapsed().as_millis() as u64;
        self.controller.advance_to(elapsed);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
