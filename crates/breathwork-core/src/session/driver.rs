//! Real-time driver.
//!
//! Runs a [`SessionController`] against the tokio clock: sleep until the
//! next wake-up is due, deliver it, repeat. Everything happens on the one
//! task that owns the driver, so session state is never touched
//! concurrently.

use std::ops::ControlFlow;

use tokio::sync::watch;
use tokio::time::{self, Instant};

use super::controller::SessionController;
use crate::events::Event;

pub struct SessionDriver {
    controller: SessionController,
    /// Wall-clock instant matching the controller's time zero.
    origin: Instant,
}

impl SessionDriver {
    pub fn new(controller: SessionController) -> Self {
        let now = Instant::now();
        let origin = now.checked_sub(controller.now()).unwrap_or(now);
        Self { controller, origin }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut SessionController {
        &mut self.controller
    }

    /// Drive wake-ups until `shutdown` flips to true, its sender is dropped,
    /// or `on_event` breaks.
    ///
    /// `on_event` sees every event produced by a wake-up, after the
    /// controller has applied it.
    pub async fn run<F>(&mut self, mut shutdown: watch::Receiver<bool>, mut on_event: F)
    where
        F: FnMut(&SessionController, &Event) -> ControlFlow<()>,
    {
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let Some(due) = self.controller.next_due() else {
                // Nothing scheduled: idle until told otherwise.
                if shutdown.changed().await.is_err() {
                    break;
                }
                continue;
            };

            tokio::select! {
                _ = time::sleep_until(self.origin + due) => {
                    for event in self.controller.advance_to(due) {
                        if on_event(&self.controller, &event).is_break() {
                            return;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("session driver exiting");
    }
}
