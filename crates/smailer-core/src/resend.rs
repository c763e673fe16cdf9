//! Retrying delivery of events that are still pending.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::Result;
use crate::delivery::{Delivery, DeliveryOutcome};
use crate::dispatch::DispatchErrorKind;
use crate::ports::{EventStore, MailTransport, NotificationKind};
use crate::time::Clock;

/// What started a resend pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendTrigger {
    /// Application start.
    Startup,
    /// The network came back.
    ConnectivityRestored,
    /// Periodic timer; throttled by the minimum resend interval.
    Timer,
}

/// Counts from one resend pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Deliveries attempted.
    pub attempted: usize,
    /// Events emailed.
    pub sent: usize,
    /// Events already handled by someone else.
    pub skipped: usize,
    /// Events still pending after the attempt.
    pub failed: usize,
    /// The pass stopped early on a configuration error.
    pub aborted: bool,
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted, {} sent, {} skipped, {} failed",
            self.attempted, self.sent, self.skipped, self.failed
        )?;
        if self.aborted {
            f.write_str(" (aborted)")?;
        }
        Ok(())
    }
}

/// Result of asking for a resend pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass ran.
    Completed(PassSummary),
    /// Another pass was in progress; nothing was done.
    AlreadyRunning,
    /// A timer pass came too soon after the previous pass.
    Throttled,
}

/// Runs resend passes over all pending events.
pub struct ResendCoordinator<T, E> {
    delivery: Arc<Delivery<T, E>>,
    clock: Arc<dyn Clock>,
    /// Held for the whole pass; stores when the last pass started.
    last_pass: Mutex<Option<Instant>>,
}

impl<T: MailTransport, E: EventStore> ResendCoordinator<T, E> {
    /// Creates a coordinator sharing the delivery service.
    #[must_use]
    pub fn new(delivery: Arc<Delivery<T, E>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            delivery,
            clock,
            last_pass: Mutex::new(None),
        }
    }

    /// Runs one pass unless one is already running or the trigger is throttled.
    ///
    /// # Errors
    ///
    /// Returns an error if the event store fails.
    pub async fn run(&self, trigger: ResendTrigger) -> Result<PassOutcome> {
        let Ok(mut last_pass) = self.last_pass.try_lock() else {
            debug!("Resend pass already running, ignoring {trigger:?}");
            return Ok(PassOutcome::AlreadyRunning);
        };

        let settings = self.delivery.settings().read().await.clone();

        if trigger == ResendTrigger::Timer
            && let Some(started) = *last_pass
            && !self
                .clock
                .has_elapsed(started, settings.resend_min_interval())
        {
            debug!("Resend pass throttled");
            return Ok(PassOutcome::Throttled);
        }
        *last_pass = Some(self.clock.now());

        let summary = self.pass().await?;
        info!("Resend pass ({trigger:?}): {summary}");

        if (summary.failed > 0 || summary.aborted) && settings.notifications.on_error {
            self.delivery.notifier().notify(
                NotificationKind::ResendFailed,
                &format!(
                    "{} of {} pending events were not sent",
                    summary.failed, summary.attempted
                ),
            );
        }

        Ok(PassOutcome::Completed(summary))
    }

    async fn pass(&self) -> Result<PassSummary> {
        let pending = self.delivery.events().list_pending().await?;
        let mut summary = PassSummary::default();

        for event in pending {
            let Some(id) = event.id else {
                continue;
            };
            summary.attempted += 1;

            match self.delivery.deliver(id).await? {
                DeliveryOutcome::Sent => summary.sent += 1,
                DeliveryOutcome::Skipped => summary.skipped += 1,
                DeliveryOutcome::Failed(e) => {
                    summary.failed += 1;
                    if e.kind() == DispatchErrorKind::Configuration {
                        warn!("Stopping resend pass: {e}");
                        summary.aborted = true;
                        break;
                    }
                }
            }
        }

        Ok(summary)
    }
}

impl<T, E> ResendCoordinator<T, E>
where
    T: MailTransport + 'static,
    E: EventStore + 'static,
{
    /// Runs timer passes every `period` until the handle is aborted.
    ///
    /// The first pass happens one period from now.
    #[must_use]
    pub fn spawn_periodic(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = self.run(ResendTrigger::Timer).await {
                    warn!("Resend pass failed: {e}");
                }
            }
        })
    }
}
