//! Overstay sweeper: background ACTIVE→OVERSTAY transitions.
//!
//! Runs on a fixed interval, independent of request traffic, and only
//! touches booking rows. Each row's transition is its own conditional
//! update, so a crash mid-batch leaves processed rows correct and the rest
//! for the next run, and re-running after a quiet period changes nothing.

use crate::config::SweeperConfig;
use crate::environment::Clock;
use crate::error::Result;
use crate::providers::BookingStore;
use std::sync::Arc;
use tokio::sync::watch;

/// Transitions expired ACTIVE bookings to OVERSTAY.
///
/// Overstay is a billing/alerting signal, not a vacancy signal: the slot
/// stays claimed until the booking is explicitly completed or cancelled.
#[derive(Debug, Clone)]
pub struct OverstaySweeper<B, C> {
    bookings: Arc<B>,
    clock: Arc<C>,
    config: SweeperConfig,
}

impl<B, C> OverstaySweeper<B, C>
where
    B: BookingStore,
    C: Clock,
{
    /// Create a sweeper over the given booking store and clock.
    #[must_use]
    pub const fn new(bookings: Arc<B>, clock: Arc<C>, config: SweeperConfig) -> Self {
        Self {
            bookings,
            clock,
            config,
        }
    }

    /// One sweep: find ACTIVE bookings whose expected end has passed and
    /// transition each, one at a time. A row that fails is logged and
    /// skipped; the rest of the batch proceeds.
    ///
    /// Returns how many bookings were transitioned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the expired-booking query itself fails;
    /// per-row failures never abort the batch.
    pub async fn sweep_once(&self) -> Result<usize> {
        let now = self.clock.now();
        let expired = self
            .bookings
            .list_expired_active(now, self.config.batch_limit)
            .await?;

        let mut transitioned = 0;
        for booking in expired {
            match self.bookings.mark_overstayed(booking.id).await {
                Ok(true) => {
                    transitioned += 1;
                    tracing::info!(
                        booking_id = %booking.id,
                        slot_id = %booking.slot_id,
                        expected_end = ?booking.expected_end_time,
                        "booking transitioned to overstay"
                    );
                    metrics::counter!("parking.bookings.overstayed").increment(1);
                }
                // Cancelled or completed between the query and the update.
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(
                        booking_id = %booking.id,
                        %error,
                        "overstay transition failed, continuing with batch"
                    );
                    metrics::counter!("parking.sweeper.row_failures").increment(1);
                }
            }
        }

        Ok(transitioned)
    }

    /// Run sweeps on the configured interval until a shutdown signal
    /// arrives.
    ///
    /// Send `true` on the paired [`watch::Sender`] to stop the loop; the
    /// owning task then joins cleanly.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        // The first tick fires immediately; that initial sweep picks up
        // anything that expired while the process was down.
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sweep_once().await {
                        Ok(0) => {}
                        Ok(count) => {
                            tracing::info!(count, "overstay sweep finished");
                        }
                        Err(error) => {
                            tracing::error!(%error, "overstay sweep failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("overstay sweeper shutting down");
                        return;
                    }
                }
            }
        }
    }
}
