// ============================================================================
// InkBook Infrastructure - Request Expiry Sweeper
// File: crates/inkbook-infrastructure/src/jobs/expiry_sweeper.rs
// ============================================================================
//! Periodically moves overdue PENDING requests to EXPIRED.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use inkbook_core::services::AppointmentRequestService;

pub struct ExpirySweeper {
    requests: Arc<AppointmentRequestService>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(requests: Arc<AppointmentRequestService>, interval: Duration) -> Self {
        Self { requests, interval }
    }

    /// Runs a single sweep and returns how many requests expired
    pub async fn run_once(&self) -> usize {
        match self.requests.expire_requests().await {
            Ok(count) => {
                if count > 0 {
                    info!("Expiry sweep expired {} request(s)", count);
                }
                count
            }
            Err(e) => {
                error!("Expiry sweep failed: {}", e);
                0
            }
        }
    }

    /// Spawns the sweep loop. It stops once `shutdown` flips to `true`.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Expiry sweeper started (every {:?})", self.interval);

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Expiry sweeper stopped");
        })
    }
}
