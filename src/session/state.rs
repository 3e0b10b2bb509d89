//! One live session and its driver slot.

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tokio::time::Instant;

use crate::driver::{Capabilities, Driver};

/// The slot holding a session's driver. Empty once the session is released.
pub type DriverSlot<'a> = MutexGuard<'a, Option<Box<dyn Driver>>>;

/// A client-visible session bound to one driver.
pub struct Session {
    id: String,
    capabilities: Capabilities,
    created_at: SystemTime,
    last_access: Mutex<Instant>,
    driver: AsyncMutex<Option<Box<dyn Driver>>>,
}

impl Session {
    pub fn new(id: String, capabilities: Capabilities, driver: Box<dyn Driver>) -> Self {
        Self {
            id,
            capabilities,
            created_at: SystemTime::now(),
            last_access: Mutex::new(Instant::now()),
            driver: AsyncMutex::new(Some(driver)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Record activity now.
    pub fn touch(&self) {
        let mut last = self.last_access.lock().unwrap_or_else(|e| e.into_inner());
        *last = Instant::now();
    }

    pub fn last_access(&self) -> Instant {
        *self.last_access.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Time since the last recorded activity, as seen at `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_access())
    }

    /// Exclusive access to the driver. Waits for any command in flight.
    pub async fn lock_driver(&self) -> DriverSlot<'_> {
        self.driver.lock().await
    }

    /// Quit the driver. Only the first call does anything.
    pub async fn release(&self) -> bool {
        let mut slot = self.driver.lock().await;
        match slot.take() {
            Some(mut driver) => {
                driver.quit().await;
                tracing::info!(session_id = %self.id, "Session released");
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
