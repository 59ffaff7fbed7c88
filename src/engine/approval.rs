use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    InFlight,
    CoolingDown(Instant),
}

/// Serializes quote approvals. Only one approval may run at a time and a
/// short cooldown follows each one, so a double-clicked approve button
/// cannot produce two trips.
#[derive(Debug, Clone)]
pub struct ApprovalGuard {
    // Locked only for a state swap, never across an await.
    phase: Arc<Mutex<Phase>>,
    cooldown: Duration,
}

/// Held for the duration of one approval. Dropping it starts the cooldown.
#[derive(Debug)]
pub struct ApprovalPermit {
    phase: Arc<Mutex<Phase>>,
    cooldown: Duration,
}

impl ApprovalGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            phase: Arc::new(Mutex::new(Phase::Idle)),
            cooldown,
        }
    }

    pub fn try_acquire(&self) -> Result<ApprovalPermit, AppError> {
        let mut phase = self
            .phase
            .lock()
            .map_err(|_| AppError::Internal("approval guard poisoned".to_string()))?;

        match *phase {
            Phase::InFlight => {
                warn!("approval rejected: another approval is running");
                return Err(AppError::Conflict(
                    "an approval is already in progress".to_string(),
                ));
            }
            Phase::CoolingDown(until) if Instant::now() < until => {
                debug!("approval rejected during cooldown");
                return Err(AppError::Conflict(
                    "approval cooling down, retry shortly".to_string(),
                ));
            }
            _ => {}
        }

        *phase = Phase::InFlight;
        Ok(ApprovalPermit {
            phase: Arc::clone(&self.phase),
            cooldown: self.cooldown,
        })
    }

    pub fn is_busy(&self) -> bool {
        match self.phase.lock() {
            Ok(phase) => match *phase {
                Phase::Idle => false,
                Phase::InFlight => true,
                Phase::CoolingDown(until) => Instant::now() < until,
            },
            Err(_) => true,
        }
    }
}

impl Drop for ApprovalPermit {
    fn drop(&mut self) {
        if let Ok(mut phase) = self.phase.lock() {
            *phase = if self.cooldown.is_zero() {
                Phase::Idle
            } else {
                Phase::CoolingDown(Instant::now() + self.cooldown)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_while_in_flight_conflicts() {
        let guard = ApprovalGuard::new(Duration::ZERO);
        let permit = guard.try_acquire().unwrap();
        assert!(guard.is_busy());
        assert!(matches!(guard.try_acquire(), Err(AppError::Conflict(_))));
        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_ok());
    }

    #[test]
    fn cooldown_blocks_until_elapsed() {
        let guard = ApprovalGuard::new(Duration::from_millis(40));
        drop(guard.try_acquire().unwrap());
        assert!(matches!(guard.try_acquire(), Err(AppError::Conflict(_))));
        std::thread::sleep(Duration::from_millis(60));
        assert!(guard.try_acquire().is_ok());
    }

    #[test]
    fn clones_share_the_same_flag() {
        let guard = ApprovalGuard::new(Duration::ZERO);
        let other = guard.clone();
        let _permit = guard.try_acquire().unwrap();
        assert!(other.try_acquire().is_err());
    }
}
