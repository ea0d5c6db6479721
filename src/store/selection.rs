use std::collections::HashMap;
use tokio::sync::watch;

use crate::error::{AppError, AppResult};

/// Look-back hours selected for each configured machine.
///
/// Each machine has its own `watch` channel so the machine's poller wakes up
/// as soon as the selection changes. The machine set is fixed at startup.
pub struct Selections {
    order: Vec<String>,
    channels: HashMap<String, watch::Sender<u32>>,
    max_hours: u32,
}

impl Selections {
    #[must_use]
    pub fn new(machines: &[String], default_hours: u32, max_hours: u32) -> Self {
        let mut order = Vec::with_capacity(machines.len());
        let mut channels = HashMap::with_capacity(machines.len());
        for machine in machines {
            if channels.contains_key(machine) {
                continue;
            }
            let (tx, _rx) = watch::channel(default_hours);
            channels.insert(machine.clone(), tx);
            order.push(machine.clone());
        }

        Self {
            order,
            channels,
            max_hours,
        }
    }

    /// Machines in configuration order.
    pub fn machines(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, machine: &str) -> bool {
        self.channels.contains_key(machine)
    }

    #[must_use]
    pub fn hours(&self, machine: &str) -> Option<u32> {
        self.channels.get(machine).map(|tx| *tx.borrow())
    }

    #[must_use]
    pub fn max_hours(&self) -> u32 {
        self.max_hours
    }

    /// Change the selection for a machine. Returns whether the value changed;
    /// subscribers are only notified when it did.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown machines and
    /// `AppError::BadRequest` when `hours` is outside `1..=max_hours`.
    pub fn set_hours(&self, machine: &str, hours: u32) -> AppResult<bool> {
        let tx = self
            .channels
            .get(machine)
            .ok_or_else(|| AppError::NotFound(format!("Machine '{machine}' not found")))?;

        if hours == 0 || hours > self.max_hours {
            return Err(AppError::BadRequest(format!(
                "hours must be between 1 and {}",
                self.max_hours
            )));
        }

        let changed = tx.send_if_modified(|current| {
            if *current == hours {
                false
            } else {
                *current = hours;
                true
            }
        });

        if changed {
            tracing::info!(machine, hours, "Selection changed");
        }
        Ok(changed)
    }

    #[must_use]
    pub fn subscribe(&self, machine: &str) -> Option<watch::Receiver<u32>> {
        self.channels.get(machine).map(watch::Sender::subscribe)
    }
}
