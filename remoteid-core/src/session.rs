//! Per-aircraft session registry.
//!
//! Maps aircraft ID to the merged `Uav` record, fires lifecycle callbacks,
//! and evicts records that have not been seen within the timeout. Pure state
//! machine: the caller drives `update` and `cleanup`; callbacks run
//! synchronously on the calling thread before the triggering call returns.
//!
//! Not safe for concurrent mutation — all entry points take `&mut self`, so
//! callers either confine a registry to one thread or serialize access.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::types::Uav;

/// Callback invoked with a borrow of the affected record; the borrow is only
/// valid for the duration of the call.
pub type UavCallback = Box<dyn FnMut(&Uav)>;

pub struct SessionManager {
    uavs: HashMap<String, Uav>,
    timeout: Duration,

    on_new_uav: Option<UavCallback>,
    on_uav_update: Option<UavCallback>,
    on_uav_timeout: Option<UavCallback>,
}

impl SessionManager {
    pub fn new(timeout_ms: u32) -> Self {
        SessionManager {
            uavs: HashMap::new(),
            timeout: Duration::from_millis(timeout_ms as u64),
            on_new_uav: None,
            on_uav_update: None,
            on_uav_timeout: None,
        }
    }

    /// Merge a decoded record into the registry. Returns true if the aircraft
    /// was not previously tracked.
    ///
    /// Records with an empty ID are rejected without mutation. On merge the
    /// signal fields always win, while each optional part only overwrites
    /// when the incoming copy is valid — previously seen data is never lost
    /// to a frame that omits it.
    pub fn update(&mut self, uav: Uav) -> bool {
        if uav.id.is_empty() {
            return false;
        }

        match self.uavs.get_mut(&uav.id) {
            None => {
                info!(id = %uav.id, transport = ?uav.transport, "new aircraft");
                let id = uav.id.clone();
                if let Some(cb) = self.on_new_uav.as_mut() {
                    cb(&uav);
                }
                self.uavs.insert(id, uav);
                true
            }
            Some(existing) => {
                existing.rssi = uav.rssi;
                existing.last_seen = uav.last_seen;
                existing.message_count += 1;

                if uav.location.valid {
                    existing.location = uav.location;
                }
                if uav.system.valid {
                    existing.system = uav.system;
                }
                if uav.self_id.valid {
                    existing.self_id = uav.self_id;
                }
                if uav.operator_id.valid {
                    existing.operator_id = uav.operator_id;
                }
                if !uav.auth_data.is_empty() {
                    existing.auth_data = uav.auth_data;
                }

                if let Some(cb) = self.on_uav_update.as_mut() {
                    cb(existing);
                }
                false
            }
        }
    }

    /// Snapshot of all tracked aircraft, most recently seen first.
    pub fn active_uavs(&self) -> Vec<Uav> {
        let mut result: Vec<Uav> = self.uavs.values().cloned().collect();
        result.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        result
    }

    pub fn get(&self, id: &str) -> Option<&Uav> {
        self.uavs.get(id)
    }

    pub fn count(&self) -> usize {
        self.uavs.len()
    }

    /// Evict aircraft not seen within the timeout, firing `on_uav_timeout`
    /// for each. Returns the evicted IDs.
    pub fn cleanup(&mut self) -> Vec<String> {
        self.cleanup_at(Instant::now())
    }

    /// Eviction against an explicit clock, for callers that drive time.
    pub fn cleanup_at(&mut self, now: Instant) -> Vec<String> {
        let expired: Vec<String> = self
            .uavs
            .iter()
            .filter(|(_, uav)| now.duration_since(uav.last_seen) > self.timeout)
            .map(|(id, _)| id.clone())
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(uav) = self.uavs.remove(&id) {
                if let Some(cb) = self.on_uav_timeout.as_mut() {
                    cb(&uav);
                }
                removed.push(id);
            }
        }

        if !removed.is_empty() {
            debug!(count = removed.len(), "evicted timed-out aircraft");
        }
        removed
    }

    /// Remove a single aircraft without firing callbacks.
    pub fn remove(&mut self, id: &str) -> Option<Uav> {
        self.uavs.remove(id)
    }

    /// Drop all records without firing callbacks.
    pub fn clear(&mut self) {
        self.uavs.clear();
    }

    /// Each setter replaces any previously installed callback.
    pub fn set_on_new_uav(&mut self, callback: UavCallback) {
        self.on_new_uav = Some(callback);
    }

    pub fn set_on_uav_update(&mut self, callback: UavCallback) {
        self.on_uav_update = Some(callback);
    }

    pub fn set_on_uav_timeout(&mut self, callback: UavCallback) {
        self.on_uav_timeout = Some(callback);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
