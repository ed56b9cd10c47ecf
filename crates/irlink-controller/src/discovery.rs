//! Service discovery seam.
//!
//! On the board the HTTP service is announced over mDNS under the board id.
//! Adoption renames the board, so the announcement has to be withdrawn and
//! registered again.

use std::sync::{Arc, Mutex, PoisonError};

use irlink_core::constants::MDNS_SERVICE;
use tracing::info;

/// Announces the HTTP service on the local network.
pub trait ServiceAdvertiser: Send + Sync {
    /// Register `<instance>.local` offering the HTTP service on `port`.
    fn advertise(&mut self, instance: &str, port: u16);

    /// Withdraw the current registration, if any.
    fn withdraw(&mut self);
}

/// Advertiser that only logs. Used on hosts without an mDNS responder.
#[derive(Debug, Default)]
pub struct LoggingAdvertiser {
    current: Option<String>,
}

impl LoggingAdvertiser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServiceAdvertiser for LoggingAdvertiser {
    fn advertise(&mut self, instance: &str, port: u16) {
        info!(
            hostname = %format!("{instance}.local"),
            service = MDNS_SERVICE,
            port,
            "Service advertised"
        );
        self.current = Some(instance.to_string());
    }

    fn withdraw(&mut self) {
        if let Some(instance) = self.current.take() {
            info!(hostname = %format!("{instance}.local"), "Service advertisement withdrawn");
        }
    }
}

/// Discovery call captured by [`RecordingAdvertiser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    Advertised { instance: String, port: u16 },
    Withdrawn,
}

/// Advertiser that records every call; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingAdvertiser {
    events: Arc<Mutex<Vec<DiscoveryEvent>>>,
}

impl RecordingAdvertiser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiscoveryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: DiscoveryEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ServiceAdvertiser for RecordingAdvertiser {
    fn advertise(&mut self, instance: &str, port: u16) {
        self.record(DiscoveryEvent::Advertised {
            instance: instance.to_string(),
            port,
        });
    }

    fn withdraw(&mut self) {
        self.record(DiscoveryEvent::Withdrawn);
    }
}
