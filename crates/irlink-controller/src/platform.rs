//! Network link and system information seam.

use std::net::IpAddr;

use irlink_core::MacAddress;

/// State of the network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub connected: bool,
    pub ip_address: Option<IpAddr>,
}

/// What the controller needs to know about the board it runs on.
pub trait Platform: Send + Sync {
    fn mac_address(&self) -> MacAddress;

    fn link_status(&self) -> LinkStatus;

    /// Free memory in bytes.
    fn free_heap(&self) -> u64;
}

/// [`Platform`] for a host process.
///
/// The MAC and IP come from configuration; the link is reported up while
/// the process serves requests.
#[derive(Debug, Clone)]
pub struct HostPlatform {
    mac: MacAddress,
    ip_address: Option<IpAddr>,
}

impl HostPlatform {
    pub fn new(mac: MacAddress, ip_address: Option<IpAddr>) -> Self {
        Self { mac, ip_address }
    }
}

impl Platform for HostPlatform {
    fn mac_address(&self) -> MacAddress {
        self.mac
    }

    fn link_status(&self) -> LinkStatus {
        LinkStatus {
            connected: true,
            ip_address: self.ip_address,
        }
    }

    fn free_heap(&self) -> u64 {
        available_memory().unwrap_or(0)
    }
}

/// `MemAvailable` from `/proc/meminfo`, in bytes.
fn available_memory() -> Option<u64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("MemAvailable:"))
        .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
        .map(|kib| kib * 1024)
}
