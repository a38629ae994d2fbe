use alloc::string::String;

use core::net::Ipv4Addr;

use roamsync_api::Encryption;

use crate::error::{Error, Result};

/// First and last 5 GHz channels subject to radar detection; scans there
/// need a longer dwell before the AP may answer a probe.
const DFS_FIRST: u8 = 52;
const DFS_LAST: u8 = 144;

/// State of the single in-flight asynchronous scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Running,
    Failed,
    /// Completed with this many result records
    Done(usize),
}

/// One access point as reported by the driver's scan result enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub ssid: String,
    pub bssid: String,
    pub rssi: i32,
    pub channel: u8,
    pub encryption: Encryption,
}

/// Current station association as reported by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkStatus {
    pub connected: bool,
    pub ssid: String,
    pub bssid: String,
    pub rssi: i32,
    pub channel: u8,
    pub ip: Option<Ipv4Addr>,
}

impl LinkStatus {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ssid: String::new(),
            bssid: String::new(),
            rssi: 0,
            channel: 0,
            ip: None,
        }
    }
}

/// Asynchronous driver notifications, drained once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioEvent {
    /// The station lost its association
    Disconnected,
    /// The station associated and obtained an address
    GotIp,
}

/// Driver seam for the station radio. One shared, non-reentrant resource:
/// the engine guarantees at most one scan is in flight and never overlaps a
/// scan with an association attempt.
#[allow(async_fn_in_trait)]
pub trait RadioController {
    type Error;

    /// Begin an asynchronous scan across all channels.
    async fn start_full_scan(&mut self) -> core::result::Result<(), Self::Error>;

    /// Begin an asynchronous scan restricted to one channel and optionally
    /// one BSSID, with a per-channel dwell budget in milliseconds.
    async fn start_channel_scan(
        &mut self,
        channel: u8,
        bssid: Option<[u8; 6]>,
        dwell_ms: u32,
    ) -> core::result::Result<(), Self::Error>;

    /// Poll the in-flight scan without blocking.
    fn scan_status(&mut self) -> ScanStatus;

    /// Enumerate a completed scan's result records.
    fn scan_result(&self, index: usize) -> Option<ScanRecord>;

    /// Begin association, most specific addressing first: BSSID + channel,
    /// channel only, or SSID only. `None` password attempts an open network.
    async fn connect(
        &mut self,
        ssid: &str,
        password: Option<&str>,
        channel: Option<u8>,
        bssid: Option<[u8; 6]>,
    ) -> core::result::Result<(), Self::Error>;

    /// Drop the current association, keeping station mode up.
    async fn disconnect(&mut self) -> core::result::Result<(), Self::Error>;

    /// Power the radio down.
    async fn radio_off(&mut self) -> core::result::Result<(), Self::Error>;

    /// Bring the radio back up in station mode with sleep disabled and the
    /// preferred band reapplied.
    async fn radio_station(&mut self) -> core::result::Result<(), Self::Error>;

    fn is_connected(&self) -> bool;

    fn link_status(&self) -> LinkStatus;

    fn mac_address(&self) -> [u8; 6];

    /// Drain the next pending driver notification, if any.
    fn poll_event(&mut self) -> Option<RadioEvent>;
}

/// Parse an `aa:bb:cc:dd:ee:ff` address. Case-insensitive.
pub fn parse_bssid(s: &str) -> Result<[u8; 6]> {
    let mut out = [0u8; 6];
    let mut parts = s.split(':');
    for slot in out.iter_mut() {
        let part = parts.next().ok_or(Error::BssidParse)?;
        if part.is_empty() || part.len() > 2 {
            return Err(Error::BssidParse);
        }
        *slot = u8::from_str_radix(part, 16).map_err(|_| Error::BssidParse)?;
    }
    if parts.next().is_some() {
        return Err(Error::BssidParse);
    }
    Ok(out)
}

pub fn format_bssid(bssid: &[u8; 6]) -> String {
    alloc::format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        bssid[0],
        bssid[1],
        bssid[2],
        bssid[3],
        bssid[4],
        bssid[5]
    )
}

/// BSSID identity is case-insensitive.
pub fn bssid_eq(a: &str, b: &str) -> bool {
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}

pub fn is_dfs_channel(channel: u8) -> bool {
    (DFS_FIRST..=DFS_LAST).contains(&channel)
}
