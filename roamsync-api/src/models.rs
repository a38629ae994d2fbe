use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// Link-layer security of a scanned access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    Open,
    Encrypted,
}

/// How the current network catalog was last produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanType {
    None,
    Full,
    Rescan,
    FastReconnect,
}

/// One catalogued access point as seen by the admin interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkView {
    pub ssid: String,
    pub bssid: String,
    /// Signal strength in dBm
    pub rssi: i32,
    pub channel: u8,
    pub encryption: Encryption,
    /// Refreshed during the most recent scan cycle
    pub scanned: bool,
    /// Actually observed over the air in the most recent attempt
    pub detected: bool,
    /// A credential exists for this SSID
    pub known: bool,
    /// This is the currently associated access point
    pub connected: bool,
    /// Same SSID as the current association but a different access point
    pub same_ssid_as_connected: bool,
}

/// Read-only snapshot of the network catalog plus scan metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Seconds since the catalog was last updated from a scan, if ever
    pub scan_age_secs: Option<u64>,
    /// Completed full scans and sweeps since boot
    pub scan_count: u32,
    pub scan_type: ScanType,
    pub networks: Vec<NetworkView>,
}

/// Persisted last-good association used for the fast reconnect path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedNetwork {
    pub ssid: String,
    pub bssid: String,
    pub channel: u8,
}

/// Live station status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkReport {
    pub connected: bool,
    pub ssid: String,
    pub bssid: String,
    pub ip: Option<String>,
    /// Signal strength of the current association in dBm
    pub rssi: i32,
    pub mac: String,
    pub channel: u8,
    /// Seconds since association, when connected
    pub uptime_secs: Option<u64>,
    pub saved: Option<SavedNetwork>,
    /// Most recently visited discovery test channel
    pub test_channel: Option<u8>,
}

/// Every persisted tunable, as currently in effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsView {
    pub auto_full_scan_enabled: bool,
    pub auto_full_scan_interval_secs: f32,
    pub auto_rescan_enabled: bool,
    pub auto_rescan_interval_secs: f32,
    /// Restrict the automatic sweep to networks with a stored credential
    pub auto_rescan_known_only: bool,
    /// Append a rotating discovery channel after each sweep
    pub auto_rescan_test_channels: bool,
    /// Per-channel dwell budget for targeted scans (ms)
    pub scan_time_non_dfs_ms: u32,
    pub scan_time_dfs_ms: u32,
    pub status_refresh_interval_secs: f32,
    pub status_auto_refresh_enabled: bool,
    pub auto_reconnect_enabled: bool,
    pub auto_reconnect_interval_secs: f32,
    /// Failed reconnect attempts tolerated before a radio-stack reset
    pub auto_reconnect_reset_threshold: u32,
    pub auto_roam_enabled: bool,
    /// Minimum RSSI improvement (dBm) required to roam
    pub auto_roam_delta_dbm: f32,
    pub auto_roam_same_ssid_only: bool,
    /// Diagnostic verbosity, 0-5
    pub verbosity: u8,
}
