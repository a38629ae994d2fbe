use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub auto_full_scan_enabled: Option<bool>,
    pub auto_full_scan_interval_secs: Option<f32>,
    pub auto_rescan_enabled: Option<bool>,
    pub auto_rescan_interval_secs: Option<f32>,
    pub auto_rescan_known_only: Option<bool>,
    pub auto_rescan_test_channels: Option<bool>,
    pub scan_time_non_dfs_ms: Option<u32>,
    pub scan_time_dfs_ms: Option<u32>,
    pub status_refresh_interval_secs: Option<f32>,
    pub status_auto_refresh_enabled: Option<bool>,
    pub auto_reconnect_enabled: Option<bool>,
    pub auto_reconnect_interval_secs: Option<f32>,
    pub auto_reconnect_reset_threshold: Option<u32>,
    pub auto_roam_enabled: Option<bool>,
    pub auto_roam_delta_dbm: Option<f32>,
    pub auto_roam_same_ssid_only: Option<bool>,
    pub verbosity: Option<u8>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// True when the patch touches anything the scan scheduler or an active
    /// sweep depends on.
    pub fn touches_scanning(&self) -> bool {
        self.auto_full_scan_enabled.is_some()
            || self.auto_full_scan_interval_secs.is_some()
            || self.auto_rescan_enabled.is_some()
            || self.auto_rescan_interval_secs.is_some()
            || self.auto_rescan_known_only.is_some()
            || self.auto_rescan_test_channels.is_some()
            || self.scan_time_non_dfs_ms.is_some()
            || self.scan_time_dfs_ms.is_some()
    }
}

/// Intent queued by the admin collaborator, consumed by the engine on its
/// next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Start a full scan across all channels
    FullScan,
    /// Start a sweep refreshing already-catalogued networks
    RescanSweep,
    /// Connect to the strongest detected known network
    ConnectStrongest,
    /// Connect to an explicit target; empty bssid / zero channel mean
    /// "unspecified"
    ConnectTarget {
        ssid: String,
        bssid: String,
        channel: u8,
    },
    /// Drop the current association, keeping credentials
    Disconnect,
    /// Apply a settings patch atomically at the start of the next tick
    ApplySettings(SettingsPatch),
    /// Reset every tunable to its default and persist
    RestoreDefaults,
}
