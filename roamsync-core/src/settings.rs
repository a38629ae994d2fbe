use alloc::string::{String, ToString};

use embassy_time::Duration;

use roamsync_api::{SettingsPatch, SettingsView};

use crate::error::{Error, Result};
use crate::storage::SettingsStore;

const KEY_AUTO_FULL_EN: &str = "auto_full_en";
const KEY_AUTO_FULL_INT: &str = "auto_full_int_sec";
const KEY_AUTO_RESCAN_EN: &str = "auto_rescan_en";
const KEY_AUTO_RESCAN_INT: &str = "auto_rescan_int_sec";
const KEY_AUTO_RESCAN_KNOWN_ONLY: &str = "auto_rescan_known_only";
const KEY_AUTO_RESCAN_TEST_CH: &str = "auto_rescan_test_ch";
const KEY_SCAN_DWELL: &str = "scan_dwell_ms";
const KEY_SCAN_DWELL_DFS: &str = "scan_dwell_dfs_ms";
const KEY_STATUS_INT: &str = "status_int_sec";
const KEY_STATUS_AUTO_EN: &str = "status_auto_en";
const KEY_RECONNECT_EN: &str = "reconnect_en";
const KEY_RECONNECT_INT: &str = "reconnect_int_sec";
const KEY_RECONNECT_THRESHOLD: &str = "reconnect_reset_threshold";
const KEY_ROAM_EN: &str = "roam_en";
const KEY_ROAM_DELTA: &str = "roam_delta_dbm";
const KEY_ROAM_SAME_SSID: &str = "roam_same_ssid";
const KEY_VERBOSITY: &str = "verbosity";

const KEY_SAVED_SSID: &str = "saved_ssid";
const KEY_SAVED_BSSID: &str = "saved_bssid";
const KEY_SAVED_CHANNEL: &str = "saved_channel";
const KEY_LAST_QUICK_OK: &str = "last_quick_ok";

const INTERVAL_MIN_SECS: f32 = 0.1;
const INTERVAL_MAX_SECS: f32 = 3600.0;
const ROAM_DELTA_MIN_DBM: f32 = 1.0;
const ROAM_DELTA_MAX_DBM: f32 = 50.0;
const DWELL_MIN_MS: u32 = 10;
const DWELL_MAX_MS: u32 = 2000;
const VERBOSITY_MAX: u8 = 5;

/// Every persisted tunable the engine consults. Loaded once at init and
/// mutated only through [`RoamSettings::apply_patch`] at tick boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct RoamSettings {
    pub auto_full_scan_enabled: bool,
    pub auto_full_scan_interval_secs: f32,
    pub auto_rescan_enabled: bool,
    pub auto_rescan_interval_secs: f32,
    pub auto_rescan_known_only: bool,
    pub auto_rescan_test_channels: bool,
    pub scan_time_non_dfs_ms: u32,
    pub scan_time_dfs_ms: u32,
    pub status_refresh_interval_secs: f32,
    pub status_auto_refresh_enabled: bool,
    pub auto_reconnect_enabled: bool,
    pub auto_reconnect_interval_secs: f32,
    pub auto_reconnect_reset_threshold: u32,
    pub auto_roam_enabled: bool,
    pub auto_roam_delta_dbm: f32,
    pub auto_roam_same_ssid_only: bool,
    pub verbosity: u8,
}

impl Default for RoamSettings {
    fn default() -> Self {
        Self {
            auto_full_scan_enabled: false,
            auto_full_scan_interval_secs: 10.0,
            auto_rescan_enabled: true,
            auto_rescan_interval_secs: 1.0,
            auto_rescan_known_only: true,
            auto_rescan_test_channels: true,
            scan_time_non_dfs_ms: 50,
            scan_time_dfs_ms: 200,
            status_refresh_interval_secs: 0.5,
            status_auto_refresh_enabled: true,
            auto_reconnect_enabled: true,
            auto_reconnect_interval_secs: 5.0,
            auto_reconnect_reset_threshold: 3,
            auto_roam_enabled: true,
            auto_roam_delta_dbm: 10.0,
            auto_roam_same_ssid_only: true,
            verbosity: 1,
        }
    }
}

fn valid_interval(value: f32, fallback: f32) -> f32 {
    if (INTERVAL_MIN_SECS..=INTERVAL_MAX_SECS).contains(&value) {
        value
    } else {
        fallback
    }
}

fn valid_delta(value: f32, fallback: f32) -> f32 {
    if (ROAM_DELTA_MIN_DBM..=ROAM_DELTA_MAX_DBM).contains(&value) {
        value
    } else {
        fallback
    }
}

fn valid_dwell(value: u32, fallback: u32) -> u32 {
    if (DWELL_MIN_MS..=DWELL_MAX_MS).contains(&value) {
        value
    } else {
        fallback
    }
}

pub(crate) fn secs_to_duration(secs: f32) -> Duration {
    Duration::from_millis((secs * 1000.0) as u64)
}

async fn load_value<S, T>(store: &mut S, key: &str, default: T) -> Result<T>
where
    S: SettingsStore,
    T: core::str::FromStr + ToString,
{
    // Write the default back on first boot so later boots see every key,
    // the way the original seeds its preference namespace.
    let existing = store.get(key).await.map_err(|_| Error::Storage)?;
    match existing.and_then(|raw| raw.parse::<T>().ok()) {
        Some(value) => Ok(value),
        None => {
            store
                .put(key, &default.to_string())
                .await
                .map_err(|_| Error::Storage)?;
            Ok(default)
        }
    }
}

async fn store_value<S, T>(store: &mut S, key: &str, value: T) -> Result<()>
where
    S: SettingsStore,
    T: ToString,
{
    store
        .put(key, &value.to_string())
        .await
        .map_err(|_| Error::Storage)
}

impl RoamSettings {
    /// Load all tunables, seeding absent keys with defaults and discarding
    /// out-of-range persisted values.
    pub async fn load<S: SettingsStore>(store: &mut S) -> Result<Self> {
        let d = Self::default();
        let mut s = Self {
            auto_full_scan_enabled: load_value(store, KEY_AUTO_FULL_EN, d.auto_full_scan_enabled)
                .await?,
            auto_full_scan_interval_secs: load_value(
                store,
                KEY_AUTO_FULL_INT,
                d.auto_full_scan_interval_secs,
            )
            .await?,
            auto_rescan_enabled: load_value(store, KEY_AUTO_RESCAN_EN, d.auto_rescan_enabled)
                .await?,
            auto_rescan_interval_secs: load_value(
                store,
                KEY_AUTO_RESCAN_INT,
                d.auto_rescan_interval_secs,
            )
            .await?,
            auto_rescan_known_only: load_value(
                store,
                KEY_AUTO_RESCAN_KNOWN_ONLY,
                d.auto_rescan_known_only,
            )
            .await?,
            auto_rescan_test_channels: load_value(
                store,
                KEY_AUTO_RESCAN_TEST_CH,
                d.auto_rescan_test_channels,
            )
            .await?,
            scan_time_non_dfs_ms: load_value(store, KEY_SCAN_DWELL, d.scan_time_non_dfs_ms).await?,
            scan_time_dfs_ms: load_value(store, KEY_SCAN_DWELL_DFS, d.scan_time_dfs_ms).await?,
            status_refresh_interval_secs: load_value(
                store,
                KEY_STATUS_INT,
                d.status_refresh_interval_secs,
            )
            .await?,
            status_auto_refresh_enabled: load_value(
                store,
                KEY_STATUS_AUTO_EN,
                d.status_auto_refresh_enabled,
            )
            .await?,
            auto_reconnect_enabled: load_value(store, KEY_RECONNECT_EN, d.auto_reconnect_enabled)
                .await?,
            auto_reconnect_interval_secs: load_value(
                store,
                KEY_RECONNECT_INT,
                d.auto_reconnect_interval_secs,
            )
            .await?,
            auto_reconnect_reset_threshold: load_value(
                store,
                KEY_RECONNECT_THRESHOLD,
                d.auto_reconnect_reset_threshold,
            )
            .await?,
            auto_roam_enabled: load_value(store, KEY_ROAM_EN, d.auto_roam_enabled).await?,
            auto_roam_delta_dbm: load_value(store, KEY_ROAM_DELTA, d.auto_roam_delta_dbm).await?,
            auto_roam_same_ssid_only: load_value(
                store,
                KEY_ROAM_SAME_SSID,
                d.auto_roam_same_ssid_only,
            )
            .await?,
            verbosity: load_value(store, KEY_VERBOSITY, d.verbosity).await?,
        };

        s.auto_full_scan_interval_secs =
            valid_interval(s.auto_full_scan_interval_secs, d.auto_full_scan_interval_secs);
        s.auto_rescan_interval_secs =
            valid_interval(s.auto_rescan_interval_secs, d.auto_rescan_interval_secs);
        s.status_refresh_interval_secs = valid_interval(
            s.status_refresh_interval_secs,
            d.status_refresh_interval_secs,
        );
        s.auto_reconnect_interval_secs = valid_interval(
            s.auto_reconnect_interval_secs,
            d.auto_reconnect_interval_secs,
        );
        s.auto_roam_delta_dbm = valid_delta(s.auto_roam_delta_dbm, d.auto_roam_delta_dbm);
        s.scan_time_non_dfs_ms = valid_dwell(s.scan_time_non_dfs_ms, d.scan_time_non_dfs_ms);
        s.scan_time_dfs_ms = valid_dwell(s.scan_time_dfs_ms, d.scan_time_dfs_ms);
        if s.verbosity > VERBOSITY_MAX {
            s.verbosity = d.verbosity;
        }
        Ok(s)
    }

    /// Write every tunable back to the store.
    pub async fn persist<S: SettingsStore>(&self, store: &mut S) -> Result<()> {
        store_value(store, KEY_AUTO_FULL_EN, self.auto_full_scan_enabled).await?;
        store_value(store, KEY_AUTO_FULL_INT, self.auto_full_scan_interval_secs).await?;
        store_value(store, KEY_AUTO_RESCAN_EN, self.auto_rescan_enabled).await?;
        store_value(store, KEY_AUTO_RESCAN_INT, self.auto_rescan_interval_secs).await?;
        store_value(store, KEY_AUTO_RESCAN_KNOWN_ONLY, self.auto_rescan_known_only).await?;
        store_value(store, KEY_AUTO_RESCAN_TEST_CH, self.auto_rescan_test_channels).await?;
        store_value(store, KEY_SCAN_DWELL, self.scan_time_non_dfs_ms).await?;
        store_value(store, KEY_SCAN_DWELL_DFS, self.scan_time_dfs_ms).await?;
        store_value(store, KEY_STATUS_INT, self.status_refresh_interval_secs).await?;
        store_value(store, KEY_STATUS_AUTO_EN, self.status_auto_refresh_enabled).await?;
        store_value(store, KEY_RECONNECT_EN, self.auto_reconnect_enabled).await?;
        store_value(store, KEY_RECONNECT_INT, self.auto_reconnect_interval_secs).await?;
        store_value(
            store,
            KEY_RECONNECT_THRESHOLD,
            self.auto_reconnect_reset_threshold,
        )
        .await?;
        store_value(store, KEY_ROAM_EN, self.auto_roam_enabled).await?;
        store_value(store, KEY_ROAM_DELTA, self.auto_roam_delta_dbm).await?;
        store_value(store, KEY_ROAM_SAME_SSID, self.auto_roam_same_ssid_only).await?;
        store_value(store, KEY_VERBOSITY, self.verbosity).await?;
        Ok(())
    }

    /// Merge a patch, dropping out-of-range fields. Returns true when any
    /// value actually changed.
    pub fn apply_patch(&mut self, patch: &SettingsPatch) -> bool {
        let before = self.clone();
        if let Some(v) = patch.auto_full_scan_enabled {
            self.auto_full_scan_enabled = v;
        }
        if let Some(v) = patch.auto_full_scan_interval_secs {
            self.auto_full_scan_interval_secs = valid_interval(v, self.auto_full_scan_interval_secs);
        }
        if let Some(v) = patch.auto_rescan_enabled {
            self.auto_rescan_enabled = v;
        }
        if let Some(v) = patch.auto_rescan_interval_secs {
            self.auto_rescan_interval_secs = valid_interval(v, self.auto_rescan_interval_secs);
        }
        if let Some(v) = patch.auto_rescan_known_only {
            self.auto_rescan_known_only = v;
        }
        if let Some(v) = patch.auto_rescan_test_channels {
            self.auto_rescan_test_channels = v;
        }
        if let Some(v) = patch.scan_time_non_dfs_ms {
            self.scan_time_non_dfs_ms = valid_dwell(v, self.scan_time_non_dfs_ms);
        }
        if let Some(v) = patch.scan_time_dfs_ms {
            self.scan_time_dfs_ms = valid_dwell(v, self.scan_time_dfs_ms);
        }
        if let Some(v) = patch.status_refresh_interval_secs {
            self.status_refresh_interval_secs = valid_interval(v, self.status_refresh_interval_secs);
        }
        if let Some(v) = patch.status_auto_refresh_enabled {
            self.status_auto_refresh_enabled = v;
        }
        if let Some(v) = patch.auto_reconnect_enabled {
            self.auto_reconnect_enabled = v;
        }
        if let Some(v) = patch.auto_reconnect_interval_secs {
            self.auto_reconnect_interval_secs = valid_interval(v, self.auto_reconnect_interval_secs);
        }
        if let Some(v) = patch.auto_reconnect_reset_threshold {
            self.auto_reconnect_reset_threshold = v;
        }
        if let Some(v) = patch.auto_roam_enabled {
            self.auto_roam_enabled = v;
        }
        if let Some(v) = patch.auto_roam_delta_dbm {
            self.auto_roam_delta_dbm = valid_delta(v, self.auto_roam_delta_dbm);
        }
        if let Some(v) = patch.auto_roam_same_ssid_only {
            self.auto_roam_same_ssid_only = v;
        }
        if let Some(v) = patch.verbosity {
            if v <= VERBOSITY_MAX {
                self.verbosity = v;
            }
        }
        *self != before
    }

    pub fn view(&self) -> SettingsView {
        SettingsView {
            auto_full_scan_enabled: self.auto_full_scan_enabled,
            auto_full_scan_interval_secs: self.auto_full_scan_interval_secs,
            auto_rescan_enabled: self.auto_rescan_enabled,
            auto_rescan_interval_secs: self.auto_rescan_interval_secs,
            auto_rescan_known_only: self.auto_rescan_known_only,
            auto_rescan_test_channels: self.auto_rescan_test_channels,
            scan_time_non_dfs_ms: self.scan_time_non_dfs_ms,
            scan_time_dfs_ms: self.scan_time_dfs_ms,
            status_refresh_interval_secs: self.status_refresh_interval_secs,
            status_auto_refresh_enabled: self.status_auto_refresh_enabled,
            auto_reconnect_enabled: self.auto_reconnect_enabled,
            auto_reconnect_interval_secs: self.auto_reconnect_interval_secs,
            auto_reconnect_reset_threshold: self.auto_reconnect_reset_threshold,
            auto_roam_enabled: self.auto_roam_enabled,
            auto_roam_delta_dbm: self.auto_roam_delta_dbm,
            auto_roam_same_ssid_only: self.auto_roam_same_ssid_only,
            verbosity: self.verbosity,
        }
    }

    pub fn auto_full_scan_interval(&self) -> Duration {
        secs_to_duration(self.auto_full_scan_interval_secs)
    }

    pub fn auto_rescan_interval(&self) -> Duration {
        secs_to_duration(self.auto_rescan_interval_secs)
    }

    pub fn auto_reconnect_interval(&self) -> Duration {
        secs_to_duration(self.auto_reconnect_interval_secs)
    }

    pub fn dwell_for_channel(&self, channel: u8) -> u32 {
        if crate::radio::is_dfs_channel(channel) {
            self.scan_time_dfs_ms
        } else {
            self.scan_time_non_dfs_ms
        }
    }
}

/// Persisted last-good association plus the fast-reconnect eligibility
/// flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedLink {
    pub ssid: String,
    pub bssid: String,
    pub channel: u8,
    pub last_quick_ok: bool,
}

impl SavedLink {
    pub fn is_complete(&self) -> bool {
        !self.ssid.is_empty() && !self.bssid.is_empty()
    }

    pub async fn load<S: SettingsStore>(store: &mut S) -> Result<Self> {
        let ssid = store
            .get(KEY_SAVED_SSID)
            .await
            .map_err(|_| Error::Storage)?
            .unwrap_or_default();
        let bssid = store
            .get(KEY_SAVED_BSSID)
            .await
            .map_err(|_| Error::Storage)?
            .unwrap_or_default();
        let channel = store
            .get(KEY_SAVED_CHANNEL)
            .await
            .map_err(|_| Error::Storage)?
            .and_then(|raw| raw.parse::<u8>().ok())
            .unwrap_or(0);
        let last_quick_ok = store
            .get(KEY_LAST_QUICK_OK)
            .await
            .map_err(|_| Error::Storage)?
            .and_then(|raw| raw.parse::<bool>().ok())
            .unwrap_or(false);
        Ok(Self {
            ssid,
            bssid,
            channel,
            last_quick_ok,
        })
    }

    pub async fn persist<S: SettingsStore>(&self, store: &mut S) -> Result<()> {
        store.put(KEY_SAVED_SSID, &self.ssid).await.map_err(|_| Error::Storage)?;
        store
            .put(KEY_SAVED_BSSID, &self.bssid)
            .await
            .map_err(|_| Error::Storage)?;
        store_value(store, KEY_SAVED_CHANNEL, self.channel).await?;
        self.persist_quick_ok(store).await
    }

    pub async fn persist_quick_ok<S: SettingsStore>(&self, store: &mut S) -> Result<()> {
        store_value(store, KEY_LAST_QUICK_OK, self.last_quick_ok).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn first_boot_seeds_defaults_into_the_store() {
        let mut store = MemoryStore::new();
        let settings = RoamSettings::load(&mut store).await.unwrap();
        assert_eq!(settings, RoamSettings::default());
        assert!(store.contains(KEY_AUTO_RESCAN_EN).await.unwrap());
        assert!(store.contains(KEY_ROAM_DELTA).await.unwrap());
        assert_eq!(
            store.get(KEY_AUTO_FULL_EN).await.unwrap().as_deref(),
            Some("false")
        );
    }

    #[tokio::test]
    async fn out_of_range_persisted_values_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.put(KEY_RECONNECT_INT, "90000").await.unwrap();
        store.put(KEY_ROAM_DELTA, "0.2").await.unwrap();
        store.put(KEY_VERBOSITY, "9").await.unwrap();
        let settings = RoamSettings::load(&mut store).await.unwrap();
        assert_eq!(settings.auto_reconnect_interval_secs, 5.0);
        assert_eq!(settings.auto_roam_delta_dbm, 10.0);
        assert_eq!(settings.verbosity, 1);
    }

    #[tokio::test]
    async fn settings_round_trip_through_the_store() {
        let mut store = MemoryStore::new();
        let mut settings = RoamSettings::default();
        settings.auto_full_scan_enabled = true;
        settings.auto_roam_delta_dbm = 12.5;
        settings.auto_reconnect_reset_threshold = 7;
        settings.persist(&mut store).await.unwrap();
        let loaded = RoamSettings::load(&mut store).await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn patch_ignores_invalid_fields_and_reports_changes() {
        let mut settings = RoamSettings::default();
        let mut patch = SettingsPatch::default();
        patch.auto_roam_delta_dbm = Some(99.0);
        patch.verbosity = Some(42);
        assert!(!settings.apply_patch(&patch));
        assert_eq!(settings, RoamSettings::default());

        patch.auto_roam_delta_dbm = Some(15.0);
        patch.auto_rescan_known_only = Some(false);
        assert!(settings.apply_patch(&patch));
        assert_eq!(settings.auto_roam_delta_dbm, 15.0);
        assert!(!settings.auto_rescan_known_only);
    }

    #[tokio::test]
    async fn saved_link_round_trip() {
        let mut store = MemoryStore::new();
        let link = SavedLink {
            ssid: "lab".into(),
            bssid: "AA:BB:CC:DD:EE:FF".into(),
            channel: 44,
            last_quick_ok: true,
        };
        link.persist(&mut store).await.unwrap();
        let loaded = SavedLink::load(&mut store).await.unwrap();
        assert_eq!(loaded, link);
        assert!(loaded.is_complete());

        let empty = SavedLink::load(&mut MemoryStore::new()).await.unwrap();
        assert!(!empty.is_complete());
        assert!(!empty.last_quick_ok);
    }
}
