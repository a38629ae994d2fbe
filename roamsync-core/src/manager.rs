use alloc::collections::VecDeque;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use embassy_time::{Duration, Instant, Timer};

use roamsync_api::{
    CatalogSnapshot, Command, Encryption, LinkReport, NetworkView, SavedNetwork, ScanType,
    SettingsPatch, SettingsView,
};

use crate::catalog::{NetworkCatalog, NetworkCredential, ScannedNetwork};
use crate::error::{Error, Result};
use crate::radio::{RadioController, RadioEvent, ScanRecord, ScanStatus, bssid_eq, format_bssid, parse_bssid};
use crate::scan::{FullScanKind, RadioActivity, SweepState, SweepTarget, TEST_CHANNELS};
use crate::settings::{RoamSettings, SavedLink, secs_to_duration};
use crate::storage::SettingsStore;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CONNECT_POLL: Duration = Duration::from_millis(100);
const DEFAULT_RESET_SETTLE: Duration = Duration::from_secs(1);
/// Quiet period after an association attempt before the lower-priority
/// handlers run again, so a fresh link can settle.
const POST_CONNECT_SETTLE: Duration = Duration::from_secs(1);

enum SettingsIntent {
    Patch(SettingsPatch),
    Restore,
}

/// Connection-resilience engine: owns the radio seam, the settings store
/// and the network catalog, and drives everything from [`tick`].
///
/// One radio action at most is started per tick; handlers run in fixed
/// priority order and the first one that acts wins the tick.
///
/// [`tick`]: RoamingManager::tick
pub struct RoamingManager<S, R>
where
    S: SettingsStore,
    R: RadioController,
{
    storage: S,
    radio: R,
    catalog: NetworkCatalog,
    settings: RoamSettings,
    saved: SavedLink,
    persistence_ok: bool,

    activity: RadioActivity,
    scan_in_progress: bool,
    test_channel_cursor: Option<usize>,

    scan_count: u32,
    last_scan_type: ScanType,
    last_scan_time: Option<Instant>,
    last_full_scan_time: Option<Instant>,
    last_rescan_time: Option<Instant>,
    last_status_time: Option<Instant>,

    connected_since: Option<Instant>,
    last_connect_attempt: Option<Instant>,
    last_reconnect_attempt: Option<Instant>,
    reconnect_attempts: u32,
    station_disconnected: bool,

    manual_full_requested: bool,
    manual_rescan_requested: bool,
    connect_requested: bool,
    connect_target: Option<(String, String, u8)>,
    disconnect_requested: bool,
    pending_settings: VecDeque<SettingsIntent>,

    connect_timeout: Duration,
    connect_poll: Duration,
    reset_settle: Duration,
}

impl<S, R> RoamingManager<S, R>
where
    S: SettingsStore,
    R: RadioController,
{
    pub fn new(storage: S, radio: R, credentials: Vec<NetworkCredential>) -> Self {
        Self {
            storage,
            radio,
            catalog: NetworkCatalog::new(credentials),
            settings: RoamSettings::default(),
            saved: SavedLink::default(),
            persistence_ok: false,
            activity: RadioActivity::Idle,
            scan_in_progress: false,
            test_channel_cursor: None,
            scan_count: 0,
            last_scan_type: ScanType::None,
            last_scan_time: None,
            last_full_scan_time: None,
            last_rescan_time: None,
            last_status_time: None,
            connected_since: None,
            last_connect_attempt: None,
            last_reconnect_attempt: None,
            reconnect_attempts: 0,
            station_disconnected: false,
            manual_full_requested: false,
            manual_rescan_requested: false,
            connect_requested: false,
            connect_target: None,
            disconnect_requested: false,
            pending_settings: VecDeque::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            connect_poll: DEFAULT_CONNECT_POLL,
            reset_settle: DEFAULT_RESET_SETTLE,
        }
    }

    /// How long a blocking association attempt may take before it is
    /// abandoned.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_connect_poll(mut self, poll: Duration) -> Self {
        self.connect_poll = poll;
        self
    }

    /// How long the radio stays powered down during a station reset.
    pub fn with_reset_settle(mut self, settle: Duration) -> Self {
        self.reset_settle = settle;
        self
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn is_connected(&self) -> bool {
        self.radio.is_connected()
    }

    pub fn settings_view(&self) -> SettingsView {
        self.settings.view()
    }

    /// Load persisted state and establish the first association: a direct
    /// reconnect to the last-good network when eligible, otherwise an
    /// asynchronous full scan that connects once drained.
    pub async fn init(&mut self) -> Result<()> {
        match RoamSettings::load(&mut self.storage).await {
            Ok(settings) => {
                self.settings = settings;
                self.persistence_ok = true;
            }
            Err(_) => {
                log::warn!("{}; running on defaults for this boot", Error::PersistenceUnavailable);
                self.settings = RoamSettings::default();
                self.persistence_ok = false;
            }
        }
        if self.persistence_ok {
            self.saved = SavedLink::load(&mut self.storage).await.unwrap_or_default();
            // Re-armed only by a successful association this boot, so a
            // crash loop cannot keep retrying a dead fast path.
            let disarmed = SavedLink {
                last_quick_ok: false,
                ..self.saved.clone()
            };
            if let Err(err) = disarmed.persist_quick_ok(&mut self.storage).await {
                log::warn!("Could not disarm fast reconnect: {err}");
            }
        }

        log::info!("Station MAC {}", format_bssid(&self.radio.mac_address()));
        log::info!("{} credentials configured", self.catalog.credential_count());

        if self.try_fast_reconnect().await {
            self.seed_catalog_from_link();
            self.last_full_scan_time = Some(Instant::now());
        } else if let Err(err) = self.begin_full_scan(FullScanKind::Initial).await {
            log::warn!("Initial scan did not start: {err}");
        }
        Ok(())
    }

    /// Queue an admin request. Nothing happens until the next [`tick`];
    /// connection requests are also deferred past any in-flight scan.
    ///
    /// [`tick`]: RoamingManager::tick
    pub fn submit(&mut self, command: Command) {
        match command {
            Command::FullScan => self.manual_full_requested = true,
            Command::RescanSweep => self.manual_rescan_requested = true,
            Command::ConnectStrongest => self.connect_requested = true,
            Command::ConnectTarget {
                ssid,
                bssid,
                channel,
            } => self.connect_target = Some((ssid, bssid, channel)),
            Command::Disconnect => self.disconnect_requested = true,
            Command::ApplySettings(patch) => {
                if !patch.is_empty() {
                    self.pending_settings.push_back(SettingsIntent::Patch(patch));
                }
            }
            Command::RestoreDefaults => self.pending_settings.push_back(SettingsIntent::Restore),
        }
    }

    /// One pass of the engine. Drains driver events, applies queued
    /// settings, then runs the handlers in priority order: roaming,
    /// disconnect watchdog, queued connection requests, auto-reconnect,
    /// scan scheduling, scan completion.
    pub async fn tick(&mut self) -> Result<()> {
        self.drain_radio_events().await;
        self.apply_pending_settings().await;
        self.maybe_log_status();

        if self.radio.is_connected() {
            self.reconnect_attempts = 0;
            self.last_reconnect_attempt = None;
        }

        self.handle_auto_roam().await;

        if self.radio.is_connected() {
            if let Some(attempt) = self.last_connect_attempt {
                if attempt.elapsed() < POST_CONNECT_SETTLE {
                    return Ok(());
                }
            }
        }

        if self.handle_station_disconnect().await {
            return Ok(());
        }
        if self.handle_connection_requests().await {
            return Ok(());
        }
        if self.handle_auto_reconnect().await {
            return Ok(());
        }
        if self.handle_automatic_scanning().await {
            return Ok(());
        }
        self.handle_scan_completion().await;
        Ok(())
    }

    async fn drain_radio_events(&mut self) {
        while let Some(event) = self.radio.poll_event() {
            match event {
                RadioEvent::Disconnected => {
                    log::debug!("Driver reported station disconnect");
                    self.station_disconnected = true;
                }
                RadioEvent::GotIp => {
                    log::info!("Station associated and got an address");
                    self.connected_since = Some(Instant::now());
                    self.persist_connected_network().await;
                }
            }
        }
    }

    async fn apply_pending_settings(&mut self) {
        while let Some(intent) = self.pending_settings.pop_front() {
            let (changed, cancels_sweep, resets_reconnect) = match intent {
                SettingsIntent::Patch(patch) => {
                    let cancels = patch.touches_scanning();
                    let resets = patch.auto_reconnect_enabled.is_some()
                        || patch.auto_reconnect_interval_secs.is_some()
                        || patch.auto_reconnect_reset_threshold.is_some();
                    (self.settings.apply_patch(&patch), cancels, resets)
                }
                SettingsIntent::Restore => {
                    log::info!("Restoring default settings");
                    self.settings = RoamSettings::default();
                    (true, true, true)
                }
            };
            if cancels_sweep && matches!(self.activity, RadioActivity::Sweep(_)) {
                // The in-flight targeted scan still drains; its results
                // arrive with no active purpose and are dropped.
                log::debug!("Settings change cancelled the active sweep");
                self.activity = RadioActivity::Idle;
            }
            if resets_reconnect {
                self.reconnect_attempts = 0;
                self.last_reconnect_attempt = None;
            }
            if changed && self.persistence_ok {
                if let Err(err) = self.settings.persist(&mut self.storage).await {
                    log::warn!("Failed to persist settings: {err}");
                }
            }
        }
    }

    fn maybe_log_status(&mut self) {
        if !self.settings.status_auto_refresh_enabled || self.settings.verbosity == 0 {
            return;
        }
        let due = match self.last_status_time {
            None => true,
            Some(last) => {
                last.elapsed() >= secs_to_duration(self.settings.status_refresh_interval_secs)
            }
        };
        if !due {
            return;
        }
        self.last_status_time = Some(Instant::now());
        let link = self.radio.link_status();
        if link.connected {
            log::debug!(
                "Status: '{}' {} dBm channel {} ({})",
                link.ssid,
                link.rssi,
                link.channel,
                self.activity.label()
            );
        } else {
            log::debug!("Status: disconnected ({})", self.activity.label());
        }
    }

    /// Move to a catalogued BSSID whose last observed signal beats the
    /// current link by at least the configured delta.
    async fn handle_auto_roam(&mut self) {
        if !self.radio.is_connected() || !self.settings.auto_roam_enabled || self.scan_in_progress {
            return;
        }
        if let Some(attempt) = self.last_connect_attempt {
            if attempt.elapsed() < self.settings.auto_reconnect_interval() {
                return;
            }
        }
        let link = self.radio.link_status();
        let delta = self.settings.auto_roam_delta_dbm as i32;

        let mut best: Option<(String, String, u8, i32)> = None;
        for entry in self.catalog.entries() {
            if !entry.detected || !entry.scanned {
                continue;
            }
            if bssid_eq(&entry.bssid, &link.bssid) {
                continue;
            }
            if self.settings.auto_roam_same_ssid_only {
                if entry.ssid != link.ssid {
                    continue;
                }
            } else if !self.catalog.is_known(&entry.ssid) {
                continue;
            }
            if entry.rssi < link.rssi + delta {
                continue;
            }
            match &best {
                Some((_, _, _, rssi)) if entry.rssi <= *rssi => {}
                _ => {
                    best = Some((
                        entry.ssid.clone(),
                        entry.bssid.clone(),
                        entry.channel,
                        entry.rssi,
                    ))
                }
            }
        }

        if let Some((ssid, bssid, channel, rssi)) = best {
            log::info!(
                "Roaming to '{ssid}' at {bssid} ({rssi} dBm, current {} dBm)",
                link.rssi
            );
            if let Err(err) = self.connect_with(&ssid, &bssid, channel, false).await {
                log::warn!("Roam attempt failed: {err}");
            }
        }
    }

    /// A sticky disconnect notification while the station is down means the
    /// driver gave up; recover with a full station reset.
    async fn handle_station_disconnect(&mut self) -> bool {
        if self.radio.is_connected() || !self.station_disconnected {
            return false;
        }
        log::warn!("Station lost its association; resetting the radio");
        self.station_disconnected = false;
        self.reset_radio().await;
        true
    }

    async fn handle_connection_requests(&mut self) -> bool {
        if self.scan_in_progress {
            return false;
        }
        if self.disconnect_requested {
            self.disconnect_requested = false;
            log::info!("Disconnect requested; dropping the association");
            if self.radio.disconnect().await.is_err() {
                log::warn!("Disconnect failed");
            }
            // Auto-reconnect waits a full interval before trying again.
            self.last_reconnect_attempt = Some(Instant::now());
            self.reconnect_attempts = 0;
            return true;
        }
        if let Some((ssid, bssid, channel)) = self.connect_target.take() {
            if ssid.is_empty() {
                log::debug!("Ignoring targeted connection request with empty SSID");
            } else {
                log::info!("Connecting to requested network '{ssid}'");
                if let Err(err) = self.connect_with(&ssid, &bssid, channel, false).await {
                    log::warn!("Targeted connect failed: {err}");
                }
            }
            return true;
        }
        if self.connect_requested {
            self.connect_requested = false;
            if let Err(err) = self.connect_to_strongest().await {
                log::info!("Connect-strongest request: {err}");
            }
            self.last_connect_attempt = Some(Instant::now());
            return true;
        }
        false
    }

    /// Periodic reconnect while down. Every `threshold` failed attempts the
    /// escalation resets the whole station stack instead of retrying.
    async fn handle_auto_reconnect(&mut self) -> bool {
        if self.radio.is_connected()
            || !self.settings.auto_reconnect_enabled
            || self.scan_in_progress
        {
            return false;
        }
        if let Some(last) = self.last_reconnect_attempt {
            if last.elapsed() < self.settings.auto_reconnect_interval() {
                return false;
            }
        }

        self.reconnect_attempts += 1;
        log::debug!(
            "Auto-reconnect attempt {} of {}",
            self.reconnect_attempts,
            self.settings.auto_reconnect_reset_threshold
        );
        if self.reconnect_attempts > self.settings.auto_reconnect_reset_threshold {
            self.reconnect_attempts = 0;
            self.reset_radio().await;
        } else if let Err(err) = self.connect_to_strongest().await {
            log::debug!("Auto-reconnect: {err}");
        }

        let now = Instant::now();
        self.last_connect_attempt = Some(now);
        self.last_reconnect_attempt = Some(now);
        true
    }

    async fn handle_automatic_scanning(&mut self) -> bool {
        if self.scan_in_progress {
            return false;
        }

        if self.manual_full_requested {
            self.manual_full_requested = false;
            log::info!("Manual full scan requested");
            return self.begin_full_scan(FullScanKind::Manual).await.is_ok();
        }

        if self.manual_rescan_requested {
            self.manual_rescan_requested = false;
            if self.catalog.is_empty() {
                log::debug!("Nothing catalogued yet; cannot sweep");
                return false;
            }
            log::info!("Manual sweep requested");
            self.activity = RadioActivity::Idle;
            return self.advance_sweep(false, false).await;
        }

        if self.settings.auto_full_scan_enabled {
            let due = match self.last_full_scan_time {
                None => true,
                Some(last) => last.elapsed() >= self.settings.auto_full_scan_interval(),
            };
            if due {
                self.last_full_scan_time = Some(Instant::now());
                return self.begin_full_scan(FullScanKind::Auto).await.is_ok();
            }
        }

        if self.settings.auto_rescan_enabled {
            let due = match self.last_rescan_time {
                None => true,
                Some(last) => last.elapsed() >= self.settings.auto_rescan_interval(),
            };
            if due {
                self.last_rescan_time = Some(Instant::now());
                if self.catalog.is_empty() {
                    log::trace!("Sweep due but nothing catalogued yet");
                    return false;
                }
                return self
                    .advance_sweep(self.settings.auto_rescan_known_only, true)
                    .await;
            }
        }

        false
    }

    async fn begin_full_scan(&mut self, kind: FullScanKind) -> Result<()> {
        if self.scan_in_progress {
            log::debug!("Scan already in progress; not starting another");
            return Err(Error::ScanInProgress);
        }
        self.scan_in_progress = true;
        self.activity = RadioActivity::FullScan(kind);
        if self.radio.start_full_scan().await.is_err() {
            self.scan_in_progress = false;
            self.activity = RadioActivity::Idle;
            log::warn!("Full scan failed to start");
            return Err(Error::ScanFailed);
        }
        log::debug!("Started {}", self.activity.label());
        Ok(())
    }

    /// Step the sweep until a targeted scan is actually launched or the
    /// sweep finishes. Ineligible and corrupt entries are skipped inline,
    /// so any number of skips still costs one call.
    async fn advance_sweep(&mut self, known_only: bool, auto: bool) -> bool {
        if self.scan_in_progress {
            return false;
        }

        let mut sweep = match core::mem::replace(&mut self.activity, RadioActivity::Idle) {
            RadioActivity::Sweep(sweep) => sweep,
            _ => {
                if known_only {
                    for index in 0..self.catalog.len() {
                        let known = self
                            .catalog
                            .entry(index)
                            .map(|e| self.catalog.is_known(&e.ssid))
                            .unwrap_or(false);
                        if !known {
                            if let Some(entry) = self.catalog.entry_mut(index) {
                                entry.scanned = false;
                            }
                        }
                    }
                }
                SweepState::new(known_only, auto)
            }
        };

        loop {
            while sweep.cursor < self.catalog.len() {
                if !sweep.known_only {
                    break;
                }
                let known = self
                    .catalog
                    .entry(sweep.cursor)
                    .map(|e| self.catalog.is_known(&e.ssid))
                    .unwrap_or(false);
                if known {
                    break;
                }
                if let Some(entry) = self.catalog.entry_mut(sweep.cursor) {
                    entry.scanned = false;
                }
                sweep.cursor += 1;
            }

            if sweep.cursor >= self.catalog.len() {
                let extend = self.settings.auto_rescan_test_channels
                    && !sweep.ran_test_channel
                    && (sweep.did_scan || sweep.auto);
                if extend {
                    let next = self
                        .test_channel_cursor
                        .map_or(0, |index| (index + 1) % TEST_CHANNELS.len());
                    self.test_channel_cursor = Some(next);
                    let channel = TEST_CHANNELS[next];
                    log::debug!("Sweep visiting discovery channel {channel}");
                    sweep.ran_test_channel = true;
                    sweep.target = SweepTarget::TestChannel { channel };
                    let dwell = self.settings.dwell_for_channel(channel);
                    self.scan_in_progress = true;
                    if self
                        .radio
                        .start_channel_scan(channel, None, dwell)
                        .await
                        .is_err()
                    {
                        log::warn!("Discovery scan failed to start");
                        self.scan_in_progress = false;
                        return false;
                    }
                    self.activity = RadioActivity::Sweep(sweep);
                    return true;
                }

                if sweep.did_scan {
                    self.scan_count = self.scan_count.wrapping_add(1);
                    log::debug!("Sweep complete, {} refresh cycles", self.scan_count);
                }
                let current = self.radio.link_status().ssid;
                self.catalog.sort(&current);
                return false;
            }

            let (bssid_str, channel) = match self.catalog.entry(sweep.cursor) {
                Some(entry) => (entry.bssid.clone(), entry.channel),
                None => return false,
            };
            let bssid = match parse_bssid(&bssid_str) {
                Ok(parsed) if channel != 0 => parsed,
                _ => {
                    // Unscannable entry, kept but never refreshed.
                    log::debug!("Skipping unscannable entry {bssid_str:?} channel {channel}");
                    if let Some(entry) = self.catalog.entry_mut(sweep.cursor) {
                        entry.scanned = false;
                        entry.detected = false;
                    }
                    sweep.cursor += 1;
                    continue;
                }
            };

            log::trace!(
                "Sweep refreshing {bssid_str} ({}/{}) on channel {channel}",
                sweep.cursor + 1,
                self.catalog.len()
            );
            sweep.target = SweepTarget::Entry {
                bssid: bssid_str,
                channel,
            };
            sweep.did_scan = true;
            let dwell = self.settings.dwell_for_channel(channel);
            self.scan_in_progress = true;
            if self
                .radio
                .start_channel_scan(channel, Some(bssid), dwell)
                .await
                .is_err()
            {
                log::warn!("Targeted scan failed to start");
                self.scan_in_progress = false;
                return false;
            }
            self.activity = RadioActivity::Sweep(sweep);
            return true;
        }
    }

    async fn handle_scan_completion(&mut self) {
        if !self.scan_in_progress {
            return;
        }
        let result = match self.radio.scan_status() {
            ScanStatus::Running => return,
            ScanStatus::Failed => None,
            ScanStatus::Done(count) => Some(count),
        };
        self.scan_in_progress = false;

        match core::mem::replace(&mut self.activity, RadioActivity::Idle) {
            RadioActivity::Idle => {
                // A cancelled sweep's scan draining; nothing wants it.
                log::debug!("Dropping scan results with no active purpose");
            }
            RadioActivity::FullScan(kind) => self.finish_full_scan(kind, result).await,
            RadioActivity::Sweep(sweep) => self.finish_sweep_step(sweep, result).await,
        }
    }

    async fn finish_full_scan(&mut self, kind: FullScanKind, result: Option<usize>) {
        let Some(count) = result else {
            log::warn!("Full scan failed");
            return;
        };
        let records = self.collect_results(count);
        self.catalog
            .merge_scan_results(&records, kind != FullScanKind::Initial);
        let current = self.radio.link_status().ssid;
        self.catalog.sort(&current);

        let now = Instant::now();
        self.last_scan_time = Some(now);
        self.last_full_scan_time = Some(now);
        self.last_scan_type = ScanType::Full;
        self.scan_count = self.scan_count.wrapping_add(1);
        log::info!(
            "Full scan found {} networks, catalog now holds {}",
            records.len(),
            self.catalog.len()
        );

        if kind == FullScanKind::Initial && !self.radio.is_connected() {
            if let Err(err) = self.connect_to_strongest().await {
                log::info!("No connection after initial scan: {err}");
            }
        }
    }

    async fn finish_sweep_step(&mut self, mut sweep: SweepState, result: Option<usize>) {
        let now = Instant::now();
        self.last_scan_time = Some(now);
        self.last_rescan_time = Some(now);
        self.last_scan_type = ScanType::Rescan;

        match core::mem::replace(&mut sweep.target, SweepTarget::Pending) {
            SweepTarget::Pending => return,
            SweepTarget::Entry { bssid, channel } => {
                let observed = result
                    .filter(|count| *count > 0)
                    .and_then(|_| self.radio.scan_result(0));
                // A targeted scan can still answer with a different access
                // point; never fold a mismatched payload into the entry.
                let observed = match observed {
                    Some(record) if !bssid_eq(&record.bssid, &bssid) || record.channel != channel => {
                        log::debug!(
                            "{}: {} channel {} instead of {bssid} channel {channel}",
                            Error::RescanMismatch,
                            record.bssid,
                            record.channel
                        );
                        None
                    }
                    other => other,
                };
                if let Some(entry) = self.catalog.entry_mut(sweep.cursor) {
                    match observed {
                        Some(record)
                            if entry.ssid == record.ssid && bssid_eq(&entry.bssid, &record.bssid) =>
                        {
                            log::trace!("Refreshed '{}' at {} dBm", record.ssid, record.rssi);
                            entry.rssi = record.rssi;
                            entry.channel = record.channel;
                            entry.encryption = record.encryption;
                            entry.scanned = true;
                            entry.detected = true;
                        }
                        _ => {
                            entry.scanned = true;
                            entry.detected = false;
                        }
                    }
                }
                sweep.cursor += 1;
            }
            SweepTarget::TestChannel { channel } => match result {
                Some(count) => {
                    for index in 0..count {
                        if let Some(record) = self.radio.scan_result(index) {
                            self.catalog.upsert_record(&record);
                        }
                    }
                }
                None => log::debug!("Discovery scan on channel {channel} failed"),
            },
        }

        let (known_only, auto) = (sweep.known_only, sweep.auto);
        self.activity = RadioActivity::Sweep(sweep);
        self.advance_sweep(known_only, auto).await;
    }

    fn collect_results(&self, count: usize) -> Vec<ScanRecord> {
        (0..count)
            .filter_map(|index| self.radio.scan_result(index))
            .collect()
    }

    async fn connect_to_strongest(&mut self) -> Result<()> {
        let Some(best) = self.catalog.best_known_candidate() else {
            return Err(Error::NoKnownNetwork);
        };
        let (ssid, bssid, channel, rssi) = (
            best.ssid.clone(),
            best.bssid.clone(),
            best.channel,
            best.rssi,
        );
        log::info!("Connecting to strongest known network '{ssid}' ({rssi} dBm, {bssid}, channel {channel})");
        self.connect_with(&ssid, &bssid, channel, false).await
    }

    /// Blocking association attempt, bounded by the connect timeout. With
    /// `quick` the wait also aborts on a driver disconnect notification.
    async fn connect_with(&mut self, ssid: &str, bssid: &str, channel: u8, quick: bool) -> Result<()> {
        let password = self.catalog.password_for(ssid).map(ToString::to_string);
        if password.is_none() {
            let needs_key = self
                .catalog
                .entries()
                .iter()
                .any(|e| e.ssid == ssid && e.encryption == Encryption::Encrypted);
            if needs_key {
                log::warn!("No credential stored for protected network '{ssid}'");
                return Err(Error::CredentialMissing);
            }
            log::debug!("No credential for '{ssid}'; trying it as an open network");
        }

        let bssid = parse_bssid(bssid).ok();
        let channel = (channel > 0).then_some(channel);
        self.radio
            .connect(ssid, password.as_deref(), channel, bssid)
            .await
            .map_err(|_| Error::Radio)?;

        let outcome = self.wait_for_association(quick).await;
        self.last_connect_attempt = Some(Instant::now());
        match outcome {
            Ok(()) => {
                self.connected_since = Some(Instant::now());
                self.persist_connected_network().await;
                Ok(())
            }
            Err(err) => {
                log::debug!("Association with '{ssid}' did not complete: {err}");
                Err(err)
            }
        }
    }

    async fn wait_for_association(&mut self, abort_on_disconnect: bool) -> Result<()> {
        let start = Instant::now();
        while !self.radio.is_connected() {
            if start.elapsed() >= self.connect_timeout {
                return Err(Error::ConnectTimeout);
            }
            Timer::after(self.connect_poll).await;
            self.drain_radio_events().await;
            if abort_on_disconnect && self.station_disconnected {
                return Err(Error::ConnectTimeout);
            }
        }
        Ok(())
    }

    /// Record the live association as the fast-reconnect target.
    async fn persist_connected_network(&mut self) {
        let link = self.radio.link_status();
        if !link.connected || link.ssid.is_empty() || link.bssid.is_empty() || link.channel == 0 {
            return;
        }
        self.saved = SavedLink {
            ssid: link.ssid,
            bssid: link.bssid,
            channel: link.channel,
            last_quick_ok: true,
        };
        if self.persistence_ok {
            if let Err(err) = self.saved.persist(&mut self.storage).await {
                log::warn!("Failed to persist last connection: {err}");
            }
        }
    }

    async fn try_fast_reconnect(&mut self) -> bool {
        if !self.saved.last_quick_ok || !self.saved.is_complete() {
            return false;
        }
        if self.catalog.password_for(&self.saved.ssid).is_none() {
            log::debug!("No credential for saved network '{}'", self.saved.ssid);
            return false;
        }
        let saved = self.saved.clone();
        log::info!(
            "Fast reconnect to '{}' ({}, channel {})",
            saved.ssid,
            saved.bssid,
            saved.channel
        );
        match self
            .connect_with(&saved.ssid, &saved.bssid, saved.channel, true)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                log::info!("Fast reconnect failed: {err}");
                self.saved.last_quick_ok = false;
                false
            }
        }
    }

    /// Make snapshots non-empty right after a fast reconnect, before any
    /// scan has completed.
    fn seed_catalog_from_link(&mut self) {
        let link = self.radio.link_status();
        if !link.connected || link.ssid.is_empty() || link.bssid.is_empty() {
            return;
        }
        self.catalog.seed(ScannedNetwork {
            ssid: link.ssid.clone(),
            bssid: link.bssid,
            rssi: link.rssi,
            channel: link.channel,
            // The driver does not report the live link's cipher; assumed
            // encrypted until the first scan refreshes the entry.
            encryption: Encryption::Encrypted,
            scanned: true,
            detected: true,
        });
        self.last_scan_time = Some(Instant::now());
        self.last_scan_type = ScanType::FastReconnect;
    }

    async fn reset_radio(&mut self) {
        log::warn!("Resetting the station stack");
        if self.radio.disconnect().await.is_err() {
            log::debug!("Disconnect during reset failed");
        }
        if self.radio.radio_off().await.is_err() {
            log::warn!("Could not power the radio down");
        }
        Timer::after(self.reset_settle).await;
        if self.radio.radio_station().await.is_err() {
            log::error!("Could not bring the radio back up");
        }
    }

    pub fn catalog_snapshot(&self) -> CatalogSnapshot {
        let link = self.radio.link_status();
        let networks = self
            .catalog
            .entries()
            .iter()
            .map(|entry| {
                let connected = link.connected
                    && bssid_eq(&entry.bssid, &link.bssid)
                    && entry.channel == link.channel;
                NetworkView {
                    ssid: entry.ssid.clone(),
                    bssid: entry.bssid.clone(),
                    rssi: entry.rssi,
                    channel: entry.channel,
                    encryption: entry.encryption,
                    scanned: entry.scanned,
                    detected: entry.detected,
                    known: self.catalog.is_known(&entry.ssid),
                    connected,
                    same_ssid_as_connected: link.connected
                        && !link.ssid.is_empty()
                        && entry.ssid == link.ssid
                        && !connected,
                }
            })
            .collect();
        CatalogSnapshot {
            scan_age_secs: self.last_scan_time.map(|at| at.elapsed().as_secs()),
            scan_count: self.scan_count,
            scan_type: self.last_scan_type,
            networks,
        }
    }

    pub fn link_report(&self) -> LinkReport {
        let link = self.radio.link_status();
        LinkReport {
            connected: link.connected,
            ssid: link.ssid,
            bssid: link.bssid,
            ip: link.ip.map(|ip| ip.to_string()),
            rssi: link.rssi,
            mac: format_bssid(&self.radio.mac_address()),
            channel: link.channel,
            uptime_secs: if link.connected {
                self.connected_since.map(|at| at.elapsed().as_secs())
            } else {
                None
            },
            saved: self.saved.is_complete().then(|| SavedNetwork {
                ssid: self.saved.ssid.clone(),
                bssid: self.saved.bssid.clone(),
                channel: self.saved.channel,
            }),
            test_channel: self.test_channel_cursor.map(|index| TEST_CHANNELS[index]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::vec;
    use core::net::Ipv4Addr;

    use crate::radio::LinkStatus;
    use crate::storage::MemoryStore;

    const B0: &str = "00:00:00:00:00:A0";
    const B1: &str = "00:00:00:00:00:A1";
    const B2: &str = "00:00:00:00:00:A2";
    const B3: &str = "00:00:00:00:00:A3";

    #[derive(Default)]
    struct MockRadio {
        connected: bool,
        link_ssid: String,
        link_bssid: String,
        link_rssi: i32,
        link_channel: u8,
        connect_succeeds: bool,
        connect_rssi: i32,
        full_scan_starts: usize,
        channel_scans: Vec<(u8, Option<[u8; 6]>, u32)>,
        connects: Vec<(String, Option<u8>, Option<[u8; 6]>)>,
        disconnects: usize,
        power_cycles: usize,
        scripted: VecDeque<core::result::Result<Vec<ScanRecord>, ()>>,
        active: Option<core::result::Result<Vec<ScanRecord>, ()>>,
        events: VecDeque<RadioEvent>,
    }

    impl MockRadio {
        fn disconnected() -> Self {
            Self {
                connect_rssi: -60,
                ..Self::default()
            }
        }

        fn connectable() -> Self {
            Self {
                connect_succeeds: true,
                connect_rssi: -60,
                ..Self::default()
            }
        }

        fn associated(ssid: &str, bssid: &str, rssi: i32, channel: u8) -> Self {
            Self {
                connected: true,
                link_ssid: ssid.into(),
                link_bssid: bssid.into(),
                link_rssi: rssi,
                link_channel: channel,
                connect_succeeds: true,
                connect_rssi: rssi,
                ..Self::default()
            }
        }

        fn script(&mut self, results: Vec<ScanRecord>) {
            self.scripted.push_back(Ok(results));
        }
    }

    impl RadioController for MockRadio {
        type Error = ();

        async fn start_full_scan(&mut self) -> core::result::Result<(), ()> {
            self.full_scan_starts += 1;
            self.active = self.scripted.pop_front();
            Ok(())
        }

        async fn start_channel_scan(
            &mut self,
            channel: u8,
            bssid: Option<[u8; 6]>,
            dwell_ms: u32,
        ) -> core::result::Result<(), ()> {
            self.channel_scans.push((channel, bssid, dwell_ms));
            self.active = self.scripted.pop_front();
            Ok(())
        }

        fn scan_status(&mut self) -> ScanStatus {
            match &self.active {
                None => ScanStatus::Running,
                Some(Err(())) => ScanStatus::Failed,
                Some(Ok(results)) => ScanStatus::Done(results.len()),
            }
        }

        fn scan_result(&self, index: usize) -> Option<ScanRecord> {
            self.active
                .as_ref()
                .and_then(|outcome| outcome.as_ref().ok())
                .and_then(|results| results.get(index))
                .cloned()
        }

        async fn connect(
            &mut self,
            ssid: &str,
            _password: Option<&str>,
            channel: Option<u8>,
            bssid: Option<[u8; 6]>,
        ) -> core::result::Result<(), ()> {
            self.connects.push((ssid.into(), channel, bssid));
            if self.connect_succeeds {
                self.connected = true;
                self.link_ssid = ssid.into();
                self.link_bssid = bssid.map(|b| format_bssid(&b)).unwrap_or_default();
                self.link_rssi = self.connect_rssi;
                self.link_channel = channel.unwrap_or(1);
            }
            Ok(())
        }

        async fn disconnect(&mut self) -> core::result::Result<(), ()> {
            self.disconnects += 1;
            self.connected = false;
            Ok(())
        }

        async fn radio_off(&mut self) -> core::result::Result<(), ()> {
            self.power_cycles += 1;
            self.connected = false;
            Ok(())
        }

        async fn radio_station(&mut self) -> core::result::Result<(), ()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn link_status(&self) -> LinkStatus {
            LinkStatus {
                connected: self.connected,
                ssid: self.link_ssid.clone(),
                bssid: self.link_bssid.clone(),
                rssi: self.link_rssi,
                channel: self.link_channel,
                ip: self.connected.then(|| Ipv4Addr::new(192, 168, 4, 20)),
            }
        }

        fn mac_address(&self) -> [u8; 6] {
            [0x10, 0x20, 0x30, 0x40, 0x50, 0x60]
        }

        fn poll_event(&mut self) -> Option<RadioEvent> {
            self.events.pop_front()
        }
    }

    fn credentials(ssids: &[&str]) -> Vec<NetworkCredential> {
        ssids
            .iter()
            .map(|ssid| NetworkCredential {
                ssid: (*ssid).into(),
                password: "secret".into(),
            })
            .collect()
    }

    fn record(ssid: &str, bssid: &str, rssi: i32, channel: u8) -> ScanRecord {
        ScanRecord {
            ssid: ssid.into(),
            bssid: bssid.into(),
            rssi,
            channel,
            encryption: Encryption::Encrypted,
        }
    }

    fn manager(radio: MockRadio, creds: &[&str]) -> RoamingManager<MemoryStore, MockRadio> {
        RoamingManager::new(MemoryStore::new(), radio, credentials(creds))
            .with_connect_timeout(Duration::from_millis(50))
            .with_connect_poll(Duration::from_millis(10))
            .with_reset_settle(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn initial_scan_connects_to_strongest_known_network() {
        let mut radio = MockRadio::connectable();
        radio.script(vec![
            record("home", B1, -50, 36),
            record("home", B2, -70, 40),
            record("guest", B3, -40, 44),
        ]);
        let mut mgr = manager(radio, &["home"]);
        mgr.init().await.unwrap();
        assert_eq!(mgr.radio().full_scan_starts, 1);
        assert!(mgr.radio().connects.is_empty());

        mgr.tick().await.unwrap();
        let snapshot = mgr.catalog_snapshot();
        assert_eq!(snapshot.networks.len(), 3);
        assert_eq!(snapshot.scan_count, 1);
        assert_eq!(snapshot.scan_type, ScanType::Full);

        let (ssid, channel, bssid) = mgr.radio().connects[0].clone();
        assert_eq!(ssid, "home");
        assert_eq!(channel, Some(36));
        assert_eq!(bssid, Some(parse_bssid(B1).unwrap()));
        assert!(mgr.is_connected());
        assert_eq!(mgr.link_report().saved.unwrap().ssid, "home");
    }

    #[tokio::test]
    async fn scan_requests_are_refused_while_one_is_running() {
        let mut mgr = manager(MockRadio::disconnected(), &["home"]);
        mgr.init().await.unwrap();
        assert_eq!(mgr.radio().full_scan_starts, 1);

        assert_eq!(
            mgr.begin_full_scan(FullScanKind::Manual).await,
            Err(Error::ScanInProgress)
        );
        mgr.submit(Command::FullScan);
        mgr.tick().await.unwrap();
        assert_eq!(mgr.radio().full_scan_starts, 1);
    }

    #[tokio::test]
    async fn sweep_refreshes_known_entries_and_finishes() {
        let mut radio = MockRadio::connectable();
        radio.script(vec![
            record("home", B1, -50, 36),
            record("home", B2, -60, 40),
            record("guest", B3, -40, 44),
        ]);
        radio.script(vec![record("home", B1, -48, 36)]);
        radio.script(vec![]);
        let mut mgr = manager(radio, &["home"]);
        mgr.init().await.unwrap();
        mgr.tick().await.unwrap();
        assert!(mgr.is_connected());

        let mut patch = SettingsPatch::default();
        patch.auto_rescan_interval_secs = Some(0.1);
        patch.auto_rescan_test_channels = Some(false);
        mgr.submit(Command::ApplySettings(patch));
        mgr.last_connect_attempt = None;

        // Launches the first targeted scan.
        mgr.tick().await.unwrap();
        // Each further tick drains one result and launches the next step.
        mgr.tick().await.unwrap();
        mgr.tick().await.unwrap();

        let scans = &mgr.radio().channel_scans;
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0], (36, Some(parse_bssid(B1).unwrap()), 50));
        assert_eq!(scans[1], (40, Some(parse_bssid(B2).unwrap()), 50));
        assert!(mgr.activity.is_idle());

        let snapshot = mgr.catalog_snapshot();
        assert_eq!(snapshot.scan_count, 2);
        let b1 = snapshot.networks.iter().find(|n| n.bssid == B1).unwrap();
        assert_eq!(b1.rssi, -48);
        assert!(b1.detected);
        let b2 = snapshot.networks.iter().find(|n| n.bssid == B2).unwrap();
        assert!(b2.scanned);
        assert!(!b2.detected);
        let guest = snapshot.networks.iter().find(|n| n.bssid == B3).unwrap();
        assert!(!guest.scanned);
    }

    #[tokio::test]
    async fn sweep_visits_one_discovery_channel_then_stops() {
        let mut radio = MockRadio::connectable();
        radio.script(vec![record("home", B1, -50, 36)]);
        radio.script(vec![record("home", B1, -49, 36)]);
        radio.script(vec![record("cafe", B3, -40, 36)]);
        let mut mgr = manager(radio, &["home"]);
        mgr.init().await.unwrap();
        mgr.tick().await.unwrap();

        let mut patch = SettingsPatch::default();
        patch.auto_rescan_interval_secs = Some(0.1);
        mgr.submit(Command::ApplySettings(patch));
        mgr.last_connect_attempt = None;

        mgr.tick().await.unwrap();
        mgr.tick().await.unwrap();
        mgr.tick().await.unwrap();

        let scans = &mgr.radio().channel_scans;
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0], (36, Some(parse_bssid(B1).unwrap()), 50));
        assert_eq!(scans[1], (TEST_CHANNELS[0], None, 50));
        assert!(mgr.activity.is_idle());
        assert_eq!(mgr.link_report().test_channel, Some(TEST_CHANNELS[0]));

        let snapshot = mgr.catalog_snapshot();
        assert_eq!(snapshot.scan_count, 2);
        let cafe = snapshot.networks.iter().find(|n| n.ssid == "cafe").unwrap();
        assert!(cafe.detected);
        assert!(!cafe.known);
    }

    #[tokio::test]
    async fn sweep_answer_from_a_different_bssid_is_not_folded_in() {
        let mut radio = MockRadio::connectable();
        radio.script(vec![record("home", B1, -50, 36)]);
        // The targeted scan answers with another access point entirely.
        radio.script(vec![record("home", B2, -30, 36)]);
        let mut mgr = manager(radio, &["home"]);
        mgr.init().await.unwrap();
        mgr.tick().await.unwrap();

        let mut patch = SettingsPatch::default();
        patch.auto_rescan_interval_secs = Some(0.1);
        patch.auto_rescan_test_channels = Some(false);
        mgr.submit(Command::ApplySettings(patch));
        mgr.last_connect_attempt = None;

        mgr.tick().await.unwrap();
        mgr.tick().await.unwrap();
        assert!(mgr.activity.is_idle());

        let snapshot = mgr.catalog_snapshot();
        assert_eq!(snapshot.networks.len(), 1);
        let entry = snapshot.networks.iter().find(|n| n.bssid == B1).unwrap();
        assert!(entry.scanned);
        assert!(!entry.detected);
        assert_eq!(entry.rssi, -50);
    }

    #[tokio::test]
    async fn sweep_answer_with_a_spoofed_ssid_keeps_the_entry_identity() {
        let mut radio = MockRadio::connectable();
        radio.script(vec![record("home", B1, -50, 36)]);
        // Right BSSID and channel, wrong SSID.
        radio.script(vec![record("evil", B1, -20, 36)]);
        let mut mgr = manager(radio, &["home"]);
        mgr.init().await.unwrap();
        mgr.tick().await.unwrap();

        let mut patch = SettingsPatch::default();
        patch.auto_rescan_interval_secs = Some(0.1);
        patch.auto_rescan_test_channels = Some(false);
        mgr.submit(Command::ApplySettings(patch));
        mgr.last_connect_attempt = None;

        mgr.tick().await.unwrap();
        mgr.tick().await.unwrap();

        let snapshot = mgr.catalog_snapshot();
        assert_eq!(snapshot.networks.len(), 1);
        let entry = &snapshot.networks[0];
        assert_eq!(entry.ssid, "home");
        assert_eq!(entry.bssid, B1);
        assert!(entry.scanned);
        assert!(!entry.detected);
        assert_eq!(entry.rssi, -50);
    }

    #[tokio::test]
    async fn roams_to_sufficiently_stronger_bssid_on_same_ssid() {
        let radio = MockRadio::associated("home", B0, -65, 36);
        let mut mgr = manager(radio, &["home"]);
        mgr.catalog.merge_scan_results(
            &[record("home", B0, -65, 36), record("home", B1, -50, 40)],
            false,
        );

        mgr.tick().await.unwrap();
        let (ssid, channel, bssid) = mgr.radio().connects[0].clone();
        assert_eq!(ssid, "home");
        assert_eq!(channel, Some(40));
        assert_eq!(bssid, Some(parse_bssid(B1).unwrap()));
    }

    #[tokio::test]
    async fn does_not_roam_below_the_delta() {
        let radio = MockRadio::associated("home", B0, -65, 36);
        let mut mgr = manager(radio, &["home"]);
        // -56 dBm is better, but not by the required 10 dBm.
        mgr.catalog.merge_scan_results(
            &[record("home", B0, -65, 36), record("home", B1, -56, 40)],
            false,
        );

        mgr.tick().await.unwrap();
        assert!(mgr.radio().connects.is_empty());
    }

    #[tokio::test]
    async fn same_ssid_policy_ignores_other_known_networks() {
        let radio = MockRadio::associated("home", B0, -65, 36);
        let mut mgr = manager(radio, &["home", "office"]);
        mgr.settings.auto_rescan_enabled = false;
        mgr.catalog.merge_scan_results(
            &[record("home", B0, -65, 36), record("office", B1, -40, 40)],
            false,
        );

        mgr.tick().await.unwrap();
        assert!(mgr.radio().connects.is_empty());

        mgr.settings.auto_roam_same_ssid_only = false;
        mgr.tick().await.unwrap();
        assert_eq!(mgr.radio().connects[0].0, "office");
    }

    #[tokio::test]
    async fn reconnect_escalates_to_radio_reset_after_threshold() {
        let mut mgr = manager(MockRadio::disconnected(), &[]);
        mgr.settings.auto_reconnect_interval_secs = 0.1;
        mgr.settings.auto_rescan_enabled = false;

        for _ in 0..3 {
            mgr.tick().await.unwrap();
            assert_eq!(mgr.radio().power_cycles, 0);
            tokio::time::sleep(std::time::Duration::from_millis(120)).await;
        }
        mgr.tick().await.unwrap();
        assert_eq!(mgr.radio().power_cycles, 1);
        assert_eq!(mgr.reconnect_attempts, 0);
    }

    #[tokio::test]
    async fn sticky_disconnect_event_triggers_one_reset() {
        let mut radio = MockRadio::disconnected();
        radio.events.push_back(RadioEvent::Disconnected);
        let mut mgr = manager(radio, &[]);
        mgr.settings.auto_reconnect_enabled = false;
        mgr.settings.auto_rescan_enabled = false;

        mgr.tick().await.unwrap();
        assert_eq!(mgr.radio().power_cycles, 1);
        mgr.tick().await.unwrap();
        assert_eq!(mgr.radio().power_cycles, 1);
    }

    #[tokio::test]
    async fn fast_reconnect_skips_the_initial_scan() {
        let mut store = MemoryStore::new();
        let saved = SavedLink {
            ssid: "home".into(),
            bssid: B1.into(),
            channel: 44,
            last_quick_ok: true,
        };
        saved.persist(&mut store).await.unwrap();

        let mut mgr = RoamingManager::new(store, MockRadio::connectable(), credentials(&["home"]))
            .with_connect_timeout(Duration::from_millis(50))
            .with_connect_poll(Duration::from_millis(10));
        mgr.init().await.unwrap();

        assert_eq!(mgr.radio().full_scan_starts, 0);
        let (ssid, channel, bssid) = mgr.radio().connects[0].clone();
        assert_eq!(ssid, "home");
        assert_eq!(channel, Some(44));
        assert_eq!(bssid, Some(parse_bssid(B1).unwrap()));

        let snapshot = mgr.catalog_snapshot();
        assert_eq!(snapshot.networks.len(), 1);
        assert_eq!(snapshot.scan_type, ScanType::FastReconnect);
        // The flag is re-armed by the successful association.
        assert_eq!(
            mgr.storage().get("last_quick_ok").await.unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn fast_reconnect_requires_the_armed_flag() {
        let mut store = MemoryStore::new();
        let saved = SavedLink {
            ssid: "home".into(),
            bssid: B1.into(),
            channel: 44,
            last_quick_ok: false,
        };
        saved.persist(&mut store).await.unwrap();

        let mut mgr = RoamingManager::new(store, MockRadio::connectable(), credentials(&["home"]));
        mgr.init().await.unwrap();
        assert!(mgr.radio().connects.is_empty());
        assert_eq!(mgr.radio().full_scan_starts, 1);
    }

    #[tokio::test]
    async fn failed_fast_reconnect_falls_back_to_a_full_scan() {
        let mut store = MemoryStore::new();
        let saved = SavedLink {
            ssid: "home".into(),
            bssid: B1.into(),
            channel: 44,
            last_quick_ok: true,
        };
        saved.persist(&mut store).await.unwrap();

        let mut mgr = RoamingManager::new(store, MockRadio::disconnected(), credentials(&["home"]))
            .with_connect_timeout(Duration::from_millis(30))
            .with_connect_poll(Duration::from_millis(10));
        mgr.init().await.unwrap();

        assert_eq!(mgr.radio().connects.len(), 1);
        assert_eq!(mgr.radio().full_scan_starts, 1);
        assert!(!mgr.saved.last_quick_ok);
        assert_eq!(
            mgr.storage().get("last_quick_ok").await.unwrap().as_deref(),
            Some("false")
        );
    }

    #[tokio::test]
    async fn settings_intents_apply_at_tick_start_and_cancel_the_sweep() {
        let mut mgr = manager(MockRadio::disconnected(), &[]);
        mgr.settings.auto_reconnect_enabled = false;
        mgr.activity = RadioActivity::Sweep(SweepState::new(true, true));

        let mut patch = SettingsPatch::default();
        patch.auto_rescan_interval_secs = Some(0.25);
        patch.auto_roam_delta_dbm = Some(15.0);
        mgr.submit(Command::ApplySettings(patch));
        assert_eq!(mgr.settings_view().auto_rescan_interval_secs, 1.0);

        mgr.tick().await.unwrap();
        assert_eq!(mgr.settings_view().auto_rescan_interval_secs, 0.25);
        assert_eq!(mgr.settings_view().auto_roam_delta_dbm, 15.0);
        assert!(mgr.activity.is_idle());

        mgr.submit(Command::RestoreDefaults);
        mgr.tick().await.unwrap();
        assert_eq!(mgr.settings_view().auto_rescan_interval_secs, 1.0);
        assert_eq!(mgr.settings_view().auto_roam_delta_dbm, 10.0);
    }

    #[tokio::test]
    async fn disconnect_request_drops_the_association() {
        let radio = MockRadio::associated("home", B0, -60, 36);
        let mut mgr = manager(radio, &["home"]);
        mgr.submit(Command::Disconnect);
        mgr.tick().await.unwrap();
        assert_eq!(mgr.radio().disconnects, 1);
        assert!(!mgr.is_connected());
    }

    #[tokio::test]
    async fn targeted_connect_request_with_empty_ssid_is_ignored() {
        let mut mgr = manager(MockRadio::connectable(), &["home"]);
        mgr.settings.auto_reconnect_enabled = false;
        mgr.settings.auto_rescan_enabled = false;

        mgr.submit(Command::ConnectTarget {
            ssid: String::new(),
            bssid: B1.into(),
            channel: 36,
        });
        mgr.tick().await.unwrap();
        assert!(mgr.radio().connects.is_empty());

        mgr.submit(Command::ConnectTarget {
            ssid: "home".into(),
            bssid: B1.into(),
            channel: 36,
        });
        mgr.tick().await.unwrap();
        assert_eq!(mgr.radio().connects.len(), 1);
        assert!(mgr.is_connected());
    }
}
