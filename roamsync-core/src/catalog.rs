use alloc::string::String;
use alloc::vec::Vec;

use roamsync_api::Encryption;

use crate::radio::{ScanRecord, bssid_eq};

/// One known network the engine may associate with. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCredential {
    pub ssid: String,
    pub password: String,
}

/// One catalogued access point. Identity is the BSSID (case-insensitive);
/// the same SSID may appear on several entries. Whether the SSID is known
/// is computed against the credential list on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedNetwork {
    pub ssid: String,
    pub bssid: String,
    /// Last observed signal strength in dBm; stale when `detected` is false
    pub rssi: i32,
    pub channel: u8,
    pub encryption: Encryption,
    /// This sweep cycle attempted to refresh the entry
    pub scanned: bool,
    /// The most recent attempt actually observed the network over the air
    pub detected: bool,
}

impl ScannedNetwork {
    pub fn from_record(record: &ScanRecord) -> Self {
        Self {
            ssid: record.ssid.clone(),
            bssid: record.bssid.clone(),
            rssi: record.rssi,
            channel: record.channel,
            encryption: record.encryption,
            scanned: true,
            detected: true,
        }
    }

    fn refresh(&mut self, record: &ScanRecord) {
        self.ssid = record.ssid.clone();
        self.bssid = record.bssid.clone();
        self.rssi = record.rssi;
        self.channel = record.channel;
        self.encryption = record.encryption;
        self.scanned = true;
        self.detected = true;
    }
}

/// Ranked list of currently catalogued networks plus the credential set.
/// Owned exclusively by the engine; the admin layer only sees snapshots.
#[derive(Debug, Default)]
pub struct NetworkCatalog {
    credentials: Vec<NetworkCredential>,
    entries: Vec<ScannedNetwork>,
}

impl NetworkCatalog {
    pub fn new(credentials: Vec<NetworkCredential>) -> Self {
        Self {
            credentials,
            entries: Vec::new(),
        }
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_known(&self, ssid: &str) -> bool {
        !ssid.is_empty() && self.credentials.iter().any(|c| c.ssid == ssid)
    }

    pub fn password_for(&self, ssid: &str) -> Option<&str> {
        self.credentials
            .iter()
            .find(|c| c.ssid == ssid)
            .map(|c| c.password.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ScannedNetwork] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&ScannedNetwork> {
        self.entries.get(index)
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut ScannedNetwork> {
        self.entries.get_mut(index)
    }

    /// Replace the catalog with a single live association. Used after a
    /// fast reconnect so snapshots are non-empty before any scan completes.
    pub fn seed(&mut self, entry: ScannedNetwork) {
        self.entries.clear();
        self.entries.push(entry);
    }

    /// Fold a completed full scan into the catalog. With `keep_existing`
    /// every cached entry is first marked refreshed-but-absent, then each
    /// observed record updates its entry in place (matched by BSSID) or is
    /// appended. Without it the catalog is replaced wholesale (first boot).
    pub fn merge_scan_results(&mut self, results: &[ScanRecord], keep_existing: bool) {
        if !keep_existing {
            self.entries.clear();
        }
        for existing in self.entries.iter_mut() {
            existing.scanned = true;
            existing.detected = false;
        }
        for record in results {
            if record.bssid.is_empty() {
                continue;
            }
            self.upsert_record(record);
        }
    }

    /// Update the entry matching this record's BSSID, or append a new one.
    pub fn upsert_record(&mut self, record: &ScanRecord) {
        match self
            .entries
            .iter_mut()
            .find(|e| bssid_eq(&e.bssid, &record.bssid))
        {
            Some(entry) => entry.refresh(record),
            None => self.entries.push(ScannedNetwork::from_record(record)),
        }
    }

    /// Re-establish canonical order: entries on the currently associated
    /// SSID first, then other known networks, then the rest, each group by
    /// RSSI descending. Stable within equal RSSI.
    pub fn sort(&mut self, current_ssid: &str) {
        let mut group_current = Vec::with_capacity(self.entries.len());
        let mut group_known = Vec::with_capacity(self.entries.len());
        let mut group_unknown = Vec::with_capacity(self.entries.len());

        let credentials = &self.credentials;
        for entry in self.entries.drain(..) {
            if !current_ssid.is_empty() && entry.ssid == current_ssid {
                group_current.push(entry);
            } else if !entry.ssid.is_empty() && credentials.iter().any(|c| c.ssid == entry.ssid) {
                group_known.push(entry);
            } else {
                group_unknown.push(entry);
            }
        }

        let rssi_desc = |a: &ScannedNetwork, b: &ScannedNetwork| b.rssi.cmp(&a.rssi);
        group_current.sort_by(rssi_desc);
        group_known.sort_by(rssi_desc);
        group_unknown.sort_by(rssi_desc);

        self.entries.extend(group_current);
        self.entries.extend(group_known);
        self.entries.extend(group_unknown);
    }

    /// Strongest entry that was actually observed and has a credential.
    /// Ties keep the first entry in catalog order.
    pub fn best_known_candidate(&self) -> Option<&ScannedNetwork> {
        let mut best: Option<&ScannedNetwork> = None;
        for entry in &self.entries {
            if !entry.detected || !self.is_known(&entry.ssid) {
                continue;
            }
            match best {
                Some(current) if entry.rssi <= current.rssi => {}
                _ => best = Some(entry),
            }
        }
        best
    }
}
