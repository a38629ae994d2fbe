use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use roamsync_api::Encryption;
use roamsync_core::{ScanRecord, bssid_eq, format_bssid};

/// One simulated access point.
#[derive(Debug, Clone)]
pub struct SimAccessPoint {
    pub ssid: String,
    pub bssid: String,
    pub channel: u8,
    pub rssi: i32,
    pub encryption: Encryption,
    pub up: bool,
}

impl SimAccessPoint {
    pub fn new(ssid: &str, bssid: &str, rssi: i32, channel: u8) -> Self {
        Self {
            ssid: ssid.into(),
            bssid: bssid.into(),
            channel,
            rssi,
            encryption: Encryption::Encrypted,
            up: true,
        }
    }

    pub fn open(mut self) -> Self {
        self.encryption = Encryption::Open;
        self
    }

    pub fn down(mut self) -> Self {
        self.up = false;
        self
    }
}

/// The set of access points currently on the air. Shared between the
/// simulated radio and the test scenario, which mutates it mid-run.
#[derive(Debug)]
pub struct SimEnvironment {
    aps: Vec<SimAccessPoint>,
    rng: StdRng,
    jitter_dbm: i32,
}

impl SimEnvironment {
    pub fn new(seed: u64) -> Self {
        Self {
            aps: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            jitter_dbm: 0,
        }
    }

    /// Add per-observation RSSI noise, uniform in `-jitter..=jitter` dBm.
    pub fn with_jitter(mut self, jitter_dbm: i32) -> Self {
        self.jitter_dbm = jitter_dbm;
        self
    }

    pub fn add(&mut self, ap: SimAccessPoint) {
        self.aps.push(ap);
    }

    pub fn find(&self, bssid: &str) -> Option<&SimAccessPoint> {
        self.aps.iter().find(|ap| bssid_eq(&ap.bssid, bssid))
    }

    /// Strongest access point on the air with this SSID.
    pub fn find_strongest(&self, ssid: &str) -> Option<&SimAccessPoint> {
        self.aps
            .iter()
            .filter(|ap| ap.up && ap.ssid == ssid)
            .max_by_key(|ap| ap.rssi)
    }

    fn find_mut(&mut self, bssid: &str) -> Option<&mut SimAccessPoint> {
        self.aps.iter_mut().find(|ap| bssid_eq(&ap.bssid, bssid))
    }

    pub fn set_rssi(&mut self, bssid: &str, rssi: i32) {
        if let Some(ap) = self.find_mut(bssid) {
            ap.rssi = rssi;
        }
    }

    pub fn take_down(&mut self, bssid: &str) {
        if let Some(ap) = self.find_mut(bssid) {
            ap.up = false;
        }
    }

    pub fn bring_up(&mut self, bssid: &str) {
        if let Some(ap) = self.find_mut(bssid) {
            ap.up = true;
        }
    }

    /// What a scan would observe right now, optionally restricted to one
    /// channel and one BSSID.
    pub fn observe(&mut self, channel: Option<u8>, bssid: Option<[u8; 6]>) -> Vec<ScanRecord> {
        let filter = bssid.map(|b| format_bssid(&b));
        let jitter = self.jitter_dbm;
        let mut records = Vec::new();
        for ap in &self.aps {
            if !ap.up {
                continue;
            }
            if let Some(ch) = channel {
                if ap.channel != ch {
                    continue;
                }
            }
            if let Some(ref wanted) = filter {
                if !bssid_eq(&ap.bssid, wanted) {
                    continue;
                }
            }
            let noise = if jitter > 0 {
                self.rng.random_range(-jitter..=jitter)
            } else {
                0
            };
            records.push(ScanRecord {
                ssid: ap.ssid.clone(),
                bssid: ap.bssid.clone(),
                rssi: ap.rssi + noise,
                channel: ap.channel,
                encryption: ap.encryption,
            });
        }
        records
    }
}
