use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use roamsync_api::Encryption;
use roamsync_core::{LinkStatus, RadioController, RadioEvent, ScanRecord, ScanStatus, format_bssid};

use crate::environment::SimEnvironment;

const SIM_MAC: [u8; 6] = [0x02, 0x00, 0x5E, 0x10, 0x20, 0x30];

struct ScanJob {
    records: Vec<ScanRecord>,
    polls_left: u8,
    failed: bool,
}

/// Radio seam backed by a shared [`SimEnvironment`]. Scans observe the
/// environment at launch time and complete after a configurable number of
/// status polls; associations succeed when the target is on the air.
pub struct SimRadio {
    env: Arc<Mutex<SimEnvironment>>,
    scan: Option<ScanJob>,
    scan_latency_polls: u8,
    fail_next_scan: bool,
    refuse_connects: bool,
    connected_bssid: Option<String>,
    events: VecDeque<RadioEvent>,
}

impl SimRadio {
    pub fn new(env: Arc<Mutex<SimEnvironment>>) -> Self {
        Self {
            env,
            scan: None,
            scan_latency_polls: 1,
            fail_next_scan: false,
            refuse_connects: false,
            connected_bssid: None,
            events: VecDeque::new(),
        }
    }

    /// How many status polls a scan reports `Running` before completing.
    pub fn with_scan_latency(mut self, polls: u8) -> Self {
        self.scan_latency_polls = polls;
        self
    }

    pub fn fail_next_scan(&mut self) {
        self.fail_next_scan = true;
    }

    pub fn refuse_connects(&mut self, refuse: bool) {
        self.refuse_connects = refuse;
    }

    /// Tear the link down the way a vanished access point would: the
    /// station drops and the driver raises a disconnect notification.
    pub fn drop_link(&mut self) {
        self.connected_bssid = None;
        self.events.push_back(RadioEvent::Disconnected);
    }

    fn begin_scan(&mut self, records: Vec<ScanRecord>) {
        let failed = std::mem::take(&mut self.fail_next_scan);
        self.scan = Some(ScanJob {
            records,
            polls_left: self.scan_latency_polls,
            failed,
        });
    }
}

impl RadioController for SimRadio {
    type Error = ();

    async fn start_full_scan(&mut self) -> Result<(), ()> {
        let records = self.env.lock().unwrap().observe(None, None);
        self.begin_scan(records);
        Ok(())
    }

    async fn start_channel_scan(
        &mut self,
        channel: u8,
        bssid: Option<[u8; 6]>,
        _dwell_ms: u32,
    ) -> Result<(), ()> {
        let records = self.env.lock().unwrap().observe(Some(channel), bssid);
        self.begin_scan(records);
        Ok(())
    }

    fn scan_status(&mut self) -> ScanStatus {
        match self.scan.as_mut() {
            None => ScanStatus::Running,
            Some(job) => {
                if job.polls_left > 0 {
                    job.polls_left -= 1;
                    ScanStatus::Running
                } else if job.failed {
                    ScanStatus::Failed
                } else {
                    ScanStatus::Done(job.records.len())
                }
            }
        }
    }

    fn scan_result(&self, index: usize) -> Option<ScanRecord> {
        self.scan
            .as_ref()
            .filter(|job| !job.failed && job.polls_left == 0)
            .and_then(|job| job.records.get(index))
            .cloned()
    }

    async fn connect(
        &mut self,
        ssid: &str,
        password: Option<&str>,
        _channel: Option<u8>,
        bssid: Option<[u8; 6]>,
    ) -> Result<(), ()> {
        self.connected_bssid = None;
        if self.refuse_connects {
            return Ok(());
        }
        let env = self.env.lock().unwrap();
        // With no BSSID the station associates with the strongest matching
        // access point, like a plain SSID join would.
        let target = match bssid {
            Some(b) => env.find(&format_bssid(&b)).filter(|ap| ap.ssid == ssid),
            None => env.find_strongest(ssid),
        };
        let Some(ap) = target.filter(|ap| ap.up) else {
            return Ok(());
        };
        if ap.encryption == Encryption::Encrypted && password.is_none() {
            return Ok(());
        }
        self.connected_bssid = Some(ap.bssid.clone());
        drop(env);
        self.events.push_back(RadioEvent::GotIp);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ()> {
        self.connected_bssid = None;
        Ok(())
    }

    async fn radio_off(&mut self) -> Result<(), ()> {
        self.connected_bssid = None;
        // An in-flight scan dies with the radio and reports failure.
        if let Some(job) = self.scan.as_mut() {
            job.polls_left = 0;
            job.failed = true;
        }
        Ok(())
    }

    async fn radio_station(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        let Some(bssid) = self.connected_bssid.as_deref() else {
            return false;
        };
        self.env
            .lock()
            .unwrap()
            .find(bssid)
            .is_some_and(|ap| ap.up)
    }

    fn link_status(&self) -> LinkStatus {
        let Some(bssid) = self.connected_bssid.as_deref() else {
            return LinkStatus::disconnected();
        };
        let env = self.env.lock().unwrap();
        match env.find(bssid).filter(|ap| ap.up) {
            Some(ap) => LinkStatus {
                connected: true,
                ssid: ap.ssid.clone(),
                bssid: ap.bssid.clone(),
                rssi: ap.rssi,
                channel: ap.channel,
                ip: Some(core::net::Ipv4Addr::new(192, 168, 4, 20)),
            },
            None => LinkStatus::disconnected(),
        }
    }

    fn mac_address(&self) -> [u8; 6] {
        SIM_MAC
    }

    fn poll_event(&mut self) -> Option<RadioEvent> {
        self.events.pop_front()
    }
}
