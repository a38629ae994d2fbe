use alloc::string::String;

/// Fixed rotation of 5 GHz channels visited for discovery after a sweep.
/// The cursor into this list survives across sweeps so successive sweeps
/// cover the band one channel at a time.
pub const TEST_CHANNELS: &[u8] = &[
    36, 40, 44, 48, 52, 56, 60, 64, 100, 104, 108, 112, 116, 120, 124, 128, 132, 136, 140, 144,
    149, 153, 157, 161, 165, 169, 173, 177,
];

/// Why a full scan was launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullScanKind {
    /// Requested through the admin seam
    Manual,
    /// Launched by the scan scheduler
    Auto,
    /// First scan after boot; replaces the catalog wholesale and connects
    /// to the strongest known network once drained
    Initial,
}

/// What the in-flight targeted scan of a sweep is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepTarget {
    /// Sweep activated but no scan launched yet for the current step
    Pending,
    /// Refreshing one catalogued entry by BSSID and channel
    Entry { bssid: String, channel: u8 },
    /// Discovery pass over one channel with no BSSID filter
    TestChannel { channel: u8 },
}

/// State of an incremental refresh pass over the catalog. Exists only
/// while a sweep is active, so a dangling cursor with no sweep cannot be
/// represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepState {
    /// Index of the catalog entry to refresh next
    pub cursor: usize,
    /// Restrict the sweep to networks with a stored credential
    pub known_only: bool,
    /// Scheduler-initiated sweeps run the discovery extension even when
    /// nothing was eligible to refresh
    pub auto: bool,
    /// At least one targeted scan was actually launched this sweep
    pub did_scan: bool,
    /// The one-per-sweep discovery channel has already been visited
    pub ran_test_channel: bool,
    pub target: SweepTarget,
}

impl SweepState {
    pub fn new(known_only: bool, auto: bool) -> Self {
        Self {
            cursor: 0,
            known_only,
            auto,
            did_scan: false,
            ran_test_channel: false,
            target: SweepTarget::Pending,
        }
    }
}

/// Everything the radio can be busy with, as one tagged state so that
/// contradictory combinations (an active sweep with no recorded purpose,
/// two concurrent scan modes) are unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioActivity {
    Idle,
    FullScan(FullScanKind),
    Sweep(SweepState),
}

impl RadioActivity {
    pub fn is_idle(&self) -> bool {
        matches!(self, RadioActivity::Idle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RadioActivity::Idle => "idle",
            RadioActivity::FullScan(FullScanKind::Manual) => "manual-full-scan",
            RadioActivity::FullScan(FullScanKind::Auto) => "auto-full-scan",
            RadioActivity::FullScan(FullScanKind::Initial) => "initial-full-scan",
            RadioActivity::Sweep(sweep) => match sweep.target {
                SweepTarget::Pending => "sweep",
                SweepTarget::Entry { .. } => "sweep-entry",
                SweepTarget::TestChannel { .. } => "sweep-test-channel",
            },
        }
    }
}
