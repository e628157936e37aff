#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use pulselink_core::engine::Engine;
use pulselink_core::waves::WaveCatalog;
use pulselink_net::{MemoryTransport, Transport};
use pulselink_types::{EndpointId, WaveformSegment};

/// Settle delay used by every harness engine. Short enough to keep tests
/// fast, long enough that "before the delay" and "after the delay" are
/// observable.
pub const SETTLE: Duration = Duration::from_millis(50);

/// A wait that comfortably covers the settle delay plus thread scheduling.
pub fn settle_and_margin() {
    std::thread::sleep(SETTLE + Duration::from_millis(250));
}

pub struct Harness {
    pub transport: Arc<MemoryTransport>,
    pub engine: Engine,
    pub controller: EndpointId,
    _wave_dir: tempfile::TempDir,
}

impl Harness {
    /// An engine over a fresh `MemoryTransport`, not yet initialized.
    pub fn new() -> Self {
        Self::with_strengths((0, 0))
    }

    pub fn with_strengths(strengths: (u8, u8)) -> Self {
        let transport = Arc::new(MemoryTransport::new());
        let wave_dir = tempfile::tempdir().expect("tempdir");
        let catalog = Arc::new(WaveCatalog::open(wave_dir.path().to_path_buf()));
        let controller = EndpointId::new("controller");
        let engine = Engine::with_options(
            transport.clone() as Arc<dyn Transport>,
            catalog,
            controller.clone(),
            SETTLE,
            strengths,
        );
        Self {
            transport,
            engine,
            controller,
            _wave_dir: wave_dir,
        }
    }

    /// Connect an endpoint and bind it to the harness controller.
    pub fn connect_and_bind(&self, id: &str) -> EndpointId {
        let endpoint = EndpointId::new(id);
        self.transport.connect(endpoint.clone());
        self.transport.bind(&self.controller, endpoint.clone());
        endpoint
    }

    /// Let any pending reconcile pushes from recent binds land, then drain
    /// the send log so the phase under test starts from a clean slate.
    pub fn quiesce(&self) {
        settle_and_margin();
        self.transport.take_log();
    }

    /// A short valid segment sequence for direct `send_wave` calls.
    pub fn segments(&self) -> Vec<WaveformSegment> {
        vec![
            WaveformSegment::new("0A0A0A0A64646464").expect("valid segment"),
            WaveformSegment::new("0A0A0A0A32323232").expect("valid segment"),
        ]
    }
}
