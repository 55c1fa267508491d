//! Component C: the local transport selector. Probes for an LMS
//! loopback service at construction time and picks between a "short"
//! raw-TCP variant and a "long" APF-tunneled variant accordingly, then
//! exposes one shared `post_wsman` call so neither the activation
//! engines nor the relay ever need to match on which variant is live.

mod digest;
mod httpframe;
mod long;
mod short;

use rpc_driver::DriverOps;
use rpc_protocol::Result;

pub use long::LongTransport;
pub use short::ShortTransport;

/// Default local-system account used when the driver hasn't supplied
/// one yet (e.g. for commands that only read state).
pub const DEFAULT_LMS_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_LMS_PORT: u16 = 16992;

pub enum LocalManager {
    Short(ShortTransport),
    Long(LongTransport),
}

impl LocalManager {
    /// Dials `lms_address:lms_port`; if that succeeds, builds the short
    /// variant. Otherwise falls back to the long variant over `driver`.
    pub fn connect(
        lms_address: &str,
        lms_port: u16,
        username: String,
        password: String,
        driver: Box<dyn DriverOps>,
    ) -> Result<Self> {
        let addr = format!("{lms_address}:{lms_port}");
        if ShortTransport::probe(&addr) {
            tracing::debug!(%addr, "LMS reachable, using short local transport");
            Ok(LocalManager::Short(ShortTransport::new(addr, username, password)))
        } else {
            tracing::debug!(%addr, "LMS unreachable, falling back to APF-tunneled local transport");
            Ok(LocalManager::Long(LongTransport::connect(driver, username, password)?))
        }
    }

    pub fn post_wsman(&mut self, body: &str) -> Result<String> {
        match self {
            LocalManager::Short(t) => t.post_wsman(body),
            LocalManager::Long(t) => t.post_wsman(body),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        match self {
            LocalManager::Short(_) => Ok(()),
            LocalManager::Long(t) => t.close(),
        }
    }
}
