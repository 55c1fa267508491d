//! `amtinfo`: a thin read of the device's control mode. Bypasses the
//! relay and activation engines entirely — opening the driver and
//! reading one value doesn't need either.

use rpc_driver::{DriverOps, HeciDriver};
use rpc_protocol::Result;

pub struct AmtInfo {
    pub control_mode: rpc_driver::ControlMode,
}

pub fn run() -> Result<AmtInfo> {
    let mut driver = HeciDriver::new();
    driver.init(false)?;
    let control_mode = driver.get_control_mode()?;
    driver.close();
    Ok(AmtInfo { control_mode })
}

impl AmtInfo {
    pub fn render_text(&self) -> String {
        format!("Control Mode: {}", self.control_mode.describe())
    }
}
