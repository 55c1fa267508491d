use std::collections::VecDeque;

use rpc_protocol::{Result, RpcError};

use crate::{ControlMode, DriverOps, LocalSystemAccount};

/// In-memory driver double for relay and activation-engine tests.
///
/// Mirrors how the teacher substitutes a fake `NodeTool` at the
/// `ToolRegistry` construction boundary instead of hitting real
/// hardware in unit tests.
#[derive(Default)]
pub struct FakeDriver {
    pub initialized: bool,
    pub buffer_size: u32,
    pub control_mode: ControlMode,
    pub local_system_account: LocalSystemAccount,
    pub unprovision_result: u32,
    /// Bytes queued to be returned by successive `recv` calls.
    pub inbound: VecDeque<Vec<u8>>,
    /// Bytes observed by `send`, in call order.
    pub sent: Vec<Vec<u8>>,
    pub fail_init: bool,
}

impl Default for ControlMode {
    fn default() -> Self {
        ControlMode::Unprovisioned
    }
}

impl Default for LocalSystemAccount {
    fn default() -> Self {
        LocalSystemAccount {
            username: "admin".into(),
            password: "local-pass".into(),
        }
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            buffer_size: 5120,
            unprovision_result: 0,
            ..Default::default()
        }
    }

    pub fn with_control_mode(mut self, mode: ControlMode) -> Self {
        self.control_mode = mode;
        self
    }

    pub fn push_inbound(&mut self, bytes: impl Into<Vec<u8>>) {
        self.inbound.push_back(bytes.into());
    }
}

impl DriverOps for FakeDriver {
    fn init(&mut self, _use_long_lived: bool) -> Result<()> {
        if self.fail_init {
            return Err(RpcError::DriverAccess("fake init failure".into()));
        }
        self.initialized = true;
        Ok(())
    }

    fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        self.sent.push(bytes.to_vec());
        Ok(bytes.len())
    }

    fn recv(&mut self, out: &mut [u8]) -> Result<usize> {
        let Some(chunk) = self.inbound.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(out.len());
        out[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }

    fn close(&mut self) {
        self.initialized = false;
    }

    fn get_control_mode(&mut self) -> Result<ControlMode> {
        Ok(self.control_mode)
    }

    fn get_local_system_account(&mut self) -> Result<LocalSystemAccount> {
        Ok(self.local_system_account.clone())
    }

    fn unprovision(&mut self) -> Result<u32> {
        Ok(self.unprovision_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_failure_is_reported() {
        let mut driver = FakeDriver::new();
        driver.fail_init = true;
        assert!(driver.init(false).is_err());
    }

    #[test]
    fn recv_drains_queued_messages_in_order() {
        let mut driver = FakeDriver::new();
        driver.push_inbound(vec![1, 2, 3]);
        driver.push_inbound(vec![4, 5]);

        let mut buf = [0u8; 8];
        let n1 = driver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n1], &[1, 2, 3]);
        let n2 = driver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n2], &[4, 5]);
        let n3 = driver.recv(&mut buf).unwrap();
        assert_eq!(n3, 0);
    }

    #[test]
    fn send_records_sent_bytes() {
        let mut driver = FakeDriver::new();
        driver.send(b"hello").unwrap();
        assert_eq!(driver.sent, vec![b"hello".to_vec()]);
    }
}
