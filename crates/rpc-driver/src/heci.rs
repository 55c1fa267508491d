use std::fs::{File, OpenOptions};
use std::io::{Read, Write};

use rpc_protocol::{Result, RpcError};

use crate::{ControlMode, DriverOps, LocalSystemAccount};

/// Default HECI device node on Linux. Other platforms expose the same
/// message-oriented contract through a different handle (a named pipe
/// on Windows, an IOKit connection on macOS); those are out of scope
/// here, same as the kernel driver itself.
const DEFAULT_DEVICE_PATH: &str = "/dev/mei0";

/// Conservative default max message size; real hardware reports its
/// own value via a device-specific property query that is an external
/// collaborator of this crate.
const DEFAULT_BUFFER_SIZE: u32 = 5120;

/// Minimal PTHI (AMT's local host interface) command codes used by the
/// handful of operations this crate needs. The exact on-wire command
/// layout belongs to AMT firmware documentation, which is outside this
/// specification's scope — these are the three calls the activation
/// and deactivation engines need, framed the same way every other PTHI
/// request is: a fixed command header followed by a command-specific
/// body.
mod pthi {
    pub const GET_CONTROL_MODE: u32 = 0x0400_0111;
    pub const GET_LOCAL_SYSTEM_ACCOUNT: u32 = 0x0400_0112;
    pub const UNPROVISION: u32 = 0x0400_0113;
}

/// Real HECI driver handle.
pub struct HeciDriver {
    path: String,
    file: Option<File>,
    buffer_size: u32,
}

impl HeciDriver {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_DEVICE_PATH)
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    fn handle(&mut self) -> Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| RpcError::DriverAccess("driver not initialized".into()))
    }

    /// Issue one PTHI command and return its response body.
    fn pthi_call(&mut self, command: u32, body: &[u8]) -> Result<Vec<u8>> {
        let mut request = Vec::with_capacity(4 + body.len());
        request.extend_from_slice(&command.to_be_bytes());
        request.extend_from_slice(body);
        self.send(&request)?;

        let mut response = vec![0u8; self.buffer_size as usize];
        let n = self.recv(&mut response)?;
        response.truncate(n);
        Ok(response)
    }
}

impl Default for HeciDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverOps for HeciDriver {
    fn init(&mut self, use_long_lived: bool) -> Result<()> {
        tracing::debug!(path = %self.path, use_long_lived, "opening HECI device");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| RpcError::DriverAccess(format!("open {}: {e}", self.path)))?;
        self.file = Some(file);
        Ok(())
    }

    fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        let file = self.handle()?;
        file.write_all(bytes)
            .map_err(|e| RpcError::Transport(format!("driver write: {e}")))?;
        Ok(bytes.len())
    }

    fn recv(&mut self, out: &mut [u8]) -> Result<usize> {
        let file = self.handle()?;
        let n = file
            .read(out)
            .map_err(|e| RpcError::Transport(format!("driver read: {e}")))?;
        Ok(n)
    }

    fn close(&mut self) {
        self.file = None;
    }

    fn get_control_mode(&mut self) -> Result<ControlMode> {
        let response = self.pthi_call(pthi::GET_CONTROL_MODE, &[])?;
        let raw = response
            .get(0..4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| RpcError::Protocol("short GetControlMode response".into()))?;
        ControlMode::from_u32(raw)
            .ok_or_else(|| RpcError::Protocol(format!("unknown control mode {raw}")))
    }

    fn get_local_system_account(&mut self) -> Result<LocalSystemAccount> {
        let response = self.pthi_call(pthi::GET_LOCAL_SYSTEM_ACCOUNT, &[])?;
        let mid = response
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(response.len());
        let username = String::from_utf8_lossy(&response[..mid]).into_owned();
        let password = String::from_utf8_lossy(response.get(mid + 1..).unwrap_or(&[])).into_owned();
        Ok(LocalSystemAccount { username, password })
    }

    fn unprovision(&mut self) -> Result<u32> {
        let response = self.pthi_call(pthi::UNPROVISION, &1u32.to_be_bytes())?;
        response
            .get(0..4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| RpcError::Protocol("short Unprovision response".into()))
    }
}
