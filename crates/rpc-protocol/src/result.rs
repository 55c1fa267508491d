//! Stable, wire-visible result code taxonomy.
//!
//! The numeric value of each variant is the process exit code and is
//! load-bearing for anything scripting against this binary — never
//! renumber an existing variant.

use serde::Serialize;
use std::fmt;

/// A closed set of result codes with a 1-to-1 text rendering.
///
/// Mirrors the role of the teacher's `sa_protocol::ErrorKind`: a small,
/// stable enum that both drives the process exit code and renders a
/// human string for the CLI and `-json` output modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum ResultCode {
    Success = 0,
    IncorrectCommandLineParameters = 1,
    MissingOrIncorrectURL = 2,
    MissingOrIncorrectProfile = 3,
    MissingOrIncorrectPassword = 4,
    MissingDNSSuffix = 5,
    MissingHostname = 6,
    MissingProxyAddressAndPort = 7,
    InvalidParameters = 8,
    ServerCertificateVerificationFailed = 9,
    AmtNotDetected = 10,
    AMTConnectionFailed = 11,
    UnableToActivate = 12,
    ActivationFailed = 13,
    UnableToDeactivate = 14,
    DeactivationFailed = 15,
    GeneralError = 16,
}

impl ResultCode {
    /// The process exit code for this result.
    pub fn exit_code(self) -> i32 {
        self as i32
    }

    /// Human-readable rendering, used by the plain-text CLI output path.
    pub fn message(self) -> &'static str {
        match self {
            ResultCode::Success => "Success",
            ResultCode::IncorrectCommandLineParameters => {
                "Incorrect command line parameters"
            }
            ResultCode::MissingOrIncorrectURL => "Missing or incorrect URL",
            ResultCode::MissingOrIncorrectProfile => "Missing or incorrect profile",
            ResultCode::MissingOrIncorrectPassword => "Missing or incorrect password",
            ResultCode::MissingDNSSuffix => "Missing DNS suffix",
            ResultCode::MissingHostname => "Missing hostname",
            ResultCode::MissingProxyAddressAndPort => "Missing proxy address and port",
            ResultCode::InvalidParameters => "Invalid parameters",
            ResultCode::ServerCertificateVerificationFailed => {
                "Server certificate verification failed"
            }
            ResultCode::AmtNotDetected => "AMT not detected",
            ResultCode::AMTConnectionFailed => "AMT connection failed",
            ResultCode::UnableToActivate => "Unable to activate",
            ResultCode::ActivationFailed => "Activation failed",
            ResultCode::UnableToDeactivate => "Unable to deactivate",
            ResultCode::DeactivationFailed => "Deactivation failed",
            ResultCode::GeneralError => "General error",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_matches_wire_value() {
        assert_eq!(ResultCode::Success.exit_code(), 0);
        assert_eq!(ResultCode::IncorrectCommandLineParameters.exit_code(), 1);
        assert_eq!(ResultCode::GeneralError.exit_code(), 16);
    }

    #[test]
    fn every_variant_has_a_message() {
        let codes = [
            ResultCode::Success,
            ResultCode::IncorrectCommandLineParameters,
            ResultCode::MissingOrIncorrectURL,
            ResultCode::MissingOrIncorrectProfile,
            ResultCode::MissingOrIncorrectPassword,
            ResultCode::MissingDNSSuffix,
            ResultCode::MissingHostname,
            ResultCode::MissingProxyAddressAndPort,
            ResultCode::InvalidParameters,
            ResultCode::ServerCertificateVerificationFailed,
            ResultCode::AmtNotDetected,
            ResultCode::AMTConnectionFailed,
            ResultCode::UnableToActivate,
            ResultCode::ActivationFailed,
            ResultCode::UnableToDeactivate,
            ResultCode::DeactivationFailed,
            ResultCode::GeneralError,
        ];
        for code in codes {
            assert!(!code.message().is_empty());
        }
    }

    #[test]
    fn serializes_as_json_string_tag() {
        let json = serde_json::to_string(&ResultCode::ActivationFailed).unwrap();
        assert_eq!(json, "\"ActivationFailed\"");
    }
}
