//! Shared error type used across every RPC crate, modeled on the
//! teacher's single `sa_domain::Error` enum that every crate in that
//! workspace returns.

use crate::result::ResultCode;

/// Which operation a [`RpcError::Mode`] failure was raised against.
/// Keeps the activate/deactivate exit-code split a typed discriminant
/// instead of a substring check over the diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Activate,
    Deactivate,
}

/// Errors produced anywhere in the relay, transports, or activation
/// engines. Each variant maps to exactly one [`ResultCode`] via
/// [`RpcError::code`], which the executor uses as the process exit
/// status.
#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    /// CLI validation failed before any side effects occurred.
    #[error("invalid parameters: {0}")]
    Parameter(String),

    /// The driver device could not be opened (missing or permission denied).
    #[error("driver access failed: {0}")]
    DriverAccess(String),

    /// A read/write on the remote or local transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed XML/SOAP or an unexpected firmware return value.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// PKCS#12 decrypt, fingerprint mismatch, or signing failure.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The device's control mode does not permit the requested operation.
    #[error("wrong control mode: {message}")]
    Mode { operation: Operation, message: String },

    /// Activation-specific failure after the crypto/mode steps succeeded.
    #[error("activation failed: {0}")]
    Activation(String),

    /// Deactivation-specific failure.
    #[error("deactivation failed: {0}")]
    Deactivation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RpcError>;

impl RpcError {
    /// Map this error to its stable [`ResultCode`].
    ///
    /// This is the single place that decides how an internal failure is
    /// rendered to the outside world; keep it exhaustive so a new
    /// variant can't silently fall through to `GeneralError`.
    pub fn code(&self) -> ResultCode {
        match self {
            RpcError::Parameter(_) => ResultCode::InvalidParameters,
            RpcError::DriverAccess(_) => ResultCode::AmtNotDetected,
            RpcError::Transport(_) => ResultCode::AMTConnectionFailed,
            RpcError::Protocol(_) => ResultCode::GeneralError,
            RpcError::Crypto(_) => ResultCode::ActivationFailed,
            RpcError::Mode { operation, .. } => match operation {
                Operation::Activate => ResultCode::UnableToActivate,
                Operation::Deactivate => ResultCode::UnableToDeactivate,
            },
            RpcError::Activation(_) => ResultCode::ActivationFailed,
            RpcError::Deactivation(_) => ResultCode::DeactivationFailed,
            RpcError::Io(_) => ResultCode::GeneralError,
            RpcError::Other(_) => ResultCode::GeneralError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_error_distinguishes_activate_and_deactivate() {
        let activate_err = RpcError::Mode {
            operation: Operation::Activate,
            message: "device already activated".into(),
        };
        assert_eq!(activate_err.code(), ResultCode::UnableToActivate);

        let deactivate_err = RpcError::Mode {
            operation: Operation::Deactivate,
            message: "wrong mode for deactivation".into(),
        };
        assert_eq!(deactivate_err.code(), ResultCode::UnableToDeactivate);
    }

    #[test]
    fn crypto_error_maps_to_activation_failed() {
        assert_eq!(
            RpcError::Crypto("bad passphrase".into()).code(),
            ResultCode::ActivationFailed
        );
    }
}
