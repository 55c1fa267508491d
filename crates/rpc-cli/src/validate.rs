//! Business-rule validation pass run after `clap`'s structural parse.
//! Mutual-exclusion and cross-field rules that `clap` can't express
//! (because they cross flag boundaries, like `-u` vs `-local`) live
//! here, each one producing a [`ResultCode`] rather than a bare error
//! string — the CLI's exit code *is* the validation outcome.

use rpc_protocol::ResultCode;

use crate::args::{ActivateArgs, CommonArgs, ConfigureArgs, DeactivateArgs};
use crate::config::Config;
use crate::env;

pub const DEFAULT_LMS_PORT: u16 = 16992;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug)]
pub struct ValidationError {
    pub code: ResultCode,
    pub message: String,
}

impl ValidationError {
    fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Flags resolved through CLI → config file → environment, common to
/// every device-facing command.
pub struct ResolvedCommon {
    pub url: Option<String>,
    pub local: bool,
    pub password: Option<String>,
    pub profile: Option<String>,
    pub name: Option<String>,
    pub lms_address: String,
    pub lms_port: u16,
    pub timeout_seconds: u64,
    pub verbose: bool,
    pub json: bool,
    pub skip_cert_check: bool,
    pub config: Option<Config>,
    pub dns_suffix: Option<String>,
    pub hostname: Option<String>,
    pub proxy: Option<String>,
}

pub struct ActivateParams {
    pub common: ResolvedCommon,
    pub acm: bool,
    pub amt_password: Option<String>,
    pub mebx_password: Option<String>,
    pub provisioning_cert: Option<String>,
    pub provisioning_cert_pwd: Option<String>,
}

pub struct DeactivateParams {
    pub common: ResolvedCommon,
    pub force: bool,
}

pub struct ConfigureParams {
    pub common: ResolvedCommon,
}

pub struct MaintenanceParams {
    pub common: ResolvedCommon,
}

pub fn resolve_common(common: &CommonArgs) -> Result<ResolvedCommon, ValidationError> {
    if common.url.is_some() && common.local {
        return Err(ValidationError::new(
            ResultCode::InvalidParameters,
            "-u and -local are mutually exclusive",
        ));
    }
    if common.url.is_none() && !common.local {
        return Err(ValidationError::new(
            ResultCode::IncorrectCommandLineParameters,
            "one of -u or -local is required",
        ));
    }

    let config = match &common.config_path {
        Some(path) => Some(Config::load(path).map_err(|e| {
            ValidationError::new(
                ResultCode::IncorrectCommandLineParameters,
                format!("loading config {path}: {e}"),
            )
        })?),
        None => None,
    };

    let password = common
        .password
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.password.clone()))
        .or_else(env::amt_password);

    let profile = common.profile.clone().or_else(env::profile);
    if common.url.is_some() && profile.is_none() {
        return Err(ValidationError::new(
            ResultCode::MissingOrIncorrectProfile,
            "remote activation requires -profile",
        ));
    }

    let (lms_address, lms_port) = if let Some(url) = &common.url {
        let host = url_host(url).ok_or_else(|| {
            ValidationError::new(
                ResultCode::MissingOrIncorrectURL,
                format!("cannot parse host from URL {url}"),
            )
        })?;
        (host, common.lms_port.unwrap_or(DEFAULT_LMS_PORT))
    } else {
        (
            common
                .lms_address
                .clone()
                .unwrap_or_else(|| rpc_local::DEFAULT_LMS_ADDRESS.to_string()),
            common.lms_port.unwrap_or(DEFAULT_LMS_PORT),
        )
    };

    Ok(ResolvedCommon {
        url: common.url.clone(),
        local: common.local,
        password,
        profile,
        name: common.name.clone(),
        lms_address,
        lms_port,
        timeout_seconds: common.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        verbose: common.verbose,
        json: common.json,
        skip_cert_check: common.skip_cert_check,
        config,
        dns_suffix: common.dns_suffix.clone().or_else(env::dns_suffix),
        hostname: common.hostname.clone().or_else(env::hostname),
        proxy: common.proxy.clone(),
    })
}

pub fn activate(args: &ActivateArgs) -> Result<ActivateParams, ValidationError> {
    if args.acm && args.ccm {
        return Err(ValidationError::new(
            ResultCode::InvalidParameters,
            "-acm and -ccm are mutually exclusive",
        ));
    }

    let common = resolve_common(&args.common)?;

    if common.local && !args.acm && !args.ccm {
        return Err(ValidationError::new(
            ResultCode::InvalidParameters,
            "-local requires one of -acm or -ccm for activate",
        ));
    }

    let amt_password = args
        .amt_password
        .clone()
        .or_else(|| common.config.as_ref().and_then(|c| c.acm_activate.as_ref()).and_then(|a| a.amt_password.clone()))
        .or_else(|| common.password.clone());

    let mebx_password = args
        .mebx_password
        .clone()
        .or_else(|| common.config.as_ref().and_then(|c| c.acm_activate.as_ref()).and_then(|a| a.mebx_password.clone()));

    let provisioning_cert = args
        .provisioning_cert
        .clone()
        .or_else(|| common.config.as_ref().and_then(|c| c.acm_activate.as_ref()).and_then(|a| a.provisioning_cert.clone()));

    let provisioning_cert_pwd = args
        .provisioning_cert_pwd
        .clone()
        .or_else(|| common.config.as_ref().and_then(|c| c.acm_activate.as_ref()).and_then(|a| a.provisioning_cert_pwd.clone()));

    if args.acm && provisioning_cert.is_none() {
        return Err(ValidationError::new(
            ResultCode::InvalidParameters,
            "ACM activation requires -provisioningCert (or acmactivate.provisioningCert in config)",
        ));
    }

    Ok(ActivateParams {
        common,
        acm: args.acm,
        amt_password,
        mebx_password,
        provisioning_cert,
        provisioning_cert_pwd,
    })
}

pub fn deactivate(args: &DeactivateArgs) -> Result<DeactivateParams, ValidationError> {
    let common = resolve_common(&args.common)?;
    Ok(DeactivateParams { common, force: args.force })
}

pub fn configure(args: &ConfigureArgs) -> Result<ConfigureParams, ValidationError> {
    let common = resolve_common(&args.common)?;
    if common.dns_suffix.is_none() {
        return Err(ValidationError::new(ResultCode::MissingDNSSuffix, "configure requires -d or DNS_SUFFIX"));
    }
    if common.hostname.is_none() {
        return Err(ValidationError::new(ResultCode::MissingHostname, "configure requires -h or HOSTNAME"));
    }
    if common.proxy.is_none() {
        return Err(ValidationError::new(
            ResultCode::MissingProxyAddressAndPort,
            "configure requires -p <address:port>",
        ));
    }
    Ok(ConfigureParams { common })
}

pub fn maintenance(common: &CommonArgs) -> Result<MaintenanceParams, ValidationError> {
    let common = resolve_common(common)?;
    Ok(MaintenanceParams { common })
}

/// Extracts the host portion of a URL like `wss://localhost:16993/path`.
fn url_host(url: &str) -> Option<String> {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let host_and_port = without_scheme.split('/').next()?;
    let host = host_and_port.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::CommonArgs;

    fn common(url: Option<&str>, local: bool) -> CommonArgs {
        CommonArgs {
            url: url.map(String::from),
            local,
            ..Default::default()
        }
    }

    #[test]
    fn neither_url_nor_local_is_incorrect_parameters() {
        let err = resolve_common(&common(None, false)).unwrap_err();
        assert_eq!(err.code, ResultCode::IncorrectCommandLineParameters);
    }

    #[test]
    fn url_and_local_together_is_invalid() {
        let err = resolve_common(&common(Some("wss://localhost"), true)).unwrap_err();
        assert_eq!(err.code, ResultCode::InvalidParameters);
    }

    #[test]
    fn remote_activation_resolves_lms_defaults_from_url() {
        let mut args = CommonArgs {
            url: Some("wss://localhost".into()),
            profile: Some("p".into()),
            password: Some("pw".into()),
            ..Default::default()
        };
        args.local = false;
        let resolved = resolve_common(&args).unwrap();
        assert_eq!(resolved.lms_address, "localhost");
        assert_eq!(resolved.lms_port, 16992);
        assert_eq!(resolved.timeout_seconds, 120);
        assert_eq!(resolved.profile.as_deref(), Some("p"));
        assert_eq!(resolved.password.as_deref(), Some("pw"));
    }

    #[test]
    fn remote_activation_without_profile_is_missing_profile() {
        let args = common(Some("wss://localhost"), false);
        let err = resolve_common(&args).unwrap_err();
        assert_eq!(err.code, ResultCode::MissingOrIncorrectProfile);
    }

    #[test]
    fn local_activate_without_mode_flag_is_invalid() {
        use crate::args::ActivateArgs;
        let args = ActivateArgs {
            common: common(None, true),
            acm: false,
            ccm: false,
            amt_password: None,
            mebx_password: None,
            provisioning_cert: None,
            provisioning_cert_pwd: None,
        };
        let err = activate(&args).unwrap_err();
        assert_eq!(err.code, ResultCode::InvalidParameters);
    }

    #[test]
    fn missing_config_file_is_incorrect_command_line_parameters() {
        use crate::args::ActivateArgs;
        let args = ActivateArgs {
            common: CommonArgs {
                local: true,
                config_path: Some("./missing.yaml".into()),
                ..Default::default()
            },
            acm: true,
            ccm: false,
            amt_password: None,
            mebx_password: None,
            provisioning_cert: None,
            provisioning_cert_pwd: None,
        };
        let err = activate(&args).unwrap_err();
        assert_eq!(err.code, ResultCode::IncorrectCommandLineParameters);
    }

    #[test]
    fn acm_and_ccm_together_is_invalid() {
        use crate::args::ActivateArgs;
        let args = ActivateArgs {
            common: common(None, true),
            acm: true,
            ccm: true,
            amt_password: None,
            mebx_password: None,
            provisioning_cert: None,
            provisioning_cert_pwd: None,
        };
        let err = activate(&args).unwrap_err();
        assert_eq!(err.code, ResultCode::InvalidParameters);
    }
}
