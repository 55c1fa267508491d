//! YAML config file support. Layered under CLI flags and over
//! environment variables: flags win when present, then the config
//! file, then the environment-variable defaults in [`crate::env`].

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub password: Option<String>,
    #[serde(rename = "ieee801xConfig")]
    pub ieee_8021x: Option<Ieee8021xConfig>,
    #[serde(rename = "acmactivate")]
    pub acm_activate: Option<AcmActivateConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ieee8021xConfig {
    pub name: String,
    #[serde(rename = "authenticationMethod")]
    pub authentication_method: String,
    #[serde(rename = "encryptionMethod")]
    pub encryption_method: String,
    pub ssid: String,
    pub username: String,
    #[serde(rename = "authenticationProtocol")]
    pub authentication_protocol: String,
    pub priority: i32,
    #[serde(rename = "clientCert")]
    pub client_cert: Option<String>,
    #[serde(rename = "caCert")]
    pub ca_cert: Option<String>,
    #[serde(rename = "privateKey")]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcmActivateConfig {
    #[serde(rename = "amtPassword")]
    pub amt_password: Option<String>,
    #[serde(rename = "mebxPassword")]
    pub mebx_password: Option<String>,
    #[serde(rename = "provisioningCert")]
    pub provisioning_cert: Option<String>,
    #[serde(rename = "provisioningCertPwd")]
    pub provisioning_cert_pwd: Option<String>,
}

impl Config {
    /// Reads and parses `path`. Callers decide how to map a missing
    /// file: a command that was given `-config` and got a missing path
    /// is a CLI-parameter error, not a general I/O failure.
    pub fn load(path: &str) -> std::io::Result<Config> {
        let raw = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_acmactivate_section() {
        let yaml = r#"
password: "toplevel"
acmactivate:
  amtPassword: "amtpw"
  provisioningCert: "YmFzZTY0"
  provisioningCertPwd: "certpw"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.password.as_deref(), Some("toplevel"));
        let acm = config.acm_activate.unwrap();
        assert_eq!(acm.amt_password.as_deref(), Some("amtpw"));
        assert_eq!(acm.provisioning_cert.as_deref(), Some("YmFzZTY0"));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(Config::load("./this-file-does-not-exist.yaml").is_err());
    }
}
