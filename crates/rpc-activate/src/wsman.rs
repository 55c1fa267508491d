//! Minimal WS-Management SOAP envelope construction and field
//! extraction. Full schema validation is out of scope; only the
//! handful of fields the activation and deactivation engines actually
//! read or write are handled, the same pragmatic, no-full-parser
//! approach the rest of this codebase takes to narrow text formats.

const ENVELOPE_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?><a:Envelope xmlns:a="http://www.w3.org/2003/05/soap-envelope" xmlns:g="http://schemas.xmlsoap.org/ws/2004/09/transfer">"#;
const ENVELOPE_FOOTER: &str = "</a:Envelope>";

pub fn get_general_settings() -> String {
    wrap_body(r#"<g:Get xmlns:h="AMT_GeneralSettings"/>"#)
}

pub fn get_host_based_setup_service() -> String {
    wrap_body(r#"<g:Get xmlns:h="IPS_HostBasedSetupService"/>"#)
}

pub fn get_trusted_root_certificates() -> String {
    wrap_body(r#"<g:Enumerate xmlns:h="AMT_PublicKeyCertificate"/>"#)
}

pub fn add_next_cert_in_chain(pem_body: &str, is_leaf: bool, is_root: bool) -> String {
    wrap_body(&format!(
        r#"<g:AddNextCertInChain xmlns:h="IPS_HostBasedSetupService"><h:NextCertificate>{pem_body}</h:NextCertificate><h:IsLeafCertificate>{is_leaf}</h:IsLeafCertificate><h:IsRootCertificate>{is_root}</h:IsRootCertificate></g:AddNextCertInChain>"#
    ))
}

pub fn admin_setup(digest_realm: &str, amt_password: &str, nonce_b64: &str, signature_b64: &str) -> String {
    wrap_body(&format!(
        r#"<g:AdminSetup xmlns:h="IPS_HostBasedSetupService"><h:DigestRealm>{digest_realm}</h:DigestRealm><h:Password>{amt_password}</h:Password><h:McNonce>{nonce_b64}</h:McNonce><h:SigningAlgorithm>2</h:SigningAlgorithm><h:DigitalSignature>{signature_b64}</h:DigitalSignature></g:AdminSetup>"#
    ))
}

pub fn host_based_setup(digest_realm: &str, amt_password: &str) -> String {
    wrap_body(&format!(
        r#"<g:Setup xmlns:h="IPS_HostBasedSetupService"><h:NetAdminPassEncryptionType>2</h:NetAdminPassEncryptionType><h:DigestRealm>{digest_realm}</h:DigestRealm><h:Password>{amt_password}</h:Password></g:Setup>"#
    ))
}

pub fn unprovision(mode: u8) -> String {
    wrap_body(&format!(
        r#"<g:Unprovision xmlns:h="AMT_SetupAndConfigurationService"><h:Value>{mode}</h:Value></g:Unprovision>"#
    ))
}

fn wrap_body(body: &str) -> String {
    format!("{ENVELOPE_HEADER}<a:Body>{body}</a:Body>{ENVELOPE_FOOTER}")
}

/// Returns the first occurrence of `<...:field>value</...:field>`,
/// regardless of namespace prefix.
pub fn extract_field(xml: &str, field: &str) -> Option<String> {
    let open_needle = format!(":{field}>");
    let open_start = xml.find(&open_needle)? + open_needle.len();
    let close_needle = format!("</");
    let rest = &xml[open_start..];
    let close_rel = rest.find(&close_needle)?;
    Some(rest[..close_rel].to_string())
}

/// Returns every occurrence of `<...:field>value</...:field>` in
/// document order; used for repeated elements like trust-anchor
/// listings.
pub fn extract_all_fields(xml: &str, field: &str) -> Vec<String> {
    let open_needle = format!(":{field}>");
    let mut values = Vec::new();
    let mut cursor = 0;
    while let Some(rel_start) = xml[cursor..].find(&open_needle) {
        let start = cursor + rel_start + open_needle.len();
        let Some(rel_end) = xml[start..].find("</") else {
            break;
        };
        values.push(xml[start..start + rel_end].to_string());
        cursor = start + rel_end;
    }
    values
}

/// Extracts an integer `ReturnValue` field; AMT uses `0` for success.
pub fn extract_return_value(xml: &str) -> Option<i64> {
    extract_field(xml, "ReturnValue")?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_matching_field() {
        let xml = "<a:Body><g:DigestRealm>Digest:ABCDEF</g:DigestRealm></a:Body>";
        assert_eq!(extract_field(xml, "DigestRealm").as_deref(), Some("Digest:ABCDEF"));
    }

    #[test]
    fn extracts_all_occurrences_in_order() {
        let xml = "<g:X509Fingerprint>aa</g:X509Fingerprint><g:X509Fingerprint>bb</g:X509Fingerprint>";
        assert_eq!(
            extract_all_fields(xml, "X509Fingerprint"),
            vec!["aa".to_string(), "bb".to_string()]
        );
    }

    #[test]
    fn missing_field_is_none() {
        assert!(extract_field("<a/>", "Nope").is_none());
    }

    #[test]
    fn return_value_parses_as_integer() {
        let xml = "<g:Setup_OUTPUT><g:ReturnValue>0</g:ReturnValue></g:Setup_OUTPUT>";
        assert_eq!(extract_return_value(xml), Some(0));
    }

    #[test]
    fn add_next_cert_in_chain_embeds_flags() {
        let body = add_next_cert_in_chain("base64body", true, false);
        assert!(body.contains("<h:IsLeafCertificate>true</h:IsLeafCertificate>"));
        assert!(body.contains("<h:IsRootCertificate>false</h:IsRootCertificate>"));
    }
}
