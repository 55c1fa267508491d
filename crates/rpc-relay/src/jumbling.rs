//! Reproduces a firmware framing quirk observed in the original client:
//! certain WS-Management responses carry a spurious leading line that
//! must be stripped before forwarding to the provisioning server, or
//! the server's parser chokes on it. This is not a protocol feature —
//! it is a workaround for specific AMT firmware output and the marker
//! list below must not be extended or reinterpreted.

/// Response fragments whose presence indicates the spurious-line quirk
/// is in play. Order matters: only the first matching marker (by
/// index) is considered per call.
const MARKERS: &[&str] = &[
    "AMT_PublicKeyCertificate</c:ResourceURI></a:Header><a:Body><g:EnumerateResponse>",
    "AMT_PublicKeyCertificate</c:ResourceURI></a:Header><a:Body><g:PullResponse>",
    "AMT_PublicKeyManagementService</c:ResourceURI></a:Header><a:Body><g:AddTrustedRootCertificate_OUTPUT><g:CreatedCertificate>",
    "AMT_PublicKeyManagementService</c:ResourceURI></a:Header><a:Body><g:GenerateKeyPair_OUTPUT>",
    "AMT_PublicPrivateKeyPair</c:ResourceURI></a:Header><a:Body><g:EnumerateResponse>",
    "AMT_PublicPrivateKeyPair</c:ResourceURI></a:Header><a:Body><g:PullResponse>",
    "AMT_PublicKeyManagementService</c:ResourceURI></a:Header><a:Body><g:AddCertificate_OUTPUT><g:CreatedCertificate>",
    "AMT_TLSCredentialContext</c:ResourceURI></a:Header><a:Body><g:ResourceCreated>",
    "AMT_TimeSynchronizationService</c:ResourceURI></a:Header><a:Body><g:GetLowAccuracyTimeSynch_OUTPUT>",
    "AMT_TimeSynchronizationService</c:ResourceURI></a:Header><a:Body><g:SetHighAccuracyTimeSynch_OUTPUT>",
    "AMT_TLSSettingData</c:ResourceURI></a:Header><a:Body><g:EnumerateResponse>",
    "AMT_TLSSettingData</c:ResourceURI></a:Header><a:Body><g:PullResponse>",
    "AMT_TLSSettingData</c:ResourceURI></a:Header><a:Body><g:AMT_TLSSettingData>",
    "</g:AcceptNonSecureConnections><g:ElementName>Intel(r) AMT 802.3 TLS Settings</g:ElementName>",
    "</g:AcceptNonSecureConnections><g:ElementName>Intel(r) AMT LMS TLS Settings</g:ElementName>",
];

/// Per-process (here, per-session) occurrence counters, one per marker.
pub struct JumbleGuard {
    counts: Vec<u8>,
}

impl Default for JumbleGuard {
    fn default() -> Self {
        Self {
            counts: vec![0; MARKERS.len()],
        }
    }
}

impl JumbleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strips the first `\r\n`-delimited line from `data` if it matches
    /// the quirk, otherwise returns it unchanged.
    ///
    /// Matches the original's semantics exactly: scans markers in
    /// order, acts on the first whose counter is still under 3, and
    /// stops looking once one has matched — even on the occurrence
    /// that pushes its counter to 3 (which does not jumble).
    pub fn check(&mut self, data: &[u8]) -> Vec<u8> {
        let text = String::from_utf8_lossy(data);
        let mut should_jumble = false;

        for (i, marker) in MARKERS.iter().enumerate() {
            if self.counts[i] < 3 && text.contains(marker) {
                self.counts[i] += 1;
                should_jumble = self.counts[i] < 3;
                break;
            }
        }

        if should_jumble {
            strip_first_line(data)
        } else {
            data.to_vec()
        }
    }
}

fn strip_first_line(data: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(data);
    match text.split_once("\r\n") {
        Some((_, rest)) => rest.replace("\r\n", "").into_bytes(),
        None => data.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumbles_first_two_occurrences_but_not_the_third() {
        let mut guard = JumbleGuard::new();
        let sample = b"line-one\r\nAMT_TLSSettingData</c:ResourceURI></a:Header><a:Body><g:PullResponse>\r\nrest";

        let first = guard.check(sample);
        assert!(!first.starts_with(b"line-one"));

        let second = guard.check(sample);
        assert!(!second.starts_with(b"line-one"));

        let third = guard.check(sample);
        assert!(third.starts_with(b"line-one"));
    }

    #[test]
    fn leaves_unrelated_data_untouched() {
        let mut guard = JumbleGuard::new();
        let sample = b"<g:AMT_GeneralSettings/>";
        assert_eq!(guard.check(sample), sample.to_vec());
    }

    #[test]
    fn only_first_matching_marker_counts() {
        let mut guard = JumbleGuard::new();
        let overlapping = format!(
            "head\r\n{}{}",
            MARKERS[0], MARKERS[1]
        );
        guard.check(overlapping.as_bytes());
        assert_eq!(guard.counts[0], 1);
        assert_eq!(guard.counts[1], 0);
    }
}
