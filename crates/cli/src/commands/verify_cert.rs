//! # verify-cert

use keyreg_crypto::{AttestationError, AttestationVerifier};
use keyreg_types::NodeId;

/// 証明書を検証し、導出したNodeIdを返す。
pub fn run(
    certificate: &[u8],
    verifier: &dyn AttestationVerifier,
) -> Result<NodeId, AttestationError> {
    let identity = verifier.verify(certificate)?;
    tracing::info!(tee_type = identity.tee_type(), "証明書を検証しました");
    Ok(identity.node_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use keyreg_crypto::attestation::mock::{issue_mock_certificate, MockVerifier};

    #[test]
    fn test_verify_mock_certificate() {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let cert = issue_mock_certificate(&key).unwrap();

        let node_id = run(&cert, &MockVerifier).unwrap();
        assert_eq!(node_id.as_bytes(), key.verifying_key().as_bytes());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(run(b"{}", &MockVerifier).is_err());
    }
}
