//! # ローカル開発用モック検証器
//!
//! TEEハードウェアが利用できない開発環境で使用する。
//! モック証明書はEd25519公開鍵・ノンス・その鍵自身による署名を持つJSON文書で、
//! 署名が正しければ公開鍵をノード識別子として返す。
//! ノンスが異なれば同じ鍵でも別の証明書になるが、導出される識別子は変わらない。

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use super::{AttestationError, AttestationVerifier, VerifiedIdentity};

/// モック証明書のモジュールID。
pub const MOCK_MODULE_ID: &str = "mock-enclave";

/// 署名対象に付与するドメイン分離タグ。
const MOCK_SIGNING_DOMAIN: &[u8] = b"keyreg-mock-attestation-v1";

/// モック証明書の構造体。
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MockCertificate {
    /// モジュールID（常に `mock-enclave`）
    module_id: String,
    /// Ed25519公開鍵（32バイト）
    #[serde(with = "keyreg_types::encoding::base64_bytes")]
    public_key: Vec<u8>,
    /// 発行ごとの値（再発行の区別用）
    nonce: u64,
    /// `MOCK_SIGNING_DOMAIN || public_key || nonce(BE)` に対する署名（64バイト）
    #[serde(with = "keyreg_types::encoding::base64_bytes")]
    signature: Vec<u8>,
}

fn signing_message(public_key: &[u8], nonce: u64) -> Vec<u8> {
    [MOCK_SIGNING_DOMAIN, public_key, &nonce.to_be_bytes()].concat()
}

/// 署名鍵からモック証明書を発行する（ノンス0）。
pub fn issue_mock_certificate(signing_key: &SigningKey) -> Result<Vec<u8>, AttestationError> {
    issue_mock_certificate_with_nonce(signing_key, 0)
}

/// 指定したノンスでモック証明書を発行する。
pub fn issue_mock_certificate_with_nonce(
    signing_key: &SigningKey,
    nonce: u64,
) -> Result<Vec<u8>, AttestationError> {
    let public_key = signing_key.verifying_key().to_bytes().to_vec();
    let signature = signing_key.sign(&signing_message(&public_key, nonce));
    let cert = MockCertificate {
        module_id: MOCK_MODULE_ID.to_string(),
        public_key,
        nonce,
        signature: signature.to_bytes().to_vec(),
    };
    serde_json::to_vec(&cert).map_err(|e| AttestationError::MalformedCertificate(e.to_string()))
}

/// モック検証器。
#[derive(Debug, Clone, Copy, Default)]
pub struct MockVerifier;

impl AttestationVerifier for MockVerifier {
    fn tee_type(&self) -> &str {
        "mock"
    }

    fn verify(&self, certificate: &[u8]) -> Result<VerifiedIdentity, AttestationError> {
        let cert: MockCertificate = serde_json::from_slice(certificate)
            .map_err(|e| AttestationError::MalformedCertificate(e.to_string()))?;

        if cert.module_id != MOCK_MODULE_ID {
            return Err(AttestationError::MalformedCertificate(format!(
                "module_idが不正です: {}",
                cert.module_id
            )));
        }

        let key_bytes: [u8; 32] = cert.public_key.as_slice().try_into().map_err(|_| {
            AttestationError::MalformedCertificate("公開鍵は32バイトである必要があります".into())
        })?;
        let verifying_key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| AttestationError::MalformedCertificate(e.to_string()))?;
        let signature = Signature::from_slice(&cert.signature)
            .map_err(|_| AttestationError::SignatureVerificationFailed)?;

        verifying_key
            .verify(&signing_message(&cert.public_key, cert.nonce), &signature)
            .map_err(|_| AttestationError::SignatureVerificationFailed)?;

        Ok(VerifiedIdentity::new("mock", cert.public_key))
    }
}
