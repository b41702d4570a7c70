//! # AWS Nitro Attestation Document 検証
//!
//! AWS Nitro EnclaveのAttestation Documentを登録用証明書として検証し、
//! `public_key` フィールドをノード識別子として取り出す。
//!
//! ## 検証手順
//! 1. COSE Sign1エンベロープをパース
//! 2. ペイロード（CBORマップ）を [`AttestationDocument`] にデシリアライズ
//! 3. 証明書チェーン（リーフ → `cabundle` → 信頼ルート）のECDSA-P384署名を検証
//! 4. リーフ証明書の公開鍵でCOSE ES384署名を検証
//!
//! 証明書の有効期限はチェックしない。検証結果はブロック時刻に依存せず、
//! 全レプリカで同一でなければならない。

use std::collections::BTreeMap;

use coset::CborSerializable;
use der::{Decode, Encode};
use p384::ecdsa::signature::Verifier;
use serde::Deserialize;
use serde_bytes::ByteBuf;

use super::{AttestationError, AttestationVerifier, VerifiedIdentity};

/// AWS Nitro Attestation PKIルート証明書（DER形式、base64エンコード）。
///
/// Subject: CN=aws.nitro-enclaves, O=Amazon, OU=AWS, C=US
/// Validity: 2019-10-28 ~ 2049-10-28
const AWS_NITRO_ROOT_CERT_B64: &str = "\
MIICETCCAZagAwIBAgIRAPkxdWgbkK/hHUbMtOTn+FYwCgYIKoZIzj0EAwMwSTEL\
MAkGA1UEBhMCVVMxDzANBgNVBAoMBkFtYXpvbjEMMAoGA1UECwwDQVdTMRswGQYD\
VQQDDBJhd3Mubml0cm8tZW5jbGF2ZXMwHhcNMTkxMDI4MTMyODA1WhcNNDkxMDI4\
MTQyODA1WjBJMQswCQYDVQQGEwJVUzEPMA0GA1UECgwGQW1hem9uMQwwCgYDVQQL\
DANBV1MxGzAZBgNVBAMMEmF3cy5uaXRyby1lbmNsYXZlczB2MBAGByqGSM49AgEG\
BSuBBAAiA2IABPwCVOumCMHzaHDimtqQvkY4MpJzbolL//Zy2YlES1BR5TSksfbb\
48C8WBoyt7F2Bw7eEtaaP+ohG2bnUs990d0JX28TcPQXCEPZ3BABIeTPYwEoCWZE\
h8l5YoQwTcU/9KNCMEAwDwYDVR0TAQH/BAUwAwEB/zAdBgNVHQ4EFgQUkCW1DdkF\
R+eWw5b6cp3PmanfS5YwDgYDVR0PAQH/BAQDAgGGMAoGCCqGSM49BAMDA2kAMGYC\
MQCjfy+Rocm9Xue4YnwWmNJVA44fA0P5W2OpYow9OYCVRaEevL8uO1XYru5xtMPW\
rfMCMQCi85sWBbJwKKXdS6BptQFuZbT73o/gBh1qUxl/nNr12UO8Yfwr6wPLb+6N\
IwLz3/Y=";

/// Attestation DocumentのCBORペイロード。
#[derive(Debug, Deserialize)]
pub struct AttestationDocument {
    /// Enclaveモジュール識別子
    pub module_id: String,
    /// ハッシュアルゴリズム（通常 "SHA384"）
    pub digest: String,
    /// 生成時刻（Unix ms）
    pub timestamp: u64,
    /// PCR値マップ（インデックス → 測定値）
    pub pcrs: BTreeMap<u32, ByteBuf>,
    /// リーフ証明書（DER）
    pub certificate: ByteBuf,
    /// 中間証明書（DER）。AWSの並びはルート側が先頭
    pub cabundle: Vec<ByteBuf>,
    /// Enclaveが要求時に指定した公開鍵。ノード識別子になる
    #[serde(default)]
    pub public_key: Option<ByteBuf>,
    #[serde(default)]
    pub user_data: Option<ByteBuf>,
    #[serde(default)]
    pub nonce: Option<ByteBuf>,
}

/// AWS Nitro検証器。
pub struct NitroVerifier {
    /// 信頼ルート証明書（DER）
    root_der: Vec<u8>,
}

impl NitroVerifier {
    /// AWS Nitro Attestation PKIルートを信頼する検証器。
    pub fn aws() -> Result<Self, AttestationError> {
        let root_der = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            AWS_NITRO_ROOT_CERT_B64,
        )
        .map_err(|e| AttestationError::Base64Error(e.to_string()))?;
        Ok(Self { root_der })
    }

    /// 任意のルート証明書（DER）を信頼する検証器。
    pub fn with_root(root_der: Vec<u8>) -> Self {
        Self { root_der }
    }

    /// 署名を検証せずにペイロードのみをパースする。
    pub fn parse_document(certificate: &[u8]) -> Result<AttestationDocument, AttestationError> {
        let cose_sign1 = coset::CoseSign1::from_slice(certificate)
            .map_err(|e| AttestationError::CoseParseError(format!("{e:?}")))?;
        decode_payload(&cose_sign1)
    }

    fn verify_chain(&self, leaf_der: &[u8], cabundle: &[ByteBuf]) -> Result<(), AttestationError> {
        let mut chain: Vec<&[u8]> = vec![leaf_der];
        chain.extend(
            cabundle
                .iter()
                .rev()
                .map(|c| c.as_slice())
                .filter(|c| *c != self.root_der.as_slice()),
        );
        chain.push(&self.root_der);

        let certs = chain
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                x509_cert::Certificate::from_der(bytes)
                    .map_err(|e| AttestationError::CertParseError(format!("chain[{i}]: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (i, pair) in certs.windows(2).enumerate() {
            verify_issued_by(&pair[0], &pair[1]).map_err(|e| {
                AttestationError::CertChainError(format!("証明書[{}]→[{}]の検証失敗: {}", i, i + 1, e))
            })?;
        }

        if let Some(root) = certs.last() {
            verify_issued_by(root, root).map_err(|e| {
                AttestationError::CertChainError(format!("ルート証明書の自己署名検証失敗: {e}"))
            })?;
        }
        Ok(())
    }
}

impl AttestationVerifier for NitroVerifier {
    fn tee_type(&self) -> &str {
        "aws_nitro"
    }

    fn verify(&self, certificate: &[u8]) -> Result<VerifiedIdentity, AttestationError> {
        let cose_sign1 = coset::CoseSign1::from_slice(certificate)
            .map_err(|e| AttestationError::CoseParseError(format!("{e:?}")))?;
        let doc = decode_payload(&cose_sign1)?;

        self.verify_chain(&doc.certificate, &doc.cabundle)?;

        let leaf_key = subject_key(
            &x509_cert::Certificate::from_der(&doc.certificate)
                .map_err(|e| AttestationError::CertParseError(format!("leaf: {e}")))?,
        )
        .map_err(AttestationError::CertParseError)?;

        cose_sign1.verify_signature(&[], |signature, tbs| {
            let signature = p384::ecdsa::Signature::from_slice(signature)
                .map_err(|_| AttestationError::SignatureVerificationFailed)?;
            leaf_key
                .verify(tbs, &signature)
                .map_err(|_| AttestationError::SignatureVerificationFailed)
        })?;

        let public_key = doc
            .public_key
            .filter(|pk| !pk.is_empty())
            .ok_or_else(|| AttestationError::MissingField("public_key".into()))?;

        Ok(VerifiedIdentity::new("aws_nitro", public_key.into_vec()))
    }
}

fn decode_payload(cose_sign1: &coset::CoseSign1) -> Result<AttestationDocument, AttestationError> {
    let payload = cose_sign1
        .payload
        .as_deref()
        .ok_or_else(|| AttestationError::MissingField("payload".into()))?;
    ciborium::from_reader(payload).map_err(|e| AttestationError::CborParseError(e.to_string()))
}

fn subject_key(cert: &x509_cert::Certificate) -> Result<p384::ecdsa::VerifyingKey, String> {
    let bits = cert
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .raw_bytes();
    p384::ecdsa::VerifyingKey::from_sec1_bytes(bits)
        .map_err(|e| format!("P-384公開鍵のパースに失敗: {e}"))
}

/// `child` が `parent` の鍵で署名されているか検証する。
fn verify_issued_by(
    child: &x509_cert::Certificate,
    parent: &x509_cert::Certificate,
) -> Result<(), String> {
    let key = subject_key(parent)?;
    let tbs_der = child
        .tbs_certificate
        .to_der()
        .map_err(|e| format!("TBSCertificateのDERエンコードに失敗: {e}"))?;
    let signature = p384::ecdsa::DerSignature::from_bytes(child.signature.raw_bytes())
        .map_err(|e| format!("ECDSA署名のデコードに失敗: {e}"))?;
    key.verify(&tbs_der, &signature)
        .map_err(|e| format!("署名検証に失敗: {e}"))
}
