//! # Attestation証明書検証
//!
//! 登録トランザクションに含まれるAttestation証明書を検証し、ノードの公開識別子を取り出す。
//! 各TEE実装はサブモジュールとして配置される。
//!
//! ## 対応TEE種別
//!
//! | `tee_type` | サブモジュール | 証明書形式 | 識別子 |
//! |------------|--------------|-----------|--------|
//! | `aws_nitro` | [`nitro`] | COSE Sign1 + CBOR | `public_key` フィールド |
//! | `mock` | [`mock`] | JSON + Ed25519自己署名 | Ed25519公開鍵 |
//!
//! 検証失敗の理由（署名不正、形式不正、証明書チェーン不正）は呼び出し側では区別せず、
//! すべて不正な証明書として扱われる。

pub mod mock;
#[cfg(feature = "vendor-aws")]
pub mod nitro;

use keyreg_types::NodeId;

/// Attestation検証のエラー型。
/// 全TEE種別で共通。
#[derive(Debug, thiserror::Error)]
pub enum AttestationError {
    /// 未対応のTEE種別
    #[error("未対応のTEE種別: {0}")]
    UnsupportedTeeType(String),
    /// COSE Sign1のパースに失敗
    #[error("COSE Sign1のパースに失敗: {0}")]
    CoseParseError(String),
    /// CBORペイロードのパースに失敗
    #[error("CBORペイロードのパースに失敗: {0}")]
    CborParseError(String),
    /// 証明書チェーンの検証に失敗
    #[error("証明書チェーンの検証に失敗: {0}")]
    CertChainError(String),
    /// 署名検証に失敗
    #[error("署名検証に失敗")]
    SignatureVerificationFailed,
    /// 必須フィールドが見つからない
    #[error("必須フィールドが見つかりません: {0}")]
    MissingField(String),
    /// X.509証明書のパースに失敗
    #[error("証明書のパースに失敗: {0}")]
    CertParseError(String),
    /// Base64デコードに失敗
    #[error("Base64デコードに失敗: {0}")]
    Base64Error(String),
    /// 証明書の構造が不正（モック形式など）
    #[error("証明書の形式が不正です: {0}")]
    MalformedCertificate(String),
}

/// 検証済みのノード識別情報。
///
/// このクレートの検証器のみが構築できる。登録の書き込み経路は
/// この型からのみ [`NodeId`] を得るため、呼び出し側が任意の識別子を主張することはできない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    tee_type: &'static str,
    public_key: Vec<u8>,
}

impl VerifiedIdentity {
    pub(crate) fn new(tee_type: &'static str, public_key: Vec<u8>) -> Self {
        Self {
            tee_type,
            public_key,
        }
    }

    /// 検証したTEE種別。
    pub fn tee_type(&self) -> &str {
        self.tee_type
    }

    /// 証明書に埋め込まれていた公開識別鍵。
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// ストアキーとして使うノード識別子。
    pub fn node_id(&self) -> NodeId {
        NodeId::from_bytes(self.public_key.clone())
    }
}

/// Attestation検証器のトレイト。
///
/// 検証は決定的でなければならない。全バリデータが同じ証明書に対して同じ結果を得る前提で
/// 登録状態が複製される。
pub trait AttestationVerifier: Send + Sync {
    /// TEE種別を返す。
    fn tee_type(&self) -> &str;

    /// 証明書を検証し、埋め込まれた識別子を返す。
    fn verify(&self, certificate: &[u8]) -> Result<VerifiedIdentity, AttestationError>;
}

impl<T: AttestationVerifier + ?Sized> AttestationVerifier for Box<T> {
    fn tee_type(&self) -> &str {
        (**self).tee_type()
    }

    fn verify(&self, certificate: &[u8]) -> Result<VerifiedIdentity, AttestationError> {
        (**self).verify(certificate)
    }
}

impl<T: AttestationVerifier + ?Sized> AttestationVerifier for &T {
    fn tee_type(&self) -> &str {
        (**self).tee_type()
    }

    fn verify(&self, certificate: &[u8]) -> Result<VerifiedIdentity, AttestationError> {
        (**self).verify(certificate)
    }
}

/// `tee_type` に応じた検証器を構築する。
///
/// `aws_nitro` はAWS Nitro Attestation PKIルートを信頼の起点とする。
pub fn verifier_for(tee_type: &str) -> Result<Box<dyn AttestationVerifier>, AttestationError> {
    match tee_type {
        #[cfg(feature = "vendor-aws")]
        "aws_nitro" => Ok(Box::new(nitro::NitroVerifier::aws()?)),
        "mock" => Ok(Box::new(mock::MockVerifier)),
        other => Err(AttestationError::UnsupportedTeeType(other.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_for_known_types() {
        assert_eq!(verifier_for("mock").unwrap().tee_type(), "mock");
        #[cfg(feature = "vendor-aws")]
        assert_eq!(verifier_for("aws_nitro").unwrap().tee_type(), "aws_nitro");
    }

    #[test]
    fn test_verifier_for_unknown_type() {
        let err = verifier_for("intel_tdx").err().unwrap();
        assert!(matches!(err, AttestationError::UnsupportedTeeType(t) if t == "intel_tdx"));
    }

    #[test]
    fn test_identity_node_id() {
        let identity = VerifiedIdentity::new("mock", vec![0xaa, 0xbb]);
        assert_eq!(identity.node_id().to_hex(), "aabb");
        assert_eq!(identity.tee_type(), "mock");
    }
}
