//! # Keyreg 暗号処理
//!
//! エンクレーブノード登録で使用する検証処理を提供する。
//!
//! ## 提供機能
//! | 用途 | 実装 |
//! |------|------|
//! | Attestation検証 | [`attestation`]（AWS Nitro: COSE Sign1 + ES384、モック: Ed25519） |
//! | 証明書フィンガープリント | SHA-256 |
//!
//! 登録の書き込み経路で使う識別子は [`attestation::VerifiedIdentity`] からのみ得られる。

pub mod attestation;

use sha2::{Digest, Sha256};

pub use attestation::{verifier_for, AttestationError, AttestationVerifier, VerifiedIdentity};

/// SHA-256ハッシュ計算。
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// 証明書のフィンガープリント（SHA-256の16進数表現）。
/// ログに証明書全体を出さないために使う。
pub fn certificate_fingerprint(certificate: &[u8]) -> String {
    hex::encode(sha256(certificate))
}
