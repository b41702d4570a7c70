//! テスト用の共通ヘルパー

use std::sync::atomic::{AtomicU64, Ordering};

use ed25519_dalek::SigningKey;
use keyreg_crypto::attestation::mock::{issue_mock_certificate_with_nonce, MockVerifier};
use keyreg_types::{Certificate, EncryptedSeed, NodeId};

use crate::enclave::{EnclaveApi, EnclaveError};
use crate::keeper::RegistrationKeeper;
use crate::store::MemoryStore;

pub fn test_keeper() -> RegistrationKeeper<MemoryStore, MockVerifier> {
    RegistrationKeeper::new(MemoryStore::new(), MockVerifier)
}

/// 新しいモックノードの証明書とNodeIdを生成する
pub fn new_node() -> (Certificate, NodeId) {
    let (_, cert, id) = new_node_with_key();
    (cert, id)
}

pub fn new_node_with_key() -> (SigningKey, Certificate, NodeId) {
    let key = SigningKey::generate(&mut rand::rngs::OsRng);
    let cert = reissue(&key);
    let id = NodeId::from_bytes(key.verifying_key().to_bytes().to_vec());
    (key, cert, id)
}

static NEXT_NONCE: AtomicU64 = AtomicU64::new(1);

/// 同じ鍵で証明書を発行し直す。呼び出しごとにバイト列の異なる証明書になる
pub fn reissue(key: &SigningKey) -> Certificate {
    let nonce = NEXT_NONCE.fetch_add(1, Ordering::Relaxed);
    Certificate::new(issue_mock_certificate_with_nonce(key, nonce).unwrap())
}

pub fn seed(bytes: &[u8]) -> EncryptedSeed {
    EncryptedSeed::new(bytes.to_vec())
}

/// 常に同じシードを返すエンクレーブ
pub struct FixedSeedEnclave(pub Vec<u8>);

impl EnclaveApi for FixedSeedEnclave {
    fn load_seed(&self, _: &[u8], _: &[u8], _: &[u8]) -> Result<(), EnclaveError> {
        Ok(())
    }

    fn get_encrypted_seed(&self, _: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        Ok(self.0.clone())
    }

    fn get_encrypted_genesis_seed(&self, _: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        Ok(self.0.clone())
    }
}

/// 全呼び出しが失敗するエンクレーブ
pub struct FailingEnclave;

impl EnclaveApi for FailingEnclave {
    fn load_seed(&self, _: &[u8], _: &[u8], _: &[u8]) -> Result<(), EnclaveError> {
        Err(EnclaveError::SeedRejected("failing".into()))
    }

    fn get_encrypted_seed(&self, _: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        Err(EnclaveError::Call("failing".into()))
    }

    fn get_encrypted_genesis_seed(&self, _: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        Err(EnclaveError::Call("failing".into()))
    }
}
