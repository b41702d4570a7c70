//! # inspect
//!
//! ジェネシス文書を新しいKeeperに読み込み、その結果を表示する。
//! v1の文書はマイグレーションしてから読み込む。

use std::fmt::Write;

use keyreg_core::{init_genesis, load_genesis_document, MemoryStore, RegistrationKeeper};
use keyreg_crypto::AttestationVerifier;
use keyreg_types::MasterKeyType;

/// 表示用のテキストを返す。
pub fn run(raw: &[u8], verifier: Box<dyn AttestationVerifier>) -> anyhow::Result<String> {
    let document = load_genesis_document(raw)?;
    let mut keeper = RegistrationKeeper::new(MemoryStore::new(), verifier);
    init_genesis(&mut keeper, &document.registration)?;

    let mut out = String::new();
    writeln!(out, "schema_version: {}", document.schema_version)?;
    for key_type in MasterKeyType::ALL {
        let status = if keeper.is_master_key_defined(key_type) {
            "defined"
        } else {
            "unset"
        };
        writeln!(out, "master_key[{key_type}]: {status}")?;
    }

    let mut lines = Vec::new();
    keeper.list_registration_info(|node_id, info| {
        lines.push(format!(
            "{node_id} authenticated={}",
            info.is_provisioned()
        ));
        false
    })?;
    writeln!(out, "registrations: {}", lines.len())?;
    for line in lines {
        writeln!(out, "  {line}")?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use keyreg_crypto::attestation::mock::{issue_mock_certificate, MockVerifier};
    use keyreg_types::{
        Certificate, EncryptedSeed, GenesisDocument, GenesisState, MasterKey, NodeId,
        RegistrationNodeInfo,
    };

    #[test]
    fn test_inspect_reports_nodes_and_keys() {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let cert = Certificate::new(issue_mock_certificate(&key).unwrap());
        let node_id = NodeId::from_bytes(key.verifying_key().to_bytes().to_vec());
        let doc = GenesisDocument::current(GenesisState {
            registration: vec![RegistrationNodeInfo::with_seed(cert, EncryptedSeed::new(vec![1]))],
            node_exch_master_key: Some(MasterKey::new(vec![1])),
            io_master_key: None,
        });

        let report = run(&serde_json::to_vec(&doc).unwrap(), Box::new(MockVerifier)).unwrap();

        assert!(report.contains("master_key[node_exch]: defined"));
        assert!(report.contains("master_key[io]: unset"));
        assert!(report.contains("registrations: 1"));
        assert!(report.contains(&format!("{node_id} authenticated=true")));
    }

    #[test]
    fn test_inspect_rejects_unverifiable_record() {
        let doc = GenesisDocument::current(GenesisState {
            registration: vec![RegistrationNodeInfo::new(Certificate::new(vec![0xff]))],
            ..Default::default()
        });
        assert!(run(&serde_json::to_vec(&doc).unwrap(), Box::new(MockVerifier)).is_err());
    }
}
