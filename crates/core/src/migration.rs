//! # ジェネシス状態マイグレーション
//!
//! スキーマバージョン間の変換は純粋関数として定義し、入力をその場で書き換えない。
//! N回のアップグレードはN個の変換の合成になる。
//!
//! ## v1 → v2
//! - 登録レコードの証明書（生バイト列）を [`Certificate`] で包む
//! - `encrypted_seed` はそのままコピー
//! - `*_master_certificate` を [`MasterKey`] に包み、`*_master_key` にリネーム
//!
//! 証明書・シード・マスター鍵のペイロードはバイト単位で保存される。
//! 現行スキーマの文書を再投入した場合は `ShapeMismatch` としてアップグレードを止める。

use keyreg_types::genesis::{v1, v2};
use keyreg_types::{
    Certificate, EncryptedSeed, GenesisDocument, MasterKey, RegistrationNodeInfo,
    CURRENT_SCHEMA_VERSION,
};
use serde::Deserialize;

use crate::error::MigrationError;

/// v1のモジュール状態をv2に変換する。
pub fn migrate_v1_to_v2(old: v1::GenesisState) -> v2::GenesisState {
    let registration = old
        .registration
        .into_iter()
        .map(|legacy| RegistrationNodeInfo {
            certificate: Certificate::new(legacy.certificate),
            encrypted_seed: legacy.encrypted_seed.map(EncryptedSeed::new),
        })
        .collect();

    v2::GenesisState {
        registration,
        node_exch_master_key: Some(MasterKey::new(old.node_exch_master_certificate)),
        io_master_key: Some(MasterKey::new(old.io_master_certificate)),
    }
}

/// `schema_version` だけを先読みするためのヘッダ。
#[derive(Deserialize)]
struct VersionHeader {
    schema_version: u64,
}

fn read_version(raw: &[u8]) -> Result<u64, MigrationError> {
    serde_json::from_slice::<VersionHeader>(raw)
        .map(|header| header.schema_version)
        .map_err(|e| MigrationError::ShapeMismatch(format!("schema_versionを読めません: {e}")))
}

/// 旧スキーマのジェネシス文書（JSON）を現行スキーマに変換する。
///
/// 現行スキーマの文書は `ShapeMismatch` で拒否する。
pub fn migrate_document(raw: &[u8]) -> Result<GenesisDocument<v2::GenesisState>, MigrationError> {
    match read_version(raw)? {
        v if v == u64::from(v1::SCHEMA_VERSION) => {
            let old: GenesisDocument<v1::GenesisState> = serde_json::from_slice(raw)
                .map_err(|e| MigrationError::ShapeMismatch(e.to_string()))?;
            let migrated = migrate_v1_to_v2(old.registration);
            tracing::info!(
                from = v1::SCHEMA_VERSION,
                to = v2::SCHEMA_VERSION,
                registrations = migrated.registration.len(),
                "ジェネシス状態をマイグレーションしました"
            );
            Ok(GenesisDocument::current(migrated))
        }
        v if v == u64::from(CURRENT_SCHEMA_VERSION) => Err(MigrationError::ShapeMismatch(
            format!("既に現行スキーマ(v{CURRENT_SCHEMA_VERSION})です"),
        )),
        other => Err(MigrationError::UnsupportedVersion(other)),
    }
}

/// 起動時にジェネシス文書を読み込む。現行スキーマはそのまま、旧スキーマはマイグレーションする。
pub fn load_genesis_document(
    raw: &[u8],
) -> Result<GenesisDocument<v2::GenesisState>, MigrationError> {
    if read_version(raw)? == u64::from(CURRENT_SCHEMA_VERSION) {
        return serde_json::from_slice(raw)
            .map_err(|e| MigrationError::ShapeMismatch(e.to_string()));
    }
    migrate_document(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use v1::LegacyRegistrationNodeInfo;

    fn legacy_state(records: usize) -> v1::GenesisState {
        v1::GenesisState {
            registration: (0..records)
                .map(|i| LegacyRegistrationNodeInfo {
                    certificate: vec![i as u8, 0x00, 0xff, 0x10],
                    encrypted_seed: (i % 2 == 0).then(|| vec![0xaa, i as u8]),
                })
                .collect(),
            node_exch_master_certificate: vec![0xde, 0xad, 0xbe, 0xef],
            io_master_certificate: vec![0x00, 0x01],
        }
    }

    fn v1_json(state: &v1::GenesisState) -> Vec<u8> {
        serde_json::to_vec(&GenesisDocument {
            schema_version: v1::SCHEMA_VERSION,
            registration: state.clone(),
        })
        .unwrap()
    }

    #[test]
    fn test_migration_preserves_bytes_and_order() {
        let old = legacy_state(5);
        let new = migrate_v1_to_v2(old.clone());

        assert_eq!(new.registration.len(), 5);
        for (before, after) in old.registration.iter().zip(&new.registration) {
            assert_eq!(after.certificate.as_bytes(), before.certificate.as_slice());
            assert_eq!(
                after.encrypted_seed.as_ref().map(|s| s.as_bytes().to_vec()),
                before.encrypted_seed
            );
        }
        assert_eq!(new.node_exch_master_key, Some(MasterKey::new(vec![0xde, 0xad, 0xbe, 0xef])));
        assert_eq!(new.io_master_key, Some(MasterKey::new(vec![0x00, 0x01])));
    }

    #[test]
    fn test_migration_of_empty_state() {
        let old = v1::GenesisState {
            registration: vec![],
            node_exch_master_certificate: vec![],
            io_master_certificate: vec![],
        };
        let new = migrate_v1_to_v2(old);
        assert!(new.registration.is_empty());
        assert_eq!(new.io_master_key, Some(MasterKey::new(vec![])));
    }

    #[test]
    fn test_migrate_document_v1() {
        let doc = migrate_document(&v1_json(&legacy_state(3))).unwrap();
        assert_eq!(doc.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(doc.registration, migrate_v1_to_v2(legacy_state(3)));
    }

    /// マイグレーション済みの文書を再投入するとアップグレードを止める
    #[test]
    fn test_rerun_on_current_schema_is_shape_mismatch() {
        let migrated = migrate_document(&v1_json(&legacy_state(2))).unwrap();
        let raw = serde_json::to_vec(&migrated).unwrap();

        assert!(matches!(
            migrate_document(&raw),
            Err(MigrationError::ShapeMismatch(_))
        ));
    }

    /// バージョンタグが1でも中身がv2の形なら拒否する
    #[test]
    fn test_v2_body_under_v1_tag_is_shape_mismatch() {
        let migrated = migrate_document(&v1_json(&legacy_state(1))).unwrap();
        let mut value = serde_json::to_value(&migrated).unwrap();
        value["schema_version"] = 1.into();
        let raw = serde_json::to_vec(&value).unwrap();

        assert!(matches!(
            migrate_document(&raw),
            Err(MigrationError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let raw = br#"{"schema_version": 7, "registration": {}}"#;
        assert!(matches!(
            migrate_document(raw),
            Err(MigrationError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_garbage_input_is_shape_mismatch() {
        assert!(matches!(
            migrate_document(b"not json"),
            Err(MigrationError::ShapeMismatch(_))
        ));
        assert!(matches!(
            migrate_document(br#"{"registration": {}}"#),
            Err(MigrationError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_load_accepts_both_versions() {
        let from_v1 = load_genesis_document(&v1_json(&legacy_state(2))).unwrap();
        let raw_v2 = serde_json::to_vec(&from_v1).unwrap();
        let from_v2 = load_genesis_document(&raw_v2).unwrap();

        assert_eq!(from_v1, from_v2);
        assert!(matches!(
            load_genesis_document(br#"{"schema_version": 3, "registration": {}}"#),
            Err(MigrationError::UnsupportedVersion(3))
        ));
    }
}
