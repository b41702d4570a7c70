//! # ジェネシス状態
//!
//! 登録モジュール全体のスナップショット。スキーマバージョンごとに別の型として定義し、
//! バージョン間の変換は `keyreg-core` のマイグレーションで行う。
//!
//! | `schema_version` | モジュール | 主な差分 |
//! |------------------|-----------|---------|
//! | 1 | [`v1`] | 証明書は生バイト列、マスター鍵は `*_master_certificate` |
//! | 2 | [`v2`] | 証明書は [`Certificate`](crate::Certificate)、マスター鍵は [`MasterKey`](crate::MasterKey) |

use serde::{Deserialize, Serialize};

pub use v2::GenesisState;

/// 現行のスキーマバージョン。
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// バージョンタグ付きのジェネシス文書。
///
/// ```json
/// { "schema_version": 2, "registration": { ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisDocument<S> {
    /// `registration` の形を決めるスキーマバージョン
    pub schema_version: u32,
    /// 登録モジュールの状態
    pub registration: S,
}

impl GenesisDocument<GenesisState> {
    /// 現行スキーマの文書を構築する。
    pub fn current(registration: GenesisState) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            registration,
        }
    }
}

/// 旧スキーマ（v1）。
pub mod v1 {
    use serde::{Deserialize, Serialize};

    use crate::encoding;

    pub const SCHEMA_VERSION: u32 = 1;

    /// v1の登録レコード。証明書はバージョン固有の生バイト列。
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct LegacyRegistrationNodeInfo {
        #[serde(with = "encoding::base64_bytes")]
        pub certificate: Vec<u8>,
        #[serde(default, with = "encoding::base64_bytes_opt")]
        pub encrypted_seed: Option<Vec<u8>>,
    }

    /// v1のモジュール状態。
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct GenesisState {
        pub registration: Vec<LegacyRegistrationNodeInfo>,
        #[serde(with = "encoding::base64_bytes")]
        pub node_exch_master_certificate: Vec<u8>,
        #[serde(with = "encoding::base64_bytes")]
        pub io_master_certificate: Vec<u8>,
    }
}

/// 現行スキーマ（v2）。
pub mod v2 {
    use serde::{Deserialize, Serialize};

    use crate::{MasterKey, RegistrationNodeInfo};

    pub const SCHEMA_VERSION: u32 = 2;

    /// v2のモジュール状態。
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct GenesisState {
        /// 登録レコード（エクスポート時はキー昇順）
        pub registration: Vec<RegistrationNodeInfo>,
        /// ノード間鍵交換用マスター鍵
        #[serde(default)]
        pub node_exch_master_key: Option<MasterKey>,
        /// 入出力暗号化用マスター鍵
        #[serde(default)]
        pub io_master_key: Option<MasterKey>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_rejects_v2_shape() {
        let v2_body = serde_json::json!({
            "registration": [],
            "node_exch_master_key": { "bytes": "AQ==" },
            "io_master_key": { "bytes": "Ag==" }
        });
        assert!(serde_json::from_value::<v1::GenesisState>(v2_body).is_err());
    }

    #[test]
    fn test_v1_document_parses() {
        let doc = serde_json::json!({
            "schema_version": 1,
            "registration": {
                "registration": [
                    { "certificate": "AQID", "encrypted_seed": null },
                    { "certificate": "BAU=", "encrypted_seed": "Bg==" }
                ],
                "node_exch_master_certificate": "Bw==",
                "io_master_certificate": "CA=="
            }
        });
        let parsed: GenesisDocument<v1::GenesisState> = serde_json::from_value(doc).unwrap();
        assert_eq!(parsed.schema_version, 1);
        assert_eq!(parsed.registration.registration.len(), 2);
        assert_eq!(parsed.registration.registration[0].encrypted_seed, None);
        assert_eq!(parsed.registration.registration[1].encrypted_seed, Some(vec![6]));
        assert_eq!(parsed.registration.io_master_certificate, vec![8]);
    }
}
