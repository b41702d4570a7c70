//! # Keyreg 共有型定義
//!
//! エンクレーブノード登録モジュールが永続化・返却するデータ構造を提供する。
//!
//! ## エンコーディング規則
//! - Hex: `NodeId`（ストアキーと一致させるため小文字16進数）
//! - Base64: バイナリデータ（証明書、暗号化シード、マスター鍵）
//!
//! バイナリ形式（bincode等）ではどちらも生のバイト列としてシリアライズされる。

pub mod encoding;
pub mod genesis;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use genesis::{GenesisDocument, GenesisState, CURRENT_SCHEMA_VERSION};

// ---------------------------------------------------------------------------
// ノード識別子
// ---------------------------------------------------------------------------

/// 登録ノードの公開識別子。
///
/// 検証済みのAttestation証明書から導出される公開鍵バイト列。
/// 等価性はバイト列の一致で判定し、ストアキーとしてそのまま使用する。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(Vec<u8>);

impl NodeId {
    /// バイト列からNodeIdを構築する。
    ///
    /// 照会用途のためのコンストラクタ。登録の書き込み経路では
    /// 証明書検証の結果からのみNodeIdを得る。
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// 小文字16進数表現。
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for NodeId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(s).map(Self)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            serde_bytes::ByteBuf::deserialize(deserializer).map(|b| Self(b.into_vec()))
        }
    }
}

// ---------------------------------------------------------------------------
// 登録レコード
// ---------------------------------------------------------------------------

/// リモートAttestation証明書（現行の汎用ラッパー）。
///
/// 旧スキーマでは生のバイト列として保持されていた。中身のバイト列は
/// 監査と`NodeId`の再導出のためにそのまま保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Certificate(#[serde(with = "encoding::base64_bytes")] Vec<u8>);

impl Certificate {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// ノードのブートストラップ用シード（暗号化済み）。
///
/// 対応するエンクレーブ識別鍵の保持者のみが復号できる。内容はこのモジュールにとって不透明。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedSeed(#[serde(with = "encoding::base64_bytes")] Vec<u8>);

impl EncryptedSeed {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 登録ノード1件分のレコード。
///
/// ストアキーは`certificate`から導出した`NodeId`であり、呼び出し側が指定することはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationNodeInfo {
    /// Attestation証明書
    pub certificate: Certificate,
    /// 暗号化シード。ネットワークがシードを配布するまでは`None`
    #[serde(default)]
    pub encrypted_seed: Option<EncryptedSeed>,
}

impl RegistrationNodeInfo {
    /// シード未配布の登録レコードを構築する。
    pub fn new(certificate: Certificate) -> Self {
        Self {
            certificate,
            encrypted_seed: None,
        }
    }

    pub fn with_seed(certificate: Certificate, encrypted_seed: EncryptedSeed) -> Self {
        Self {
            certificate,
            encrypted_seed: Some(encrypted_seed),
        }
    }

    /// 空でない暗号化シードが付与されているか。
    pub fn is_provisioned(&self) -> bool {
        self.encrypted_seed
            .as_ref()
            .map_or(false, |seed| !seed.is_empty())
    }
}

// ---------------------------------------------------------------------------
// マスター鍵
// ---------------------------------------------------------------------------

/// ネットワーク共通のマスター鍵（公開鍵・証明書blob）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterKey {
    #[serde(with = "encoding::base64_bytes")]
    pub bytes: Vec<u8>,
}

impl MasterKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

/// マスター鍵の種別。シングルトンはこの2種類のみ存在する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MasterKeyType {
    /// ノード間セキュアチャネルのブートストラップ用
    #[serde(rename = "node_exch")]
    NodeExchange,
    /// コントラクト入出力の暗号化用
    #[serde(rename = "io")]
    Io,
}

impl MasterKeyType {
    pub const ALL: [MasterKeyType; 2] = [MasterKeyType::NodeExchange, MasterKeyType::Io];

    /// ストアキーに埋め込むタグ。
    pub fn tag(self) -> &'static str {
        match self {
            MasterKeyType::NodeExchange => "node_exch",
            MasterKeyType::Io => "io",
        }
    }
}

impl fmt::Display for MasterKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// 未知のマスター鍵種別タグ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMasterKeyType(pub String);

impl fmt::Display for UnknownMasterKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知のマスター鍵種別: {}", self.0)
    }
}

impl std::error::Error for UnknownMasterKeyType {}

impl FromStr for MasterKeyType {
    type Err = UnknownMasterKeyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node_exch" | "node-exch" => Ok(MasterKeyType::NodeExchange),
            "io" => Ok(MasterKeyType::Io),
            other => Err(UnknownMasterKeyType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ブートストラップ
// ---------------------------------------------------------------------------

/// ノードがエンクレーブの`load_seed`に渡す入力一式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapMaterial {
    /// 当該ノード宛ての暗号化シード
    pub encrypted_seed: EncryptedSeed,
    /// ノード間鍵交換用マスター鍵
    pub node_exch_master_key: MasterKey,
    /// 入出力暗号化用マスター鍵
    pub io_master_key: MasterKey,
}

// ---------------------------------------------------------------------------
// API リクエスト/レスポンス
// ---------------------------------------------------------------------------

/// /register リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Attestation証明書
    pub certificate: Certificate,
}

/// /register レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// 証明書から導出されたノード識別子
    pub node_id: NodeId,
    /// 登録ノード宛ての暗号化シード
    pub encrypted_seed: EncryptedSeed,
}

/// /authenticated レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationStatus {
    pub node_id: NodeId,
    pub authenticated: bool,
}

/// 一覧取得の1エントリ。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationEntry {
    pub node_id: NodeId,
    pub info: RegistrationNodeInfo,
}

/// /registrations レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationList {
    /// キー昇順の登録レコード
    pub registrations: Vec<RegistrationEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_hex_roundtrip() {
        let id = NodeId::from_bytes(vec![0xaa, 0x01, 0xff]);
        assert_eq!(id.to_string(), "aa01ff");
        assert_eq!("aa01ff".parse::<NodeId>().unwrap(), id);
        assert_eq!("0xaa01ff".parse::<NodeId>().unwrap(), id);
        assert!("zz".parse::<NodeId>().is_err());
    }

    /// JSONではbase64/hex、bincodeでは生バイト列になることを確認
    #[test]
    fn test_human_readable_and_binary_encodings() {
        let info = RegistrationNodeInfo::with_seed(
            Certificate::new(vec![1, 2, 3]),
            EncryptedSeed::new(vec![4, 5]),
        );

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["certificate"], "AQID");
        assert_eq!(json["encrypted_seed"], "BAU=");

        let bin = bincode::serialize(&info).unwrap();
        let decoded: RegistrationNodeInfo = bincode::deserialize(&bin).unwrap();
        assert_eq!(decoded, info);

        let id = NodeId::from_bytes(vec![0xab; 4]);
        assert_eq!(serde_json::to_value(&id).unwrap(), "abababab");
    }

    #[test]
    fn test_missing_seed_defaults_to_none() {
        let info: RegistrationNodeInfo =
            serde_json::from_str(r#"{"certificate":"AQID"}"#).unwrap();
        assert_eq!(info.encrypted_seed, None);
        assert!(!info.is_provisioned());
    }

    #[test]
    fn test_is_provisioned_requires_non_empty_seed() {
        let cert = Certificate::new(vec![9]);
        assert!(!RegistrationNodeInfo::new(cert.clone()).is_provisioned());
        assert!(!RegistrationNodeInfo::with_seed(cert.clone(), EncryptedSeed::new(vec![]))
            .is_provisioned());
        assert!(RegistrationNodeInfo::with_seed(cert, EncryptedSeed::new(vec![1])).is_provisioned());
    }

    #[test]
    fn test_master_key_type_tags() {
        assert_eq!(MasterKeyType::NodeExchange.tag(), "node_exch");
        assert_eq!(MasterKeyType::Io.tag(), "io");
        assert_eq!("node-exch".parse::<MasterKeyType>().unwrap(), MasterKeyType::NodeExchange);
        assert_eq!("io".parse::<MasterKeyType>().unwrap(), MasterKeyType::Io);
        assert!("tx".parse::<MasterKeyType>().is_err());
        assert_eq!(serde_json::to_value(MasterKeyType::Io).unwrap(), "io");
    }
}
