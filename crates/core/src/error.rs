//! # Coreエラー型

use keyreg_crypto::AttestationError;
use keyreg_types::{MasterKeyType, NodeId};

use crate::enclave::EnclaveError;

/// 登録Keeperのエラー型。
///
/// 失敗した操作はストアに何も書き込まない。
#[derive(Debug, thiserror::Error)]
pub enum KeeperError {
    /// Attestation証明書の検証に失敗（理由は区別しない）
    #[error("不正な証明書: {0}")]
    InvalidCertificate(#[from] AttestationError),
    /// set-onceポリシー下でマスター鍵が既に設定済み
    #[error("マスター鍵 {0} は既に設定されています")]
    AlreadyDefined(MasterKeyType),
    /// 照会対象が存在しない（ブートストラップ等、存在が前提の操作でのみ返す）
    #[error("見つかりません: {0}")]
    NotFound(String),
    /// ノードにシードが配布されていない
    #[error("ノード {0} は認証されていません")]
    NotAuthenticated(NodeId),
    /// エンクレーブ呼び出しに失敗
    #[error("エンクレーブ呼び出しに失敗: {0}")]
    Enclave(#[from] EnclaveError),
    /// 永続化レコードのエンコード・デコードに失敗
    #[error("レコードのコーデックエラー: {0}")]
    Codec(String),
    /// ジェネシス状態が不正
    #[error("ジェネシス状態が不正です: {0}")]
    InvalidGenesis(String),
}

/// ジェネシス状態マイグレーションのエラー型。
///
/// いずれもアップグレードを中断させる致命的エラー。部分的なマイグレーション結果は返さない。
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// 入力が期待する旧スキーマの形にデコードできない（現行スキーマの再投入を含む）
    #[error("旧スキーマの形と一致しません: {0}")]
    ShapeMismatch(String),
    /// マイグレーション経路が存在しないスキーマバージョン
    #[error("未対応のスキーマバージョン: {0}")]
    UnsupportedVersion(u64),
}
