//! # エンクレーブ抽象化
//!
//! ノードのエンクレーブが提供するシード関連の呼び出しを抽象化するトレイト。
//! シードの復号や作業鍵の導出はエンクレーブ内部で行われ、このモジュールは関与しない。
//!
//! 現在の実装:
//! - [`MockEnclaveApi`] — ローカル開発・テスト用（常に成功し、空のペイロードを返す）

use keyreg_types::BootstrapMaterial;

/// エンクレーブ呼び出しのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum EnclaveError {
    /// エンクレーブがシードの読み込みを拒否した
    #[error("シードの読み込みを拒否されました: {0}")]
    SeedRejected(String),
    /// エンクレーブ呼び出しそのものの失敗
    #[error("エンクレーブ呼び出しに失敗: {0}")]
    Call(String),
}

/// エンクレーブのシード関連APIのトレイト。
pub trait EnclaveApi: Send + Sync {
    /// 暗号化シードとマスター鍵を読み込み、エンクレーブの秘密状態を初期化する。
    fn load_seed(
        &self,
        encrypted_seed: &[u8],
        node_exch_master_key: &[u8],
        io_master_key: &[u8],
    ) -> Result<(), EnclaveError>;

    /// 新規ノードの証明書に対して、そのノード宛ての暗号化シードを生成する。
    fn get_encrypted_seed(&self, certificate: &[u8]) -> Result<Vec<u8>, EnclaveError>;

    /// ネットワークを立ち上げるノード自身の暗号化ジェネシスシードを生成する。
    fn get_encrypted_genesis_seed(&self, public_key: &[u8]) -> Result<Vec<u8>, EnclaveError>;
}

impl<T: EnclaveApi + ?Sized> EnclaveApi for Box<T> {
    fn load_seed(
        &self,
        encrypted_seed: &[u8],
        node_exch_master_key: &[u8],
        io_master_key: &[u8],
    ) -> Result<(), EnclaveError> {
        (**self).load_seed(encrypted_seed, node_exch_master_key, io_master_key)
    }

    fn get_encrypted_seed(&self, certificate: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        (**self).get_encrypted_seed(certificate)
    }

    fn get_encrypted_genesis_seed(&self, public_key: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        (**self).get_encrypted_genesis_seed(public_key)
    }
}

/// エンクレーブなしでテストを実行するためのモック。
#[derive(Debug, Clone, Copy, Default)]
pub struct MockEnclaveApi;

impl EnclaveApi for MockEnclaveApi {
    fn load_seed(&self, _: &[u8], _: &[u8], _: &[u8]) -> Result<(), EnclaveError> {
        Ok(())
    }

    fn get_encrypted_seed(&self, _: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        Ok(Vec::new())
    }

    fn get_encrypted_genesis_seed(&self, _: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        Ok(Vec::new())
    }
}

/// チェーンから取得したブートストラップ入力をエンクレーブに読み込ませる。
pub fn load_bootstrap_material(
    enclave: &dyn EnclaveApi,
    material: &BootstrapMaterial,
) -> Result<(), EnclaveError> {
    enclave.load_seed(
        material.encrypted_seed.as_bytes(),
        &material.node_exch_master_key.bytes,
        &material.io_master_key.bytes,
    )?;
    tracing::info!("エンクレーブにシードとマスター鍵を読み込みました");
    Ok(())
}
