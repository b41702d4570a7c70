//! # 登録Keeper
//!
//! Identity & Key Storeへの読み書きをすべて担い、不変条件を守る。
//!
//! ## 不変条件
//! - 登録レコードのストアキーは、Keeperが検証済み証明書から導出した `NodeId` のみ。
//!   呼び出し側がキーを指定する書き込み経路は存在しない。
//! - 検証に失敗した書き込みはストアを一切変更せず、`InvalidCertificate` を返す。
//! - 不在は正常な結果（`None` / `false`）として返す。
//!
//! 各操作はチェーンの決定的な状態遷移の中で1トランザクションずつ実行される前提のため、
//! Keeperは内部でロックを取らない。

use keyreg_crypto::{certificate_fingerprint, AttestationVerifier};
use keyreg_types::{
    BootstrapMaterial, Certificate, EncryptedSeed, MasterKey, MasterKeyType, NodeId,
    RegistrationNodeInfo,
};

use crate::codec;
use crate::enclave::EnclaveApi;
use crate::error::KeeperError;
use crate::keys;
use crate::store::KvStore;

/// マスター鍵の書き込みポリシー。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MasterKeyPolicy {
    /// 無条件に上書きする。set-onceは上位層が `is_master_key_defined` で判断する
    #[default]
    Overwrite,
    /// 設定済みの種別への書き込みを `AlreadyDefined` で拒否する
    SetOnce,
}

impl std::str::FromStr for MasterKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overwrite" => Ok(MasterKeyPolicy::Overwrite),
            "set-once" | "set_once" => Ok(MasterKeyPolicy::SetOnce),
            other => Err(format!("未知のマスター鍵ポリシー: {other}")),
        }
    }
}

/// 登録Keeper。
///
/// ストアと検証器は構築時に注入され、Keeperごとに独立している。
pub struct RegistrationKeeper<S, V> {
    store: S,
    verifier: V,
    master_key_policy: MasterKeyPolicy,
}

impl<S: KvStore, V: AttestationVerifier> RegistrationKeeper<S, V> {
    pub fn new(store: S, verifier: V) -> Self {
        Self {
            store,
            verifier,
            master_key_policy: MasterKeyPolicy::default(),
        }
    }

    pub fn with_master_key_policy(mut self, policy: MasterKeyPolicy) -> Self {
        self.master_key_policy = policy;
        self
    }

    pub fn master_key_policy(&self) -> MasterKeyPolicy {
        self.master_key_policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    // -----------------------------------------------------------------------
    // マスター鍵
    // -----------------------------------------------------------------------

    /// マスター鍵を取得する。未設定なら `None`。
    pub fn get_master_key(&self, key_type: MasterKeyType) -> Result<Option<MasterKey>, KeeperError> {
        self.store
            .get(&keys::master_key_key(key_type))
            .map(|bytes| codec::decode(&bytes))
            .transpose()
    }

    /// マスター鍵を書き込む。
    ///
    /// `Overwrite` ポリシーでは無条件に上書きする。`SetOnce` では設定済みなら `AlreadyDefined`。
    pub fn set_master_key(
        &mut self,
        key: MasterKey,
        key_type: MasterKeyType,
    ) -> Result<(), KeeperError> {
        if self.master_key_policy == MasterKeyPolicy::SetOnce && self.is_master_key_defined(key_type)
        {
            return Err(KeeperError::AlreadyDefined(key_type));
        }
        self.store
            .set(&keys::master_key_key(key_type), codec::encode(&key)?);
        tracing::info!(key_type = %key_type, len = key.bytes.len(), "マスター鍵を設定しました");
        Ok(())
    }

    /// マスター鍵が設定済みか。
    pub fn is_master_key_defined(&self, key_type: MasterKeyType) -> bool {
        self.store.get(&keys::master_key_key(key_type)).is_some()
    }

    // -----------------------------------------------------------------------
    // 登録レコード
    // -----------------------------------------------------------------------

    /// 登録レコードを取得する。未登録なら `None`。
    pub fn get_registration_info(
        &self,
        node_id: &NodeId,
    ) -> Result<Option<RegistrationNodeInfo>, KeeperError> {
        self.store
            .get(&keys::registration_key(node_id))
            .map(|bytes| codec::decode(&bytes))
            .transpose()
    }

    /// 全登録レコードをキー昇順で訪問する。
    ///
    /// `visit` が `true` を返した時点で列挙を打ち切る。
    pub fn list_registration_info<F>(&self, mut visit: F) -> Result<(), KeeperError>
    where
        F: FnMut(&NodeId, RegistrationNodeInfo) -> bool,
    {
        for (key, value) in self.store.iter_prefix(keys::REGISTRATION_STORE_PREFIX) {
            let node_id = keys::node_id_from_registration_key(&key).ok_or_else(|| {
                KeeperError::Codec("登録名前空間外のキーが返されました".into())
            })?;
            let info: RegistrationNodeInfo = codec::decode(&value)?;
            if visit(&node_id, info) {
                break;
            }
        }
        Ok(())
    }

    /// 登録レコード数。
    pub fn registration_count(&self) -> Result<usize, KeeperError> {
        let mut count = 0;
        self.list_registration_info(|_, _| {
            count += 1;
            false
        })?;
        Ok(count)
    }

    /// 証明書を検証し、導出した `NodeId` をキーとしてレコードを書き込む。
    ///
    /// 既存レコードは無条件に置き換える。`encrypted_seed` を渡さなければ
    /// 以前のシードも消える。検証失敗時は何も書き込まず `InvalidCertificate` を返す。
    pub fn set_registration_info(
        &mut self,
        info: RegistrationNodeInfo,
    ) -> Result<NodeId, KeeperError> {
        let identity = match self.verifier.verify(info.certificate.as_bytes()) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(
                    cert_fingerprint = %certificate_fingerprint(info.certificate.as_bytes()),
                    error = %e,
                    "証明書の検証に失敗したため登録を拒否しました"
                );
                return Err(KeeperError::InvalidCertificate(e));
            }
        };

        let node_id = identity.node_id();
        self.store
            .set(&keys::registration_key(&node_id), codec::encode(&info)?);
        tracing::info!(
            node_id = %node_id,
            tee_type = identity.tee_type(),
            provisioned = info.is_provisioned(),
            "ノード登録レコードを書き込みました"
        );
        Ok(node_id)
    }

    /// ノードが認証済み（空でないシードが配布済み）か。
    pub fn is_node_authenticated(&self, node_id: &NodeId) -> Result<bool, KeeperError> {
        Ok(self
            .get_registration_info(node_id)?
            .map_or(false, |info| info.is_provisioned()))
    }

    // -----------------------------------------------------------------------
    // トランザクション処理
    // -----------------------------------------------------------------------

    /// 登録トランザクションを処理し、導出した `NodeId` とノード宛ての暗号化シードを返す。
    ///
    /// 1. 証明書を検証して `NodeId` を導出
    /// 2. 既に認証済みなら保存済みのシードを返す（書き込みなし）
    /// 3. エンクレーブにシードを生成させ、証明書と一緒に保存
    pub fn register_node(
        &mut self,
        certificate: Certificate,
        enclave: &dyn EnclaveApi,
    ) -> Result<(NodeId, EncryptedSeed), KeeperError> {
        let node_id = self.verifier.verify(certificate.as_bytes())?.node_id();

        if let Some(existing) = self.get_registration_info(&node_id)? {
            if let Some(seed) = existing.encrypted_seed.filter(|seed| !seed.is_empty()) {
                tracing::info!(node_id = %node_id, "認証済みノードの再登録。保存済みシードを返します");
                return Ok((node_id, seed));
            }
        }

        let seed = EncryptedSeed::new(enclave.get_encrypted_seed(certificate.as_bytes())?);
        self.set_registration_info(RegistrationNodeInfo::with_seed(certificate, seed.clone()))?;
        Ok((node_id, seed))
    }

    /// ネットワークの最初のノードとしてマスター鍵と自身の登録を確立する。
    ///
    /// どちらかのマスター鍵が設定済みなら `AlreadyDefined`（先勝ち）。
    /// 検証とシード生成が成功するまでストアには書き込まない。
    pub fn bootstrap_network(
        &mut self,
        certificate: Certificate,
        node_exch_master_key: MasterKey,
        io_master_key: MasterKey,
        enclave: &dyn EnclaveApi,
    ) -> Result<NodeId, KeeperError> {
        if let Some(defined) = MasterKeyType::ALL
            .into_iter()
            .find(|key_type| self.is_master_key_defined(*key_type))
        {
            return Err(KeeperError::AlreadyDefined(defined));
        }

        let identity = self.verifier.verify(certificate.as_bytes())?;
        let seed = EncryptedSeed::new(enclave.get_encrypted_genesis_seed(identity.public_key())?);

        self.set_master_key(node_exch_master_key, MasterKeyType::NodeExchange)?;
        self.set_master_key(io_master_key, MasterKeyType::Io)?;
        let node_id =
            self.set_registration_info(RegistrationNodeInfo::with_seed(certificate, seed))?;
        tracing::info!(node_id = %node_id, "ネットワークをブートストラップしました");
        Ok(node_id)
    }

    /// ノードがエンクレーブを初期化するための入力一式を返す。
    pub fn bootstrap_material(&self, node_id: &NodeId) -> Result<BootstrapMaterial, KeeperError> {
        let encrypted_seed = self
            .get_registration_info(node_id)?
            .and_then(|info| info.encrypted_seed)
            .filter(|seed| !seed.is_empty())
            .ok_or_else(|| KeeperError::NotAuthenticated(node_id.clone()))?;

        Ok(BootstrapMaterial {
            encrypted_seed,
            node_exch_master_key: self.require_master_key(MasterKeyType::NodeExchange)?,
            io_master_key: self.require_master_key(MasterKeyType::Io)?,
        })
    }

    fn require_master_key(&self, key_type: MasterKeyType) -> Result<MasterKey, KeeperError> {
        self.get_master_key(key_type)?
            .ok_or_else(|| KeeperError::NotFound(format!("マスター鍵 {key_type}")))
    }
}
