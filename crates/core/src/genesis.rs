//! # ジェネシス初期化・エクスポート
//!
//! 現行スキーマ（v2）のジェネシス状態とKeeperの間の変換。
//! 初期化時も登録レコードは `set_registration_info` を通すため、
//! ストアキーは証明書から再導出され、検証も適用される。

use keyreg_crypto::AttestationVerifier;
use keyreg_types::{GenesisState, MasterKeyType};

use crate::error::KeeperError;
use crate::keeper::{MasterKeyPolicy, RegistrationKeeper};
use crate::store::KvStore;

/// ジェネシス状態をKeeperに読み込む。
///
/// 全レコードの証明書検証とマスター鍵ポリシーの確認を先に済ませ、
/// いずれかが失敗した場合はストアに何も書き込まない。
pub fn init_genesis<S: KvStore, V: AttestationVerifier>(
    keeper: &mut RegistrationKeeper<S, V>,
    state: &GenesisState,
) -> Result<(), KeeperError> {
    validate_genesis(state)?;
    preflight(keeper, state)?;

    if let Some(key) = &state.node_exch_master_key {
        keeper.set_master_key(key.clone(), MasterKeyType::NodeExchange)?;
    }
    if let Some(key) = &state.io_master_key {
        keeper.set_master_key(key.clone(), MasterKeyType::Io)?;
    }
    for info in &state.registration {
        keeper.set_registration_info(info.clone())?;
    }

    tracing::info!(
        registrations = state.registration.len(),
        "ジェネシス状態を読み込みました"
    );
    Ok(())
}

/// 書き込み前の検査。`set_master_key` / `set_registration_info` が失敗する条件を先に確認する。
fn preflight<S: KvStore, V: AttestationVerifier>(
    keeper: &RegistrationKeeper<S, V>,
    state: &GenesisState,
) -> Result<(), KeeperError> {
    if keeper.master_key_policy() == MasterKeyPolicy::SetOnce {
        let present = [
            (MasterKeyType::NodeExchange, state.node_exch_master_key.is_some()),
            (MasterKeyType::Io, state.io_master_key.is_some()),
        ];
        if let Some((key_type, _)) = present
            .into_iter()
            .find(|(key_type, present)| *present && keeper.is_master_key_defined(*key_type))
        {
            return Err(KeeperError::AlreadyDefined(key_type));
        }
    }

    for (index, info) in state.registration.iter().enumerate() {
        keeper
            .verifier()
            .verify(info.certificate.as_bytes())
            .map_err(|e| {
                tracing::warn!(index, error = %e, "ジェネシスの登録レコードを検証できません");
                KeeperError::InvalidCertificate(e)
            })?;
    }
    Ok(())
}

/// Keeperの全状態をジェネシス状態として書き出す。登録レコードはキー昇順。
pub fn export_genesis<S: KvStore, V: AttestationVerifier>(
    keeper: &RegistrationKeeper<S, V>,
) -> Result<GenesisState, KeeperError> {
    let mut registration = Vec::new();
    keeper.list_registration_info(|_, info| {
        registration.push(info);
        false
    })?;

    Ok(GenesisState {
        registration,
        node_exch_master_key: keeper.get_master_key(MasterKeyType::NodeExchange)?,
        io_master_key: keeper.get_master_key(MasterKeyType::Io)?,
    })
}

/// ジェネシス状態の静的検証。
pub fn validate_genesis(state: &GenesisState) -> Result<(), KeeperError> {
    if let Some(index) = state
        .registration
        .iter()
        .position(|info| info.certificate.is_empty())
    {
        return Err(KeeperError::InvalidGenesis(format!(
            "登録レコード[{index}]の証明書が空です"
        )));
    }
    Ok(())
}
