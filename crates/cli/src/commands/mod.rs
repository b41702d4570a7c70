//! サブコマンドの実装

pub mod fetch_bootstrap;
pub mod inspect;
pub mod migrate;
pub mod verify_cert;
