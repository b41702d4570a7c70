//! # fetch-bootstrap
//!
//! Gatewayからノードのブートストラップ入力を取得する。
//! 取得した内容はノード側で `load_bootstrap_material` に渡す。

use anyhow::Context;
use keyreg_types::{BootstrapMaterial, NodeId};

/// `GET {gateway}/registration/v1beta1/bootstrap/{node_id}` を呼ぶ。
pub async fn run(
    client: &reqwest::Client,
    gateway: &str,
    node_id: &str,
) -> anyhow::Result<BootstrapMaterial> {
    let node_id: NodeId = node_id.parse().context("node_idは16進数である必要があります")?;
    let url = format!(
        "{}/registration/v1beta1/bootstrap/{}",
        gateway.trim_end_matches('/'),
        node_id.to_hex()
    );

    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Gatewayがエラーを返しました ({status}): {body}");
    }
    let material = response.json::<BootstrapMaterial>().await?;
    tracing::info!(node_id = %node_id, "ブートストラップ入力を取得しました");
    Ok(material)
}
