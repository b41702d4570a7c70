//! # migrate
//!
//! v1ジェネシス文書を読み込み、現行スキーマの文書を書き出す。

use std::path::Path;

use anyhow::Context;
use keyreg_core::migrate_document;

/// マイグレーションを実行し、書き出した登録レコード数を返す。
pub fn run(input: &Path, output: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read(input)
        .with_context(|| format!("入力を読み込めません: {}", input.display()))?;
    let document = migrate_document(&raw)?;
    std::fs::write(output, serde_json::to_vec_pretty(&document)?)
        .with_context(|| format!("出力を書き込めません: {}", output.display()))?;
    Ok(document.registration.registration.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyreg_core::MigrationError;
    use keyreg_types::genesis::v1;
    use keyreg_types::{GenesisDocument, GenesisState, CURRENT_SCHEMA_VERSION};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("keyreg-cli-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_migrate_file() {
        let input = temp_path("migrate-in.json");
        let output = temp_path("migrate-out.json");
        let doc = GenesisDocument {
            schema_version: v1::SCHEMA_VERSION,
            registration: v1::GenesisState {
                registration: vec![v1::LegacyRegistrationNodeInfo {
                    certificate: vec![1, 2, 3],
                    encrypted_seed: None,
                }],
                node_exch_master_certificate: vec![4],
                io_master_certificate: vec![5],
            },
        };
        std::fs::write(&input, serde_json::to_vec(&doc).unwrap()).unwrap();

        assert_eq!(run(&input, &output).unwrap(), 1);

        let migrated: GenesisDocument<GenesisState> =
            serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
        assert_eq!(migrated.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(migrated.registration.registration[0].certificate.as_bytes(), &[1, 2, 3]);

        // 出力を再投入すると拒否される
        let err = run(&output, &temp_path("migrate-again.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MigrationError>(),
            Some(MigrationError::ShapeMismatch(_))
        ));

        std::fs::remove_file(&input).ok();
        std::fs::remove_file(&output).ok();
    }
}
