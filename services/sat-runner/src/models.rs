//! Model input files.

use std::path::Path;

use anyhow::{Context, Result};
use sat_preprocess::ModelInputConfig;
use tracing::info;
use walkdir::WalkDir;

/// A model input file and the name it is reported under.
#[derive(Debug, Clone)]
pub struct NamedModel {
    /// File stem, e.g. `pvnet` for `pvnet.yaml`.
    pub name: String,
    pub config: ModelInputConfig,
}

/// Load every `*.yaml` / `*.yml` file under `dir`, sorted by name.
pub fn load_models(dir: &Path) -> Result<Vec<NamedModel>> {
    let mut models = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if !is_yaml {
            continue;
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let config = ModelInputConfig::from_file(path)?;
        models.push(NamedModel { name, config });
    }

    info!(
        dir = %dir.display(),
        models = ?models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        "Loaded model input configs"
    );
    Ok(models)
}
