// Run configuration: file locations and log level, an optional TOML file
// patched over built-in defaults. CLI flags override individual paths after
// loading; that happens in main.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "atos.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("não foi possível ler a configuração `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("não foi possível interpretar a configuração `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("configuração inválida: {0}")]
    Validation(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub caminhos: CaminhosConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct CaminhosConfig {
    /// Base CSV exported from the work-order sheet.
    pub entrada: PathBuf,
    pub status: PathBuf,
    /// The enrichment reads the autofilled sheet, not the blank template.
    pub servicos: PathBuf,
    pub sla: PathBuf,
    /// Directory where every artifact is written.
    pub saida: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            caminhos: CaminhosConfig {
                entrada: PathBuf::from("dados/atos.csv"),
                status: PathBuf::from("mapeamentos/mapeamento_status_financeiro.csv"),
                servicos: PathBuf::from("mapeamentos/mapeamento_servicos_autofill.csv"),
                sla: PathBuf::from("mapeamentos/cadastro_sla.csv"),
                saida: PathBuf::from("saida"),
            },
            log: LogConfig { level: "info".to_string() },
        }
    }
}

impl AppConfig {
    /// Load the configuration. An explicit path must exist and parse; the
    /// default file is optional and silently skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let patch = match explicit {
            Some(path) => Some(read_patch(path)?),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Some(read_patch(default)?)
                } else {
                    None
                }
            }
        };
        if let Some(patch) = patch {
            config.apply_patch(patch);
        }
        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(caminhos) = patch.caminhos {
            if let Some(entrada) = caminhos.entrada {
                self.caminhos.entrada = entrada;
            }
            if let Some(status) = caminhos.status {
                self.caminhos.status = status;
            }
            if let Some(servicos) = caminhos.servicos {
                self.caminhos.servicos = servicos;
            }
            if let Some(sla) = caminhos.sla {
                self.caminhos.sla = sla;
            }
            if let Some(saida) = caminhos.saida {
                self.caminhos.saida = saida;
            }
        }
        if let Some(log) = patch.log {
            if let Some(level) = log.level {
                self.log.level = level;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.log.level.trim().to_ascii_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Validation(
                "log.level deve ser trace|debug|info|warn|error".to_string(),
            )),
        }
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    caminhos: Option<CaminhosPatch>,
    log: Option<LogPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CaminhosPatch {
    entrada: Option<PathBuf>,
    status: Option<PathBuf>,
    servicos: Option<PathBuf>,
    sla: Option<PathBuf>,
    saida: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LogPatch {
    level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_cover_every_path() {
        let config = AppConfig::default();
        assert_eq!(config.caminhos.entrada, PathBuf::from("dados/atos.csv"));
        assert_eq!(config.caminhos.saida, PathBuf::from("saida"));
        assert_eq!(config.log.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_patches_only_what_it_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("atos.toml");
        fs::write(
            &path,
            "[caminhos]\nentrada = \"planilhas/marco.csv\"\n\n[log]\nlevel = \"debug\"\n",
        )
        .unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.caminhos.entrada, PathBuf::from("planilhas/marco.csv"));
        // Everything the file does not mention keeps its default.
        assert_eq!(config.caminhos.sla, PathBuf::from("mapeamentos/cadastro_sla.csv"));
        assert_eq!(config.caminhos.saida, PathBuf::from("saida"));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nao_existe.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn broken_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("atos.toml");
        fs::write(&path, "[caminhos\nentrada = \"x\"\n").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("atos.toml");
        fs::write(&path, "[log]\nlevel = \"loud\"\n").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
