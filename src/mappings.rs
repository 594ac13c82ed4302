// The three reference tables the enrichment joins against: status → billing
// status, service → (tipo, categoria), and the SLA cadastro. All three are
// loaded once per run and treated as immutable; a reload means a fresh
// `Mappings` and a fresh enrichment pass.
//
// Anything wrong with a mapping FILE (missing, unreadable, columns that
// cannot be identified) is a configuration error and aborts the run before
// any record is touched. Anything wrong with a mapping ROW (blank key,
// unparseable target) is skipped with a warning and never aborts.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::normalize::norm_key;
use crate::util::parse_days_safe;

/// Client sentinel in the SLA cadastro that marks a default rule for a
/// service type.
pub const WILDCARD_CLIENT: &str = "*";

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("não foi possível ler o mapeamento `{path}`: {source}")]
    Read { path: PathBuf, source: csv::Error },
    #[error("não achei a coluna de SERVIÇO no mapeamento `{path}` (colunas: {headers})")]
    ServiceColumnMissing { path: PathBuf, headers: String },
    #[error("mais de uma coluna de SERVIÇO no mapeamento `{path}` (candidatas: {candidates})")]
    ServiceColumnAmbiguous { path: PathBuf, candidates: String },
    #[error("coluna obrigatória `{column}` ausente no mapeamento `{path}`")]
    ColumnMissing { path: PathBuf, column: String },
}

/// Normalized status key → billing status.
#[derive(Debug, Default)]
pub struct StatusMap {
    by_key: HashMap<String, String>,
}

/// Taxonomy entry for a service label. `categoria` stays optional here; the
/// enrichment engine owns the unmapped sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceClass {
    pub tipo_servico: String,
    pub categoria: Option<String>,
}

/// Normalized service key → taxonomy entry.
#[derive(Debug, Default)]
pub struct ServiceMap {
    by_key: HashMap<String, ServiceClass>,
}

/// The SLA cadastro, partitioned at load into client-specific rules and
/// wildcard defaults. Resolution order lives in `resolve`.
#[derive(Debug, Default)]
pub struct SlaTable {
    client_rules: HashMap<String, HashMap<String, i64>>,
    default_rules: HashMap<String, i64>,
}

/// One immutable snapshot of all three tables.
#[derive(Debug)]
pub struct Mappings {
    pub status: StatusMap,
    pub service: ServiceMap,
    pub sla: SlaTable,
}

impl Mappings {
    pub fn load(status: &Path, service: &Path, sla: &Path) -> Result<Self, MappingError> {
        Ok(Mappings {
            status: StatusMap::load(status)?,
            service: ServiceMap::load(service)?,
            sla: SlaTable::load(sla)?,
        })
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, MappingError> {
    csv::ReaderBuilder::new().flexible(true).from_path(path).map_err(|source| {
        MappingError::Read { path: path.to_path_buf(), source }
    })
}

fn read_error(path: &Path, source: csv::Error) -> MappingError {
    MappingError::Read { path: path.to_path_buf(), source }
}

/// Position of an exactly-named column (header names are trimmed first).
fn required_column(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, MappingError> {
    headers.iter().position(|h| h.trim() == name).ok_or_else(|| MappingError::ColumnMissing {
        path: path.to_path_buf(),
        column: name.to_string(),
    })
}

impl StatusMap {
    /// Load `STATUS,billing_status` rows. Duplicate normalized keys keep the
    /// last row (documented precedence for ambiguous joins).
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let mut rdr = open_reader(path)?;
        let headers = rdr.headers().map_err(|e| read_error(path, e))?.clone();
        let status_col = required_column(&headers, "STATUS", path)?;
        let billing_col = required_column(&headers, "billing_status", path)?;

        let mut by_key = HashMap::new();
        for record in rdr.records() {
            let record = record.map_err(|e| read_error(path, e))?;
            let key = norm_key(record.get(status_col));
            let billing = record.get(billing_col).unwrap_or("").trim();
            if key.is_empty() || billing.is_empty() {
                warn!(arquivo = %path.display(), "linha de status sem chave ou sem billing_status, ignorada");
                continue;
            }
            by_key.insert(key, billing.to_string());
        }
        Ok(StatusMap { by_key })
    }

    pub fn lookup(&self, status_key: &str) -> Option<&str> {
        self.by_key.get(status_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl ServiceMap {
    /// Load the service taxonomy. The key column is whichever single header
    /// contains `SERV` (the sheet writes it as `SERVIÇO`, sometimes with
    /// stray spaces or encoding damage); zero or multiple candidates is a
    /// configuration error, decided here once rather than per record.
    /// `tipo_servico` and `categoria` are fixed names.
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let mut rdr = open_reader(path)?;
        let headers = rdr.headers().map_err(|e| read_error(path, e))?.clone();

        let candidates: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.trim().to_uppercase().contains("SERV"))
            .map(|(i, _)| i)
            .collect();
        let service_col = match candidates.as_slice() {
            [only] => *only,
            [] => {
                return Err(MappingError::ServiceColumnMissing {
                    path: path.to_path_buf(),
                    headers: headers.iter().collect::<Vec<_>>().join(", "),
                })
            }
            many => {
                return Err(MappingError::ServiceColumnAmbiguous {
                    path: path.to_path_buf(),
                    candidates: many
                        .iter()
                        .filter_map(|i| headers.get(*i))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        };
        let tipo_col = required_column(&headers, "tipo_servico", path)?;
        let categoria_col = required_column(&headers, "categoria", path)?;

        let mut by_key = HashMap::new();
        for record in rdr.records() {
            let record = record.map_err(|e| read_error(path, e))?;
            let key = norm_key(record.get(service_col));
            let tipo = record.get(tipo_col).unwrap_or("").trim();
            // A blank tipo means "not classified yet": the row maps nothing,
            // so the record falls through to the unmapped sentinel.
            if key.is_empty() || tipo.is_empty() {
                continue;
            }
            let categoria = record.get(categoria_col).unwrap_or("").trim();
            let categoria = (!categoria.is_empty()).then(|| categoria.to_string());
            // Last row wins on duplicate keys.
            by_key.insert(key, ServiceClass { tipo_servico: tipo.to_string(), categoria });
        }
        Ok(ServiceMap { by_key })
    }

    pub fn lookup(&self, service_key: &str) -> Option<&ServiceClass> {
        self.by_key.get(service_key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl SlaTable {
    /// Load `cliente,tipo_servico,sla_dias` rules. Rows whose trimmed client
    /// is `*` become defaults per service type; everything else is a
    /// client-specific rule. Rows without a usable type key or target are
    /// skipped (a skipped specific rule therefore never shadows a default).
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let mut rdr = open_reader(path)?;
        let headers = rdr.headers().map_err(|e| read_error(path, e))?.clone();
        let cliente_col = required_column(&headers, "cliente", path)?;
        let tipo_col = required_column(&headers, "tipo_servico", path)?;
        let dias_col = required_column(&headers, "sla_dias", path)?;

        let mut table = SlaTable::default();
        for record in rdr.records() {
            let record = record.map_err(|e| read_error(path, e))?;
            let cliente_raw = record.get(cliente_col).unwrap_or("").trim();
            let tipo_key = norm_key(record.get(tipo_col));
            let dias = match parse_days_safe(record.get(dias_col)) {
                Some(d) if !tipo_key.is_empty() => d,
                _ => {
                    warn!(
                        arquivo = %path.display(),
                        cliente = cliente_raw,
                        "regra de SLA sem tipo ou sem prazo legível, ignorada"
                    );
                    continue;
                }
            };
            // HashMap::insert overwrites: later cadastro rows win.
            if cliente_raw == WILDCARD_CLIENT {
                table.default_rules.insert(tipo_key, dias);
            } else {
                let client_key = norm_key(Some(cliente_raw));
                if client_key.is_empty() {
                    warn!(arquivo = %path.display(), "regra de SLA sem cliente, ignorada");
                    continue;
                }
                table.client_rules.entry(client_key).or_default().insert(tipo_key, dias);
            }
        }
        Ok(table)
    }

    /// Two-tier resolution: the client-specific rule always beats the
    /// wildcard default; neither present means no target at all.
    pub fn resolve(&self, client_key: &str, type_key: &str) -> Option<i64> {
        self.client_rules
            .get(client_key)
            .and_then(|rules| rules.get(type_key))
            .copied()
            .or_else(|| self.default_rules.get(type_key).copied())
    }

    pub fn specific_count(&self) -> usize {
        self.client_rules.values().map(HashMap::len).sum()
    }

    pub fn default_count(&self) -> usize {
        self.default_rules.len()
    }
}
