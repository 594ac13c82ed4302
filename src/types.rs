use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::util::month_key;

/// One row of the ATOS spreadsheet as exported, before any cleaning. Column
/// names follow the sheet headers; columns outside this schema are ignored.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "CLIENTE")]
    pub cliente: Option<String>,
    #[serde(rename = "PONTO")]
    pub ponto: Option<String>,
    #[serde(rename = "UF")]
    pub uf: Option<String>,
    #[serde(rename = "GESTOR")]
    pub gestor: Option<String>,
    #[serde(rename = "CHAMADO")]
    pub chamado: Option<String>,
    #[serde(rename = "OS")]
    pub os: Option<String>,
    #[serde(rename = "SERVIÇO")]
    pub servico: Option<String>,
    #[serde(rename = "STATUS")]
    pub status: Option<String>,
    #[serde(rename = "AUTORIZAÇÃO")]
    pub autorizacao: Option<String>,
    #[serde(rename = "TÉRMINO")]
    pub termino: Option<String>,
    #[serde(rename = "RECEITA")]
    pub receita: Option<String>,
}

/// A cleaned service order. Text fields are trimmed (empty when the cell was
/// blank); dates and revenue are `None` when absent or unparseable, never
/// zero-filled here.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceOrder {
    pub cliente: String,
    pub ponto: String,
    pub uf: String,
    pub gestor: String,
    pub chamado: String,
    /// Work-order identifier, the unit of SLA evaluation. A CHAMADO may span
    /// several OS rows for the same incident.
    pub os: String,
    pub servico: String,
    pub status: String,
    pub autorizacao: Option<NaiveDate>,
    pub termino: Option<NaiveDate>,
    pub receita: Option<f64>,
}

impl ServiceOrder {
    /// Authorization month bucket (`YYYY-MM`), when the date is known.
    pub fn mes_autorizacao(&self) -> Option<String> {
        self.autorizacao.map(month_key)
    }
}

/// Ternary SLA outcome. `SemDado` is a first-class case: a record with no
/// elapsed time or no target is neither within nor breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaResult {
    Dentro,
    Fora,
    SemDado,
}

impl SlaResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaResult::Dentro => "DENTRO",
            SlaResult::Fora => "FORA",
            SlaResult::SemDado => "SEM_DADO",
        }
    }
}

impl std::fmt::Display for SlaResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A service order plus the enrichment appended by the pipeline. The base
/// order is carried whole and untouched; only these fields are new.
#[derive(Debug, Clone)]
pub struct EnrichedOrder {
    pub base: ServiceOrder,
    pub billing_status: String,
    pub tipo_servico: String,
    pub categoria: String,
    /// Elapsed service duration in whole days (TÉRMINO − AUTORIZAÇÃO).
    pub sla_dias: Option<i64>,
    pub sla_meta_dias: Option<i64>,
    pub sla_resultado: SlaResult,
}

/// Detail-export row (`atos_com_sla.csv`): every base column plus the
/// enrichment, all rendered as text. Dates export ISO; absent values export
/// as empty cells so downstream tools read them as missing, not zero.
#[derive(Debug, Serialize, Clone)]
pub struct OrdemExportRow {
    #[serde(rename = "CLIENTE")]
    pub cliente: String,
    #[serde(rename = "PONTO")]
    pub ponto: String,
    #[serde(rename = "UF")]
    pub uf: String,
    #[serde(rename = "GESTOR")]
    pub gestor: String,
    #[serde(rename = "CHAMADO")]
    pub chamado: String,
    #[serde(rename = "OS")]
    pub os: String,
    #[serde(rename = "SERVIÇO")]
    pub servico: String,
    #[serde(rename = "STATUS")]
    pub status: String,
    #[serde(rename = "AUTORIZAÇÃO")]
    pub autorizacao: String,
    #[serde(rename = "TÉRMINO")]
    pub termino: String,
    #[serde(rename = "RECEITA")]
    pub receita: String,
    pub mes_autorizacao: String,
    pub billing_status: String,
    pub tipo_servico: String,
    pub categoria: String,
    pub sla_dias: String,
    pub sla_meta_dias: String,
    pub sla_resultado: String,
}

impl From<&EnrichedOrder> for OrdemExportRow {
    fn from(e: &EnrichedOrder) -> Self {
        let fmt_date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        let fmt_days = |n: Option<i64>| n.map(|n| n.to_string()).unwrap_or_default();
        OrdemExportRow {
            cliente: e.base.cliente.clone(),
            ponto: e.base.ponto.clone(),
            uf: e.base.uf.clone(),
            gestor: e.base.gestor.clone(),
            chamado: e.base.chamado.clone(),
            os: e.base.os.clone(),
            servico: e.base.servico.clone(),
            status: e.base.status.clone(),
            autorizacao: fmt_date(e.base.autorizacao),
            termino: fmt_date(e.base.termino),
            receita: e.base.receita.map(|v| format!("{:.2}", v)).unwrap_or_default(),
            mes_autorizacao: e.base.mes_autorizacao().unwrap_or_default(),
            billing_status: e.billing_status.clone(),
            tipo_servico: e.tipo_servico.clone(),
            categoria: e.categoria.clone(),
            sla_dias: fmt_days(e.sla_dias),
            sla_meta_dias: fmt_days(e.sla_meta_dias),
            sla_resultado: e.sla_resultado.as_str().to_string(),
        }
    }
}

/// One row of the service-mapping table (`mapeamento_servicos.csv`). Blank
/// tipo/categoria means "not classified yet"; the autofill pass only touches
/// those.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapeamentoServicoRow {
    #[serde(rename = "SERVIÇO")]
    pub servico: String,
    #[serde(default)]
    pub tipo_servico: String,
    #[serde(default)]
    pub categoria: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ChamadosClienteRow {
    #[serde(rename = "CLIENTE")]
    #[tabled(rename = "CLIENTE")]
    pub cliente: String,
    #[tabled(rename = "qtd_chamados")]
    pub qtd_chamados: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DemandasMesRow {
    #[tabled(rename = "mes_autorizacao")]
    pub mes_autorizacao: String,
    #[tabled(rename = "qtd_os")]
    pub qtd_os: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ReceitaStatusRow {
    #[tabled(rename = "billing_status")]
    pub billing_status: String,
    #[tabled(rename = "receita_total")]
    pub receita_total: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ResumoFinanceiroRow {
    #[tabled(rename = "receita_total")]
    pub receita_total: String,
    #[tabled(rename = "pendente_faturamento")]
    pub pendente_faturamento: String,
    #[tabled(rename = "faturado_pendente_receber")]
    pub faturado_pendente_receber: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SlaTipoRow {
    #[tabled(rename = "tipo_servico")]
    pub tipo_servico: String,
    #[tabled(rename = "qtd")]
    pub qtd: usize,
    #[tabled(rename = "sla_media")]
    pub sla_media: String,
    #[tabled(rename = "sla_mediana")]
    pub sla_mediana: String,
    #[tabled(rename = "meta_media")]
    pub meta_media: String,
    #[tabled(rename = "dentro")]
    pub dentro: usize,
    #[tabled(rename = "fora")]
    pub fora: usize,
    #[tabled(rename = "sem_dado")]
    pub sem_dado: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SlaClienteRow {
    #[serde(rename = "CLIENTE")]
    #[tabled(rename = "CLIENTE")]
    pub cliente: String,
    #[tabled(rename = "qtd")]
    pub qtd: usize,
    #[tabled(rename = "dentro")]
    pub dentro: usize,
    #[tabled(rename = "fora")]
    pub fora: usize,
    #[tabled(rename = "sem_dado")]
    pub sem_dado: usize,
}

/// The dashboard's five headline figures plus the distinct-client count,
/// exported as `resumo.json`.
#[derive(Debug, Serialize, PartialEq)]
pub struct ResumoGeral {
    pub registros: usize,
    pub chamados_unicos: usize,
    pub clientes: usize,
    pub receita_total: f64,
    pub pendencias: f64,
    pub fora_sla: usize,
}

/// One row of the data dictionary (`dicionario_dados.csv`): per-column type,
/// fill rate and up to three example values.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DictRow {
    #[tabled(rename = "coluna")]
    pub coluna: String,
    #[tabled(rename = "tipo")]
    pub tipo: String,
    #[tabled(rename = "n_linhas")]
    pub n_linhas: usize,
    #[tabled(rename = "n_vazios")]
    pub n_vazios: usize,
    #[tabled(rename = "exemplo_1")]
    pub exemplo_1: String,
    #[tabled(rename = "exemplo_2")]
    pub exemplo_2: String,
    #[tabled(rename = "exemplo_3")]
    pub exemplo_3: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> EnrichedOrder {
        EnrichedOrder {
            base: ServiceOrder {
                cliente: "Acme".into(),
                ponto: "Loja 12".into(),
                uf: "PE".into(),
                gestor: "Ana".into(),
                chamado: "CH-1".into(),
                os: "OS-9".into(),
                servico: "Pintura Externa".into(),
                status: "Concluído".into(),
                autorizacao: NaiveDate::from_ymd_opt(2024, 1, 1),
                termino: NaiveDate::from_ymd_opt(2024, 1, 20),
                receita: Some(1500.0),
            },
            billing_status: "FATURADO".into(),
            tipo_servico: "Pintura".into(),
            categoria: "Manutenção".into(),
            sla_dias: Some(19),
            sla_meta_dias: Some(15),
            sla_resultado: SlaResult::Fora,
        }
    }

    #[test]
    fn export_row_renders_dates_iso_and_absent_as_empty() {
        let row = OrdemExportRow::from(&order());
        assert_eq!(row.autorizacao, "2024-01-01");
        assert_eq!(row.termino, "2024-01-20");
        assert_eq!(row.receita, "1500.00");
        assert_eq!(row.mes_autorizacao, "2024-01");
        assert_eq!(row.sla_resultado, "FORA");

        let mut open = order();
        open.base.termino = None;
        open.base.receita = None;
        open.sla_dias = None;
        let row = OrdemExportRow::from(&open);
        assert_eq!(row.termino, "");
        assert_eq!(row.receita, "");
        assert_eq!(row.sla_dias, "");
    }

    #[test]
    fn sla_result_uses_contract_labels() {
        assert_eq!(SlaResult::Dentro.as_str(), "DENTRO");
        assert_eq!(SlaResult::Fora.as_str(), "FORA");
        assert_eq!(SlaResult::SemDado.to_string(), "SEM_DADO");
    }

    #[test]
    fn mes_autorizacao_is_absent_without_date() {
        let mut o = order().base;
        assert_eq!(o.mes_autorizacao().as_deref(), Some("2024-01"));
        o.autorizacao = None;
        assert_eq!(o.mes_autorizacao(), None);
    }
}
