use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::ReaderBuilder;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{DictRow, RawRow, ServiceOrder};
use crate::util::{parse_date_flex, parse_money_br};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("não foi possível ler a planilha `{path}`: {source}")]
    Read { path: PathBuf, source: csv::Error },
}

/// What happened during ingest. Defect counters are per-field: a record with
/// an unreadable date is kept (the field goes absent), so `kept_rows` only
/// differs from `total_rows` by rows the CSV reader could not decode at all.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub unreadable_rows: usize,
    pub date_defects: usize,
    pub revenue_defects: usize,
}

/// Load and clean the service-order base.
///
/// Every readable row becomes exactly one `ServiceOrder`: text columns are
/// trimmed, dates and revenue parse tolerantly into `None` on failure.
/// Nothing is filtered out here; a record with no match or no dates is still
/// a record (the pipeline enriches it as far as the data allows).
pub fn load_orders(path: &Path) -> Result<(Vec<ServiceOrder>, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?;

    let mut report = LoadReport::default();
    let mut orders: Vec<ServiceOrder> = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                report.unreadable_rows += 1;
                warn!(linha = report.total_rows, erro = %e, "linha ilegível, ignorada");
                continue;
            }
        };

        let autorizacao = parse_date_counted(row.autorizacao.as_deref(), &mut report.date_defects);
        let termino = parse_date_counted(row.termino.as_deref(), &mut report.date_defects);
        let receita = parse_money_counted(row.receita.as_deref(), &mut report.revenue_defects);

        orders.push(ServiceOrder {
            cliente: clean_text(row.cliente),
            ponto: clean_text(row.ponto),
            uf: clean_text(row.uf),
            gestor: clean_text(row.gestor),
            chamado: clean_text(row.chamado),
            os: clean_text(row.os),
            servico: clean_text(row.servico),
            status: clean_text(row.status),
            autorizacao,
            termino,
            receita,
        });
    }

    report.kept_rows = orders.len();
    Ok((orders, report))
}

fn clean_text(s: Option<String>) -> String {
    s.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Parse a date cell, counting as a defect only cells that held something
/// unreadable; a genuinely empty cell (open work order) is not a defect.
fn parse_date_counted(raw: Option<&str>, defects: &mut usize) -> Option<NaiveDate> {
    let content = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match parse_date_flex(Some(content)) {
        Some(d) => Some(d),
        None => {
            *defects += 1;
            debug!(valor = content, "data ilegível, tratada como ausente");
            None
        }
    }
}

fn parse_money_counted(raw: Option<&str>, defects: &mut usize) -> Option<f64> {
    let content = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match parse_money_br(Some(content)) {
        Some(v) => Some(v),
        None => {
            *defects += 1;
            debug!(valor = content, "receita ilegível, tratada como ausente");
            None
        }
    }
}

/// Data dictionary of the cleaned base: one row per schema column with its
/// logical type, fill rate and up to three example values.
pub fn data_dictionary(orders: &[ServiceOrder]) -> Vec<DictRow> {
    fn row(name: &str, tipo: &str, values: Vec<Option<String>>) -> DictRow {
        let n_linhas = values.len();
        let n_vazios = values.iter().filter(|v| v.is_none()).count();
        let mut examples = values.into_iter().flatten();
        DictRow {
            coluna: name.to_string(),
            tipo: tipo.to_string(),
            n_linhas,
            n_vazios,
            exemplo_1: examples.next().unwrap_or_default(),
            exemplo_2: examples.next().unwrap_or_default(),
            exemplo_3: examples.next().unwrap_or_default(),
        }
    }

    let text = |f: fn(&ServiceOrder) -> &str| -> Vec<Option<String>> {
        orders
            .iter()
            .map(|o| {
                let v = f(o);
                (!v.is_empty()).then(|| v.to_string())
            })
            .collect()
    };
    let date = |f: fn(&ServiceOrder) -> Option<NaiveDate>| -> Vec<Option<String>> {
        orders.iter().map(|o| f(o).map(|d| d.to_string())).collect()
    };

    vec![
        row("CLIENTE", "texto", text(|o| &o.cliente)),
        row("PONTO", "texto", text(|o| &o.ponto)),
        row("UF", "texto", text(|o| &o.uf)),
        row("GESTOR", "texto", text(|o| &o.gestor)),
        row("CHAMADO", "texto", text(|o| &o.chamado)),
        row("OS", "texto", text(|o| &o.os)),
        row("SERVIÇO", "texto", text(|o| &o.servico)),
        row("STATUS", "texto", text(|o| &o.status)),
        row("AUTORIZAÇÃO", "data", date(|o| o.autorizacao)),
        row("TÉRMINO", "data", date(|o| o.termino)),
        row(
            "RECEITA",
            "numero",
            orders.iter().map(|o| o.receita.map(|v| format!("{:.2}", v))).collect(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "CLIENTE,PONTO,UF,GESTOR,CHAMADO,OS,SERVIÇO,STATUS,AUTORIZAÇÃO,TÉRMINO,RECEITA";

    fn load_from(content: &str) -> (Vec<ServiceOrder>, LoadReport) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("atos.csv");
        fs::write(&path, content).unwrap();
        load_orders(&path).unwrap()
    }

    #[test]
    fn loads_and_cleans_a_typical_row() {
        let (orders, report) = load_from(&format!(
            "{HEADER}\n Acme , Loja 12 ,PE,Ana,CH-1,OS-9,Pintura Externa,Concluído,2024-01-01,2024-01-20,\"1.500,00\"\n"
        ));
        assert_eq!(report.total_rows, 1);
        assert_eq!(report.kept_rows, 1);
        assert_eq!(report.unreadable_rows, 0);
        let o = &orders[0];
        assert_eq!(o.cliente, "Acme");
        assert_eq!(o.ponto, "Loja 12");
        assert_eq!(o.autorizacao, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(o.termino, NaiveDate::from_ymd_opt(2024, 1, 20));
        assert_eq!(o.receita, Some(1500.0));
    }

    #[test]
    fn open_work_order_has_absent_termino_without_defect() {
        let (orders, report) = load_from(&format!(
            "{HEADER}\nAcme,,,,CH-1,OS-9,Pintura,Em execução,2024-01-01,,\n"
        ));
        assert_eq!(orders[0].termino, None);
        assert_eq!(orders[0].receita, None);
        assert_eq!(report.date_defects, 0);
        assert_eq!(report.revenue_defects, 0);
    }

    #[test]
    fn unreadable_fields_count_as_defects_but_keep_the_record() {
        let (orders, report) = load_from(&format!(
            "{HEADER}\nAcme,,,,CH-1,OS-9,Pintura,Concluído,quando der,2024-01-20,a combinar\n"
        ));
        assert_eq!(report.kept_rows, 1);
        assert_eq!(report.date_defects, 1);
        assert_eq!(report.revenue_defects, 1);
        assert_eq!(orders[0].autorizacao, None);
        assert_eq!(orders[0].receita, None);
    }

    #[test]
    fn br_date_format_is_accepted() {
        let (orders, _) = load_from(&format!(
            "{HEADER}\nAcme,,,,CH-1,OS-9,Pintura,Concluído,01/02/2024,20/02/2024,100\n"
        ));
        assert_eq!(orders[0].autorizacao, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(orders[0].termino, NaiveDate::from_ymd_opt(2024, 2, 20));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let (orders, report) = load_from(
            "CLIENTE,Unnamed: 12,OS,SERVIÇO,STATUS,AUTORIZAÇÃO,TÉRMINO,RECEITA,observacao\nAcme,lixo,OS-9,Pintura,Concluído,2024-01-01,,,nota\n",
        );
        assert_eq!(report.kept_rows, 1);
        assert_eq!(orders[0].cliente, "Acme");
        assert_eq!(orders[0].os, "OS-9");
        // Columns outside the schema (including the sheet's Unnamed junk)
        // simply do not land anywhere.
        assert_eq!(orders[0].chamado, "");
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_orders(&dir.path().join("nao_existe.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn data_dictionary_reports_types_fill_and_examples() {
        let (orders, _) = load_from(&format!(
            "{HEADER}\nAcme,,,,CH-1,OS-9,Pintura,Concluído,2024-01-01,2024-01-20,100\nBeta,,,,CH-2,OS-10,Laudo,Em aberto,,,\n"
        ));
        let dict = data_dictionary(&orders);
        assert_eq!(dict.len(), 11);

        let cliente = dict.iter().find(|r| r.coluna == "CLIENTE").unwrap();
        assert_eq!(cliente.n_linhas, 2);
        assert_eq!(cliente.n_vazios, 0);
        assert_eq!(cliente.exemplo_1, "Acme");
        assert_eq!(cliente.exemplo_2, "Beta");
        assert_eq!(cliente.exemplo_3, "");

        let termino = dict.iter().find(|r| r.coluna == "TÉRMINO").unwrap();
        assert_eq!(termino.tipo, "data");
        assert_eq!(termino.n_vazios, 1);
        assert_eq!(termino.exemplo_1, "2024-01-20");

        let receita = dict.iter().find(|r| r.coluna == "RECEITA").unwrap();
        assert_eq!(receita.tipo, "numero");
        assert_eq!(receita.exemplo_1, "100.00");
    }
}
