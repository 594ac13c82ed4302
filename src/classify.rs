// Bootstrap tooling for the service-mapping sheet: distinct value lists, a
// blank mapping template, and a keyword pass that pre-fills the obvious
// rows. The hand-curated sheet remains the source of truth; this module only
// reduces the typing.

use std::collections::BTreeSet;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::mappings::MappingError;
use crate::types::{MapeamentoServicoRow, ServiceOrder};

struct Rule {
    keywords: &'static [&'static str],
    tipo_servico: &'static str,
    categoria: &'static str,
}

// Matched in order against the trimmed, lowercased label (accents kept, so
// the keywords carry none). "tehado" is a recurring typo in the sheet; the
// spaced "af" variants catch the água-fria abbreviation without firing on
// every word containing "af".
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule { keywords: &["emergenc"], tipo_servico: "Emergencial", categoria: "Atendimento" },
        Rule { keywords: &["laudo"], tipo_servico: "Laudos", categoria: "Técnico" },
        Rule { keywords: &["pintura"], tipo_servico: "Pintura", categoria: "Manutenção" },
        Rule {
            keywords: &["desentup", "tubula", " af", "af ", "infiltra"],
            tipo_servico: "Hidráulica",
            categoria: "Manutenção",
        },
        Rule {
            keywords: &["porta", "fechadura", "dobradi", "mola", "gradil"],
            tipo_servico: "Portas & Acessos",
            categoria: "Manutenção",
        },
        Rule {
            keywords: &["fachada", "acm"],
            tipo_servico: "Fachada & Revestimento",
            categoria: "Reforma/Manutenção",
        },
        Rule {
            keywords: &["coberta", "telhado", "tehado"],
            tipo_servico: "Coberta/Telhado",
            categoria: "Manutenção/Reforma",
        },
        Rule { keywords: &["acessibil"], tipo_servico: "Acessibilidade", categoria: "Adequação" },
        Rule { keywords: &["sinaliza"], tipo_servico: "Sinalização", categoria: "Adequação" },
        Rule {
            keywords: &["reforma", "layout", "parede", "escada", "elevador", "cantoneira"],
            tipo_servico: "Civil",
            categoria: "Obra/Adequação",
        },
    ]
});

/// Suggest a (tipo, categoria) pair for a raw service label. First matching
/// rule wins, so specific rules sit before broad ones in the table.
pub fn classify_service(servico: &str) -> Option<(&'static str, &'static str)> {
    let label = servico.trim().to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| label.contains(k)))
        .map(|rule| (rule.tipo_servico, rule.categoria))
}

/// Distinct non-blank SERVIÇO labels, sorted.
pub fn distinct_services(orders: &[ServiceOrder]) -> Vec<String> {
    distinct(orders.iter().map(|o| o.servico.as_str()))
}

/// Distinct non-blank STATUS labels, sorted.
pub fn distinct_statuses(orders: &[ServiceOrder]) -> Vec<String> {
    distinct(orders.iter().map(|o| o.status.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let set: BTreeSet<String> =
        values.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string).collect();
    set.into_iter().collect()
}

/// Blank mapping template: one row per distinct service, columns to be
/// filled by hand (or by `autofill`).
pub fn mapping_template(orders: &[ServiceOrder]) -> Vec<MapeamentoServicoRow> {
    distinct_services(orders)
        .into_iter()
        .map(|servico| MapeamentoServicoRow {
            servico,
            tipo_servico: String::new(),
            categoria: String::new(),
        })
        .collect()
}

/// Read an existing mapping sheet back as editable rows.
pub fn load_rows(path: &Path) -> Result<Vec<MapeamentoServicoRow>, MappingError> {
    let read_error =
        |source: csv::Error| MappingError::Read { path: path.to_path_buf(), source };
    let mut rdr =
        csv::ReaderBuilder::new().flexible(true).from_path(path).map_err(read_error)?;
    let mut rows = Vec::new();
    for result in rdr.deserialize::<MapeamentoServicoRow>() {
        rows.push(result.map_err(read_error)?);
    }
    Ok(rows)
}

#[derive(Debug, Default)]
pub struct AutofillReport {
    pub filled: usize,
    /// Labels no rule recognized, still blank in the output sheet.
    pub unclassified: Vec<String>,
}

/// Fill blank rows of a mapping sheet via the keyword rules. Rows with a
/// hand-filled tipo are never touched; blank rows are recomputed whole, so a
/// stray categoria without a tipo is cleared rather than trusted.
pub fn autofill(rows: &mut [MapeamentoServicoRow]) -> AutofillReport {
    let mut report = AutofillReport::default();
    for row in rows.iter_mut() {
        if !row.tipo_servico.trim().is_empty() {
            continue;
        }
        match classify_service(&row.servico) {
            Some((tipo, categoria)) => {
                row.tipo_servico = tipo.to_string();
                row.categoria = categoria.to_string();
                report.filled += 1;
            }
            None => {
                row.tipo_servico = String::new();
                row.categoria = String::new();
                report.unclassified.push(row.servico.clone());
            }
        }
    }
    report
}
