// The enrichment pass: one pure in-memory transformation that joins every
// service order against the three mapping tables and classifies its SLA.
// All file I/O happens before (loader, mappings) and after (output) this
// module.

use crate::mappings::Mappings;
use crate::normalize::norm_key;
use crate::sla;
use crate::types::{EnrichedOrder, ServiceOrder};

/// Sentinel written wherever a lookup found no match. KPIs group it like any
/// other value, which keeps unmapped volume visible instead of silently
/// dropped.
pub const UNMAPPED: &str = "NAO_MAPEADO";

/// Per-run counters for the enrichment pass, reported after the run so the
/// mapping sheets can be completed where coverage is thin.
#[derive(Debug, Clone, Default)]
pub struct EnrichSummary {
    pub total: usize,
    pub unmapped_status: usize,
    pub unmapped_service: usize,
    pub no_target: usize,
    /// Records where TÉRMINO precedes AUTORIZAÇÃO. They classify like any
    /// other duration, but the count flags the sheet for correction.
    pub negative_elapsed: usize,
}

/// Enrich every order. Record count is preserved exactly: no filtering, no
/// duplication, original order kept.
pub fn apply(orders: Vec<ServiceOrder>, mappings: &Mappings) -> (Vec<EnrichedOrder>, EnrichSummary) {
    let mut summary = EnrichSummary { total: orders.len(), ..EnrichSummary::default() };
    let enriched = orders
        .into_iter()
        .map(|order| enrich_one(order, mappings, &mut summary))
        .collect();
    (enriched, summary)
}

fn enrich_one(
    order: ServiceOrder,
    mappings: &Mappings,
    summary: &mut EnrichSummary,
) -> EnrichedOrder {
    let billing_status = match mappings.status.lookup(&norm_key(Some(&order.status))) {
        Some(billing) => billing.to_string(),
        None => {
            summary.unmapped_status += 1;
            UNMAPPED.to_string()
        }
    };

    let (tipo_servico, categoria) = match mappings.service.lookup(&norm_key(Some(&order.servico))) {
        Some(class) => (
            class.tipo_servico.clone(),
            class.categoria.clone().unwrap_or_else(|| UNMAPPED.to_string()),
        ),
        None => {
            summary.unmapped_service += 1;
            (UNMAPPED.to_string(), UNMAPPED.to_string())
        }
    };

    // The SLA join keys on the resolved type, sentinel included, so a
    // cadastro row for the sentinel would give unmapped services a target.
    let client_key = norm_key(Some(&order.cliente));
    let type_key = norm_key(Some(&tipo_servico));
    let sla_meta_dias = mappings.sla.resolve(&client_key, &type_key);
    if sla_meta_dias.is_none() {
        summary.no_target += 1;
    }

    let sla_dias = sla::elapsed_days(order.autorizacao, order.termino);
    if matches!(sla_dias, Some(d) if d < 0) {
        summary.negative_elapsed += 1;
    }
    let sla_resultado = sla::classify(sla_dias, sla_meta_dias);

    EnrichedOrder {
        base: order,
        billing_status,
        tipo_servico,
        categoria,
        sla_dias,
        sla_meta_dias,
        sla_resultado,
    }
}
