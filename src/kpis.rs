// KPI aggregations over the enriched base. Each public function backs one
// export file; all take the records by reference and return display-ready
// rows with numbers pre-formatted the way the exports print them.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::types::{
    ChamadosClienteRow, DemandasMesRow, EnrichedOrder, ReceitaStatusRow, ResumoFinanceiroRow,
    ResumoGeral, SlaClienteRow, SlaResult, SlaTipoRow,
};
use crate::util::{average, format_money_br, format_stat, median};

/// Billing buckets that count as outstanding money: authorized but not yet
/// invoiced, and invoiced but not yet paid.
pub const PENDENTE_FATURAMENTO: &str = "PENDENTE_FATURAMENTO";
pub const FATURADO_PENDENTE: &str = "FATURADO_PENDENTE";

pub fn is_pendencia(billing_status: &str) -> bool {
    billing_status == PENDENTE_FATURAMENTO || billing_status == FATURADO_PENDENTE
}

/// Unique CHAMADO count per client, busiest first. Rows without a client or
/// a call id cannot be attributed and are left out.
pub fn chamados_por_cliente(data: &[EnrichedOrder]) -> Vec<ChamadosClienteRow> {
    let mut map: HashMap<&str, HashSet<&str>> = HashMap::new();
    for e in data {
        if e.base.cliente.is_empty() || e.base.chamado.is_empty() {
            continue;
        }
        map.entry(e.base.cliente.as_str()).or_default().insert(e.base.chamado.as_str());
    }
    let mut rows: Vec<ChamadosClienteRow> = map
        .into_iter()
        .map(|(cliente, chamados)| ChamadosClienteRow {
            cliente: cliente.to_string(),
            qtd_chamados: chamados.len(),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.qtd_chamados.cmp(&a.qtd_chamados).then_with(|| a.cliente.cmp(&b.cliente))
    });
    rows
}

/// OS volume per authorization month, chronological. Records without an
/// authorization date have no month bucket and are left out.
pub fn demandas_por_mes(data: &[EnrichedOrder]) -> Vec<DemandasMesRow> {
    let mut map: BTreeMap<String, usize> = BTreeMap::new();
    for e in data {
        if let Some(mes) = e.base.mes_autorizacao() {
            *map.entry(mes).or_insert(0) += 1;
        }
    }
    map.into_iter()
        .map(|(mes_autorizacao, qtd_os)| DemandasMesRow { mes_autorizacao, qtd_os })
        .collect()
}

/// Revenue summed per billing status, largest first. Absent revenue counts
/// as zero; the unmapped sentinel groups like any other status.
pub fn receita_por_status(data: &[EnrichedOrder]) -> Vec<ReceitaStatusRow> {
    let mut map: HashMap<&str, f64> = HashMap::new();
    for e in data {
        *map.entry(e.billing_status.as_str()).or_insert(0.0) += e.base.receita.unwrap_or(0.0);
    }
    let mut tmp: Vec<(f64, String)> = map.into_iter().map(|(k, v)| (v, k.to_string())).collect();
    tmp.sort_by(|a, b| {
        b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then_with(|| a.1.cmp(&b.1))
    });
    tmp.into_iter()
        .map(|(total, billing_status)| ReceitaStatusRow {
            billing_status,
            receita_total: format_money_br(total),
        })
        .collect()
}

/// The three headline money figures as a single export row.
pub fn resumo_financeiro(data: &[EnrichedOrder]) -> ResumoFinanceiroRow {
    let mut total = 0.0;
    let mut pendente = 0.0;
    let mut faturado_pendente = 0.0;
    for e in data {
        let receita = e.base.receita.unwrap_or(0.0);
        total += receita;
        if e.billing_status == PENDENTE_FATURAMENTO {
            pendente += receita;
        } else if e.billing_status == FATURADO_PENDENTE {
            faturado_pendente += receita;
        }
    }
    ResumoFinanceiroRow {
        receita_total: format_money_br(total),
        pendente_faturamento: format_money_br(pendente),
        faturado_pendente_receber: format_money_br(faturado_pendente),
    }
}

/// Per-type SLA panel: volume, duration stats, average target and the
/// DENTRO/FORA/SEM_DADO split. Stats cover only the records that carry the
/// value, so a type with no finished order shows `-` instead of a fake zero.
pub fn sla_por_tipo(data: &[EnrichedOrder]) -> Vec<SlaTipoRow> {
    #[derive(Default)]
    struct Acc {
        qtd: usize,
        dias: Vec<f64>,
        metas: Vec<f64>,
        dentro: usize,
        fora: usize,
        sem_dado: usize,
    }
    let mut map: HashMap<String, Acc> = HashMap::new();
    for e in data {
        let acc = map.entry(e.tipo_servico.clone()).or_default();
        acc.qtd += 1;
        if let Some(d) = e.sla_dias {
            acc.dias.push(d as f64);
        }
        if let Some(m) = e.sla_meta_dias {
            acc.metas.push(m as f64);
        }
        match e.sla_resultado {
            SlaResult::Dentro => acc.dentro += 1,
            SlaResult::Fora => acc.fora += 1,
            SlaResult::SemDado => acc.sem_dado += 1,
        }
    }
    let mut rows: Vec<SlaTipoRow> = map
        .into_iter()
        .map(|(tipo_servico, acc)| {
            let Acc { qtd, dias, metas, dentro, fora, sem_dado } = acc;
            let media = (!dias.is_empty()).then(|| average(&dias));
            let meta_media = (!metas.is_empty()).then(|| average(&metas));
            let mediana = (!dias.is_empty()).then(|| median(dias));
            SlaTipoRow {
                tipo_servico,
                qtd,
                sla_media: format_stat(media),
                sla_mediana: format_stat(mediana),
                meta_media: format_stat(meta_media),
                dentro,
                fora,
                sem_dado,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.qtd.cmp(&a.qtd).then_with(|| a.tipo_servico.cmp(&b.tipo_servico)));
    rows
}

/// DENTRO/FORA/SEM_DADO split per client, busiest first.
pub fn sla_por_cliente(data: &[EnrichedOrder]) -> Vec<SlaClienteRow> {
    #[derive(Default)]
    struct Acc {
        qtd: usize,
        dentro: usize,
        fora: usize,
        sem_dado: usize,
    }
    let mut map: HashMap<String, Acc> = HashMap::new();
    for e in data {
        if e.base.cliente.is_empty() {
            continue;
        }
        let acc = map.entry(e.base.cliente.clone()).or_default();
        acc.qtd += 1;
        match e.sla_resultado {
            SlaResult::Dentro => acc.dentro += 1,
            SlaResult::Fora => acc.fora += 1,
            SlaResult::SemDado => acc.sem_dado += 1,
        }
    }
    let mut rows: Vec<SlaClienteRow> = map
        .into_iter()
        .map(|(cliente, acc)| SlaClienteRow {
            cliente,
            qtd: acc.qtd,
            dentro: acc.dentro,
            fora: acc.fora,
            sem_dado: acc.sem_dado,
        })
        .collect();
    rows.sort_by(|a, b| b.qtd.cmp(&a.qtd).then_with(|| a.cliente.cmp(&b.cliente)));
    rows
}

/// The dashboard's headline figures (`resumo.json`).
pub fn resumo_geral(data: &[EnrichedOrder]) -> ResumoGeral {
    let chamados: HashSet<&str> =
        data.iter().map(|e| e.base.chamado.as_str()).filter(|c| !c.is_empty()).collect();
    let clientes: HashSet<&str> =
        data.iter().map(|e| e.base.cliente.as_str()).filter(|c| !c.is_empty()).collect();
    let receita_total: f64 = data.iter().filter_map(|e| e.base.receita).sum();
    let pendencias: f64 = data
        .iter()
        .filter(|e| is_pendencia(&e.billing_status))
        .filter_map(|e| e.base.receita)
        .sum();
    let fora_sla = data.iter().filter(|e| e.sla_resultado == SlaResult::Fora).count();
    ResumoGeral {
        registros: data.len(),
        chamados_unicos: chamados.len(),
        clientes: clientes.len(),
        receita_total,
        pendencias,
        fora_sla,
    }
}
