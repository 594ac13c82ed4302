// The executive report: the ten standing questions the operation reviews,
// rendered as Markdown over an optional scope cut. Wording and section order
// follow the report the team already circulates, so the generated file can
// replace the hand-written one directly.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::kpis;
use crate::types::{EnrichedOrder, SlaResult};
use crate::util::{average, format_money_br, format_stat, median};

/// Scope cut for the report. Empty lists mean no restriction; values match
/// exactly against CLIENTE, tipo_servico and the authorization month
/// (`YYYY-MM`). With an active month filter, records without an
/// authorization date fall outside every month and are cut.
#[derive(Debug, Clone, Default)]
pub struct ReportFilters {
    pub clientes: Vec<String>,
    pub tipos: Vec<String>,
    pub meses: Vec<String>,
}

impl ReportFilters {
    fn keeps(&self, e: &EnrichedOrder) -> bool {
        let ok = |list: &[String], value: &str| list.is_empty() || list.iter().any(|v| v == value);
        ok(&self.clientes, &e.base.cliente)
            && ok(&self.tipos, &e.tipo_servico)
            && ok(&self.meses, &e.base.mes_autorizacao().unwrap_or_default())
    }
}

pub fn filter_orders(data: &[EnrichedOrder], filters: &ReportFilters) -> Vec<EnrichedOrder> {
    data.iter().filter(|e| filters.keeps(e)).cloned().collect()
}

/// Render the Markdown report for an already-filtered scope. `generated_at`
/// comes from the caller so the output is reproducible.
pub fn executive_report(
    data: &[EnrichedOrder],
    filters: &ReportFilters,
    generated_at: NaiveDateTime,
) -> String {
    let resumo = kpis::resumo_geral(data);
    let por_tipo = kpis::sla_por_tipo(data);
    let mut lines: Vec<String> = Vec::new();

    lines.push("# Relatório Executivo".to_string());
    lines.push(String::new());
    lines.push(format!("Gerado em: {}", generated_at.format("%d/%m/%Y %H:%M")));
    lines.push(String::new());

    lines.push("## Escopo do relatório (filtros aplicados)".to_string());
    lines.push(fmt_lista("Clientes", &filters.clientes));
    lines.push(fmt_lista("Tipos de serviço", &filters.tipos));
    lines.push(fmt_lista("Meses (Autorização)", &filters.meses));
    let datas: Vec<NaiveDate> = data.iter().filter_map(|e| e.base.autorizacao).collect();
    if let (Some(min), Some(max)) = (datas.iter().min(), datas.iter().max()) {
        lines.push(format!(
            "- Faixa de Autorização no recorte: {} a {}",
            min.format("%d/%m/%Y"),
            max.format("%d/%m/%Y")
        ));
    }
    lines.push(String::new());

    lines.push("## 1) Qual o volume de chamados no recorte atual?".to_string());
    lines.push(format!("- Registros: {}", resumo.registros));
    lines.push(format!("- Chamados únicos: {}", resumo.chamados_unicos));
    lines.push(format!("- Clientes no recorte: {}", resumo.clientes));
    lines.push(String::new());

    lines.push("## 2) Quais clientes mais acionaram (Top 10) e qual a participação?".to_string());
    let top_clientes = kpis::chamados_por_cliente(data);
    if top_clientes.is_empty() {
        lines.push("Sem dados suficientes para cálculo.".to_string());
    } else {
        let total_ch = resumo.chamados_unicos.max(1);
        for row in top_clientes.iter().take(10) {
            let pct = row.qtd_chamados as f64 / total_ch as f64 * 100.0;
            lines.push(format!("- {}: {} chamados ({:.1}%)", row.cliente, row.qtd_chamados, pct));
        }
    }
    lines.push(String::new());

    lines.push("## 3) Quais tipos de serviço mais demandados (Top 10)?".to_string());
    if por_tipo.is_empty() {
        lines.push("Sem dados suficientes para cálculo.".to_string());
    } else {
        for row in por_tipo.iter().take(10) {
            lines.push(format!("- {}: {} registros", row.tipo_servico, row.qtd));
        }
    }
    lines.push(String::new());

    lines.push("## 4) Como está o funil financeiro no recorte atual?".to_string());
    lines.push(format!("- Receita total: R$ {}", format_money_br(resumo.receita_total)));
    for row in kpis::receita_por_status(data) {
        lines.push(format!("- {}: R$ {}", row.billing_status, row.receita_total));
    }
    lines.push(String::new());

    lines.push("## 5) Qual o valor em pendência e onde está concentrado?".to_string());
    lines.push(format!(
        "- Pendências (A faturar + A receber): R$ {}",
        format_money_br(resumo.pendencias)
    ));
    let pend_cli = pendencias_por_cliente(data);
    if pend_cli.is_empty() {
        lines.push("- Sem pendências no recorte atual.".to_string());
    } else {
        lines.push("Top 5 clientes por pendência:".to_string());
        for (cliente, valor) in pend_cli.iter().take(5) {
            lines.push(format!("- {}: R$ {}", cliente, format_money_br(*valor)));
        }
    }
    lines.push(String::new());

    lines.push("## 6) Qual a performance de SLA (dentro/fora) no recorte atual?".to_string());
    if resumo.registros == 0 {
        lines.push("Sem dados suficientes para cálculo de SLA.".to_string());
    } else {
        let total = resumo.registros as f64;
        let conta = |r: SlaResult| data.iter().filter(|e| e.sla_resultado == r).count();
        let dentro = conta(SlaResult::Dentro);
        let sem = conta(SlaResult::SemDado);
        lines.push(format!("- Dentro: {} ({:.1}%)", dentro, dentro as f64 / total * 100.0));
        lines.push(format!(
            "- Fora: {} ({:.1}%)",
            resumo.fora_sla,
            resumo.fora_sla as f64 / total * 100.0
        ));
        lines.push(format!("- Sem dado: {} ({:.1}%)", sem, sem as f64 / total * 100.0));
    }
    lines.push(String::new());

    lines.push("## 7) Quais tipos de serviço mais estouram SLA? (Top 5)".to_string());
    let mut estouros: Vec<(&str, usize)> =
        por_tipo.iter().filter(|r| r.fora > 0).map(|r| (r.tipo_servico.as_str(), r.fora)).collect();
    estouros.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    if estouros.is_empty() {
        lines.push("Sem casos fora do SLA no recorte atual.".to_string());
    } else {
        for (tipo, fora) in estouros.into_iter().take(5) {
            lines.push(format!("- {}: {} fora", tipo, fora));
        }
    }
    lines.push(String::new());

    lines.push("## 8) Quais casos críticos (fora do SLA) exigem ação imediata? (Top 10)".to_string());
    let mut criticos: Vec<&EnrichedOrder> =
        data.iter().filter(|e| e.sla_resultado == SlaResult::Fora).collect();
    if criticos.is_empty() {
        lines.push("Nenhum caso fora do SLA no recorte atual.".to_string());
    } else {
        criticos.sort_by(|a, b| atraso_dias(b).cmp(&atraso_dias(a)));
        for e in criticos.into_iter().take(10) {
            lines.push(format!(
                "- Cliente: {} | Ponto: {} | Tipo: {} | Atraso: {} dias | OS: {} | Chamado: {}",
                e.base.cliente,
                e.base.ponto,
                e.tipo_servico,
                atraso_dias(e),
                e.base.os,
                e.base.chamado
            ));
        }
    }
    lines.push(String::new());

    lines.push("## 9) Qual o tempo de ciclo médio/mediano por tipo de serviço?".to_string());
    let ciclo = ciclo_por_tipo(data);
    if ciclo.is_empty() {
        lines.push("Sem dados suficientes para cálculo.".to_string());
    } else {
        for (tipo, media, mediana) in ciclo.into_iter().take(10) {
            lines.push(format!(
                "- {}: média {} dias | mediana {} dias",
                tipo,
                format_stat(media),
                format_stat(mediana)
            ));
        }
    }
    lines.push(String::new());

    lines.push("## 10) Resumo executivo: 3 ações recomendadas".to_string());
    lines.push("- Ação 1: Priorizar faturamento dos itens em PENDENTE_FATURAMENTO.".to_string());
    lines.push("- Ação 2: Cobrança/recebimento dos itens em FATURADO_PENDENTE.".to_string());
    lines.push("- Ação 3: Revisar causas de FORA do SLA nos tipos com maior incidência.".to_string());
    lines.push(String::new());

    lines.join("\n")
}

fn fmt_lista(nome: &str, lista: &[String]) -> String {
    if lista.is_empty() {
        return format!("- {}: (sem filtro)", nome);
    }
    if lista.len() <= 10 {
        return format!("- {}: {}", nome, lista.join(", "));
    }
    format!("- {}: {} selecionados (ex.: {}, ...)", nome, lista.len(), lista[..5].join(", "))
}

/// Exceeded days for a breached record. FORA implies both values are
/// present; the zero default keeps the arithmetic total anyway.
fn atraso_dias(e: &EnrichedOrder) -> i64 {
    e.sla_dias.unwrap_or(0) - e.sla_meta_dias.unwrap_or(0)
}

/// Outstanding revenue summed per client, largest first. A pending record
/// without revenue still keeps the client on the list, at zero.
fn pendencias_por_cliente(data: &[EnrichedOrder]) -> Vec<(String, f64)> {
    let mut map: HashMap<&str, f64> = HashMap::new();
    for e in data {
        if !kpis::is_pendencia(&e.billing_status) || e.base.cliente.is_empty() {
            continue;
        }
        *map.entry(e.base.cliente.as_str()).or_insert(0.0) += e.base.receita.unwrap_or(0.0);
    }
    let mut rows: Vec<(String, f64)> = map.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    rows.sort_by(|a, b| {
        b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0))
    });
    rows
}

/// Mean/median cycle time per type over records with a known duration;
/// types with no finished record sort last with absent stats.
fn ciclo_por_tipo(data: &[EnrichedOrder]) -> Vec<(String, Option<f64>, Option<f64>)> {
    let mut map: HashMap<String, Vec<f64>> = HashMap::new();
    for e in data {
        let dias = map.entry(e.tipo_servico.clone()).or_default();
        if let Some(d) = e.sla_dias {
            dias.push(d as f64);
        }
    }
    let mut rows: Vec<(String, Option<f64>, Option<f64>)> = map
        .into_iter()
        .map(|(tipo, dias)| {
            let media = (!dias.is_empty()).then(|| average(&dias));
            let mediana = (!dias.is_empty()).then(|| median(dias));
            (tipo, media, mediana)
        })
        .collect();
    rows.sort_by(|a, b| {
        let key = |m: Option<f64>| m.unwrap_or(f64::NEG_INFINITY);
        key(b.1).partial_cmp(&key(a.1)).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceOrder;

    fn order(
        cliente: &str,
        chamado: &str,
        tipo: &str,
        billing: &str,
        receita: Option<f64>,
        autorizacao: Option<&str>,
    ) -> EnrichedOrder {
        EnrichedOrder {
            base: ServiceOrder {
                cliente: cliente.to_string(),
                ponto: "Loja 12".to_string(),
                uf: "PE".to_string(),
                gestor: String::new(),
                chamado: chamado.to_string(),
                os: "OS-1".to_string(),
                servico: String::new(),
                status: String::new(),
                autorizacao: autorizacao
                    .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
                termino: None,
                receita,
            },
            billing_status: billing.to_string(),
            tipo_servico: tipo.to_string(),
            categoria: "Manutenção".to_string(),
            sla_dias: None,
            sla_meta_dias: None,
            sla_resultado: SlaResult::SemDado,
        }
    }

    fn with_sla(mut e: EnrichedOrder, dias: i64, meta: i64) -> EnrichedOrder {
        e.sla_dias = Some(dias);
        e.sla_meta_dias = Some(meta);
        e.sla_resultado = if dias <= meta { SlaResult::Dentro } else { SlaResult::Fora };
        e
    }

    fn sample() -> Vec<EnrichedOrder> {
        vec![
            with_sla(
                order("Acme", "CH-1", "Pintura", "FATURADO", Some(1000.0), Some("2024-01-10")),
                19,
                15,
            ),
            with_sla(
                order(
                    "Acme",
                    "CH-2",
                    "Pintura",
                    "PENDENTE_FATURAMENTO",
                    Some(300.0),
                    Some("2024-02-05"),
                ),
                10,
                15,
            ),
            order("Beta", "CH-3", "Laudos", "FATURADO_PENDENTE", Some(150.0), Some("2024-02-20")),
        ]
    }

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(10, 30, 0).unwrap()
    }

    #[test]
    fn empty_filters_keep_everything() {
        let data = sample();
        let kept = filter_orders(&data, &ReportFilters::default());
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn filters_cut_by_client_type_and_month() {
        let data = sample();
        let so_acme = ReportFilters { clientes: vec!["Acme".to_string()], ..Default::default() };
        assert_eq!(filter_orders(&data, &so_acme).len(), 2);

        let so_laudos = ReportFilters { tipos: vec!["Laudos".to_string()], ..Default::default() };
        assert_eq!(filter_orders(&data, &so_laudos).len(), 1);

        let fevereiro = ReportFilters { meses: vec!["2024-02".to_string()], ..Default::default() };
        assert_eq!(filter_orders(&data, &fevereiro).len(), 2);
    }

    #[test]
    fn month_filter_cuts_records_without_a_date() {
        let mut data = sample();
        data.push(order("Gama", "CH-9", "Pintura", "FATURADO", None, None));
        let fevereiro = ReportFilters { meses: vec!["2024-02".to_string()], ..Default::default() };
        let kept = filter_orders(&data, &fevereiro);
        assert!(kept.iter().all(|e| e.base.cliente != "Gama"));
    }

    #[test]
    fn report_carries_headline_and_scope() {
        let texto = executive_report(&sample(), &ReportFilters::default(), generated_at());
        assert!(texto.starts_with("# Relatório Executivo"));
        assert!(texto.contains("Gerado em: 15/03/2024 10:30"));
        assert!(texto.contains("- Clientes: (sem filtro)"));
        assert!(texto.contains("- Faixa de Autorização no recorte: 10/01/2024 a 20/02/2024"));
        assert!(texto.contains("- Registros: 3"));
        assert!(texto.contains("- Chamados únicos: 3"));
        assert!(texto.contains("- Clientes no recorte: 2"));
    }

    #[test]
    fn report_ranks_clients_with_share() {
        let texto = executive_report(&sample(), &ReportFilters::default(), generated_at());
        assert!(texto.contains("- Acme: 2 chamados (66.7%)"));
        assert!(texto.contains("- Beta: 1 chamados (33.3%)"));
    }

    #[test]
    fn report_renders_money_in_br_format() {
        let texto = executive_report(&sample(), &ReportFilters::default(), generated_at());
        assert!(texto.contains("- Receita total: R$ 1.450,00"));
        assert!(texto.contains("- FATURADO: R$ 1.000,00"));
        assert!(texto.contains("- Pendências (A faturar + A receber): R$ 450,00"));
        assert!(texto.contains("Top 5 clientes por pendência:"));
        assert!(texto.contains("- Acme: R$ 300,00"));
    }

    #[test]
    fn report_breaks_down_sla_and_critical_cases() {
        let texto = executive_report(&sample(), &ReportFilters::default(), generated_at());
        assert!(texto.contains("- Dentro: 1 (33.3%)"));
        assert!(texto.contains("- Fora: 1 (33.3%)"));
        assert!(texto.contains("- Sem dado: 1 (33.3%)"));
        assert!(texto.contains("- Pintura: 1 fora"));
        assert!(texto.contains(
            "- Cliente: Acme | Ponto: Loja 12 | Tipo: Pintura | Atraso: 4 dias | OS: OS-1 | Chamado: CH-1"
        ));
        assert!(texto.contains("- Pintura: média 14.5 dias | mediana 14.5 dias"));
        assert!(texto.contains("- Laudos: média - dias | mediana - dias"));
    }

    #[test]
    fn empty_scope_falls_back_to_placeholder_lines() {
        let texto = executive_report(&[], &ReportFilters::default(), generated_at());
        assert!(texto.contains("Sem dados suficientes para cálculo."));
        assert!(texto.contains("Sem dados suficientes para cálculo de SLA."));
        assert!(texto.contains("- Sem pendências no recorte atual."));
        assert!(texto.contains("Sem casos fora do SLA no recorte atual."));
        assert!(texto.contains("Nenhum caso fora do SLA no recorte atual."));
        assert!(texto.contains("## 10) Resumo executivo: 3 ações recomendadas"));
    }

    #[test]
    fn filter_summary_elides_long_lists() {
        let muitos: Vec<String> = (1..=12).map(|i| format!("Cliente {i}")).collect();
        let linha = fmt_lista("Clientes", &muitos);
        assert_eq!(
            linha,
            "- Clientes: 12 selecionados (ex.: Cliente 1, Cliente 2, Cliente 3, Cliente 4, Cliente 5, ...)"
        );
    }
}
