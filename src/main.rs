// Entry point and CLI surface.
//
// Each subcommand runs one stage of the pipeline end to end:
// - `diagnostico` loads the spreadsheet and writes the data dictionary
//   plus the distinct service/status lists.
// - `modelo-mapeamento` writes the blank service mapping sheet.
// - `classificar` autofills that sheet from the keyword rules.
// - `enriquecer` joins the three mappings and writes atos_com_sla.csv.
// - `kpis` writes the KPI tables and resumo.json.
// - `relatorio` renders the Markdown executive report.
mod classify;
mod config;
mod enrich;
mod kpis;
mod loader;
mod mappings;
mod normalize;
mod output;
mod report;
mod sla;
mod types;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use enrich::EnrichSummary;
use mappings::Mappings;
use report::ReportFilters;
use types::{EnrichedOrder, OrdemExportRow, ServiceOrder};

#[derive(Debug, Parser)]
#[command(name = "atos-report", about = "Indicadores operacionais das ordens de serviço ATOS")]
struct Cli {
    #[arg(long, global = true, help = "Arquivo de configuração TOML (padrão: atos.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Planilha de entrada; sobrepõe caminhos.entrada")]
    entrada: Option<PathBuf>,

    #[arg(long, global = true, help = "Diretório de saída; sobrepõe caminhos.saida")]
    saida: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Diagnóstico da planilha: dicionário de dados e listas únicas")]
    Diagnostico,

    #[command(about = "Gera o modelo em branco de mapeamento de serviços")]
    ModeloMapeamento,

    #[command(about = "Preenche o mapeamento de serviços com as regras de palavras-chave")]
    Classificar {
        #[arg(long, help = "Planilha a preencher (padrão: <saida>/mapeamento_servicos.csv)")]
        mapa: Option<PathBuf>,
    },

    #[command(about = "Enriquece a base com status financeiro, tipo de serviço e SLA")]
    Enriquecer,

    #[command(about = "Calcula os KPIs e grava as tabelas e o resumo.json")]
    Kpis,

    #[command(about = "Gera o relatório executivo em Markdown")]
    Relatorio {
        #[arg(long, help = "Restringe o recorte a um cliente (repetível)")]
        cliente: Vec<String>,

        #[arg(long, help = "Restringe o recorte a um tipo de serviço (repetível)")]
        tipo: Vec<String>,

        #[arg(long, help = "Restringe o recorte a um mês AAAA-MM (repetível)")]
        mes: Vec<String>,
    },
}

fn init_tracing(level: &str) {
    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("falha ao carregar a configuração")?;
    if let Some(entrada) = cli.entrada {
        config.caminhos.entrada = entrada;
    }
    if let Some(saida) = cli.saida {
        config.caminhos.saida = saida;
    }
    init_tracing(&config.log.level);

    output::ensure_dir(&config.caminhos.saida)
        .context("falha ao preparar o diretório de saída")?;

    match cli.command {
        Command::Diagnostico => run_diagnostico(&config),
        Command::ModeloMapeamento => run_modelo_mapeamento(&config),
        Command::Classificar { mapa } => run_classificar(&config, mapa),
        Command::Enriquecer => run_enriquecer(&config),
        Command::Kpis => run_kpis(&config),
        Command::Relatorio { cliente, tipo, mes } => {
            let filters = ReportFilters { clientes: cliente, tipos: tipo, meses: mes };
            run_relatorio(&config, filters)
        }
    }
}

/// Load the base spreadsheet and print the load report.
fn load_base(config: &AppConfig) -> Result<Vec<ServiceOrder>> {
    let (orders, report) = loader::load_orders(&config.caminhos.entrada)
        .context("falha ao carregar a base de ordens de serviço")?;
    println!(
        "Base carregada: {} linhas lidas, {} registros mantidos.",
        util::format_int(report.total_rows),
        util::format_int(report.kept_rows)
    );
    if report.unreadable_rows > 0 {
        println!(
            "Aviso: {} linhas ilegíveis foram descartadas.",
            util::format_int(report.unreadable_rows)
        );
    }
    if report.date_defects > 0 || report.revenue_defects > 0 {
        println!(
            "Aviso: {} datas e {} valores de receita não puderam ser interpretados.",
            util::format_int(report.date_defects),
            util::format_int(report.revenue_defects)
        );
    }
    Ok(orders)
}

/// Run the full enrichment pipeline: base + mappings + join.
fn load_enriched(config: &AppConfig) -> Result<(Vec<EnrichedOrder>, EnrichSummary)> {
    let orders = load_base(config)?;
    let mappings = Mappings::load(
        &config.caminhos.status,
        &config.caminhos.servicos,
        &config.caminhos.sla,
    )
    .context("falha ao carregar os mapeamentos")?;
    info!(
        status = mappings.status.len(),
        servicos = mappings.service.len(),
        metas_especificas = mappings.sla.specific_count(),
        metas_padrao = mappings.sla.default_count(),
        "mapeamentos carregados"
    );
    Ok(enrich::apply(orders, &mappings))
}

fn run_diagnostico(config: &AppConfig) -> Result<()> {
    let saida = &config.caminhos.saida;
    let orders = load_base(config)?;

    let dict = loader::data_dictionary(&orders);
    output::write_csv(&saida.join("dicionario_dados.csv"), &dict)?;
    output::preview_table("Dicionário de dados", &dict, dict.len());

    let servicos = classify::distinct_services(&orders);
    let statuses = classify::distinct_statuses(&orders);
    output::write_text(&saida.join("lista_servicos.txt"), &as_lines(&servicos))?;
    output::write_text(&saida.join("lista_status.txt"), &as_lines(&statuses))?;
    println!(
        "Listas únicas: {} serviços e {} status distintos.",
        util::format_int(servicos.len()),
        util::format_int(statuses.len())
    );
    println!("Arquivos gerados em {}", saida.display());
    Ok(())
}

fn as_lines(values: &[String]) -> String {
    let mut text = values.join("\n");
    text.push('\n');
    text
}

fn run_modelo_mapeamento(config: &AppConfig) -> Result<()> {
    let orders = load_base(config)?;
    let template = classify::mapping_template(&orders);
    let path = config.caminhos.saida.join("mapeamento_servicos.csv");
    output::write_csv(&path, &template)?;
    println!(
        "Modelo com {} serviços distintos gravado em {}",
        util::format_int(template.len()),
        path.display()
    );
    println!("Preencha tipo_servico e categoria, ou rode `classificar` para o preenchimento automático.");
    Ok(())
}

fn run_classificar(config: &AppConfig, mapa: Option<PathBuf>) -> Result<()> {
    let saida = &config.caminhos.saida;
    let mapa = mapa.unwrap_or_else(|| saida.join("mapeamento_servicos.csv"));
    let mut rows = classify::load_rows(&mapa).context("falha ao carregar o mapeamento")?;
    let report = classify::autofill(&mut rows);

    let destino = saida.join("mapeamento_servicos_autofill.csv");
    output::write_csv(&destino, &rows)?;
    println!(
        "Classificação automática: {} linhas preenchidas, {} pendentes.",
        util::format_int(report.filled),
        util::format_int(report.unclassified.len())
    );
    for servico in report.unclassified.iter().take(10) {
        println!("  (pendente) {servico}");
    }
    if report.unclassified.len() > 10 {
        println!("  ... e mais {}.", util::format_int(report.unclassified.len() - 10));
    }
    println!("Arquivo gerado: {}", destino.display());
    Ok(())
}

fn run_enriquecer(config: &AppConfig) -> Result<()> {
    let (enriched, summary) = load_enriched(config)?;
    let rows: Vec<OrdemExportRow> = enriched.iter().map(OrdemExportRow::from).collect();
    let path = config.caminhos.saida.join("atos_com_sla.csv");
    output::write_csv(&path, &rows)?;

    println!("Base enriquecida: {} registros.", util::format_int(summary.total));
    println!(
        "Sem correspondência: {} status, {} serviços; {} registros sem meta de SLA.",
        util::format_int(summary.unmapped_status),
        util::format_int(summary.unmapped_service),
        util::format_int(summary.no_target)
    );
    if summary.negative_elapsed > 0 {
        println!(
            "Aviso: {} registros com término anterior à autorização.",
            util::format_int(summary.negative_elapsed)
        );
    }
    println!("Arquivo gerado: {}", path.display());
    Ok(())
}

fn run_kpis(config: &AppConfig) -> Result<()> {
    let saida = &config.caminhos.saida;
    let (enriched, _) = load_enriched(config)?;

    let chamadas = kpis::chamados_por_cliente(&enriched);
    output::write_csv(&saida.join("kpi_chamadas_por_cliente.csv"), &chamadas)?;
    output::preview_table("KPI: chamados por cliente", &chamadas, 5);

    let demandas = kpis::demandas_por_mes(&enriched);
    output::write_csv(&saida.join("kpi_demandas_por_mes.csv"), &demandas)?;
    output::preview_table("KPI: demandas por mês", &demandas, 5);

    let receita = kpis::receita_por_status(&enriched);
    output::write_csv(&saida.join("kpi_financeiro_por_status.csv"), &receita)?;
    output::preview_table("KPI: receita por status financeiro", &receita, receita.len());

    let financeiro = vec![kpis::resumo_financeiro(&enriched)];
    output::write_csv(&saida.join("kpi_financeiro_resumo.csv"), &financeiro)?;
    output::preview_table("KPI: resumo financeiro", &financeiro, financeiro.len());

    let por_tipo = kpis::sla_por_tipo(&enriched);
    output::write_csv(&saida.join("kpi_sla_por_tipo.csv"), &por_tipo)?;
    output::preview_table("KPI: SLA por tipo de serviço", &por_tipo, 5);

    let por_cliente = kpis::sla_por_cliente(&enriched);
    output::write_csv(&saida.join("kpi_sla_por_cliente.csv"), &por_cliente)?;
    output::preview_table("KPI: SLA por cliente", &por_cliente, 5);

    let resumo = kpis::resumo_geral(&enriched);
    output::write_json(&saida.join("resumo.json"), &resumo)?;
    println!(
        "Resumo geral: {} registros, {} chamados únicos, {} clientes, {} OS fora do prazo.",
        util::format_int(resumo.registros),
        util::format_int(resumo.chamados_unicos),
        util::format_int(resumo.clientes),
        util::format_int(resumo.fora_sla)
    );
    println!("Arquivos gerados em {}", saida.display());
    Ok(())
}

fn run_relatorio(config: &AppConfig, filters: ReportFilters) -> Result<()> {
    let (enriched, _) = load_enriched(config)?;
    let scoped = report::filter_orders(&enriched, &filters);
    println!(
        "Recorte do relatório: {} de {} registros.",
        util::format_int(scoped.len()),
        util::format_int(enriched.len())
    );

    let markdown = report::executive_report(&scoped, &filters, Local::now().naive_local());
    let path = config.caminhos.saida.join("relatorio_executivo.md");
    output::write_text(&path, &markdown)?;
    println!("Relatório gravado em {}", path.display());
    Ok(())
}
