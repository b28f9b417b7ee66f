//! 运费折扣计算工具
//!
//! 读取发货记录文件，按默认规则链计算每条记录的价格和折扣，输出到 stdout。

use anyhow::{Context, Result};
use clap::Parser;
use rule_engine::report::{self, OutputFormat};
use rule_engine::{Dependencies, RuleEngine, parser, rules};
use shipment_shared::config::AppConfig;
use shipment_shared::observability;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

const SERVICE_NAME: &str = "shipment-discounts";

/// 运费折扣计算
#[derive(Parser, Debug)]
#[command(name = "shipment-discounts")]
#[command(version, about = "按月度规则计算发货价格与折扣")]
struct Cli {
    /// 输入文件，每行 `DATE SIZE PROVIDER`
    input: PathBuf,

    /// 输出格式 (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// 额外输出月度聚合汇总
    #[arg(long)]
    summary: bool,

    /// 日志级别，覆盖配置 (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// 配置目录，默认读取 CONFIG_DIR 或 ./config
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config_dir {
        Some(dir) => AppConfig::load_from(dir, SERVICE_NAME),
        None => AppConfig::load(SERVICE_NAME),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    observability::init(&config.observability)?;

    let dependencies =
        Dependencies::from_config(&config.pricing).context("Invalid pricing configuration")?;

    let facts = parser::read_facts(&cli.input)
        .with_context(|| format!("Could not read the file {}", cli.input.display()))?;
    info!(input = %cli.input.display(), records = facts.len(), "Input loaded");

    let mut engine = RuleEngine::new(rules::default_rules(), dependencies);
    let results = engine.run(facts);

    let mut stdout = std::io::stdout().lock();
    let summary = cli.summary.then(|| engine.store());
    let output = report::render_report(&results, summary, cli.format)?;
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
