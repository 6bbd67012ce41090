// ==========================================
// 月度绩效评优系统 - 批处理主入口
// ==========================================
// 依据: 月度汇总计算说明 v1.2
// 系统定位: 决策支持系统 (评优结果供人工终审)
// 用法: monthly-top-aps [输入目录] [输出目录]
// ==========================================

use monthly_top_aps::engine::CountingDiagnostics;
use monthly_top_aps::{
    logging, ConfigManager, CsvReportWriter, PipelineOrchestrator, ReportBuilder,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    info!("==================================================");
    info!("{} - 决策支持系统", monthly_top_aps::APP_NAME);
    info!("系统版本: {}", monthly_top_aps::VERSION);
    info!("==================================================");

    let mut args = std::env::args().skip(1);
    let input_dir = PathBuf::from(args.next().unwrap_or_else(|| "IN".to_string()));
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "OUT".to_string()));
    info!(input = %input_dir.display(), output = %output_dir.display(), "运行目录");

    match run(input_dir, output_dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("运行失败: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(input_dir: PathBuf, output_dir: PathBuf) -> monthly_top_aps::AppResult<()> {
    // 配置: 内置默认 + 启动期校验
    let config = Arc::new(ConfigManager::with_defaults());
    config.validate()?;
    info!("配置校验通过");
    tracing::debug!(snapshot = %config.snapshot_json()?, "配置快照");

    let diagnostics = Arc::new(CountingDiagnostics::new());
    let orchestrator = PipelineOrchestrator::new(config, diagnostics.clone());

    let result = orchestrator.run_from_dir(&input_dir).await?;

    // 报表落盘 (运行标签取启动时刻)
    let run_tag = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let tables = ReportBuilder::new().build_all(&result);
    let paths = CsvReportWriter::new().write_all(&tables, &output_dir, &run_tag)?;

    info!(diagnostics = %diagnostics.to_json(), "运行诊断汇总");
    info!(
        employees = result.identities.len(),
        tables = paths.len(),
        "评优计算完成"
    );
    Ok(())
}
