// ==========================================
// 课程学分导入工具 - 命令行入口
// ==========================================
// 子命令:
//   import   读取 → 导入 → 写出 → 通知
//   validate 只做解码与校验，存在 Error 级问题时退出码为 1
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use credit_importer::config::ConfigManager;
use credit_importer::domain::{DqReport, ImportSummary};
use credit_importer::i18n::{self, t, t_with_args};
use credit_importer::importer::{CreditImporter, CreditImporterImpl, ImportRequest};
use credit_importer::logging;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "credit-importer")]
#[command(version, about = "Copy approved course completions into the completed-credits sheet", long_about = None)]
struct Cli {
    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 导入新的已审批学分
    Import {
        #[command(flatten)]
        files: FileArgs,

        /// 输出文件（默认覆盖目标文件）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 只生成计划，不写出、不通知
        #[arg(long)]
        dry_run: bool,

        /// 以 JSON 输出导入汇总
        #[arg(long)]
        json: bool,
    },
    /// 校验源表与目标表，报告数据质量问题
    Validate {
        #[command(flatten)]
        files: FileArgs,

        /// 以 JSON 输出 DQ 报告
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct FileArgs {
    /// 源文件（.csv / .xlsx / .xls / .ods）
    #[arg(short, long)]
    source: PathBuf,

    /// 目标文件（.csv / .xlsx）
    #[arg(short, long)]
    destination: PathBuf,

    /// 源表工作表名
    #[arg(long)]
    source_sheet: Option<String>,

    /// 目标表工作表名
    #[arg(long)]
    destination_sheet: Option<String>,

    /// 配置文件（JSON）；未指定时读取 $CREDIT_IMPORTER_CONFIG 或用户配置目录
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 覆写单个配置项，例如 --set numeric_policy=reject
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

impl FileArgs {
    fn load_config(&self) -> Result<ConfigManager> {
        let mut config = match &self.config {
            Some(path) => ConfigManager::load(path)?,
            None => ConfigManager::load_default()?,
        };

        for entry in &self.overrides {
            let Some((key, value)) = entry.split_once('=') else {
                bail!(t_with_args("config.invalid_override", &[("value", entry.as_str())]));
            };
            config.set_value(key.trim(), value)?;
        }

        match config.source() {
            Some(path) => {
                let path = path.display().to_string();
                info!("{}", t_with_args("config.loaded", &[("path", path.as_str())]));
            }
            None => info!("{}", t("config.defaults")),
        }
        Ok(config)
    }

    fn request(&self, output: Option<PathBuf>, dry_run: bool) -> ImportRequest {
        ImportRequest {
            source_path: self.source.clone(),
            destination_path: self.destination.clone(),
            output_path: output,
            source_sheet: self.source_sheet.clone(),
            destination_sheet: self.destination_sheet.clone(),
            dry_run,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(cli.log_json);
    i18n::init_from_env();

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "执行失败");
            let message = format!("{:#}", e);
            eprintln!("{}", t_with_args("import.failed", &[("error", message.as_str())]));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Import {
            files,
            output,
            dry_run,
            json,
        } => {
            let config = files.load_config()?;
            let importer = CreditImporterImpl::from_config(config)?;
            let request = files.request(output, dry_run);

            info!(
                "{}",
                t_with_args(
                    "import.starting",
                    &[
                        ("source", request.source_path.display().to_string().as_str()),
                        ("destination", request.destination_path.display().to_string().as_str()),
                    ],
                )
            );

            let summary = importer
                .run_files(&request)
                .with_context(|| format!("导入 {} 失败", request.source_path.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
                let written = request
                    .output_path
                    .as_ref()
                    .unwrap_or(&request.destination_path);
                if summary.dry_run {
                    println!("{}", t("import.dry_run"));
                } else {
                    println!(
                        "{}",
                        t_with_args("import.written", &[("path", written.display().to_string().as_str())])
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { files, json } => {
            let config = files.load_config()?;
            let importer = CreditImporterImpl::from_config(config)?;
            let request = files.request(None, true);

            info!(
                "{}",
                t_with_args(
                    "validate.starting",
                    &[
                        ("source", request.source_path.display().to_string().as_str()),
                        ("destination", request.destination_path.display().to_string().as_str()),
                    ],
                )
            );

            let report = importer.validate_files(&request)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if report.has_errors() {
                if !json {
                    println!(
                        "{}",
                        t_with_args(
                            "validate.has_errors",
                            &[("count", report.summary.error.to_string().as_str())]
                        )
                    );
                }
                return Ok(ExitCode::from(1));
            }
            if !json && report.issues.is_empty() {
                println!("{}", t("validate.clean"));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn count_line(key: &str, count: usize) -> String {
    t_with_args(key, &[("count", count.to_string().as_str())])
}

fn print_summary(summary: &ImportSummary) {
    println!("{}", t_with_args("summary.run_id", &[("run_id", summary.run_id.as_str())]));
    println!("{}", count_line("summary.total_rows", summary.total_rows));
    println!("{}", count_line("summary.unapproved", summary.unapproved));
    println!("{}", count_line("summary.duplicates", summary.duplicates));
    if summary.batch_duplicates > 0 {
        println!("{}", count_line("summary.batch_duplicates", summary.batch_duplicates));
    }
    if summary.preexisting_duplicates > 0 {
        println!(
            "{}",
            count_line("summary.preexisting_duplicates", summary.preexisting_duplicates)
        );
    }
    println!("{}", count_line("summary.planned", summary.planned));
    println!("{}", count_line("summary.inserted", summary.inserted));
    println!(
        "{}",
        t_with_args(
            "summary.notified",
            &[
                ("count", summary.notified.to_string().as_str()),
                ("failed", summary.notify_failures.to_string().as_str()),
            ],
        )
    );
    print_report(&summary.dq_report);
}

fn print_report(report: &DqReport) {
    println!(
        "{}",
        t_with_args(
            "summary.issues",
            &[
                ("info", report.summary.info.to_string().as_str()),
                ("warning", report.summary.warning.to_string().as_str()),
                ("error", report.summary.error.to_string().as_str()),
            ],
        )
    );
    for issue in &report.issues {
        println!(
            "{}",
            t_with_args(
                "summary.issue_line",
                &[
                    ("level", issue.level.to_string().as_str()),
                    ("sheet", issue.sheet.as_str()),
                    ("row", issue.row_number.to_string().as_str()),
                    ("field", issue.field.as_str()),
                    ("message", issue.message.as_str()),
                    ("value", issue.value.as_str()),
                ],
            )
        );
    }
}
