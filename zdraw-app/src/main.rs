use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use zdraw_config::{AppConfig, ConfigError};
use zdraw_frontend::CliOptions;

/// 读取图形文档、绘制到控制台并重新保存。
#[derive(Debug, Parser)]
#[command(name = "zdraw", version)]
struct Args {
    /// 配置文件路径，默认读取 `ZDRAW_CONFIG` 或 `./config/default.toml`
    #[arg(long)]
    config: Option<PathBuf>,
    /// 输入文档，覆盖配置中的 `document.input`
    #[arg(long)]
    input: Option<PathBuf>,
    /// 输出文档，覆盖配置中的 `document.output`
    #[arg(long)]
    output: Option<PathBuf>,
    /// 忽略输入文件，使用内置示例图形
    #[arg(long)]
    demo: bool,
    /// 保存前平移全部图形
    #[arg(long, num_args = 2, value_names = ["DX", "DY"], allow_negative_numbers = true)]
    translate: Option<Vec<i32>>,
}

fn main() {
    let args = Args::parse();
    let config = load_configuration(args.config.clone());
    init_logging(&config);
    info!("启动 zdraw");

    if let Err(err) = run(args, &config) {
        error!(error = %err, "运行失败");
        eprintln!("错误: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args, config: &AppConfig) -> anyhow::Result<()> {
    let translate = match args.translate.as_deref() {
        Some([dx, dy]) => Some((*dx, *dy)),
        Some(_) => anyhow::bail!("`--translate` 需要两个整数参数"),
        None => None,
    };
    let options = CliOptions {
        input: args.input,
        output: args.output,
        demo: args.demo,
        translate,
    };
    zdraw_frontend::run_cli(config, &options).context("执行 CLI 前端失败")?;
    Ok(())
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
