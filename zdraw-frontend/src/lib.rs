pub mod cli;
pub mod errors;
pub mod loader;

use errors::FrontendError;
use tracing::info;
use zdraw_config::AppConfig;

pub use cli::{CliOptions, RunSummary};

/// 运行命令行前端。
pub fn run_cli(config: &AppConfig, options: &CliOptions) -> Result<RunSummary, FrontendError> {
    info!("启动 CLI 前端");
    let summary = cli::run(config, options)?;
    info!(
        top_level = summary.top_level,
        primitives = summary.primitives,
        output = %summary.output.display(),
        "CLI 运行完成"
    );
    Ok(summary)
}
