use std::path::PathBuf;

use tracing::{info, warn};
use zdraw_config::AppConfig;
use zdraw_core::draw::{DrawSink, Primitive};
use zdraw_engine::command::{CommandBus, CommandContext, CommandRequest};
use zdraw_io::Registries;

use crate::errors::FrontendError;
use crate::loader::{DocumentSource, load_document_or_demo};

/// 命令行覆盖项，未指定时使用配置文件中的值。
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub demo: bool,
    pub translate: Option<(i32, i32)>,
}

/// 一次运行的结果统计。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub source: DocumentSource,
    pub top_level: usize,
    pub primitives: usize,
    pub output: PathBuf,
}

/// 将图元直接打印到标准输出。
#[derive(Debug, Default)]
pub struct ConsoleSink {
    emitted: usize,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

impl DrawSink for ConsoleSink {
    fn emit(&mut self, primitive: Primitive) {
        self.emitted += 1;
        println!("  {}", describe_primitive(&primitive));
    }
}

pub fn describe_primitive(primitive: &Primitive) -> String {
    match primitive {
        Primitive::Segment { start, end } => format!(
            "线段 ({}, {}) -> ({}, {})",
            start.x(),
            start.y(),
            end.x(),
            end.y()
        ),
        Primitive::Circle { center, radius } => {
            format!("圆 圆心=({}, {}), 半径={}", center.x(), center.y(), radius)
        }
        Primitive::Polygon(points) => {
            let coords: Vec<String> = points
                .iter()
                .map(|point| format!("({}, {})", point.x(), point.y()))
                .collect();
            format!("多边形 [{}]", coords.join(", "))
        }
    }
}

/// CLI 主流程：注册图形种类、加载文档、执行可选命令、绘制并保存。
pub fn run(config: &AppConfig, options: &CliOptions) -> Result<RunSummary, FrontendError> {
    let registries = Registries::shared().map_err(FrontendError::Registration)?;
    info!(kinds = ?registries.factory.ids(), "图形种类注册完成");

    let input = if options.demo {
        None
    } else {
        Some(options.input.as_ref().unwrap_or(&config.document.input))
    };
    let loaded = load_document_or_demo(registries, input.map(PathBuf::as_path), config.document.indent)?;
    let mut document = loaded.document;

    match &loaded.source {
        DocumentSource::File(path) => println!("已从文件加载文档：{}", path.display()),
        DocumentSource::Demo => println!("已构建内置示例图形"),
    }

    let bus = CommandBus::new();
    let mut context = CommandContext {
        document: &mut document,
    };
    if let Some((dx, dy)) = options.translate {
        let request = CommandRequest::new("translate", [dx.to_string(), dy.to_string()]);
        let response = bus.dispatch(&request, &mut context);
        if !response.success {
            warn!(message = ?response.message, "平移命令执行失败");
        }
    }
    let summary = bus.dispatch(&CommandRequest::new("summary", [""; 0]), &mut context);
    if let Some(message) = summary.message {
        println!("{message}");
    }

    println!("绘制文档：");
    let mut sink = ConsoleSink::new();
    document.render(&mut sink);

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| config.document.output.clone());
    document.save(&output)?;
    println!("已保存到 {}", output.display());

    Ok(RunSummary {
        source: loaded.source,
        top_level: document.len(),
        primitives: sink.emitted(),
        output,
    })
}
