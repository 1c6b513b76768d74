use std::collections::HashMap;

use tracing::debug;
use zdraw_core::geometry::Vector2;

use crate::document::GraphicsDoc;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_, '_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a, 'r> {
    pub document: &'a mut GraphicsDoc<'r>,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(TranslateCommand);
        bus.register(ClearCommand);
        bus.register(DuplicateCommand);
        bus.register(RemoveCommand);
        bus.register(SummaryCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_, '_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            debug!(command = request.name.as_str(), "执行文档命令");
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    /// 已注册命令名，按字典序排列。
    pub fn available_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

struct TranslateCommand;

impl CommandHandler for TranslateCommand {
    fn name(&self) -> &'static str {
        "translate"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_, '_>,
    ) -> CommandResponse {
        let [dx, dy] = request.args.as_slice() else {
            return CommandResponse::err("translate 需要两个参数: <dx> <dy>");
        };
        let (Ok(dx), Ok(dy)) = (dx.parse::<i32>(), dy.parse::<i32>()) else {
            return CommandResponse::err(format!("translate 参数不是整数: {dx} {dy}"));
        };
        context.document.translate(Vector2::new(dx, dy));
        CommandResponse::ok(format!("全部图形已平移 ({dx}, {dy})"))
    }
}

struct ClearCommand;

impl CommandHandler for ClearCommand {
    fn name(&self) -> &'static str {
        "clear"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_, '_>,
    ) -> CommandResponse {
        context.document.clear();
        CommandResponse::ok("文档已清空")
    }
}

struct DuplicateCommand;

impl CommandHandler for DuplicateCommand {
    fn name(&self) -> &'static str {
        "duplicate"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_, '_>,
    ) -> CommandResponse {
        let count = context.document.duplicate();
        CommandResponse::ok(format!("已复制 {count} 个顶层图形"))
    }
}

struct RemoveCommand;

impl CommandHandler for RemoveCommand {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_, '_>,
    ) -> CommandResponse {
        let [index] = request.args.as_slice() else {
            return CommandResponse::err("remove 需要一个参数: <index>");
        };
        let Ok(index) = index.parse::<usize>() else {
            return CommandResponse::err(format!("remove 参数不是有效序号: {index}"));
        };
        match context.document.remove(index) {
            Ok(shape) => {
                CommandResponse::ok(format!("已移除第 {index} 个顶层图形 ({})", shape.tag()))
            }
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct SummaryCommand;

impl CommandHandler for SummaryCommand {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_, '_>,
    ) -> CommandResponse {
        let shapes = context.document.shapes();
        CommandResponse::ok(format!(
            "顶层图形 {} 个，叶子图形 {} 个",
            shapes.len(),
            shapes.leaf_count()
        ))
    }
}
