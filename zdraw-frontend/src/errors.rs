use thiserror::Error;
use zdraw_engine::errors::EngineError;
use zdraw_io::IoError;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("图形种类注册失败: {0}")]
    Registration(#[source] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
