mod codecs;
mod registry;
mod tokens;

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use zdraw_core::group::ShapeGroup;

pub use codecs::{
    GroupReaderWriter, LeafPayload, LeafReaderWriter, register_builtin_shapes, register_leaf,
};
pub use registry::{Registries, ShapeCreator, ShapeFactory, ShapeReaderWriter, ShapeRwRegistry};
pub use tokens::{TokenReader, TokenWriter};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unregistered shape type: {0}")]
    UnregisteredType(String),
    #[error("malformed stream: {0}")]
    MalformedStream(String),
    #[error("shape type {0} is already registered")]
    DuplicateRegistration(String),
    #[error("codec for {expected} received a {found} shape")]
    CodecMismatch { expected: String, found: String },
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),
}

impl IoError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedStream(message.into())
    }
}

/// 读取文档根组。`Ok(None)` 表示输入为空或不以 `ShapeGroup` 开头，即无可加载内容。
pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Option<ShapeGroup>, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, root: &ShapeGroup, path: &Path) -> Result<(), IoError>;
}

/// 文本格式门面，持有注入的注册表。
pub struct TextFacade<'r> {
    registries: &'r Registries,
    indent: usize,
}

impl<'r> TextFacade<'r> {
    pub fn new(registries: &'r Registries) -> Self {
        Self {
            registries,
            indent: 2,
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[inline]
    pub fn registries(&self) -> &'r Registries {
        self.registries
    }

    /// 从文本解析根组。根记录之后残留的标记视为格式错误。
    pub fn read_str(&self, source: &str) -> Result<Option<ShapeGroup>, IoError> {
        let mut tokens = TokenReader::new(source);
        match tokens.next_token() {
            None => return Ok(None),
            Some(id) if id != ShapeGroup::TAG.as_str() => {
                warn!(token = id, "文档首个标记不是 ShapeGroup，忽略内容");
                return Ok(None);
            }
            Some(_) => {}
        }

        let mut root = ShapeGroup::new();
        let codec = self.registries.codecs.get(ShapeGroup::TAG)?;
        codec.read(&mut root, &mut tokens, self.registries)?;

        if let Some(extra) = tokens.peek_token() {
            return Err(IoError::malformed(format!(
                "根记录结束后仍有多余标记 \"{extra}\"（第 {} 个标记）",
                tokens.position() + 1
            )));
        }
        Ok(Some(root))
    }

    pub fn write_to(&self, root: &ShapeGroup, out: &mut dyn Write) -> Result<(), IoError> {
        let mut writer = TokenWriter::new(out).with_indent(self.indent);
        self.registries.write_shape(root, &mut writer)?;
        writer.flush()
    }

    pub fn write_string(&self, root: &ShapeGroup) -> Result<String, IoError> {
        let mut buffer = Vec::new();
        self.write_to(root, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl DocumentLoader for TextFacade<'_> {
    fn load(&self, path: &Path) -> Result<Option<ShapeGroup>, IoError> {
        let data = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::InvalidData => {
                IoError::malformed(format!("{} 不是有效的 UTF-8 文本", path.display()))
            }
            _ => IoError::ReadError {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let root = self.read_str(&data)?;
        if let Some(root) = &root {
            info!(path = %path.display(), shapes = root.len(), "读取文档完成");
        }
        Ok(root)
    }
}

impl DocumentSaver for TextFacade<'_> {
    fn save(&self, root: &ShapeGroup, path: &Path) -> Result<(), IoError> {
        let file = fs::File::create(path).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut out = BufWriter::new(file);
        self.write_to(root, &mut out).map_err(|err| match err {
            IoError::Stream(source) => IoError::WriteError {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!(path = %path.display(), shapes = root.len(), "保存文档完成");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_foreign_input_is_nothing_to_load() {
        let registries = Registries::with_builtin_shapes().unwrap();
        let facade = TextFacade::new(&registries);
        assert!(facade.read_str("").unwrap().is_none());
        assert!(facade.read_str("   \n\t").unwrap().is_none());
        assert!(facade.read_str("Circle 0 0 1").unwrap().is_none());
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let registries = Registries::with_builtin_shapes().unwrap();
        let facade = TextFacade::new(&registries);
        let err = facade.read_str("ShapeGroup 0 Circle").unwrap_err();
        assert!(matches!(err, IoError::MalformedStream(ref msg) if msg.contains("Circle")));
    }

    #[test]
    fn missing_file_reports_read_error() {
        let registries = Registries::with_builtin_shapes().unwrap();
        let facade = TextFacade::new(&registries);
        let dir = tempfile::tempdir().unwrap();
        let err = facade.load(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, IoError::ReadError { .. }));
    }
}
