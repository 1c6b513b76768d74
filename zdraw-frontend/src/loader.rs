use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zdraw_engine::document::{GraphicsDoc, LoadOutcome};
use zdraw_io::Registries;

use crate::errors::FrontendError;

/// 文档来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Demo,
}

/// 统一封装加载后的文档与来源。
#[derive(Debug)]
pub struct LoadedDocument<'r> {
    pub document: GraphicsDoc<'r>,
    pub source: DocumentSource,
}

/// 从给定路径加载文档；文件不存在或没有可加载内容时回退到内置示例。
///
/// 格式错误不回退，直接返回错误，避免随后保存时覆盖原有数据。
pub fn load_document_or_demo<'r>(
    registries: &'r Registries,
    input: Option<&Path>,
    indent: usize,
) -> Result<LoadedDocument<'r>, FrontendError> {
    let mut document = GraphicsDoc::new(registries).with_indent(indent);

    if let Some(path) = input {
        match document.load(path)? {
            LoadOutcome::Loaded { shapes } => {
                info!(path = %path.display(), shapes, "从文件加载文档成功");
                return Ok(LoadedDocument {
                    document,
                    source: DocumentSource::File(path.to_path_buf()),
                });
            }
            LoadOutcome::NothingToLoad => {
                warn!(path = %path.display(), "文件中没有可加载的图形，回退到内置示例");
            }
        }
    }

    document.populate_demo();
    Ok(LoadedDocument {
        document,
        source: DocumentSource::Demo,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn missing_input_falls_back_to_demo() {
        let registries = Registries::with_builtin_shapes().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let loaded =
            load_document_or_demo(&registries, Some(&dir.path().join("none.txt")), 2).unwrap();
        assert_eq!(loaded.source, DocumentSource::Demo);
        assert!(!loaded.document.is_empty());
    }

    #[test]
    fn existing_input_is_loaded() {
        let registries = Registries::with_builtin_shapes().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.txt");
        fs::write(&path, "ShapeGroup 1 Circle 0 0 4\n").unwrap();

        let loaded = load_document_or_demo(&registries, Some(&path), 2).unwrap();
        assert_eq!(loaded.source, DocumentSource::File(path));
        assert_eq!(loaded.document.len(), 1);
    }

    #[test]
    fn malformed_input_is_an_error() {
        let registries = Registries::with_builtin_shapes().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        fs::write(&path, "ShapeGroup 2 Circle 0 0 4\n").unwrap();

        let err = load_document_or_demo(&registries, Some(&path), 2).unwrap_err();
        assert!(matches!(err, FrontendError::Engine(_)));
    }
}
