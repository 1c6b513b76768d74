pub mod command;

pub mod errors {
    use thiserror::Error;
    use zdraw_io::IoError;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error(transparent)]
        Io(#[from] IoError),
        #[error("shape index {index} out of range (document holds {len} shapes)")]
        ShapeIndexOutOfRange { index: usize, len: usize },
    }
}

pub mod document {
    use std::path::Path;

    use tracing::{debug, info, warn};
    use zdraw_core::draw::DrawSink;
    use zdraw_core::geometry::{Point2, Vector2};
    use zdraw_core::group::{ShapeGroup, ShapePtr};
    use zdraw_core::shape::Shape;
    use zdraw_core::shapes::{Circle, Line, Rectangle, Square};
    use zdraw_io::{DocumentLoader, DocumentSaver, IoError, Registries, TextFacade};

    use crate::errors::EngineError;

    /// 加载结果：无可加载内容不视为错误。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LoadOutcome {
        Loaded { shapes: usize },
        NothingToLoad,
    }

    /// 图形文档：持有根组并通过注入的注册表完成读写。
    #[derive(Debug)]
    pub struct GraphicsDoc<'r> {
        registries: &'r Registries,
        shapes: ShapeGroup,
        indent: usize,
    }

    impl<'r> GraphicsDoc<'r> {
        pub fn new(registries: &'r Registries) -> Self {
            Self {
                registries,
                shapes: ShapeGroup::new(),
                indent: 2,
            }
        }

        /// 设置保存时每层嵌套的缩进空格数。
        pub fn with_indent(mut self, indent: usize) -> Self {
            self.indent = indent;
            self
        }

        fn facade(&self) -> TextFacade<'r> {
            TextFacade::new(self.registries).with_indent(self.indent)
        }

        #[inline]
        pub fn registries(&self) -> &'r Registries {
            self.registries
        }

        #[inline]
        pub fn shapes(&self) -> &ShapeGroup {
            &self.shapes
        }

        #[inline]
        pub fn shapes_mut(&mut self) -> &mut ShapeGroup {
            &mut self.shapes
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.shapes.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.shapes.is_empty()
        }

        pub fn add(&mut self, shape: ShapePtr) {
            self.shapes.add(shape);
        }

        /// 移除指定位置的顶层图形。
        pub fn remove(&mut self, index: usize) -> Result<ShapePtr, EngineError> {
            let len = self.shapes.len();
            self.shapes
                .remove(index)
                .ok_or(EngineError::ShapeIndexOutOfRange { index, len })
        }

        pub fn clear(&mut self) {
            self.shapes.clear();
        }

        pub fn render(&self, sink: &mut dyn DrawSink) {
            self.shapes.draw(sink);
        }

        pub fn translate(&mut self, offset: Vector2) {
            self.shapes.translate(offset);
        }

        /// 将当前全部顶层图形的深拷贝追加到末尾，返回追加数量。
        pub fn duplicate(&mut self) -> usize {
            let copies: Vec<ShapePtr> = self.shapes.iter().cloned().collect();
            let count = copies.len();
            self.shapes.extend(copies);
            count
        }

        /// 从文件加载并追加到当前根组。
        ///
        /// 文件无法打开、内容为空或不以 `ShapeGroup` 开头时返回 `NothingToLoad`；
        /// 格式错误（包括非 UTF-8 内容）时返回错误且当前文档保持不变。
        pub fn load(&mut self, path: &Path) -> Result<LoadOutcome, EngineError> {
            match self.facade().load(path) {
                Ok(root) => Ok(self.attach(root)),
                Err(IoError::ReadError { path, source }) => {
                    warn!(path = %path.display(), error = %source, "无法打开文档，视为无内容");
                    Ok(LoadOutcome::NothingToLoad)
                }
                Err(err) => Err(err.into()),
            }
        }

        pub fn load_str(&mut self, source: &str) -> Result<LoadOutcome, EngineError> {
            let root = self.facade().read_str(source)?;
            Ok(self.attach(root))
        }

        fn attach(&mut self, root: Option<ShapeGroup>) -> LoadOutcome {
            match root {
                Some(root) => {
                    let shapes = root.len();
                    self.shapes.extend(root.into_children());
                    info!(shapes, total = self.shapes.len(), "文档内容已加载");
                    LoadOutcome::Loaded { shapes }
                }
                None => {
                    warn!("没有可加载的图形");
                    LoadOutcome::NothingToLoad
                }
            }
        }

        pub fn save(&self, path: &Path) -> Result<(), EngineError> {
            self.facade().save(&self.shapes, path)?;
            Ok(())
        }

        pub fn to_text(&self) -> Result<String, EngineError> {
            Ok(self.facade().write_string(&self.shapes)?)
        }

        /// 填充一组示例图形，供 CLI 在没有输入文件时演示。
        pub fn populate_demo(&mut self) {
            let mut house = ShapeGroup::new();
            house.add(Box::new(Rectangle::new(Point2::new(10, 40), 60, 40)));
            house.add(Box::new(Line::new(Point2::new(10, 40), Point2::new(40, 10))));
            house.add(Box::new(Line::new(Point2::new(40, 10), Point2::new(70, 40))));
            house.add(Box::new(Square::new(Point2::new(20, 50), 10)));

            let mut scene = ShapeGroup::new();
            scene.add(Box::new(house));
            scene.add(Box::new(Circle::new(Point2::new(100, 15), 8)));

            self.shapes.add(Box::new(scene));
            self.shapes
                .add(Box::new(Line::new(Point2::new(0, 80), Point2::new(120, 80))));

            debug!(
                top_level = self.shapes.len(),
                leaves = self.shapes.leaf_count(),
                "已创建演示图形"
            );
        }
    }

    #[cfg(test)]
    mod tests {
        use zdraw_core::draw::RecordingSink;

        use super::*;

        fn registries() -> Registries {
            Registries::with_builtin_shapes().expect("注册内置图形失败")
        }

        #[test]
        fn load_appends_to_existing_shapes() {
            let registries = registries();
            let mut doc = GraphicsDoc::new(&registries);
            doc.add(Box::new(Circle::default()));

            let outcome = doc
                .load_str("ShapeGroup 2 Square 0 0 1 Line 0 0 1 1")
                .expect("加载失败");
            assert_eq!(outcome, LoadOutcome::Loaded { shapes: 2 });
            assert_eq!(doc.len(), 3);
            assert_eq!(doc.shapes().get(1).map(|shape| shape.tag()), Some(Square::TAG));
        }

        #[test]
        fn malformed_input_keeps_document_unchanged() {
            let registries = registries();
            let mut doc = GraphicsDoc::new(&registries);
            doc.populate_demo();
            let before = doc.shapes().clone();

            let err = doc.load_str("ShapeGroup 2 Circle 0 0 1 Nope").unwrap_err();
            assert!(matches!(err, EngineError::Io(IoError::UnregisteredType(_))));
            assert_eq!(doc.shapes(), &before);
        }

        #[test]
        fn corrupt_file_is_an_error_not_nothing_to_load() {
            let registries = registries();
            let mut doc = GraphicsDoc::new(&registries);
            doc.add(Box::new(Circle::default()));
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("corrupt.txt");
            std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

            let err = doc.load(&path).unwrap_err();
            assert!(matches!(err, EngineError::Io(IoError::MalformedStream(_))));
            assert_eq!(doc.len(), 1);
        }

        #[test]
        fn missing_file_or_foreign_content_is_nothing_to_load() {
            let registries = registries();
            let mut doc = GraphicsDoc::new(&registries);
            let dir = tempfile::tempdir().unwrap();

            let outcome = doc.load(&dir.path().join("none.txt")).unwrap();
            assert_eq!(outcome, LoadOutcome::NothingToLoad);
            assert_eq!(doc.load_str("").unwrap(), LoadOutcome::NothingToLoad);
            assert_eq!(doc.load_str("Rectangle 0 0 1 1").unwrap(), LoadOutcome::NothingToLoad);
            assert!(doc.is_empty());
        }

        #[test]
        fn save_then_load_reproduces_document() {
            let registries = registries();
            let mut doc = GraphicsDoc::new(&registries);
            doc.populate_demo();

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("demo.txt");
            doc.save(&path).expect("保存失败");

            let mut reloaded = GraphicsDoc::new(&registries);
            let outcome = reloaded.load(&path).expect("读取失败");
            assert_eq!(outcome, LoadOutcome::Loaded { shapes: 2 });
            assert_eq!(reloaded.shapes(), doc.shapes());
        }

        #[test]
        fn render_emits_every_leaf() {
            let registries = registries();
            let mut doc = GraphicsDoc::new(&registries);
            doc.populate_demo();
            let mut sink = RecordingSink::new();
            doc.render(&mut sink);
            assert_eq!(sink.len(), doc.shapes().leaf_count());
            assert_eq!(sink.len(), 6);
        }

        #[test]
        fn duplicate_appends_independent_copies() {
            let registries = registries();
            let mut doc = GraphicsDoc::new(&registries);
            doc.populate_demo();
            assert_eq!(doc.duplicate(), 2);
            assert_eq!(doc.len(), 4);

            doc.shapes_mut()
                .get_mut(2)
                .unwrap()
                .translate(Vector2::new(5, 5));
            assert!(*doc.shapes().get(0).unwrap() != *doc.shapes().get(2).unwrap());
            assert!(*doc.shapes().get(1).unwrap() == *doc.shapes().get(3).unwrap());
        }

        #[test]
        fn remove_checks_bounds() {
            let registries = registries();
            let mut doc = GraphicsDoc::new(&registries);
            doc.populate_demo();
            let removed = doc.remove(1).unwrap();
            assert_eq!(removed.tag(), Line::TAG);
            assert_eq!(doc.len(), 1);
            let err = doc.remove(3).unwrap_err();
            assert!(matches!(err, EngineError::ShapeIndexOutOfRange { index: 3, len: 1 }));
        }

        #[test]
        fn text_output_uses_configured_indent() {
            let registries = registries();
            let mut doc = GraphicsDoc::new(&registries).with_indent(4);
            doc.load_str("ShapeGroup 1 ShapeGroup 1 Circle 1 2 3").unwrap();
            assert_eq!(
                doc.to_text().unwrap(),
                "ShapeGroup 1\n    ShapeGroup 1\n        Circle 1 2 3\n"
            );
        }
    }
}
