pub mod geometry {
    use glam::IVec2;
    use serde::{Deserialize, Serialize};

    /// 二维整数点，内部以 `glam::IVec2` 表示，与文本格式中的整数坐标一一对应。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Point2(pub IVec2);

    impl Point2 {
        #[inline]
        pub const fn new(x: i32, y: i32) -> Self {
            Self(IVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> i32 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> i32 {
            self.0.y
        }

        /// 平移后的点，各分量在 `i32` 范围内饱和。
        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0.saturating_add(offset.0))
        }
    }

    impl From<IVec2> for Point2 {
        fn from(value: IVec2) -> Self {
            Self(value)
        }
    }

    /// 二维整数位移。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Vector2(pub IVec2);

    impl Vector2 {
        pub const ZERO: Vector2 = Vector2(IVec2::ZERO);

        #[inline]
        pub const fn new(dx: i32, dy: i32) -> Self {
            Self(IVec2::new(dx, dy))
        }

        #[inline]
        pub fn x(self) -> i32 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> i32 {
            self.0.y
        }
    }

    impl From<IVec2> for Vector2 {
        fn from(value: IVec2) -> Self {
            Self(value)
        }
    }
}

pub mod draw {
    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    /// 图形输出的最小绘制单元，由具体输出端（控制台、测试记录器等）解释。
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Primitive {
        Segment { start: Point2, end: Point2 },
        Circle { center: Point2, radius: u32 },
        Polygon(Vec<Point2>),
    }

    /// 绘制输出端。
    pub trait DrawSink {
        fn emit(&mut self, primitive: Primitive);
    }

    /// 按顺序记录所有图元，便于校验绘制顺序与统计。
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        primitives: Vec<Primitive>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        #[inline]
        pub fn primitives(&self) -> &[Primitive] {
            &self.primitives
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.primitives.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.primitives.is_empty()
        }

        pub fn into_primitives(self) -> Vec<Primitive> {
            self.primitives
        }
    }

    impl DrawSink for RecordingSink {
        fn emit(&mut self, primitive: Primitive) {
            self.primitives.push(primitive);
        }
    }
}

pub mod shape {
    use std::any::Any;
    use std::fmt;

    use crate::draw::DrawSink;
    use crate::geometry::Vector2;

    /// 图形种类的稳定标识，同时作为文本格式中的类型标记与注册表键。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ShapeTag(&'static str);

    impl ShapeTag {
        #[inline]
        pub const fn new(name: &'static str) -> Self {
            Self(name)
        }

        #[inline]
        pub const fn as_str(self) -> &'static str {
            self.0
        }
    }

    impl fmt::Display for ShapeTag {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    /// 组合模型中所有图形共享的接口。
    ///
    /// 新的图形种类只需实现 `tag`/`translate`/`draw` 并派生 `Clone` 与 `PartialEq`，
    /// 深拷贝与结构比较由下面的辅助 trait 自动提供；缺少 `Clone` 的类型无法实现本 trait。
    pub trait Shape: CloneShape + ShapeEq + ShapeAny + fmt::Debug + Send + Sync + 'static {
        fn tag(&self) -> ShapeTag;

        /// 原地平移。
        fn translate(&mut self, offset: Vector2);

        fn draw(&self, sink: &mut dyn DrawSink);
    }

    pub trait CloneShape {
        fn clone_shape(&self) -> Box<dyn Shape>;
    }

    impl<T> CloneShape for T
    where
        T: Shape + Clone,
    {
        fn clone_shape(&self) -> Box<dyn Shape> {
            Box::new(self.clone())
        }
    }

    pub trait ShapeEq {
        fn eq_shape(&self, other: &dyn Shape) -> bool;
    }

    impl<T> ShapeEq for T
    where
        T: Shape + PartialEq,
    {
        fn eq_shape(&self, other: &dyn Shape) -> bool {
            other
                .as_any()
                .downcast_ref::<T>()
                .is_some_and(|other| self == other)
        }
    }

    /// 仅供编解码器在按标记找到实现后访问具体类型。
    pub trait ShapeAny {
        fn as_any(&self) -> &dyn Any;
        fn as_any_mut(&mut self) -> &mut dyn Any;
    }

    impl<T: Shape> ShapeAny for T {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl Clone for Box<dyn Shape> {
        fn clone(&self) -> Self {
            (**self).clone_shape()
        }
    }

    impl PartialEq for dyn Shape {
        fn eq(&self, other: &Self) -> bool {
            self.tag() == other.tag() && self.eq_shape(other)
        }
    }
}

pub mod shapes {
    use serde::{Deserialize, Serialize};

    use crate::draw::{DrawSink, Primitive};
    use crate::geometry::{Point2, Vector2};
    use crate::shape::{Shape, ShapeTag};

    /// 超过 `i32::MAX` 的边长按 `i32::MAX` 处理，角点坐标饱和到 `i32` 范围。
    fn box_corners(top_left: Point2, width: u32, height: u32) -> Vec<Point2> {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        vec![
            top_left,
            top_left.translate(Vector2::new(w, 0)),
            top_left.translate(Vector2::new(w, h)),
            top_left.translate(Vector2::new(0, h)),
        ]
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: u32,
    }

    impl Circle {
        pub const TAG: ShapeTag = ShapeTag::new("Circle");

        #[inline]
        pub fn new(center: Point2, radius: u32) -> Self {
            Self { center, radius }
        }
    }

    impl Shape for Circle {
        fn tag(&self) -> ShapeTag {
            Self::TAG
        }

        fn translate(&mut self, offset: Vector2) {
            self.center = self.center.translate(offset);
        }

        fn draw(&self, sink: &mut dyn DrawSink) {
            sink.emit(Primitive::Circle {
                center: self.center,
                radius: self.radius,
            });
        }
    }

    /// 轴对齐矩形，`top_left` 为屏幕坐标系下的左上角。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Rectangle {
        pub top_left: Point2,
        pub width: u32,
        pub height: u32,
    }

    impl Rectangle {
        pub const TAG: ShapeTag = ShapeTag::new("Rectangle");

        #[inline]
        pub fn new(top_left: Point2, width: u32, height: u32) -> Self {
            Self {
                top_left,
                width,
                height,
            }
        }
    }

    impl Shape for Rectangle {
        fn tag(&self) -> ShapeTag {
            Self::TAG
        }

        fn translate(&mut self, offset: Vector2) {
            self.top_left = self.top_left.translate(offset);
        }

        fn draw(&self, sink: &mut dyn DrawSink) {
            sink.emit(Primitive::Polygon(box_corners(
                self.top_left,
                self.width,
                self.height,
            )));
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Square {
        pub top_left: Point2,
        pub size: u32,
    }

    impl Square {
        pub const TAG: ShapeTag = ShapeTag::new("Square");

        #[inline]
        pub fn new(top_left: Point2, size: u32) -> Self {
            Self { top_left, size }
        }
    }

    impl Shape for Square {
        fn tag(&self) -> ShapeTag {
            Self::TAG
        }

        fn translate(&mut self, offset: Vector2) {
            self.top_left = self.top_left.translate(offset);
        }

        fn draw(&self, sink: &mut dyn DrawSink) {
            sink.emit(Primitive::Polygon(box_corners(
                self.top_left,
                self.size,
                self.size,
            )));
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
    }

    impl Line {
        pub const TAG: ShapeTag = ShapeTag::new("Line");

        #[inline]
        pub fn new(start: Point2, end: Point2) -> Self {
            Self { start, end }
        }
    }

    impl Shape for Line {
        fn tag(&self) -> ShapeTag {
            Self::TAG
        }

        fn translate(&mut self, offset: Vector2) {
            self.start = self.start.translate(offset);
            self.end = self.end.translate(offset);
        }

        fn draw(&self, sink: &mut dyn DrawSink) {
            sink.emit(Primitive::Segment {
                start: self.start,
                end: self.end,
            });
        }
    }
}

pub mod group {
    use std::slice;

    use crate::draw::DrawSink;
    use crate::geometry::Vector2;
    use crate::shape::{Shape, ShapeTag};

    pub type ShapePtr = Box<dyn Shape>;

    /// 组合节点：按插入顺序独占持有子图形，自身不带几何信息。
    ///
    /// `Clone` 为深拷贝，克隆结果与原组不共享任何子图形。
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct ShapeGroup {
        shapes: Vec<ShapePtr>,
    }

    impl ShapeGroup {
        pub const TAG: ShapeTag = ShapeTag::new("ShapeGroup");

        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_shapes(shapes: impl IntoIterator<Item = ShapePtr>) -> Self {
            Self {
                shapes: shapes.into_iter().collect(),
            }
        }

        /// 追加子图形到末尾。
        pub fn add(&mut self, shape: ShapePtr) {
            self.shapes.push(shape);
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.shapes.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.shapes.is_empty()
        }

        #[inline]
        pub fn get(&self, index: usize) -> Option<&dyn Shape> {
            self.shapes.get(index).map(|shape| &**shape)
        }

        #[inline]
        pub fn get_mut(&mut self, index: usize) -> Option<&mut ShapePtr> {
            self.shapes.get_mut(index)
        }

        #[inline]
        pub fn iter(&self) -> slice::Iter<'_, ShapePtr> {
            self.shapes.iter()
        }

        #[inline]
        pub fn iter_mut(&mut self) -> slice::IterMut<'_, ShapePtr> {
            self.shapes.iter_mut()
        }

        pub fn clear(&mut self) {
            self.shapes.clear();
        }

        /// 移除并返回指定位置的子图形，其后的子图形前移。
        pub fn remove(&mut self, index: usize) -> Option<ShapePtr> {
            (index < self.shapes.len()).then(|| self.shapes.remove(index))
        }

        pub fn into_children(self) -> Vec<ShapePtr> {
            self.shapes
        }

        /// 统计整棵子树中的叶子图形数量（不含组节点本身）。
        pub fn leaf_count(&self) -> usize {
            self.shapes
                .iter()
                .map(|shape| match shape.as_any().downcast_ref::<ShapeGroup>() {
                    Some(group) => group.leaf_count(),
                    None => 1,
                })
                .sum()
        }
    }

    impl Extend<ShapePtr> for ShapeGroup {
        fn extend<I: IntoIterator<Item = ShapePtr>>(&mut self, iter: I) {
            self.shapes.extend(iter);
        }
    }

    impl<'a> IntoIterator for &'a ShapeGroup {
        type Item = &'a ShapePtr;
        type IntoIter = slice::Iter<'a, ShapePtr>;

        fn into_iter(self) -> Self::IntoIter {
            self.shapes.iter()
        }
    }

    impl Shape for ShapeGroup {
        fn tag(&self) -> ShapeTag {
            Self::TAG
        }

        fn translate(&mut self, offset: Vector2) {
            for shape in &mut self.shapes {
                shape.translate(offset);
            }
        }

        fn draw(&self, sink: &mut dyn DrawSink) {
            for shape in &self.shapes {
                shape.draw(sink);
            }
        }
    }

}
