use std::marker::PhantomData;

use tracing::debug;
use zdraw_core::group::ShapeGroup;
use zdraw_core::shape::{Shape, ShapeTag};
use zdraw_core::shapes::{Circle, Line, Rectangle, Square};

use crate::IoError;
use crate::registry::{Registries, ShapeReaderWriter};
use crate::tokens::{TokenReader, TokenWriter};

/// 上限仅用于预分配，实际子图形数量不受此限制。
const MAX_PREALLOCATED_CHILDREN: usize = 1024;

/// 叶子图形的载荷格式。
pub trait LeafPayload: Shape + Default {
    fn read_payload(tokens: &mut TokenReader<'_>) -> Result<Self, IoError>;
    fn write_payload(&self, out: &mut TokenWriter<'_>) -> Result<(), IoError>;
}

/// 基于 [`LeafPayload`] 的通用叶子读写器。
pub struct LeafReaderWriter<T> {
    _kind: PhantomData<fn() -> T>,
}

impl<T> LeafReaderWriter<T> {
    pub fn new() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<T> Default for LeafReaderWriter<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn mismatch(expected: ShapeTag, found: ShapeTag) -> IoError {
    IoError::CodecMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

impl<T: LeafPayload> ShapeReaderWriter for LeafReaderWriter<T> {
    fn read(
        &self,
        target: &mut dyn Shape,
        tokens: &mut TokenReader<'_>,
        _registries: &Registries,
    ) -> Result<(), IoError> {
        let found = target.tag();
        let leaf = target
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| mismatch(T::default().tag(), found))?;
        *leaf = T::read_payload(tokens)?;
        Ok(())
    }

    fn write(
        &self,
        shape: &dyn Shape,
        out: &mut TokenWriter<'_>,
        _registries: &Registries,
    ) -> Result<(), IoError> {
        let leaf = shape
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch(T::default().tag(), shape.tag()))?;
        leaf.write_payload(out)
    }
}

impl LeafPayload for Circle {
    fn read_payload(tokens: &mut TokenReader<'_>) -> Result<Self, IoError> {
        let center = tokens.parse_point("Circle 圆心")?;
        let radius = tokens.parse_u32("Circle 半径")?;
        Ok(Circle::new(center, radius))
    }

    fn write_payload(&self, out: &mut TokenWriter<'_>) -> Result<(), IoError> {
        out.point(self.center)?;
        out.field(self.radius)
    }
}

impl LeafPayload for Rectangle {
    fn read_payload(tokens: &mut TokenReader<'_>) -> Result<Self, IoError> {
        let top_left = tokens.parse_point("Rectangle 左上角")?;
        let width = tokens.parse_u32("Rectangle 宽度")?;
        let height = tokens.parse_u32("Rectangle 高度")?;
        Ok(Rectangle::new(top_left, width, height))
    }

    fn write_payload(&self, out: &mut TokenWriter<'_>) -> Result<(), IoError> {
        out.point(self.top_left)?;
        out.field(self.width)?;
        out.field(self.height)
    }
}

impl LeafPayload for Square {
    fn read_payload(tokens: &mut TokenReader<'_>) -> Result<Self, IoError> {
        let top_left = tokens.parse_point("Square 左上角")?;
        let size = tokens.parse_u32("Square 边长")?;
        Ok(Square::new(top_left, size))
    }

    fn write_payload(&self, out: &mut TokenWriter<'_>) -> Result<(), IoError> {
        out.point(self.top_left)?;
        out.field(self.size)
    }
}

impl LeafPayload for Line {
    fn read_payload(tokens: &mut TokenReader<'_>) -> Result<Self, IoError> {
        let start = tokens.parse_point("Line 起点")?;
        let end = tokens.parse_point("Line 终点")?;
        Ok(Line::new(start, end))
    }

    fn write_payload(&self, out: &mut TokenWriter<'_>) -> Result<(), IoError> {
        out.point(self.start)?;
        out.point(self.end)
    }
}

/// `ShapeGroup` 的读写器，子图形通过注册表递归分派。
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupReaderWriter;

impl ShapeReaderWriter for GroupReaderWriter {
    fn read(
        &self,
        target: &mut dyn Shape,
        tokens: &mut TokenReader<'_>,
        registries: &Registries,
    ) -> Result<(), IoError> {
        let found = target.tag();
        let group = target
            .as_any_mut()
            .downcast_mut::<ShapeGroup>()
            .ok_or_else(|| mismatch(ShapeGroup::TAG, found))?;

        let count = tokens.parse_count("ShapeGroup 子图形数量")?;
        // 全部子图形读取成功后才挂到组上，失败时目标组保持原样。
        let mut children = Vec::with_capacity(count.min(MAX_PREALLOCATED_CHILDREN));
        for _ in 0..count {
            children.push(registries.read_shape(tokens)?);
        }
        group.extend(children);
        Ok(())
    }

    fn write(
        &self,
        shape: &dyn Shape,
        out: &mut TokenWriter<'_>,
        registries: &Registries,
    ) -> Result<(), IoError> {
        let group = shape
            .as_any()
            .downcast_ref::<ShapeGroup>()
            .ok_or_else(|| mismatch(ShapeGroup::TAG, shape.tag()))?;

        out.field(group.len())?;
        out.nested(|out| {
            for child in group {
                registries.write_shape(&**child, out)?;
            }
            Ok(())
        })
    }
}

/// 以默认构造器和 [`LeafReaderWriter`] 注册一个叶子种类。
pub fn register_leaf<T: LeafPayload>(registries: &mut Registries) -> Result<(), IoError> {
    let tag = T::default().tag();
    registries.register_kind(tag, T::default, LeafReaderWriter::<T>::new())
}

/// 按固定顺序注册全部内置图形种类，由宿主程序在启动阶段显式调用。
pub fn register_builtin_shapes(registries: &mut Registries) -> Result<(), IoError> {
    registries.register_kind(ShapeGroup::TAG, ShapeGroup::new, GroupReaderWriter)?;
    register_leaf::<Circle>(registries)?;
    register_leaf::<Rectangle>(registries)?;
    register_leaf::<Square>(registries)?;
    register_leaf::<Line>(registries)?;
    debug!(kinds = registries.factory.len(), "内置图形种类注册完成");
    Ok(())
}
