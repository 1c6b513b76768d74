use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use once_cell::sync::OnceCell;
use tracing::{debug, trace};
use zdraw_core::shape::{Shape, ShapeTag};

use crate::IoError;
use crate::codecs::register_builtin_shapes;
use crate::tokens::{TokenReader, TokenWriter};

/// 无参构造器，返回默认初始化的图形。
pub type ShapeCreator = Box<dyn Fn() -> Box<dyn Shape> + Send + Sync>;

/// 类型标记到构造器的映射，用于在反序列化时实例化未知具体类型的图形。
#[derive(Default)]
pub struct ShapeFactory {
    creators: HashMap<&'static str, ShapeCreator>,
}

impl ShapeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册构造器；标记已存在时返回 `false` 且保留原有注册。
    pub fn register_creator<F>(&mut self, id: ShapeTag, creator: F) -> bool
    where
        F: Fn() -> Box<dyn Shape> + Send + Sync + 'static,
    {
        match self.creators.entry(id.as_str()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Box::new(creator));
                true
            }
        }
    }

    pub fn create(&self, id: &str) -> Result<Box<dyn Shape>, IoError> {
        let creator = self
            .creators
            .get(id)
            .ok_or_else(|| IoError::UnregisteredType(id.to_string()))?;
        Ok(creator())
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.creators.contains_key(id)
    }

    /// 已注册的类型标记，按字典序排列。
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.creators.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.creators.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl fmt::Debug for ShapeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeFactory")
            .field("ids", &self.ids())
            .finish()
    }
}

/// 单一图形种类的读写器。
///
/// `read` 只消费该图形自身的载荷（类型标记已由调度方读取），`write` 只写出载荷，
/// 二者使用同一套标记语法，保证写出后再读入得到相等的图形。
pub trait ShapeReaderWriter: Send + Sync {
    fn read(
        &self,
        target: &mut dyn Shape,
        tokens: &mut TokenReader<'_>,
        registries: &Registries,
    ) -> Result<(), IoError>;

    fn write(
        &self,
        shape: &dyn Shape,
        out: &mut TokenWriter<'_>,
        registries: &Registries,
    ) -> Result<(), IoError>;
}

/// 按图形标记查找读写器。
#[derive(Default)]
pub struct ShapeRwRegistry {
    codecs: HashMap<ShapeTag, Box<dyn ShapeReaderWriter>>,
}

impl ShapeRwRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册读写器；标记已存在时返回 `false` 且保留原有注册。
    pub fn register<C>(&mut self, tag: ShapeTag, codec: C) -> bool
    where
        C: ShapeReaderWriter + 'static,
    {
        match self.codecs.entry(tag) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Box::new(codec));
                true
            }
        }
    }

    pub fn get(&self, tag: ShapeTag) -> Result<&dyn ShapeReaderWriter, IoError> {
        self.codecs
            .get(&tag)
            .map(|codec| &**codec)
            .ok_or_else(|| IoError::UnregisteredType(tag.to_string()))
    }

    #[inline]
    pub fn contains(&self, tag: ShapeTag) -> bool {
        self.codecs.contains_key(&tag)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl fmt::Debug for ShapeRwRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.codecs.keys().map(|tag| tag.as_str()).collect();
        tags.sort_unstable();
        f.debug_struct("ShapeRwRegistry").field("tags", &tags).finish()
    }
}

static SHARED: OnceCell<Registries> = OnceCell::new();

/// 构造器注册表与读写器注册表的组合，由宿主程序在启动时显式构建并注入。
#[derive(Debug, Default)]
pub struct Registries {
    pub factory: ShapeFactory,
    pub codecs: ShapeRwRegistry,
}

impl Registries {
    /// 创建空注册表，调用方负责注册所需的图形种类。
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建并注册全部内置图形种类。
    pub fn with_builtin_shapes() -> Result<Self, IoError> {
        let mut registries = Self::new();
        register_builtin_shapes(&mut registries)?;
        Ok(registries)
    }

    /// 进程级共享实例，首次访问时注册内置图形种类，此后只读。
    pub fn shared() -> Result<&'static Registries, IoError> {
        SHARED.get_or_try_init(Self::with_builtin_shapes)
    }

    /// 同时注册构造器与读写器。任一注册表已含该标记时报错，两边均不修改。
    pub fn register_kind<S, F, C>(
        &mut self,
        tag: ShapeTag,
        creator: F,
        codec: C,
    ) -> Result<(), IoError>
    where
        S: Shape,
        F: Fn() -> S + Send + Sync + 'static,
        C: ShapeReaderWriter + 'static,
    {
        if self.factory.contains(tag.as_str()) || self.codecs.contains(tag) {
            return Err(IoError::DuplicateRegistration(tag.to_string()));
        }
        self.factory
            .register_creator(tag, move || Box::new(creator()) as Box<dyn Shape>);
        self.codecs.register(tag, codec);
        debug!(%tag, "已注册图形种类");
        Ok(())
    }

    /// 读取一条完整的图形记录：类型标记加载荷。
    ///
    /// 先用构造器创建默认实例，再按该实例的标记查找读写器填充载荷。
    pub fn read_shape(&self, tokens: &mut TokenReader<'_>) -> Result<Box<dyn Shape>, IoError> {
        let id = tokens.expect_token("图形类型标记")?;
        let mut shape = self.factory.create(id)?;
        let codec = self.codecs.get(shape.tag())?;
        codec.read(&mut *shape, tokens, self)?;
        trace!(tag = %shape.tag(), position = tokens.position(), "读取图形");
        Ok(shape)
    }

    /// 写出一条完整的图形记录：类型标记加载荷。
    pub fn write_shape(&self, shape: &dyn Shape, out: &mut TokenWriter<'_>) -> Result<(), IoError> {
        let codec = self.codecs.get(shape.tag())?;
        out.begin_record(shape.tag())?;
        codec.write(shape, out, self)?;
        out.end_record()?;
        trace!(tag = %shape.tag(), depth = out.depth(), "写出图形");
        Ok(())
    }
}
