use std::fmt::Display;
use std::io::Write;
use std::iter::Peekable;
use std::str::{FromStr, SplitWhitespace};

use zdraw_core::geometry::Point2;
use zdraw_core::shape::ShapeTag;

use crate::IoError;

const DEFAULT_INDENT: usize = 2;

/// 以空白分隔的标记流，记录已消费的标记数量以便定位错误。
pub struct TokenReader<'a> {
    tokens: Peekable<SplitWhitespace<'a>>,
    position: usize,
}

impl<'a> TokenReader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            tokens: source.split_whitespace().peekable(),
            position: 0,
        }
    }

    /// 已消费的标记数量。
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn next_token(&mut self) -> Option<&'a str> {
        let token = self.tokens.next()?;
        self.position += 1;
        Some(token)
    }

    pub fn peek_token(&mut self) -> Option<&'a str> {
        self.tokens.peek().copied()
    }

    pub fn is_exhausted(&mut self) -> bool {
        self.tokens.peek().is_none()
    }

    pub fn expect_token(&mut self, context: &str) -> Result<&'a str, IoError> {
        self.next_token().ok_or_else(|| {
            IoError::malformed(format!(
                "{context} 缺失：输入在第 {} 个标记后结束",
                self.position
            ))
        })
    }

    pub fn parse<T: FromStr>(&mut self, context: &str) -> Result<T, IoError> {
        let raw = self.expect_token(context)?;
        raw.parse::<T>().map_err(|_| {
            IoError::malformed(format!(
                "{context} 解析失败（第 {} 个标记：\"{raw}\"）",
                self.position
            ))
        })
    }

    #[inline]
    pub fn parse_i32(&mut self, context: &str) -> Result<i32, IoError> {
        self.parse::<i32>(context)
    }

    #[inline]
    pub fn parse_u32(&mut self, context: &str) -> Result<u32, IoError> {
        self.parse::<u32>(context)
    }

    #[inline]
    pub fn parse_count(&mut self, context: &str) -> Result<usize, IoError> {
        self.parse::<usize>(context)
    }

    /// 读取 `x y` 两个整数标记。
    pub fn parse_point(&mut self, context: &str) -> Result<Point2, IoError> {
        let x = self.parse_i32(context)?;
        let y = self.parse_i32(context)?;
        Ok(Point2::new(x, y))
    }
}

/// 逐条记录写出标记：每条记录独占一行，嵌套层级以缩进体现（缩进不具语义）。
pub struct TokenWriter<'a> {
    out: &'a mut dyn Write,
    indent: usize,
    depth: usize,
    open: bool,
}

impl<'a> TokenWriter<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self {
            out,
            indent: DEFAULT_INDENT,
            depth: 0,
            open: false,
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// 开始一条新记录并写出类型标记；若上一条记录未结束则先换行。
    pub fn begin_record(&mut self, tag: ShapeTag) -> Result<(), IoError> {
        self.end_record()?;
        let padding = self.depth * self.indent;
        write!(self.out, "{:padding$}{tag}", "")?;
        self.open = true;
        Ok(())
    }

    pub fn field(&mut self, value: impl Display) -> Result<(), IoError> {
        write!(self.out, " {value}")?;
        Ok(())
    }

    pub fn point(&mut self, point: Point2) -> Result<(), IoError> {
        self.field(point.x())?;
        self.field(point.y())
    }

    /// 结束当前记录；没有打开的记录时不做任何事。
    pub fn end_record(&mut self) -> Result<(), IoError> {
        if self.open {
            writeln!(self.out)?;
            self.open = false;
        }
        Ok(())
    }

    /// 在加深一层缩进的上下文中执行写出。
    pub fn nested<F>(&mut self, write_children: F) -> Result<(), IoError>
    where
        F: FnOnce(&mut Self) -> Result<(), IoError>,
    {
        self.end_record()?;
        self.depth += 1;
        let result = write_children(self);
        self.depth -= 1;
        result
    }

    pub fn flush(&mut self) -> Result<(), IoError> {
        self.end_record()?;
        self.out.flush()?;
        Ok(())
    }
}
