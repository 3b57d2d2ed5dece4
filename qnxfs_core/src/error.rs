//! 错误处理模块

use core::fmt;

use crate::consts::*;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 镜像文件不存在或不可读
    Open,
    /// 镜像超过大小上限
    SizeLimit,
    /// 读取越过镜像末尾，或 extent 链引用了无效块号
    Bounds,
    /// 底层读取失败或读取不完整
    Io,
    /// extent 链中途的 extent 头无法读取
    ChainCorruption,
    /// 路径分量不存在
    NotFound,
    /// 路径中间分量不是目录
    NotADirectory,
    /// 期望普通文件却得到目录
    IsADirectory,
    /// 参数无效（如块号 0）
    InvalidInput,
    /// 文件游标已处于错误状态
    BadState,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Open => "open error",
            ErrorKind::SizeLimit => "size limit exceeded",
            ErrorKind::Bounds => "out of bounds",
            ErrorKind::Io => "i/o error",
            ErrorKind::ChainCorruption => "extent chain corrupted",
            ErrorKind::NotFound => "not found",
            ErrorKind::NotADirectory => "not a directory",
            ErrorKind::IsADirectory => "is a directory",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::BadState => "bad file state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// qnxfs 错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

impl Error {
    pub fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    /// 对应的 C errno
    pub fn code(&self) -> i32 {
        match self.kind {
            ErrorKind::Open | ErrorKind::NotFound => ENOENT,
            ErrorKind::SizeLimit => EFBIG,
            ErrorKind::Bounds | ErrorKind::Io | ErrorKind::ChainCorruption => EIO,
            ErrorKind::NotADirectory => ENOTDIR,
            ErrorKind::IsADirectory => EISDIR,
            ErrorKind::InvalidInput => EINVAL,
            ErrorKind::BadState => EBADF,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl core::error::Error for Error {}

/// qnxfs Result 类型
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::new(ErrorKind::NotFound, "path component not found");
        assert_eq!(err.to_string(), "not found: path component not found");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::new(ErrorKind::NotADirectory, "").code(), ENOTDIR);
        assert_eq!(Error::new(ErrorKind::ChainCorruption, "").code(), EIO);
        assert_eq!(Error::new(ErrorKind::BadState, "").code(), EBADF);
        assert_eq!(Error::new(ErrorKind::SizeLimit, "").code(), EFBIG);
    }
}
