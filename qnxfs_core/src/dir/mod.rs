//! 目录操作模块
//!
//! 这个模块提供 QNX 1.2 目录的遍历和路径查找功能。

mod lookup;
mod stream;

pub use lookup::*;
pub use stream::*;
