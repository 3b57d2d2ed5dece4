//! 块设备抽象
//!
//! 提供镜像后端接口和扇区级 I/O 操作。

mod device;
mod io;
mod mem;
#[cfg(feature = "std")]
mod file;

pub use device::{BlockDevice, DiskImage};
pub use mem::MemDevice;
#[cfg(feature = "std")]
pub use file::FileDevice;
