//! 集成测试公共工具

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

pub use qnxfs_core::testutil::{hello_contents, hello_image, NOTE_CONTENTS};

/// 把标准测试镜像写入临时文件
pub fn hello_image_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&hello_image()).unwrap();
    file.flush().unwrap();
    file
}

pub fn qdump() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_qdump"))
}

pub fn qobj() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_qobj"))
}

/// 运行程序，清除日志环境变量以保证输出稳定
pub fn run(program: PathBuf, args: &[&std::ffi::OsStr]) -> Output {
    Command::new(program)
        .args(args)
        .env_remove("QNXFS_LOG")
        .output()
        .unwrap()
}
