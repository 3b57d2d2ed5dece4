//! `qdump` 命令行选项

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// 要执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `-d`：列出目录
    List,
    /// `-x`：提取文件或目录
    Extract,
    /// `-r`：输出文件内容到标准输出
    Dump,
}

/// 解析后的选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub image: PathBuf,
    pub operation: Operation,
    /// 镜像内的路径
    pub path: String,
    /// 把 0x1e 转换为换行
    pub ascii: bool,
    /// 分区偏移（字节）
    pub offset: u64,
    /// `-x` 的本地目标目录
    pub local_path: Option<PathBuf>,
    pub verbose: u8,
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Options),
    Help,
}

pub const USAGE: &str = "\
Usage: qdump <disk_image> {-d|-x|-r} path [-a] [-o offset] [-l local_path] [-v]
\t-d\tlist directory at path (must be directory)
\t-x\textract file (or directory contents, recursive) from path
\t-r\tread (dump) file to stdout
\t-a\tASCII file (convert RS to LF)
\t-o\tOffset (in bytes) into image file (e.g. for partition)
\t-l\tLocal destination for -x (file(s) extracted to local_path)
\t-v\tmore log output (repeatable), or set QNXFS_LOG

Notes:
\t if multiple -r/d/x options are given, only last one is used
\t option -a affects all files (binary ones would be mangled!)";

/// 解析偏移量，支持十进制和 `0x` 前缀的十六进制
fn parse_offset(s: &str) -> Result<u64> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.with_context(|| format!("invalid offset: {s}"))
}

impl Options {
    /// 解析参数（不含程序名）
    ///
    /// 选项和镜像路径可以任意顺序出现。
    pub fn parse<I>(args: I) -> Result<Command>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut image = None;
        let mut op = None;
        let mut ascii = false;
        let mut offset = 0;
        let mut local_path = None;
        let mut verbose = 0u8;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                "-d" | "-x" | "-r" => {
                    let Some(path) = args.next() else {
                        bail!("option {arg} requires a path");
                    };
                    let operation = match arg.as_str() {
                        "-d" => Operation::List,
                        "-x" => Operation::Extract,
                        _ => Operation::Dump,
                    };
                    op = Some((operation, path));
                }
                "-a" => ascii = true,
                "-o" => {
                    let Some(value) = args.next() else {
                        bail!("option -o requires an offset");
                    };
                    offset = parse_offset(&value)?;
                }
                "-l" => {
                    let Some(value) = args.next() else {
                        bail!("option -l requires a local path");
                    };
                    local_path = Some(PathBuf::from(value));
                }
                "-v" => verbose = verbose.saturating_add(1),
                s if s.starts_with('-') && s.len() > 1 => bail!("unrecognized option: {s}"),
                _ => {
                    if image.is_some() {
                        bail!("unexpected argument: {arg}");
                    }
                    image = Some(PathBuf::from(arg));
                }
            }
        }

        let Some(image) = image else {
            bail!("missing disk image");
        };
        let Some((operation, path)) = op else {
            bail!("one of -d, -x or -r is required");
        };

        Ok(Command::Run(Options {
            image,
            operation,
            path,
            ascii,
            offset,
            local_path,
            verbose,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command> {
        Options::parse(args.iter().map(|s| s.to_string()))
    }

    fn run(args: &[&str]) -> Options {
        match parse(args).unwrap() {
            Command::Run(opts) => opts,
            Command::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_basic() {
        let opts = run(&["disk.img", "-d", "/"]);
        assert_eq!(opts.image, PathBuf::from("disk.img"));
        assert_eq!(opts.operation, Operation::List);
        assert_eq!(opts.path, "/");
        assert!(!opts.ascii);
        assert_eq!(opts.offset, 0);
        assert_eq!(opts.local_path, None);
    }

    #[test]
    fn test_last_operation_wins() {
        let opts = run(&["-d", "/A", "disk.img", "-r", "/B", "-x", "/C"]);
        assert_eq!(opts.operation, Operation::Extract);
        assert_eq!(opts.path, "/C");
    }

    #[test]
    fn test_all_options() {
        let opts = run(&["-a", "-o", "0x7e00", "-l", "out", "-v", "-v", "img", "-x", "/"]);
        assert!(opts.ascii);
        assert_eq!(opts.offset, 0x7e00);
        assert_eq!(opts.local_path, Some(PathBuf::from("out")));
        assert_eq!(opts.verbose, 2);

        let opts = run(&["img", "-o", "32256", "-r", "/F"]);
        assert_eq!(opts.offset, 32256);
    }

    #[test]
    fn test_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["img"]).is_err());
        assert!(parse(&["-d", "/"]).is_err());
        assert!(parse(&["img", "-d"]).is_err());
        assert!(parse(&["img", "-q", "-d", "/"]).is_err());
        assert!(parse(&["img", "-o", "lots", "-d", "/"]).is_err());
        assert!(parse(&["img", "img2", "-d", "/"]).is_err());
    }

    #[test]
    fn test_help() {
        assert_eq!(parse(&["img", "--help"]).unwrap(), Command::Help);
    }
}
