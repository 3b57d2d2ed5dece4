//! qobj: 把 QNX 可执行加载文件拆成代码段和数据段

use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};
use qnxfs_tools::extract::write_new_file;
use qnxfs_tools::loadrec::{self, MAX_LOAD_FILE_SIZE};
use qnxfs_tools::logger;

const USAGE: &str = "Usage: qobj <qnx_file> <qnx_code> <qnx_data>";

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("error: {error:#}");
            process::exit(1);
        }
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("unable to stat {}", path.display()))?
        .len();
    if size > MAX_LOAD_FILE_SIZE as u64 {
        bail!(
            "{} file size above limit (MAXFILELIMIT={})",
            path.display(),
            MAX_LOAD_FILE_SIZE
        );
    }
    std::fs::read(path).with_context(|| format!("unable to read {}", path.display()))
}

/// 成功返回 0；代码段写入失败返回 2，数据段写入失败返回 3
fn run() -> Result<i32> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 3 {
        println!("{USAGE}");
        bail!("expected 3 arguments, got {}", args.len());
    }
    logger::init(log::LevelFilter::Warn);

    let input = read_input(Path::new(&args[0]))?;
    let image = loadrec::decode(&input).with_context(|| format!("can't decode {}", args[0]))?;

    print!("{}", image.header);
    for record in &image.records {
        println!("{record}");
    }

    let mut rv = 0;
    if let Err(e) = write_new_file(Path::new(&args[1]), &image.code) {
        eprintln!("Error writing code segment to {}: {}", args[1], e);
        rv = 2;
    }
    if let Err(e) = write_new_file(Path::new(&args[2]), &image.data) {
        eprintln!("Error writing data segment to {}: {}", args[2], e);
        rv = 3;
    }

    Ok(rv)
}
