//! qdump: 查看和提取 QNX 1.2 磁盘镜像中的文件

use std::io::{self, Write};
use std::process;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use qnxfs_core::QnxFileSystem;
use qnxfs_tools::{
    dump_file, extract_dir, extract_file, list_directory, logger, Command, ExtractOptions,
    Operation, Options, USAGE,
};

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error:#}");
        process::exit(1);
    }
}

/// 路径的最后一个组件
fn file_name(path: &str) -> Result<&str> {
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => bail!("no file name in {path}"),
    }
}

fn run() -> Result<()> {
    let opts = match Options::parse(std::env::args().skip(1)) {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            println!("{USAGE}");
            return Ok(());
        }
        Err(e) => {
            println!("{USAGE}");
            return Err(e);
        }
    };
    logger::init(logger::level_from_verbosity(opts.verbose));

    let mut fs = QnxFileSystem::open(&opts.image, opts.offset)
        .with_context(|| format!("unable to open image file {}", opts.image.display()))?;
    let mut cursor = fs
        .resolve_path(&opts.path)
        .with_context(|| format!("unable to open {} inside image", opts.path))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match opts.operation {
        Operation::List => {
            if !cursor.is_directory() {
                bail!("{} is not a directory", opts.path);
            }
            list_directory(&mut fs, &mut cursor, &mut out)?;
        }
        Operation::Dump => {
            if cursor.is_directory() {
                bail!("{} is a directory", opts.path);
            }
            dump_file(&mut fs, &mut cursor, opts.ascii, &mut out)
                .with_context(|| format!("unable to read {}", opts.path))?;
        }
        Operation::Extract => {
            let dest = opts.local_path.clone().unwrap_or_default();
            let extract = ExtractOptions {
                ascii: opts.ascii,
                ..ExtractOptions::default()
            };

            if cursor.is_directory() {
                let stats = extract_dir(&mut fs, &mut cursor, &dest, &extract, &mut out)?;
                info!(
                    "extracted {} files, {} directories",
                    stats.files, stats.dirs
                );
                if stats.failed > 0 {
                    warn!("{} entries could not be extracted", stats.failed);
                }
            } else {
                let name = file_name(&opts.path)?;
                extract_file(&mut fs, &mut cursor, name, &dest, &extract, &mut out)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
