//! 文件提取和输出

use std::fs::{DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use qnxfs_core::{BlockDevice, FileCursor, QnxFileSystem, QNX_MAX_NAME_LEN};

use crate::convert::rs_to_lf;
use crate::listing::collect_entries;

/// 提取配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// 把 RS 转换为 LF（对所有文件生效）
    pub ascii: bool,
    /// 目录递归的最大深度
    pub max_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            ascii: false,
            max_depth: 32,
        }
    }
}

/// 提取统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub dirs: usize,
    /// 被跳过或失败的目录项
    pub failed: usize,
}

/// 读取整个文件，可选地转换行分隔符
pub fn read_contents<D: BlockDevice>(
    fs: &mut QnxFileSystem<D>,
    cursor: &mut FileCursor,
    ascii: bool,
) -> Result<Vec<u8>> {
    let mut data = fs.read_all(cursor)?;
    if ascii {
        rs_to_lf(&mut data);
    }
    Ok(data)
}

/// 输出文件内容
pub fn dump_file<D: BlockDevice, W: Write>(
    fs: &mut QnxFileSystem<D>,
    cursor: &mut FileCursor,
    ascii: bool,
    out: &mut W,
) -> Result<()> {
    if cursor.is_directory() {
        bail!("is a directory");
    }
    let data = read_contents(fs, cursor, ascii)?;
    out.write_all(&data)?;
    out.flush()?;
    Ok(())
}

/// 创建新文件并写入，文件已存在时失败
pub fn write_new_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let mut file = options.open(path)?;
    file.write_all(data)
}

fn create_dir(path: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

/// 目录项名称能否安全地用作本地文件名
fn local_name(name: &[u8]) -> Option<String> {
    if name.is_empty() || name.len() > QNX_MAX_NAME_LEN || name.contains(&b'/') {
        return None;
    }
    if name == b"." || name == b".." {
        return None;
    }
    Some(String::from_utf8_lossy(name).into_owned())
}

/// 提取单个文件到 `dest/name`
///
/// 写入前把目标路径输出到 `out`。
///
/// # 返回
///
/// 写入的本地路径
pub fn extract_file<D: BlockDevice, W: Write>(
    fs: &mut QnxFileSystem<D>,
    cursor: &mut FileCursor,
    name: &str,
    dest: &Path,
    opts: &ExtractOptions,
    out: &mut W,
) -> Result<PathBuf> {
    let data = read_contents(fs, cursor, opts.ascii)
        .with_context(|| format!("unable to extract {name}"))?;

    let path = dest.join(name);
    writeln!(out, "{}", path.display())?;
    write_new_file(&path, &data)
        .with_context(|| format!("unable to create {}", path.display()))?;

    debug!("extracted {} ({} bytes)", path.display(), data.len());
    Ok(path)
}

/// 递归提取目录内容到 `dest`
///
/// 单个目录项失败时记录警告并继续处理其余项。只有目录本身无法读取
/// 时才返回错误。
pub fn extract_dir<D: BlockDevice, W: Write>(
    fs: &mut QnxFileSystem<D>,
    dir: &mut FileCursor,
    dest: &Path,
    opts: &ExtractOptions,
    out: &mut W,
) -> Result<ExtractStats> {
    let mut stats = ExtractStats::default();
    extract_dir_at(fs, dir, dest, opts, 0, out, &mut stats)?;
    Ok(stats)
}

fn extract_dir_at<D: BlockDevice, W: Write>(
    fs: &mut QnxFileSystem<D>,
    dir: &mut FileCursor,
    dest: &Path,
    opts: &ExtractOptions,
    depth: usize,
    out: &mut W,
    stats: &mut ExtractStats,
) -> Result<()> {
    let entries = collect_entries(fs, dir)?;

    for entry in entries.iter().filter(|e| e.is_used()) {
        let raw_name = entry.name_bytes();
        let Some(name) = local_name(raw_name) else {
            warn!(
                "skipping entry with unusable name {:?}",
                String::from_utf8_lossy(raw_name)
            );
            stats.failed += 1;
            continue;
        };

        let mut child = match fs.open_entry(entry) {
            Ok(child) => child,
            Err(e) => {
                warn!("unable to open qnx file {}: {}", name, e);
                stats.failed += 1;
                continue;
            }
        };

        if child.is_directory() {
            if depth + 1 > opts.max_depth {
                warn!("{} is nested too deeply, skipping", name);
                stats.failed += 1;
                continue;
            }

            let path = dest.join(&name);
            if let Err(e) = create_dir(&path) {
                warn!("can't create directory {}: {}", path.display(), e);
                stats.failed += 1;
                continue;
            }
            stats.dirs += 1;

            if let Err(e) = extract_dir_at(fs, &mut child, &path, opts, depth + 1, out, stats) {
                warn!("can't read directory {}: {:#}", name, e);
                stats.failed += 1;
            }
        } else {
            match extract_file(fs, &mut child, &name, dest, opts, out) {
                Ok(_) => stats.files += 1,
                Err(e) => {
                    warn!("{:#}", e);
                    stats.failed += 1;
                }
            }
        }
    }

    Ok(())
}
