//! 路径查找

use log::debug;

use super::DirectoryStream;
use crate::{
    block::{BlockDevice, DiskImage},
    error::{Error, ErrorKind, Result},
    fs::FileCursor,
    superblock::Superblock,
    types::DirEntry,
};

/// 读取 superblock 中的根目录项
pub fn root_entry<D: BlockDevice>(image: &mut DiskImage<D>) -> Result<DirEntry> {
    let sb = Superblock::load(image)?;
    Ok(*sb.root_entry())
}

/// 打开根目录
pub fn open_root<D: BlockDevice>(image: &mut DiskImage<D>) -> Result<FileCursor> {
    let root = root_entry(image)?;
    FileCursor::open_from(image, &root)
}

/// 在目录中查找名称
///
/// 名称按字节精确比较（区分大小写），比较对象是目录项名称字段中
/// 第一个 NUL 之前的部分。
///
/// # 参数
///
/// * `image` - 磁盘镜像
/// * `dir` - 已打开的目录游标
/// * `name` - 要查找的名称
///
/// # 返回
///
/// 匹配的目录项
///
/// # 错误
///
/// - `ErrorKind::NotADirectory` - `dir` 不是目录
/// - `ErrorKind::BadState` - 游标已处于出错状态
/// - `ErrorKind::NotFound` - 没有匹配的目录项
pub fn search_dir<D: BlockDevice>(
    image: &mut DiskImage<D>,
    dir: &mut FileCursor,
    name: &[u8],
) -> Result<DirEntry> {
    let stream = DirectoryStream::init(image, dir)?;

    for entry in stream {
        let entry = entry?;
        if entry.is_used() && entry.name_bytes() == name {
            return Ok(entry);
        }
    }

    Err(Error::new(ErrorKind::NotFound, "no such file or directory"))
}

/// 按路径查找目录项
///
/// 路径以 `/` 分隔，空组件被忽略，因此 `""`、`"/"` 和 `"//"` 都表示根目录。
///
/// # 错误
///
/// - `ErrorKind::NotFound` - 某个组件不存在
/// - `ErrorKind::NotADirectory` - 中间组件不是目录
///
/// # 示例
///
/// ```rust,ignore
/// let entry = lookup_entry(&mut image, "/SUB/NOTE")?;
/// assert!(!entry.is_directory());
/// ```
pub fn lookup_entry<D: BlockDevice>(image: &mut DiskImage<D>, path: &str) -> Result<DirEntry> {
    let root = root_entry(image)?;
    lookup_entry_from(image, &root, path)
}

/// 从给定的根目录项开始按路径查找
///
/// 已持有 superblock 的调用者用它避免重复读取。
pub fn lookup_entry_from<D: BlockDevice>(
    image: &mut DiskImage<D>,
    root: &DirEntry,
    path: &str,
) -> Result<DirEntry> {
    let mut current = *root;

    for component in path.split('/').filter(|c| !c.is_empty()) {
        let mut cursor = FileCursor::open_from(image, &current)?;
        if !cursor.is_directory() {
            debug!("lookup {}: {:?} is not a directory", path, current.name_str());
            return Err(Error::new(ErrorKind::NotADirectory, "not a directory"));
        }
        current = search_dir(image, &mut cursor, component.as_bytes())?;
    }

    debug!("lookup {}: first_extent={}", path, current.first_extent);
    Ok(current)
}

/// 按路径打开文件或目录
pub fn resolve_path<D: BlockDevice>(image: &mut DiskImage<D>, path: &str) -> Result<FileCursor> {
    let entry = lookup_entry(image, path)?;
    FileCursor::open_from(image, &entry)
}
