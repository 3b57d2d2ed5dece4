//! QNX 1.2 文件系统核心结构

use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::{
    block::{BlockDevice, DiskImage},
    dir::{lookup_entry_from, search_dir, DirectoryStream},
    error::{Error, ErrorKind, Result},
    extent::ExtentReader,
    superblock::Superblock,
    types::DirEntry,
};

use super::{file::FileCursor, metadata::FileMetadata};

/// 每次读取的块大小
const READ_CHUNK: usize = 4096;

/// QNX 1.2 文件系统（只读）
///
/// 独占一个磁盘镜像，提供按路径打开、读取和列目录的接口。
///
/// # 示例
///
/// ```rust,ignore
/// use qnxfs_core::QnxFileSystem;
///
/// let mut fs = QnxFileSystem::open("qnx12.img", 0)?;
///
/// // 读取文件
/// let mut cursor = fs.resolve_path("/HELLO")?;
/// let content = fs.read_all(&mut cursor)?;
///
/// // 读取目录
/// for entry in fs.read_dir("/")? {
///     println!("{}", entry.name_str().unwrap_or("?"));
/// }
/// ```
pub struct QnxFileSystem<D: BlockDevice> {
    image: DiskImage<D>,
    sb: Superblock,
}

impl<D: BlockDevice> QnxFileSystem<D> {
    /// 挂载文件系统
    ///
    /// # 参数
    ///
    /// * `image` - 磁盘镜像
    ///
    /// # 错误
    ///
    /// - `ErrorKind::Bounds` - 镜像小于 superblock
    /// - `ErrorKind::Io` - 设备读取失败
    pub fn mount(mut image: DiskImage<D>) -> Result<Self> {
        let sb = Superblock::load(&mut image)?;
        Ok(Self { image, sb })
    }

    /// 获取 superblock 引用
    pub fn superblock(&self) -> &Superblock {
        &self.sb
    }

    /// 获取镜像引用
    pub fn image(&self) -> &DiskImage<D> {
        &self.image
    }

    /// 获取可变镜像引用
    pub fn image_mut(&mut self) -> &mut DiskImage<D> {
        &mut self.image
    }

    /// 卸载并取回镜像
    pub fn into_image(self) -> DiskImage<D> {
        self.image
    }

    /// 卷创建日期
    pub fn creation_date(&self) -> [u16; 2] {
        self.sb.creation_date()
    }

    /// 打开根目录
    pub fn root(&mut self) -> Result<FileCursor> {
        let root = *self.sb.root_entry();
        FileCursor::open_from(&mut self.image, &root)
    }

    /// 按路径打开文件或目录
    ///
    /// # 参数
    ///
    /// * `path` - `/` 分隔的路径，空路径表示根目录
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NotFound` - 路径不存在
    /// - `ErrorKind::NotADirectory` - 中间组件不是目录
    pub fn resolve_path(&mut self, path: &str) -> Result<FileCursor> {
        let entry = self.lookup(path)?;
        self.open_entry(&entry)
    }

    /// 从目录项打开游标
    pub fn open_entry(&mut self, entry: &DirEntry) -> Result<FileCursor> {
        FileCursor::open_from(&mut self.image, entry)
    }

    pub fn is_directory(&self, cursor: &FileCursor) -> bool {
        cursor.is_directory()
    }

    /// 在目录中查找名称
    pub fn search_dir(&mut self, dir: &mut FileCursor, name: &[u8]) -> Result<DirEntry> {
        search_dir(&mut self.image, dir, name)
    }

    /// 遍历目录
    ///
    /// 返回目录项流，包括未使用的槽位。
    pub fn entries<'a>(&'a mut self, dir: &'a mut FileCursor) -> Result<DirectoryStream<'a, D>> {
        DirectoryStream::init(&mut self.image, dir)
    }

    /// 列出目录中的所有目录项（包括未使用的槽位）
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NotADirectory` - 游标不是目录
    /// - 读取目录时的错误
    pub fn list_entries(&mut self, dir: &mut FileCursor) -> Result<Vec<DirEntry>> {
        DirectoryStream::init(&mut self.image, dir)?.collect()
    }

    /// 按路径读取目录
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let entries = fs.read_dir("/SUB")?;
    /// for entry in entries.iter().filter(|e| e.is_used()) {
    ///     println!("{}", entry.name_str().unwrap_or("?"));
    /// }
    /// ```
    pub fn read_dir(&mut self, path: &str) -> Result<Vec<DirEntry>> {
        let mut dir = self.resolve_path(path)?;
        self.list_entries(&mut dir)
    }

    /// 读取整个文件
    ///
    /// 从头开始读到文件末尾。
    ///
    /// # 返回
    ///
    /// 文件内容；空文件返回空向量
    pub fn read_all(&mut self, cursor: &mut FileCursor) -> Result<Vec<u8>> {
        if cursor.position() != 0 {
            cursor.seek(&mut self.image, 0)?;
        }

        // 链上声明的大小不可信，预分配不超过镜像本身
        let capacity = core::cmp::min(cursor.size() as u64, self.image.image_size());
        let mut content = Vec::with_capacity(capacity as usize);
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = cursor.read(&mut self.image, &mut buf)?;
            if n == 0 {
                break;
            }
            content.extend_from_slice(&buf[..n]);
            if cursor.is_errored() {
                return Err(Error::new(
                    ErrorKind::ChainCorruption,
                    "file could not be read completely",
                ));
            }
        }

        debug!("read_all: {} bytes", content.len());
        Ok(content)
    }

    /// 从当前位置读取至多 `count` 字节
    pub fn read_into(&mut self, cursor: &mut FileCursor, count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        let mut done = 0;
        while done < count {
            let n = cursor.read(&mut self.image, &mut buf[done..])?;
            done += n;
            // 出错前读到的部分仍然返回
            if n == 0 || cursor.is_errored() {
                break;
            }
        }
        buf.truncate(done);
        Ok(buf)
    }

    /// 目录项对应文件的字节大小（遍历 extent 链）
    pub fn file_size(&mut self, entry: &DirEntry) -> Result<u32> {
        ExtentReader::new(&mut self.image).chain_size(entry.first_extent)
    }

    /// 获取文件元数据
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let metadata = fs.metadata("/HELLO")?;
    /// println!("Size: {} bytes", metadata.size);
    /// ```
    pub fn metadata(&mut self, path: &str) -> Result<FileMetadata> {
        let entry = self.lookup(path)?;
        let size = self.file_size(&entry)?;
        Ok(FileMetadata::from_entry(&entry, size))
    }

    /// 检查路径是否存在
    pub fn exists(&mut self, path: &str) -> bool {
        self.lookup(path).is_ok()
    }

    fn lookup(&mut self, path: &str) -> Result<DirEntry> {
        lookup_entry_from(&mut self.image, self.sb.root_entry(), path)
    }
}

#[cfg(feature = "std")]
impl QnxFileSystem<crate::block::FileDevice> {
    /// 打开镜像文件并挂载
    ///
    /// # 错误
    ///
    /// - `ErrorKind::Open` - 文件无法打开
    /// - `ErrorKind::SizeLimit` - 镜像超过 2GB
    pub fn open<P: AsRef<std::path::Path>>(path: P, partition_offset: u64) -> Result<Self> {
        let image = DiskImage::open(path, partition_offset)?;
        Self::mount(image)
    }
}
