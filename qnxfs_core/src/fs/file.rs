//! 文件游标
//!
//! 在 extent 链上维护绝对位置和 extent 内偏移，提供 seek/read。

use bitflags::bitflags;
use log::{debug, warn};

use crate::{
    block::{BlockDevice, DiskImage},
    error::{Error, ErrorKind, Result},
    extent::ExtentReader,
    types::{DirEntry, FileAttributes},
};

bitflags! {
    /// 游标内部状态
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CursorFlags: u32 {
        /// 位置已到达文件末尾
        const AT_EOF = 1 << 0;
        /// 读取失败，游标不可再用
        const ERROR = 1 << 1;
    }
}

/// 文件游标
///
/// 表示一个打开的文件或目录。游标不持有镜像，每次操作都借用
/// `DiskImage`。
///
/// 状态：
/// - 正常定位：`position < size`
/// - 文件末尾：`position == size`，设置 `AT_EOF`
/// - 出错：设置 `ERROR`，之后所有 seek/read 都直接失败，只能重新打开
#[derive(Debug, Clone)]
pub struct FileCursor {
    attributes: FileAttributes,
    flags: CursorFlags,
    size: u32,
    position: u32,
    first_extent: u32,
    current_extent: u32,
    prev_extent: u32,
    next_extent: u32,
    /// 当前 extent 内的偏移
    extent_pos: u32,
    /// 当前 extent 的数据大小
    extent_size: u32,
}

impl FileCursor {
    /// 从目录项打开游标
    ///
    /// 读取第一个 extent 头，并遍历整条链计算文件大小。
    ///
    /// # 参数
    ///
    /// * `image` - 磁盘镜像
    /// * `entry` - 目标目录项
    ///
    /// # 错误
    ///
    /// - 第一个 extent 无法读取时返回底层错误
    /// - `ErrorKind::ChainCorruption` - 链中途的 extent 头无法读取
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let entry = lookup_entry(&mut image, "/HELLO")?;
    /// let mut cursor = FileCursor::open_from(&mut image, &entry)?;
    /// let mut buf = [0u8; 64];
    /// let n = cursor.read(&mut image, &mut buf)?;
    /// ```
    pub fn open_from<D: BlockDevice>(image: &mut DiskImage<D>, entry: &DirEntry) -> Result<Self> {
        let first = entry.first_extent;
        let mut reader = ExtentReader::new(image);
        let header = reader.read_header(first)?;
        let size = reader.chain_size(first)?;

        let mut flags = CursorFlags::empty();
        if size == 0 {
            flags.insert(CursorFlags::AT_EOF);
        }

        debug!(
            "open {:?}: first_extent={} size={}",
            entry.name_str().unwrap_or("?"),
            first,
            size
        );

        Ok(Self {
            attributes: entry.attributes(),
            flags,
            size,
            position: 0,
            first_extent: first,
            current_extent: first,
            prev_extent: header.prev,
            next_extent: header.next,
            extent_pos: 0,
            extent_size: header.size,
        })
    }

    /// 将 `block` 设为当前 extent
    fn load_extent<D: BlockDevice>(&mut self, image: &mut DiskImage<D>, block: u32) -> Result<()> {
        let header = ExtentReader::new(image).read_header(block)?;
        self.current_extent = block;
        self.prev_extent = header.prev;
        self.next_extent = header.next;
        self.extent_size = header.size;
        Ok(())
    }

    /// 当前 extent 已读完时沿链前进
    fn advance<D: BlockDevice>(&mut self, image: &mut DiskImage<D>) -> Result<()> {
        let limit = image.block_count();
        let mut steps = 0u64;

        while self.extent_pos >= self.extent_size && self.next_extent != 0 {
            steps += 1;
            if steps > limit {
                self.flags.insert(CursorFlags::ERROR);
                return Err(Error::new(ErrorKind::ChainCorruption, "extent chain loops"));
            }

            let next = self.next_extent;
            self.extent_pos -= self.extent_size;
            if let Err(e) = self.load_extent(image, next) {
                warn!("can't advance to extent {}: {}", next, e);
                self.flags.insert(CursorFlags::ERROR);
                return Err(e);
            }
        }

        Ok(())
    }

    fn update_eof(&mut self) {
        self.flags.set(CursorFlags::AT_EOF, self.position >= self.size);
    }

    fn check_usable(&self) -> Result<()> {
        if self.flags.contains(CursorFlags::ERROR) {
            return Err(Error::new(ErrorKind::BadState, "cursor is in error state"));
        }
        Ok(())
    }

    /// 移动文件位置
    ///
    /// 总是从第一个 extent 重新开始定位。超过文件大小的目标会被截断
    /// 到文件末尾。
    ///
    /// # 返回
    ///
    /// 新的位置
    ///
    /// # 错误
    ///
    /// - `ErrorKind::BadState` - 游标已处于出错状态
    /// - extent 无法读取（游标进入出错状态）
    pub fn seek<D: BlockDevice>(&mut self, image: &mut DiskImage<D>, target: u32) -> Result<u32> {
        self.check_usable()?;

        let first = self.first_extent;
        if let Err(e) = self.load_extent(image, first) {
            self.flags.insert(CursorFlags::ERROR);
            return Err(e);
        }

        let target = core::cmp::min(target, self.size);
        self.flags.remove(CursorFlags::AT_EOF);
        self.position = target;
        self.extent_pos = target;

        self.advance(image)?;
        self.update_eof();

        debug!(
            "seek: position={} extent={} extent_pos={}",
            self.position, self.current_extent, self.extent_pos
        );
        Ok(self.position)
    }

    /// 读取文件内容
    ///
    /// 从当前位置读取数据到缓冲区，跨 extent 边界时自动前进。
    ///
    /// # 返回
    ///
    /// 实际读取的字节数；到达末尾时返回 0。已经读到部分数据后发生的
    /// 错误不会返回，而是返回已读字节数，游标进入出错状态。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::BadState` - 游标已处于出错状态
    /// - `ErrorKind::ChainCorruption` - 链在文件大小之前结束
    pub fn read<D: BlockDevice>(&mut self, image: &mut DiskImage<D>, buf: &mut [u8]) -> Result<usize> {
        self.check_usable()?;
        if self.flags.contains(CursorFlags::AT_EOF) {
            return Ok(0);
        }

        let remaining = (self.size - self.position) as usize;
        let want = core::cmp::min(buf.len(), remaining);
        let mut done = 0;

        while done < want {
            let result = match self.advance(image) {
                Ok(()) => {
                    ExtentReader::new(image).read_data(
                        self.current_extent,
                        self.extent_pos,
                        &mut buf[done..want],
                    )
                }
                Err(e) => Err(e),
            };

            let n = match result {
                Ok(n) => n,
                Err(e) => {
                    self.flags.insert(CursorFlags::ERROR);
                    if done > 0 {
                        return Ok(done);
                    }
                    return Err(e);
                }
            };

            if n == 0 {
                // 链已结束但还没到文件大小
                warn!(
                    "read finished early ({} of {} bytes, position {})",
                    done, want, self.position
                );
                self.flags.insert(CursorFlags::ERROR);
                if done > 0 {
                    return Ok(done);
                }
                return Err(Error::new(
                    ErrorKind::ChainCorruption,
                    "extent chain ended before file size",
                ));
            }

            done += n;
            self.extent_pos += n as u32;
            self.position += n as u32;

            // 读到 extent 末尾时立即前进，链断裂在本次调用内发现
            if self.extent_pos >= self.extent_size && self.advance(image).is_err() {
                self.update_eof();
                return Ok(done);
            }
        }

        self.update_eof();
        Ok(done)
    }

    /// 重置到文件开头
    pub fn rewind<D: BlockDevice>(&mut self, image: &mut DiskImage<D>) -> Result<u32> {
        self.seek(image, 0)
    }

    /// 文件大小（字节）
    pub fn size(&self) -> u32 {
        self.size
    }

    /// 当前文件位置
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn is_eof(&self) -> bool {
        self.flags.contains(CursorFlags::AT_EOF)
    }

    pub fn is_errored(&self) -> bool {
        self.flags.contains(CursorFlags::ERROR)
    }

    pub fn flags(&self) -> CursorFlags {
        self.flags
    }

    pub fn is_directory(&self) -> bool {
        self.attributes.contains(FileAttributes::DIRECTORY)
    }

    pub fn attributes(&self) -> FileAttributes {
        self.attributes
    }

    pub fn first_extent(&self) -> u32 {
        self.first_extent
    }

    pub fn current_extent(&self) -> u32 {
        self.current_extent
    }

    pub fn prev_extent(&self) -> u32 {
        self.prev_extent
    }

    pub fn next_extent(&self) -> u32 {
        self.next_extent
    }
}
