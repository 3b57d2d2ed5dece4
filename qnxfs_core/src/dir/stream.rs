//! 目录项流

use log::warn;

use crate::{
    block::{BlockDevice, DiskImage},
    consts::*,
    error::{Error, ErrorKind, Result},
    fs::FileCursor,
    types::DirEntry,
};

/// 目录项流
///
/// 把打开的目录看作字节流：4 字节容器记录之后是连续的 48 字节目录项。
/// 按磁盘顺序逐个产出，包括未使用的槽位。流只能遍历一次，
/// 读不满一个完整目录项时结束；读取出错时先产出一次 `Err` 再结束。
///
/// # 示例
///
/// ```rust,ignore
/// let mut cursor = open_root(&mut image)?;
/// for entry in DirectoryStream::init(&mut image, &mut cursor)? {
///     let entry = entry?;
///     if entry.is_used() {
///         println!("{}", entry.name_str().unwrap_or("?"));
///     }
/// }
/// ```
pub struct DirectoryStream<'a, D: BlockDevice> {
    image: &'a mut DiskImage<D>,
    cursor: &'a mut FileCursor,
    finished: bool,
}

impl<'a, D: BlockDevice> DirectoryStream<'a, D> {
    /// 定位到第一个目录项
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NotADirectory` - 游标不是目录
    /// - `ErrorKind::Bounds` - 目录短于容器记录
    /// - 游标 seek 失败
    pub fn init(image: &'a mut DiskImage<D>, cursor: &'a mut FileCursor) -> Result<Self> {
        if !cursor.is_directory() {
            return Err(Error::new(ErrorKind::NotADirectory, "not a directory"));
        }

        let target = QNX_DIR_CONT_SIZE as u32;
        let pos = cursor.seek(image, target)?;
        if pos != target {
            warn!("directory too short ({} bytes)", cursor.size());
            return Err(Error::new(
                ErrorKind::Bounds,
                "directory shorter than container record",
            ));
        }

        Ok(Self {
            image,
            cursor,
            finished: false,
        })
    }

    /// 读取下一个目录项
    ///
    /// # 返回
    ///
    /// `Ok(None)` 表示目录已结束
    pub fn next_entry(&mut self) -> Result<Option<DirEntry>> {
        if self.finished {
            return Ok(None);
        }

        let mut raw = [0u8; QNX_DIR_ENTRY_SIZE];
        let n = match self.cursor.read(self.image, &mut raw) {
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        if n < QNX_DIR_ENTRY_SIZE {
            if n > 0 {
                warn!("truncated directory entry ({} bytes)", n);
            }
            self.finished = true;
            return Ok(None);
        }

        DirEntry::decode(&raw).map(Some)
    }
}

impl<D: BlockDevice> Iterator for DirectoryStream<'_, D> {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use crate::testutil::{dir_entry, dir_payload, hello_image, ImageBuilder};
    use crate::types::FileAttributes;
    use alloc::vec::Vec;

    fn open_dir(image: &mut DiskImage<MemDevice>, first: u32) -> FileCursor {
        let entry = dir_entry(b"D", first, FileAttributes::DIRECTORY);
        FileCursor::open_from(image, &entry).unwrap()
    }

    #[test]
    fn test_entries_in_disk_order() {
        let mut image = DiskImage::new(MemDevice::new(hello_image()), 0).unwrap();
        let mut cursor = open_dir(&mut image, 2);

        let entries: Vec<DirEntry> = DirectoryStream::init(&mut image, &mut cursor)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        let names: Vec<&[u8]> = entries.iter().map(|e| e.name_bytes()).collect();
        assert_eq!(names, [&b"HELLO"[..], &b""[..], &b"SUB"[..], &b"EMPTY"[..]]);
        assert!(!entries[1].is_used());
        assert!(entries[2].is_directory());
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_empty_directory() {
        let mut b = ImageBuilder::new(3);
        b.write_extent(2, 0, 0, &dir_payload(&[]));
        let mut image = DiskImage::new(MemDevice::new(b.build()), 0).unwrap();
        let mut cursor = open_dir(&mut image, 2);

        let mut stream = DirectoryStream::init(&mut image, &mut cursor).unwrap();
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_trailing_partial_record_ignored() {
        let mut payload = dir_payload(&[dir_entry(b"A", 3, FileAttributes::empty())]);
        payload.extend_from_slice(&[0xEE; 20]);
        let mut b = ImageBuilder::new(3);
        b.write_extent(2, 0, 0, &payload);
        let mut image = DiskImage::new(MemDevice::new(b.build()), 0).unwrap();
        let mut cursor = open_dir(&mut image, 2);

        let entries: Vec<_> = DirectoryStream::init(&mut image, &mut cursor)
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].as_ref().unwrap().name_bytes(), b"A");
    }

    #[test]
    fn test_directory_shorter_than_container() {
        let mut b = ImageBuilder::new(3);
        b.write_extent(2, 0, 0, &[0, 0]);
        let mut image = DiskImage::new(MemDevice::new(b.build()), 0).unwrap();
        let mut cursor = open_dir(&mut image, 2);

        let err = DirectoryStream::init(&mut image, &mut cursor).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn test_not_a_directory() {
        let mut image = DiskImage::new(MemDevice::new(hello_image()), 0).unwrap();
        let entry = dir_entry(b"HELLO", 3, FileAttributes::empty());
        let mut cursor = FileCursor::open_from(&mut image, &entry).unwrap();

        let err = DirectoryStream::init(&mut image, &mut cursor).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotADirectory);
    }

    #[test]
    fn test_error_yielded_once() {
        // 目录跨两个 extent，打开后把第二个 extent 的链接改坏
        let entries = [
            dir_entry(b"A", 9, FileAttributes::empty()),
            dir_entry(b"B", 9, FileAttributes::empty()),
        ];
        let payload = dir_payload(&entries);
        let mut b = ImageBuilder::new(4);
        b.write_extent(2, 0, 3, &payload[..QNX_DIR_CONT_SIZE + QNX_DIR_ENTRY_SIZE]);
        b.write_extent(3, 2, 0, &payload[QNX_DIR_CONT_SIZE + QNX_DIR_ENTRY_SIZE..]);
        let mut image = DiskImage::new(MemDevice::new(b.build()), 0).unwrap();
        let mut cursor = open_dir(&mut image, 2);

        b.write_extent(2, 0, 40, &payload[..QNX_DIR_CONT_SIZE + QNX_DIR_ENTRY_SIZE]);
        let mut image = DiskImage::new(MemDevice::new(b.build()), 0).unwrap();

        let mut stream = DirectoryStream::init(&mut image, &mut cursor).unwrap();
        assert_eq!(stream.next().unwrap().unwrap().name_bytes(), b"A");
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
    }
}
