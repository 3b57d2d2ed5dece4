//! QNX 1.2 常量定义

/// 扇区（块）大小，所有块号运算的单位
pub const QNX_BLOCK_SIZE: usize = 512;

/// 镜像大小上限（2GB - 1）
///
/// 这是访问层自己划定的安全上限，并非磁盘格式的限制。
pub const QNX_MAX_IMAGE_SIZE: u64 = 0x7fff_ffff;

/// 文件名最大可用字符数
pub const QNX_MAX_NAME_LEN: usize = 16;

/// 目录项中文件名字段的长度（16 个字符 + 结尾填充）
pub const QNX_NAME_FIELD_LEN: usize = QNX_MAX_NAME_LEN + 1;

/// Extent 头大小
pub const QNX_XTNT_HEADER_SIZE: usize = 16;

/// 目录项大小
pub const QNX_DIR_ENTRY_SIZE: usize = 48;

/// 目录容器记录大小（父 extent + 目录索引）
pub const QNX_DIR_CONT_SIZE: usize = 4;

/// 根目录项在 superblock（块 1）中的字节偏移
pub const QNX_ROOT_ENTRY_OFFSET: usize = 68;

/// Superblock 有效内容大小（到根目录项结束为止）
pub const QNX_SUPERBLOCK_SIZE: usize = QNX_ROOT_ENTRY_OFFSET + QNX_DIR_ENTRY_SIZE;

/// 文件属性：目录
pub const QNX_ATTR_DIRECTORY: u8 = 0x20;

/// 错误码（兼容 C errno）
pub const EOK: i32 = 0;
pub const ENOENT: i32 = 2;
pub const EIO: i32 = 5;
pub const EBADF: i32 = 9;
pub const ENOTDIR: i32 = 20;
pub const EISDIR: i32 = 21;
pub const EINVAL: i32 = 22;
pub const EFBIG: i32 = 27;
