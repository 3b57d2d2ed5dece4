//! QNX 可执行加载文件解码
//!
//! 文件以 SOH 开头，后跟 13 字节头记录；之后是若干以 STX 开头的
//! 加载记录，每条记录把一段数据放到代码段或数据段的指定偏移。

use std::fmt;

use anyhow::{bail, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::warn;

/// 输入文件大小上限
pub const MAX_LOAD_FILE_SIZE: usize = 1024 * 1024;

const SOH: u8 = 0x01;
const STX: u8 = 0x02;

/// 头记录大小
pub const LOAD_HEADER_SIZE: usize = 13;
/// 加载记录头大小（类型 + 偏移 + 长度）
pub const LOAD_RECORD_HEADER_SIZE: usize = 5;

/// 加载文件头
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadHeader {
    pub code_flags: u8,
    pub code_size: u16,
    pub init_data_size: u16,
    pub const_size: u16,
    pub const_checksum: u16,
    pub stack_size: u16,
    pub code_spare: u16,
}

impl LoadHeader {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < LOAD_HEADER_SIZE {
            bail!("load header truncated");
        }
        Ok(Self {
            code_flags: buf[0],
            code_size: LittleEndian::read_u16(&buf[1..3]),
            init_data_size: LittleEndian::read_u16(&buf[3..5]),
            const_size: LittleEndian::read_u16(&buf[5..7]),
            const_checksum: LittleEndian::read_u16(&buf[7..9]),
            stack_size: LittleEndian::read_u16(&buf[9..11]),
            code_spare: LittleEndian::read_u16(&buf[11..13]),
        })
    }
}

impl fmt::Display for LoadHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Code_flags:\t  {:02x}", self.code_flags)?;
        let fields = [
            ("Code_size", self.code_size),
            ("Init_data_size", self.init_data_size),
            ("Const_size", self.const_size),
            ("Const_checksum", self.const_checksum),
            ("Stack_size", self.stack_size),
            ("Code_spare", self.code_spare),
        ];
        for (name, value) in fields {
            writeln!(f, "{name}:\t{value:04x} ({value})")?;
        }
        Ok(())
    }
}

/// 加载目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Code,
    Data,
    /// 未知类型，记录被跳过
    Unknown(u8),
}

impl From<u8> for LoadTarget {
    fn from(load_type: u8) -> Self {
        match load_type {
            0 => LoadTarget::Code,
            1 => LoadTarget::Data,
            other => LoadTarget::Unknown(other),
        }
    }
}

/// 一条加载记录的摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRecord {
    pub target: LoadTarget,
    pub offset: u16,
    pub length: u16,
}

impl fmt::Display for LoadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let load_type = match self.target {
            LoadTarget::Code => 0,
            LoadTarget::Data => 1,
            LoadTarget::Unknown(t) => t,
        };
        writeln!(f, "Load type:\t{load_type:02x}")?;
        writeln!(f, "Offset:\t{:04x} ({})", self.offset, self.offset)?;
        write!(f, "Length:\t{:04x} ({})", self.length, self.length)
    }
}

/// 解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadImage {
    pub header: LoadHeader,
    pub records: Vec<LoadRecord>,
    /// 代码段，大小为 `code_size`
    pub code: Vec<u8>,
    /// 已初始化数据段，大小为 `init_data_size`
    pub data: Vec<u8>,
}

/// 解码加载文件
///
/// # 错误
///
/// - 输入超过 1MB、缺少 SOH 或头记录不完整
/// - 记录越过输入末尾，或写入位置超出目标段
pub fn decode(input: &[u8]) -> Result<LoadImage> {
    if input.len() > MAX_LOAD_FILE_SIZE {
        bail!("file size above limit ({} bytes)", MAX_LOAD_FILE_SIZE);
    }
    if input.len() < 1 + LOAD_HEADER_SIZE {
        bail!("file too small ({} bytes)", input.len());
    }
    if input[0] != SOH {
        bail!("missing SOH");
    }

    let header = LoadHeader::decode(&input[1..1 + LOAD_HEADER_SIZE])?;
    let mut code = vec![0u8; header.code_size as usize];
    let mut data = vec![0u8; header.init_data_size as usize];
    let mut records = Vec::new();

    let mut pos = 1 + LOAD_HEADER_SIZE;
    while pos < input.len() {
        if input[pos] != STX {
            warn!("missing STX at {:x} ({})", pos, pos);
            break;
        }
        pos += 1;

        let Some(head) = input.get(pos..pos + LOAD_RECORD_HEADER_SIZE) else {
            bail!("load record at {} truncated", pos - 1);
        };
        let record = LoadRecord {
            target: LoadTarget::from(head[0]),
            offset: LittleEndian::read_u16(&head[1..3]),
            length: LittleEndian::read_u16(&head[3..5]),
        };
        pos += LOAD_RECORD_HEADER_SIZE;

        let len = record.length as usize;
        let Some(payload) = input.get(pos..pos + len) else {
            bail!("load record data at {} runs past end of file", pos);
        };

        let segment = match record.target {
            LoadTarget::Code => Some(&mut code),
            LoadTarget::Data => Some(&mut data),
            LoadTarget::Unknown(t) => {
                warn!("unknown load type {:x}", t);
                None
            }
        };
        if let Some(segment) = segment {
            let start = record.offset as usize;
            let Some(dst) = segment.get_mut(start..start + len) else {
                bail!(
                    "load record {:?} at offset {} length {} exceeds segment size {}",
                    record.target,
                    start,
                    len,
                    segment.len()
                );
            };
            dst.copy_from_slice(payload);
        }

        records.push(record);
        pos += len;
    }

    Ok(LoadImage {
        header,
        records,
        code,
        data,
    })
}
