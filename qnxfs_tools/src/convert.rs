//! 文本转换

/// QNX 文本文件的行分隔符（ASCII RS）
pub const QNX_RS: u8 = 0x1e;

/// 把 RS 就地替换为 LF
pub fn rs_to_lf(buf: &mut [u8]) {
    for b in buf.iter_mut().filter(|b| **b == QNX_RS) {
        *b = b'\n';
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rs_to_lf() {
        let mut buf = *b"a\x1eb\x1e\x1ec\n";
        rs_to_lf(&mut buf);
        assert_eq!(&buf, b"a\nb\n\nc\n");

        let mut empty: [u8; 0] = [];
        rs_to_lf(&mut empty);
    }
}
