//! 分块解码 - 把传输层的字节块切分为完整的行
//!
//! 一个块里可能有零条、一条或多条记录，一条记录也可能被拆到两个块里。
//! 未以换行结尾的尾部会保留到下一个块；`\n` 不会出现在 UTF-8 多字节序列中，
//! 因此按字节切分是安全的。

/// 行解码器
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个块，返回其中所有完整的行（不含换行符）
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.pending[start..end]));
            start = end + 1;
        }
        self.pending.drain(..start);

        lines
    }

    /// 输入结束时取出剩余的不完整行
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }

    /// 尚未成行的字节数
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
