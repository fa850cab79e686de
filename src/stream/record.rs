//! 流记录解析模块 - 解析聊天流中逐行的 JSON 记录
//!
//! 每行是以下两种之一：
//! - `{"content": "...", "done": false}` 增量片段
//! - `{"done": true, "success": ..., "full_content": ..., "model": ..., ...}` 结束标记

use serde::{Deserialize, Serialize};

/// 结束记录附带的元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoneMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// 服务端拼接好的完整回复
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// 服务端保存的消息 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 其他未识别的字段
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DoneMetadata {
    /// 服务端是否明确报告失败（`success: false`）
    pub fn reported_failure(&self) -> bool {
        self.success == Some(false)
    }
}

/// 一条流记录
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecord {
    /// 增量片段
    Content(String),
    /// 结束标记；`content` 为结束记录里附带的最后一段文本（如服务端兜底回复）
    Done {
        content: Option<String>,
        metadata: DoneMetadata,
    },
}

/// 记录的原始格式
#[derive(Debug, Clone, Deserialize)]
struct RawStreamRecord {
    content: Option<serde_json::Value>,
    #[serde(default)]
    done: bool,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

/// 解析单行记录
///
/// 空行、损坏的 JSON、既没有 `content` 也没有 `done` 的对象都返回 `None`，
/// 由调用方跳过。
pub fn parse_record_line(line: &str) -> Option<StreamRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let raw: RawStreamRecord = serde_json::from_str(line).ok()?;
    let content = raw.content.as_ref().and_then(content_text);

    if raw.done {
        let metadata: DoneMetadata =
            serde_json::from_value(serde_json::Value::Object(raw.rest)).unwrap_or_default();
        return Some(StreamRecord::Done {
            content: content.filter(|c| !c.is_empty()),
            metadata,
        });
    }

    content.map(StreamRecord::Content)
}

/// `content` 字段应为字符串；其他类型按 JSON 文本处理
fn content_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => serde_json::to_string(other).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_record() {
        let record = parse_record_line(r#"{"content": "Hello", "done": false}"#).unwrap();
        assert_eq!(record, StreamRecord::Content("Hello".to_string()));
    }

    #[test]
    fn test_parse_content_without_done_flag() {
        let record = parse_record_line(r#"{"content": "Hi"}"#).unwrap();
        assert_eq!(record, StreamRecord::Content("Hi".to_string()));
    }

    #[test]
    fn test_parse_done_record_with_metadata() {
        let line = r#"{"content": "", "done": true, "success": true, "full_content": "Hello", "model": "gpt-4o-mini", "message_id": "42", "latency": 7}"#;
        let record = parse_record_line(line).unwrap();

        match record {
            StreamRecord::Done { content, metadata } => {
                assert_eq!(content, None);
                assert_eq!(metadata.success, Some(true));
                assert_eq!(metadata.full_content.as_deref(), Some("Hello"));
                assert_eq!(metadata.model.as_deref(), Some("gpt-4o-mini"));
                assert_eq!(metadata.message_id.as_deref(), Some("42"));
                assert_eq!(metadata.extra["latency"], 7);
            }
            _ => panic!("Expected Done record"),
        }
    }

    #[test]
    fn test_parse_fallback_done_record() {
        let line = r#"{"content": "Please try again.", "done": true, "success": false, "error": "quota"}"#;
        let record = parse_record_line(line).unwrap();

        match record {
            StreamRecord::Done { content, metadata } => {
                assert_eq!(content.as_deref(), Some("Please try again."));
                assert!(metadata.reported_failure());
                assert_eq!(metadata.error.as_deref(), Some("quota"));
            }
            _ => panic!("Expected Done record"),
        }
    }

    #[test]
    fn test_malformed_and_empty_lines_are_skipped() {
        assert!(parse_record_line("").is_none());
        assert!(parse_record_line("   ").is_none());
        assert!(parse_record_line(r#"{"content": "trunc"#).is_none());
        assert!(parse_record_line("not json").is_none());
        assert!(parse_record_line(r#"{"other": 1}"#).is_none());
    }
}
