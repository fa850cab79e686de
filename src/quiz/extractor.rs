//! 测验提取入口 - 结构化块优先，行语法回退
//!
//! [`extract_quiz`] 只读取输入，不修改任何共享状态，可以在流结束后对同一份
//! 最终文本重复调用（例如“重新解析”操作），结果完全相同。

use tracing::debug;

use crate::quiz::fenced::extract_fenced_quiz;
use crate::quiz::grammar::extract_line_grammar_quiz;
use crate::quiz::types::ExtractionResult;

/// 从一条完整的模型回复中提取测验
///
/// 1. 查找 ```json 测验块，找到即作为权威结果
/// 2. 否则按自由文本语法逐行扫描
/// 3. 都没有时整条消息作为普通文本返回（`quiz` 为 `None`）
pub fn extract_quiz(text: &str) -> ExtractionResult {
    if let Some(result) = extract_fenced_quiz(text) {
        return result;
    }

    if let Some(result) = extract_line_grammar_quiz(text) {
        return result;
    }

    debug!(len = text.len(), "No quiz found in message");
    ExtractionResult::prose(text)
}
