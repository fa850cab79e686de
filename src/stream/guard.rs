//! 渲染安全检测 - 流未结束时判断缓冲区是否像一份正在生成的测验
//!
//! 只给出保守的"可能是测验"信号，用于在答案泄露前切换到占位渲染。
//! 这里的探测与最终提取的完整语法相互独立，不会产出任何结构化数据。

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::stream::consumer::StreamState;

/// 题目行探测：`Q1` / `Question 2` / `**Question:**`
static QUESTION_HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:\*\*)?[ \t]*(?:q(?:uestion)?[ \t]*\d+|question[ \t]*(?:\*\*)?[ \t]*[:.)])")
        .expect("Invalid question header pattern regex")
});

/// 编号行之下（可隔空行）紧跟 A–D 选项
static NUMBERED_OPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:\*\*)?\d+[ \t]*[.)].*\r?\n(?:[ \t]*\r?\n)*[ \t]*(?:[-•][ \t]+)?(?:\*\*)?\(?[A-D](?:\*\*)?[ \t]*[.):]",
    )
    .expect("Invalid numbered option pattern regex")
});

/// json 代码块中出现 `"type": "quiz"`（代码块可能尚未闭合）
static QUIZ_FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)```[ \t]*json\b.*?"type"\s*:\s*"quiz""#).expect("Invalid quiz fence pattern regex")
});

/// 当前应使用的渲染方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// 直接显示缓冲区
    Raw,
    /// 显示"正在生成测验…"占位
    QuizPlaceholder,
    /// 流已结束，交给最终提取
    Final,
}

/// 缓冲区是否像一份测验
pub fn looks_like_quiz(buffer: &str) -> bool {
    QUESTION_HEADER_PATTERN.is_match(buffer)
        || NUMBERED_OPTION_PATTERN.is_match(buffer)
        || QUIZ_FENCE_PATTERN.is_match(buffer)
}

/// 根据流状态选择渲染方式；流关闭后不再探测
pub fn render_mode(state: &StreamState) -> RenderMode {
    if !state.is_open() {
        return RenderMode::Final;
    }
    if looks_like_quiz(state.buffer()) {
        RenderMode::QuizPlaceholder
    } else {
        RenderMode::Raw
    }
}
