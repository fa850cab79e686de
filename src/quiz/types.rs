//! 测验类型定义模块
//!
//! 包含提取结果的共享类型，被 fenced / grammar 两种提取策略以及渲染层共同使用。
//! 序列化格式与消息内嵌的 JSON 测验块保持一致（snake_case）。

use serde::{Deserialize, Serialize};

/// 未提供标题时使用的默认测验标题
pub const DEFAULT_QUIZ_TITLE: &str = "Practice Quiz";

// ============================================================================
// Difficulty - 难度
// ============================================================================

/// 题目难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

impl Difficulty {
    /// 宽松解析难度字符串，无法识别时返回 `Medium`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

// ============================================================================
// QuizQuestionRecord - 单道题
// ============================================================================

/// 结构化的单选题
///
/// 不变量：`options.len() >= 2` 且 `correct_option_index < options.len()`。
/// 只能通过 [`QuizQuestionRecord::new`] 构造，以保证不变量成立。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestionRecord {
    /// 题干
    #[serde(rename = "question")]
    pub question_text: String,
    /// 选项文本（已去除内联正确标记）
    pub options: Vec<String>,
    /// 正确选项的下标（从 0 开始）
    #[serde(rename = "correct_option")]
    pub correct_option_index: usize,
    /// 解析
    #[serde(default)]
    pub explanation: Option<String>,
    /// 难度
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl QuizQuestionRecord {
    /// 构造一道题；选项少于 2 个或题干为空时返回 `None`
    ///
    /// 越界的 `correct_option_index` 会被重置为 0。
    pub fn new(
        question_text: impl Into<String>,
        options: Vec<String>,
        correct_option_index: usize,
        explanation: Option<String>,
        difficulty: Difficulty,
    ) -> Option<Self> {
        let question_text = question_text.into();
        if question_text.trim().is_empty() || options.len() < 2 {
            return None;
        }

        let correct_option_index = if correct_option_index < options.len() {
            correct_option_index
        } else {
            0
        };

        Some(Self {
            question_text,
            options,
            correct_option_index,
            explanation,
            difficulty,
        })
    }

    /// 正确选项的字母（A、B、C...）
    pub fn correct_letter(&self) -> char {
        index_to_letter(self.correct_option_index)
    }
}

// ============================================================================
// QuizDocument - 测验
// ============================================================================

/// 提取成功后生成的测验，创建后只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDocument {
    pub title: String,
    pub questions: Vec<QuizQuestionRecord>,
}

impl QuizDocument {
    pub fn new(title: impl Into<String>, questions: Vec<QuizQuestionRecord>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_QUIZ_TITLE.to_string()
        } else {
            title
        };
        Self { title, questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

// ============================================================================
// ExtractionResult - 提取结果
// ============================================================================

/// 提取策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// 内嵌的 ```json 测验块
    Fenced,
    /// 自由文本行语法
    LineGrammar,
}

/// 对一条完整消息运行提取器的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// 检测到的测验；`None` 表示整条消息都是普通文本
    pub quiz: Option<QuizDocument>,
    /// 测验之外需要显示的文本
    pub remaining_text: String,
    /// 命中的策略
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ExtractionStrategy>,
}

impl ExtractionResult {
    /// 未检测到测验，整条消息按普通文本处理
    pub fn prose(text: &str) -> Self {
        Self {
            quiz: None,
            remaining_text: text.trim().to_string(),
            strategy: None,
        }
    }

    pub fn has_quiz(&self) -> bool {
        self.quiz.is_some()
    }
}

/// 字母转下标：A → 0，B → 1 ...（大小写不敏感）
pub fn letter_to_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        Some((upper as u8 - b'A') as usize)
    } else {
        None
    }
}

/// 下标转字母：0 → A
pub fn index_to_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}
