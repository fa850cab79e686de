//! 行分类模块 - 把单行文本归类为题目、选项、答案或解析
//!
//! 纯函数、无状态。正则只在本模块内部使用，调用方只看到 [`LineKind`]，
//! 状态机不会再从原始字符串推断意图。
//!
//! 匹配顺序（先匹配先返回）：
//! 1. 题目行 `Q1. ...` / `Question 2: ...` / `3) ...`（编号行若本身是选项则不算题目）
//! 2. 选项行 `A) ...` / `**B.** ...`，同时识别并去掉内联正确标记
//! 3. 答案行 `Answer: B` / `Correct Answer: (C)`
//! 4. 解析行 `Explanation:` / `Solution:` / `Reason:`
//!
//! 已知误判：选项正文里真的含有 ✓、"(correct)" 或加粗的 "correct" 时，
//! 也会被当作正确标记并被去掉。保持这一行为以兼容既有输入。

use regex::Regex;
use std::sync::LazyLock;

/// `Q1.` / `Question 2:` / `**Q3)**`，带编号，标点可省略
static NUMBERED_Q_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\*\*)?\s*(?:question|q)\s*(\d+)\s*[.):\-]?\s*(?:\*\*)?\s*(?:[.):\-]\s*)?(.*)$")
        .expect("Invalid numbered question regex")
});

/// `Q:` / `Question.`，不带编号时必须有标点
static PLAIN_Q_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\*\*)?\s*(?:question|q)\s*(?:\*\*)?\s*[.:)]\s*(?:\*\*)?\s*(.*)$")
        .expect("Invalid question regex")
});

/// `1. ...` / `2) ...` / `**3.** ...`
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\*\*)?(\d+)\s*[.)](?:\s+|\*\*\s*)(.+)$").expect("Invalid numbered line regex")
});

/// 解析续行的终止条件之一：裸编号行
static BARE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\*\*)?\d+\s*[.)]").expect("Invalid bare number regex"));

/// `A) ...` / `**B.** ...` / `- C: ...` / `(D) ...`
static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-•]\s+)?(?:\*\*)?(?:\(([A-D])\)|([A-D])(?:\*\*)?\s*[.):])(?:\*\*)?\s*(.+)$")
        .expect("Invalid option regex")
});

/// `Answer: B` / `**Correct Answer:** (c)`
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\*\*)?\s*(?:correct\s+)?answer\s*(?:\*\*)?\s*[:：]\s*(?:\*\*)?\s*(?:option\s+)?\(?([a-d])\b")
        .expect("Invalid answer regex")
});

/// `Explanation: ...` / `**Solution:** ...` / `Reason: ...`
static EXPLANATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\*\*)?\s*(?:explanation|solution|reason)\s*(?:\*\*)?\s*[:：]\s*(?:\*\*)?\s*(.*)$")
        .expect("Invalid explanation regex")
});

/// `(correct)` 或加粗的 `correct`
static CORRECT_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\*\*)?\(\s*correct\s*\)(?:\*\*)?|\*\*\s*correct\s*\*\*")
        .expect("Invalid correct marker regex")
});

/// 表示正确的勾选符号
const CHECKMARK_GLYPHS: [char; 4] = ['✓', '✔', '✅', '☑'];

/// emoji 变体选择符，只在紧跟勾选符号时一起去掉
const VARIATION_SELECTOR: char = '\u{FE0F}';

/// 单行分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// 题目行
    QuestionHeader {
        /// 题号（裸 `Q:` 时为 None）
        index: Option<u32>,
        /// 题干，可能为空（题干写在下一行）
        text: String,
    },
    /// 选项行
    OptionLine {
        letter: char,
        /// 已去掉内联正确标记的选项文本
        text: String,
        /// 是否带有内联正确标记
        inline_correct_hint: bool,
    },
    /// 答案行
    AnswerMarker { letter: char },
    /// 解析行（仅首行文本，续行见 [`collect_explanation`]）
    ExplanationHeader { text: String },
    /// 其他
    Unclassified,
}

/// 对单行文本分类
pub fn classify_line(line: &str) -> LineKind {
    let line = line.trim();
    if line.is_empty() {
        return LineKind::Unclassified;
    }

    if let Some(caps) = NUMBERED_Q_RE.captures(line) {
        let index = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let text = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        return LineKind::QuestionHeader {
            index,
            text: clean_text(text),
        };
    }

    if let Some(caps) = PLAIN_Q_RE.captures(line) {
        let text = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        return LineKind::QuestionHeader {
            index: None,
            text: clean_text(text),
        };
    }

    if let Some(caps) = NUMBERED_RE.captures(line) {
        let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("").trim();
        // 编号后面紧跟选项（如 "1. A) 3"）时是选项，不是新题目
        if let Some(option) = match_option(rest) {
            return option;
        }
        let index = caps.get(1).and_then(|m| m.as_str().parse().ok());
        return LineKind::QuestionHeader {
            index,
            text: clean_text(rest),
        };
    }

    if let Some(option) = match_option(line) {
        return option;
    }

    if let Some(caps) = ANSWER_RE.captures(line) {
        if let Some(letter) = caps.get(1).and_then(|m| m.as_str().chars().next()) {
            return LineKind::AnswerMarker {
                letter: letter.to_ascii_uppercase(),
            };
        }
    }

    if let Some(caps) = EXPLANATION_RE.captures(line) {
        let text = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        return LineKind::ExplanationHeader {
            text: clean_text(text),
        };
    }

    LineKind::Unclassified
}

/// 解析续行是否应在此行终止（题目行、裸编号行或答案行）
pub fn ends_explanation(line: &str) -> bool {
    let trimmed = line.trim();
    if BARE_NUMBER_RE.is_match(trimmed) {
        return true;
    }
    matches!(
        classify_line(trimmed),
        LineKind::QuestionHeader { .. } | LineKind::AnswerMarker { .. }
    )
}

/// 从解析行开始收集解析文本
///
/// `lines[start]` 必须是解析行。后续行作为续行追加，直到遇到
/// [`ends_explanation`] 为真的行或输入结束。
///
/// 返回 `(解析文本, 下一个未消费的行号)`。
pub fn collect_explanation(lines: &[&str], start: usize) -> (String, usize) {
    let mut parts: Vec<String> = Vec::new();

    if let Some(LineKind::ExplanationHeader { text }) = lines.get(start).map(|l| classify_line(l)) {
        if !text.is_empty() {
            parts.push(text);
        }
    }

    let mut next = start + 1;
    while next < lines.len() {
        let line = lines[next];
        if ends_explanation(line) {
            break;
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
        next += 1;
    }

    (parts.join("\n"), next)
}

/// 匹配选项行，并处理内联正确标记
fn match_option(line: &str) -> Option<LineKind> {
    let caps = OPTION_RE.captures(line)?;
    let letter = caps
        .get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().chars().next())?;
    let raw = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    let (text, inline_correct_hint) = strip_correct_markers(raw);
    if text.is_empty() {
        return None;
    }

    Some(LineKind::OptionLine {
        letter,
        text,
        inline_correct_hint,
    })
}

/// 去掉选项文本中的正确标记，返回 `(文本, 是否含标记)`
fn strip_correct_markers(raw: &str) -> (String, bool) {
    let has_glyph = raw.contains(&CHECKMARK_GLYPHS[..]);
    let has_marker = CORRECT_MARKER_RE.is_match(raw);

    if !has_glyph && !has_marker {
        return (clean_text(raw), false);
    }

    let without_markers = CORRECT_MARKER_RE.replace_all(raw, " ");
    let mut without_glyphs = String::with_capacity(without_markers.len());
    let mut chars = without_markers.chars().peekable();
    while let Some(c) = chars.next() {
        if CHECKMARK_GLYPHS.contains(&c) {
            chars.next_if_eq(&VARIATION_SELECTOR);
            without_glyphs.push(' ');
        } else {
            without_glyphs.push(c);
        }
    }
    let collapsed = without_glyphs.split_whitespace().collect::<Vec<_>>().join(" ");

    (clean_text(&collapsed), true)
}

/// 去掉首尾空白和不成对的 `**`
fn clean_text(text: &str) -> String {
    let mut text = text.trim();
    if text.matches("**").count() % 2 == 1 {
        if let Some(stripped) = text.strip_suffix("**") {
            text = stripped;
        } else if let Some(stripped) = text.strip_prefix("**") {
            text = stripped;
        }
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(letter: char, text: &str, hint: bool) -> LineKind {
        LineKind::OptionLine {
            letter,
            text: text.to_string(),
            inline_correct_hint: hint,
        }
    }

    #[test]
    fn test_question_header_forms() {
        assert_eq!(
            classify_line("Q1. What is 2+2?"),
            LineKind::QuestionHeader { index: Some(1), text: "What is 2+2?".into() }
        );
        assert_eq!(
            classify_line("**Question 2:** Which gas?"),
            LineKind::QuestionHeader { index: Some(2), text: "Which gas?".into() }
        );
        assert_eq!(
            classify_line("**Q3.** Name the organelle."),
            LineKind::QuestionHeader { index: Some(3), text: "Name the organelle.".into() }
        );
        assert_eq!(
            classify_line("Question: Define inertia"),
            LineKind::QuestionHeader { index: None, text: "Define inertia".into() }
        );
        assert_eq!(
            classify_line("4) Speed of light?"),
            LineKind::QuestionHeader { index: Some(4), text: "Speed of light?".into() }
        );
    }

    #[test]
    fn test_header_without_text() {
        assert_eq!(
            classify_line("**Question 1**"),
            LineKind::QuestionHeader { index: Some(1), text: String::new() }
        );
    }

    #[test]
    fn test_words_starting_with_q_are_not_headers() {
        assert_eq!(classify_line("Quite a tricky topic."), LineKind::Unclassified);
        assert_eq!(classify_line("Questions like these appear in JEE."), LineKind::Unclassified);
    }

    #[test]
    fn test_decimal_is_not_numbered_question() {
        assert_eq!(classify_line("3.14 is close to pi"), LineKind::Unclassified);
    }

    #[test]
    fn test_numbered_option_is_not_a_question() {
        assert_eq!(classify_line("1. A) 3"), option('A', "3", false));
    }

    #[test]
    fn test_option_forms() {
        assert_eq!(classify_line("A) 3"), option('A', "3", false));
        assert_eq!(classify_line("B. Oxygen"), option('B', "Oxygen", false));
        assert_eq!(classify_line("C: Nitrogen"), option('C', "Nitrogen", false));
        assert_eq!(classify_line("**D)** Argon"), option('D', "Argon", false));
        assert_eq!(classify_line("- A) Mitochondria"), option('A', "Mitochondria", false));
        assert_eq!(classify_line("(B) Ribosome"), option('B', "Ribosome", false));
    }

    #[test]
    fn test_letters_beyond_d_are_not_options() {
        assert_eq!(classify_line("E) five"), LineKind::Unclassified);
    }

    #[test]
    fn test_inline_correct_markers_are_stripped() {
        assert_eq!(classify_line("B) 4 (correct)"), option('B', "4", true));
        assert_eq!(classify_line("B) 4 (Correct)"), option('B', "4", true));
        assert_eq!(classify_line("B) 4 ✓"), option('B', "4", true));
        assert_eq!(classify_line("C) 5 ✔\u{FE0F}"), option('C', "5", true));
        assert_eq!(classify_line("B) 4 ✅"), option('B', "4", true));
        assert_eq!(classify_line("B) 4 **correct**"), option('B', "4", true));
        assert_eq!(classify_line("**B) 4** ✔️"), option('B', "4", true));
    }

    #[test]
    fn test_answer_markers() {
        assert_eq!(classify_line("Answer: B"), LineKind::AnswerMarker { letter: 'B' });
        assert_eq!(classify_line("Correct Answer: (c)"), LineKind::AnswerMarker { letter: 'C' });
        assert_eq!(classify_line("**Answer:** D"), LineKind::AnswerMarker { letter: 'D' });
        assert_eq!(classify_line("answer: a) 3"), LineKind::AnswerMarker { letter: 'A' });
    }

    #[test]
    fn test_answer_requires_single_letter() {
        assert_eq!(classify_line("Answer: because gravity"), LineKind::Unclassified);
    }

    #[test]
    fn test_explanation_headers() {
        assert_eq!(
            classify_line("Explanation: Basic arithmetic."),
            LineKind::ExplanationHeader { text: "Basic arithmetic.".into() }
        );
        assert_eq!(
            classify_line("**Solution:** Use F = ma"),
            LineKind::ExplanationHeader { text: "Use F = ma".into() }
        );
        assert_eq!(
            classify_line("reason:"),
            LineKind::ExplanationHeader { text: String::new() }
        );
    }

    #[test]
    fn test_collect_explanation_stops_at_next_question() {
        let lines = vec![
            "Explanation: First line.",
            "Second line.",
            "",
            "Q2. Next?",
        ];
        let (text, next) = collect_explanation(&lines, 0);
        assert_eq!(text, "First line.\nSecond line.");
        assert_eq!(next, 3);
    }

    #[test]
    fn test_collect_explanation_stops_at_answer_and_numbered_line() {
        let lines = vec!["Reason:", "Because.", "Answer: A"];
        let (text, next) = collect_explanation(&lines, 0);
        assert_eq!(text, "Because.");
        assert_eq!(next, 2);

        let lines = vec!["Solution: x", "2. A) y"];
        let (_, next) = collect_explanation(&lines, 0);
        assert_eq!(next, 1);
    }

    #[test]
    fn test_collect_explanation_runs_to_end() {
        let lines = vec!["Explanation: Basic arithmetic."];
        let (text, next) = collect_explanation(&lines, 0);
        assert_eq!(text, "Basic arithmetic.");
        assert_eq!(next, 1);
    }

    #[test]
    fn test_plain_prose_is_unclassified() {
        assert_eq!(classify_line("Photosynthesis converts light."), LineKind::Unclassified);
        assert_eq!(classify_line(""), LineKind::Unclassified);
    }

    #[test]
    fn test_emoji_with_variation_selector_is_not_a_hint() {
        assert_eq!(classify_line("B) ☀️ The Sun"), option('B', "☀️ The Sun", false));
        assert_eq!(classify_line("A) ⚠️ Caution"), option('A', "⚠️ Caution", false));
    }
}
