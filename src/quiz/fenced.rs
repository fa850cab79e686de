//! 结构化测验块提取（优先策略）
//!
//! 在消息中查找 ```json 代码块，内容为 `{"type": "quiz", "questions": [...]}` 时
//! 即视为权威测验。代码块原样从文本中移除，剩余部分作为普通文本。

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::quiz::types::{
    letter_to_index, Difficulty, ExtractionResult, ExtractionStrategy, QuizDocument,
    QuizQuestionRecord, DEFAULT_QUIZ_TITLE,
};

/// ```json ... ``` 代码块（info string 大小写不敏感）
static JSON_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```[ \t]*json[ \t]*\r?\n(.*?)```").expect("Invalid json fence regex")
});

/// 代码块内的原始测验格式
#[derive(Debug, Deserialize)]
struct RawQuizBlock {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<serde_json::Value>,
    correct_option: Option<serde_json::Value>,
    explanation: Option<String>,
    difficulty: Option<String>,
}

/// 尝试从文本中提取结构化测验块
///
/// 返回 `None` 表示没有合法的测验块（包括 JSON 损坏），调用方应回退到行语法。
pub fn extract_fenced_quiz(text: &str) -> Option<ExtractionResult> {
    for caps in JSON_FENCE_RE.captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let Some(quiz) = parse_quiz_block(body.as_str()) else {
            continue;
        };

        debug!(
            questions = quiz.questions.len(),
            "Found fenced quiz block"
        );

        let remaining = format!("{}{}", &text[..whole.start()], &text[whole.end()..]);
        return Some(ExtractionResult {
            quiz: Some(quiz),
            remaining_text: remaining.trim().to_string(),
            strategy: Some(ExtractionStrategy::Fenced),
        });
    }

    None
}

/// 解析代码块内容；不是合法测验时返回 `None`
fn parse_quiz_block(body: &str) -> Option<QuizDocument> {
    let raw: RawQuizBlock = match serde_json::from_str(body.trim()) {
        Ok(raw) => raw,
        Err(e) => {
            trace!(error = %e, "Fenced json block is not a quiz object");
            return None;
        }
    };

    if raw.kind.as_deref() != Some("quiz") {
        return None;
    }

    let questions: Vec<QuizQuestionRecord> = raw
        .questions
        .into_iter()
        .filter_map(convert_question)
        .collect();

    if questions.is_empty() {
        debug!("Fenced quiz block has no usable questions");
        return None;
    }

    Some(QuizDocument::new(
        raw.title.unwrap_or_else(|| DEFAULT_QUIZ_TITLE.to_string()),
        questions,
    ))
}

fn convert_question(raw: RawQuestion) -> Option<QuizQuestionRecord> {
    let options: Vec<String> = raw
        .options
        .iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect();

    let correct = raw
        .correct_option
        .as_ref()
        .and_then(correct_option_index)
        .unwrap_or(0);

    let difficulty = raw
        .difficulty
        .as_deref()
        .map(Difficulty::parse_lenient)
        .unwrap_or_default();

    let record = QuizQuestionRecord::new(raw.question, options, correct, raw.explanation, difficulty);
    if record.is_none() {
        debug!("Dropping fenced question with fewer than 2 options");
    }
    record
}

/// `correct_option` 可以是下标、数字字符串或字母
fn correct_option_index(value: &serde_json::Value) -> Option<usize> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<usize>() {
                return Some(n);
            }
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => letter_to_index(c),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = r#"```json
{"type":"quiz","title":"Arithmetic","questions":[
  {"question":"What is 2+2?","options":["3","4","5","6"],"correct_option":1,"explanation":"Basic arithmetic.","difficulty":"easy"}
]}
```"#;

    #[test]
    fn test_extracts_valid_block() {
        let text = format!("Here is a quiz:\n\n{}\n\nGood luck!", BLOCK);
        let result = extract_fenced_quiz(&text).unwrap();
        let quiz = result.quiz.unwrap();

        assert_eq!(quiz.title, "Arithmetic");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].correct_option_index, 1);
        assert_eq!(quiz.questions[0].difficulty, Difficulty::Easy);
        assert_eq!(result.remaining_text, "Here is a quiz:\n\n\n\nGood luck!");
        assert_eq!(result.strategy, Some(ExtractionStrategy::Fenced));
    }

    #[test]
    fn test_malformed_json_is_absent() {
        let text = "```json\n{\"type\":\"quiz\", \"questions\": [\n```";
        assert!(extract_fenced_quiz(text).is_none());
    }

    #[test]
    fn test_non_quiz_json_is_absent() {
        let text = "```json\n{\"type\":\"flashcards\",\"questions\":[{\"question\":\"x\",\"options\":[\"a\",\"b\"]}]}\n```";
        assert!(extract_fenced_quiz(text).is_none());
    }

    #[test]
    fn test_empty_questions_is_absent() {
        let text = "```json\n{\"type\":\"quiz\",\"questions\":[]}\n```";
        assert!(extract_fenced_quiz(text).is_none());
    }

    #[test]
    fn test_skips_invalid_block_and_uses_next() {
        let text = format!("```json\n{{\"a\": 1}}\n```\n\n{}", BLOCK);
        let result = extract_fenced_quiz(&text).unwrap();
        assert_eq!(result.remaining_text, "```json\n{\"a\": 1}\n```");
    }

    #[test]
    fn test_lenient_question_fields() {
        let text = r#"```JSON
{"type":"quiz","questions":[
  {"question":"Pick","options":["x","y","z"],"correct_option":"C"},
  {"question":"Too few","options":["only"],"correct_option":0},
  {"question":"Out of range","options":["x","y"],"correct_option":9,"difficulty":"brutal"}
]}
```"#;
        let quiz = extract_fenced_quiz(text).unwrap().quiz.unwrap();

        assert_eq!(quiz.title, DEFAULT_QUIZ_TITLE);
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].correct_option_index, 2);
        assert_eq!(quiz.questions[1].correct_option_index, 0);
        assert_eq!(quiz.questions[1].difficulty, Difficulty::Medium);
    }
}
