use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/** \brief 前端表单提供的默认 Provider。 */
pub const DEFAULT_PROVIDER: &str = "openai";

/** \brief 后端已知的 Provider 标识，仅用于 CLI 提示与批量查询。 */
pub const KNOWN_PROVIDERS: [&str; 4] = ["openai", "gemini", "claude", "groq"];

/**
 * \brief 解题请求，字段名即后端约定的 snake_case 线上格式，不可改动。
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRequest {
    /** \brief 题目描述原文 */
    pub problem_text: String,
    /** \brief 目标编程语言，如 "python" */
    pub language: String,
    /** \brief 用户水平，如 "intermediate" */
    pub user_level: String,
    /** \brief Provider 标识 */
    pub provider: String,
    /** \brief 该 Provider 的 API Key */
    pub api_key: String,
}

impl SolveRequest {
    /**
     * \brief 返回为空（或仅含空白）的必填字段名，供 UI 层在发起请求前校验。
     */
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("problem_text", &self.problem_text),
            ("language", &self.language),
            ("user_level", &self.user_level),
            ("provider", &self.provider),
            ("api_key", &self.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /**
     * \brief 校验全部字段已填写。
     */
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InvalidRequest { missing })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", .missing.join(", "))]
pub struct InvalidRequest {
    pub missing: Vec<&'static str>,
}

/**
 * \brief 后端返回的解答。缺失字段或 null 一律取空值，由渲染层补默认文案。
 */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Solution {
    /** \brief 解题思路 */
    #[serde(deserialize_with = "null_as_default")]
    pub explanation: String,
    /** \brief 代码 */
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    /** \brief 渐进式提示；后端未给出时会发送 null */
    #[serde(deserialize_with = "null_as_default")]
    pub hints: Vec<String>,
    /** \brief 时间复杂度；兼容后端的 camelCase 输出 */
    #[serde(alias = "timeComplexity", deserialize_with = "null_as_default")]
    pub time_complexity: String,
    /** \brief 空间复杂度 */
    #[serde(alias = "spaceComplexity", deserialize_with = "null_as_default")]
    pub space_complexity: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/**
 * \brief 非 2xx 响应体，`error` 字段可能缺失。
 */
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind}: {value} (expected one of: {expected})")]
pub struct ParseChoiceError {
    kind: &'static str,
    value: String,
    expected: String,
}

impl ParseChoiceError {
    fn new(kind: &'static str, value: &str, all: &[&str]) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: all.join(", "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    JavaScript,
    Python,
    Java,
    Cpp,
    Go,
    TypeScript,
    Ruby,
    Swift,
    Kotlin,
    Rust,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::JavaScript,
        Language::Python,
        Language::Java,
        Language::Cpp,
        Language::Go,
        Language::TypeScript,
        Language::Ruby,
        Language::Swift,
        Language::Kotlin,
        Language::Rust,
    ];

    /** \brief 线上传输使用的取值。 */
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::TypeScript => "typescript",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Rust => "rust",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = match wanted.as_str() {
            "c++" => "cpp",
            "js" => "javascript",
            "ts" => "typescript",
            other => other,
        };
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == wanted)
            .ok_or_else(|| {
                let all: Vec<&str> = Language::ALL.iter().map(|l| l.as_str()).collect();
                ParseChoiceError::new("language", s, &all)
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl UserLevel {
    pub const ALL: [UserLevel; 3] = [
        UserLevel::Beginner,
        UserLevel::Intermediate,
        UserLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserLevel::Beginner => "beginner",
            UserLevel::Intermediate => "intermediate",
            UserLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for UserLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserLevel {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        UserLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| {
                let all: Vec<&str> = UserLevel::ALL.iter().map(|l| l.as_str()).collect();
                ParseChoiceError::new("user level", s, &all)
            })
    }
}
