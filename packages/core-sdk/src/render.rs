use std::fmt::{self, Write};

use crate::models::Solution;

const NOT_SPECIFIED: &str = "Not specified";
const NO_HINTS: &str = "No hints available.";

/**
 * \brief 将解答渲染为终端可读文本，缺失字段使用默认文案。
 */
pub fn render_solution(solution: &Solution) -> String {
    let mut out = String::new();
    // 写入 String 不会失败
    let _ = write_solution(&mut out, solution);
    out
}

/**
 * \brief 将解答写入任意 `fmt::Write` 目标。
 */
pub fn write_solution(out: &mut impl Write, solution: &Solution) -> fmt::Result {
    writeln!(out, "== Explanation ==")?;
    writeln!(out, "{}", or_default(&solution.explanation, NOT_SPECIFIED))?;
    writeln!(out)?;

    writeln!(out, "== Code ==")?;
    writeln!(out, "{}", or_default(&solution.code, NOT_SPECIFIED))?;
    writeln!(out)?;

    writeln!(
        out,
        "Time Complexity:  {}",
        or_default(&solution.time_complexity, NOT_SPECIFIED)
    )?;
    writeln!(
        out,
        "Space Complexity: {}",
        or_default(&solution.space_complexity, NOT_SPECIFIED)
    )?;
    writeln!(out)?;

    writeln!(out, "== Hints ==")?;
    if solution.hints.is_empty() {
        writeln!(out, "{}", NO_HINTS)?;
    } else {
        for (idx, hint) in solution.hints.iter().enumerate() {
            writeln!(out, "{}. {}", idx + 1, hint)?;
        }
    }
    Ok(())
}

/**
 * \brief 掩码显示密钥：长度大于 8 时保留首尾各 4 位。
 */
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
