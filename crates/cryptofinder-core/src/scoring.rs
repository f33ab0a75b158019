//! 安全分聚合与分级
use serde::{Deserialize, Serialize};

use crate::report::DetectedAlgorithm;

/// `>= GOOD_THRESHOLD` 为 Good
pub const GOOD_THRESHOLD: u8 = 80;
/// `>= CAUTION_THRESHOLD` 且低于 Good 为 Caution
pub const CAUTION_THRESHOLD: u8 = 50;

/// 展示层使用的三档分级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyLevel {
    Good,
    Caution,
    Danger,
}

impl std::fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SafetyLevel::Good => "Good",
            SafetyLevel::Caution => "Caution",
            SafetyLevel::Danger => "Danger",
        })
    }
}

/// 安全百分比：各算法分值的算术平均，四舍五入（.5 进位）
///
/// 空切片返回 0；经由 `scan` 得到的结果总是非空（兜底集合）。
pub fn score(detected: &[DetectedAlgorithm]) -> u8 {
    if detected.is_empty() {
        return 0;
    }
    let count = detected.len() as u64;
    let sum: u64 = detected.iter().map(|d| u64::from(d.score.min(100))).sum();
    // round(sum / (100 * count) * 100) == round(sum / count)
    let pct = (2 * sum + count) / (2 * count);
    pct.min(100) as u8
}

pub fn classify_safety(percentage: u8) -> SafetyLevel {
    if percentage >= GOOD_THRESHOLD {
        SafetyLevel::Good
    } else if percentage >= CAUTION_THRESHOLD {
        SafetyLevel::Caution
    } else {
        SafetyLevel::Danger
    }
}
