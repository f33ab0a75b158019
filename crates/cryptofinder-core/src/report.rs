//! 分析报告（调用方拥有，可序列化）
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Risk, Strength};
use crate::engine::{scan_outcome, ScanOutcome};
use crate::scoring::{classify_safety, score, SafetyLevel};

/// 单个检出算法（从命中的签名条目复制而来）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedAlgorithm {
    pub name: String,
    pub strength: Strength,
    pub risk: Risk,
    pub score: u8,
}

/// 扫描输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub source_name: String,
    pub source_size_bytes: u64,
    pub timestamp: DateTime<Utc>,
    pub safety_percentage: u8,
    pub detected: Vec<DetectedAlgorithm>,
    pub summary: String,
    #[serde(default)]
    pub assumed_baseline: bool,
}

impl AnalysisReport {
    pub fn from_outcome(source_name: &str, source_size_bytes: u64, outcome: ScanOutcome, timestamp: DateTime<Utc>) -> Self {
        let safety_percentage = score(&outcome.detected);
        let summary = summarize(outcome.detected.len(), outcome.assumed_baseline);
        Self {
            source_name: source_name.to_string(),
            source_size_bytes,
            timestamp,
            safety_percentage,
            detected: outcome.detected,
            summary,
            assumed_baseline: outcome.assumed_baseline,
        }
    }

    pub fn safety_level(&self) -> SafetyLevel {
        classify_safety(self.safety_percentage)
    }
}

/// 对已读入内存的内容生成报告（时间戳取当前 UTC）
pub fn analyze(source_name: &str, content: &[u8], catalog: &Catalog) -> AnalysisReport {
    analyze_at(source_name, content, catalog, Utc::now())
}

pub fn analyze_at(source_name: &str, content: &[u8], catalog: &Catalog, timestamp: DateTime<Utc>) -> AnalysisReport {
    let outcome = scan_outcome(content, catalog);
    AnalysisReport::from_outcome(source_name, content.len() as u64, outcome, timestamp)
}

fn summarize(count: usize, assumed_baseline: bool) -> String {
    if assumed_baseline {
        return format!(
            "No cryptographic signatures found; assuming a baseline secure configuration of {count} algorithms."
        );
    }
    let plural = if count > 1 { "s" } else { "" };
    format!("Detected {count} cryptographic algorithm{plural} in firmware.")
}
