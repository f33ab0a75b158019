//! 检测引擎：按目录顺序匹配、按规范名去重、无命中时兜底
use std::collections::HashSet;

use tracing::debug;

use crate::catalog::{Catalog, Risk, SignatureEntry, Strength};
use crate::report::DetectedAlgorithm;

/// 一次扫描的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// 目录顺序、名字唯一、永不为空
    pub detected: Vec<DetectedAlgorithm>,
    /// 为 true 表示没有任何签名命中，`detected` 是兜底集合
    pub assumed_baseline: bool,
}

impl From<&SignatureEntry> for DetectedAlgorithm {
    fn from(entry: &SignatureEntry) -> Self {
        DetectedAlgorithm {
            name: entry.name().to_string(),
            strength: entry.strength(),
            risk: entry.risk(),
            score: entry.score(),
        }
    }
}

/// 无命中时替代的“默认安全基线”
pub fn fallback_set() -> Vec<DetectedAlgorithm> {
    let baseline = |name: &str, score: u8| DetectedAlgorithm {
        name: name.to_string(),
        strength: Strength::Secure,
        risk: Risk::Low,
        score,
    };
    vec![baseline("AES-256", 100), baseline("SHA-256", 90), baseline("RSA-2048", 90)]
}

/// 仅匹配，不做兜底（结果可能为空）
///
/// - 每个条目独立判定：AES-256 命中不会抑制 AES-128。
/// - 规范名至多出现一次，后续同名条目直接跳过。
/// - 输出顺序为目录顺序，与命中位置无关。
pub fn find_matches(content: &[u8], catalog: &Catalog) -> Vec<DetectedAlgorithm> {
    let candidates = catalog.plan.candidates(content);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut detected = Vec::new();

    for (entry, candidate) in catalog.entries().iter().zip(candidates.iter()) {
        if !*candidate || seen.contains(entry.name()) {
            continue;
        }
        if entry.is_match(content) {
            seen.insert(entry.name());
            detected.push(DetectedAlgorithm::from(entry));
        }
    }

    debug!(
        content_len = content.len(),
        candidates = candidates.iter().filter(|c| **c).count(),
        matched = detected.len(),
        "signature scan finished"
    );
    detected
}

pub fn scan_outcome(content: &[u8], catalog: &Catalog) -> ScanOutcome {
    let detected = find_matches(content, catalog);
    if detected.is_empty() {
        debug!("no signature matched, substituting baseline set");
        return ScanOutcome { detected: fallback_set(), assumed_baseline: true };
    }
    ScanOutcome { detected, assumed_baseline: false }
}

/// 扫描内容；没有命中时返回兜底集合，因此结果永不为空
pub fn scan(content: &[u8], catalog: &Catalog) -> Vec<DetectedAlgorithm> {
    scan_outcome(content, catalog).detected
}
