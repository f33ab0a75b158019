//! 预筛锚点计划（Aho-Corasick）
//!
//! 设计目标：
//! - 把所有条目的锚点字面量合并成一个全局 AC 自动机（ASCII 大小写不敏感）。
//! - 扫描时对内容只走一遍 AC，得到“出现过的锚点”集合，再映射为候选条目。
//! - 只对候选条目运行精准正则；无锚点的条目永远是候选。
use std::collections::HashMap;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use tracing::warn;

use crate::catalog::SignatureEntry;

/// 预筛计划（只读，可跨线程共享）
pub(crate) struct PrefilterPlan {
    /// 全局锚点自动机；构建失败时为 None，此时所有条目都视为候选
    pub(crate) ac: Option<AhoCorasick>,
    /// 锚点索引 -> 条目索引列表
    pub(crate) anchor_to_entries: Vec<Vec<usize>>,
    /// 没有锚点、必须始终求值的条目
    pub(crate) always: Vec<usize>,
    pub(crate) entry_count: usize,
}

/// 从编译后的条目构建预筛计划
pub(crate) fn build_prefilter_plan(entries: &[SignatureEntry]) -> PrefilterPlan {
    // 1) 锚点去重（按小写归一），记录条目 -> 锚点
    let mut anchors: Vec<String> = Vec::new();
    let mut anchor_index: HashMap<String, usize> = HashMap::new();
    let mut anchor_to_entries: Vec<Vec<usize>> = Vec::new();
    let mut always = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        if entry.anchors().is_empty() {
            always.push(idx);
            continue;
        }
        for a in entry.anchors() {
            let key = a.to_ascii_lowercase();
            let id = match anchor_index.get(&key) {
                Some(id) => *id,
                None => {
                    let id = anchors.len();
                    anchors.push(key.clone());
                    anchor_index.insert(key, id);
                    anchor_to_entries.push(Vec::new());
                    id
                }
            };
            if !anchor_to_entries[id].contains(&idx) {
                anchor_to_entries[id].push(idx);
            }
        }
    }

    // 2) 构建 AC；锚点可能互相包含（des / 3des），需要 Standard 语义做重叠查找
    let ac = if anchors.is_empty() {
        None
    } else {
        match AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&anchors)
        {
            Ok(ac) => Some(ac),
            Err(err) => {
                warn!(error = %err, "anchor automaton unavailable, every signature will be evaluated");
                None
            }
        }
    };

    PrefilterPlan { ac, anchor_to_entries, always, entry_count: entries.len() }
}

impl PrefilterPlan {
    /// 返回每个条目是否需要运行正则（下标与目录顺序一致）
    pub(crate) fn candidates(&self, content: &[u8]) -> Vec<bool> {
        let ac = match &self.ac {
            Some(ac) => ac,
            None => return vec![true; self.entry_count],
        };

        let mut out = vec![false; self.entry_count];
        for &idx in &self.always {
            out[idx] = true;
        }

        let mut seen = vec![false; self.anchor_to_entries.len()];
        let mut remaining = seen.len();
        for m in ac.find_overlapping_iter(content) {
            let aid = m.pattern().as_usize();
            if seen[aid] {
                continue;
            }
            seen[aid] = true;
            for &idx in &self.anchor_to_entries[aid] {
                out[idx] = true;
            }
            remaining -= 1;
            // 所有锚点都已出现，不必再走完整个缓冲区
            if remaining == 0 {
                break;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{Catalog, Risk, SignatureSpec, Strength};

    #[test]
    fn only_entries_with_present_anchors_are_candidates() {
        let catalog = Catalog::builtin().unwrap();
        let cands = catalog.plan.candidates(b"firmware uses MD5 checksums");
        let picked: Vec<&str> = catalog
            .entries()
            .iter()
            .zip(cands)
            .filter(|(_, c)| *c)
            .map(|(e, _)| e.name())
            .collect();
        assert_eq!(picked, vec!["MD5"]);
    }

    #[test]
    fn overlapping_anchors_are_all_reported() {
        let catalog = Catalog::builtin().unwrap();
        let cands = catalog.plan.candidates(b"3DES");
        let names: Vec<&str> = catalog
            .entries()
            .iter()
            .zip(cands)
            .filter(|(_, c)| *c)
            .map(|(e, _)| e.name())
            .collect();
        assert!(names.contains(&"3DES"));
        assert!(names.contains(&"DES"));
    }

    #[test]
    fn entries_without_anchors_are_always_candidates() {
        let specs = vec![
            SignatureSpec::regex("Custom", r"x[0-9]{3}y", &[], Strength::Weak, Risk::High, 20),
            SignatureSpec::tokens("MD5", &["md5"], Strength::Broken, Risk::Critical, 10),
        ];
        let catalog = Catalog::from_specs(specs).unwrap();
        assert_eq!(catalog.plan.candidates(b""), vec![true, false]);
    }
}
