//! 分析选项与统计信息
use std::path::PathBuf;

/// 批量分析选项
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 规则文件路径（TOML）；为空则使用内置签名表
    pub rules_path: Option<PathBuf>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
    /// 输入为目录时的遍历深度
    pub max_depth: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            max_file_size: None,
            rules_path: None,
            threads: None,
            max_depth: 1,
        }
    }
}

/// 批量统计（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub baseline_reports: usize,
}
