//! 报告导出：Markdown 文档 / JSON
use std::fmt::Write as _;

use crate::report::AnalysisReport;

pub const REPORT_TITLE: &str = "CryptoFinder Security Report";

/// 以 KB 表示的大小，保留两位小数
pub fn format_size_kb(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

/// 导出文件名
pub fn export_file_name(report: &AnalysisReport) -> String {
    format!("CryptoFinder_Report_{}.md", report.source_name)
}

/// 渲染文档：标题、文件信息、安全分、算法表
pub fn render_document(report: &AnalysisReport) -> String {
    let mut out = String::new();
    // 写入 String 不会失败
    let _ = writeln!(out, "# {REPORT_TITLE}");
    let _ = writeln!(out);
    let _ = writeln!(out, "- File: {}", report.source_name);
    let _ = writeln!(out, "- Size: {}", format_size_kb(report.source_size_bytes));
    let _ = writeln!(out, "- Date: {}", report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out);
    let _ = writeln!(out, "## Safety Score: {}% ({})", report.safety_percentage, report.safety_level());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", report.summary);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Detected Algorithms");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Algorithm | Strength | Risk |");
    let _ = writeln!(out, "| --- | --- | --- |");
    for algo in &report.detected {
        let _ = writeln!(out, "| {} | {} | {} |", algo.name, algo.strength, algo.risk);
    }
    out
}

/// 单行摘要（CLI 文本输出使用）
pub fn render_line(report: &AnalysisReport) -> String {
    let names: Vec<&str> = report.detected.iter().map(|d| d.name.as_str()).collect();
    let baseline = if report.assumed_baseline { " [baseline]" } else { "" };
    format!(
        "{}\t{}%\t{}\t{}{}",
        report.source_name,
        report.safety_percentage,
        report.safety_level(),
        names.join(","),
        baseline
    )
}

pub fn render_json(report: &AnalysisReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
