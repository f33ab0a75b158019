//! 固件密码算法识别与安全评分库
//!
//! 设计要点：
//! - 签名目录启动期一次性构建，只读，可被多个线程同时扫描。
//! - 先用 Aho-Corasick 锚点预筛，再对候选条目运行 `regex::bytes`，直接处理二进制内容。
//! - 按规范名去重，输出保持目录顺序；无命中时以固定基线集合兜底。
//! - 安全分为各算法分值的算术平均。
//! - 持久化、导出、助手问答是外围协作方，不进入检测路径。

mod prefilter;

pub mod assistant;
pub mod batch;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod history;
pub mod options;
pub mod render;
pub mod report;
pub mod rules;
pub mod scoring;

pub use catalog::{builtin_specs, Catalog, PatternSpec, Risk, SignatureEntry, SignatureSpec, Strength};
pub use engine::{fallback_set, find_matches, scan, scan_outcome, ScanOutcome};
pub use error::{CatalogError, StoreError};
pub use assistant::{ChatMessage, ChatRole, Transcript};
pub use history::{ChatStore, History, HistoryRecord, JsonFileStore, MemoryStore, ReportStore, HISTORY_CAPACITY};
pub use options::{AnalyzeOptions, BatchStats};
pub use report::{analyze, analyze_at, AnalysisReport, DetectedAlgorithm};
pub use rules::load_catalog;
pub use scoring::{classify_safety, score, SafetyLevel};
