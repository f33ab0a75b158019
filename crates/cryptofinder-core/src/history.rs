//! 报告持久化（注入式协作方）
//!
//! - `ReportStore` 只负责读写“当前报告”和“历史列表”两份状态。
//! - `History` 最新在前，容量 10，超出时淘汰最早插入的一条。
//! - `ChatStore` 是同一目录下的助手会话记录，与报告状态互不影响。
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::assistant::{ChatMessage, Transcript};
use crate::error::StoreError;
use crate::report::AnalysisReport;

/// 历史容量
pub const HISTORY_CAPACITY: usize = 10;

/// 持久化记录：报告字段展开 + 唯一 id + 插入时间
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub stored_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

/// 有界历史（最新在前）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<HistoryRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由外部加载的记录构建；多余的旧记录被截断
    pub fn from_records(mut records: Vec<HistoryRecord>) -> Self {
        records.truncate(HISTORY_CAPACITY);
        Self { records }
    }

    /// 插入到最前面，返回被淘汰的最旧记录（如有）
    pub fn push(&mut self, record: HistoryRecord) -> Option<HistoryRecord> {
        self.records.insert(0, record);
        if self.records.len() > HISTORY_CAPACITY {
            self.records.pop()
        } else {
            None
        }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn find(&self, id: Uuid) -> Option<&HistoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 持久化协作方
pub trait ReportStore {
    fn load_current(&self) -> Result<Option<AnalysisReport>, StoreError>;
    fn save_current(&self, report: &AnalysisReport) -> Result<(), StoreError>;
    fn load_history(&self) -> Result<History, StoreError>;
    fn save_history(&self, history: &History) -> Result<(), StoreError>;
}

/// 助手会话的持久化协作方
pub trait ChatStore {
    fn load_transcript(&self) -> Result<Transcript, StoreError>;
    fn save_transcript(&self, transcript: &Transcript) -> Result<(), StoreError>;
}

/// 保存为当前报告并追加到历史，返回新记录
pub fn record(store: &dyn ReportStore, report: AnalysisReport) -> Result<HistoryRecord, StoreError> {
    record_at(store, report, Utc::now())
}

pub fn record_at(
    store: &dyn ReportStore,
    report: AnalysisReport,
    stored_at: DateTime<Utc>,
) -> Result<HistoryRecord, StoreError> {
    store.save_current(&report)?;
    let mut history = store.load_history()?;
    let rec = HistoryRecord { id: Uuid::new_v4(), stored_at, report };
    if let Some(evicted) = history.push(rec.clone()) {
        debug!(id = %evicted.id, source = %evicted.report.source_name, "history full, evicted oldest report");
    }
    store.save_history(&history)?;
    Ok(rec)
}

/// 内存实现（测试与嵌入使用）
#[derive(Debug, Default)]
pub struct MemoryStore {
    current: Mutex<Option<AnalysisReport>>,
    history: Mutex<History>,
    chat: Mutex<Transcript>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryStore {
    fn load_current(&self) -> Result<Option<AnalysisReport>, StoreError> {
        Ok(lock(&self.current).clone())
    }

    fn save_current(&self, report: &AnalysisReport) -> Result<(), StoreError> {
        *lock(&self.current) = Some(report.clone());
        Ok(())
    }

    fn load_history(&self) -> Result<History, StoreError> {
        Ok(lock(&self.history).clone())
    }

    fn save_history(&self, history: &History) -> Result<(), StoreError> {
        *lock(&self.history) = history.clone();
        Ok(())
    }
}

impl ChatStore for MemoryStore {
    fn load_transcript(&self) -> Result<Transcript, StoreError> {
        Ok(lock(&self.chat).clone())
    }

    fn save_transcript(&self, transcript: &Transcript) -> Result<(), StoreError> {
        *lock(&self.chat) = transcript.clone();
        Ok(())
    }
}

// 持有锁的线程 panic 后数据仍然完整（只做整体替换），直接取回
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 目录下的 JSON 文件实现：current.json + history.json + chat.json
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

const CURRENT_FILE: &str = "current.json";
const HISTORY_FILE: &str = "history.json";
const CHAT_FILE: &str = "chat.json";

impl JsonFileStore {
    /// 目录不存在时自动创建
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let txt = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&txt)?))
    }

    // 先写临时文件再重命名，避免中途失败留下半个 JSON
    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        let txt = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, txt)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl ReportStore for JsonFileStore {
    fn load_current(&self) -> Result<Option<AnalysisReport>, StoreError> {
        self.read_json(CURRENT_FILE)
    }

    fn save_current(&self, report: &AnalysisReport) -> Result<(), StoreError> {
        self.write_json(CURRENT_FILE, report)
    }

    fn load_history(&self) -> Result<History, StoreError> {
        let records: Option<Vec<HistoryRecord>> = self.read_json(HISTORY_FILE)?;
        Ok(History::from_records(records.unwrap_or_default()))
    }

    fn save_history(&self, history: &History) -> Result<(), StoreError> {
        self.write_json(HISTORY_FILE, history)
    }
}

impl ChatStore for JsonFileStore {
    fn load_transcript(&self) -> Result<Transcript, StoreError> {
        let messages: Option<Vec<ChatMessage>> = self.read_json(CHAT_FILE)?;
        Ok(Transcript::from_messages(messages.unwrap_or_default()))
    }

    fn save_transcript(&self, transcript: &Transcript) -> Result<(), StoreError> {
        self.write_json(CHAT_FILE, transcript)
    }
}
