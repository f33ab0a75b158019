//! 批量分析与并行调度（宿主层：文件读取在这里，引擎本身不做 I/O）
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::options::{AnalyzeOptions, BatchStats};
use crate::report::{analyze, AnalysisReport};

/// 收集输入文件：文件直接收录，目录按 `max_depth` 遍历
/// 稳定性保证：结果按路径排序，确保输出顺序可复现
pub fn collect_files(inputs: &[PathBuf], max_depth: usize) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).min_depth(1).max_depth(max_depth.max(1)) {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 读取并分析单个文件；超出大小限制返回 Ok(None)
pub fn analyze_file(path: &Path, catalog: &Catalog, max_file_size: Option<u64>) -> Result<Option<AnalysisReport>> {
    if let Some(max) = max_file_size {
        let md = std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
        if md.len() > max {
            return Ok(None);
        }
    }
    let content = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Some(analyze(&display_name(path), &content, catalog)))
}

/// 逐个分析文件并按输入顺序回调 `on_report`
///
/// - 线程数 > 1 且文件数 > 1 时使用 Rayon 线程池并行分析；
/// - 结果在调用线程按下标重排，顺序与串行一致。
pub fn analyze_files(
    files: &[PathBuf],
    opts: &AnalyzeOptions,
    catalog: &Arc<Catalog>,
    on_report: &mut dyn FnMut(&Path, AnalysisReport) -> Result<()>,
) -> Result<BatchStats> {
    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    let mut stats = BatchStats::default();

    if threads > 1 && files.len() > 1 {
        analyze_files_parallel(files, opts, catalog, &mut stats, threads, on_report)?;
    } else {
        for path in files {
            let res = analyze_file(path, catalog, opts.max_file_size);
            deliver(path, res, &mut stats, on_report)?;
        }
    }

    info!(
        files_scanned = stats.files_scanned,
        files_skipped = stats.files_skipped,
        baseline_reports = stats.baseline_reports,
        "batch analysis finished"
    );
    Ok(stats)
}

fn deliver(
    path: &Path,
    res: Result<Option<AnalysisReport>>,
    stats: &mut BatchStats,
    on_report: &mut dyn FnMut(&Path, AnalysisReport) -> Result<()>,
) -> Result<()> {
    match res {
        Ok(Some(report)) => {
            stats.files_scanned += 1;
            if report.assumed_baseline {
                stats.baseline_reports += 1;
            }
            on_report(path, report)
        }
        Ok(None) => {
            stats.files_skipped += 1;
            warn!(path = %path.display(), "file exceeds size limit, skipped");
            Ok(())
        }
        Err(err) => {
            stats.files_skipped += 1;
            warn!(path = %path.display(), error = %err, "file could not be analyzed, skipped");
            Ok(())
        }
    }
}

/// 并行调度：
/// - 后台线程内创建 Rayon 线程池，worker 通过通道回传 (idx, 结果)
/// - 当前线程维护 next_idx 与缓存，按序回调
fn analyze_files_parallel(
    files: &[PathBuf],
    opts: &AnalyzeOptions,
    catalog: &Arc<Catalog>,
    stats: &mut BatchStats,
    threads: usize,
    on_report: &mut dyn FnMut(&Path, AnalysisReport) -> Result<()>,
) -> Result<()> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;
    use std::collections::BTreeMap;

    type Msg = (usize, Result<Option<AnalysisReport>>);
    let (tx, rx) = channel::bounded::<Msg>(256);

    let catalog = Arc::clone(catalog);
    let max_file_size = opts.max_file_size;
    let files_vec: Vec<(usize, PathBuf)> = files.iter().cloned().enumerate().collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("build rayon pool")?;

    let scan_thread = std::thread::spawn(move || {
        pool.install(|| {
            files_vec.par_iter().for_each_with(tx, |tx, (idx, path)| {
                let res = analyze_file(path, &catalog, max_file_size);
                // 接收端提前退出（回调出错）时发送失败，直接丢弃
                let _ = tx.send((*idx, res));
            });
        });
        // 结束后 Sender 全部被丢弃，Receiver 将收到关闭信号
    });

    let mut next_idx: usize = 0;
    let mut buffer: BTreeMap<usize, Result<Option<AnalysisReport>>> = BTreeMap::new();
    let mut outcome: Result<()> = Ok(());

    while let Ok((idx, res)) = rx.recv() {
        buffer.insert(idx, res);
        while let Some(res) = buffer.remove(&next_idx) {
            if let Err(err) = deliver(&files[next_idx], res, stats, on_report) {
                outcome = Err(err);
                break;
            }
            next_idx += 1;
        }
        if outcome.is_err() {
            break;
        }
    }
    drop(rx);

    if scan_thread.join().is_err() {
        anyhow::bail!("analysis worker thread panicked");
    }
    outcome
}
