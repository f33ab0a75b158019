use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cryptofinder_core::batch::{analyze_files, collect_files};
use cryptofinder_core::history::{record, ChatStore, JsonFileStore, ReportStore};
use cryptofinder_core::render::{export_file_name, render_document, render_json, render_line};
use cryptofinder_core::{load_catalog, AnalyzeOptions, PatternSpec, Transcript};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "cryptofinder", version, about = "Firmware cryptographic algorithm finder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 分析固件文件（或目录）并输出报告
    Scan {
        /// 输入文件或目录，可重复
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// 输出文件；缺省写到标准输出
        #[arg(long)]
        output: Option<PathBuf>,

        /// 输出格式
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// 历史目录；给定时保存当前报告并追加历史
        #[arg(long)]
        history_dir: Option<PathBuf>,

        /// 线程数（"auto"=CPU 核心数）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 最大扫描文件大小（单位字节）
        #[arg(long)]
        max_file_size: Option<u64>,

        /// 目录遍历深度
        #[arg(long, default_value_t = 1)]
        max_depth: usize,

        /// 签名规则文件（TOML）；缺省使用内置签名表
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// 打印签名目录
    Catalog {
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// 列出历史报告（最新在前）
    History {
        #[arg(long)]
        history_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// 导出当前（或指定 id 的）报告文档
    Export {
        #[arg(long)]
        history_dir: PathBuf,

        /// 历史记录 id；缺省导出当前报告
        #[arg(long)]
        id: Option<uuid::Uuid>,

        /// 输出路径；缺省为 CryptoFinder_Report_<name>.md
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// 向助手提问
    Ask {
        #[arg(required = true)]
        question: Vec<String>,

        /// 会话目录；给定时延续并保存之前的对话
        #[arg(long)]
        history_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { input, output, format, history_dir, threads, max_file_size, max_depth, rules } => {
            let opts = AnalyzeOptions { max_file_size, rules_path: rules, threads: parse_threads(&threads), max_depth };
            run_scan(&input, output, format, history_dir, &opts)?;
        }
        Commands::Catalog { rules } => {
            let catalog = load_catalog(rules.as_deref()).context("load signature catalog")?;
            let mut out = io::stdout().lock();
            for e in catalog.entries() {
                let pattern = match e.pattern() {
                    PatternSpec::Tokens(t) => format!("tokens: {}", t.join(", ")),
                    PatternSpec::Regex(r) => format!("regex: {r}"),
                };
                writeln!(out, "{}\t{}\t{}\t{}\t{}", e.name(), e.strength(), e.risk(), e.score(), pattern)?;
            }
        }
        Commands::History { history_dir, format } => {
            let store = JsonFileStore::open(&history_dir).context("open history directory")?;
            let history = store.load_history().context("load history")?;
            let mut out = io::stdout().lock();
            match format {
                Format::Json => {
                    serde_json::to_writer_pretty(&mut out, &history)?;
                    writeln!(out)?;
                }
                Format::Text => {
                    for rec in history.records() {
                        writeln!(out, "{}\t{}\t{}", rec.id, rec.stored_at.to_rfc3339(), render_line(&rec.report))?;
                    }
                }
            }
        }
        Commands::Export { history_dir, id, output } => {
            let store = JsonFileStore::open(&history_dir).context("open history directory")?;
            let report = match id {
                Some(id) => match store.load_history()?.find(id) {
                    Some(rec) => rec.report.clone(),
                    None => bail!("no report with id {id} in history"),
                },
                None => match store.load_current()? {
                    Some(r) => r,
                    None => bail!("no current report in {}", history_dir.display()),
                },
            };
            let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(&report)));
            std::fs::write(&path, render_document(&report)).context("write report document")?;
            info!(path = %path.display(), "report exported");
        }
        Commands::Ask { question, history_dir } => run_ask(&question.join(" "), history_dir)?,
    }

    Ok(())
}

fn run_scan(
    input: &[PathBuf],
    output: Option<PathBuf>,
    format: Format,
    history_dir: Option<PathBuf>,
    opts: &AnalyzeOptions,
) -> Result<()> {
    info!(?input, ?output, "starting scan");

    // 目录构建失败属于启动期致命错误，直接退出
    let catalog = Arc::new(load_catalog(opts.rules_path.as_deref()).context("load signature catalog")?);
    let store = match &history_dir {
        Some(dir) => Some(JsonFileStore::open(dir).context("open history directory")?),
        None => None,
    };

    // 先确认有输入，失败的运行不应截断已有的输出文件
    let files = collect_files(input, opts.max_depth);
    if files.is_empty() {
        bail!("no input files found");
    }

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path).context("create output file")?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    // JSON 输出为数组，按输入顺序流式写入
    if format == Format::Json {
        write!(out, "[")?;
    }
    let mut first = true;
    let stats = analyze_files(&files, opts, &catalog, &mut |_path, report| {
        match format {
            Format::Json => {
                if !first {
                    write!(out, ",")?;
                }
                write!(out, "{}", render_json(&report)?)?;
            }
            Format::Text => writeln!(out, "{}", render_line(&report))?,
        }
        first = false;
        if let Some(store) = &store {
            // 持久化失败可恢复：提示后继续
            if let Err(err) = record(store, report) {
                warn!(error = %err, "failed to store report in history");
            }
        }
        Ok(())
    })
    .context("scan failed")?;
    if format == Format::Json {
        writeln!(out, "]")?;
    }
    out.flush().ok();

    info!(
        files_scanned = stats.files_scanned,
        files_skipped = stats.files_skipped,
        baseline_reports = stats.baseline_reports,
        "scan finished"
    );
    Ok(())
}

fn run_ask(question: &str, history_dir: Option<PathBuf>) -> Result<()> {
    let store = match &history_dir {
        Some(dir) => Some(JsonFileStore::open(dir).context("open history directory")?),
        None => None,
    };
    // 会话读写失败可恢复：从新会话开始或只丢失本轮记录
    let mut chat = match &store {
        Some(store) => store.load_transcript().unwrap_or_else(|err| {
            warn!(error = %err, "failed to load chat history, starting a new session");
            Transcript::new()
        }),
        None => Transcript::new(),
    };

    let answer = chat.ask(question);
    writeln!(io::stdout().lock(), "{answer}")?;

    if let Some(store) = &store {
        if let Err(err) = store.save_transcript(&chat) {
            warn!(error = %err, "failed to save chat history");
        }
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，stdout 留给报告输出
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") {
        return None;
    }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
