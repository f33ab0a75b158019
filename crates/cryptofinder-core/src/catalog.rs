//! 签名目录（有序、只读、启动期一次性构建）
//!
//! 要点：
//! - 条目按目录顺序求值；同一家族的具体形式（AES-256）排在泛化形式（AES）之前。
//! - 同名条目视为别名，判定（强度/风险/分值）必须完全一致，去重交给引擎按名字完成。
//! - 任一模式编译失败即整体失败，不存在“部分可用”的目录。
use std::collections::HashMap;
use std::fmt;

use regex::bytes::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::prefilter::{build_prefilter_plan, PrefilterPlan};

/// 算法强度标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strength {
    Secure,
    Moderate,
    Weak,
    Obsolete,
    Broken,
}

/// 风险标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Risk {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strength::Secure => "Secure",
            Strength::Moderate => "Moderate",
            Strength::Weak => "Weak",
            Strength::Obsolete => "Obsolete",
            Strength::Broken => "Broken",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Risk::Low => "Low",
            Risk::Medium => "Medium",
            Risk::High => "High",
            Risk::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// 模式的两种写法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSpec {
    /// 字面量词：前一字节不能是 `[0-9A-Za-z_]`；后一字节不能是 `[0-9A-Za-z_]`，
    /// 也不能是紧跟数字的 `-`（位宽后缀归具体形式处理）
    Tokens(Vec<String>),
    /// 原始正则（bytes 引擎，大小写不敏感，关闭 Unicode）
    Regex(String),
}

/// 未编译的签名规格（内置表与规则文件共用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSpec {
    pub name: String,
    pub pattern: PatternSpec,
    /// 预筛锚点；Tokens 形式忽略此字段，直接以词本身为锚点
    pub anchors: Vec<String>,
    pub strength: Strength,
    pub risk: Risk,
    /// 允许越界输入以便给出明确的配置错误
    pub score: i64,
    /// 紧邻命中之前出现这些字面量时不算命中（大小写不敏感）
    pub not_after: Vec<String>,
    /// 紧邻命中之后出现这些字面量时不算命中（大小写不敏感）
    pub not_before: Vec<String>,
}

impl SignatureSpec {
    pub fn regex(name: &str, regex: &str, anchors: &[&str], strength: Strength, risk: Risk, score: i64) -> Self {
        Self {
            name: name.to_string(),
            pattern: PatternSpec::Regex(regex.to_string()),
            anchors: anchors.iter().map(|a| a.to_string()).collect(),
            strength,
            risk,
            score,
            not_after: Vec::new(),
            not_before: Vec::new(),
        }
    }

    pub fn tokens(name: &str, tokens: &[&str], strength: Strength, risk: Risk, score: i64) -> Self {
        Self {
            name: name.to_string(),
            pattern: PatternSpec::Tokens(tokens.iter().map(|t| t.to_string()).collect()),
            anchors: Vec::new(),
            strength,
            risk,
            score,
            not_after: Vec::new(),
            not_before: Vec::new(),
        }
    }

    pub fn not_after(mut self, prefixes: &[&str]) -> Self {
        self.not_after = prefixes.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn not_before(mut self, suffixes: &[&str]) -> Self {
        self.not_before = suffixes.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// 编译后的签名条目
#[derive(Debug, Clone)]
pub struct SignatureEntry {
    name: String,
    pattern: PatternSpec,
    anchors: Vec<String>,
    strength: Strength,
    risk: Risk,
    score: u8,
    matcher: Regex,
    bounded: bool,
    not_after: Vec<Vec<u8>>,
    not_before: Vec<Vec<u8>>,
}

impl SignatureEntry {
    pub fn name(&self) -> &str { &self.name }
    pub fn pattern(&self) -> &PatternSpec { &self.pattern }
    pub fn anchors(&self) -> &[String] { &self.anchors }
    pub fn strength(&self) -> Strength { self.strength }
    pub fn risk(&self) -> Risk { self.risk }
    pub fn score(&self) -> u8 { self.score }

    /// 内容中任意位置出现即命中
    pub fn is_match(&self, content: &[u8]) -> bool {
        if !self.bounded && self.not_after.is_empty() && self.not_before.is_empty() {
            return self.matcher.is_match(content);
        }
        // 被边界或排除词否决的候选只前进一个字节，重叠位置上的下一个候选仍会被检查
        let mut at = 0;
        while let Some(m) = self.matcher.find_at(content, at) {
            let (start, end) = (m.start(), m.end());
            if (!self.bounded || token_boundary_ok(content, start, end))
                && !self.not_after.iter().any(|p| ends_with_ignore_case(&content[..start], p))
                && !self.not_before.iter().any(|p| starts_with_ignore_case(&content[end..], p))
            {
                return true;
            }
            if start >= content.len() {
                break;
            }
            at = start + 1;
        }
        false
    }

    /// 实际编译进匹配器的正则文本（Tokens 形式为词的并集，边界在匹配后检查）
    pub fn matcher_source(&self) -> &str {
        self.matcher.as_str()
    }
}

/// 签名目录
pub struct Catalog {
    entries: Vec<SignatureEntry>,
    pub(crate) plan: PrefilterPlan,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog").field("entries", &self.entries.len()).finish()
    }
}

impl Catalog {
    /// 使用内置签名表构建目录
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_specs(builtin_specs())
    }

    /// 从规格列表构建目录；任何一条失败都返回错误
    pub fn from_specs(specs: Vec<SignatureSpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut verdicts: HashMap<String, (Strength, Risk, u8)> = HashMap::new();
        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            let entry = compile_entry(spec)?;
            let verdict = (entry.strength, entry.risk, entry.score);
            match verdicts.get(&entry.name) {
                Some(existing) if *existing != verdict => {
                    return Err(CatalogError::ConflictingVerdict { name: entry.name });
                }
                Some(_) => {}
                None => {
                    verdicts.insert(entry.name.clone(), verdict);
                }
            }
            entries.push(entry);
        }

        let plan = build_prefilter_plan(&entries);
        Ok(Self { entries, plan })
    }

    /// 有序条目（只读，多次调用结果一致）
    pub fn entries(&self) -> &[SignatureEntry] {
        &self.entries
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Tokens 形式的边界：`HMAC-MD5`、`AES-GCM` 算命中，`aes-256`、`3des`、`md5_init` 不算
fn token_boundary_ok(content: &[u8], start: usize, end: usize) -> bool {
    if start > 0 && is_word_byte(content[start - 1]) {
        return false;
    }
    match (content.get(end), content.get(end + 1)) {
        (None, _) => true,
        (Some(&b), _) if is_word_byte(b) => false,
        (Some(b'-'), Some(d)) if d.is_ascii_digit() => false,
        _ => true,
    }
}

fn ends_with_ignore_case(hay: &[u8], needle: &[u8]) -> bool {
    hay.len() >= needle.len() && hay[hay.len() - needle.len()..].eq_ignore_ascii_case(needle)
}

fn starts_with_ignore_case(hay: &[u8], needle: &[u8]) -> bool {
    hay.len() >= needle.len() && hay[..needle.len()].eq_ignore_ascii_case(needle)
}

fn compile_entry(spec: SignatureSpec) -> Result<SignatureEntry, CatalogError> {
    let name = spec.name.trim().to_string();
    if name.is_empty() {
        return Err(CatalogError::EmptyName);
    }
    let score = match u8::try_from(spec.score) {
        Ok(s) if s <= 100 => s,
        _ => return Err(CatalogError::ScoreOutOfRange { name, score: spec.score }),
    };

    let (source, anchors) = match &spec.pattern {
        PatternSpec::Tokens(tokens) => {
            if tokens.is_empty() {
                return Err(CatalogError::MissingPattern { name });
            }
            if tokens.iter().any(|t| t.is_empty()) {
                return Err(CatalogError::EmptyToken { name });
            }
            let alternation = tokens.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
            (format!("(?:{alternation})"), tokens.clone())
        }
        PatternSpec::Regex(rx) => {
            if rx.is_empty() {
                return Err(CatalogError::MissingPattern { name });
            }
            if spec.anchors.iter().any(|a| a.is_empty()) {
                return Err(CatalogError::EmptyToken { name });
            }
            (rx.clone(), spec.anchors.clone())
        }
    };

    if spec.not_after.iter().chain(&spec.not_before).any(|g| g.is_empty()) {
        return Err(CatalogError::EmptyToken { name });
    }
    let bounded = matches!(spec.pattern, PatternSpec::Tokens(_));

    let matcher = RegexBuilder::new(&source)
        .case_insensitive(true)
        .unicode(false)
        .build()
        .map_err(|source| CatalogError::InvalidPattern { name: name.clone(), source })?;

    Ok(SignatureEntry {
        name,
        pattern: spec.pattern,
        anchors,
        strength: spec.strength,
        risk: spec.risk,
        score,
        matcher,
        bounded,
        not_after: spec.not_after.into_iter().map(String::into_bytes).collect(),
        not_before: spec.not_before.into_iter().map(String::into_bytes).collect(),
    })
}

/// 内置签名表（顺序即报告顺序）
pub fn builtin_specs() -> Vec<SignatureSpec> {
    use Risk::*;
    use Strength::*;

    vec![
        // AES
        SignatureSpec::regex("AES-256", r"aes[-_]?256", &["aes"], Secure, Low, 100),
        SignatureSpec::regex("AES-192", r"aes[-_]?192", &["aes"], Secure, Low, 95),
        SignatureSpec::regex("AES-128", r"aes[-_]?128", &["aes"], Secure, Low, 90),
        SignatureSpec::tokens("AES", &["aes", "advanced encryption standard"], Secure, Low, 85),
        // RSA
        SignatureSpec::regex("RSA-4096", r"rsa[-_]?4096", &["rsa"], Secure, Low, 100),
        SignatureSpec::regex("RSA-2048", r"rsa[-_]?2048", &["rsa"], Secure, Low, 90),
        SignatureSpec::regex("RSA-1024", r"rsa[-_]?1024", &["rsa"], Weak, High, 40),
        SignatureSpec::tokens("RSA", &["rsa"], Moderate, Medium, 70),
        // SHA
        SignatureSpec::regex("SHA-512", r"sha[-_]?512", &["sha"], Secure, Low, 100),
        SignatureSpec::regex("SHA-384", r"sha[-_]?384", &["sha"], Secure, Low, 95),
        SignatureSpec::regex("SHA-256", r"sha[-_]?256", &["sha"], Secure, Low, 90),
        SignatureSpec::regex("SHA-256", r"sha[-_]?2(?:[^0-9]|$)", &["sha"], Secure, Low, 90),
        SignatureSpec::regex("SHA-1", r"sha[-_]?1(?:[^0-9]|$)", &["sha"], Weak, High, 30),
        // MD
        SignatureSpec::tokens("MD5", &["md5"], Broken, Critical, 10),
        SignatureSpec::tokens("MD4", &["md4"], Broken, Critical, 5),
        // 分组密码
        SignatureSpec::regex("3DES", r"3des|triple[-_]?des|des[-_]ede", &["3des", "triple", "ede"], Moderate, Medium, 50),
        SignatureSpec::tokens("DES", &["des"], Obsolete, Critical, 15)
            .not_after(&["triple-"])
            .not_before(&["-ede"]),
        SignatureSpec::regex("Blowfish", r"blowfish", &["blowfish"], Moderate, Medium, 60),
        // ECC
        SignatureSpec::regex("ECC-521", r"ecc[-_]?521|p[-_]?521", &["ecc", "521"], Secure, Low, 100),
        SignatureSpec::regex("ECC-384", r"ecc[-_]?384|p[-_]?384", &["ecc", "384"], Secure, Low, 95),
        SignatureSpec::regex("ECC-256", r"ecc[-_]?256|p[-_]?256", &["ecc", "256"], Secure, Low, 90),
        SignatureSpec::tokens("ECC", &["ecc", "elliptic curve"], Secure, Low, 85),
    ]
}
