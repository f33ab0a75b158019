//! 规则文件加载（TOML）
use serde::Deserialize;
use std::path::Path;

use crate::catalog::{builtin_specs, Catalog, PatternSpec, Risk, SignatureSpec, Strength};
use crate::error::CatalogError;

/// 单条签名的配置（支持 tokens、regex 或 pattern 字段）
#[derive(Debug, Clone, Deserialize)]
struct RuleEntry {
    pub name: String,
    #[serde(default)]
    pub tokens: Option<Vec<String>>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub anchors: Vec<String>,
    #[serde(default)]
    pub not_after: Vec<String>,
    #[serde(default)]
    pub not_before: Vec<String>,
    pub strength: Strength,
    pub risk: Risk,
    pub score: i64,
}

/// 顶层规则文件结构
#[derive(Debug, Clone, Deserialize)]
struct RuleFile {
    /// 为 true 时先放入内置表，再追加文件中的条目
    #[serde(default)]
    pub include_builtin: bool,
    #[serde(default, rename = "signature")]
    pub signatures: Vec<RuleEntry>,
}

/// 解析规则文本并归一化为 SignatureSpec 列表
pub fn parse_rule_specs(txt: &str, path: &Path) -> Result<Vec<SignatureSpec>, CatalogError> {
    let parsed: RuleFile =
        toml::from_str(txt).map_err(|source| CatalogError::Parse { path: path.to_path_buf(), source })?;

    let mut out = if parsed.include_builtin { builtin_specs() } else { Vec::new() };
    for e in parsed.signatures {
        // tokens 优先；regex 与 pattern 为同义字段
        let pattern = match (e.tokens, e.regex.or(e.pattern)) {
            (Some(tokens), _) => PatternSpec::Tokens(tokens),
            (None, Some(rx)) => PatternSpec::Regex(rx),
            (None, None) => return Err(CatalogError::MissingPattern { name: e.name }),
        };
        out.push(SignatureSpec {
            name: e.name,
            pattern,
            anchors: e.anchors,
            strength: e.strength,
            risk: e.risk,
            score: e.score,
            not_after: e.not_after,
            not_before: e.not_before,
        });
    }
    Ok(out)
}

/// 从 TOML 规则文件加载规格
pub fn load_rule_specs(path: &Path) -> Result<Vec<SignatureSpec>, CatalogError> {
    let txt = std::fs::read_to_string(path)
        .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
    parse_rule_specs(&txt, path)
}

/// 有规则文件时由文件构建目录，否则使用内置表
pub fn load_catalog(rules_path: Option<&Path>) -> Result<Catalog, CatalogError> {
    match rules_path {
        Some(path) => Catalog::from_specs(load_rule_specs(path)?),
        None => Catalog::builtin(),
    }
}
