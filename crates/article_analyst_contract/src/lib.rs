use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

pub const CONTRACT_ID: &str = "article_analyst.analysis_data";
pub const CONTRACT_VERSION: &str = "1";

/// Prefix every resolved article identifier carries.
pub const ARTICLE_ID_PREFIX: &str = "article_";
/// Identifier used when the page does not name a valid article.
pub const DEFAULT_ARTICLE_ID: &str = "article_1";

#[derive(Debug)]
pub enum ContractError {
    Json(serde_json::Error),
    NotAnObject,
    Record {
        article_id: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractError::Json(err) => write!(f, "analysis data is not valid JSON: {}", err),
            ContractError::NotAnObject => {
                write!(f, "analysis data must be an object keyed by article id")
            }
            ContractError::Record { article_id, source } => {
                write!(f, "analysis record {} is malformed: {}", article_id, source)
            }
        }
    }
}

impl std::error::Error for ContractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContractError::Json(err) => Some(err),
            ContractError::Record { source, .. } => Some(source),
            ContractError::NotAnObject => None,
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(value: serde_json::Error) -> Self {
        ContractError::Json(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRecord {
    pub metadata: Metadata,
    pub argumentation: Argumentation,
    pub language: Language,
    pub quotes: Vec<Quote>,
    pub context: Context,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub text_type: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Argumentation {
    pub thesis: Option<String>,
    pub conclusion: Option<String>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Argument {
    pub text: String,
    pub strength: Strength,
    pub issue: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strength {
    Strong,
    Medium,
    Weak,
    #[default]
    Unknown,
}

impl Strength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Strong => "strong",
            Strength::Medium => "medium",
            Strength::Weak => "weak",
            Strength::Unknown => "unknown",
        }
    }

    // The payloads are authored in German and English; both spellings are accepted.
    pub fn from_str(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "strong" | "stark" | "high" | "hoch" => Strength::Strong,
            "medium" | "mittel" | "moderate" => Strength::Medium,
            "weak" | "schwach" | "low" | "niedrig" => Strength::Weak,
            _ => Strength::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Strength {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Strength::from_str).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    pub rhetoric: Vec<RhetoricItem>,
    pub patterns: Vec<PatternItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RhetoricItem {
    #[serde(rename = "type")]
    pub label: String,
    pub text: Option<String>,
    pub text2: Option<String>,
    pub description: Option<String>,
    pub effect: Option<String>,
    pub glossary: Option<String>,
}

impl RhetoricItem {
    /// Example texts in highlight order; empty strings are not examples.
    pub fn highlight_texts(&self) -> Vec<&str> {
        [self.text.as_deref(), self.text2.as_deref()]
            .into_iter()
            .flatten()
            .filter(|text| !text.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternItem {
    #[serde(rename = "name")]
    pub label: String,
    #[serde(deserialize_with = "string_list")]
    pub examples: Vec<String>,
    pub description: Option<String>,
    pub effect: Option<String>,
    pub glossary: Option<String>,
}

impl PatternItem {
    pub fn highlight_texts(&self) -> Vec<&str> {
        self.examples
            .iter()
            .map(String::as_str)
            .filter(|text| !text.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quote {
    pub text: String,
    pub source: Option<String>,
    pub effect: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Context {
    pub author: Option<AuthorInfo>,
    pub medium: Option<MediumInfo>,
    pub related_articles: Vec<RelatedArticle>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorInfo {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediumInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub bias: Vec<BiasMetric>,
    pub reasoning: Option<String>,
}

/// One bias axis of a medium, `value` on a 0-100 scale.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BiasMetric {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelatedArticle {
    pub title: String,
    pub source: Option<String>,
    pub url: Option<String>,
}

// Only a JSON array yields examples; anything else is treated as "no examples".
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text),
            _ => None,
        })
        .collect())
}

/// The full analysis payload: article id -> record, plus a fingerprint of the raw bytes.
#[derive(Debug, Clone, Default)]
pub struct AnalysisDataset {
    records: BTreeMap<String, AnalysisRecord>,
    fingerprint_sha256: String,
}

impl AnalysisDataset {
    pub fn from_json_str(raw: &str) -> Result<Self, ContractError> {
        Self::from_json_slice(raw.as_bytes())
    }

    pub fn from_json_slice(raw: &[u8]) -> Result<Self, ContractError> {
        let value: Value = serde_json::from_slice(raw)?;
        let Value::Object(entries) = value else {
            return Err(ContractError::NotAnObject);
        };
        let mut records = BTreeMap::new();
        for (article_id, entry) in entries {
            let record = serde_json::from_value::<AnalysisRecord>(entry).map_err(|source| {
                ContractError::Record {
                    article_id: article_id.clone(),
                    source,
                }
            })?;
            records.insert(article_id, record);
        }
        Ok(Self {
            records,
            fingerprint_sha256: payload_fingerprint_sha256(raw),
        })
    }

    pub fn get(&self, article_id: &str) -> Option<&AnalysisRecord> {
        self.records.get(article_id)
    }

    pub fn article_ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fingerprint_sha256(&self) -> &str {
        &self.fingerprint_sha256
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_digest(hasher)
}

fn hex_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Fingerprint binding the payload hash to this contract id and version.
pub fn payload_fingerprint_sha256(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(CONTRACT_ID.as_bytes());
    hasher.update(b"\n");
    hasher.update(CONTRACT_VERSION.as_bytes());
    hasher.update(b"\n");
    hasher.update(hex_sha256(raw).as_bytes());
    hex_digest(hasher)
}
