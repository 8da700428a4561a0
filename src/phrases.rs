use crate::error::Error;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_PHRASE_FILE: &str = "mindfulness.json";
/// The assembler narrates this many phrases.
pub const PHRASES_PER_VIDEO: usize = 3;

/// The document shared between the generator and the assembler. Legacy
/// files written with Spanish keys still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseSet {
    #[serde(alias = "fecha_generacion", deserialize_with = "local_timestamp")]
    pub generation_timestamp: DateTime<Local>,
    #[serde(alias = "tema")]
    pub topic: String,
    #[serde(alias = "total_frases")]
    pub phrase_count: usize,
    #[serde(alias = "frases")]
    pub phrases: Vec<String>,
}

impl PhraseSet {
    pub fn new(topic: impl Into<String>, phrases: Vec<String>) -> Self {
        Self {
            generation_timestamp: Local::now(),
            topic: topic.into(),
            phrase_count: phrases.len(),
            phrases,
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read phrase file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Phrase file is not valid JSON: {}", path.display()))
    }

    /// Replaces the whole document: the JSON goes to a sibling temp file that
    /// is then renamed over `path`, so readers never see a half-written file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create dir {}", dir.display()))?;

        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    /// The phrases a video is built from, or `NotEnoughPhrases`.
    pub fn video_phrases(&self, source: &Path) -> crate::Result<&[String]> {
        if self.phrases.len() < PHRASES_PER_VIDEO {
            return Err(Error::NotEnoughPhrases {
                path: source.to_path_buf(),
                found: self.phrases.len(),
                required: PHRASES_PER_VIDEO,
            });
        }
        Ok(&self.phrases[..PHRASES_PER_VIDEO])
    }
}

/// Accepts RFC 3339 and offset-less ISO timestamps (read as local time).
fn local_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Local>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(serde::de::Error::custom)?;
    naive
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| serde::de::Error::custom(format!("nonexistent local time: {raw}")))
}

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]").expect("static regex"));

/// File-name friendly form of a topic: lowercase, accents folded, spaces to
/// underscores, at most 20 characters.
pub fn topic_slug(topic: &str) -> String {
    let folded: String = topic
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            ' ' => '_',
            other => other,
        })
        .collect();
    NON_SLUG.replace_all(&folded, "").chars().take(20).collect()
}
