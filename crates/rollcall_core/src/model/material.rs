//! Classroom materials and their closed kind classification.
//!
//! # Responsibility
//! - Classify a material as file, link or video exactly once, at ingestion.
//! - Offer list helpers that only read the stored kind.
//!
//! # Invariants
//! - `MaterialKind` is a closed set; unknown declared types fall through to
//!   url/file-name heuristics instead of producing a fourth tag.
//! - `Material.kind` is never re-derived after ingestion.

use crate::model::collation::CollationKey;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static VIDEO_EXTENSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(mp4|mov|m4v|webm|mkv|avi|wmv)$").expect("valid video extension regex")
});
static FILE_EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[A-Za-z0-9]{1,5}$").expect("valid file extension regex"));
static URL_HOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.)?([^/?#:]+)").expect("valid url host regex")
});

const VIDEO_HOSTS: &[&str] = &[
    "youtube.com",
    "m.youtube.com",
    "youtu.be",
    "vimeo.com",
    "player.vimeo.com",
    "loom.com",
];

/// Closed material tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    File,
    Link,
    Video,
}

impl MaterialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Link => "link",
            Self::Video => "video",
        }
    }

    fn from_declared(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" | "document" | "pdf" => Some(Self::File),
            "link" | "url" => Some(Self::Link),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Classifies one material from its declared type, url and file name.
pub fn classify_material(
    declared: Option<&str>,
    url: Option<&str>,
    file_name: Option<&str>,
) -> MaterialKind {
    if let Some(kind) = declared.and_then(MaterialKind::from_declared) {
        return kind;
    }

    let url = url.map(str::trim).filter(|value| !value.is_empty());
    let file_name = file_name.map(str::trim).filter(|value| !value.is_empty());

    if let Some(url) = url {
        if let Some(host) = URL_HOST_RE
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|host| host.as_str().to_ascii_lowercase())
        {
            if VIDEO_HOSTS.contains(&host.as_str()) {
                return MaterialKind::Video;
            }
            let path = url_path(url);
            if VIDEO_EXTENSION_RE.is_match(path) {
                return MaterialKind::Video;
            }
            if !FILE_EXTENSION_RE.is_match(path) || path.is_empty() {
                return MaterialKind::Link;
            }
            return MaterialKind::File;
        }
    }

    match file_name.or(url) {
        Some(name) if VIDEO_EXTENSION_RE.is_match(name) => MaterialKind::Video,
        _ => MaterialKind::File,
    }
}

/// Path portion of an absolute url, without query or fragment.
fn url_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .find('/')
        .map_or("", |index| &without_scheme[index..]);
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Ingestion payload for one material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialInput {
    pub title: String,
    #[serde(default, rename = "type")]
    pub declared_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Stored classroom material with its classification frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    pub title: String,
    pub url: Option<String>,
    pub file_name: Option<String>,
    pub kind: MaterialKind,
}

impl Material {
    /// Classifies `input` and freezes the resulting kind.
    pub fn ingest(input: MaterialInput) -> Self {
        let kind = classify_material(
            input.declared_type.as_deref(),
            input.url.as_deref(),
            input.file_name.as_deref(),
        );
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            url: input.url,
            file_name: input.file_name,
            kind,
        }
    }
}

/// Materials of one kind, preserving input order.
pub fn filter_by_kind(materials: &[Material], kind: MaterialKind) -> Vec<&Material> {
    materials
        .iter()
        .filter(|material| material.kind == kind)
        .collect()
}

/// Sorts materials by title, ignoring case and accents. Stable.
pub fn sort_by_title(materials: &mut [Material]) {
    materials.sort_by_cached_key(|material| CollationKey::new(&material.title));
}
