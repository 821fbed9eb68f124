//! Request payloads accepted by the feature routes.
//!
//! Deserialization checks shape; [`FeaturePayload::validate`] checks the
//! rules serde cannot express. Both run before any collaborator is called.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Feature;

/// A validated request body bound to one feature.
pub trait FeaturePayload: DeserializeOwned + Serialize + Send + 'static {
    const FEATURE: Feature;

    /// Semantic checks. The error is a client-safe description.
    fn validate(&self) -> Result<(), String>;
}

fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{field}` must not be empty"))
    } else {
        Ok(())
    }
}

fn parse_http_url(field: &str, value: &str) -> Result<url::Url, String> {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(url),
        _ => Err(format!("`{field}` must be an absolute http(s) URL")),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeTranscriptRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl FeaturePayload for YoutubeTranscriptRequest {
    const FEATURE: Feature = Feature::YoutubeTranscript;

    fn validate(&self) -> Result<(), String> {
        let url = parse_http_url("url", &self.url)?;
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let youtube = host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com");
        if !youtube {
            return Err("`url` must point to a YouTube video".to_string());
        }
        if let Some(lang) = &self.lang {
            require_non_empty("lang", lang)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPageReaderRequest {
    pub url: String,
}

impl FeaturePayload for WebPageReaderRequest {
    const FEATURE: Feature = Feature::WebPageReader;

    fn validate(&self) -> Result<(), String> {
        parse_http_url("url", &self.url).map(|_| ())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationRequest {
    pub title: String,
    pub slides: Vec<Slide>,
}

impl FeaturePayload for PresentationRequest {
    const FEATURE: Feature = Feature::PowerpointGenerator;

    fn validate(&self) -> Result<(), String> {
        require_non_empty("title", &self.title)?;
        if self.slides.is_empty() {
            return Err("`slides` must contain at least one slide".to_string());
        }
        for (i, slide) in self.slides.iter().enumerate() {
            require_non_empty(&format!("slides[{i}].title"), &slide.title)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordDocumentRequest {
    pub title: String,
    pub sections: Vec<Section>,
}

impl FeaturePayload for WordDocumentRequest {
    const FEATURE: Feature = Feature::WordGenerator;

    fn validate(&self) -> Result<(), String> {
        require_non_empty("title", &self.title)?;
        if self.sections.is_empty() {
            return Err("`sections` must contain at least one section".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookRequest {
    pub title: String,
    pub sheets: Vec<Sheet>,
}

impl FeaturePayload for WorkbookRequest {
    const FEATURE: Feature = Feature::ExcelGenerator;

    fn validate(&self) -> Result<(), String> {
        require_non_empty("title", &self.title)?;
        if self.sheets.is_empty() {
            return Err("`sheets` must contain at least one sheet".to_string());
        }

        let mut names = HashSet::new();
        for (i, sheet) in self.sheets.iter().enumerate() {
            require_non_empty(&format!("sheets[{i}].name"), &sheet.name)?;
            if !names.insert(sheet.name.as_str()) {
                return Err(format!("duplicate sheet name {:?}", sheet.name));
            }
            if let Some(row) = sheet.rows.iter().position(|r| r.len() > sheet.columns.len()) {
                return Err(format!(
                    "`sheets[{i}].rows[{row}]` has more cells than `columns`"
                ));
            }
        }
        Ok(())
    }
}
