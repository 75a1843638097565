//! Canonical record shapes handed to templates and `papers.json`.
//!
//! Both formatters are pure: the same record always yields the same output.

use super::types::{PaperRecord, Uid, WorkshopRecord};
use serde::Serialize;

/// A paper as shown on poster pages, the schedule and `papers.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paper {
    #[serde(rename = "UID")]
    pub uid: Uid,
    pub title: String,
    /// Discussion forum id (same as UID)
    pub forum: Uid,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(rename = "abstract")]
    pub summary: String,
    #[serde(rename = "TLDR")]
    pub tldr: String,
    /// Recommended papers; no recommender exists so this stays empty.
    pub recs: Vec<Uid>,
    pub sessions: Vec<String>,
    /// PDF the poster is rendered from
    pub pdf_url: String,
    pub code_link: String,
    pub link: String,
}

/// A workshop as shown on the workshop list and detail pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workshop {
    pub id: Uid,
    pub title: String,
    pub organizers: Vec<String>,
    #[serde(rename = "abstract")]
    pub summary: String,
}

pub fn format_paper(record: &PaperRecord) -> Paper {
    Paper {
        uid: record.uid.clone(),
        title: record.title.clone(),
        forum: record.uid.clone(),
        authors: record.authors.to_vec(),
        keywords: record.keywords.to_vec(),
        summary: record.summary.clone(),
        tldr: record.summary.clone(),
        recs: Vec::new(),
        sessions: record.sessions.to_vec(),
        pdf_url: record.pdf_url.clone().unwrap_or_default(),
        code_link: record.code_link.clone().unwrap_or_default(),
        link: record.link.clone().unwrap_or_default(),
    }
}

pub fn format_workshop(record: &WorkshopRecord) -> Workshop {
    Workshop {
        id: record.uid.clone(),
        title: record.title.clone(),
        organizers: record.authors.to_vec(),
        summary: record.summary.clone(),
    }
}
