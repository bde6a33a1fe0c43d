use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use docsift_core::Query;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("input file not found: {}", .0.display())]
    InputMissing(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid request JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Free-form identification of the test case; carried but not interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Path of the document, relative to the working directory unless
    /// rewritten by [`AnalysisRequest::with_pdf_dir`].
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl DocumentRef {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            title: None,
        }
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.filename)
    }

    /// Basename used to attribute sections and paragraphs.
    pub fn name(&self) -> String {
        Path::new(&self.filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

/// One analysis run: which documents to read, and the persona and task
/// they are read for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_info: Option<ChallengeInfo>,
    pub documents: Vec<DocumentRef>,
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
}

impl AnalysisRequest {
    pub fn new(
        documents: Vec<DocumentRef>,
        persona: impl Into<String>,
        job: impl Into<String>,
    ) -> Self {
        Self {
            challenge_info: None,
            documents,
            persona: Persona {
                role: persona.into(),
            },
            job_to_be_done: JobToBeDone { task: job.into() },
        }
    }

    /// Read a request JSON file.
    pub fn load(path: &Path) -> Result<Self, RequestError> {
        if !path.exists() {
            return Err(RequestError::InputMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| RequestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| RequestError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve every document as `dir/<basename>`.
    pub fn with_pdf_dir(mut self, dir: &Path) -> Self {
        for doc in &mut self.documents {
            doc.filename = dir.join(doc.name()).to_string_lossy().into_owned();
        }
        self
    }

    pub fn query(&self) -> Query {
        Query::new(&self.persona.role, &self.job_to_be_done.task)
    }

    /// Document basenames in request order.
    pub fn document_names(&self) -> Vec<String> {
        self.documents.iter().map(DocumentRef::name).collect()
    }
}
