//! End-to-end pipeline tests with in-memory span and embedding backends.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use docsift_core::{
    AnalysisConfig, BackendError, Block, DocumentLayout, EmbedError, EmbeddingSource, Line, Page,
    Span, SpanSource,
};
use docsift_ingest::{AnalysisError, AnalysisRequest, Analyzer, DocumentRef, ProgressEvent};

const PERSONA: &str = "Food Contractor";
const JOB: &str = "Prepare a vegetarian buffet";

/// Serves layouts by file name; names listed in `broken` fail to open.
struct FakeSpans {
    layouts: HashMap<String, DocumentLayout>,
    broken: Vec<String>,
}

impl SpanSource for FakeSpans {
    fn open_document(&self, path: &Path) -> Result<DocumentLayout, BackendError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if self.broken.contains(&name) {
            return Err(BackendError::OpenError(format!("{name}: corrupt xref")));
        }
        self.layouts
            .get(&name)
            .cloned()
            .ok_or_else(|| BackendError::OpenError(name))
    }
}

/// Query texts map to orthogonal axes; any other text is placed by the
/// first marker word it contains. A marker `(j, p)` yields a unit vector
/// with cosine `j` to the job axis and `p` to the persona axis.
struct MarkerEmbedder {
    markers: Vec<(&'static str, f32, f32)>,
}

impl EmbeddingSource for MarkerEmbedder {
    fn name(&self) -> &str {
        "marker"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text == JOB {
            return Ok(vec![1.0, 0.0, 0.0]);
        }
        if text == PERSONA {
            return Ok(vec![0.0, 1.0, 0.0]);
        }
        let (j, p) = self
            .markers
            .iter()
            .find(|(m, _, _)| text.contains(m))
            .map(|(_, j, p)| (*j, *p))
            .unwrap_or((0.0, 0.0));
        let rest = (1.0 - j * j - p * p).max(0.0).sqrt();
        Ok(vec![j, p, rest])
    }
}

struct FailingEmbedder;

impl EmbeddingSource for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
        Err(EmbedError::Empty)
    }
}

fn body(text: &str) -> Block {
    Block::new(vec![Line::new(vec![Span::new(text, 10.0, false)])])
}

fn heading(text: &str) -> Block {
    Block::new(vec![Line::new(vec![Span::new(text, 16.0, true)])])
}

fn words(marker: &str, n: usize) -> String {
    std::iter::once(marker)
        .chain(std::iter::repeat("filler").take(n - 1))
        .collect::<Vec<_>>()
        .join(" ")
}

fn single_page(blocks: Vec<Block>) -> DocumentLayout {
    DocumentLayout {
        pages: vec![Page { number: 1, blocks }],
    }
}

/// Creates placeholder files so existence checks pass; content comes from
/// the fake span source.
fn workspace(names: &[&str]) -> (tempfile::TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = names
        .iter()
        .map(|n| {
            let p = dir.path().join(n);
            std::fs::write(&p, b"%PDF-1.7").unwrap();
            p
        })
        .collect();
    (dir, paths)
}

fn request(paths: &[PathBuf]) -> AnalysisRequest {
    AnalysisRequest::new(
        paths
            .iter()
            .map(|p| DocumentRef::new(p.to_string_lossy()))
            .collect(),
        PERSONA,
        JOB,
    )
}

fn run(
    spans: &FakeSpans,
    embedder: &dyn EmbeddingSource,
    request: &AnalysisRequest,
) -> (Result<docsift_core::Report, AnalysisError>, Vec<ProgressEvent>) {
    let events = RefCell::new(Vec::new());
    let analyzer = Analyzer::new(spans, embedder, AnalysisConfig::default());
    let result = analyzer.analyze(request, |e| events.borrow_mut().push(e));
    (result, events.into_inner())
}

#[test]
fn threshold_keeps_only_relevant_section() {
    let (_dir, paths) = workspace(&["menu.pdf"]);
    let spans = FakeSpans {
        layouts: HashMap::from([(
            "menu.pdf".to_string(),
            single_page(vec![
                heading("Falafel"),
                body("alpha chickpeas and herbs"),
                heading("Brisket"),
                body("beta slow smoked beef"),
            ]),
        )]),
        broken: vec![],
    };
    // 0.8 * 0.5 = 0.40 and 0.8 * 0.125 = 0.10
    let embedder = MarkerEmbedder {
        markers: vec![("alpha", 0.5, 0.0), ("beta", 0.125, 0.0)],
    };

    let (result, _) = run(&spans, &embedder, &request(&paths));
    let report = result.unwrap();
    assert_eq!(report.extracted_sections.len(), 1);
    assert_eq!(report.extracted_sections[0].section_title, "Falafel");
    assert_eq!(report.extracted_sections[0].importance_rank, 1);
    assert_eq!(report.extracted_sections[0].document, "menu.pdf");
    assert_eq!(report.metadata.persona, PERSONA);
    assert_eq!(report.metadata.job_to_be_done, JOB);
}

#[test]
fn no_existing_documents_is_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![dir.path().join("gone.pdf"), dir.path().join("missing.pdf")];
    let spans = FakeSpans {
        layouts: HashMap::new(),
        broken: vec![],
    };
    let embedder = MarkerEmbedder { markers: vec![] };

    let (result, events) = run(&spans, &embedder, &request(&paths));
    assert!(matches!(result, Err(AnalysisError::EmptyCorpus)));
    assert_eq!(
        events,
        vec![
            ProgressEvent::DocumentSkipped {
                name: "gone.pdf".into(),
                reason: "document not found".into()
            },
            ProgressEvent::DocumentSkipped {
                name: "missing.pdf".into(),
                reason: "document not found".into()
            },
        ]
    );
}

#[test]
fn blank_document_is_empty_corpus() {
    let (_dir, paths) = workspace(&["scanned.pdf"]);
    let spans = FakeSpans {
        layouts: HashMap::from([(
            "scanned.pdf".to_string(),
            DocumentLayout {
                pages: vec![
                    Page {
                        number: 1,
                        blocks: vec![body("   "), Block::default(), heading("\n")],
                    },
                    Page {
                        number: 2,
                        blocks: vec![],
                    },
                ],
            },
        )]),
        broken: vec![],
    };

    // an empty corpus must never reach the embedding backend
    let (result, events) = run(&spans, &FailingEmbedder, &request(&paths));
    assert!(matches!(result, Err(AnalysisError::EmptyCorpus)));
    assert_eq!(
        events,
        vec![ProgressEvent::DocumentParsed {
            name: "scanned.pdf".into(),
            sections: 0
        }]
    );
}

#[test]
fn failing_document_does_not_stop_the_run() {
    let (_dir, paths) = workspace(&["broken.pdf", "good.pdf"]);
    let spans = FakeSpans {
        layouts: HashMap::from([(
            "good.pdf".to_string(),
            single_page(vec![heading("Salads"), body("alpha greens")]),
        )]),
        broken: vec!["broken.pdf".to_string()],
    };
    let embedder = MarkerEmbedder {
        markers: vec![("alpha", 0.9, 0.1)],
    };

    let (result, events) = run(&spans, &embedder, &request(&paths));
    let report = result.unwrap();
    assert_eq!(report.metadata.input_pdfs, vec!["broken.pdf", "good.pdf"]);
    assert!(
        report
            .extracted_sections
            .iter()
            .all(|s| s.document == "good.pdf")
    );
    assert_eq!(report.extracted_sections.len(), 1);
    assert!(matches!(
        &events[0],
        ProgressEvent::DocumentSkipped { name, reason } if name == "broken.pdf" && reason.contains("corrupt xref")
    ));
    assert_eq!(
        events[1],
        ProgressEvent::DocumentParsed {
            name: "good.pdf".into(),
            sections: 1
        }
    );
}

#[test]
fn subsections_come_from_long_paragraphs() {
    let (_dir, paths) = workspace(&["guide.pdf"]);
    let config = AnalysisConfig::builder()
        .paragraph_per_block(true)
        .build()
        .unwrap();
    let spans = FakeSpans {
        layouts: HashMap::from([(
            "guide.pdf".to_string(),
            single_page(vec![
                heading("Sides"),
                body(&words("alpha", 20)),
                body(&words("short", 10)),
                body(&words("gamma", 25)),
            ]),
        )]),
        broken: vec![],
    };
    let embedder = MarkerEmbedder {
        markers: vec![("alpha", 0.6, 0.0), ("gamma", 0.9, 0.0), ("Sides", 0.9, 0.0)],
    };

    let analyzer = Analyzer::new(&spans, &embedder, config);
    let events = RefCell::new(Vec::new());
    let report = analyzer
        .analyze(&request(&paths), |e| events.borrow_mut().push(e))
        .unwrap();

    assert_eq!(report.subsection_analysis.len(), 2);
    assert!(report.subsection_analysis[0].refined_text.starts_with("gamma"));
    assert!(report.subsection_analysis[1].refined_text.starts_with("alpha"));
    assert!(
        report
            .subsection_analysis
            .iter()
            .all(|s| s.page_number == 1 && s.document == "guide.pdf")
    );
    assert!(
        events
            .borrow()
            .contains(&ProgressEvent::SubsectionsSelected { selected: 2 })
    );
}

#[test]
fn nothing_relevant_yields_empty_lists() {
    let (_dir, paths) = workspace(&["dull.pdf"]);
    let spans = FakeSpans {
        layouts: HashMap::from([(
            "dull.pdf".to_string(),
            single_page(vec![heading("Appendix"), body("unrelated text")]),
        )]),
        broken: vec![],
    };
    let embedder = MarkerEmbedder { markers: vec![] };

    let (result, events) = run(&spans, &embedder, &request(&paths));
    let report = result.unwrap();
    assert!(report.extracted_sections.is_empty());
    assert!(report.subsection_analysis.is_empty());
    assert_eq!(report.metadata.input_pdfs, vec!["dull.pdf"]);
    assert!(events.contains(&ProgressEvent::SectionsScored { total: 1 }));
    assert!(events.contains(&ProgressEvent::SectionsSelected { selected: 0 }));
}

#[test]
fn embedding_failure_is_fatal() {
    let (_dir, paths) = workspace(&["menu.pdf"]);
    let spans = FakeSpans {
        layouts: HashMap::from([(
            "menu.pdf".to_string(),
            single_page(vec![heading("Soups"), body("lentil")]),
        )]),
        broken: vec![],
    };

    let (result, _) = run(&spans, &FailingEmbedder, &request(&paths));
    assert!(matches!(
        result,
        Err(AnalysisError::Embedding(EmbedError::Empty))
    ));
}

#[test]
fn ranks_across_documents_in_descending_order() {
    let (_dir, paths) = workspace(&["a.pdf", "b.pdf"]);
    let spans = FakeSpans {
        layouts: HashMap::from([
            (
                "a.pdf".to_string(),
                single_page(vec![
                    heading("Mid"),
                    body("mid tier dishes"),
                    heading("Low"),
                    body("low tier dishes"),
                ]),
            ),
            (
                "b.pdf".to_string(),
                DocumentLayout {
                    pages: vec![
                        Page {
                            number: 1,
                            blocks: vec![body("intro")],
                        },
                        Page {
                            number: 2,
                            blocks: vec![heading("Top"), body("top")],
                        },
                    ],
                },
            ),
        ]),
        broken: vec![],
    };
    let embedder = MarkerEmbedder {
        markers: vec![("Top", 0.9, 0.0), ("Mid", 0.6, 0.0), ("Low", 0.4, 0.0)],
    };

    let (result, _) = run(&spans, &embedder, &request(&paths));
    let report = result.unwrap();
    let got: Vec<(&str, &str, usize, usize)> = report
        .extracted_sections
        .iter()
        .map(|s| {
            (
                s.document.as_str(),
                s.section_title.as_str(),
                s.importance_rank,
                s.page_number,
            )
        })
        .collect();
    assert_eq!(
        got,
        vec![
            ("b.pdf", "Top", 1, 2),
            ("a.pdf", "Mid", 2, 1),
            ("a.pdf", "Low", 3, 1),
        ]
    );
}
