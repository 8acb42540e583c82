//! End-to-end tests for the question-answering pipeline.
//!
//! A temp-dir knowledge base plays the Turtle sources and scripted
//! generator doubles play the model, so the full four-stage flow runs
//! without any network access.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use haksik::error::StageFault;
use haksik::graph::GraphStore;
use haksik::llm::{GenerationError, TextGenerator};
use haksik::pipeline::{self, KnowledgeBase, Pipeline};

const TBOX: &str = r#"
@prefix : <http://snu.ac.kr/dining/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
:Venue a owl:Class .
:Service a owl:Class .
:MenuItem a owl:Class .
:offers a owl:ObjectProperty .
:hasMenu a owl:ObjectProperty .
:name a owl:DatatypeProperty .
:menuName a owl:DatatypeProperty .
:price a owl:DatatypeProperty .
"#;

const ABOX: &str = r#"
@prefix : <http://snu.ac.kr/dining/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
:venue301 a :Venue ; :name "301동식당" ; :offers :lunch301 .
:lunch301 a :Service ; :hasMenu :kimchiJjigae .
:kimchiJjigae a :MenuItem ; :menuName "김치찌개" ; :price "5000"^^xsd:integer .
"#;

/// The traversal query the model is expected to produce for the
/// "301동 식당 메뉴 알려줘" scenario.
const MENU_QUERY: &str = r#"PREFIX : <http://snu.ac.kr/dining/>
SELECT ?menu ?price WHERE {
  ?venue a :Venue ; :name ?vn ; :offers ?service .
  ?service :hasMenu ?item .
  ?item :menuName ?menu ; :price ?price .
  FILTER(CONTAINS(?vn, "301"))
}"#;

/// Replays a fixed sequence of responses, one per `generate` call.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
        }
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.replies
            .lock()
            .expect("script lock")
            .pop_front()
            .ok_or_else(|| GenerationError::RequestFailed {
                message: "script exhausted".into(),
            })
    }
}

/// Always fails, simulating an unreachable provider.
struct DownGenerator;

impl TextGenerator for DownGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::RequestFailed {
            message: "connection refused".into(),
        })
    }
}

fn write_kb(root: &Path) -> KnowledgeBase {
    let kb = KnowledgeBase::at_root(root);
    std::fs::create_dir_all(kb.tbox.parent().unwrap()).unwrap();
    std::fs::write(&kb.tbox, TBOX).unwrap();
    std::fs::write(&kb.abox, ABOX).unwrap();
    kb
}

fn load(root: &Path) -> (GraphStore, haksik::schema::SchemaSummary) {
    let kb = write_kb(root);
    let (store, summary, _) =
        pipeline::load_knowledge_base(&kb, "http://snu.ac.kr/dining/").unwrap();
    (store, summary.into_value())
}

#[test]
fn loads_fixture_kb_and_summarizes_schema() {
    let dir = tempfile::TempDir::new().unwrap();
    let kb = write_kb(dir.path());
    let (store, summary, report) =
        pipeline::load_knowledge_base(&kb, "http://snu.ac.kr/dining/").unwrap();

    assert!(report.schema.is_loaded());
    assert!(report.instance.is_loaded());
    assert_eq!(store.len(), report.total_triples);
    assert!(store.len() > 0);

    let summary = summary.into_value();
    assert!(summary.classes.contains(":Venue"));
    assert!(summary.classes.contains(":MenuItem"));
    assert!(summary.properties.contains(":hasMenu"));
    assert!(summary.sample_relations.len() <= 5);
    assert!(!summary.sample_relations.is_empty());
}

#[test]
fn missing_kb_is_a_degenerate_session_not_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let kb = KnowledgeBase::at_root(dir.path());
    let (store, summary, report) =
        pipeline::load_knowledge_base(&kb, "http://snu.ac.kr/dining/").unwrap();

    assert_eq!(report.total_triples, 0);
    assert!(store.is_empty());
    let text = summary.into_value().render();
    assert!(text.contains("No classes found"));

    // The pipeline still runs and still produces an answer.
    let pipeline = Pipeline::new(
        store,
        haksik::schema::summarize(&GraphStore::empty().unwrap()).into_value(),
        Box::new(ScriptedGenerator::new(&[
            "SELECT ?s WHERE { ?s ?p ?o }",
            "조건에 맞는 결과를 찾지 못했습니다.",
            "데이터가 없어 쿼리가 비었습니다.",
        ])),
    );
    let exchange = pipeline.answer("아무 식당이나 알려줘");
    assert!(exchange.rows.value().is_empty());
    assert!(!exchange.answer.value().is_empty());
}

#[test]
fn summary_render_is_byte_identical_across_calls() {
    let dir = tempfile::TempDir::new().unwrap();
    let (store, _) = load(dir.path());
    let a = haksik::schema::summarize(&store).into_value().render();
    let b = haksik::schema::summarize(&store).into_value().render();
    assert_eq!(a, b);
}

#[test]
fn select_rows_never_exceed_projection_variables() {
    let dir = tempfile::TempDir::new().unwrap();
    let (store, _) = load(dir.path());
    let rows = pipeline::execute::execute(&store, MENU_QUERY).into_value();
    assert!(!rows.is_empty());
    for row in &rows {
        for key in row.keys() {
            assert!(
                key == "menu" || key == "price",
                "unexpected projection key {key}"
            );
        }
    }
}

#[test]
fn menu_scenario_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    let (store, summary) = load(dir.path());

    // Script: fenced SPARQL from the synthesis call, then the answer,
    // then the explanation.
    let generator = ScriptedGenerator::new(&[
        &format!("```sparql\n{MENU_QUERY}\n```"),
        "301동식당에서는 김치찌개를 5000원에 드실 수 있습니다.",
        ":name으로 식당을 찾고 :offers와 :hasMenu를 따라 메뉴에 도달했습니다.",
    ]);
    let pipeline = Pipeline::new(store, summary, Box::new(generator));

    let exchange = pipeline.answer("301동 식당 메뉴 알려줘");

    // Fence stripped, query executed for real.
    assert!(!exchange.query.is_degraded());
    assert!(!exchange.query.value().contains("```"));
    assert!(exchange.query.value().starts_with("PREFIX"));

    let rows = exchange.rows.value();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("menu").map(String::as_str), Some("김치찌개"));
    assert_eq!(rows[0].get("price").map(String::as_str), Some("5000"));

    let answer = exchange.answer.value();
    assert!(answer.contains("김치찌개"));
    assert!(answer.contains("5000"));
    assert!(!exchange.explanation.value().is_empty());
}

#[test]
fn provider_outage_degrades_every_llm_stage() {
    let dir = tempfile::TempDir::new().unwrap();
    let (store, summary) = load(dir.path());
    let pipeline = Pipeline::new(store, summary, Box::new(DownGenerator));

    let exchange = pipeline.answer("301동 식당 메뉴 알려줘");

    // Empty query from failed synthesis, empty rows from its execution.
    assert!(matches!(
        exchange.query.fault(),
        Some(StageFault::QuerySynthesis { .. })
    ));
    assert!(exchange.query.value().is_empty());
    assert!(exchange.rows.is_degraded());
    assert!(exchange.rows.value().is_empty());

    // Fixed fallbacks instead of crashes.
    assert_eq!(
        exchange.answer.value(),
        haksik::pipeline::answer::ANSWER_FALLBACK
    );
    assert_eq!(
        exchange.explanation.value(),
        haksik::pipeline::explain::EXPLANATION_FALLBACK
    );
}

#[test]
fn garbage_model_output_degrades_execution_only() {
    let dir = tempfile::TempDir::new().unwrap();
    let (store, summary) = load(dir.path());
    let generator = ScriptedGenerator::new(&[
        "I cannot write SPARQL today, sorry.",
        "죄송합니다, 조건에 맞는 결과를 찾지 못했습니다.",
        "쿼리가 올바르지 않아 설명할 내용이 없습니다.",
    ]);
    let pipeline = Pipeline::new(store, summary, Box::new(generator));

    let exchange = pipeline.answer("오늘 메뉴 뭐야?");
    assert!(!exchange.query.is_degraded());
    assert!(matches!(
        exchange.rows.fault(),
        Some(StageFault::QueryExecution { .. })
    ));
    assert!(exchange.rows.value().is_empty());
    assert!(!exchange.answer.is_degraded());
}

#[test]
fn answer_rows_are_capped_at_five() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut abox = String::from("@prefix : <http://snu.ac.kr/dining/> .\n");
    for i in 0..20 {
        abox.push_str(&format!(":item{i} :menuName \"menu-{i:02}\" .\n"));
    }
    let kb = write_kb(dir.path());
    std::fs::write(&kb.abox, abox).unwrap();
    let (store, summary, _) =
        pipeline::load_knowledge_base(&kb, "http://snu.ac.kr/dining/").unwrap();

    // Echo the answer prompt back so the test can count serialized rows.
    struct PromptEcho {
        calls: Mutex<usize>,
    }
    impl TextGenerator for PromptEcho {
        fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            match *calls {
                1 => Ok("PREFIX : <http://snu.ac.kr/dining/> \
                         SELECT ?menu WHERE { ?m :menuName ?menu } ORDER BY ?menu"
                    .to_string()),
                _ => Ok(prompt.to_string()),
            }
        }
    }

    let pipeline = Pipeline::new(
        store,
        summary.into_value(),
        Box::new(PromptEcho {
            calls: Mutex::new(0),
        }),
    );
    let exchange = pipeline.answer("메뉴 전부 알려줘");

    // All rows come back from execution...
    assert_eq!(exchange.rows.value().len(), 20);
    // ...but the answer prompt only saw the first five.
    let answer_prompt = exchange.answer.value();
    assert!(answer_prompt.contains("menu-04"));
    assert!(!answer_prompt.contains("menu-05"));
}
