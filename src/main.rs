//! haksik CLI: campus dining questions over a knowledge graph.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use haksik::config::AppConfig;
use haksik::error::SoftResult;
use haksik::llm::GeminiClient;
use haksik::pipeline::{self, Exchange, KnowledgeBase, Pipeline};
use haksik::schema::SchemaSummary;

/// Competency questions used by `haksik verify`.
const VERIFY_QUESTIONS: [&str; 10] = [
    "지금 아침 식사 되는 식당 어디야?",
    "5,000원 이하로 점심 먹을 수 있는 곳 있어?",
    "오늘 면 요리(Noodle) 먹고 싶은데 어디로 가면 돼?",
    "301동(공대) 근처에 일식 파는 식당 찾아줘.",
    "바쁜데 빨리 받아서 갈 수 있는(테이크아웃) 점심 메뉴 추천해줘.",
    "오늘 매콤한 한식 땡기는데, 학생회관 근처에 그런 메뉴 있어?",
    "오늘 고기 없는 식단(채식) 있어?",
    "오늘 저녁 6시 30분 이후에도 밥 먹을 수 있는 곳 있어?",
    "나 매운 거 못 먹는데, 안 매운 걸로 추천해줘.",
    "오늘 나온 메뉴 중에 제일 싼 게 뭐야?",
];

#[derive(Parser)]
#[command(name = "haksik", version, about = "Graph-RAG assistant for campus dining")]
struct Cli {
    /// Knowledge-base root directory (holds ontology/tbox.ttl and abox_inferred.ttl).
    #[arg(long, global = true, default_value = ".")]
    kb_dir: PathBuf,

    /// Generative model identifier.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the answer.
    Ask {
        /// The question, in natural language.
        question: String,

        /// Also print the SPARQL query, explanation, and raw rows.
        #[arg(long)]
        details: bool,
    },

    /// Interactive question loop (exit with "quit" or Ctrl-D).
    Chat,

    /// Load the knowledge base and print the load report and schema summary.
    Schema,

    /// Generate the SPARQL for a question without executing it.
    Synth {
        /// The question, in natural language.
        question: String,
    },

    /// Execute raw SPARQL and print normalized rows as JSON.
    Exec {
        /// Query text, or @path to read it from a file.
        sparql: String,
    },

    /// Run the competency questions end to end.
    Verify,

    /// List generative model identifiers available to the configured key.
    Models,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config =
        AppConfig::resolve(cli.kb_dir.clone(), cli.model.clone(), cli.timeout).into_diagnostic()?;

    match cli.command {
        Commands::Ask { question, details } => {
            let pipeline = build_pipeline(&config)?;
            let exchange = pipeline.answer(&question);
            print_exchange(&exchange, details);
        }

        Commands::Chat => {
            let pipeline = build_pipeline(&config)?;
            chat_loop(&pipeline)?;
        }

        Commands::Schema => {
            let kb = KnowledgeBase::at_root(&config.kb_dir);
            let (_, summary, report) =
                pipeline::load_knowledge_base(&kb, &config.namespace).into_diagnostic()?;
            print_report(&report);
            print_summary(&summary);
        }

        Commands::Synth { question } => {
            let kb = KnowledgeBase::at_root(&config.kb_dir);
            let (store, summary, _) =
                pipeline::load_knowledge_base(&kb, &config.namespace).into_diagnostic()?;
            let generator = generator(&config)?;
            let query = haksik::pipeline::synthesize::synthesize(
                generator.as_ref(),
                &question,
                summary.value(),
                store.prefixes(),
            );
            if let Some(fault) = query.fault() {
                println!("(degraded: {fault})");
            }
            println!("{}", query.value());
        }

        Commands::Exec { sparql } => {
            let kb = KnowledgeBase::at_root(&config.kb_dir);
            let (store, _, _) =
                pipeline::load_knowledge_base(&kb, &config.namespace).into_diagnostic()?;
            let query = read_query_arg(&sparql)?;
            let rows = haksik::pipeline::execute::execute(&store, &query);
            if let Some(fault) = rows.fault() {
                println!("(degraded: {fault})");
            }
            println!(
                "{}",
                serde_json::to_string_pretty(rows.value()).into_diagnostic()?
            );
        }

        Commands::Verify => {
            let pipeline = build_pipeline(&config)?;
            for (i, question) in VERIFY_QUESTIONS.iter().enumerate() {
                println!("=== Q{}: {question} ===", i + 1);
                let exchange = pipeline.answer(question);
                let query = exchange.query.value().replace('\n', " ");
                println!("  query: {}", truncate(&query, 100));
                println!("  rows:  {}", exchange.rows.value().len());
                println!("  answer: {}", exchange.answer.value().replace('\n', " "));
                println!();
            }
        }

        Commands::Models => {
            let client = GeminiClient::new(config.generator()).into_diagnostic()?;
            for name in client.list_models().into_diagnostic()? {
                println!("{name}");
            }
        }
    }

    Ok(())
}

fn generator(config: &AppConfig) -> Result<Box<dyn haksik::llm::TextGenerator>> {
    let client = GeminiClient::new(config.generator()).into_diagnostic()?;
    Ok(Box::new(client))
}

fn build_pipeline(config: &AppConfig) -> Result<Pipeline> {
    let kb = KnowledgeBase::at_root(&config.kb_dir);
    let (store, summary, report) =
        pipeline::load_knowledge_base(&kb, &config.namespace).into_diagnostic()?;
    if report.total_triples == 0 {
        eprintln!("warning: knowledge base is empty (both sources failed to load)");
    }
    let generator = generator(config)?;
    Ok(Pipeline::new(store, summary.into_value(), generator))
}

fn chat_loop(pipeline: &Pipeline) -> Result<()> {
    let stdin = std::io::stdin();
    loop {
        print!("? ");
        std::io::stdout().flush().into_diagnostic()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
            break; // EOF
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "quit" || question == "exit" {
            break;
        }
        let exchange = pipeline.answer(question);
        println!("{}\n", exchange.answer.value());
    }
    Ok(())
}

fn print_exchange(exchange: &Exchange, details: bool) {
    println!("{}", exchange.answer.value());
    if !details {
        return;
    }

    println!("\n--- SPARQL ---");
    print_degradation(&exchange.query);
    println!("{}", exchange.query.value());

    println!("\n--- Explanation ---");
    print_degradation(&exchange.explanation);
    println!("{}", exchange.explanation.value());

    println!("\n--- Raw data ({} rows) ---", exchange.rows.value().len());
    print_degradation(&exchange.rows);
    match serde_json::to_string_pretty(exchange.rows.value()) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("(unserializable rows: {e})"),
    }
}

fn print_degradation<T>(result: &SoftResult<T>) {
    if let Some(fault) = result.fault() {
        println!("(degraded: {fault})");
    }
}

fn print_report(report: &haksik::graph::LoadReport) {
    for (label, outcome) in [("schema", &report.schema), ("instance", &report.instance)] {
        match outcome {
            haksik::graph::SourceOutcome::Loaded { path, triples } => {
                println!("{label}: loaded {triples} triples from {path}");
            }
            haksik::graph::SourceOutcome::Failed { path, reason } => {
                println!("{label}: FAILED to load {path}: {reason}");
            }
        }
    }
    println!("total: {} triples", report.total_triples);
}

fn print_summary(summary: &SoftResult<SchemaSummary>) {
    if let Some(fault) = summary.fault() {
        println!("(degraded: {fault})");
    }
    println!("\n{}", summary.value().render());
}

fn read_query_arg(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).into_diagnostic(),
        None => Ok(arg.to_string()),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}
