use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use panlink::report::{self, DocumentReport, ExtractionReport};
use panlink::source::{discover_documents, PlainTextSource, TextSource};
use panlink::{build_recognizer, Config, ExtractionSettings, RelationExtractor};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "panlink")]
#[command(about = "Link PAN identifiers in document text to the people and organizations they belong to")]
struct Args {
    /// Text document, or a directory of .txt/.text/.md documents
    input: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "extracted_entities.csv")]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Recognizer provider, overrides recognizer.provider ("http" or "heuristic")
    #[arg(long)]
    provider: Option<String>,

    /// NER service endpoint, overrides recognizer.endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Skip the console summary
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(provider) = &args.provider {
        config.recognizer.provider = provider.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.recognizer.endpoint = Some(endpoint.clone());
    }
    config.validate()?;

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.output.log_level.as_str()),
    )
    .init();

    log::info!("Starting panlink v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Recognizer provider: {}", config.recognizer.provider);

    let recognizer = build_recognizer(&config.recognizer)?;
    let extractor =
        RelationExtractor::initialize(recognizer, ExtractionSettings::from(&config.extraction))
            .await
            .context("Failed to initialise the named-entity recognizer")?;

    let documents = discover_documents(&args.input)?;
    if documents.is_empty() {
        log::warn!("No documents found under {}", args.input.display());
    }

    let start = Instant::now();
    let source = PlainTextSource;
    let mut reports = Vec::with_capacity(documents.len());

    for (idx, doc) in documents.iter().enumerate() {
        log::info!("[{}/{}] Processing: {}", idx + 1, documents.len(), doc.relative_path);

        let text = source
            .get_text(&doc.absolute_path)
            .with_context(|| format!("Failed to read {}", doc.absolute_path.display()))?;
        if text.trim().is_empty() {
            log::warn!("No text extracted from {}", doc.relative_path);
        } else {
            log::info!("Extracted {} characters", text.chars().count());
        }

        let records = extractor.extract_relations(&text).await?;
        log::info!("✓ {} ({} record(s))", doc.relative_path, records.len());

        reports.push(DocumentReport {
            document: doc.relative_path.clone(),
            records,
        });
    }

    let all_records: Vec<_> = reports.iter().flat_map(|r| r.records.iter().cloned()).collect();

    match args.format {
        OutputFormat::Csv => report::write_csv(&all_records, &args.output)?,
        OutputFormat::Json => ExtractionReport::new(reports).write_json(&args.output)?,
    }

    log::info!("Time: {:?}", start.elapsed());

    if !args.quiet {
        print!(
            "{}",
            report::render_summary(&all_records, config.output.summary_sample)
        );
        println!("Check '{}' for full results", args.output.display());
    }

    Ok(())
}
