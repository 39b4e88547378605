use anyhow::Result;
use clap::Parser;
use regfuse::config::Config;
use regfuse::fusion::FusionBuilder;
use regfuse::model::OpenAiChat;
use regfuse::sources::{ConceptNetSource, DbpediaSource, TermDefinitionSource};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "regfuse")]
#[command(about = "Extract regulatory events from a document and build a knowledge fusion graph")]
struct Args {
    /// Document file to process (reads stdin when omitted)
    document: Option<PathBuf>,

    /// Override the configured expansion round budget
    #[arg(short, long)]
    rounds: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load()?;
    log::info!("Configuration loaded successfully");

    let document = read_document(args.document.as_deref())?;
    if document.trim().is_empty() {
        anyhow::bail!("Document is empty; nothing to extract");
    }

    let api_key = config.api_key()?;

    // 1) Document -> eventic events
    let extract_model = OpenAiChat::new(api_key.clone(), config.model.extract_model.clone());
    log::info!("Extracting events with {}", config.model.extract_model);
    let events = regfuse::extract_events(&extract_model, &document).await?;
    log::info!("Extracted {} event(s)", events.len());
    for ev in &events {
        log::debug!("  {} -{}-> {}", ev.agent, ev.deontic, ev.action);
    }

    // 2) Eventic events -> fusion graph
    let mut fusion_config = config.fusion.clone();
    if let Some(rounds) = args.rounds {
        fusion_config.rounds = rounds;
    }

    let fusion_model = Arc::new(OpenAiChat::new(api_key, config.model.fusion_model.clone()));
    let mut builder = FusionBuilder::new(fusion_model.clone(), fusion_config);

    if config.fusion.use_concept_graph {
        let mut concept = ConceptNetSource::new(
            config.sources.concept_base_url.clone(),
            config.sources.concept_limit,
            config.sources.timeout_secs,
        );
        if let Some(relations) = config.sources.concept_relations.clone() {
            concept = concept.with_allowed_relations(relations);
        }
        builder = builder.with_concept_source(Arc::new(concept));
    }
    if config.fusion.use_entity_graph {
        builder = builder.with_entity_source(Arc::new(DbpediaSource::new(
            config.sources.lookup_url.clone(),
            config.sources.sparql_url.clone(),
            config.sources.sparql_limit,
            config.sources.timeout_secs,
        )));
    }
    if config.fusion.use_term_definition_graph {
        builder = builder.with_definition_source(Arc::new(TermDefinitionSource::new(fusion_model)));
    }

    let graph = builder.build(&events).await;

    println!("{}", serde_json::to_string_pretty(&graph)?);

    Ok(())
}

/// Read the document from the given path, or from stdin when none is given.
fn read_document(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
