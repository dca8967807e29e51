//! Binary entry point: dispatches to Core A's autonomous session loop or
//! Core B's document-ingestion and retrieval commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use rag_agent::cli::{Args, Commands, CorpusCommands, HttpOcrProvider, HttpStructureLlmProvider};
use rag_agent::config::{AppConfig, ConfigDiscovery};
use rag_agent::domain::{ProjectMarker, SessionKind, UnitType, WorkItem, WorkItemId};
use rag_agent::driver::{AgentDriver, CliConfig};
use rag_agent::env;
use rag_agent::ingest::llm_provider::LlmProviderKind;
use rag_agent::ingest::pipeline::{PipelineConfig, PipelineOrchestrator};
use rag_agent::orchestrator::{OrchestratorConfig, SessionOrchestrator, StepOutcome};
use rag_agent::progress::ProgressMode;
use rag_agent::retrieval::{RetrievalEngine, RetrievalFilters};
use rag_agent::sandbox::ToolPolicy;
use rag_agent::store::{HttpVectorStore, VectorStore};
use rag_agent::tracker::{HttpTrackerClient, ItemFilter, TrackerClient};
use rag_agent::AppError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter("rag_agent=info").init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Agent { project_dir, new_spec, max_iterations, model } => {
            run_agent(project_dir, new_spec, max_iterations, model).await
        }
        Commands::Corpus { command } => run_corpus(command).await,
    };

    if let Err(error) = result {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run_agent(
    project_dir: PathBuf,
    new_spec: Option<PathBuf>,
    max_iterations_override: Option<u32>,
    model_override: Option<String>,
) -> Result<(), AppError> {
    let app_config = ConfigDiscovery::discover_config().map_err(|e| AppError::config(e.to_string()))?;

    let tracker_url = url::Url::parse(&app_config.agent.tracker_url).map_err(|e| AppError::config(e.to_string()))?;
    let tracker: Arc<dyn TrackerClient> = Arc::new(HttpTrackerClient::new(tracker_url));

    let marker_path = env::project_marker_path(&project_dir);
    let existing_marker = load_project_marker(&marker_path).await?;

    let mut orchestrator_config = OrchestratorConfig::default();
    orchestrator_config.max_iterations = max_iterations_override.unwrap_or(app_config.agent.max_iterations);

    let mut orchestrator = match (existing_marker, new_spec) {
        (marker, Some(spec_path)) => {
            let spec_text =
                tokio::fs::read_to_string(&spec_path).await.map_err(|e| AppError::io(spec_path.clone(), e))?;
            let extend = marker.is_some();
            let (orchestrator, spec) =
                SessionOrchestrator::init(tracker.clone(), &spec_text, orchestrator_config, marker.clone(), extend)
                    .await
                    .map_err(|e| AppError::config(e.to_string()))?;
            if marker.is_none() {
                let project_marker = ProjectMarker {
                    project_id: orchestrator.project_id().to_string(),
                    total_items: spec.features.len() as u32,
                    meta_item_id: orchestrator.meta_item_id(),
                    created_at: chrono::Utc::now(),
                };
                save_project_marker(&marker_path, &project_marker).await?;
            }
            orchestrator
        }
        (Some(marker), None) => {
            info!(project_id = %marker.project_id, "resuming project from existing marker");
            // The marker carries no record of which session kind the project
            // was initialized under (see DESIGN.md); resumed sessions default
            // to the more permissive `Web` kind.
            SessionOrchestrator::resume(tracker.clone(), &marker, orchestrator_config, SessionKind::Web)
        }
        (None, None) => {
            return Err(AppError::config(format!(
                "no project marker at {}; pass --new-spec to initialize",
                marker_path.display()
            )));
        }
    };

    let policy = ToolPolicy::new(&project_dir);
    let mut cli_config = CliConfig::default();
    if let Some(model) = model_override {
        cli_config.model = model;
    }
    if let Some(oauth_token) = &app_config.agent.llm_oauth_token {
        warn!(len = oauth_token.len(), "llm_oauth_token configured but the CLI driver authenticates via its own logged-in session");
    }
    let store_url = url::Url::parse(&app_config.corpus.vector_store_url).map_err(|e| AppError::config(e.to_string()))?;
    let store: Arc<dyn VectorStore> = Arc::new(HttpVectorStore::new(store_url));
    let retrieval = Arc::new(RetrievalEngine::new(store));

    let driver = AgentDriver::new(tracker.clone(), policy, &project_dir)
        .with_cli_config(cli_config)
        .with_project_id(orchestrator.project_id())
        .with_retrieval_engine(retrieval);

    let sleep_delay = std::time::Duration::from_secs(app_config.agent.auto_continue_delay_seconds);

    loop {
        match orchestrator.step().await.map_err(|e| AppError::config(e.to_string()))? {
            StepOutcome::RunSession { item_id, kind } => {
                let item = fetch_item(tracker.as_ref(), orchestrator.project_id(), item_id).await?;
                let prompt = build_session_prompt(&item, kind);
                let outcome = driver.run_session(&item, kind, &prompt, true, orchestrator.meta_item_id()).await?;
                orchestrator
                    .record_iteration_result(&outcome.summary, !outcome.succeeded)
                    .await
                    .map_err(|e| AppError::config(e.to_string()))?;
            }
            StepOutcome::Sleep => {
                tokio::time::sleep(sleep_delay).await;
            }
            StepOutcome::Terminated { reason } => {
                info!(%reason, "session loop terminated");
                return Ok(());
            }
        }
    }
}

/// `TrackerClient` has no get-by-id lookup -- the tracker is the system of
/// record, queried by status/priority rather than by key -- so the item the
/// orchestrator names only by id is recovered with an unfiltered list-and-find.
async fn fetch_item(tracker: &dyn TrackerClient, project_id: &str, item_id: WorkItemId) -> Result<WorkItem, AppError> {
    let items = tracker.list_items(project_id, ItemFilter::default()).await?;
    items.into_iter().find(|item| item.id == item_id).ok_or_else(|| AppError::NotFound(format!("work item {item_id}")))
}

fn build_session_prompt(item: &WorkItem, kind: SessionKind) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("# Task: {}\n\n", item.title));
    prompt.push_str(&format!("## Description\n{}\n\n", item.description));
    prompt.push_str(&format!("## Category\n{}\n\n", item.category));
    prompt.push_str(&format!("## Test Steps\n{}\n\n", item.test_steps));
    prompt.push_str(match kind {
        SessionKind::Library => {
            "## Session Kind\nLibrary project: verify with the type-checker and unit-test runner, no browser automation.\n"
        }
        SessionKind::Web => "## Session Kind\nWeb project: verify with the type-checker and unit-test runner; no browser automation tool is available.\n",
        SessionKind::Init | SessionKind::InitBis => "## Session Kind\nInitial scaffolding session.\n",
    });
    prompt
}

async fn load_project_marker(path: &Path) -> Result<Option<ProjectMarker>, AppError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let marker = serde_json::from_slice(&bytes)
                .map_err(|e| AppError::config(format!("corrupt project marker at {}: {e}", path.display())))?;
            Ok(Some(marker))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::io(path.to_path_buf(), e)),
    }
}

async fn save_project_marker(path: &Path, marker: &ProjectMarker) -> Result<(), AppError> {
    let body = serde_json::to_vec_pretty(marker).expect("ProjectMarker always serializes");
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &body).await.map_err(|e| AppError::io(tmp_path.clone(), e))?;
    tokio::fs::rename(&tmp_path, path).await.map_err(|e| AppError::io(path.to_path_buf(), e))?;
    Ok(())
}

async fn run_corpus(command: CorpusCommands) -> Result<(), AppError> {
    let app_config = ConfigDiscovery::discover_config().map_err(|e| AppError::config(e.to_string()))?;

    match command {
        CorpusCommands::Ingest {
            pdf,
            output_dir,
            skip_ocr,
            use_annotations,
            no_llm,
            no_summaries,
            no_store,
            llm_endpoint,
            ocr_endpoint,
        } => {
            run_ingest(app_config, pdf, output_dir, skip_ocr, use_annotations, no_llm, no_summaries, no_store, llm_endpoint, ocr_endpoint)
                .await
        }
        CorpusCommands::Query { mode, query, limit, author, work, language, unit_type, section_prefix, min_similarity } => {
            run_query(app_config, mode, query, limit, author, work, language, unit_type, section_prefix, min_similarity).await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_ingest(
    app_config: AppConfig,
    pdf: PathBuf,
    output_dir: Option<PathBuf>,
    skip_ocr: bool,
    use_annotations: bool,
    no_llm: bool,
    no_summaries: bool,
    no_store: bool,
    llm_endpoint: Option<String>,
    ocr_endpoint: Option<String>,
) -> Result<(), AppError> {
    let doc_stem = pdf
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AppError::config(format!("cannot derive a document stem from {}", pdf.display())))?
        .to_string();
    let output_root = output_dir.or_else(|| pdf.parent().map(Path::to_path_buf)).unwrap_or_else(|| PathBuf::from("."));

    let llm_url = llm_endpoint.unwrap_or_else(|| format!("{}/complete", app_config.corpus.vector_store_url));
    let llm_url = url::Url::parse(&llm_url).map_err(|e| AppError::config(e.to_string()))?;
    let structure_llm = Arc::new(HttpStructureLlmProvider::new(
        llm_url,
        app_config.agent.llm_oauth_token.clone(),
        app_config.corpus.structure_llm_model.clone(),
    ));

    let ocr_url = ocr_endpoint.unwrap_or_else(|| format!("{}/ocr", app_config.corpus.vector_store_url));
    let ocr_url = url::Url::parse(&ocr_url).map_err(|e| AppError::config(e.to_string()))?;
    let ocr_provider = Arc::new(HttpOcrProvider::new(ocr_url, app_config.corpus.ocr_api_key.clone()));

    let vector_store: Option<Arc<dyn VectorStore>> = if no_store {
        None
    } else {
        let store_url = url::Url::parse(&app_config.corpus.vector_store_url).map_err(|e| AppError::config(e.to_string()))?;
        Some(Arc::new(HttpVectorStore::new(store_url)))
    };

    let progress = ProgressMode::default_for_tty().reporter().into();
    let orchestrator = PipelineOrchestrator::new(ocr_provider, structure_llm, vector_store, progress, output_root);

    let llm_provider_kind =
        if app_config.corpus.structure_llm_provider == "remote" { LlmProviderKind::Remote } else { LlmProviderKind::Local };

    let config = PipelineConfig {
        skip_ocr,
        use_llm: !no_llm,
        llm_provider: llm_provider_kind,
        llm_model: Some(app_config.corpus.structure_llm_model.clone()),
        use_ocr_annotations: use_annotations,
        use_semantic_chunking: true,
        ingest_to_vector_store: !no_store,
        generate_summaries: !no_summaries,
    };

    let output = orchestrator.run(&pdf, &doc_stem, "default edition", &config).await?;
    let summary = serde_json::json!({
        "doc_stem": doc_stem,
        "title": output.metadata.title,
        "author": output.metadata.author,
        "pages": output.pages,
        "chunks": output.chunks_count,
        "summaries": output.summaries.len(),
        "cost_total": output.cost_total,
    });
    println!("{}", serde_json::to_string_pretty(&summary).expect("summary always serializes"));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_query(
    app_config: AppConfig,
    mode: String,
    query: String,
    limit: usize,
    author: Option<String>,
    work: Option<String>,
    language: Option<String>,
    unit_type: Option<String>,
    section_prefix: Option<String>,
    min_similarity: Option<f32>,
) -> Result<(), AppError> {
    let store_url = url::Url::parse(&app_config.corpus.vector_store_url).map_err(|e| AppError::config(e.to_string()))?;
    let store: Arc<dyn VectorStore> = Arc::new(HttpVectorStore::new(store_url));
    let engine = RetrievalEngine::new(store);

    let unit_type = unit_type
        .map(|raw| {
            serde_json::from_str::<UnitType>(&format!("\"{raw}\""))
                .map_err(|_| AppError::config(format!("unrecognized unit type: {raw}")))
        })
        .transpose()?;

    let filters =
        RetrievalFilters { author, work, language, unit_type, section_path_prefix: section_prefix, min_similarity };

    let outcome = match mode.as_str() {
        "simple" => engine.simple(&query, limit, &filters).await,
        "summary" => engine.summary(&query, limit, &filters).await,
        "hierarchical" => engine.hierarchical(&query, 3, 5, &filters).await,
        "auto" => engine.auto(&query, limit, &filters).await,
        other => return Err(AppError::config(format!("unrecognized retrieval mode: {other}"))),
    };

    let body = match outcome {
        Ok(result) => {
            let results: Vec<_> = result
                .hits
                .iter()
                .map(|hit| serde_json::json!({"score": hit.score, "text": hit.text, "section": hit.section, "metadata": hit.metadata}))
                .collect();
            serde_json::json!({"ok": true, "mode": format!("{:?}", result.mode), "total": results.len(), "results": results})
        }
        Err(error) => serde_json::to_value(rag_agent::retrieval::ErrorEnvelope::from(&error)).expect("envelope always serializes"),
    };
    println!("{}", serde_json::to_string_pretty(&body).expect("query result always serializes"));
    Ok(())
}
