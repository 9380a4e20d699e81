use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tower_http::cors::CorsLayer;

use coach_assist::checklist::{BuiltinTemplates, DirectoryTemplates, TemplateSource};
use coach_assist::config::CoachConfig;
use coach_assist::knowledge::HttpKnowledgeRetriever;
use coach_assist::llm::create_generator;
use coach_assist::orchestrator::ChecklistDrivenOrchestrator;
use coach_assist::routes::{CoachRouteState, coach_routes};
use coach_assist::session::{CoachService, SessionStatus};
use coach_assist::store::{LibSqlSessionStore, MemorySessionStore, SessionStore};

const LOCAL_SESSION: &str = "local";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CoachConfig::from_env().context("invalid configuration")?;

    eprintln!("🏋️ Coach Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Checklist: {}", config.default_checklist);
    if let Some(port) = config.http_port {
        eprintln!("   API: http://0.0.0.0:{}/api/sessions", port);
    }
    eprintln!("   Type a message and press Enter. /status, /reset, /quit.\n");

    // ── Session store ────────────────────────────────────────────────────
    let store: Arc<dyn SessionStore> = match &config.db_path {
        Some(path) => Arc::new(
            LibSqlSessionStore::new_local(path)
                .await
                .with_context(|| format!("failed to open database at {}", path.display()))?,
        ),
        None => Arc::new(MemorySessionStore::new()),
    };

    // ── Orchestrator and collaborators ───────────────────────────────────
    let templates: Arc<dyn TemplateSource> = match &config.template_dir {
        Some(dir) => Arc::new(DirectoryTemplates::new(dir)),
        None => Arc::new(BuiltinTemplates),
    };
    let orchestrator = ChecklistDrivenOrchestrator::new(templates).with_limits(config.limits());

    let mut service = CoachService::new(store, orchestrator)
        .with_default_checklist(config.default_checklist);
    if let Some(llm) = &config.llm {
        service = service.with_generator(create_generator(llm)?);
    }
    if let Some(knowledge) = &config.knowledge {
        service = service.with_retriever(
            Arc::new(HttpKnowledgeRetriever::new(knowledge)),
            knowledge.limit,
        );
    }
    let service = Arc::new(service);

    // ── HTTP API ─────────────────────────────────────────────────────────
    if let Some(port) = config.http_port {
        let app = coach_routes(CoachRouteState {
            service: Arc::clone(&service),
        })
        .layer(CorsLayer::permissive());
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;
        tracing::info!(port, "HTTP API started");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "HTTP server stopped");
            }
        });
    }

    // ── Local REPL ───────────────────────────────────────────────────────
    let opening = match service.status(LOCAL_SESSION).await? {
        Some(_) => None,
        None => Some(service.start_session(Some(LOCAL_SESSION.to_string()), None).await?),
    };
    if let Some(reply) = opening {
        println!("coach> {}", reply.response);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        match text {
            "" => continue,
            "/quit" | "/exit" => break,
            "/status" => match service.status(LOCAL_SESSION).await? {
                Some(status) => print_status(&status),
                None => println!("(no session)"),
            },
            "/reset" => {
                let reply = service.reset(LOCAL_SESSION).await?;
                println!("coach> {}", reply.response);
            }
            _ => match service.handle_turn(LOCAL_SESSION, text).await {
                Ok(reply) => {
                    println!("coach> {}", reply.response);
                    for snippet in &reply.snippets {
                        println!("   · {}", snippet.text);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Turn failed");
                    println!("coach> Sorry, I couldn't save that. Please try again.");
                }
            },
        }
    }

    Ok(())
}

fn print_status(status: &SessionStatus) {
    println!(
        "   {} · {:.0}% · phase {} · current {}",
        status.checklist_name.as_deref().unwrap_or("-"),
        status.progress,
        status.conversation_phase,
        status.current_check_id.as_deref().unwrap_or("-"),
    );
    for check in &status.checks {
        println!("   [{}] {}/{}", check.state, check.task_id, check.check_id);
    }
}
