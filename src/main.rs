use clap::Parser;
use docfill::adapters::docx::DocxTemplate;
use docfill::adapters::form_handler::{FormState, SharedFields};
use docfill::adapters::health_handler::HealthHandler;
use docfill::cli::Cli;
use docfill::config::{load_fields, watcher::SchemaWatcher, Settings};
use docfill::domain::DocumentPort;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;
    let host = settings.server.host.clone();
    let port = settings.server.port;

    // The form cannot be built without either of these
    let fields = load_fields(&settings.paths.fields).map_err(|e| {
        error!("{}", e);
        e
    })?;
    let template = DocxTemplate::open(&settings.paths.template).map_err(|e| {
        error!("{}", e);
        e
    })?;
    info!("Using template {}", template.path().display());

    let fields: SharedFields = Arc::new(RwLock::new(fields));
    let document: Arc<dyn DocumentPort> = Arc::new(template);

    // Reload the schema on change; a broken edit keeps the previous fields
    let fields_for_watcher = fields.clone();
    let schema_path = settings.paths.fields.clone();
    let _watcher = SchemaWatcher::new(&settings.paths.fields, move || {
        match load_fields(&schema_path) {
            Ok(new_fields) => {
                let mut w = fields_for_watcher.blocking_write();
                *w = new_fields;
                info!("Field schema reloaded successfully");
            }
            Err(e) => error!("Failed to reload field schema: {}", e),
        }
    })?;

    let settings = Arc::new(settings);
    let health_handler = Arc::new(HealthHandler::new(fields.clone(), document.clone()));
    let state = FormState::new(settings, fields, document)?;
    let app = docfill::create_app(state, health_handler);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting docfill on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
