use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use std::{env, process};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wastesort::classifier::Classifier;
use wastesort::config::Settings;
use wastesort::gemini::GeminiClient;
use wastesort::server::{routes, AppState};

const USAGE: &str = "usage: ./wastesort [config file]";

fn get_args() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        println!("{USAGE}");
        process::exit(1);
    }

    args.get(1).cloned()
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config_file = get_args();
    let settings = Settings::load(config_file.as_deref())?;
    init_tracing(&settings.log_level);

    let model = GeminiClient::new(&settings.gemini).context("failed to build gemini client")?;
    let state = web::Data::new(AppState {
        classifier: Classifier::new(Box::new(model)),
        max_upload_bytes: settings.server.max_upload_bytes,
    });

    let addr = (settings.server.host.clone(), settings.server.port);
    info!("listening on {}:{}", addr.0, addr.1);

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .service(routes::home)
            .service(routes::predict)
    })
    .bind(addr)
    .with_context(|| format!("failed to bind {}:{}", settings.server.host, settings.server.port))?
    .run()
    .await?;

    Ok(())
}
