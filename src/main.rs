mod app;
mod classifier;
mod event;
mod record;
mod theme;
mod workspace;

use app::MailSiftApp;
use classifier::ClassifierClient;
use eframe::egui;
use record::store::RecordStore;
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;
use workspace::Workspace;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";

fn endpoint_base_url() -> String {
    std::env::var("MAILSIFT_ENDPOINT")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mailsift=info")),
        )
        .init();

    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("mailsift-runtime")
        .build()?;

    let classifier =
        runtime.block_on(async { ClassifierClient::new(endpoint_base_url(), tx.clone()) })?;

    let workspace = Workspace::new(RecordStore::open_default());
    let app = MailSiftApp::new(rx, classifier, workspace);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1180.0, 760.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "MailSift",
        native_options,
        Box::new(move |creation_context| {
            app.apply_theme(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
