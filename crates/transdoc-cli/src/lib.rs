use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use transdoc_core::{LogFormat, SessionSnapshot};

/// Initialize tracing for the CLI. Logs go to stderr so stdout only carries
/// session output.
pub fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("transdoc=info")),
    );

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// One-line rendering of a session snapshot.
pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut line = format!("[{}] {}", snapshot.generation, snapshot.phase);
    if let Some(job_id) = &snapshot.job_id {
        line.push_str(&format!(" job={}", job_id));
    }

    if let Some(result) = &snapshot.result {
        line.push_str(&format!(" -> {}", result.display_name));
    } else if let Some(error) = &snapshot.error {
        line.push_str(&format!(": {}", error));
    } else if let Some(hint) = &snapshot.progress_hint {
        line.push_str(&format!(": {}", hint));
    }
    line
}
