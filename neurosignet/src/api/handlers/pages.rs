//! HTML pages: the loading screen at `/` and the dashboard.

use axum::{extract::State, response::Html};
use minijinja::{Environment, context};

use crate::AppState;
use crate::errors::{Error, Result};

/// Build the template environment with every page template compiled in.
pub fn template_environment() -> std::result::Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("home.html", include_str!("../../../templates/home.html"))?;
    env.add_template("dashboard.html", include_str!("../../../templates/dashboard.html"))?;
    Ok(env)
}

fn render(state: &AppState, name: &str) -> Result<Html<String>> {
    let config = &state.config;
    let template = state.templates.get_template(name).map_err(|e| Error::Internal {
        operation: format!("load template {name}: {e}"),
    })?;

    let html = template
        .render(context! {
            name => &config.metadata.name,
            description => &config.metadata.description,
            version => env!("CARGO_PKG_VERSION"),
            allowed_formats => &config.limits.allowed_formats,
            accept => config.limits.allowed_formats.join(","),
            max_file_size_mb => config.limits.max_file_size / (1024 * 1024),
            max_batch_files => config.limits.max_batch_files,
        })
        .map_err(|e| Error::Internal {
            operation: format!("render template {name}: {e}"),
        })?;

    Ok(Html(html))
}

#[tracing::instrument(skip_all)]
pub async fn home(State(state): State<AppState>) -> Result<Html<String>> {
    render(&state, "home.html")
}

#[tracing::instrument(skip_all)]
pub async fn dashboard(State(state): State<AppState>) -> Result<Html<String>> {
    render(&state, "dashboard.html")
}
