//! Render command implementation.
//!
//! Compiles a filter expression into a backend's native filter syntax.

use vecfilter::render::{render_with, BackendKind, RenderConfig};

use super::config::{load_context_config, DEFAULT_BACKEND};
use super::{parse_filter, read_expression, CommandContext, CommandError, Result};

/// Options for the render command.
#[derive(Debug, Default)]
pub struct RenderOptions {
    /// Filter expression ("-" reads stdin).
    pub expression: String,
    /// Backend chosen on the command line.
    pub backend: Option<BackendKind>,
    /// `name=field` mappings from `--field`.
    pub fields: Vec<String>,
    /// Overrides the configured metadata column.
    pub metadata_column: Option<String>,
    /// Overrides the configured node alias.
    pub node_alias: Option<String>,
}

/// Splits a `name=field` mapping.
fn parse_field_mapping(mapping: &str) -> Result<(String, String)> {
    match mapping.split_once('=') {
        Some((name, field)) if !name.trim().is_empty() && !field.trim().is_empty() => {
            Ok((name.trim().to_string(), field.trim().to_string()))
        }
        _ => Err(CommandError::Config(format!(
            "invalid field mapping '{mapping}', expected NAME=FIELD"
        ))),
    }
}

/// Layers command-line options over the configured renderer settings.
fn resolve_settings(
    opts: &RenderOptions,
    configured_backend: Option<BackendKind>,
    mut config: RenderConfig,
) -> Result<(BackendKind, RenderConfig)> {
    let backend = opts
        .backend
        .or(configured_backend)
        .unwrap_or(DEFAULT_BACKEND);

    for mapping in &opts.fields {
        let (name, field) = parse_field_mapping(mapping)?;
        config.field_map.insert(name, field);
    }
    if let Some(column) = &opts.metadata_column {
        config.metadata_column = column.clone();
    }
    if let Some(alias) = &opts.node_alias {
        config.node_alias = alias.clone();
    }

    Ok((backend, config))
}

/// Executes the render command.
///
/// # Errors
///
/// Returns `CommandError::Filter` for invalid expressions and
/// `CommandError::Render` when the backend cannot express the filter.
pub fn execute(ctx: &CommandContext, opts: &RenderOptions) -> Result<()> {
    let input = read_expression(&opts.expression)?;
    let expr = parse_filter(&input)?;

    let stored = load_context_config(ctx)?;
    let (backend, config) = resolve_settings(opts, stored.backend()?, stored.render_config())?;
    log::debug!("rendering for {backend} with {} field mappings", config.field_map.len());

    let output = render_with(&expr, backend, &config)?;

    if ctx.json_output {
        let result = serde_json::json!({
            "backend": backend,
            "output": output,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{output}");
    }

    Ok(())
}
