use crate::Args;
use ember_gpu::{Context, HeadlessApi, Shader, ShaderError, ShaderSources, ShaderStage};
use std::fmt::Write;
use thiserror::Error;
use tracing::{debug, info};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays the report.
pub fn init_logging(config: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("shader file has no {0} stage")]
    MissingStage(ShaderStage),
}

impl AppError {
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            AppError::Shader(e) => e.diagnostic(),
            AppError::MissingStage(_) => None,
        }
    }
}

/// Run one invocation and return what should be printed.
pub fn run(args: &Args) -> Result<String, AppError> {
    let source = ember_gpu::shader::read_file(&args.file)?;
    let sources = ember_gpu::shader::split_stages(&source)?;
    let name = ember_gpu::shader::name_from_path(&args.file);
    debug!(shader = %name, stages = sources.len(), "Split shader file");

    if let Some(stage) = &args.stage {
        let stage: ShaderStage = stage.parse()?;
        let src = sources.get(stage).ok_or(AppError::MissingStage(stage))?;
        return Ok(ensure_newline(src));
    }

    let mut report = summary(&name, &sources);
    if args.check {
        let ctx = Context::new(HeadlessApi::new());
        let shader = Shader::from_stage_sources(&ctx, name, &sources)?;
        info!(shader = shader.name(), "Check passed");
        let _ = writeln!(report, "ok: {} linked", shader.name());
    }
    Ok(report)
}

fn summary(name: &str, sources: &ShaderSources) -> String {
    let mut out = format!("{name}\n");
    for (stage, src) in sources.iter() {
        let _ = writeln!(
            out,
            "  {stage:<8} {lines:>4} lines {bytes:>6} bytes",
            lines = src.lines().count(),
            bytes = src.len()
        );
    }
    out
}

fn ensure_newline(src: &str) -> String {
    let mut out = src.to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
