//! Splitting a multi-stage shader file into per-stage sources.

use super::{ShaderSources, ShaderStage};
use crate::constants::{MAX_STAGES, TYPE_TOKEN};
use crate::error::ShaderError;
use std::path::Path;
use tracing::{debug, error};

/// Read a whole shader file as UTF-8 text.
pub fn read_file(path: &Path) -> Result<String, ShaderError> {
    let bytes = std::fs::read(path).map_err(|source| {
        error!("Could not open file '{}': {}", path.display(), source);
        ShaderError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    String::from_utf8(bytes).map_err(|source| {
        error!("Shader file '{}' is not valid UTF-8: {}", path.display(), source);
        ShaderError::Encoding {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Split `source` into stage blocks introduced by `#type <stage>` lines.
///
/// The marker must be followed by whitespace or the end of the line. Each
/// block runs from the line after its marker (blank lines skipped) up to the
/// next marker or the end of input. Text before the first marker is ignored.
pub fn split_stages(source: &str) -> Result<ShaderSources, ShaderError> {
    let mut blocks: Vec<(ShaderStage, &str)> = Vec::new();
    let mut marker = source.find(TYPE_TOKEN);

    while let Some(start) = marker {
        let name_start = start + TYPE_TOKEN.len();
        let eol = source[name_start..]
            .find(['\r', '\n'])
            .map_or(source.len(), |i| name_start + i);
        let name = &source[name_start..eol];
        if !name.is_empty() && !name.starts_with([' ', '\t']) {
            return Err(ShaderError::UnknownStage(format!(
                "{TYPE_TOKEN}{}",
                name.trim_end()
            )));
        }
        let stage: ShaderStage = name.trim().parse()?;

        let body_start = source[eol..]
            .find(|c: char| c != '\r' && c != '\n')
            .map_or(source.len(), |i| eol + i);
        marker = source[body_start..]
            .find(TYPE_TOKEN)
            .map(|i| body_start + i);
        let body_end = marker.unwrap_or(source.len());

        blocks.push((stage, &source[body_start..body_end]));
    }

    if blocks.len() > MAX_STAGES {
        return Err(ShaderError::TooManyStages(blocks.len()));
    }

    let mut sources = ShaderSources::new();
    for (stage, body) in blocks {
        if sources.insert(stage, body).is_some() {
            return Err(ShaderError::DuplicateStage(stage));
        }
        debug!(%stage, bytes = body.len(), "Split shader stage");
    }
    Ok(sources)
}

/// Shader name for a file path: the file name without its last extension.
///
/// Both `/` and `\` count as separators so asset paths written on either
/// platform give the same name.
pub fn name_from_path(path: &Path) -> String {
    let path = path.to_string_lossy();
    let file = path.rsplit(['/', '\\']).next().unwrap_or(&*path);
    match file.rfind('.') {
        Some(dot) if dot > 0 => file[..dot].to_string(),
        _ => file.to_string(),
    }
}
