use super::ShaderSources;
use crate::api::GraphicsApi;
use crate::context::Context;
use crate::error::ShaderError;
use crate::handle::{Handle, ProgramObject, ShaderObject};
use tracing::{debug, error};

/// Compile every stage and link them into one program.
///
/// Either a fully linked program comes back, bound as the active program,
/// or nothing does: every native object created during a failed attempt is
/// deleted before the error is returned. Stage units of a successful link
/// are detached from the program but not deleted.
#[tracing::instrument(level = "debug", skip_all, fields(stages = sources.len()))]
pub fn compile_program(
    ctx: &Context,
    sources: &ShaderSources,
) -> Result<Handle<ProgramObject>, ShaderError> {
    if sources.is_empty() {
        return Err(ShaderError::NoStages);
    }

    let api = ctx.api();
    let mut compiled = Vec::with_capacity(sources.len());

    for (stage, source) in sources.iter() {
        let shader = api.create_shader(stage).inspect_err(|_| {
            release_stages(api, &compiled);
        })?;
        api.shader_source(shader, source);
        api.compile_shader(shader);

        if !api.shader_compile_status(shader) {
            let log = api.shader_info_log(shader);
            api.delete_shader(shader);
            release_stages(api, &compiled);
            error!(%stage, "{}", log);
            return Err(ShaderError::Compile { stage, log });
        }

        debug!(%stage, ?shader, "Compiled shader stage");
        compiled.push(shader);
    }

    let program = api.create_program().inspect_err(|_| {
        release_stages(api, &compiled);
    })?;
    for &shader in &compiled {
        api.attach_shader(program, shader);
    }
    api.link_program(program);

    if !api.program_link_status(program) {
        let log = api.program_info_log(program);
        api.delete_program(program);
        release_stages(api, &compiled);
        error!("{}", log);
        return Err(ShaderError::Link { log });
    }

    for &shader in &compiled {
        api.detach_shader(program, shader);
    }

    ctx.use_program(Some(program));
    Ok(program)
}

fn release_stages(api: &dyn GraphicsApi, stages: &[Handle<ShaderObject>]) {
    for &shader in stages {
        api.delete_shader(shader);
    }
}
