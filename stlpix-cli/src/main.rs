//! `stlpix`: render an STL file to a PNG.
mod args;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let matches = args::create_clap_command().get_matches();
    let invocation = args::handle_clap_matches(&matches)?;

    let default_level = if invocation.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let stats = stlpix_core::render_stl_file(&invocation.stl, &invocation.out, &invocation.options)
        .with_context(|| {
            format!(
                "failed to render {} to {}",
                invocation.stl.display(),
                invocation.out.display()
            )
        })?;

    log::info!(
        "drew {} of {} faces ({} culled)",
        stats.drawn,
        stats.faces,
        stats.culled
    );
    Ok(())
}
