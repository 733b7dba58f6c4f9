use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rmrp_engine::logging::{init_logging, LoggingConfig};
use rmrp_engine::Scene;

mod manifest;
mod output;

use manifest::Manifest;
use output::PreviewSize;

/// Compile a ray-marched SDF scene into an HLSL compute kernel and its
/// packed parameter buffer.
#[derive(Debug, Parser)]
#[command(name = "rmrp", version)]
struct Args {
    /// Scene manifest (TOML).
    manifest: PathBuf,

    /// Output directory.
    #[arg(short, long, default_value = "out")]
    out: PathBuf,

    /// Override the manifest's step budget.
    #[arg(long)]
    steps: Option<u32>,

    /// Override the manifest's resolution scale.
    #[arg(long)]
    resolution: Option<f32>,

    /// Print the kernel to stdout instead of writing files.
    #[arg(long)]
    print: bool,

    /// Also trace a CPU preview of this size, e.g. `320x180`.
    #[arg(long, value_name = "WxH")]
    preview: Option<PreviewSize>,

    /// More log output: `-v` debug, `-vv` trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log filter, `env_logger` syntax. Overrides RMRP_LOG, RUST_LOG and -v.
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        filter: args.log.clone(),
        ..LoggingConfig::with_verbosity(args.verbose)
    });

    let loaded = Manifest::load(&args.manifest)?;

    let mut config = loaded.config.clone();
    if let Some(steps) = args.steps {
        config.step_budget = steps;
    }
    if let Some(resolution) = args.resolution {
        config.resolution_scale = resolution;
    }

    let mut scene = Scene::new(loaded.name, loaded.source);
    scene.set_skybox(loaded.skybox);
    *scene.parameters_mut() = loaded.parameters;

    let artifact = scene
        .recompile(&config)
        .with_context(|| format!("compiling {}", args.manifest.display()))?;

    if args.print {
        print!("{}", artifact.kernel_source);
        return Ok(());
    }

    let store = scene
        .store()
        .context("scene has no parameter store after a successful compile")?;
    let files = output::write_artifact(&args.out, &artifact, store)?;

    log::info!("wrote {}", files.kernel.display());
    log::info!("wrote {} ({} bytes)", files.buffer.display(), store.byte_size());
    log::info!("wrote {}", files.layout.display());

    if let Some(size) = args.preview {
        let host = scene
            .host_scene()
            .with_context(|| format!("preparing {} for the host", args.manifest.display()))?;
        let camera = loaded.camera.to_camera(size.aspect());
        let path = output::write_preview(&args.out, &artifact, &host, &camera, size, &config)?;
        log::info!("wrote {} ({}x{})", path.display(), size.width, size.height);
    }
    Ok(())
}
