use doll_build::generate;
use doll_core::{ConfigError, DollConfig, FigureError};
use doll_geom::MeshHost;
use std::{path::PathBuf, process::ExitCode};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("figure generation failed: {0}")]
    Figure(#[from] FigureError),
    #[error("failed to encode scene summary: {0}")]
    Encode(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(std::env::args_os().nth(1).map(PathBuf::from)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            let text = std::fs::read_to_string(&path)
                .map_err(|source| CliError::Read { path, source })?;
            DollConfig::from_json_str(&text)?
        }
        None => DollConfig::default(),
    };

    let mut host = MeshHost::new();
    let scene = generate(&mut host, &config)?;
    println!("{}", serde_json::to_string_pretty(&scene.summary())?);
    Ok(())
}
