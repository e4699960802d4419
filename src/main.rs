mod args;

use anyhow::bail;
use clap::Parser;

use crate::args::{Args, Command};

/// Info by default; `RUST_LOG`-style `directives` are applied on top.
fn log_builder(directives: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    if let Some(directives) = directives {
        builder.parse_filters(directives);
    }
    builder
}

fn init_logging() {
    let directives = std::env::var(env_logger::DEFAULT_FILTER_ENV).ok();
    log_builder(directives.as_deref()).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    tokio::select! {
        result = run(args.command) => result,
        _ = tokio::signal::ctrl_c() => {
            // scratch files are removed as the pending futures drop
            bail!("interrupted")
        },
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Encoders => {
            let encoders = h5j::list_supported_encoders().await;
            if encoders.is_empty() {
                bail!("no {} encoder available", h5j::config::config().codec_family);
            }
            for encoder in encoders {
                println!("{}", encoder);
            }
            Ok(())
        }
        #[cfg(feature = "hdf5")]
        Command::Info { file } => files::info(&file),
        #[cfg(feature = "hdf5")]
        Command::Mip { file, out, channel } => files::mip(&file, &out, channel.as_deref()).await,
        #[cfg(not(feature = "hdf5"))]
        Command::Info { .. } | Command::Mip { .. } => {
            bail!("h5j was built without the `hdf5` feature, file commands are unavailable")
        }
    }
}

#[cfg(feature = "hdf5")]
mod files {
    use std::path::Path;

    use anyhow::{Context, bail};

    pub fn info(path: &Path) -> anyhow::Result<()> {
        let file = h5j::H5File::open(path).with_context(|| format!("open {}", path.display()))?;
        let summary = h5j::describe_container(&file)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }

    pub async fn mip(path: &Path, out: &Path, channel: Option<&str>) -> anyhow::Result<()> {
        let mut options = h5j::ReadOptions::default().cropped();
        if let Some(channel) = channel {
            options = options.channels(channel);
        }
        let data = h5j::read(path, &options)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        let signal = match data.signal {
            Some(h5j::Signal::Single(stack)) => stack,
            Some(h5j::Signal::Stacked(_)) => bail!("mip takes a single channel, e.g. `R`"),
            None => bail!("no channel selected"),
        };
        let projection = h5j::mip::project_frames(&signal);
        log::info!("projection {} written to {}", projection, out.display());
        tokio::fs::write(out, projection.to_le_bytes())
            .await
            .with_context(|| format!("write {}", out.display()))?;
        Ok(())
    }
}
