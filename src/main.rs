use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;

mod catalogue;
mod cli;
mod cluster;
mod config;
mod normalize;
mod pipeline;
mod questions;
mod records;
mod runid;
mod semantic;
mod store;
#[cfg(test)]
mod tests;

use config::Config;
use pipeline::Pipeline;
use runid::RunId;
use semantic::{Embedder, EmbeddingModel};
use store::RunStore;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let base_path = resolve_base_path(args.data_dir)?;
    let config = Config::load_with(base_path.to_str().context("data dir is not valid utf8")?)?;

    match args.command {
        cli::Command::Run { input, key } => {
            let records = records::load_csv(&input)?;
            log::info!("{} records loaded from {input}", records.len());

            let model = load_model(&config, &base_path)?;
            let model_id = model.model_id_hash();
            let dimensions = model.dimensions();
            let pipeline = Pipeline::new(&config.pipeline, Arc::new(model))?;

            let artifacts = pipeline.run(records)?;

            let store = RunStore::new(base_path.join("runs"))?;
            let key = key.unwrap_or_else(|| RunId::new().to_string());
            store.save_run(&key, &artifacts, &model_id, dimensions)?;

            println!(
                "{} filtered, {} embedded, {} questions, {} catalogue entries",
                artifacts.filtered.len(),
                artifacts.embedded.len(),
                artifacts.questions.len(),
                artifacts.catalogue.len(),
            );
            println!("stored as run '{key}'");
            Ok(())
        }

        cli::Command::Query { key, text, top_k } => {
            let model = load_model(&config, &base_path)?;
            let model_id = model.model_id_hash();
            let dimensions = model.dimensions();
            let pipeline = Pipeline::new(&config.pipeline, Arc::new(model))?;

            let store = RunStore::new(base_path.join("runs"))?;
            let corpus = store.load_embedded(&key, &model_id, dimensions)?;

            let results = pipeline.query(&text, &corpus, top_k)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }

        cli::Command::Catalogue { key } => {
            let store = RunStore::new(base_path.join("runs"))?;
            let mut entries = store.load_catalogue(&key)?;
            catalogue::sort_for_display(&mut entries);

            println!("{}", serde_json::to_string_pretty(&entries)?);
            Ok(())
        }
    }
}

fn resolve_base_path(data_dir: Option<String>) -> anyhow::Result<PathBuf> {
    match data_dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => {
            let home = homedir::my_home()?
                .ok_or_else(|| anyhow!("could not resolve home directory, pass --data-dir"))?;
            Ok(home.join(".mailsift"))
        }
    }
}

fn load_model(config: &Config, base_path: &std::path::Path) -> anyhow::Result<EmbeddingModel> {
    log::info!("loading embedding model '{}'", config.embedding.model);
    let timeout = Duration::from_secs(config.embedding.download_timeout_secs);
    let model = EmbeddingModel::new(
        &config.embedding.model,
        base_path.to_path_buf(),
        Some(timeout),
    )?;
    log::info!(
        "model '{}' ready ({} dimensions)",
        model.name(),
        model.dimensions()
    );
    Ok(model)
}
