use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stagehand::config::Config;
use stagehand::director::{Director, QueryMap, QueryParameter, Scene};
use url::Url;

#[derive(Parser)]
#[command(name = "stagehand", version, about = "Inspect and build app URLs")]
struct Cli {
    /// Config file (default: ~/.config/stagehand/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report whether a URL can be handled
    Check { url: String },
    /// Print the scenes and recognized query parameters of a URL
    Decompose { url: String },
    /// Build a URL from scenes and key=value parameters
    Build {
        /// Scenes in order
        #[arg(required = true)]
        scenes: Vec<String>,
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    stagehand::logging::init_tracing(&config.logging.filter);
    config.apply();

    let director = Director::from_config(&config.director);
    tracing::debug!(scheme = %director.scheme(), "Director ready");

    match cli.command {
        Command::Check { url } => {
            let url = parse_url(&url)?;
            println!("{}", director.can_handle(&url));
        }
        Command::Decompose { url } => {
            let url = parse_url(&url)?;
            let Some(destination) = director.parse(&url) else {
                bail!("cannot handle URL '{}'", url);
            };
            let scenes: Vec<&str> = destination.scenes.iter().map(Scene::raw_value).collect();
            println!("scenes: {}", scenes.join(" "));
            for (parameter, value) in &destination.parameters {
                println!("{}={}", parameter, value);
            }
        }
        Command::Build { scenes, params } => {
            let scenes = scenes
                .iter()
                .map(|raw| resolve_scene(&director, raw))
                .collect::<Result<Vec<_>>>()?;
            let parameters = parse_parameters(&director, &params)?;
            let Some(url) = director.build_url(&scenes, &parameters) else {
                bail!("scenes and parameters do not form a valid URL");
            };
            println!("{}", url);
        }
    }

    Ok(())
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).with_context(|| format!("invalid URL '{}'", raw))
}

fn resolve_scene(director: &Director, raw: &str) -> Result<Scene> {
    director
        .scene(raw)
        .cloned()
        .with_context(|| format!("unknown scene '{}'", raw))
}

fn parse_parameters(director: &Director, params: &[String]) -> Result<QueryMap> {
    let mut parameters = QueryMap::new();
    for param in params {
        let Some((key, value)) = param.split_once('=') else {
            bail!("parameter '{}' must be key=value", param);
        };
        let parameter: QueryParameter = director
            .query_parameter(key)
            .cloned()
            .with_context(|| format!("unknown query parameter '{}'", key))?;
        parameters.insert(parameter, value.to_string());
    }
    Ok(parameters)
}
