use clap::{Parser, Subcommand};
use log::info;
use provql::{
    LatestQuery, MatchFilter, ProvqlError, QueryConfig, TranslationSupport, load_records,
    load_translations, render_records,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "provql")]
#[command(version, about = "Query versioned metadata records stored as JSON")]
struct Cli {
    /// Query configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Locale for translated properties, overriding the configuration
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Translation catalog: { "<locale>": { "<key>": "<text>" } }
    #[arg(long, global = true)]
    translations: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Latest version of each unit
    Latest {
        /// Records file (JSON array)
        records: PathBuf,

        /// Only records of this kind
        #[arg(long)]
        kind: Option<String>,

        /// Identifier pattern, `*` matches any run of characters
        #[arg(long)]
        id: Option<String>,
    },

    /// Every version matching the given criteria, in input order
    Match {
        /// Records file (JSON array)
        records: PathBuf,

        /// Only records of this kind
        #[arg(long)]
        kind: Option<String>,

        /// Identifier pattern, `*` matches any run of characters
        #[arg(long, default_value = "*")]
        id: String,

        /// Version range, e.g. `[1.0.0,2.0.0)` or a bare minimum
        #[arg(long)]
        range: Option<String>,

        /// Pattern for the translated `name` property
        #[arg(long)]
        name: Option<String>,
    },
}

fn load_config(path: Option<&Path>) -> Result<QueryConfig, ProvqlError> {
    match path {
        Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => Ok(QueryConfig::default()),
    }
}

fn main() -> Result<(), ProvqlError> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }

    let results = match cli.command {
        Commands::Latest { records, kind, id } => {
            let records = load_records(&records)?;
            LatestQuery {
                kind,
                id_pattern: id,
            }
            .run(records, &config)?
        }
        Commands::Match {
            records,
            kind,
            id,
            range,
            name,
        } => {
            let mut filter = MatchFilter {
                kind,
                id_pattern: id,
                name_pattern: name,
                ..MatchFilter::default()
            };
            if let Some(range) = range {
                filter = filter.with_range(&range)?;
            }
            let translations = match cli.translations.as_deref() {
                Some(path) => Some(Arc::new(load_translations(path)?) as Arc<dyn TranslationSupport>),
                None => None,
            };
            let records = load_records(&records)?;
            filter.run(records, &config, translations)?
        }
    };

    info!("{} results", results.len());
    println!("{}", serde_json::to_string_pretty(&render_records(&results))?);
    Ok(())
}
