use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use reelsim_api::RestApi;
use reelsim_core::{parse_top_n, NormalizeConfig, PipelineConfig, RatingJoin, TextConfig, TextField};
use reelsim_storage::{save_snapshot_to_path, CatalogManager, CatalogSource, DatasetPaths};

/// Find similar titles and search names in IMDb-style metadata dumps
#[derive(Parser, Debug)]
#[command(name = "reelsim")]
#[command(about = "Title similarity and name search over IMDb-style TSV dumps", long_about = None)]
struct Args {
    /// Directory holding the source tables
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Primary metadata table (defaults to <data-dir>/title.basics.tsv.gz)
    #[arg(long, global = true)]
    basics: Option<PathBuf>,

    /// Ratings table (defaults to <data-dir>/title.ratings.tsv.gz)
    #[arg(long, global = true)]
    ratings: Option<PathBuf>,

    /// Alternate titles table (defaults to <data-dir>/title.akas.tsv.gz)
    #[arg(long, global = true)]
    akas: Option<PathBuf>,

    /// Load entities from a snapshot instead of the source tables
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// How ratings attach to titles: left keeps unrated titles, inner drops them
    #[arg(long, default_value = "left", global = true)]
    rating_join: RatingJoin,

    /// Fields that make up each title's text
    #[arg(long, value_delimiter = ',', default_value = "primary_name,categories", global = true)]
    text_fields: Vec<TextField>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the most similar title pairs
    Similar {
        #[arg(short = 'n', long, default_value_t = 10, allow_negative_numbers = true)]
        top_n: i64,
    },
    /// Print titles whose name contains QUERY
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    /// Write the canonical entity set to a snapshot file
    Snapshot {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 6340)]
        http_port: u16,

        /// Directory for snapshots created through the API
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            normalize: NormalizeConfig {
                rating_join: self.rating_join,
                ..NormalizeConfig::default()
            },
            text: TextConfig {
                fields: self.text_fields.clone(),
            },
        }
    }

    fn source(&self) -> CatalogSource {
        if let Some(path) = &self.snapshot {
            return CatalogSource::Snapshot(path.clone());
        }
        let mut paths = DatasetPaths::from_dir(&self.data_dir);
        if let Some(basics) = &self.basics {
            paths.basics = basics.clone();
        }
        if let Some(ratings) = &self.ratings {
            paths.ratings = ratings.clone();
        }
        if let Some(akas) = &self.akas {
            paths.akas = Some(akas.clone());
        }
        CatalogSource::Tables(paths)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting reelsim v{}", env!("CARGO_PKG_VERSION"));

    // Reject a bad count before paying for the load.
    if let Command::Similar { top_n } = &args.command {
        parse_top_n(*top_n)?;
    }

    let source = args.source();
    let config = args.pipeline_config();
    let manager = tokio::task::spawn_blocking(move || CatalogManager::open(source, config)).await??;

    match args.command {
        Command::Similar { top_n } => {
            let top_n = parse_top_n(top_n)?;
            let catalog = manager.current();
            let pairs = tokio::task::spawn_blocking(move || {
                let pairs = catalog.rank_similar_pairs(top_n);
                (catalog, pairs)
            });
            let (catalog, pairs) = pairs.await?;
            for pair in pairs {
                let first = catalog.entity(&pair.first).map(|e| e.to_string()).unwrap_or(pair.first.clone());
                let second = catalog.entity(&pair.second).map(|e| e.to_string()).unwrap_or(pair.second.clone());
                println!("{:>4.0}%  {}  <->  {}", pair.score * 100.0, first, second);
            }
        }
        Command::Search { query } => {
            let catalog = manager.current();
            for entity in catalog.search_by_name(&query) {
                println!("{}", entity);
            }
        }
        Command::Snapshot { out } => {
            let catalog = manager.current();
            let desc = save_snapshot_to_path(&out, catalog.entities())?;
            info!("Wrote {} entities to {:?}", desc.entities, out);
            println!("{}", serde_json::to_string_pretty(&desc)?);
        }
        Command::Serve { http_port, snapshot_dir } => {
            let manager = match snapshot_dir {
                Some(dir) => manager.with_snapshot_dir(dir)?,
                None => manager,
            };
            serve(Arc::new(manager), http_port).await?;
        }
    }

    Ok(())
}

async fn serve(manager: Arc<CatalogManager>, http_port: u16) -> anyhow::Result<()> {
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(manager, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
