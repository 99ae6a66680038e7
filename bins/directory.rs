use std::{path::{Path, PathBuf}, sync::Arc};

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use common::pagination::Pagination;
use directory::errors::DirectoryError;
use directory::service_record::{SeaOrmServiceRepository, ServiceDirectory};
use migration::{Migrator, MigratorTrait};
use models::db::{connect_with_config, DatabaseConfig};
use models::service::ServiceInput;

#[derive(Debug, Parser)]
#[command(name = "directory", about = "Manage service records in the directory database")]
struct Cli {
    /// Path to config.toml; defaults to CONFIG_PATH or ./config.toml
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations
    Migrate,
    /// Import services from a JSON array of records
    Import { file: PathBuf },
    /// Print the API projection of one service
    Show { id: Uuid },
    /// Print one page of a location's services
    List {
        location_id: Uuid,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },
}

/// One entry of an import file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportRecord {
    #[serde(default)]
    location_id: Option<Uuid>,
    #[serde(default)]
    category_ids: Vec<Uuid>,
    service: ServiceInput,
}

#[derive(Debug, Default, Serialize)]
struct ImportSummary {
    imported: usize,
    rejected: usize,
}

async fn import(dir: &ServiceDirectory<SeaOrmServiceRepository>, file: &Path) -> anyhow::Result<ImportSummary> {
    let raw = tokio::fs::read(file).await?;
    let records: Vec<ImportRecord> = serde_json::from_slice(&raw)?;
    let mut summary = ImportSummary::default();
    for (index, record) in records.into_iter().enumerate() {
        match dir.create(record.location_id, record.service).await {
            Ok(saved) => {
                if !record.category_ids.is_empty() {
                    dir.assign_categories(saved.id, record.category_ids).await?;
                }
                summary.imported += 1;
            }
            Err(DirectoryError::Invalid(errors)) => {
                let rendered = serde_json::to_string(&errors)?;
                warn!(index, errors = %rendered, "import_record_rejected");
                summary.rejected += 1;
            }
            Err(other) => return Err(other.into()),
        }
    }
    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    // 优先使用命令行指定的配置文件，否则回退到默认配置 + 环境变量
    let mut cfg = match &cli.config {
        Some(path) => configs::load_from_file(path)?,
        None => configs::load_default().unwrap_or_default(),
    };
    cfg.normalize_and_validate()?;
    common::utils::logging::init_logging(cfg.logging.json);

    let db = connect_with_config(&DatabaseConfig::from(&cfg.database)).await?;
    if let Command::Migrate = cli.command {
        Migrator::up(&db, None).await?;
        info!("migrations_applied");
        return Ok(());
    }

    let dir = ServiceDirectory::new(Arc::new(SeaOrmServiceRepository { db }), &cfg.directory);
    match cli.command {
        Command::Migrate => {}
        Command::Import { file } => {
            let summary = import(&dir, &file).await?;
            info!(imported = summary.imported, rejected = summary.rejected, "import_finished");
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Show { id } => match dir.view(id).await? {
            Some(view) => println!("{}", serde_json::to_string_pretty(&view)?),
            None => return Err(DirectoryError::not_found("service").into()),
        },
        Command::List { location_id, page, per_page } => {
            let page = dir.list_views_by_location(location_id, Pagination { page, per_page }).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }
    Ok(())
}
