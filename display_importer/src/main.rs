mod error;

use crate::error::MainError;
use clap::Parser;
use display_store::error::InitializationError;
use display_store::geocoder::NominatimGeocoder;
use display_store::importer::{COLUMN_KEYWORDS, ColumnMapping, Importer, SheetTable};
use display_store::store::RecordStore;
use display_store::{SETTINGS_FILE, init_tracing, load_config_from, prepare_storage};
use std::path::PathBuf;
use tracing::info;

/// Imports a CSV, XLSX or ODS sheet of display locations into the record store.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Spreadsheet to import.
    file: PathBuf,

    #[arg(long, default_value = SETTINGS_FILE)]
    settings: PathBuf,

    /// Print the detected column mapping and row count without geocoding or saving.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = load_config_from(&cli.settings)?;
    let bytes = tokio::fs::read(&cli.file)
        .await
        .map_err(|source| MainError::ReadInput {
            path: cli.file.clone(),
            source,
        })?;
    let file_name = cli
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| MainError::InvalidFileName(cli.file.clone()))?;

    if cli.dry_run {
        let table = SheetTable::parse(file_name, &bytes)?;
        let mapping = ColumnMapping::resolve(&table.headers);
        for (field, _) in COLUMN_KEYWORDS {
            let column = mapping
                .column(field)
                .and_then(|index| table.headers.get(index))
                .map_or("-", String::as_str);
            println!("{field:?}: {column}");
        }
        println!("{} data rows", table.rows.len());
        return Ok(());
    }

    prepare_storage(&config.storage)?;
    let geocoder = NominatimGeocoder::new(&config.geocoder).map_err(InitializationError::from)?;
    let importer = Importer::new(
        RecordStore::from_config(&config.storage),
        geocoder,
        config.import.default_city,
    );

    let report = importer.import(file_name, &bytes).await?;
    info!(name: "import.cli.finished", file = %cli.file.display(), "import finished");
    println!(
        "created {} records ({} geocoded)",
        report.created.len(),
        report.geocoded
    );
    Ok(())
}
