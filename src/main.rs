//! PageMark command-line tool.
//!
//! Maintenance commands against the local marker store:
//!
//! ```text
//! pagemark stats
//! pagemark export [FILE]     # stdout when FILE is omitted
//! pagemark import FILE
//! pagemark clear
//! ```

use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use pagemark::config::{init_logging, AppConfig};
use pagemark::database::SqliteStore;
use pagemark::managers::marker_library::{MarkerLibrary, MarkerLibraryTrait};
use serde_json::Value;

const USAGE: &str = "usage: pagemark <stats | export [FILE] | import FILE | clear>";

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    fs::create_dir_all(&config.data_dir)?;
    let library = MarkerLibrary::new(Arc::new(SqliteStore::open(config.db_path())?));

    match args.first().map(String::as_str) {
        Some("stats") => {
            let stats = library.stats()?;
            println!("Markers:  {}", stats.total_markers);
            println!("Pages:    {}", stats.total_pages);
            println!("Storage:  {} KB", stats.total_storage_kb);
        }
        Some("export") => {
            let json = serde_json::to_string_pretty(&library.export_all()?)?;
            match args.get(1) {
                Some(path) => {
                    fs::write(path, json)?;
                    eprintln!("Exported markers to {}", path);
                }
                None => println!("{}", json),
            }
        }
        Some("import") => {
            let path = args.get(1).ok_or(USAGE)?;
            let data: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
            library.import_all(&data)?;
            let stats = library.stats()?;
            println!("Imported {}; store now holds {} markers on {} pages", path, stats.total_markers, stats.total_pages);
        }
        Some("clear") => {
            library.clear_all()?;
            println!("All markers cleared");
        }
        _ => return Err(USAGE.into()),
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pagemark: {}", e);
            ExitCode::FAILURE
        }
    }
}
