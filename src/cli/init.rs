use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path, DB_FILE};

pub fn run(data_dir: Option<String>, db_override: Option<&str>) -> Result<()> {
    if let Some(path) = db_override {
        let path = PathBuf::from(shellexpand_path(path));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        init_db(&get_connection(&path)?)?;
        println!("Initialized tazrim database at {}", path.display());
        return Ok(());
    }

    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let conn = get_connection(&resolved.join(DB_FILE))?;
    init_db(&conn)?;

    println!("Initialized tazrim at {}", resolved.display());
    Ok(())
}
