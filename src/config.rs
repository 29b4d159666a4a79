//! Server Configuration
//! Mission: Command-line flags with environment fallbacks

use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(name = "rollcall")]
#[command(about = "Rollcall - school attendance records API")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind: String,

    /// SQLite database file. Relative paths resolve against the crate directory.
    #[arg(long, env = "DATABASE_PATH", default_value = "rollcall.db")]
    pub database_path: String,

    /// Allowed browser origin for CORS ("*" allows any origin)
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    /// bcrypt work factor for stored secrets
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,
}

impl Config {
    /// Database path after resolving relative paths against the crate directory.
    pub fn resolved_database_path(&self) -> String {
        resolve_data_path(Path::new(env!("CARGO_MANIFEST_DIR")), &self.database_path)
    }
}

fn resolve_data_path(base: &Path, raw: &str) -> String {
    let p = PathBuf::from(raw.trim());
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }
    base.join(p).to_string_lossy().to_string()
}
