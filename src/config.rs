use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4444;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";
const DEFAULT_BASE_DIR_NAME: &str = "File Browser Test";

#[derive(Parser, Debug, Clone)]
#[command(name = "file-browser", version, about = "HTTP backend for a browser file manager")]
pub struct Config {
    #[arg(
        short = 'd',
        long,
        env = "FILE_BROWSER_BASE_PATH",
        help = "Directory exposed to clients (defaults to '<Documents>/File Browser Test')"
    )]
    pub base_path: Option<PathBuf>,

    #[arg(
        short = 'b',
        long,
        env = "FILE_BROWSER_HOST",
        default_value = "0.0.0.0",
        help = "Bind address"
    )]
    pub host: IpAddr,

    #[arg(
        short = 'p',
        long,
        env = "FILE_BROWSER_PORT",
        default_value_t = DEFAULT_PORT,
        help = "Listening port"
    )]
    pub port: u16,

    #[arg(
        long,
        env = "FILE_BROWSER_CORS_ORIGIN",
        default_value = DEFAULT_CORS_ORIGIN,
        help = "The single origin allowed by CORS"
    )]
    pub cors_origin: String,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Configured base path, or the default under the user's documents dir.
    pub fn base_path(&self) -> Option<PathBuf> {
        self.base_path.clone().or_else(default_base_path)
    }
}

fn default_base_path() -> Option<PathBuf> {
    let user_dirs = directories::UserDirs::new()?;
    let documents = user_dirs
        .document_dir()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| user_dirs.home_dir().join("Documents"));
    Some(documents.join(DEFAULT_BASE_DIR_NAME))
}
