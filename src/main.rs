use clap::Parser;
use file_browser_lib::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    file_browser_lib::run(Config::parse()).await
}
