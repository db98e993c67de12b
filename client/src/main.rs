mod config;
mod stat;
mod tui;

use anyhow::Result;
use shoe_ledger::stat::ShoeStore;
use shoe_ledger::tui::App;
use tracing::info;

use crate::config::Config;
use crate::stat::HttpStore;

fn main() -> Result<()> {
    shoe_ledger::config::load_dotenv();
    let cfg = Config::load()?;
    shoe_ledger::config::init_file_tracing(&cfg.log_path)?;

    let rt = tokio::runtime::Runtime::new()?;
    let Some(session) = tui::run_login(&rt, &cfg.api_url, cfg.request_timeout)? else {
        info!("quit before signing in");
        return Ok(());
    };

    let store = HttpStore::new(&cfg.api_url, session.token, cfg.request_timeout)?;
    let shoes = rt.block_on(store.list_records())?;
    info!(user_id = %session.user_id, shoes = shoes.len(), "loaded closet");
    shoe_ledger::tui::run_tui(App::new(shoes, session.email), &store, &rt)
}
