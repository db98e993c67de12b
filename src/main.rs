use anyhow::Result;
use shoe_ledger::config::{self, Config};
use shoe_ledger::stat::{MemoryStore, ShoeStore, sample_closet};
use shoe_ledger::tui::{self, App};
use tracing::info;

fn print_summary(shoes: &[shoe_ledger::stat::Shoe]) {
    let closet = shoe_ledger::stat::Closet::new(shoes.to_vec());
    println!("== Shoe Summary ==\n");
    for s in closet.summary() {
        let life = s
            .life_remaining
            .map(|p| format!("{p:>5.1}%"))
            .unwrap_or_else(|| "    -".to_string());
        println!(
            "[{}] {:<10} {:<20} | {:<6} | first run {} | {:>8.2} mi over {:>3} runs | life left {}",
            s.index,
            s.brand,
            s.model,
            s.color.label(),
            s.first_run_date,
            s.miles,
            s.runs,
            life,
        );
    }
    println!("\n== Total: {:.2} miles ==", closet.total_miles());
}

fn main() -> Result<()> {
    config::load_dotenv();
    let cfg = Config::load()?;

    let store = MemoryStore::with_records(sample_closet()?.shoes);
    let rt = tokio::runtime::Runtime::new()?;
    let shoes = rt.block_on(store.list_records())?;

    if std::env::args().any(|a| a == "--summary") {
        print_summary(&shoes);
        return Ok(());
    }

    config::init_file_tracing(&cfg.log_path)?;
    info!(shoes = shoes.len(), "starting offline tracker");
    tui::run_tui(App::new(shoes, "offline"), &store, &rt)
}
