pub mod app;
pub mod state;
pub mod ui;

pub use app::App;
pub use ui::run_tui;
