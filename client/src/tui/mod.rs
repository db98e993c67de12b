pub mod login;

pub use login::run_login;
