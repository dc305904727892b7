//! One-shot maintenance jobs run by `cattlefund-worker`.

pub mod investor_accounts;
pub mod raised_amounts;

pub use investor_accounts::{run_link_investor_accounts, LinkSummary};
pub use raised_amounts::run_recompute_raised;
