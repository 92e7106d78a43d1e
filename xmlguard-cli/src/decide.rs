//! `decide` subcommand: verdict for a single entity reference

use xmlguard_core::EntityGuard;

/// Print the guard's verdict for one reference. Returns whether it was allowed.
pub fn run_decide(public_id: Option<&str>, system_id: Option<&str>) -> bool {
    match EntityGuard::INSTANCE.decide(public_id, system_id) {
        Ok(()) => {
            println!("allow");
            true
        }
        Err(e) => {
            tracing::info!(error = %e, "reference denied");
            println!("{e}");
            false
        }
    }
}
