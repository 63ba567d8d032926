//! One-shot board commands

use mcuport_core::{Dispatcher, Operation};

/// Dispatch `operation` and wait for the reconnect that follows it
///
/// Returns whether the operation succeeded. The outcome itself has already
/// been printed by the dispatcher.
pub fn run_operation(
    dispatcher: &Dispatcher,
    operation: Operation,
) -> Result<bool, Box<dyn std::error::Error>> {
    let outcome = dispatcher.dispatch(operation);
    dispatcher.manager().wait_background();
    println!();

    Ok(outcome?.is_success())
}
