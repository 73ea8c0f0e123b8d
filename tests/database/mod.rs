mod crash_simulation_tests;
mod test_helpers;
mod transaction_tests;
