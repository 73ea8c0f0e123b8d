mod main_flow_tests;
mod replay_tests;
