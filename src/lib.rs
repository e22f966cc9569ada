// Library entry point shared by the CLI and the tests
pub mod commands;
