pub mod annuity;
pub mod cash_flow;
pub mod fixed_income;
pub mod projection;

use serde::de::DeserializeOwned;

use crate::input;

pub type CommandResult = Result<serde_json::Value, Box<dyn std::error::Error>>;

/// Load a calculator input from `--input`, then piped stdin, then flags.
pub fn resolve_input<T, F>(path: Option<&str>, from_flags: F) -> Result<T, Box<dyn std::error::Error>>
where
    T: DeserializeOwned,
    F: FnOnce() -> Result<T, Box<dyn std::error::Error>>,
{
    if let Some(path) = path {
        return input::file::read_input(path);
    }
    if let Some(value) = input::stdin::read_stdin()? {
        return Ok(value);
    }
    from_flags()
}
