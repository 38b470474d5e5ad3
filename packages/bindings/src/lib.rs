use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use tvm_core::TvmResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the JSON input, run the calculator and serialise its envelope.
fn run_json<I, O>(input_json: &str, calculate: impl FnOnce(&I) -> TvmResult<O>) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calculate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn project(input_json: String) -> NapiResult<String> {
    run_json(&input_json, tvm_core::projection::compound::project)
}

#[napi]
pub fn project_retirement(input_json: String) -> NapiResult<String> {
    run_json(&input_json, tvm_core::projection::retirement::project_retirement)
}

// ---------------------------------------------------------------------------
// Annuity
// ---------------------------------------------------------------------------

#[napi]
pub fn value_annuity(input_json: String) -> NapiResult<String> {
    run_json(&input_json, tvm_core::annuity::valuation::value_annuity)
}

// ---------------------------------------------------------------------------
// Fixed income
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_bond(input_json: String) -> NapiResult<String> {
    run_json(&input_json, tvm_core::fixed_income::bonds::analyze_bond)
}

// ---------------------------------------------------------------------------
// Cash-flow returns
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_returns(input_json: String) -> NapiResult<String> {
    run_json(&input_json, tvm_core::cash_flow::solver::solve_returns)
}
