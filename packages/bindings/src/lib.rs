use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use policy_invest_core::PolicyInvestResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the JSON input, run `f`, and serialise its output.
fn json_call<I, O, F>(input_json: &str, f: F) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(&I) -> PolicyInvestResult<O>,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = f(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_investment(input_json: String) -> NapiResult<String> {
    json_call(&input_json, policy_invest_core::analysis::analyze_investment)
}

#[napi]
pub fn grade_investment(input_json: String) -> NapiResult<String> {
    json_call(&input_json, policy_invest_core::grading::analyze_and_grade)
}

// ---------------------------------------------------------------------------
// Scenarios & sensitivity
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    json_call(&input_json, policy_invest_core::scenarios::compare_scenarios)
}

#[napi]
pub fn run_sensitivity(input_json: String) -> NapiResult<String> {
    json_call(&input_json, policy_invest_core::scenarios::run_sensitivity)
}

#[napi]
pub fn sensitivity_grid(input_json: String) -> NapiResult<String> {
    json_call(&input_json, policy_invest_core::scenarios::two_way_sensitivity)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn build_loan_schedule(input_json: String) -> NapiResult<String> {
    json_call(
        &input_json,
        policy_invest_core::loans::amortization::build_loan_schedule,
    )
}
