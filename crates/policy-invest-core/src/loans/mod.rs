pub mod amortization;
pub mod financing;
