pub mod analysis;
pub mod loans;
pub mod returns;
pub mod scenarios;
