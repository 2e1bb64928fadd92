pub mod dscr;
