//! Terminal front-end for the term sheet validator.
pub mod shell;
pub mod terminal;
