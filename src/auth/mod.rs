pub mod accounts;
pub mod extract;
