pub mod account;
pub mod experience;
