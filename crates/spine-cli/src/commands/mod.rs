pub mod check;
pub mod inspect;
pub mod registry;
pub mod run;
