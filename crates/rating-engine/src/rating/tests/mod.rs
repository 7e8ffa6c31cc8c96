mod cache;
mod common;
mod conditions;
mod validation;
