// Not every helper is used in every test binary
#![allow(unused_imports, dead_code)]

mod fake_store;
pub use fake_store::*;
mod test_setup;
pub use test_setup::*;
