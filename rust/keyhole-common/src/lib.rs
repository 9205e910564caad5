#![warn(missing_docs)]

//! Light weight helpers shared by the other keyhole crates: cross-target
//! `Send`/`Sync` bounds, a shared interior mutability cell and (behind the
//! `helpers` feature) an in-process emulator of the remote API used by
//! integration tests.

mod sync;
pub use sync::*;

#[cfg(all(feature = "helpers", not(target_arch = "wasm32")))]
pub mod helpers;
