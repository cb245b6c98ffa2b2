//! Device interfaces
//!
//! The boundary layer never talks to hardware directly; these are the
//! narrow interfaces the embedding kernel's drivers implement:
//! - No panics on invalid input (return errors)
//! - Blocking semantics stated explicitly where they exist

pub mod console;
pub mod power;

pub use console::{Console, ConsoleWriter};
pub use power::Power;
