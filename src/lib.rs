//! An in-process C11 compiler and dynamic linker for x86-64.
//!
//! `jitcc` compiles one or more C translation units directly to native
//! machine code held in executable memory, resolves references between
//! units and to host-provided symbols, and exposes the resulting
//! functions for direct call by the embedding program.
//!
//! The compiler supports incremental recompilation: when a source file
//! changes, only that unit is recompiled and relinked, and mutable
//! global data of unchanged units keeps its address and contents across
//! updates.
//!
//! # Example
//! ```no_run
//! use jitcc::{Context, Environment};
//!
//! let mut env = Environment::new(vec!["main.c".to_string()]);
//! env.load_file = Some(Box::new(|path| std::fs::read(path).ok()));
//! let mut ctx = Context::new(env);
//! if ctx.update(None, None) {
//!     let main = ctx.find_export("main").unwrap();
//!     let main: extern "C" fn() -> i32 = unsafe { std::mem::transmute(main) };
//!     assert_eq!(main(), 0);
//! }
//! ```

mod arena;
mod asm;
mod codegen;
mod context;
mod error;
mod lex;
mod link;
mod memory;
mod parse;
mod preprocess;
mod source;
mod ty;
mod util;

pub use crate::context::{Context, Environment};
pub use crate::error::{Error, ErrorKind, Result};

/// The calling convention and data layout the compiler emits code for.
///
/// Code can be generated for either target on any host, but only code
/// matching the host can be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The System V AMD64 ABI (Linux, macOS, BSDs).
    SysV,
    /// The Microsoft x64 ABI.
    Win64,
}

impl Target {
    /// The target matching the host platform.
    pub fn host() -> Target {
        if cfg!(windows) {
            Target::Win64
        } else {
            Target::SysV
        }
    }

    pub(crate) fn is_win(self) -> bool {
        self == Target::Win64
    }
}
