//! `lockstep-template` — nested value templates with typed holes.
//!
//! A user of the simulation describes *which* readings they want and *in what
//! shape* they want them by building a [`Template`]: an arbitrary nesting of
//! mappings, sequences and fixed-arity tuples whose leaves are holes.  The
//! simulation fills the holes — once with engine-assigned handles when the
//! run starts, and then with fresh scalar values at every timestep.
//!
//! The traversal operations are pure: the input template is never mutated,
//! a structurally parallel copy is produced, and a failing resolution returns
//! no partial result.
//!
//! | Module       | Contents                                         |
//! |--------------|--------------------------------------------------|
//! | [`template`] | `Template<L>` and its traversal operations       |
//! | [`path`]     | `Path` / `Step` — leaf addresses within a template |

pub mod path;
pub mod template;

#[cfg(test)]
mod tests;

pub use path::{Path, Step};
pub use template::Template;
