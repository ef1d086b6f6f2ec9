//! Cast classifier.
//!
//! Decides whether a C-style cast only removes `const` through an otherwise
//! identical pointer or reference spine (rendered as `const_cast`) or is any
//! other conversion (rendered as `static_cast`).

use crate::types::{TypeModel, TypeShape};
use serde::Serialize;
use std::fmt;

/// Verdict of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CastKind {
    /// Constness removal through a matching pointer/reference chain.
    Qualification,
    /// Any other conversion.
    General,
}

impl CastKind {
    /// The named-cast keyword this verdict is rendered with.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Qualification => "const_cast",
            Self::General => "static_cast",
        }
    }
}

impl fmt::Display for CastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Classifies a conversion from `source` to `dest`.
///
/// Both types are canonicalized first, so top-level qualifiers never matter.
/// The walk then steps through pointees (or referents) of both sides in
/// lock-step. The first level where the source is `const` and the destination
/// is not decides the result: `Qualification` if both levels still have the
/// same shape, `General` otherwise. A walk that runs out of matching
/// indirections, or switches between pointer and reference stepping, yields
/// `General`.
pub fn classify<M: TypeModel>(model: &M, source: &M::Type, dest: &M::Type) -> CastKind {
    let mut source = model.canonical(source);
    let mut dest = model.canonical(dest);
    let mut chain: Option<TypeShape> = None;

    loop {
        let source_shape = model.shape(&source);
        let dest_shape = model.shape(&dest);

        if model.is_const(&source) && !model.is_const(&dest) {
            return if source_shape == dest_shape {
                CastKind::Qualification
            } else {
                CastKind::General
            };
        }

        let step = match (source_shape, dest_shape) {
            (TypeShape::Pointer, TypeShape::Pointer) => TypeShape::Pointer,
            (TypeShape::Reference, TypeShape::Reference) => TypeShape::Reference,
            _ => return CastKind::General,
        };
        if chain.is_some_and(|kind| kind != step) {
            return CastKind::General;
        }
        chain = Some(step);

        match (
            model.strip_indirection(&source),
            model.strip_indirection(&dest),
        ) {
            (Some(next_source), Some(next_dest)) => {
                source = next_source;
                dest = next_dest;
            }
            _ => return CastKind::General,
        }
    }
}
