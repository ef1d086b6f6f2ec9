//! Rewrite planner.
//!
//! Turns one [`CastSite`] and its [`CastKind`] into the byte-range edits that
//! rewrite `(T)expr` into `keyword<T>(expr)`.

use crate::classify::CastKind;
use crate::fix::Edit;
use crate::types::CType;
use serde::Serialize;
use smallvec::SmallVec;

/// Where a cast expression comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CastOrigin {
    /// Written directly in the file.
    #[default]
    Source,
    /// Produced by, or an argument of, a macro expansion.
    MacroExpansion,
    /// A conversion to `void` that discards a value on purpose.
    DiscardedValue,
}

/// The operand of a cast, as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    /// First byte of the operand's first token.
    pub start: usize,
    /// One past the last byte of the operand's last token.
    pub end: usize,
    /// The operand is a single parenthesized expression.
    pub parenthesized: bool,
}

/// One C-style cast found in a translation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CastSite<T = CType> {
    /// Byte offset of the `(` opening the written type.
    pub lparen: usize,
    /// Byte offset of the `)` closing the written type.
    pub rparen: usize,
    /// Source text between the delimiters, verbatim.
    pub dest_type_text: String,
    /// The converted expression.
    pub operand: Operand,
    /// Static type of the operand.
    pub source_type: T,
    /// Destination type.
    pub dest_type: T,
    /// Whether the site may be rewritten at all.
    pub origin: CastOrigin,
    /// 1-based line of the cast.
    pub line: usize,
}

/// Why a site produced no plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The cast comes from a macro expansion.
    #[error("cast originates from a macro expansion")]
    MacroExpansion,
    /// The cast discards a value (`(void)expr`).
    #[error("cast discards a value")]
    DiscardedValue,
    /// The recorded positions are not in source order.
    #[error("cast site has inconsistent source positions")]
    Malformed,
}

/// Edits for one cast site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    kind: CastKind,
    edits: SmallVec<[Edit; 2]>,
}

impl RewritePlan {
    /// Keyword chosen for the site.
    #[must_use]
    pub fn kind(&self) -> CastKind {
        self.kind
    }

    /// The prefix replacement, followed by the closing-paren insertion if any.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Whether the plan adds parentheses around the operand.
    #[must_use]
    pub fn wraps_operand(&self) -> bool {
        self.edits.len() > 1
    }

    /// Consumes the plan, yielding its edits.
    #[must_use]
    pub fn into_edits(self) -> SmallVec<[Edit; 2]> {
        self.edits
    }
}

/// Plans the rewrite of `site` with the keyword of `kind`.
///
/// # Errors
///
/// Returns the [`SkipReason`] when the site must be left untouched.
pub fn plan<T>(site: &CastSite<T>, kind: CastKind) -> Result<RewritePlan, SkipReason> {
    match site.origin {
        CastOrigin::MacroExpansion => return Err(SkipReason::MacroExpansion),
        CastOrigin::DiscardedValue => return Err(SkipReason::DiscardedValue),
        CastOrigin::Source => {}
    }
    if !(site.lparen < site.rparen
        && site.rparen < site.operand.start
        && site.operand.start <= site.operand.end)
    {
        return Err(SkipReason::Malformed);
    }

    let mut replacement = format!("{}<{}>", kind.keyword(), site.dest_type_text);
    let mut edits = SmallVec::new();

    if site.operand.parenthesized {
        edits.push(Edit::new(site.lparen, site.operand.start, replacement));
    } else {
        replacement.push('(');
        edits.push(Edit::new(site.lparen, site.operand.start, replacement));
        edits.push(Edit::insert(site.operand.end, ")"));
    }

    Ok(RewritePlan { kind, edits })
}
