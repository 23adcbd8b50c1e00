#![forbid(unsafe_code)]

//! Narrowing: the partial order on constraints.
//!
//! `a` narrows `b` when every value `a` permits is also permitted by `b`.
//! Constraints of unrelated kinds are incomparable.

use schema_ast::Constraint;

/// Outcome of comparing two constraints whose aliases may still be pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Narrows,
    NotNarrower,
    /// One side is an alias that has not been resolved yet.
    Undecided,
}

pub fn compare(a: &Constraint, b: &Constraint) -> Comparison {
    let (a, b) = (a.deref(), b.deref());
    match (a, b) {
        (Constraint::Alias { name: an, .. }, Constraint::Alias { name: bn, .. }) if an == bn => {
            Comparison::Narrows
        }
        (Constraint::Alias { .. }, _) | (_, Constraint::Alias { .. }) => Comparison::Undecided,
        _ if narrows(a, b) => Comparison::Narrows,
        _ => Comparison::NotNarrower,
    }
}

/// Structural equality after alias dereferencing.
pub fn equivalent(a: &Constraint, b: &Constraint) -> bool {
    let (a, b) = (a.deref(), b.deref());
    match (a, b) {
        (Constraint::Alias { name: an, .. }, Constraint::Alias { name: bn, .. }) => an == bn,
        (
            Constraint::List {
                element: ae,
                min_len: amin,
                max_len: amax,
            },
            Constraint::List {
                element: be,
                min_len: bmin,
                max_len: bmax,
            },
        ) => amin == bmin && amax == bmax && equivalent(ae, be),
        _ => a == b,
    }
}

/// `a` narrows `b`. Both sides are dereferenced; an unresolved alias only
/// narrows the same alias.
pub fn narrows(a: &Constraint, b: &Constraint) -> bool {
    let (a, b) = (a.deref(), b.deref());
    match (a, b) {
        (
            Constraint::String {
                min_len: amin,
                max_len: amax,
            },
            Constraint::String {
                min_len: bmin,
                max_len: bmax,
            },
        ) => within(*amin, *amax, *bmin, *bmax),

        (Constraint::Integer { min: amin, max: amax }, Constraint::Integer { min: bmin, max: bmax }) => {
            within(*amin, *amax, *bmin, *bmax)
        }

        (Constraint::Float { min: amin, max: amax }, Constraint::Float { min: bmin, max: bmax }) => {
            within(*amin, *amax, *bmin, *bmax)
        }

        (Constraint::Enum(av), Constraint::Enum(bv)) => av.iter().all(|v| bv.contains(v)),

        (Constraint::Enum(values), Constraint::String { min_len, max_len }) => values.iter().all(|v| {
            let len = v.chars().count() as u64;
            min_len.is_none_or(|lo| len >= lo) && max_len.is_none_or(|hi| len <= hi)
        }),

        (Constraint::Pattern(ap), Constraint::Pattern(bp)) => bp.iter().all(|p| ap.contains(p)),

        (
            Constraint::Pattern(_),
            Constraint::String {
                min_len: None,
                max_len: None,
            },
        ) => true,

        (Constraint::Timestamp { format: af }, Constraint::Timestamp { format: bf }) => {
            bf.is_none() || af == bf
        }

        (Constraint::Vector { dimensions: ad }, Constraint::Vector { dimensions: bd }) => ad == bd,

        (
            Constraint::List {
                element: ae,
                min_len: amin,
                max_len: amax,
            },
            Constraint::List {
                element: be,
                min_len: bmin,
                max_len: bmax,
            },
        ) => within(*amin, *amax, *bmin, *bmax) && narrows(ae, be),

        (Constraint::Boolean, Constraint::Boolean)
        | (Constraint::Date, Constraint::Date)
        | (Constraint::Uuid, Constraint::Uuid) => true,

        (Constraint::Alias { name: an, .. }, Constraint::Alias { name: bn, .. }) => an == bn,

        _ => false,
    }
}

/// Kinds a primary-key property may have. Pending aliases answer `None`.
pub fn primary_key_kind_ok(c: &Constraint) -> Option<bool> {
    match c.deref() {
        Constraint::Alias { .. } => None,
        Constraint::String { .. } | Constraint::Uuid | Constraint::Date | Constraint::Timestamp { .. } => {
            Some(true)
        }
        _ => Some(false),
    }
}

fn within<T: PartialOrd + Copy>(amin: Option<T>, amax: Option<T>, bmin: Option<T>, bmax: Option<T>) -> bool {
    let lo_ok = match (amin, bmin) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(a), Some(b)) => a >= b,
    };
    let hi_ok = match (amax, bmax) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(a), Some(b)) => a <= b,
    };
    lo_ok && hi_ok
}
