//! # Hidden Parameter Classifier
//!
//! Decides how many leading formal parameters of a procedure are supplied from the
//! ambient session (the run mode, the active image, drawable and so on) instead of
//! being entered by the user. Hidden parameters always form a prefix.
//!
//! The grammar is:
//!
//! ```text
//! <hidden_prefix> ::= [run-mode] [image] [drawable] [layer] [channel] [vectors]
//! ```
//!
//! Each bracketed kind is consumed at most once and only in this order. Scanning
//! stops at the first kind that is out of order or already consumed, so
//! `[image, image]` hides one parameter and `[image, drawable, drawable]` hides two.

use crate::models::ParamKind;

/// Ambient kinds the scan may consume after the run mode, in grammar order.
const AMBIENT_ORDER: [ParamKind; 5] = [
    ParamKind::Image,
    ParamKind::Drawable,
    ParamKind::Layer,
    ParamKind::Channel,
    ParamKind::Vectors,
];

/// The result of scanning one procedure's formal parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Leading parameters that are hidden, including the run mode.
    pub hidden: usize,
    /// Hidden parameters that are not the run mode.
    pub nonrunmode_hidden: usize,
    /// The scan stopped at a parameter that is itself an ambient kind.
    pub trailing_ambient: bool,
}

/// Simple lexical scanner over a list of kinds.
/// Safe to use on an empty list: every lookahead misses.
struct KindScanner<'a> {
    kinds: &'a [ParamKind],
    token: usize,
    count: usize,
}

impl<'a> KindScanner<'a> {
    fn new(kinds: &'a [ParamKind]) -> Self {
        Self {
            kinds,
            token: 0,
            count: 0,
        }
    }

    fn next_kind(&self) -> Option<ParamKind> {
        self.kinds.get(self.token).copied()
    }

    fn advance(&mut self) {
        self.token += 1;
        self.count += 1;
    }

    /// Moves past the current token without counting it.
    fn skip(&mut self) {
        self.token += 1;
    }

    fn scan_ambient_prefix(&mut self) {
        for kind in AMBIENT_ORDER {
            if self.next_kind() == Some(kind) {
                self.advance();
            }
        }
    }
}

/// Counts the leading hidden parameters, including a leading run mode.
pub fn count_hidden_params(kinds: &[ParamKind]) -> usize {
    let mut scanner = KindScanner::new(kinds);
    if scanner.next_kind() == Some(ParamKind::RunMode) {
        scanner.advance();
    }
    scanner.scan_ambient_prefix();
    scanner.count
}

/// Counts the leading hidden parameters, ignoring a leading run mode.
///
/// Every plugin accepts a run mode, so only this count tells whether a procedure
/// actually needs objects from the session.
pub fn count_nonrunmode_hidden_params(kinds: &[ParamKind]) -> usize {
    let mut scanner = KindScanner::new(kinds);
    if scanner.next_kind() == Some(ParamKind::RunMode) {
        scanner.skip();
    }
    scanner.scan_ambient_prefix();
    scanner.count
}

/// Whether the list starts with the run-mode parameter.
pub fn has_runmode(kinds: &[ParamKind]) -> bool {
    kinds.first() == Some(&ParamKind::RunMode)
}

/// Runs both scans and flags a suspicious split.
///
/// A list like `[image, drawable, drawable]` leaves an ambient kind right after the
/// hidden prefix. The documented count is still returned; callers decide whether to
/// warn about it.
pub fn classify(kinds: &[ParamKind]) -> Classification {
    let hidden = count_hidden_params(kinds);
    let trailing_ambient = kinds.get(hidden).is_some_and(ParamKind::is_ambient);
    Classification {
        hidden,
        nonrunmode_hidden: count_nonrunmode_hidden_params(kinds),
        trailing_ambient,
    }
}

/// Every kind list of length up to `max_len` over the classifier's alphabet
/// plus a few visible kinds.
#[cfg(test)]
pub(crate) fn kind_lists_up_to(max_len: usize) -> Vec<Vec<ParamKind>> {
    let all = [
        ParamKind::RunMode,
        ParamKind::Image,
        ParamKind::Drawable,
        ParamKind::Layer,
        ParamKind::Channel,
        ParamKind::Vectors,
        ParamKind::Int32,
        ParamKind::String,
        ParamKind::Display,
    ];
    let mut lists: Vec<Vec<ParamKind>> = vec![vec![]];
    let mut frontier: Vec<Vec<ParamKind>> = vec![vec![]];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for list in &frontier {
            for kind in all {
                let mut extended = list.clone();
                extended.push(kind);
                next.push(extended);
            }
        }
        lists.extend(next.iter().cloned());
        frontier = next;
    }
    lists
}

#[cfg(test)]
mod tests {
    use super::*;
    use ParamKind::*;

    #[test]
    fn test_reference_table() {
        let cases: &[(&[ParamKind], usize)] = &[
            (&[Image], 1),
            (&[Image, Image], 1),
            (&[Image, Drawable], 2),
            (&[Image, Layer], 2),
            (&[Image, Channel], 2),
            (&[Image, Drawable, Drawable], 2),
            (&[Image, Drawable, Layer], 3),
            (&[Image, Drawable, Layer, Channel], 4),
        ];
        for (kinds, expected) in cases {
            assert_eq!(count_hidden_params(kinds), *expected, "kinds {:?}", kinds);
        }
    }

    #[test]
    fn test_drawable_alone_is_hidden() {
        assert_eq!(count_hidden_params(&[Drawable]), 1);
        assert_eq!(count_hidden_params(&[Drawable, Image]), 1);
    }

    #[test]
    fn test_runmode_prefix() {
        let kinds = [RunMode, Image, Drawable, String];
        assert_eq!(count_hidden_params(&kinds), 3);
        assert_eq!(count_nonrunmode_hidden_params(&kinds), 2);
        assert!(has_runmode(&kinds));
    }

    #[test]
    fn test_runmode_only_counts_in_first_position() {
        assert_eq!(count_hidden_params(&[Image, RunMode]), 1);
        assert_eq!(count_hidden_params(&[Int32, RunMode]), 0);
    }

    #[test]
    fn test_empty_and_literal_lists() {
        assert_eq!(count_hidden_params(&[]), 0);
        assert_eq!(count_nonrunmode_hidden_params(&[]), 0);
        assert_eq!(count_hidden_params(&[Int32, Image]), 0);
        assert_eq!(count_nonrunmode_hidden_params(&[RunMode, Float]), 0);
        assert!(!has_runmode(&[]));
    }

    #[test]
    fn test_vectors_last_in_order() {
        assert_eq!(
            count_hidden_params(&[RunMode, Image, Drawable, Layer, Channel, Vectors, Vectors]),
            6
        );
        // Out of order: vectors then layer stops after vectors.
        assert_eq!(count_hidden_params(&[Image, Vectors, Layer]), 2);
    }

    #[test]
    fn test_result_bounded_and_prefix() {
        let lists = kind_lists_up_to(3);
        for list in lists {
            let r = count_hidden_params(&list);
            assert!(r <= list.len(), "{:?}", list);
            assert!(count_nonrunmode_hidden_params(&list) <= r);
            // The hidden prefix only holds run-mode or ambient kinds.
            for kind in &list[..r] {
                assert!(*kind == RunMode || kind.is_ambient(), "{:?}", list);
            }
        }
    }

    #[test]
    fn test_classify_flags_trailing_ambient() {
        let suspicious = classify(&[RunMode, Image, Drawable, Drawable, Int32]);
        assert_eq!(suspicious.hidden, 3);
        assert_eq!(suspicious.nonrunmode_hidden, 2);
        assert!(suspicious.trailing_ambient);

        let clean = classify(&[RunMode, Image, Drawable, Float]);
        assert_eq!(clean.hidden, 3);
        assert!(!clean.trailing_ambient);

        let fully_hidden = classify(&[Image, Drawable]);
        assert!(!fully_hidden.trailing_ambient);
    }
}
