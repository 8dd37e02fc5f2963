//! Band-partitioned composition for nested highlighters (spec.md §4.4:
//! "Nested highlighters ... compose via state-space partitioning: the
//! outer highlighter reserves a band of integers ... and delegates by
//! subtracting the base before calling the inner calculator and adding it
//! back on return").

use core_text::Line;

use crate::Highlighter;

/// Wraps an inner [`Highlighter`] so its state space occupies
/// `[base, base + width)` from the outer highlighter's point of view.
///
/// The outer highlighter calls [`BandDelegate::enter`]/[`BandDelegate::is_in_band`]
/// to decide whether the current carry state belongs to this band, then
/// `calculate` to run the inner highlighter with the state translated back
/// to its own `0..width` space and the result translated forward again.
pub struct BandDelegate {
    base: i32,
    width: i32,
    inner: std::sync::Arc<dyn Highlighter>,
}

impl BandDelegate {
    pub fn new(base: i32, width: i32, inner: std::sync::Arc<dyn Highlighter>) -> Self {
        assert!(width > 0, "band width must be positive");
        BandDelegate { base, width, inner }
    }

    /// The state an outer highlighter should carry when *entering* this
    /// band for the first time (inner highlighter starting fresh).
    pub fn enter(&self) -> i32 {
        self.base
    }

    /// Whether `state` (as seen by the outer highlighter) falls in this
    /// delegate's reserved band.
    pub fn is_in_band(&self, state: i32) -> bool {
        state >= self.base && state < self.base + self.width
    }

    /// Run the inner highlighter on `line`, translating `state` into the
    /// inner highlighter's own `0..width` space and the returned state
    /// back into the outer band. An inner exit state of `-1` ("inner
    /// highlighter finished this line with no continuation") maps back to
    /// `-1` in the outer space too, signaling the outer highlighter that
    /// the nested region has ended and normal outer-state processing can
    /// resume on the following line.
    pub fn calculate(&self, line: &mut Line, state: i32) -> i32 {
        let local = if self.is_in_band(state) {
            state - self.base
        } else {
            0
        };
        let next_local = self.inner.calculate(line, local);
        if next_local < 0 {
            -1
        } else {
            self.base + next_local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use core_text::{Line, SyntaxClass};

    /// Toy highlighter: paints the whole line as a string while `state >
    /// 0`, decrementing a "lines remaining" counter; used only to exercise
    /// band translation in tests below.
    struct CountdownHighlighter;
    impl Highlighter for CountdownHighlighter {
        fn calculate(&self, line: &mut Line, state: i32) -> i32 {
            let mut scanner = Scanner::new(line);
            while !scanner.at_end() {
                scanner.paint(SyntaxClass::String);
                scanner.advance(1);
            }
            if state <= 1 { -1 } else { state - 1 }
        }
    }

    #[test]
    fn band_delegate_round_trips_state() {
        let delegate = BandDelegate::new(100, 100, std::sync::Arc::new(CountdownHighlighter));
        assert!(delegate.is_in_band(100));
        assert!(!delegate.is_in_band(5));

        let mut line = Line::from_str("abc");
        // Enter the band with 2 "lines remaining" in inner-local terms.
        let next = delegate.calculate(&mut line, 100 + 2);
        assert_eq!(next, 100 + 1);
        assert_eq!(line.cell(0).unwrap().flags().syntax_class(), SyntaxClass::String);

        let mut line2 = Line::from_str("def");
        let next2 = delegate.calculate(&mut line2, next);
        assert_eq!(next2, -1);
    }
}
