//! Diagnostic trace emitted by the scorer.
//!
//! A trace is three sections in fixed order, each introduced by a
//! `==Heading==` line:
//!
//! ```text
//! ==Progress==
//! enwiki: batch 1 of 2 starting at page ID 12
//! ==Contributions==
//! Alice edited [[enwiki:Dogs]] (page 12, rev 901) weight=1.842
//! ==Scores==
//! Alice: edits=1 pages=1 contribution=1.842 edit_count=40 score=252
//! ```
//!
//! Lines are only built when a sink is installed.

/// Receives trace lines in order.
pub type DebugSink = Box<dyn FnMut(&str) + Send>;

pub const PROGRESS_HEADING: &str = "==Progress==";
pub const CONTRIBUTIONS_HEADING: &str = "==Contributions==";
pub const SCORES_HEADING: &str = "==Scores==";

/// Collected lines of one scorer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    pub progress: Vec<String>,
    pub contributions: Vec<String>,
    pub scores: Vec<String>,
}

impl Trace {
    /// Append another trace's lines section by section.
    pub fn absorb(&mut self, other: Self) {
        self.progress.extend(other.progress);
        self.contributions.extend(other.contributions);
        self.scores.extend(other.scores);
    }

    /// Send every section, heading first, to `sink`.
    pub fn emit(&self, sink: &mut dyn FnMut(&str)) {
        for (heading, lines) in [
            (PROGRESS_HEADING, &self.progress),
            (CONTRIBUTIONS_HEADING, &self.contributions),
            (SCORES_HEADING, &self.scores),
        ] {
            sink(heading);
            for line in lines {
                sink(line.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trace_still_emits_all_headings() {
        let mut lines = Vec::new();
        Trace::default().emit(&mut |line: &str| lines.push(line.to_string()));
        assert_eq!(lines, vec![PROGRESS_HEADING, CONTRIBUTIONS_HEADING, SCORES_HEADING]);
    }

    #[test]
    fn absorb_keeps_section_order() {
        let mut first = Trace {
            progress: vec!["p1".into()],
            contributions: vec!["c1".into()],
            scores: Vec::new(),
        };
        first.absorb(Trace {
            progress: vec!["p2".into()],
            contributions: Vec::new(),
            scores: vec!["s1".into()],
        });

        let mut lines = Vec::new();
        first.emit(&mut |line: &str| lines.push(line.to_string()));
        assert_eq!(
            lines,
            vec![
                PROGRESS_HEADING,
                "p1",
                "p2",
                CONTRIBUTIONS_HEADING,
                "c1",
                SCORES_HEADING,
                "s1"
            ]
        );
    }
}
