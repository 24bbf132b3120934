//! Code balancing: id assignment and opening/closing pairing.
//!
//! The same LIFO algorithm runs incrementally while a fragment is built and
//! over a whole fragment after a split or join. Codes are visited in document
//! order:
//!
//! - standalone and isolated codes take the next id;
//! - an opening takes the next id and is pushed on the stack; until its
//!   closing arrives it is shown as a placeholder;
//! - a closing looks for the nearest stack entry that is its partner (same
//!   split hint, else same original id, else same category) and takes that id;
//!   without partner it is demoted to a placeholder with the next id.

use super::code::{Code, CodeRole, TagType};

/// Outcome of a balancing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceReport {
    /// Indices of paired codes left as placeholders (partner out of scope)
    pub demoted: Vec<usize>,
    /// Number of pairs matched
    pub paired: usize,
}

impl BalanceReport {
    /// Check if every paired code found its partner.
    pub fn is_clean(&self) -> bool {
        self.demoted.is_empty()
    }
}

/// Incremental balancing state of one fragment.
#[derive(Debug, Clone, Default)]
pub(crate) struct Balancer {
    last_id: i32,
    open: Vec<usize>,
}

impl Balancer {
    /// Rebuild the state from codes whose ids are already assigned.
    pub(crate) fn resume(codes: &[Code]) -> Self {
        let last_id = codes.iter().map(Code::id).max().unwrap_or(0).max(0);
        let open = codes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.role() == CodeRole::Opening && c.tag_type() == TagType::Placeholder)
            .map(|(i, _)| i)
            .collect();
        Self { last_id, open }
    }

    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    /// Assign the code at `index`, the last one appended so far.
    ///
    /// Returns `true` when a closing code found its opening.
    pub(crate) fn assign(&mut self, codes: &mut [Code], index: usize) -> bool {
        let (role, tag_type) = (codes[index].role(), codes[index].tag_type());
        if tag_type == TagType::Isolated || role == CodeRole::Standalone {
            let id = self.next_id();
            codes[index].set_id(id);
            return false;
        }

        match role {
            CodeRole::Opening => {
                let id = self.next_id();
                let code = &mut codes[index];
                code.set_id(id);
                code.set_tag_type(TagType::Placeholder);
                self.open.push(index);
                false
            }
            _ => {
                let partner = self
                    .open
                    .iter()
                    .rposition(|&o| is_partner(&codes[o], &codes[index]));
                match partner {
                    Some(pos) => {
                        let opener = self.open.remove(pos);
                        let id = codes[opener].id();
                        codes[opener].set_tag_type(TagType::Opening);
                        codes[opener].split_hint = None;
                        let closer = &mut codes[index];
                        closer.set_id(id);
                        closer.set_tag_type(TagType::Closing);
                        closer.split_hint = None;
                        true
                    }
                    None => {
                        let id = self.next_id();
                        codes[index].set_id(id);
                        codes[index].set_tag_type(TagType::Placeholder);
                        false
                    }
                }
            }
        }
    }
}

fn is_partner(opening: &Code, closing: &Code) -> bool {
    if let (Some(a), Some(b)) = (opening.split_hint, closing.split_hint) {
        return a == b;
    }
    match (&opening.original_id, &closing.original_id) {
        (Some(a), Some(b)) => a == b,
        _ => opening.category == closing.category,
    }
}

/// Balance a whole code list in document order, renumbering ids from 1.
pub(crate) fn balance_codes(codes: &mut [Code]) -> (Balancer, BalanceReport) {
    let mut balancer = Balancer::default();
    let mut report = BalanceReport::default();
    for index in 0..codes.len() {
        if balancer.assign(codes, index) {
            report.paired += 1;
        }
    }
    report.demoted = codes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_demoted())
        .map(|(i, _)| i)
        .collect();
    if !report.demoted.is_empty() {
        log::debug!("{} code(s) left without partner", report.demoted.len());
    }
    (balancer, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(codes: &[Code]) -> Vec<i32> {
        codes.iter().map(Code::id).collect()
    }

    fn types(codes: &[Code]) -> Vec<TagType> {
        codes.iter().map(Code::tag_type).collect()
    }

    #[test]
    fn test_nested_pairs() {
        let mut codes = vec![
            Code::opening("g", "<g1>"),
            Code::opening("g", "<g2>"),
            Code::closing("g", "</g2>"),
            Code::closing("g", "</g1>"),
        ];
        let (_, report) = balance_codes(&mut codes);
        assert_eq!(ids(&codes), vec![1, 2, 2, 1]);
        assert_eq!(
            types(&codes),
            vec![TagType::Opening, TagType::Opening, TagType::Closing, TagType::Closing]
        );
        assert!(report.is_clean());
        assert_eq!(report.paired, 2);
    }

    #[test]
    fn test_orphans_demoted() {
        let mut codes = vec![
            Code::closing("b", "</b>"),
            Code::placeholder("br", "<br/>"),
            Code::opening("i", "<i>"),
        ];
        let (_, report) = balance_codes(&mut codes);
        assert_eq!(ids(&codes), vec![1, 2, 3]);
        assert!(codes.iter().all(|c| c.tag_type() == TagType::Placeholder));
        assert_eq!(report.demoted, vec![0, 2]);
    }

    #[test]
    fn test_isolated_never_paired() {
        let mut codes = vec![
            Code::isolated(CodeRole::Opening, "b", "<b>"),
            Code::closing("b", "</b>"),
        ];
        balance_codes(&mut codes);
        assert_eq!(codes[0].tag_type(), TagType::Isolated);
        assert_eq!(codes[1].tag_type(), TagType::Placeholder);
        assert_eq!(ids(&codes), vec![1, 2]);
    }

    #[test]
    fn test_original_id_pairs_mixed_categories() {
        let mut codes = vec![
            Code::opening("bold", "<b>").with_original_id("7"),
            Code::opening("bold", "<b>").with_original_id("8"),
            Code::closing("bold", "</b>").with_original_id("7"),
            Code::closing("bold", "</b>").with_original_id("8"),
        ];
        let (_, report) = balance_codes(&mut codes);
        assert!(report.is_clean());
        assert_eq!(ids(&codes), vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_split_hint_wins() {
        let mut codes = vec![Code::opening("x", "<a>"), Code::opening("x", "<a>"), Code::closing("x", "</a>")];
        codes[0].split_hint = Some(1);
        codes[1].split_hint = Some(2);
        codes[2].split_hint = Some(1);
        balance_codes(&mut codes);
        assert_eq!(codes[0].tag_type(), TagType::Opening);
        assert_eq!(codes[1].tag_type(), TagType::Placeholder);
        assert_eq!(codes[2].id(), codes[0].id());
    }

    #[test]
    fn test_resume_keeps_pending_openings() {
        let mut codes = vec![Code::opening("b", "<b>")];
        balance_codes(&mut codes);
        let mut balancer = Balancer::resume(&codes);
        codes.push(Code::closing("b", "</b>"));
        assert!(balancer.assign(&mut codes, 1));
        assert_eq!(ids(&codes), vec![1, 1]);
        assert_eq!(types(&codes), vec![TagType::Opening, TagType::Closing]);
    }
}
