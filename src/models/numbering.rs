//! Deterministic hierarchical numbering of the question catalog.
//!
//! Pure functions: ordered sections + questions in, dotted numbers out
//! ("1", "1.2", "1.2.3"). Display and exports rely on the numbering being
//! stable for a given ordering, so no I/O happens here.

use serde::Serialize;

use super::question::Question;
use super::section::SectionTree;

#[derive(Debug, Clone, Serialize)]
pub struct NumberedQuestion {
    pub number: String,
    pub question: Question,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberedSection {
    pub number: String,
    pub section_id: i64,
    pub name: String,
    pub questions: Vec<NumberedQuestion>,
    pub subsections: Vec<NumberedSection>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct NumberedCatalog {
    pub sections: Vec<NumberedSection>,
    /// Questions without a section, numbered as top-level entries after the
    /// last section.
    pub unsectioned: Vec<NumberedQuestion>,
}

fn number_questions(prefix: &str, questions: Vec<Question>) -> Vec<NumberedQuestion> {
    questions
        .into_iter()
        .enumerate()
        .map(|(i, question)| NumberedQuestion {
            number: format!("{prefix}.{}", i + 1),
            question,
        })
        .collect()
}

/// Build the numbered catalog for a question set. `questions` must already
/// be in display order (section, sort_order, id); sections come ordered from
/// the section tree query.
pub fn build_catalog(tree: Vec<SectionTree>, questions: Vec<Question>) -> NumberedCatalog {
    let mut by_section: std::collections::HashMap<i64, Vec<Question>> =
        std::collections::HashMap::new();
    let mut unsectioned_raw = Vec::new();
    for q in questions {
        match q.section_id {
            Some(section_id) => by_section.entry(section_id).or_default().push(q),
            None => unsectioned_raw.push(q),
        }
    }

    let mut sections = Vec::new();
    for (si, top) in tree.into_iter().enumerate() {
        let number = format!("{}", si + 1);
        let own_questions =
            number_questions(&number, by_section.remove(&top.section.id).unwrap_or_default());

        let subsections = top
            .subsections
            .into_iter()
            .enumerate()
            .map(|(vi, sub)| {
                let sub_number = format!("{number}.{}", vi + 1);
                let questions =
                    number_questions(&sub_number, by_section.remove(&sub.id).unwrap_or_default());
                NumberedSection {
                    number: sub_number,
                    section_id: sub.id,
                    name: sub.name,
                    questions,
                    subsections: Vec::new(),
                }
            })
            .collect();

        sections.push(NumberedSection {
            number,
            section_id: top.section.id,
            name: top.section.name,
            questions: own_questions,
            subsections,
        });
    }

    let base = sections.len();
    let unsectioned = unsectioned_raw
        .into_iter()
        .enumerate()
        .map(|(i, question)| NumberedQuestion {
            number: format!("{}", base + i + 1),
            question,
        })
        .collect();

    NumberedCatalog { sections, unsectioned }
}
