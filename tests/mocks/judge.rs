//! Mock answer judges

use cracklist::AnswerJudge;

/// Treats every answer as valid; duplicates match case-insensitively
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllJudge;

impl AnswerJudge for AcceptAllJudge {
    fn is_answer_valid(&self, _letter: char, _answer: &str) -> bool {
        true
    }

    fn answers_equivalent(&self, a: &str, b: &str) -> bool {
        a.trim().eq_ignore_ascii_case(b.trim())
    }
}

/// Requires the answer to start with the card's letter
#[derive(Debug, Clone, Copy, Default)]
pub struct StartsWithJudge;

impl AnswerJudge for StartsWithJudge {
    fn is_answer_valid(&self, letter: char, answer: &str) -> bool {
        answer
            .chars()
            .next()
            .map_or(false, |c| c.eq_ignore_ascii_case(&letter))
    }

    fn answers_equivalent(&self, a: &str, b: &str) -> bool {
        a.trim().eq_ignore_ascii_case(b.trim())
    }
}
