//! Multiple-choice options for the current question.
//!
//! Options are just candidate answer texts. Whatever the learner picks goes
//! through [`QuizSession::submit_answer`] like a typed answer.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::model::QuizSession;

/// Up to `count` distinct options for the current question, in random order.
///
/// The expected answer is always among them; distractors are other entries'
/// expected answers for the same mode. Returns fewer options when the list has
/// too few distinct answers, and nothing once the quiz is complete.
pub fn build_choices<R: Rng + ?Sized>(
    session: &QuizSession,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let Some(entry) = session.current_entry() else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }

    let mode = session.mode();
    let expected = mode.expected_answer(entry);

    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(fold(expected));

    let mut pool: Vec<&str> = session
        .vocabulary()
        .iter()
        .map(|e| mode.expected_answer(e))
        .filter(|answer| seen.insert(fold(answer)))
        .collect();
    pool.shuffle(rng);

    let mut options: Vec<String> = pool
        .into_iter()
        .take(count - 1)
        .map(str::to_owned)
        .collect();
    options.push(expected.to_owned());
    options.shuffle(rng);
    options
}

fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}
