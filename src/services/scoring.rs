//! Percentage scoring of quiz answers.

use std::collections::BTreeMap;

use crate::db::operations::quiz::QuizQuestion;
use crate::services::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    /// Whole percentage in `0..=100`.
    pub percent: i64,
}

impl QuizScore {
    pub fn passes(&self, passing_score: i64) -> bool {
        self.percent >= passing_score
    }
}

/// Scores `answers` (question id -> chosen option) against `questions`.
///
/// An answer counts when its key equals a question id and the value equals
/// that question's correct answer exactly. Unknown ids are ignored.
pub fn score_answers(
    questions: &[QuizQuestion],
    answers: &BTreeMap<String, String>,
) -> Result<QuizScore, ServiceError> {
    let total = questions.len();
    if total == 0 {
        return Err(ServiceError::validation("Quiz has no questions"));
    }

    let correct = answers
        .iter()
        .filter(|(question_id, answer)| {
            questions
                .iter()
                .find(|question| &question.id == *question_id)
                .is_some_and(|question| question.correct_answer == **answer)
        })
        .count()
        .min(total);

    Ok(QuizScore {
        correct,
        total,
        percent: rounded_percent(correct, total),
    })
}

/// `round(100 * correct / total)` with halves rounded up, in integer math.
fn rounded_percent(correct: usize, total: usize) -> i64 {
    let correct = correct as u64;
    let total = total as u64;
    ((200 * correct + total) / (2 * total)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn question(id: &str, correct: &str) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            question: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct.to_string(),
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn all_correct_scores_hundred() {
        let questions = vec![question("1", "a"), question("2", "b")];
        let score = score_answers(&questions, &answers(&[("1", "a"), ("2", "b")])).unwrap();
        assert_eq!(score.percent, 100);
        assert_eq!(score.correct, 2);
    }

    #[test]
    fn one_of_three_rounds_to_thirty_three() {
        let questions = vec![question("1", "a"), question("2", "b"), question("3", "c")];
        let score = score_answers(&questions, &answers(&[("1", "a"), ("2", "a")])).unwrap();
        assert_eq!(score.percent, 33);
    }

    #[test]
    fn two_of_three_rounds_to_sixty_seven() {
        let questions = vec![question("1", "a"), question("2", "b"), question("3", "c")];
        let score = score_answers(&questions, &answers(&[("1", "a"), ("2", "b")])).unwrap();
        assert_eq!(score.percent, 67);
    }

    #[test]
    fn unknown_ids_and_case_differences_do_not_count() {
        let questions = vec![question("1", "Paris")];
        let score = score_answers(&questions, &answers(&[("1", "paris"), ("9", "Paris")])).unwrap();
        assert_eq!(score.percent, 0);
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = score_answers(&[], &answers(&[("1", "a")])).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        let score = QuizScore {
            correct: 7,
            total: 10,
            percent: 70,
        };
        assert!(score.passes(70));
        assert!(!score.passes(71));
    }

    proptest! {
        #[test]
        fn score_matches_rounded_ratio(total in 1usize..40, picks in proptest::collection::vec(any::<bool>(), 40)) {
            let questions: Vec<_> = (0..total).map(|i| question(&i.to_string(), "a")).collect();
            let submitted: BTreeMap<String, String> = (0..total)
                .map(|i| (i.to_string(), if picks[i] { "a" } else { "b" }.to_string()))
                .collect();
            let correct = (0..total).filter(|i| picks[*i]).count();

            let score = score_answers(&questions, &submitted).unwrap();
            prop_assert_eq!(score.correct, correct);
            prop_assert!((0..=100).contains(&score.percent));
            let expected = (100.0 * correct as f64 / total as f64).round() as i64;
            prop_assert_eq!(score.percent, expected);
        }

        #[test]
        fn all_or_nothing_bounds(total in 1usize..40) {
            let questions: Vec<_> = (0..total).map(|i| question(&i.to_string(), "a")).collect();
            let right: BTreeMap<String, String> = (0..total).map(|i| (i.to_string(), "a".to_string())).collect();
            let wrong: BTreeMap<String, String> = (0..total).map(|i| (i.to_string(), "b".to_string())).collect();

            prop_assert_eq!(score_answers(&questions, &right).unwrap().percent, 100);
            prop_assert_eq!(score_answers(&questions, &wrong).unwrap().percent, 0);
        }
    }
}
