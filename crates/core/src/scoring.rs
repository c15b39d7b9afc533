//! Quiz scoring: pure comparison of submitted answers against a quiz key.

use thiserror::Error;

use crate::model::{QuizKey, QuizResult};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons a submission is malformed. Nothing is ever clamped or skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("expected {expected} answers, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("question {index} was not answered")]
    Unanswered { index: usize },

    #[error("answer {value} for question {index} is out of range for {options} options")]
    OptionOutOfRange {
        index: usize,
        value: usize,
        options: usize,
    },
}

//
// ─── SCORING ───────────────────────────────────────────────────────────────────
//

/// Scores `answers` against `quiz_key`.
///
/// Every question is checked in ascending order; positions whose answer
/// differs from the correct option are collected into `missed_indices`. The
/// score is the percentage of matches rounded to the nearest whole number,
/// with exact halves rounding up (1 of 8 correct is 12.5%, scored 13).
///
/// # Errors
///
/// Returns `SubmissionError` if the answer count differs from the quiz length,
/// any answer is missing, or any answer is not a valid option index. Validation
/// completes before any comparison takes place.
pub fn score(quiz_key: &QuizKey, answers: &[Option<usize>]) -> Result<QuizResult, SubmissionError> {
    let answers = validate(quiz_key, answers)?;

    let missed_indices: Vec<usize> = quiz_key
        .iter()
        .zip(&answers)
        .enumerate()
        .filter(|(_, (question, answer))| question.correct_option_index() != **answer)
        .map(|(index, _)| index)
        .collect();

    let total = quiz_key.len();
    let correct = total - missed_indices.len();
    Ok(QuizResult::new(
        rounded_percentage(correct, total),
        missed_indices,
        total,
    ))
}

fn validate(quiz_key: &QuizKey, answers: &[Option<usize>]) -> Result<Vec<usize>, SubmissionError> {
    if answers.len() != quiz_key.len() {
        return Err(SubmissionError::LengthMismatch {
            expected: quiz_key.len(),
            actual: answers.len(),
        });
    }

    quiz_key
        .iter()
        .zip(answers)
        .enumerate()
        .map(|(index, (question, answer))| {
            let value = answer.ok_or(SubmissionError::Unanswered { index })?;
            let options = question.options().len();
            if value >= options {
                return Err(SubmissionError::OptionOutOfRange {
                    index,
                    value,
                    options,
                });
            }
            Ok(value)
        })
        .collect()
}

/// `round_half_up(100 * correct / total)` in integer arithmetic.
fn rounded_percentage(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (200 * correct + total) / (2 * total);
    // correct <= total keeps pct within 0..=100
    u8::try_from(pct).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuizQuestion;

    fn key(correct: &[usize]) -> QuizKey {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let options = (0..4).map(|o| format!("q{i} option {o}")).collect();
                QuizQuestion::new(format!("Question {i}"), options, c).unwrap()
            })
            .collect();
        QuizKey::new(questions).unwrap()
    }

    fn answered(values: &[usize]) -> Vec<Option<usize>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let key = key(&[0, 1, 2, 3]);
        let result = score(&key, &answered(&[0, 1, 2, 3])).unwrap();
        assert_eq!(result.score(), 100);
        assert!(result.missed_indices().is_empty());
        assert_eq!(result.answered_count(), 4);
    }

    #[test]
    fn misses_are_collected_in_order() {
        let key = key(&[0, 1, 2, 3]);
        let result = score(&key, &answered(&[0, 0, 2, 0])).unwrap();
        assert_eq!(result.score(), 50);
        assert_eq!(result.missed_indices(), &[1, 3]);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(rounded_percentage(1, 3), 33);
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(1, 8), 13);
        assert_eq!(rounded_percentage(3, 8), 38);
        assert_eq!(rounded_percentage(0, 5), 0);
        assert_eq!(rounded_percentage(5, 5), 100);
        assert_eq!(rounded_percentage(0, 0), 0);
    }

    #[test]
    fn rejects_length_mismatch() {
        let key = key(&[0, 1, 2, 3]);
        let err = score(&key, &answered(&[0, 1, 2])).unwrap_err();
        assert_eq!(
            err,
            SubmissionError::LengthMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn rejects_unanswered_and_out_of_range() {
        let key = key(&[0, 1]);
        assert_eq!(
            score(&key, &[Some(0), None]).unwrap_err(),
            SubmissionError::Unanswered { index: 1 }
        );
        assert_eq!(
            score(&key, &[Some(4), Some(1)]).unwrap_err(),
            SubmissionError::OptionOutOfRange {
                index: 0,
                value: 4,
                options: 4
            }
        );
    }

    #[test]
    fn scoring_is_deterministic() {
        let key = key(&[3, 2, 1]);
        let answers = answered(&[3, 0, 1]);
        assert_eq!(score(&key, &answers).unwrap(), score(&key, &answers).unwrap());
    }

    #[test]
    fn score_and_misses_account_for_every_question() {
        // walk every answer vector over 5 questions with 2 plausible choices each
        let correct = [0, 1, 2, 3, 0];
        let key = key(&correct);
        let n = correct.len();
        for mask in 0_u32..(1 << n) {
            let answers: Vec<Option<usize>> = (0..n)
                .map(|i| {
                    let wrong = (correct[i] + 1) % 4;
                    Some(if mask & (1 << i) == 0 { correct[i] } else { wrong })
                })
                .collect();
            let result = score(&key, &answers).unwrap();

            let missed = result.missed_indices();
            assert!(missed.windows(2).all(|w| w[0] < w[1]));
            assert!(missed.iter().all(|&i| i < n));
            assert_eq!(missed.len(), mask.count_ones() as usize);

            let missed_pct = 100.0 * missed.len() as f64 / n as f64;
            let total = f64::from(result.score()) + missed_pct;
            assert!((total - 100.0).abs() <= 0.5, "mask {mask:b}: {total}");
        }
    }
}
