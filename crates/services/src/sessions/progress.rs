use quiz_core::model::SessionState;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn from_counts(total: usize, answered: usize, is_complete: bool) -> Self {
        Self {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete,
        }
    }

    /// 1-based position of the question on screen, capped at `total`.
    #[must_use]
    pub fn position(&self) -> usize {
        (self.answered + 1).min(self.total)
    }

    /// Fraction of the quiz shown so far, for progress bars. 0 for an empty quiz.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.position() as f64 / self.total as f64
    }
}

impl From<&SessionState> for SessionProgress {
    fn from(state: &SessionState) -> Self {
        Self::from_counts(state.total, state.current_index, state.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_quiz_has_zero_fraction() {
        let progress = SessionProgress::from_counts(0, 0, true);
        assert_eq!(progress.position(), 0);
        assert!(progress.fraction().abs() < f64::EPSILON);
    }

    #[test]
    fn position_is_one_based() {
        let progress = SessionProgress::from_counts(4, 1, false);
        assert_eq!(progress.position(), 2);
        assert_eq!(progress.remaining, 3);
        assert!((progress.fraction() - 0.5).abs() < f64::EPSILON);
    }
}
