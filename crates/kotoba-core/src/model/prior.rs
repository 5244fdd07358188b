use std::fmt;

/// Supplies the starting log score of every outcome before any predicate is
/// applied.
pub trait Prior: Send + Sync + fmt::Debug {
    /// Overwrite `dist` with one additive log score per outcome for the given
    /// context.
    fn log_prior(&self, dist: &mut [f64], context: &[usize], values: Option<&[f32]>);
}

/// Every outcome starts equally likely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformPrior;

impl Prior for UniformPrior {
    fn log_prior(&self, dist: &mut [f64], _context: &[usize], _values: Option<&[f32]>) {
        dist.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_prior_resets_scores() {
        let mut dist = vec![1.5, -2.0, 3.0];
        UniformPrior.log_prior(&mut dist, &[0, 1], None);
        assert_eq!(dist, vec![0.0, 0.0, 0.0]);
    }
}
