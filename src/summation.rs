//! Compensated accumulation of probability mass.
//!
//! The forward scans add many small point masses to a running total that
//! approaches 1. Plain summation loses the low-order bits of each addend
//! once the total dominates; the Neumaier variant of Kahan summation keeps
//! them in a separate compensation term.

/// Running Neumaier compensated sum with O(ε) error independent of the
/// number of addends.
///
/// # Algorithm
/// Maintains a compensation variable `c`. At each step the branch captures
/// the low-order bits of whichever operand is smaller in magnitude, which
/// also covers addends larger than the running sum.
///
/// Reference: Neumaier (1974), "Rundungsfehleranalyse einiger Verfahren
/// zur Summation endlicher Summen", *Zeitschrift für Angewandte
/// Mathematik und Mechanik* 54(1), pp. 39–51.
///
/// # Examples
/// ```
/// use u_runlength::summation::NeumaierSum;
/// let mut acc = NeumaierSum::new();
/// for &x in &[1.0, 1e100, 1.0, -1e100] {
///     acc.add(x);
/// }
/// assert_eq!(acc.total(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to the running total.
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    /// Current compensated total.
    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for NeumaierSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl FromIterator<f64> for NeumaierSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(NeumaierSum::new().total(), 0.0);
    }

    #[test]
    fn test_recovers_cancelled_bits() {
        let acc: NeumaierSum = [1.0, 1e100, 1.0, -1e100].into_iter().collect();
        assert_eq!(acc.total(), 2.0);
    }

    #[test]
    fn test_many_small_addends() {
        // 10⁶ additions of 0.1: naive summation drifts by ~1e-6.
        let mut acc = NeumaierSum::new();
        for _ in 0..1_000_000 {
            acc.add(0.1);
        }
        assert!((acc.total() - 100_000.0).abs() < 1e-9, "total = {}", acc.total());
    }

    #[test]
    fn test_small_masses_onto_large_total() {
        let mut acc = NeumaierSum::new();
        acc.add(1.0 - 1e-3);
        for _ in 0..1000 {
            acc.add(1e-6);
        }
        assert!((acc.total() - 1.0).abs() < 1e-15, "total = {}", acc.total());
    }
}
