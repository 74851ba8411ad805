use super::field;

/// Polynomial over GF(929). Coefficients are stored highest degree first
/// without leading zeros; the zero polynomial is `[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModulusPoly {
    coefficients: Vec<u16>,
}

impl ModulusPoly {
    pub fn new(mut coefficients: Vec<u16>) -> Self {
        let first_non_zero = coefficients
            .iter()
            .position(|&c| c != 0)
            .unwrap_or(coefficients.len().saturating_sub(1));
        coefficients.drain(..first_non_zero);
        if coefficients.is_empty() {
            coefficients.push(0);
        }
        Self { coefficients }
    }

    pub fn zero() -> Self {
        Self { coefficients: vec![0] }
    }

    pub fn one() -> Self {
        Self { coefficients: vec![1] }
    }

    /// `coefficient * x^degree`
    pub fn monomial(degree: usize, coefficient: u16) -> Self {
        if coefficient == 0 {
            return Self::zero();
        }
        let mut coefficients = vec![0; degree + 1];
        coefficients[0] = coefficient;
        Self { coefficients }
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.coefficients[0] == 0
    }

    /// Coefficient of `x^degree`.
    #[inline]
    pub fn coefficient(&self, degree: usize) -> u16 {
        if degree > self.degree() {
            return 0;
        }
        self.coefficients[self.coefficients.len() - 1 - degree]
    }

    pub fn evaluate_at(&self, a: u16) -> u16 {
        if a == 0 {
            return self.coefficient(0);
        }
        if a == 1 {
            return self.coefficients.iter().fold(0, |acc, &c| field::add(acc, c));
        }
        self.coefficients
            .iter()
            .fold(0, |acc, &c| field::add(field::mul(acc, a), c))
    }

    pub fn add(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }

        let (larger, smaller) = if self.coefficients.len() >= other.coefficients.len() {
            (&self.coefficients, &other.coefficients)
        } else {
            (&other.coefficients, &self.coefficients)
        };
        let diff = larger.len() - smaller.len();
        let mut sum = larger[..diff].to_vec();
        sum.extend(
            larger[diff..]
                .iter()
                .zip(smaller)
                .map(|(&a, &b)| field::add(a, b)),
        );
        Self::new(sum)
    }

    pub fn subtract(&self, other: &Self) -> Self {
        if other.is_zero() {
            return self.clone();
        }
        self.add(&other.negative())
    }

    pub fn negative(&self) -> Self {
        Self {
            coefficients: self.coefficients.iter().map(|&c| field::neg(c)).collect(),
        }
    }

    pub fn multiply(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let mut product = vec![0; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, &a) in self.coefficients.iter().enumerate() {
            for (j, &b) in other.coefficients.iter().enumerate() {
                product[i + j] = field::add(product[i + j], field::mul(a, b));
            }
        }
        Self::new(product)
    }

    pub fn multiply_scalar(&self, scalar: u16) -> Self {
        if scalar == 0 {
            return Self::zero();
        }
        Self::new(self.coefficients.iter().map(|&c| field::mul(c, scalar)).collect())
    }

    pub fn multiply_by_monomial(&self, degree: usize, coefficient: u16) -> Self {
        if coefficient == 0 {
            return Self::zero();
        }
        let mut product: Vec<u16> = self
            .coefficients
            .iter()
            .map(|&c| field::mul(c, coefficient))
            .collect();
        product.resize(product.len() + degree, 0);
        Self::new(product)
    }

    /// Returns `(quotient, remainder)`. `other` must not be zero.
    pub fn divide(&self, other: &Self) -> (Self, Self) {
        debug_assert!(!other.is_zero());
        let inverse_lead = field::inverse(other.coefficient(other.degree()));

        let mut quotient = Self::zero();
        let mut remainder = self.clone();
        while remainder.degree() >= other.degree() && !remainder.is_zero() {
            let degree_diff = remainder.degree() - other.degree();
            let scale = field::mul(remainder.coefficient(remainder.degree()), inverse_lead);
            remainder = remainder.subtract(&other.multiply_by_monomial(degree_diff, scale));
            quotient = quotient.add(&Self::monomial(degree_diff, scale));
        }
        (quotient, remainder)
    }

    /// Remainder modulo `x^n`.
    pub fn truncate(&self, n: usize) -> Self {
        if self.coefficients.len() <= n {
            return self.clone();
        }
        Self::new(self.coefficients[self.coefficients.len() - n..].to_vec())
    }

    pub fn formal_derivative(&self) -> Self {
        let degree = self.degree();
        if degree == 0 {
            return Self::zero();
        }
        let mut derivative = vec![0; degree];
        for i in 1..=degree {
            derivative[degree - i] = field::mul((i % 929) as u16, self.coefficient(i));
        }
        Self::new(derivative)
    }
}
