use std::cmp::Ordering;
use std::fmt;

/// Errors raised by puzzle construction and legality checking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    /// A puzzle must start with at least one operand.
    #[error("initial operand set is empty")]
    EmptyOperands,

    /// Text could not be parsed as an operand.
    #[error("invalid operand value: '{0}'")]
    InvalidValue(String),

    /// An answer was requested from a state that has not reached the goal.
    #[error("state is not terminal: {0}")]
    NotTerminal(String),

    /// A checker implementation failed in a way the search cannot recover from.
    #[error("checker failure: {0}")]
    Checker(String),
}

/// An exact rational operand.
///
/// Always stored normalized: the denominator is positive and coprime with the
/// numerator, so structural equality is numeric equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value {
    num: i64,
    den: i64,
}

impl Value {
    /// Build `num / den`. Returns `None` for a zero denominator or overflow.
    pub fn new(num: i64, den: i64) -> Option<Self> {
        from_parts(i128::from(num), i128::from(den))
    }

    /// An integer value.
    pub fn integer(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        let (a, b, c, d) = self.wide(other);
        from_parts(a * d + c * b, b * d)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        let (a, b, c, d) = self.wide(other);
        from_parts(a * d - c * b, b * d)
    }

    pub fn checked_mul(self, other: Self) -> Option<Self> {
        let (a, b, c, d) = self.wide(other);
        from_parts(a * c, b * d)
    }

    /// Division; `None` when dividing by zero.
    pub fn checked_div(self, other: Self) -> Option<Self> {
        let (a, b, c, d) = self.wide(other);
        from_parts(a * d, b * c)
    }

    /// Parse an operand: integer (`24`), fraction (`5/3`) or finite decimal (`2.5`).
    pub fn parse(text: &str) -> Result<Self, PuzzleError> {
        let s = text.trim();
        let invalid = || PuzzleError::InvalidValue(s.to_string());

        if let Some((n, d)) = s.split_once('/') {
            let n: i64 = n.trim().parse().map_err(|_| invalid())?;
            let d: i64 = d.trim().parse().map_err(|_| invalid())?;
            return Value::new(n, d).ok_or_else(invalid);
        }

        if let Some((int, frac)) = s.split_once('.') {
            if frac.is_empty() || frac.len() > 12 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let negative = int.starts_with('-');
            let digits = int.trim_start_matches(['-', '+']);
            let int_part: i128 = if digits.is_empty() {
                0
            } else if digits.bytes().all(|b| b.is_ascii_digit()) {
                digits.parse().map_err(|_| invalid())?
            } else {
                return Err(invalid());
            };
            let scale = 10i128.pow(frac.len() as u32);
            let frac_part: i128 = frac.parse().map_err(|_| invalid())?;
            let magnitude = int_part
                .checked_mul(scale)
                .and_then(|m| m.checked_add(frac_part))
                .ok_or_else(invalid)?;
            let num = if negative { -magnitude } else { magnitude };
            return from_parts(num, scale).ok_or_else(invalid);
        }

        s.parse::<i64>().map(Value::integer).map_err(|_| invalid())
    }

    fn wide(self, other: Self) -> (i128, i128, i128, i128) {
        (
            i128::from(self.num),
            i128::from(self.den),
            i128::from(other.num),
            i128::from(other.den),
        )
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Normalize a wide fraction back into an `i64` value.
fn from_parts(num: i128, den: i128) -> Option<Value> {
    if den == 0 {
        return None;
    }
    let g = gcd(num.unsigned_abs(), den.unsigned_abs());
    let g = i128::try_from(g).ok()?;
    let (mut n, mut d) = (num / g, den / g);
    if d < 0 {
        n = -n;
        d = -d;
    }
    Some(Value {
        num: i64::try_from(n).ok()?,
        den: i64::try_from(d).ok()?,
    })
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, c, d) = self.wide(*other);
        (a * d).cmp(&(c * b))
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::integer(n)
    }
}
