use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManaParseError {
    #[error("generic amount '{0}' is out of range")]
    GenericOutOfRange(String),
}

/// Amount of mana: one counter per color plus generic mana.
///
/// Used both for costs ("2BR") and for the content of a mana pool. All amounts
/// are unsigned so a quantity can never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mana {
    pub b: u32,
    pub u: u32,
    pub g: u32,
    pub r: u32,
    pub w: u32,
    pub x: u32,
}

/// Result of [`Mana::extract`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extraction {
    /// Part of the requested amount that could be taken from the pool
    pub extracted: Mana,
    /// Part of the requested amount the pool could not cover
    pub not_extracted: Mana,
    /// What is left in the pool
    pub rest: Mana,
}

impl Mana {
    pub const ZERO: Mana = Mana::new(0, 0, 0, 0, 0, 0);
    pub const B: Mana = Mana::new(1, 0, 0, 0, 0, 0);
    pub const U: Mana = Mana::new(0, 1, 0, 0, 0, 0);
    pub const G: Mana = Mana::new(0, 0, 1, 0, 0, 0);
    pub const R: Mana = Mana::new(0, 0, 0, 1, 0, 0);
    pub const W: Mana = Mana::new(0, 0, 0, 0, 1, 0);
    pub const ONE: Mana = Mana::new(0, 0, 0, 0, 0, 1);

    pub const fn new(b: u32, u: u32, g: u32, r: u32, w: u32, x: u32) -> Self {
        Mana { b, u, g, r, w, x }
    }

    pub const fn generic(x: u32) -> Self {
        Mana::new(0, 0, 0, 0, 0, x)
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Converted mana cost (total amount of mana)
    pub fn ccm(&self) -> u32 {
        self.b + self.u + self.g + self.r + self.w + self.x
    }

    pub fn is_empty(&self) -> bool {
        self.ccm() == 0
    }

    /// Whether `other` can be paid from this amount: every color must be
    /// covered, and colored surplus may pay for generic mana.
    pub fn contains(&self, other: &Mana) -> bool {
        if self.b < other.b
            || self.u < other.u
            || self.g < other.g
            || self.r < other.r
            || self.w < other.w
        {
            return false;
        }
        let surplus = (self.b - other.b)
            + (self.u - other.u)
            + (self.g - other.g)
            + (self.r - other.r)
            + (self.w - other.w);
        u64::from(self.x) + u64::from(surplus) >= u64::from(other.x)
    }

    pub fn plus(&self, other: &Mana) -> Mana {
        Mana::new(
            self.b + other.b,
            self.u + other.u,
            self.g + other.g,
            self.r + other.r,
            self.w + other.w,
            self.x + other.x,
        )
    }

    /// Removes `other` from this amount, or `None` if it is not contained
    pub fn minus(&self, other: &Mana) -> Option<Mana> {
        let pull = self.extract(other);
        if pull.not_extracted.is_empty() {
            Some(pull.rest)
        } else {
            None
        }
    }

    /// Removes as much of `other` as possible from this amount.
    ///
    /// Colors are matched first; any generic requirement still owed is then
    /// paid with leftover colored mana, taken in B, U, G, R, W order.
    ///
    /// ```text
    /// 2B.extract(1BR) -> extracted: 1B, not extracted: R, rest: 1
    /// ```
    pub fn extract(&self, other: &Mana) -> Extraction {
        let mut extracted = Mana::new(
            self.b.min(other.b),
            self.u.min(other.u),
            self.g.min(other.g),
            self.r.min(other.r),
            self.w.min(other.w),
            self.x.min(other.x),
        );
        let mut rest = Mana::new(
            self.b - extracted.b,
            self.u - extracted.u,
            self.g - extracted.g,
            self.r - extracted.r,
            self.w - extracted.w,
            self.x - extracted.x,
        );
        let mut not_extracted = Mana::new(
            other.b - extracted.b,
            other.u - extracted.u,
            other.g - extracted.g,
            other.r - extracted.r,
            other.w - extracted.w,
            other.x - extracted.x,
        );

        let mut owed = not_extracted.x;
        for (left, took) in [
            (&mut rest.b, &mut extracted.b),
            (&mut rest.u, &mut extracted.u),
            (&mut rest.g, &mut extracted.g),
            (&mut rest.r, &mut extracted.r),
            (&mut rest.w, &mut extracted.w),
        ] {
            if owed == 0 {
                break;
            }
            let paid = (*left).min(owed);
            *left -= paid;
            *took += paid;
            owed -= paid;
        }
        not_extracted.x = owed;

        Extraction {
            extracted,
            not_extracted,
            rest,
        }
    }
}

impl Add for Mana {
    type Output = Mana;

    fn add(self, other: Mana) -> Mana {
        self.plus(&other)
    }
}

impl fmt::Display for Mana {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "0");
        }
        if self.x > 0 {
            write!(f, "{}", self.x)?;
        }
        for (count, symbol) in [
            (self.b, "B"),
            (self.u, "U"),
            (self.g, "G"),
            (self.r, "R"),
            (self.w, "W"),
        ] {
            write!(f, "{}", symbol.repeat(count as usize))?;
        }
        Ok(())
    }
}

impl FromStr for Mana {
    type Err = ManaParseError;

    /// Parses the usual text form ("2BBR", "{1}{G}"); unknown characters are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mana = Mana::ZERO;
        let mut generic = String::new();
        for c in s.chars() {
            match c.to_ascii_uppercase() {
                'B' => mana.b += 1,
                'U' => mana.u += 1,
                'G' => mana.g += 1,
                'R' => mana.r += 1,
                'W' => mana.w += 1,
                d if d.is_ascii_digit() => generic.push(d),
                _ => {}
            }
        }
        if !generic.is_empty() {
            mana.x = generic
                .parse()
                .map_err(|_| ManaParseError::GenericOutOfRange(generic.clone()))?;
        }
        Ok(mana)
    }
}

impl TryFrom<String> for Mana {
    type Error = ManaParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mana> for String {
    fn from(mana: Mana) -> Self {
        mana.to_string()
    }
}
