//! Coin amounts and gas prices

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::WolochainError;

/// Number of fractional digits carried by [`Dec`].
pub const DEC_PRECISION: u32 = 18;
const DEC_ONE: u128 = 1_000_000_000_000_000_000;

/// Check that a denomination is well formed: 3-128 characters, a leading
/// letter, then letters, digits or one of `/:._-`.
pub fn validate_denom(denom: &str) -> Result<(), WolochainError> {
    let mut chars = denom.chars();
    let valid = (3..=128).contains(&denom.len())
        && chars.next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false)
        && chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    if valid {
        Ok(())
    } else {
        Err(WolochainError::InvalidCoins(format!("invalid denom: {denom}")))
    }
}

/// Split `"100stake"` into its amount and denom parts.
fn split_amount(s: &str) -> Result<(&str, &str), WolochainError> {
    let s = s.trim();
    let idx = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or_else(|| WolochainError::InvalidCoins(format!("missing denom: {s}")))?;
    let (amount, denom) = s.split_at(idx);
    if amount.is_empty() {
        return Err(WolochainError::InvalidCoins(format!("missing amount: {s}")));
    }
    validate_denom(denom)?;
    Ok((amount, denom))
}

/// Single integer coin amount
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = WolochainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, denom) = split_amount(s)?;
        let amount = amount
            .parse::<u128>()
            .map_err(|e| WolochainError::InvalidCoins(format!("{s}: {e}")))?;
        Ok(Coin::new(amount, denom))
    }
}

/// Sorted set of coins with at most one entry per denom and no zero amounts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Sort and merge `coins`. Fails when a merged amount overflows.
    pub fn new(coins: Vec<Coin>) -> Result<Self, WolochainError> {
        let mut merged: BTreeMap<String, u128> = BTreeMap::new();
        for coin in coins {
            let total = merged.entry(coin.denom).or_default();
            *total = total.checked_add(coin.amount).ok_or_else(|| {
                WolochainError::InvalidCoins(format!("amount overflow adding {}", coin.amount))
            })?;
        }
        Ok(Coins(
            merged
                .into_iter()
                .filter(|(_, amount)| *amount > 0)
                .map(|(denom, amount)| Coin { denom, amount })
                .collect(),
        ))
    }

    pub fn empty() -> Self {
        Coins(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or(0)
    }

    pub fn add(&self, other: &Coins) -> Result<Coins, WolochainError> {
        Coins::new(self.0.iter().chain(other.0.iter()).cloned().collect())
    }

    /// True when at least one coin of `required` is covered by `self`.
    pub fn is_any_gte(&self, required: &Coins) -> bool {
        required.iter().any(|c| self.amount_of(&c.denom) >= c.amount)
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = WolochainError;

    fn try_from(coins: Vec<Coin>) -> Result<Self, Self::Error> {
        Coins::new(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for Coins {
    type Err = WolochainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coins = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Coin::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Coins::new(coins)
    }
}

/// Fixed-point decimal with 18 fractional digits
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dec(u128);

impl Dec {
    pub const ZERO: Dec = Dec(0);

    pub fn from_atomics(atomics: u128) -> Self {
        Dec(atomics)
    }

    pub fn from_int(value: u128) -> Self {
        Dec(value.saturating_mul(DEC_ONE))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `self * value`, rounded up to the next integer.
    pub fn mul_ceil(&self, value: u64) -> u128 {
        let product = self.0.saturating_mul(value as u128);
        product / DEC_ONE + u128::from(product % DEC_ONE != 0)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:018}", self.0 / DEC_ONE, self.0 % DEC_ONE)
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

impl FromStr for Dec {
    type Err = WolochainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WolochainError::InvalidCoins(format!("invalid decimal: {s}"));
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || frac.len() > DEC_PRECISION as usize {
            return Err(invalid());
        }
        let whole: u128 = whole.parse().map_err(|_| invalid())?;
        let frac_value: u128 = if frac.is_empty() {
            0
        } else {
            let digits: u128 = frac.parse().map_err(|_| invalid())?;
            digits * 10u128.pow(DEC_PRECISION - frac.len() as u32)
        };
        whole
            .checked_mul(DEC_ONE)
            .and_then(|w| w.checked_add(frac_value))
            .map(Dec)
            .ok_or_else(invalid)
    }
}

/// Decimal coin, used for gas prices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Dec,
}

impl fmt::Display for DecCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for DecCoin {
    type Err = WolochainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, denom) = split_amount(s)?;
        Ok(DecCoin {
            denom: denom.to_string(),
            amount: amount.parse()?,
        })
    }
}

/// Set of gas prices; an empty string parses to an empty set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecCoins(Vec<DecCoin>);

impl DecCoins {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|c| c.amount.is_zero())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecCoin> {
        self.0.iter()
    }

    /// Fees required to pay `gas` at these prices, rounded up per denom.
    /// Zero amounts are left out, so a zero gas limit requires nothing.
    pub fn required_fees(&self, gas: u64) -> Coins {
        // Prices are sorted with one entry per denom, so there is nothing to merge.
        Coins(
            self.0
                .iter()
                .map(|price| Coin::new(price.amount.mul_ceil(gas), price.denom.clone()))
                .filter(|coin| coin.amount > 0)
                .collect(),
        )
    }
}

impl fmt::Display for DecCoins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for DecCoins {
    type Err = WolochainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut coins = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(DecCoin::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        if coins.windows(2).any(|w| w[0].denom == w[1].denom) {
            return Err(WolochainError::InvalidCoins(format!("duplicate denom in {s}")));
        }
        Ok(DecCoins(coins))
    }
}

/// Serde helper: `u128` amounts as decimal strings
pub mod amount_string {
    use super::*;

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coins_sorts_and_merges() {
        let coins: Coins = "5token,100stake,3token".parse().unwrap();
        assert_eq!(coins.to_string(), "100stake,8token");
        assert_eq!(coins.amount_of("token"), 8);
    }

    #[test]
    fn test_parse_coins_rejects_bad_denom() {
        assert!("100".parse::<Coins>().is_err());
        assert!("100s".parse::<Coins>().is_err());
        assert!("10 0stake".parse::<Coins>().is_err());
    }

    #[test]
    fn test_merge_overflow_is_an_error() {
        let max = format!("{}stake,1stake", u128::MAX);
        assert!(matches!(max.parse::<Coins>(), Err(WolochainError::InvalidCoins(_))));

        let json = serde_json::json!([
            {"denom": "stake", "amount": u128::MAX.to_string()},
            {"denom": "stake", "amount": "2"},
        ]);
        assert!(serde_json::from_value::<Coins>(json).is_err());

        let full: Coins = format!("{}stake", u128::MAX).parse().unwrap();
        let one: Coins = "1stake".parse().unwrap();
        assert!(full.add(&one).is_err());
        assert_eq!(one.add(&one).unwrap().amount_of("stake"), 2);
    }

    #[test]
    fn test_coin_json_amount_is_string() {
        let json = serde_json::to_value(Coin::new(42, "stake")).unwrap();
        assert_eq!(json, serde_json::json!({"denom": "stake", "amount": "42"}));
    }

    #[test]
    fn test_gas_prices() {
        let prices: DecCoins = "0.025stake".parse().unwrap();
        assert!(!prices.is_zero());
        assert_eq!(prices.required_fees(200_000).amount_of("stake"), 5_000);
        assert_eq!(prices.required_fees(1).amount_of("stake"), 1);
        assert!(prices.required_fees(0).is_empty());

        let zero: DecCoins = "0stake".parse().unwrap();
        assert!(zero.is_zero());
        assert!("".parse::<DecCoins>().unwrap().is_empty());
        assert!("0.1stake,0.2stake".parse::<DecCoins>().is_err());
    }

    #[test]
    fn test_dec_display() {
        let dec: Dec = "1.5".parse().unwrap();
        assert_eq!(dec.to_string(), "1.500000000000000000");
        assert!("1.0000000000000000001".parse::<Dec>().is_err());
    }
}
