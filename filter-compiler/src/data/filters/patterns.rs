//! Named regex classes for the `regex` operator
//!
//! The wire carries a class number, never a raw pattern. Each class maps to
//! a fixed pattern that is bound as a parameter and evaluated by MySQL's
//! `REGEXP`.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegexClass {
    Digits = 1,
    Alpha = 2,
    Alphanumeric = 3,
    Ascii = 4,
    HalfWidthKana = 5,
    HalfWidth = 6,
    FullWidthKatakana = 7,
    FullWidth = 8,
    Phone = 9,
    PostalCode = 10,
    Email = 11,
}

impl RegexClass {
    pub const ALL: [RegexClass; 11] = [
        Self::Digits,
        Self::Alpha,
        Self::Alphanumeric,
        Self::Ascii,
        Self::HalfWidthKana,
        Self::HalfWidth,
        Self::FullWidthKatakana,
        Self::FullWidth,
        Self::Phone,
        Self::PostalCode,
        Self::Email,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.code() == code)
    }

    /// Accepts `5` as well as `"5"`
    pub fn from_operand(operand: &Value) -> Option<Self> {
        match operand {
            Value::Number(n) => n.as_i64().and_then(Self::from_code),
            Value::String(s) => s.trim().parse().ok().and_then(Self::from_code),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        *self as i64
    }

    pub fn pattern(&self) -> &'static str {
        match self {
            Self::Digits => r"^[0-9]+$",
            Self::Alpha => r"^[A-Za-z]+$",
            Self::Alphanumeric => r"^[A-Za-z0-9]+$",
            Self::Ascii => r"^[!-~]+$",
            Self::HalfWidthKana => r"^[ｦ-ﾟ]+$",
            Self::HalfWidth => r"^[ -~｡-ﾟ]+$",
            Self::FullWidthKatakana => r"^[ァ-ヶー　]+$",
            Self::FullWidth => r"^[^ -~｡-ﾟ]+$",
            Self::Phone => r"^[0-9]{2,5}-?[0-9]{1,4}-?[0-9]{3,4}$",
            Self::PostalCode => r"^[0-9]{3}-?[0-9]{4}$",
            Self::Email => r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$",
        }
    }

    /// Classes 4 and up treat an empty value as valid
    pub fn accepts_blank(&self) -> bool {
        self.code() >= Self::Ascii.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use serde_json::json;

    impl RegexClass {
        /// Local evaluation with the same blank handling as the SQL form
        fn matches(&self, value: Option<&str>) -> bool {
            match value {
                None | Some("") => self.accepts_blank(),
                Some(v) => Regex::new(self.pattern()).unwrap().is_match(v),
            }
        }
    }

    #[test]
    fn codes_are_one_through_eleven() {
        for (idx, class) in RegexClass::ALL.iter().enumerate() {
            assert_eq!(class.code(), idx as i64 + 1);
            assert_eq!(RegexClass::from_code(class.code()), Some(*class));
        }
        assert_eq!(RegexClass::from_code(0), None);
        assert_eq!(RegexClass::from_code(12), None);
    }

    #[test]
    fn from_operand_accepts_numbers_and_numeric_strings() {
        assert_eq!(RegexClass::from_operand(&json!(1)), Some(RegexClass::Digits));
        assert_eq!(RegexClass::from_operand(&json!("11")), Some(RegexClass::Email));
        assert_eq!(RegexClass::from_operand(&json!("abc")), None);
        assert_eq!(RegexClass::from_operand(&json!("^[a-z]+$")), None);
        assert_eq!(RegexClass::from_operand(&json!(null)), None);
    }

    #[test]
    fn every_pattern_compiles() {
        for class in RegexClass::ALL {
            assert!(Regex::new(class.pattern()).is_ok(), "{class:?}");
        }
    }

    #[test]
    fn blank_handling() {
        assert!(!RegexClass::Digits.matches(None));
        assert!(!RegexClass::Alphanumeric.matches(Some("")));
        assert!(RegexClass::Ascii.matches(None));
        assert!(RegexClass::Email.matches(Some("")));
    }

    #[test]
    fn ascii_classes() {
        assert!(RegexClass::Digits.matches(Some("0123")));
        assert!(!RegexClass::Digits.matches(Some("12a")));
        assert!(RegexClass::Alpha.matches(Some("abcXYZ")));
        assert!(!RegexClass::Alpha.matches(Some("abc1")));
        assert!(RegexClass::Alphanumeric.matches(Some("abc123")));
        assert!(RegexClass::Ascii.matches(Some("a-b_c!")));
        assert!(!RegexClass::Ascii.matches(Some("a b")));
    }

    #[test]
    fn width_classes() {
        assert!(RegexClass::HalfWidthKana.matches(Some("ｱｲｳ")));
        assert!(!RegexClass::HalfWidthKana.matches(Some("アイウ")));
        assert!(RegexClass::HalfWidth.matches(Some("abc ｱｲｳ")));
        assert!(RegexClass::FullWidthKatakana.matches(Some("アイウエオ")));
        assert!(RegexClass::FullWidthKatakana.matches(Some("カード　ー")));
        assert!(!RegexClass::FullWidthKatakana.matches(Some("あいう")));
        assert!(RegexClass::FullWidth.matches(Some("山田太郎")));
        assert!(!RegexClass::FullWidth.matches(Some("山田 太郎")));
    }

    #[test]
    fn structured_classes() {
        assert!(RegexClass::Phone.matches(Some("03-1234-5678")));
        assert!(RegexClass::Phone.matches(Some("09012345678")));
        assert!(!RegexClass::Phone.matches(Some("phone")));
        assert!(RegexClass::PostalCode.matches(Some("100-0001")));
        assert!(RegexClass::PostalCode.matches(Some("1000001")));
        assert!(!RegexClass::PostalCode.matches(Some("10-00001")));
        assert!(RegexClass::Email.matches(Some("guest@example.com")));
        assert!(!RegexClass::Email.matches(Some("guest@example")));
    }
}
