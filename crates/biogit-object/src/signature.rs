use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::Local;

use crate::ObjectError;

/// A timestamp with timezone, as carried on author/committer lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct When {
    /// Seconds since the Unix epoch.
    pub seconds: i64,
    /// Timezone offset in minutes from UTC (e.g. -300 for EST).
    pub offset_minutes: i32,
}

impl When {
    /// The current time in the local timezone.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            seconds: now.timestamp(),
            offset_minutes: now.offset().local_minus_utc() / 60,
        }
    }

    /// Parse the `<seconds> <±HHMM>` tail of a person line.
    pub fn parse(s: &str) -> Result<Self, ObjectError> {
        let mut parts = s.split_whitespace();
        let seconds: i64 = parts
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| ObjectError::InvalidSignature(format!("bad timestamp in {s:?}")))?;
        let tz = parts
            .next()
            .ok_or_else(|| ObjectError::InvalidSignature(format!("missing timezone in {s:?}")))?;

        let (sign, digits) = match tz.as_bytes().first() {
            Some(b'+') => (1, &tz[1..]),
            Some(b'-') => (-1, &tz[1..]),
            _ => return Err(ObjectError::InvalidSignature(format!("bad timezone {tz:?}"))),
        };
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ObjectError::InvalidSignature(format!("bad timezone {tz:?}")));
        }
        let hours: i32 = digits[..2]
            .parse()
            .map_err(|_| ObjectError::InvalidSignature(format!("bad timezone {tz:?}")))?;
        let minutes: i32 = digits[2..]
            .parse()
            .map_err(|_| ObjectError::InvalidSignature(format!("bad timezone {tz:?}")))?;

        Ok(Self {
            seconds,
            offset_minutes: sign * (hours * 60 + minutes),
        })
    }

    /// Format as `<seconds> <±HHMM>`.
    pub fn to_string_raw(&self) -> String {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let abs = self.offset_minutes.unsigned_abs();
        format!("{} {}{:02}{:02}", self.seconds, sign, abs / 60, abs % 60)
    }
}

/// An author or committer identity with timestamp.
///
/// Canonical line form: `Name <email> 1234567890 +0000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub when: When,
}

impl Signature {
    /// Create a signature stamped with the current local time.
    pub fn now(name: impl Into<BString>, email: impl Into<BString>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when: When::now(),
        }
    }

    /// Parse a person line.
    pub fn parse(input: &BStr) -> Result<Self, ObjectError> {
        let bytes = input.as_bytes();

        let gt_pos = bytes
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '>'".into()))?;
        let lt_pos = bytes[..gt_pos]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '<'".into()))?;

        let name = bytes[..lt_pos].trim();
        let email = &bytes[lt_pos + 1..gt_pos];
        let when_str = std::str::from_utf8(bytes[gt_pos + 1..].trim())
            .map_err(|_| ObjectError::InvalidSignature("non-UTF8 timestamp".into()))?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            when: When::parse(when_str)?,
        })
    }

    /// Format in canonical form: `Name <email> timestamp tz`.
    pub fn to_bytes(&self) -> BString {
        let mut out = BString::new(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(self.when.to_string_raw().as_bytes());
        out
    }
}
