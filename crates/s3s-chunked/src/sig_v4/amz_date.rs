//! x-amz-date

use std::fmt;

use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const AMZ_DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year][month][day]T[hour][minute][second]Z");

/// A request timestamp in `YYYYMMDDTHHMMSSZ` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmzDate(PrimitiveDateTime);

/// [`AmzDate`] parse error
#[derive(Debug, thiserror::Error)]
#[error("ParseAmzDateError")]
pub struct ParseAmzDateError(#[from] time::error::Parse);

impl AmzDate {
    /// Parses `AmzDate` from `YYYYMMDDTHHMMSSZ`
    ///
    /// # Errors
    /// Returns an error if the string is not a valid amz date
    pub fn parse(s: &str) -> Result<Self, ParseAmzDateError> {
        Ok(Self(PrimitiveDateTime::parse(s, AMZ_DATE_FORMAT)?))
    }

    /// The current time, truncated to seconds
    #[must_use]
    pub fn now() -> Self {
        let now = time::OffsetDateTime::now_utc();
        Self(PrimitiveDateTime::new(now.date(), now.time())).truncated()
    }

    #[must_use]
    pub fn from_datetime(dt: PrimitiveDateTime) -> Self {
        Self(dt).truncated()
    }

    fn truncated(self) -> Self {
        Self(self.0.replace_nanosecond(0).unwrap_or(self.0))
    }

    /// `YYYYMMDDTHHMMSSZ`
    #[must_use]
    pub fn fmt_iso8601(&self) -> String {
        format!(
            "{}T{:02}{:02}{:02}Z",
            self.fmt_date(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }

    /// `YYYYMMDD`
    #[must_use]
    pub fn fmt_date(&self) -> String {
        format!("{:04}{:02}{:02}", self.0.year(), u8::from(self.0.month()), self.0.day())
    }
}

impl fmt::Display for AmzDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fmt_iso8601())
    }
}
