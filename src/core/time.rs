use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

/// Timestamps are stored as UTC without an offset.
pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month, Time};

    #[test]
    fn completion_timestamps_render_as_utc() {
        let date = Date::from_calendar_date(2025, Month::June, 30).unwrap();
        let value = PrimitiveDateTime::new(date, Time::from_hms(23, 59, 5).unwrap());
        assert_eq!(format_primitive(value), "2025-06-30T23:59:05Z");
    }

    #[test]
    fn now_has_no_offset_drift() {
        let before = OffsetDateTime::now_utc();
        let now = primitive_now_utc().assume_utc();
        assert!(now >= before - time::Duration::seconds(1));
    }
}
