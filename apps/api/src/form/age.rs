use chrono::{Datelike, NaiveDate};

/// Age in completed years on `today`.
///
/// Returns `None` for a birth date after `today`; the age field stays empty.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth > today {
        return None;
    }
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}
