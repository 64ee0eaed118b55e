use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave::{LeaveType, SpecialLeaveType};

/// First and last clock hour of the working day. Both bounds are inclusive:
/// a timestamp at exactly 17:00 still counts as within working hours.
pub const WORK_START_HOUR: u32 = 9;
pub const WORK_END_HOUR: u32 = 17;

/// Full-time annual entitlement: 25 days of 8 hours.
const FULL_TIME_CONTRACT_HOURS: f64 = 40.0;
const FULL_TIME_LEAVE_HOURS: f64 = 200.0;

/// Dutch national holidays observed every year: New Year's Day, King's Day,
/// Liberation Day, Christmas Day, Boxing Day.
const DEFAULT_HOLIDAYS: &[(u32, u32)] = &[(1, 1), (4, 27), (5, 5), (12, 25), (12, 26)];

/// Public-holiday table injected into [`LeaveRules`].
///
/// A recurring (month, day) set applies to every year; an explicit per-year
/// entry replaces the recurring set for that year, so locale- or
/// year-specific calendars can be loaded without touching the rules.
#[derive(Debug, Clone)]
pub struct HolidayCalendar {
    recurring: Vec<(u32, u32)>,
    by_year: HashMap<i32, HashSet<NaiveDate>>,
}

impl HolidayCalendar {
    pub fn with_recurring(days: &[(u32, u32)]) -> Self {
        Self {
            recurring: days.to_vec(),
            by_year: HashMap::new(),
        }
    }

    /// Replaces the holiday set for a single year.
    pub fn set_year(&mut self, year: i32, dates: impl IntoIterator<Item = NaiveDate>) {
        self.by_year.insert(year, dates.into_iter().collect());
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(dates) = self.by_year.get(&date.year()) {
            return dates.contains(&date);
        }
        self.recurring
            .iter()
            .any(|&(month, day)| date.month() == month && date.day() == day)
    }
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::with_recurring(DEFAULT_HOLIDAYS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialLeaveLimit {
    pub max_days: u32,
    pub max_hours: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProRataLeave {
    pub days: u32,
    pub hours: u32,
}

/// Outcome of validating a leave request. Errors block the request, warnings
/// are informational only. Every rule is evaluated, nothing short-circuits,
/// so the caller gets the complete violation set in one pass.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationResult {
    #[schema(example = false)]
    pub is_valid: bool,
    #[schema(example = json!(["Cannot schedule leave in the past"]))]
    pub errors: Vec<String>,
    #[schema(example = json!(["Leave includes weekend day: Sat Jul 06 2024"]))]
    pub warnings: Vec<String>,
}

/// The leave business rules. Stateless apart from the injected holiday
/// calendar; every method is a pure function over its inputs, so the whole
/// struct is shared freely across workers.
#[derive(Debug, Clone, Default)]
pub struct LeaveRules {
    holidays: HolidayCalendar,
}

impl LeaveRules {
    pub fn new(holidays: HolidayCalendar) -> Self {
        Self { holidays }
    }

    /// Monday through Friday.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Clock hour within [9, 17], inclusive on both ends.
    pub fn is_working_hours(&self, ts: NaiveDateTime) -> bool {
        (WORK_START_HOUR..=WORK_END_HOUR).contains(&ts.hour())
    }

    /// Calendar-day comparison against the injected holiday table,
    /// time-of-day ignored.
    pub fn is_public_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(date)
    }

    /// Sums the overlap between [start, end] and the 09:00-17:00 window of
    /// every working, non-holiday day in the range, in fractional hours.
    ///
    /// Only the first day honors the caller's exact start time; the cursor
    /// resets to 09:00 on every following day. Multi-day billed hours depend
    /// on this reset, so it must stay exactly as-is.
    pub fn working_hours_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> f64 {
        let mut total = 0.0;
        let mut cursor = start;

        while cursor <= end {
            let day = cursor.date();

            if self.is_working_day(day) && !self.is_public_holiday(day) {
                let window_start = at_hour(day, WORK_START_HOUR);
                let window_end = at_hour(day, WORK_END_HOUR);

                let effective_start = cursor.max(window_start);
                let effective_end = end.min(window_end);

                if effective_start < effective_end {
                    total += (effective_end - effective_start).num_seconds() as f64 / 3600.0;
                }
            }

            match day.succ_opt() {
                Some(next) => cursor = at_hour(next, WORK_START_HOUR),
                None => break,
            }
        }

        total
    }

    /// Per-type annual cap for special leave. Only parental care scales with
    /// the contract: ten times the weekly contract hours.
    pub fn special_leave_limit(
        &self,
        special_leave_type: SpecialLeaveType,
        contract_hours: u32,
    ) -> SpecialLeaveLimit {
        match special_leave_type {
            SpecialLeaveType::Moving => SpecialLeaveLimit {
                max_days: 1,
                max_hours: 8,
            },
            SpecialLeaveType::Wedding => SpecialLeaveLimit {
                max_days: 1,
                max_hours: 8,
            },
            SpecialLeaveType::ChildBirth => SpecialLeaveLimit {
                max_days: 5,
                max_hours: 40,
            },
            SpecialLeaveType::ParentalCare => {
                let max_hours = contract_hours.saturating_mul(10);
                SpecialLeaveLimit {
                    max_days: max_hours / 8,
                    max_hours,
                }
            }
        }
    }

    /// Validates a leave request against every business rule, accumulating
    /// errors and warnings. `now` is passed in so callers (and tests) control
    /// the clock.
    pub fn validate(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        leave_type: LeaveType,
        special_leave_type: Option<SpecialLeaveType>,
        now: NaiveDateTime,
    ) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if end <= start {
            errors.push("End date must be after start date".to_string());
        }

        if start < now {
            errors.push("Cannot schedule leave in the past".to_string());
        }

        let mut day = start.date();
        while day <= end.date() {
            if !self.is_working_day(day) {
                warnings.push(format!(
                    "Leave includes weekend day: {}",
                    day.format("%a %b %d %Y")
                ));
            }
            if self.is_public_holiday(day) {
                warnings.push(format!(
                    "Leave includes public holiday: {}",
                    day.format("%a %b %d %Y")
                ));
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        if !self.is_working_hours(start) {
            errors.push("Start time must be within working hours (9:00-17:00)".to_string());
        }
        if !self.is_working_hours(end) {
            errors.push("End time must be within working hours (9:00-17:00)".to_string());
        }

        if leave_type == LeaveType::Special {
            match special_leave_type {
                None => {
                    errors.push("Special leave type is required for special leaves".to_string());
                }
                Some(_) => {
                    if start < now + Duration::days(14) {
                        errors.push(
                            "Special leaves must be requested at least 2 weeks in advance"
                                .to_string(),
                        );
                    }
                }
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Annual entitlement scaled linearly by contract hours against the
    /// 40-hour full-time baseline, rounded to whole hours and days.
    pub fn pro_rata_entitlement(&self, contract_hours: u32) -> ProRataLeave {
        let ratio = contract_hours as f64 / FULL_TIME_CONTRACT_HOURS;
        let hours = (FULL_TIME_LEAVE_HOURS * ratio).round() as u32;
        let days = (hours as f64 / 8.0).round() as u32;
        ProRataLeave { days, hours }
    }
}

fn at_hour(day: NaiveDate, hour: u32) -> NaiveDateTime {
    day.and_hms_opt(hour, 0, 0).expect("whole clock hour")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> LeaveRules {
        LeaveRules::default()
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekdays_are_working_days() {
        let r = rules();
        // 2024-07-01 is a Monday
        assert!(r.is_working_day(date(2024, 7, 1)));
        assert!(r.is_working_day(date(2024, 7, 5)));
        assert!(!r.is_working_day(date(2024, 7, 6)));
        assert!(!r.is_working_day(date(2024, 7, 7)));
    }

    #[test]
    fn working_hours_bounds_are_inclusive() {
        let r = rules();
        assert!(!r.is_working_hours(dt(2024, 7, 1, 8, 59)));
        assert!(r.is_working_hours(dt(2024, 7, 1, 9, 0)));
        assert!(r.is_working_hours(dt(2024, 7, 1, 17, 0)));
        // 17:30 still has clock hour 17
        assert!(r.is_working_hours(dt(2024, 7, 1, 17, 30)));
        assert!(!r.is_working_hours(dt(2024, 7, 1, 18, 0)));
    }

    #[test]
    fn default_calendar_has_fixed_holidays_in_any_year() {
        let r = rules();
        for year in [2023, 2024, 2030] {
            assert!(r.is_public_holiday(date(year, 1, 1)));
            assert!(r.is_public_holiday(date(year, 4, 27)));
            assert!(r.is_public_holiday(date(year, 5, 5)));
            assert!(r.is_public_holiday(date(year, 12, 25)));
            assert!(r.is_public_holiday(date(year, 12, 26)));
        }
        assert!(!r.is_public_holiday(date(2024, 7, 1)));
    }

    #[test]
    fn injected_year_overrides_recurring_set() {
        let mut calendar = HolidayCalendar::default();
        calendar.set_year(2025, [date(2025, 3, 3)]);
        let r = LeaveRules::new(calendar);

        assert!(r.is_public_holiday(date(2025, 3, 3)));
        // the recurring table no longer applies to the overridden year
        assert!(!r.is_public_holiday(date(2025, 1, 1)));
        // other years still use the recurring table
        assert!(r.is_public_holiday(date(2024, 1, 1)));
    }

    #[test]
    fn single_day_in_hours_interval_bills_elapsed_time() {
        let r = rules();
        // Monday 10:00 to 14:30
        let hours = r.working_hours_between(dt(2024, 7, 1, 10, 0), dt(2024, 7, 1, 14, 30));
        assert_eq!(hours, 4.5);
    }

    #[test]
    fn full_working_day_is_eight_hours() {
        let r = rules();
        let hours = r.working_hours_between(dt(2024, 7, 1, 9, 0), dt(2024, 7, 1, 17, 0));
        assert_eq!(hours, 8.0);
    }

    #[test]
    fn weekend_only_range_bills_nothing() {
        let r = rules();
        // Saturday 09:00 through Sunday 17:00
        let hours = r.working_hours_between(dt(2024, 7, 6, 9, 0), dt(2024, 7, 7, 17, 0));
        assert_eq!(hours, 0.0);
    }

    #[test]
    fn holidays_are_skipped() {
        let r = rules();
        // 2024-12-25 and 26 are holidays (Wed/Thu); Fri the 27th is a working day
        let hours = r.working_hours_between(dt(2024, 12, 25, 9, 0), dt(2024, 12, 27, 17, 0));
        assert_eq!(hours, 8.0);
    }

    #[test]
    fn days_after_the_first_restart_at_nine() {
        let r = rules();
        // Monday 15:00 to Tuesday 17:00: 2h on Monday, then the cursor resets
        // to 09:00 so Tuesday bills the full 8h window.
        let hours = r.working_hours_between(dt(2024, 7, 1, 15, 0), dt(2024, 7, 2, 17, 0));
        assert_eq!(hours, 10.0);
    }

    #[test]
    fn multi_day_range_ends_mid_window() {
        let r = rules();
        // Monday 09:00 to Wednesday 13:00 = 8 + 8 + 4
        let hours = r.working_hours_between(dt(2024, 7, 1, 9, 0), dt(2024, 7, 3, 13, 0));
        assert_eq!(hours, 20.0);
    }

    #[test]
    fn special_leave_limits_match_policy_table() {
        let r = rules();
        assert_eq!(
            r.special_leave_limit(SpecialLeaveType::Moving, 40),
            SpecialLeaveLimit { max_days: 1, max_hours: 8 }
        );
        assert_eq!(
            r.special_leave_limit(SpecialLeaveType::Wedding, 32),
            SpecialLeaveLimit { max_days: 1, max_hours: 8 }
        );
        assert_eq!(
            r.special_leave_limit(SpecialLeaveType::ChildBirth, 40),
            SpecialLeaveLimit { max_days: 5, max_hours: 40 }
        );
        assert_eq!(
            r.special_leave_limit(SpecialLeaveType::ParentalCare, 40),
            SpecialLeaveLimit { max_days: 50, max_hours: 400 }
        );
        assert_eq!(
            r.special_leave_limit(SpecialLeaveType::ParentalCare, 32),
            SpecialLeaveLimit { max_days: 40, max_hours: 320 }
        );
    }

    #[test]
    fn parental_care_limit_saturates_on_absurd_contract_hours() {
        let r = rules();
        let limit = r.special_leave_limit(SpecialLeaveType::ParentalCare, u32::MAX);
        assert_eq!(limit.max_hours, u32::MAX);
        assert_eq!(limit.max_days, u32::MAX / 8);
    }

    #[test]
    fn pro_rata_scales_with_contract_hours() {
        let r = rules();
        assert_eq!(r.pro_rata_entitlement(40), ProRataLeave { days: 25, hours: 200 });
        // 100 hours rounds up to 13 days
        assert_eq!(r.pro_rata_entitlement(20), ProRataLeave { days: 13, hours: 100 });
        assert_eq!(r.pro_rata_entitlement(32), ProRataLeave { days: 20, hours: 160 });
    }

    #[test]
    fn clean_weekday_request_is_valid() {
        let r = rules();
        let now = dt(2024, 6, 30, 12, 0);
        // Monday 2024-07-01, 09:00-17:00
        let result = r.validate(
            dt(2024, 7, 1, 9, 0),
            dt(2024, 7, 1, 17, 0),
            LeaveType::Regular,
            None,
            now,
        );
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn past_start_always_errors() {
        let r = rules();
        let now = dt(2024, 7, 10, 12, 0);
        let result = r.validate(
            dt(2024, 7, 1, 9, 0),
            dt(2024, 7, 2, 17, 0),
            LeaveType::Regular,
            None,
            now,
        );
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e == "Cannot schedule leave in the past")
        );
    }

    #[test]
    fn inverted_range_collects_both_date_errors() {
        let r = rules();
        let now = dt(2024, 7, 10, 12, 0);
        let result = r.validate(
            dt(2024, 7, 2, 9, 0),
            dt(2024, 7, 1, 17, 0),
            LeaveType::Regular,
            None,
            now,
        );
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e == "End date must be after start date")
        );
        assert!(
            result
                .errors
                .iter()
                .any(|e| e == "Cannot schedule leave in the past")
        );
    }

    #[test]
    fn weekend_span_warns_per_day_but_stays_valid() {
        let r = rules();
        let now = dt(2024, 7, 1, 12, 0);
        // Friday 2024-07-05 through Monday 2024-07-08
        let result = r.validate(
            dt(2024, 7, 5, 9, 0),
            dt(2024, 7, 8, 17, 0),
            LeaveType::Regular,
            None,
            now,
        );
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn out_of_hours_boundaries_error() {
        let r = rules();
        let now = dt(2024, 6, 30, 12, 0);
        let result = r.validate(
            dt(2024, 7, 1, 8, 0),
            dt(2024, 7, 1, 18, 0),
            LeaveType::Regular,
            None,
            now,
        );
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.starts_with("Start time must be within working hours"))
        );
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.starts_with("End time must be within working hours"))
        );
    }

    #[test]
    fn special_without_subtype_always_errors() {
        let r = rules();
        let now = dt(2024, 7, 10, 12, 0);
        // past-dated on top of the missing subtype: both errors must surface
        let result = r.validate(
            dt(2024, 7, 1, 9, 0),
            dt(2024, 7, 2, 17, 0),
            LeaveType::Special,
            None,
            now,
        );
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e == "Special leave type is required for special leaves")
        );
        assert!(
            result
                .errors
                .iter()
                .any(|e| e == "Cannot schedule leave in the past")
        );
    }

    #[test]
    fn special_needs_two_weeks_notice() {
        let r = rules();
        let now = dt(2024, 7, 1, 12, 0);

        let short_notice = r.validate(
            dt(2024, 7, 8, 9, 0),
            dt(2024, 7, 8, 17, 0),
            LeaveType::Special,
            Some(SpecialLeaveType::Moving),
            now,
        );
        assert!(!short_notice.is_valid);
        assert!(
            short_notice
                .errors
                .iter()
                .any(|e| e == "Special leaves must be requested at least 2 weeks in advance")
        );

        // Tuesday 2024-07-16 is more than 14 days out
        let enough_notice = r.validate(
            dt(2024, 7, 16, 9, 0),
            dt(2024, 7, 16, 17, 0),
            LeaveType::Special,
            Some(SpecialLeaveType::Moving),
            now,
        );
        assert!(enough_notice.is_valid, "{:?}", enough_notice.errors);
    }
}
