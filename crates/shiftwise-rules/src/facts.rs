//! Named, typed values available to rule conditions.

use std::collections::BTreeMap;

use shiftwise_core::FactValue;

/// Fact names populated by the engine for every assignment.
pub mod names {
    pub const EMPLOYEE_ID: &str = "employee.id";
    /// Hours in the ISO week of the shift, this shift included.
    pub const EMPLOYEE_WEEKLY_HOURS: &str = "employee.weeklyHours";
    /// Hours in the rolling detection window ending at the shift end.
    pub const EMPLOYEE_WINDOW_HOURS: &str = "employee.windowHours";
    pub const EMPLOYEE_SHIFT_COUNT: &str = "employee.shiftCount";
    /// Consecutive worked days ending on the shift date.
    pub const EMPLOYEE_CONSECUTIVE_DAYS: &str = "employee.consecutiveDays";
    pub const SHIFT_DURATION_MINUTES: &str = "shift.durationMinutes";
    pub const SHIFT_START_HOUR: &str = "shift.startHour";
    pub const SHIFT_END_HOUR: &str = "shift.endHour";
    pub const SHIFT_AREA: &str = "shift.area";
    /// True when the shift touches 22:00-06:00.
    pub const SHIFT_IS_NIGHT: &str = "shift.isNight";
    pub const SHIFT_IS_SPLIT: &str = "shift.isSplit";
    pub const SHIFT_SOURCE: &str = "shift.source";
    /// ISO weekday, 1 = Monday.
    pub const DATE_DAY_OF_WEEK: &str = "date.dayOfWeek";
    pub const DATE_IS_WEEKEND: &str = "date.isWeekend";
    pub const DATE_IS_HOLIDAY: &str = "date.isHoliday";
    pub const DATE_ISO: &str = "date.iso";

    pub const ALL: [&str; 16] = [
        EMPLOYEE_ID,
        EMPLOYEE_WEEKLY_HOURS,
        EMPLOYEE_WINDOW_HOURS,
        EMPLOYEE_SHIFT_COUNT,
        EMPLOYEE_CONSECUTIVE_DAYS,
        SHIFT_DURATION_MINUTES,
        SHIFT_START_HOUR,
        SHIFT_END_HOUR,
        SHIFT_AREA,
        SHIFT_IS_NIGHT,
        SHIFT_IS_SPLIT,
        SHIFT_SOURCE,
        DATE_DAY_OF_WEEK,
        DATE_IS_WEEKEND,
        DATE_IS_HOLIDAY,
        DATE_ISO,
    ];
}

/// The set of facts one condition evaluation can read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactContext {
    values: BTreeMap<String, FactValue>,
}

impl FactContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<FactValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<FactValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FactValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
