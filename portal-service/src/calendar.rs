use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use pena_shared::models::{Event, EventStatus};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub start_time: NaiveTime,
    pub location: String,
    pub status: EventStatus,
    /// True when the event started on an earlier day.
    pub continued: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub events: Vec<CalendarEntry>,
}

/// First and last day of a month, or `None` for an invalid year/month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first - Duration::days(1)))
}

/// Groups events by the days of the month they cover. Days without events
/// are omitted; within a day events are ordered by start time.
pub fn build_month(events: &[Event], year: i32, month: u32) -> Option<Vec<CalendarDay>> {
    let (first, last) = month_bounds(year, month)?;
    let mut days = Vec::new();

    let mut day = first;
    while day <= last {
        let mut entries: Vec<CalendarEntry> = events
            .iter()
            .filter(|e| e.covers(day))
            .map(|e| CalendarEntry {
                id: e.id.clone(),
                slug: e.slug.clone(),
                title: e.title.clone(),
                start_time: e.start_time,
                location: e.location.clone(),
                status: e.status,
                continued: e.start_date < day,
            })
            .collect();

        if !entries.is_empty() {
            entries.sort_by(|a, b| {
                // Ongoing events first, then by start time
                b.continued
                    .cmp(&a.continued)
                    .then(a.start_time.cmp(&b.start_time))
                    .then(a.title.cmp(&b.title))
            });
            days.push(CalendarDay {
                date: day,
                events: entries,
            });
        }

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    debug_assert!(days.iter().all(|d| d.date.month() == month));
    Some(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, start: (i32, u32, u32), end: (i32, u32, u32), hour: u32) -> Event {
        Event {
            id: id.to_string(),
            slug: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            end_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            location: String::new(),
            capacity: 10,
            price: 0.0,
            min_age: None,
            collaborators: vec![],
            participants: vec![],
            organizer: "org".to_string(),
            tags: vec![],
            image_url: None,
            status: EventStatus::Active,
            created_at: String::new(),
            updated_at: String::new(),
            version: 0,
        }
    }

    #[test]
    fn test_month_bounds() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = month_bounds(2023, 12).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        assert!(month_bounds(2024, 13).is_none());
        assert!(month_bounds(2024, 0).is_none());
    }

    #[test]
    fn test_multi_day_event_appears_on_each_day_in_month() {
        let events = vec![
            event("fiestas", (2024, 6, 29), (2024, 7, 2), 18),
            event("concierto", (2024, 7, 1), (2024, 7, 1), 12),
            event("agosto", (2024, 8, 1), (2024, 8, 1), 12),
        ];

        let days = build_month(&events, 2024, 7).unwrap();
        let dates: Vec<u32> = days.iter().map(|d| d.date.day()).collect();
        assert_eq!(dates, vec![1, 2]);

        let first = &days[0];
        assert_eq!(first.events.len(), 2);
        assert_eq!(first.events[0].id, "fiestas");
        assert!(first.events[0].continued);
        assert_eq!(first.events[1].id, "concierto");
        assert!(!first.events[1].continued);
    }

    #[test]
    fn test_empty_month() {
        assert!(build_month(&[], 2024, 1).unwrap().is_empty());
    }
}
