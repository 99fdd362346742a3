//! Plain-text rendering for terminal output.

use std::fmt::Display;

use cadence_core::{DashboardStats, DueBuckets, Recommendation, ReconcileOutcome, ScheduledTopic};
use chrono::{DateTime, TimeZone, Utc};

fn when<Tz: TimeZone>(at: Option<&DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    match at {
        Some(at) => at.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string(),
        None => "not scheduled".to_string(),
    }
}

/// Topics grouped by due bucket. Empty buckets are skipped.
pub fn overview<Tz: TimeZone>(buckets: &DueBuckets<ScheduledTopic>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    if buckets.is_empty() {
        return "No topics yet.\n".to_string();
    }

    let mut out = String::new();
    for (bucket, items) in buckets.iter().filter(|(_, items)| !items.is_empty()) {
        out.push_str(&format!("{} ({})\n", bucket, items.len()));
        for item in items {
            out.push_str(&format!(
                "  {} / {} / {}  {:>3}%  {}\n",
                item.subject,
                item.subskill,
                item.topic.name,
                item.topic.performance.as_percent(),
                when(item.topic.next_review.as_ref(), tz),
            ));
        }
    }
    out
}

/// The statistics panel as one line.
pub fn stats(stats: &DashboardStats) -> String {
    format!(
        "Topics: {}  Average: {}%  Due: {}\n",
        stats.total_topics, stats.average_performance, stats.due_count
    )
}

/// The recommended reviews, in server order.
pub fn recommendations<Tz: TimeZone>(recs: &[Recommendation], tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    if recs.is_empty() {
        return "Nothing due.\n".to_string();
    }

    let mut out = String::new();
    for rec in recs {
        out.push_str(&format!(
            "[{}] {} / {} / {}  {:>3}%  {}\n",
            rec.topic_id,
            rec.subject,
            rec.subskill,
            rec.topic,
            rec.performance.as_percent(),
            when(rec.next_review.as_ref(), tz),
        ));
    }
    out
}

/// One line describing a reconciled review.
pub fn outcome<Tz: TimeZone>(outcome: &ReconcileOutcome, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    if outcome.stale {
        return format!("Topic {}: newer review already recorded\n", outcome.topic_id);
    }
    let mut line = format!(
        "Topic {}: next review {}, half-life {:.1} days",
        outcome.topic_id,
        when(Some(&outcome.update.next_review), tz),
        outcome.update.halflife,
    );
    if outcome.dropped_from_cache {
        line.push_str(", mastered");
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{categorize, Performance, ScheduleUpdate, Topic, TopicId};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn scheduled(id: u64, name: &str, next: Option<DateTime<Utc>>) -> ScheduledTopic {
        let mut topic = Topic::new(TopicId::from(id), name).with_performance(Performance::clamped(0.55));
        topic.next_review = next;
        ScheduledTopic {
            subject: "Math".to_string(),
            subskill: "Algebra".to_string(),
            topic,
        }
    }

    #[test]
    fn test_overview_skips_empty_buckets() {
        let buckets = categorize(
            vec![
                scheduled(1, "Quadratics", Some(now() - chrono::Duration::days(1))),
                scheduled(2, "Vectors", None),
            ],
            now(),
        );
        let text = overview(&buckets, &Utc);
        assert_eq!(
            text,
            "Overdue (1)\n  Math / Algebra / Quadratics   55%  2026-10-16 12:00\n\
             Unscheduled (1)\n  Math / Algebra / Vectors   55%  not scheduled\n"
        );
        assert!(!text.contains("Today"));
    }

    #[test]
    fn test_overview_empty() {
        let buckets: DueBuckets<ScheduledTopic> = categorize(Vec::new(), now());
        assert_eq!(overview(&buckets, &Utc), "No topics yet.\n");
    }

    #[test]
    fn test_this_week_label() {
        let buckets = categorize(
            vec![scheduled(1, "Circles", Some(now() + chrono::Duration::days(4)))],
            now(),
        );
        assert!(overview(&buckets, &Utc).starts_with("This Week (1)\n"));
    }

    #[test]
    fn test_stats_line() {
        let panel = DashboardStats {
            total_topics: 4,
            average_performance: 63,
            due_count: 2,
        };
        assert_eq!(stats(&panel), "Topics: 4  Average: 63%  Due: 2\n");
        assert_eq!(
            stats(&DashboardStats::default()),
            "Topics: 0  Average: 0%  Due: 0\n"
        );
    }

    #[test]
    fn test_recommendations() {
        let recs = vec![Recommendation::new(TopicId::from(3), "Math", "Algebra", "Vectors")
            .with_next_review(now())];
        assert_eq!(
            recommendations(&recs, &Utc),
            "[3] Math / Algebra / Vectors    0%  2026-10-17 12:00\n"
        );
        assert_eq!(recommendations(&[], &Utc), "Nothing due.\n");
    }

    #[test]
    fn test_outcome_line() {
        let outcome = ReconcileOutcome {
            topic_id: TopicId::from(3),
            update: ScheduleUpdate {
                next_review: now(),
                halflife: 2.5,
            },
            merged: true,
            stale: false,
            dropped_from_cache: true,
            refill: None,
        };
        assert_eq!(
            super::outcome(&outcome, &Utc),
            "Topic 3: next review 2026-10-17 12:00, half-life 2.5 days, mastered\n"
        );
    }
}
