use fitness_tracker::services::{monthly_summary, SummaryError};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use crate::common::{utc, FailingStore, InMemorySessionStore, MockDataGenerator};

#[tokio::test]
async fn test_monthly_summary_sums_the_month() {
    let store = InMemorySessionStore::new();
    let user_id = Uuid::new_v4();

    store.insert(MockDataGenerator::session_with(user_id, utc(2024, 3, 1, 0, 0, 0), 3600, 500, 8.0));
    store.insert(MockDataGenerator::session_with(user_id, utc(2024, 3, 14, 18, 0, 0), 1800, 300, 4.5));
    store.insert(MockDataGenerator::session_with(user_id, utc(2024, 3, 31, 23, 59, 59), 61, 0, 0.0));

    let report = monthly_summary(&store, user_id, 3, 2024).await.unwrap();

    assert_eq!(report.total_duration_seconds, 5461);
    assert_eq!(report.total_calories, 800);
    assert_eq!(report.total_distance_km, 12.5);
    assert_eq!(report.formatted_duration, "1 Std, 31 Min, 1 Sek");
}

#[tokio::test]
async fn test_monthly_summary_excludes_neighbouring_months_and_users() {
    let store = InMemorySessionStore::new();
    let user_id = Uuid::new_v4();

    store.insert(MockDataGenerator::session_with(user_id, utc(2024, 2, 29, 23, 59, 59), 100, 10, 1.0));
    store.insert(MockDataGenerator::session_with(user_id, utc(2024, 4, 1, 0, 0, 0), 100, 10, 1.0));
    store.insert(MockDataGenerator::session_with(Uuid::new_v4(), utc(2024, 3, 10, 9, 0, 0), 100, 10, 1.0));
    store.insert(MockDataGenerator::session_with(user_id, utc(2024, 3, 10, 9, 0, 0), 42, 7, 0.5));

    let report = monthly_summary(&store, user_id, 3, 2024).await.unwrap();

    assert_eq!(report.total_duration_seconds, 42);
    assert_eq!(report.total_calories, 7);
    assert_eq!(report.total_distance_km, 0.5);
}

#[tokio::test]
async fn test_monthly_summary_of_empty_month() {
    let store = InMemorySessionStore::new();

    let report = monthly_summary(&store, Uuid::new_v4(), 7, 2023).await.unwrap();

    assert_eq!(report.total_duration_seconds, 0);
    assert_eq!(report.formatted_duration, "0 Std, 0 Min, 0 Sek");
}

#[tokio::test]
async fn test_monthly_summary_errors() {
    let store = InMemorySessionStore::new();
    assert!(matches!(
        monthly_summary(&store, Uuid::new_v4(), 13, 2024).await,
        Err(SummaryError::InvalidMonth { month: 13, .. })
    ));

    assert!(matches!(
        monthly_summary(&FailingStore, Uuid::new_v4(), 3, 2024).await,
        Err(SummaryError::Store(_))
    ));
}
