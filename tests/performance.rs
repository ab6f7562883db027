mod helpers;

use helpers::{create_company, date, seed_price, test_state};
use stock_backend::models::Company;
use stock_backend::pricing::PerformancePeriod;
use stock_backend::AppState;

async fn seeded_company(state: &AppState) -> Company {
    let company = create_company(state, "Acme Corp", "ACME").await;
    seed_price(state, company.id, date(2024, 3, 30), "70").await;
    seed_price(state, company.id, date(2024, 4, 12), "72").await;
    seed_price(state, company.id, date(2024, 5, 10), "75").await;
    company
}

#[tokio::test]
async fn test_one_month_baseline_snaps_to_next_trading_day() {
    let (state, _dir) = test_state(10).await;
    let company = seeded_company(&state).await;

    let summary = state
        .performance
        .summary(
            &company,
            Some(date(2024, 5, 10)),
            &[PerformancePeriod::OneMonth],
        )
        .await
        .unwrap();

    // Target 2024-04-10 has no trade; the next trading day (04-12) is the
    // baseline: 75 / 72 - 1
    let entry = &summary.periods[0];
    assert_eq!(entry.period, "1M");
    assert_eq!(
        entry.baseline.as_ref().unwrap().traded_on,
        date(2024, 4, 12)
    );
    assert_eq!(entry.change.as_deref(), Some("0.041667"));
    assert_eq!(entry.formatted, "4.17%");
}

#[tokio::test]
async fn test_max_and_ytd_anchor_at_the_oldest_trades() {
    let (state, _dir) = test_state(10).await;
    let company = seeded_company(&state).await;

    let summary = state
        .performance
        .summary(
            &company,
            Some(date(2024, 5, 10)),
            &[PerformancePeriod::Max, PerformancePeriod::YearToDate],
        )
        .await
        .unwrap();

    for entry in &summary.periods {
        assert_eq!(
            entry.baseline.as_ref().unwrap().traded_on,
            date(2024, 3, 30)
        );
        assert_eq!(entry.change.as_deref(), Some("0.071429"));
        assert_eq!(entry.formatted, "7.14%");
    }
}

#[tokio::test]
async fn test_baseline_on_latest_trade_date_yields_null_entry() {
    let (state, _dir) = test_state(10).await;
    let company = seeded_company(&state).await;

    // 1D targets 05-09; the first trade on or after it is the latest
    // price itself, which measures nothing
    let summary = state
        .performance
        .summary(
            &company,
            Some(date(2024, 5, 10)),
            &[PerformancePeriod::OneDay],
        )
        .await
        .unwrap();

    let entry = &summary.periods[0];
    assert_eq!(entry.change, None);
    assert_eq!(entry.formatted, "none");
}

#[tokio::test]
async fn test_single_price_company_reports_all_null() {
    let (state, _dir) = test_state(10).await;
    let company = create_company(&state, "Acme Corp", "ACME").await;
    seed_price(&state, company.id, date(2024, 5, 10), "75").await;

    let periods = PerformancePeriod::all();
    let summary = state
        .performance
        .summary(&company, None, &periods)
        .await
        .unwrap();

    assert_eq!(summary.periods.len(), periods.len());
    assert!(summary.latest.is_some());
    for entry in &summary.periods {
        assert_eq!(entry.change, None);
        assert_eq!(entry.formatted, "none");
    }
}

#[tokio::test]
async fn test_company_without_prices_reports_all_null() {
    let (state, _dir) = test_state(10).await;
    let company = create_company(&state, "Acme Corp", "ACME").await;

    let summary = state
        .performance
        .summary(&company, None, &[PerformancePeriod::Max])
        .await
        .unwrap();

    assert!(summary.latest.is_none());
    assert_eq!(summary.periods[0].change, None);
    assert_eq!(summary.periods[0].formatted, "none");
}

#[tokio::test]
async fn test_as_of_bounds_the_latest_price() {
    let (state, _dir) = test_state(10).await;
    let company = seeded_company(&state).await;

    let summary = state
        .performance
        .summary(
            &company,
            Some(date(2024, 4, 30)),
            &[PerformancePeriod::Max],
        )
        .await
        .unwrap();

    // 05-10 is out of range; the latest becomes 04-12: 72 / 70 - 1
    assert_eq!(
        summary.latest.as_ref().unwrap().traded_on,
        date(2024, 4, 12)
    );
    assert_eq!(summary.periods[0].change.as_deref(), Some("0.028571"));
    assert_eq!(summary.periods[0].formatted, "2.86%");
}

#[tokio::test]
async fn test_rolling_window_spanning_a_trade_gap_yields_null() {
    let (state, _dir) = test_state(10).await;
    let company = create_company(&state, "Acme Corp", "ACME").await;
    seed_price(&state, company.id, date(2024, 1, 5), "70").await;
    seed_price(&state, company.id, date(2024, 3, 1), "80").await;

    // 1M anchors at the latest trade (03-01) and targets 02-01; the
    // first trade on or after the target is the latest price itself,
    // so the window has nothing to compare against
    let summary = state
        .performance
        .summary(&company, None, &[PerformancePeriod::OneMonth])
        .await
        .unwrap();

    let entry = &summary.periods[0];
    assert_eq!(
        entry.baseline.as_ref().unwrap().traded_on,
        date(2024, 3, 1)
    );
    assert_eq!(entry.change, None);
    assert_eq!(entry.formatted, "none");
}

#[tokio::test]
async fn test_period_targets_anchor_at_the_latest_trade_not_the_as_of_day() {
    let (state, _dir) = test_state(10).await;
    let company = create_company(&state, "Acme Corp", "ACME").await;
    seed_price(&state, company.id, date(2024, 4, 10), "70").await;
    seed_price(&state, company.id, date(2024, 5, 10), "75").await;

    // 05-12 is a non-trading day; the 1M target must come from the
    // latest trade (05-10 -> 04-10), not from the raw as-of (which
    // would skip past the 04-10 trade and collapse the entry)
    let summary = state
        .performance
        .summary(
            &company,
            Some(date(2024, 5, 12)),
            &[PerformancePeriod::OneMonth],
        )
        .await
        .unwrap();

    let entry = &summary.periods[0];
    assert_eq!(
        entry.baseline.as_ref().unwrap().traded_on,
        date(2024, 4, 10)
    );
    assert_eq!(entry.change.as_deref(), Some("0.071429"));
    assert_eq!(entry.formatted, "7.14%");
}

#[tokio::test]
async fn test_ytd_uses_the_latest_trade_year_when_as_of_crosses_into_the_next() {
    let (state, _dir) = test_state(10).await;
    let company = create_company(&state, "Acme Corp", "ACME").await;
    seed_price(&state, company.id, date(2024, 2, 1), "70").await;
    seed_price(&state, company.id, date(2024, 12, 30), "75").await;

    // An as-of in early January must not move the YTD window into a
    // year with no trades yet
    let summary = state
        .performance
        .summary(
            &company,
            Some(date(2025, 1, 5)),
            &[PerformancePeriod::YearToDate],
        )
        .await
        .unwrap();

    let entry = &summary.periods[0];
    assert_eq!(
        entry.baseline.as_ref().unwrap().traded_on,
        date(2024, 2, 1)
    );
    assert_eq!(entry.change.as_deref(), Some("0.071429"));
    assert_eq!(entry.formatted, "7.14%");
}

#[tokio::test]
async fn test_summary_is_cached_until_the_company_changes() {
    let (state, _dir) = test_state(10).await;
    let company = seeded_company(&state).await;
    let periods = [PerformancePeriod::Max];

    let first = state
        .performance
        .summary(&company, None, &periods)
        .await
        .unwrap();

    // New data lands without touching the company: same key, stale answer
    seed_price(&state, company.id, date(2024, 5, 11), "150").await;
    let cached = state
        .performance
        .summary(&company, None, &periods)
        .await
        .unwrap();
    assert_eq!(
        cached.latest.as_ref().unwrap().traded_on,
        first.latest.as_ref().unwrap().traded_on
    );

    // Touching updated_at (as ingestion does) changes the key
    state
        .companies
        .touch(company.id, state.clock.now().naive_utc() + chrono::Duration::seconds(1))
        .await
        .unwrap();
    let company = state
        .companies
        .find_by_id(company.id)
        .await
        .unwrap()
        .unwrap();

    let fresh = state
        .performance
        .summary(&company, None, &periods)
        .await
        .unwrap();
    assert_eq!(
        fresh.latest.as_ref().unwrap().traded_on,
        date(2024, 5, 11)
    );
}

#[tokio::test]
async fn test_comparison_between_exact_dates() {
    let (state, _dir) = test_state(10).await;
    let company = seeded_company(&state).await;

    let comparison = state
        .performance
        .comparison(&company, date(2024, 3, 30), date(2024, 5, 10))
        .await
        .unwrap();

    assert_eq!(comparison.from.price, "70.000000");
    assert_eq!(comparison.to.price, "75.000000");
    assert_eq!(comparison.change.as_deref(), Some("0.071429"));
    assert_eq!(comparison.formatted, "7.14%");
}

#[tokio::test]
async fn test_comparison_requires_prices_on_both_dates() {
    let (state, _dir) = test_state(10).await;
    let company = seeded_company(&state).await;

    let err = state
        .performance
        .comparison(&company, date(2024, 3, 30), date(2024, 5, 9))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
