use crate::cache::TtlCache;
use crate::error::{AppError, AppResult};
use crate::models::{Company, StockPrice};
use crate::pricing::{PerformancePeriod, PriceChangeCalculator};
use crate::repositories::StockPriceRepository;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One observed price, rendered at the canonical scale
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PricePoint {
    pub traded_on: NaiveDate,
    pub price: String,
}

impl From<&StockPrice> for PricePoint {
    fn from(row: &StockPrice) -> Self {
        Self {
            traded_on: row.traded_on,
            price: row.price_value().value(),
        }
    }
}

/// Performance of one reporting period relative to the latest price
#[derive(Debug, Clone, Serialize)]
pub struct PeriodPerformance {
    pub period: String,
    pub baseline: Option<PricePoint>,
    /// Fractional change at six digits; absent when no meaningful
    /// comparison exists for the period
    pub change: Option<String>,
    pub formatted: String,
}

/// Cached multi-period performance read model for one company
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub company_id: i64,
    pub as_of: Option<NaiveDate>,
    pub latest: Option<PricePoint>,
    pub periods: Vec<PeriodPerformance>,
}

/// Exact-date price comparison
#[derive(Debug, Clone, Serialize)]
pub struct PriceComparison {
    pub from: PricePoint,
    pub to: PricePoint,
    pub change: Option<String>,
    pub formatted: String,
}

/// Computes period performance summaries and price comparisons
///
/// Summaries are cached with the company's `updated_at` baked into the
/// key, so ingesting new prices makes stale entries unreachable instead
/// of requiring explicit invalidation.
pub struct PerformanceService {
    prices: Arc<StockPriceRepository>,
    calculator: PriceChangeCalculator,
    cache: TtlCache<PerformanceSummary>,
}

impl PerformanceService {
    /// Create a new PerformanceService
    pub fn new(prices: Arc<StockPriceRepository>, cache_ttl: Duration) -> Self {
        Self {
            prices,
            calculator: PriceChangeCalculator::default(),
            cache: TtlCache::new(cache_ttl),
        }
    }

    /// Performance of `company` across `periods`, measured against the
    /// latest recorded price (optionally bounded by `as_of`)
    pub async fn summary(
        &self,
        company: &Company,
        as_of: Option<NaiveDate>,
        periods: &[PerformancePeriod],
    ) -> AppResult<PerformanceSummary> {
        let key = cache_key(company, as_of, periods);

        if let Some(cached) = self.cache.get(&key) {
            debug!(company = company.id, "performance summary served from cache");
            return Ok(cached);
        }

        let latest = self.prices.latest(company.id, as_of).await?;

        let mut entries = Vec::with_capacity(periods.len());
        for period in periods {
            entries.push(self.period_entry(company.id, *period, latest.as_ref()).await?);
        }

        let summary = PerformanceSummary {
            company_id: company.id,
            as_of,
            latest: latest.as_ref().map(PricePoint::from),
            periods: entries,
        };

        self.cache.put(&key, summary.clone());
        Ok(summary)
    }

    /// Change between the prices recorded on two exact dates
    pub async fn comparison(
        &self,
        company: &Company,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<PriceComparison> {
        let from_price = self.price_on(company.id, from).await?;
        let to_price = self.price_on(company.id, to).await?;

        let change = self.calculator.percentage(
            Some(&from_price.price_value()),
            Some(&to_price.price_value()),
        );

        Ok(PriceComparison {
            from: PricePoint::from(&from_price),
            to: PricePoint::from(&to_price),
            formatted: self.calculator.formatted(change.as_ref()),
            change: change.map(|c| c.to_string()),
        })
    }

    async fn price_on(&self, company_id: i64, date: NaiveDate) -> AppResult<StockPrice> {
        self.prices
            .find_on(company_id, date)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No stock price recorded on {}.", date))
            })
    }

    async fn period_entry(
        &self,
        company_id: i64,
        period: PerformancePeriod,
        latest: Option<&StockPrice>,
    ) -> AppResult<PeriodPerformance> {
        let Some(latest) = latest else {
            return Ok(empty_entry(period, None));
        };

        // Anchored and rolling targets resolve relative to the latest
        // trade date, not the requested as-of day: an as-of falling on a
        // non-trading day must not shift period targets past real trades
        let anchor = latest.traded_on;

        let baseline = self.baseline(company_id, period, anchor).await?;

        let Some(baseline) = baseline else {
            return Ok(empty_entry(period, None));
        };

        // A baseline on the same day as the latest price measures nothing
        if baseline.traded_on == latest.traded_on {
            return Ok(empty_entry(period, Some(PricePoint::from(&baseline))));
        }

        let change = self.calculator.percentage(
            Some(&baseline.price_value()),
            Some(&latest.price_value()),
        );

        Ok(PeriodPerformance {
            period: period.as_str().to_string(),
            baseline: Some(PricePoint::from(&baseline)),
            formatted: self.calculator.formatted(change.as_ref()),
            change: change.map(|c| c.to_string()),
        })
    }

    /// Baseline price a period measures from
    ///
    /// MAX anchors at the oldest record, YTD at the first trade of the
    /// anchor year. Rolling periods target the anchor date minus the
    /// period offset, preferring the first trade on or after the target
    /// and falling back to the last trade before it.
    async fn baseline(
        &self,
        company_id: i64,
        period: PerformancePeriod,
        anchor: NaiveDate,
    ) -> AppResult<Option<StockPrice>> {
        match period {
            PerformancePeriod::Max => Ok(self.prices.oldest(company_id).await?),
            PerformancePeriod::YearToDate => {
                let Some(year_start) = NaiveDate::from_ymd_opt(anchor.year(), 1, 1) else {
                    return Ok(None);
                };
                Ok(self
                    .prices
                    .first_in_range(company_id, year_start, anchor)
                    .await?)
            }
            _ => {
                let Some(target) = period.target_date(anchor) else {
                    return Ok(None);
                };

                if let Some(price) = self.prices.first_on_or_after(company_id, target).await? {
                    return Ok(Some(price));
                }

                Ok(self.prices.last_on_or_before(company_id, target).await?)
            }
        }
    }
}

fn empty_entry(period: PerformancePeriod, baseline: Option<PricePoint>) -> PeriodPerformance {
    PeriodPerformance {
        period: period.as_str().to_string(),
        baseline,
        change: None,
        formatted: "none".to_string(),
    }
}

/// Cache key carrying every input that can change the summary
///
/// Period codes are sorted before hashing so the same set requested in a
/// different order hits the same entry.
fn cache_key(
    company: &Company,
    as_of: Option<NaiveDate>,
    periods: &[PerformancePeriod],
) -> String {
    let mut codes: Vec<&str> = periods.iter().map(PerformancePeriod::as_str).collect();
    codes.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(codes.join(",").as_bytes());
    let digest = hex::encode(hasher.finalize());

    let as_of_part = as_of
        .map(|date| date.to_string())
        .unwrap_or_else(|| "latest".to_string());

    format!(
        "stock-performance:{}:{}:{}:{}",
        company.id,
        company.updated_at.and_utc().timestamp(),
        as_of_part,
        digest
    )
}
