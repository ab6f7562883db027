mod performance;

pub use performance::{
    PerformanceService, PeriodPerformance, PerformanceSummary, PriceComparison, PricePoint,
};
