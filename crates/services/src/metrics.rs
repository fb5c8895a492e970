use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramTimer, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use tipster_db::GradeReport;
use tipster_models::MergeReport;

/// Pipeline counters on a private registry, rendered for `/metrics`.
pub struct PipelineMetrics {
    registry: Registry,
    resolutions: IntCounterVec,
    adapter_attempts: IntCounterVec,
    ledger_records: IntCounterVec,
    graded: IntCounterVec,
    workers_spawned: IntCounter,
    selection_seconds: Histogram,
}

impl PipelineMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("tipster".into()), None)?;

        let resolutions = IntCounterVec::new(
            Opts::new("resolutions_total", "League resolutions by outcome"),
            &["league", "outcome"],
        )?;
        let adapter_attempts = IntCounterVec::new(
            Opts::new("adapter_attempts_total", "Source adapter calls by result"),
            &["provider", "result"],
        )?;
        let ledger_records = IntCounterVec::new(
            Opts::new("ledger_records_total", "Ledger merge effects per record"),
            &["action"],
        )?;
        let graded = IntCounterVec::new(
            Opts::new("graded_predictions_total", "Predictions graded by the reconciler"),
            &["result"],
        )?;
        let workers_spawned = IntCounter::new("workers_spawned_total", "Worker records created")?;
        let selection_seconds = Histogram::with_opts(
            HistogramOpts::new("selection_duration_seconds", "End-to-end league selection latency")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        registry.register(Box::new(resolutions.clone()))?;
        registry.register(Box::new(adapter_attempts.clone()))?;
        registry.register(Box::new(ledger_records.clone()))?;
        registry.register(Box::new(graded.clone()))?;
        registry.register(Box::new(workers_spawned.clone()))?;
        registry.register(Box::new(selection_seconds.clone()))?;

        Ok(Self {
            registry,
            resolutions,
            adapter_attempts,
            ledger_records,
            graded,
            workers_spawned,
            selection_seconds,
        })
    }

    pub fn record_resolution(&self, league: &str, outcome: &str) {
        self.resolutions.with_label_values(&[league, outcome]).inc();
    }

    pub fn record_attempt(&self, provider: &str, result: &str) {
        self.adapter_attempts.with_label_values(&[provider, result]).inc();
    }

    pub fn record_merge(&self, report: &MergeReport) {
        let counts = [
            ("inserted", report.inserted),
            ("updated", report.updated),
            ("dropped", report.dropped),
            ("protected", report.protected),
            ("conflict", report.conflicts.len()),
        ];
        for (action, count) in counts {
            self.ledger_records.with_label_values(&[action]).inc_by(count as u64);
        }
    }

    pub fn record_grades(&self, report: &GradeReport) {
        self.graded.with_label_values(&["correct"]).inc_by(report.correct as u64);
        self.graded
            .with_label_values(&["incorrect"])
            .inc_by(report.graded.saturating_sub(report.correct) as u64);
    }

    pub fn record_worker_spawned(&self) {
        self.workers_spawned.inc();
    }

    /// Observes on drop.
    pub fn selection_timer(&self) -> HistogramTimer {
        self.selection_seconds.start_timer()
    }

    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
