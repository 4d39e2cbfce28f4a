use crate::domain::Entity;
use crate::clear::ClearReport;
use std::fmt;
use std::ops::AddAssign;

/// Outcome counters for one loader call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadResult {
    pub success: u64,
    pub error: u64,
    pub skipped: u64,
}

impl LoadResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_success(&mut self) {
        self.success += 1;
    }

    pub fn inc_error(&mut self) {
        self.error += 1;
    }

    pub fn inc_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn total(&self) -> u64 {
        self.success + self.error + self.skipped
    }

    /// Did at least one row make it into the store.
    pub fn any_succeeded(&self) -> bool {
        self.success > 0
    }
}

impl AddAssign for LoadResult {
    fn add_assign(&mut self, rhs: Self) {
        self.success += rhs.success;
        self.error += rhs.error;
        self.skipped += rhs.skipped;
    }
}

impl fmt::Display for LoadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} successful, {} failed, {} skipped",
            self.success, self.error, self.skipped
        )
    }
}

/// Row count read back from the store after loading.
#[derive(Debug, Clone)]
pub struct VerifiedCount {
    pub entity: Entity,
    pub rows: i64,
}

/// Everything one domain run produced, in stage order.
#[derive(Debug, Default)]
pub struct DomainReport {
    pub domain: &'static str,
    pub cleared: ClearReport,
    pub stages: Vec<(Entity, LoadResult)>,
    pub verified: Vec<VerifiedCount>,
}

impl DomainReport {
    pub fn new(domain: &'static str) -> Self {
        Self {
            domain,
            ..Self::default()
        }
    }

    pub fn result_for(&self, entity: Entity) -> Option<LoadResult> {
        self.stages
            .iter()
            .find(|(e, _)| *e == entity)
            .map(|(_, r)| *r)
    }

    pub fn verified_rows(&self, entity: Entity) -> Option<i64> {
        self.verified
            .iter()
            .find(|v| v.entity == entity)
            .map(|v| v.rows)
    }

    pub fn totals(&self) -> LoadResult {
        let mut totals = LoadResult::new();
        for (_, r) in &self.stages {
            totals += *r;
        }
        totals
    }

    pub fn print_summary(&self) {
        println!();
        println!("=== Summary: {} ===", self.domain);
        println!("Rows cleared:       {}", self.cleared.total_removed());
        for (entity, result) in &self.stages {
            println!("{:<20}{result}", format!("{}:", entity.label()));
        }
        println!();
        println!("Verification:");
        for v in &self.verified {
            println!("  {:<18}{}", format!("{}:", v.entity.table()), v.rows);
        }
        let totals = self.totals();
        println!();
        println!("Total:              {totals}");
    }
}
