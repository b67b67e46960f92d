use std::collections::{BTreeMap, HashMap};
use std::hint::black_box;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use invitelist_core::config::ScoringConfig;
use invitelist_core::{FixedClock, Page, PageId, SourceId, Worklist};
use invitelist_triage::{InvitationScorer, Revision, RevisionSource};

struct Tier {
    name: &'static str,
    sources: u32,
    pages_per_source: u32,
    revisions_per_page: u32,
}

const TIERS: [Tier; 3] = [
    Tier {
        name: "small",
        sources: 1,
        pages_per_source: 20,
        revisions_per_page: 10,
    },
    Tier {
        name: "medium",
        sources: 3,
        pages_per_source: 100,
        revisions_per_page: 20,
    },
    Tier {
        name: "large",
        sources: 5,
        pages_per_source: 300,
        revisions_per_page: 40,
    },
];

/// Deterministic synthetic history keyed by source.
struct SyntheticHistory {
    revisions: HashMap<SourceId, Vec<Revision>>,
}

impl RevisionSource for SyntheticHistory {
    fn revisions_since(
        &self,
        source: &SourceId,
        pages: &[PageId],
        since: DateTime<Utc>,
    ) -> Result<Vec<Revision>> {
        Ok(self
            .revisions
            .get(source)
            .into_iter()
            .flatten()
            .filter(|rev| rev.timestamp >= since && pages.binary_search(&rev.page_id).is_ok())
            .cloned()
            .collect())
    }

    fn edit_counts(&self, authors: &[String]) -> Result<HashMap<String, u64>> {
        Ok(authors
            .iter()
            .map(|name| (name.clone(), name.len() as u64 * 97))
            .collect())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("valid date")
}

fn build(tier: &Tier) -> (Worklist, Arc<SyntheticHistory>) {
    let mut pages = BTreeMap::new();
    let mut revisions = HashMap::new();
    let mut rev_id = 1_u64;

    for s in 0..tier.sources {
        let source = SourceId::new(format!("wiki{s}"));
        let mut list = Vec::new();
        let mut history = Vec::new();
        for p in 1..=tier.pages_per_source {
            list.push(Page::article(source.clone(), PageId(p), format!("Article {p}")));
            for r in 0..tier.revisions_per_page {
                history.push(Revision {
                    id: rev_id,
                    page_id: PageId(p),
                    author: Some(format!("Editor{}", (p * 7 + r * 13) % 150)),
                    author_is_bot: r % 17 == 0,
                    timestamp: now() - Duration::days(i64::from((p + r * 31) % 1200)),
                    size_delta: i64::from(r * 41 % 500) - 120,
                });
                rev_id += 1;
            }
        }
        pages.insert(source.clone(), list);
        revisions.insert(source, history);
    }

    let worklist = Worklist::new(pages).expect("valid worklist");
    (worklist, Arc::new(SyntheticHistory { revisions }))
}

fn bench_scorer(c: &mut Criterion) {
    let mut group = c.benchmark_group("scorer.generate");

    for tier in &TIERS {
        let (worklist, history) = build(tier);
        group.throughput(Throughput::Elements(
            u64::from(tier.sources * tier.pages_per_source * tier.revisions_per_page),
        ));

        let mut scorer = InvitationScorer::new(
            history,
            Arc::new(FixedClock(now())),
            ScoringConfig::default(),
        );

        group.bench_with_input(
            BenchmarkId::new("generate", tier.name),
            &worklist,
            |b, worklist| b.iter(|| black_box(scorer.generate(worklist).expect("generate"))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_scorer);
criterion_main!(benches);
