//! Dashboard aggregations over idea records.
//!
//! Every function here is a pure fold over slices; nothing is cached. The
//! service layer reads the full idea list once and feeds it to each view.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::idea::{Idea, IdeaId, IdeaStatus, ImplementationPhase};
use crate::domain::user::{User, UserId};
use crate::domain::CATEGORIES;

pub const UNKNOWN_DEPARTMENT: &str = "Unknown";
pub const DEFAULT_RECENT_LIMIT: usize = 5;
pub const DEFAULT_TIMELINE_MONTHS: u32 = 6;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_ideas: usize,
    pub by_status: BTreeMap<IdeaStatus, usize>,
    pub by_department: BTreeMap<String, usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub name: String,
    pub value: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineBucket {
    /// `YYYY-MM` of the bucket's month.
    pub key: String,
    /// Short month name, e.g. "Oct".
    pub name: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactEffortPoint {
    pub id: IdeaId,
    pub title: String,
    pub x: u8,
    pub y: u8,
    pub status: IdeaStatus,
    pub category: String,
    pub roi: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryApprovalRate {
    pub name: String,
    pub approval_rate: u32,
    pub total_ideas: usize,
    pub approved_ideas: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationTimeline {
    pub id: IdeaId,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub estimated_end_date: Option<DateTime<Utc>>,
    pub actual_end_date: Option<DateTime<Utc>>,
    pub phase: ImplementationPhase,
    pub progress: u8,
    pub category: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCards {
    pub total_ideas: usize,
    pub approved: usize,
    pub under_review: usize,
    pub submitted: usize,
}

pub fn dashboard_metrics(ideas: &[Idea], users: &[User]) -> DashboardMetrics {
    let departments: HashMap<&UserId, &str> =
        users.iter().map(|user| (&user.id, user.department.as_str())).collect();

    let mut by_status: BTreeMap<IdeaStatus, usize> =
        IdeaStatus::ALL.iter().map(|status| (*status, 0)).collect();
    let mut by_department: BTreeMap<String, usize> = BTreeMap::new();

    for idea in ideas {
        *by_status.entry(idea.status).or_default() += 1;
        let department =
            departments.get(&idea.submitter_id).copied().unwrap_or(UNKNOWN_DEPARTMENT);
        *by_department.entry(department.to_owned()).or_default() += 1;
    }

    DashboardMetrics { total_ideas: ideas.len(), by_status, by_department }
}

pub fn summary_cards(metrics: &DashboardMetrics) -> SummaryCards {
    let count = |status: IdeaStatus| metrics.by_status.get(&status).copied().unwrap_or(0);
    SummaryCards {
        total_ideas: metrics.total_ideas,
        approved: count(IdeaStatus::Approved),
        under_review: count(IdeaStatus::UnderReview),
        submitted: count(IdeaStatus::Submitted),
    }
}

pub fn status_distribution(metrics: &DashboardMetrics) -> Vec<DistributionEntry> {
    IdeaStatus::ALL
        .iter()
        .map(|status| DistributionEntry {
            name: status.label().to_owned(),
            value: metrics.by_status.get(status).copied().unwrap_or(0),
        })
        .collect()
}

pub fn department_distribution(metrics: &DashboardMetrics) -> Vec<DistributionEntry> {
    let mut entries: Vec<DistributionEntry> = metrics
        .by_department
        .iter()
        .map(|(name, value)| DistributionEntry { name: name.clone(), value: *value })
        .collect();
    entries.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    entries
}

/// Counts submissions per calendar month, oldest first, ending with `now`'s month.
pub fn submission_timeline(ideas: &[Idea], now: DateTime<Utc>, months: u32) -> Vec<TimelineBucket> {
    let mut buckets = Vec::with_capacity(months as usize);
    let (mut year, mut month) = (now.year(), now.month());

    for _ in 0..months {
        let Some(first_day) = NaiveDate::from_ymd_opt(year, month, 1) else {
            break;
        };
        let count = ideas
            .iter()
            .filter(|idea| {
                idea.date_submitted.year() == year && idea.date_submitted.month() == month
            })
            .count();
        buckets.push(TimelineBucket {
            key: first_day.format("%Y-%m").to_string(),
            name: first_day.format("%b").to_string(),
            count,
        });

        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }

    buckets.reverse();
    buckets
}

pub fn impact_vs_effort(ideas: &[Idea]) -> Vec<ImpactEffortPoint> {
    ideas
        .iter()
        .map(|idea| ImpactEffortPoint {
            id: idea.id.clone(),
            title: idea.title.clone(),
            x: idea.effort.map(|level| level.score()).unwrap_or(0),
            y: idea.impact.map(|level| level.score()).unwrap_or(0),
            status: idea.status,
            category: idea.category.clone(),
            roi: idea.expected_roi,
        })
        .collect()
}

pub fn category_approval_rates(ideas: &[Idea]) -> Vec<CategoryApprovalRate> {
    let mut names: Vec<String> = CATEGORIES.iter().map(|name| (*name).to_owned()).collect();
    for idea in ideas {
        if !names.contains(&idea.category) {
            names.push(idea.category.clone());
        }
    }

    let mut rates: Vec<CategoryApprovalRate> = names
        .into_iter()
        .map(|name| {
            let in_category = ideas.iter().filter(|idea| idea.category == name);
            let (total_ideas, approved_ideas) =
                in_category.fold((0usize, 0usize), |(total, approved), idea| {
                    (total + 1, approved + usize::from(idea.status == IdeaStatus::Approved))
                });
            let approval_rate = if total_ideas == 0 {
                0
            } else {
                ((approved_ideas as f64 / total_ideas as f64) * 100.0).round() as u32
            };
            CategoryApprovalRate { name, approval_rate, total_ideas, approved_ideas }
        })
        .collect();

    rates.sort_by(|a, b| b.approval_rate.cmp(&a.approval_rate).then_with(|| a.name.cmp(&b.name)));
    rates
}

pub fn implementation_timelines(ideas: &[Idea]) -> Vec<ImplementationTimeline> {
    ideas
        .iter()
        .filter(|idea| idea.status == IdeaStatus::Approved)
        .filter_map(|idea| {
            let phase = idea.implementation_phase?;
            let start_date = idea.implementation_start_date?;
            Some(ImplementationTimeline {
                id: idea.id.clone(),
                title: idea.title.clone(),
                start_date,
                estimated_end_date: idea.estimated_completion_date,
                actual_end_date: idea.actual_completion_date,
                phase,
                progress: phase.progress_pct(),
                category: idea.category.clone(),
            })
        })
        .collect()
}

pub fn recent_ideas(ideas: &[Idea], limit: usize) -> Vec<Idea> {
    let mut sorted: Vec<&Idea> = ideas.iter().collect();
    sorted.sort_by_key(|idea| (Reverse(idea.date_submitted), idea.id.clone()));
    sorted.into_iter().take(limit).cloned().collect()
}

/// Every dashboard view computed from one read of the data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub metrics: DashboardMetrics,
    pub summary: SummaryCards,
    pub status_distribution: Vec<DistributionEntry>,
    pub department_distribution: Vec<DistributionEntry>,
    pub submission_timeline: Vec<TimelineBucket>,
    pub impact_vs_effort: Vec<ImpactEffortPoint>,
    pub category_approval_rates: Vec<CategoryApprovalRate>,
    pub implementation_timelines: Vec<ImplementationTimeline>,
    pub recent_ideas: Vec<Idea>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn compute(
        ideas: &[Idea],
        users: &[User],
        now: DateTime<Utc>,
        timeline_months: u32,
        recent_limit: usize,
    ) -> Self {
        let metrics = dashboard_metrics(ideas, users);
        Self {
            summary: summary_cards(&metrics),
            status_distribution: status_distribution(&metrics),
            department_distribution: department_distribution(&metrics),
            submission_timeline: submission_timeline(ideas, now, timeline_months),
            impact_vs_effort: impact_vs_effort(ideas),
            category_approval_rates: category_approval_rates(ideas),
            implementation_timelines: implementation_timelines(ideas),
            recent_ideas: recent_ideas(ideas, recent_limit),
            metrics,
            generated_at: now,
        }
    }
}
