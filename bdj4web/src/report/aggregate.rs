//! Per-version install totals

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::report::record::InstallRecord;

/// Number of individual records listed in the report
pub const RECENT_LIMIT: usize = 30;

/// Totals for one full version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSummary {
    pub full_version: String,
    /// Installs per country
    pub countries: BTreeMap<String, u64>,
    pub new: u64,
    pub reinstall: u64,
    pub update: u64,
    pub convert: u64,
}

impl VersionSummary {
    /// Number of records counted for this version
    pub fn total(&self) -> u64 {
        self.countries.values().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Newest version first
    pub versions: Vec<VersionSummary>,
    /// Most recent records first
    pub recent: Vec<InstallRecord>,
}

pub fn aggregate(records: &[InstallRecord]) -> Report {
    let mut by_version: HashMap<&str, VersionSummary> = HashMap::new();

    for record in records {
        let summary = by_version
            .entry(record.full_version.as_str())
            .or_insert_with(|| VersionSummary {
                full_version: record.full_version.clone(),
                ..Default::default()
            });
        *summary.countries.entry(record.country.clone()).or_insert(0) += 1;
        summary.new += record.new_count();
        summary.reinstall += record.reinstall_count();
        summary.update += record.update_count();
        summary.convert += record.convert_count();
    }

    let mut versions: Vec<VersionSummary> = by_version.into_values().collect();
    versions.sort_by(|a, b| compare_versions(&b.full_version, &a.full_version));

    let recent = records.iter().rev().take(RECENT_LIMIT).cloned().collect();

    Report { versions, recent }
}

/// Order two full version strings (`<x.y.z[.n]>-<releaselevel>-<builddate>`),
/// oldest first.
///
/// Dotted numbers compare component by component, a missing component
/// counting as zero, then the release level, then the build date.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    VersionKey::parse(a)
        .cmp(&VersionKey::parse(b))
        .then_with(|| a.cmp(b))
}

#[derive(Debug)]
struct VersionKey {
    numbers: Vec<u64>,
    level: ReleaseLevel,
    build: Vec<Part>,
}

impl VersionKey {
    fn parse(version: &str) -> Self {
        let (numbers, tail) = version.split_once('-').unwrap_or((version, ""));
        let (level, build) = tail.split_once('-').unwrap_or((tail, ""));

        Self {
            numbers: numbers.split('.').map(leading_number).collect(),
            level: ReleaseLevel::parse(level),
            build: loose_parts(build),
        }
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        (0..len)
            .map(|i| {
                let a = self.numbers.get(i).copied().unwrap_or(0);
                let b = other.numbers.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.level.cmp(&other.level))
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialEq for VersionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for VersionKey {}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Digits at the start of a version component, zero when there are none
fn leading_number(component: &str) -> u64 {
    let digits: String = component
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum ReleaseLevel {
    Other(String),
    Alpha,
    Beta,
    Production,
}

impl ReleaseLevel {
    fn parse(level: &str) -> Self {
        match level.to_ascii_lowercase().as_str() {
            "alpha" => ReleaseLevel::Alpha,
            "beta" => ReleaseLevel::Beta,
            "production" => ReleaseLevel::Production,
            other => ReleaseLevel::Other(other.to_string()),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Part {
    Text(String),
    Number(u128),
}

fn loose_parts(version: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut numeric = false;

    let flush = |current: &mut String, numeric: bool, parts: &mut Vec<Part>| {
        if current.is_empty() {
            return;
        }
        let part = if numeric {
            current
                .parse()
                .map(Part::Number)
                .unwrap_or_else(|_| Part::Text(current.clone()))
        } else {
            Part::Text(current.to_lowercase())
        };
        parts.push(part);
        current.clear();
    };

    for c in version.chars() {
        if c.is_ascii_alphanumeric() {
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != numeric {
                flush(&mut current, numeric, &mut parts);
            }
            numeric = is_digit;
            current.push(c);
        } else {
            flush(&mut current, numeric, &mut parts);
        }
    }
    flush(&mut current, numeric, &mut parts);

    parts
}
