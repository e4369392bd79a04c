// Set combinator
// (inclusions ∪ RDATE) − (exclusions ∪ EXDATE), merged as ordered streams

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::iter::{Flatten, Peekable};

use super::generator::{OccurrenceIter, MAX_EMPTY_PERIODS};
use crate::models::recurrence::{RuleDefinition, Timestamp};

/// Ordered union of two ascending streams. Equal items are emitted once.
pub struct Union<A: Iterator, B: Iterator> {
    left: Peekable<A>,
    right: Peekable<B>,
}

impl<A: Iterator, B: Iterator<Item = A::Item>> Union<A, B> {
    pub fn new(left: A, right: B) -> Self {
        Self {
            left: left.peekable(),
            right: right.peekable(),
        }
    }
}

impl<T, A, B> Iterator for Union<A, B>
where
    T: Ord,
    A: Iterator<Item = T>,
    B: Iterator<Item = T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let ordering = match (self.left.peek(), self.right.peek()) {
            (Some(left), Some(right)) => left.cmp(right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => return None,
        };

        match ordering {
            Ordering::Less => self.left.next(),
            Ordering::Greater => self.right.next(),
            Ordering::Equal => {
                self.right.next();
                self.left.next()
            }
        }
    }
}

/// Excluded candidates in a row before a difference gives up, for sets whose
/// exclusions swallow every inclusion.
pub const MAX_CONSECUTIVE_EXCLUSIONS: u32 = MAX_EMPTY_PERIODS;

/// Items of an ascending `include` stream not present in the ascending
/// `exclude` stream. The exclusion side is only advanced up to the current
/// candidate, so an unbounded exclusion rule is never run ahead.
pub struct Difference<I: Iterator, E: Iterator> {
    include: I,
    exclude: Peekable<E>,
}

impl<I: Iterator, E: Iterator<Item = I::Item>> Difference<I, E> {
    pub fn new(include: I, exclude: E) -> Self {
        Self {
            include,
            exclude: exclude.peekable(),
        }
    }
}

impl<T, I, E> Iterator for Difference<I, E>
where
    T: Ord,
    I: Iterator<Item = T>,
    E: Iterator<Item = T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let mut skipped = 0u32;
        'candidates: loop {
            let candidate = self.include.next()?;
            while let Some(excluded) = self.exclude.peek() {
                match excluded.cmp(&candidate) {
                    Ordering::Less => {
                        self.exclude.next();
                    }
                    Ordering::Equal => {
                        skipped += 1;
                        if skipped >= MAX_CONSECUTIVE_EXCLUSIONS {
                            log::warn!(
                                "{} consecutive candidates were excluded; stopping",
                                MAX_CONSECUTIVE_EXCLUSIONS
                            );
                            return None;
                        }
                        continue 'candidates;
                    }
                    Ordering::Greater => break,
                }
            }
            return Some(candidate);
        }
    }
}

type Explicit = std::vec::IntoIter<DateTime<Tz>>;

/// The combined occurrence stream of a set, ending with a filter for
/// whole-day exclusions.
pub struct Combined<I, E>
where
    I: Iterator<Item = DateTime<Tz>>,
    E: Iterator<Item = DateTime<Tz>>,
{
    inner: Difference<Union<I, Explicit>, Union<E, Explicit>>,
    excluded_days: BTreeSet<NaiveDate>,
}

impl<I, E> Iterator for Combined<I, E>
where
    I: Iterator<Item = DateTime<Tz>>,
    E: Iterator<Item = DateTime<Tz>>,
{
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.excluded_days.is_empty() {
            return self.inner.next();
        }
        let excluded_days = &self.excluded_days;
        self.inner
            .by_ref()
            .find(|instant| !excluded_days.contains(&instant.date_naive()))
    }
}

/// Combine inclusion and exclusion sources into one ascending, duplicate-free
/// stream. Instants on both sides are excluded.
pub fn combine<I, E>(
    inclusions: I,
    mut rdates: Vec<DateTime<Tz>>,
    exclusions: E,
    mut exdates: Vec<DateTime<Tz>>,
    excluded_days: BTreeSet<NaiveDate>,
) -> Combined<I, E>
where
    I: Iterator<Item = DateTime<Tz>>,
    E: Iterator<Item = DateTime<Tz>>,
{
    rdates.sort();
    rdates.dedup();
    exdates.sort();
    exdates.dedup();

    Combined {
        inner: Difference::new(
            Union::new(inclusions, rdates.into_iter()),
            Union::new(exclusions, exdates.into_iter()),
        ),
        excluded_days,
    }
}

type RuleStream<'a> = Flatten<std::option::IntoIter<OccurrenceIter<'a>>>;

/// Every occurrence of `definition` anchored at `start`, in ascending order.
///
/// Date-only RDATEs take the anchor's time of day. Date-only EXDATEs remove
/// every occurrence on that local date. With a `horizon` the rule streams end
/// there; explicit dates past it are still yielded.
pub fn evaluate(
    definition: &RuleDefinition,
    start: DateTime<Tz>,
    horizon: Option<DateTime<Tz>>,
) -> Combined<RuleStream<'_>, RuleStream<'_>> {
    let tz = start.timezone();
    let time_of_day = start.time();

    let inclusions = definition
        .rrule
        .as_ref()
        .map(|rule| OccurrenceIter::new(rule, start).with_horizon(horizon))
        .into_iter()
        .flatten();
    let exclusions = definition
        .exrule
        .as_ref()
        .map(|rule| OccurrenceIter::new(rule, start).with_horizon(horizon))
        .into_iter()
        .flatten();

    let rdates = resolve_all(&definition.rdates, &tz, time_of_day);

    let mut exdates = Vec::new();
    let mut excluded_days = BTreeSet::new();
    for exdate in &definition.exdates {
        match exdate {
            Timestamp::Date(day) => {
                excluded_days.insert(*day);
            }
            _ => exdates.extend(exdate.resolve(&tz, time_of_day)),
        }
    }

    combine(inclusions, rdates, exclusions, exdates, excluded_days)
}

fn resolve_all(values: &[Timestamp], tz: &Tz, time_of_day: NaiveTime) -> Vec<DateTime<Tz>> {
    values
        .iter()
        .filter_map(|value| value.resolve(tz, time_of_day))
        .collect()
}
