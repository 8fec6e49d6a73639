// URL codec - maps FilterState to and from a shareable query string
use crate::domain::filters::{DateRange, FilterState, FilterUpdate, QuickFilter, QuickFilters, SelectionCategory};
use chrono::{DateTime, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";

const START_DATE: &str = "startDate";
const END_DATE: &str = "endDate";
const SEARCH: &str = "search";
const QUICK: &str = "quick";

/// Query parameter carrying a selection category.
pub fn param_name(category: SelectionCategory) -> &'static str {
    match category {
        SelectionCategory::Regions => "barangays",
        SelectionCategory::Categories => "categories",
        SelectionCategory::Brands => "brands",
        SelectionCategory::Stores => "stores",
        SelectionCategory::AgeGroups => "ageGroups",
        SelectionCategory::Genders => "genders",
    }
}

fn category_for(name: &str) -> Option<SelectionCategory> {
    // The HTTP API spells regions as `regions`.
    if name == "regions" {
        return Some(SelectionCategory::Regions);
    }
    SelectionCategory::ALL.into_iter().find(|c| param_name(*c) == name)
}

/// Fields recovered from a query string. `None` means "not present".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterPatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub selections: Vec<(SelectionCategory, Vec<String>)>,
    pub search_term: Option<String>,
    pub quick_filters: Option<QuickFilters>,
}

impl FilterPatch {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.selections.is_empty()
            && self.search_term.is_none()
            && self.quick_filters.is_none()
    }

    /// Overlays the present fields onto `state`; absent fields keep their
    /// current value.
    pub fn apply_to(self, state: &mut FilterState) {
        if self.start_date.is_some() || self.end_date.is_some() {
            // Order the days before widening them, so both boundary days stay whole.
            let (start, end) = match (self.start_date, self.end_date) {
                (Some(s), Some(e)) if s > e => (Some(e), Some(s)),
                pair => pair,
            };
            let days = DateRange::from_days(start, end);
            let range = DateRange::new(
                days.from.or(state.date_range.from),
                days.to.or(state.date_range.to),
            );
            state.apply(FilterUpdate::DateRange(range));
        }
        for (category, values) in self.selections {
            state.apply(FilterUpdate::Selection(category, values));
        }
        if let Some(term) = self.search_term {
            state.apply(FilterUpdate::SearchTerm(term));
        }
        if let Some(flags) = self.quick_filters {
            state.apply(FilterUpdate::QuickFilters(flags));
        }
    }
}

/// Encodes every non-default field. Dates keep only their calendar day.
pub fn encode(state: &FilterState) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();

    if let Some(from) = state.date_range.from {
        params.push((START_DATE, from.format(DATE_FORMAT).to_string()));
    }
    if let Some(to) = state.date_range.to {
        params.push((END_DATE, to.format(DATE_FORMAT).to_string()));
    }

    for category in SelectionCategory::ALL {
        let values = state.selection(category);
        if !values.is_empty() {
            params.push((param_name(category), join_values(values.iter().map(String::as_str))));
        }
    }

    if !state.search_term.is_empty() {
        params.push((SEARCH, urlencoding::encode(&state.search_term).into_owned()));
    }

    let quick: Vec<&str> = state.quick_filters.active().map(|q| q.as_str()).collect();
    if !quick.is_empty() {
        params.push((QUICK, join_values(quick.into_iter())));
    }

    params
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn join_values<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values
        .map(|v| urlencoding::encode(v).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses recognised parameters. Unknown names, malformed dates and empty
/// lists are skipped rather than reported.
pub fn decode(query: &str) -> FilterPatch {
    let mut patch = FilterPatch::default();
    let query = query.strip_prefix('?').unwrap_or(query);

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let Some(key) = decode_component(raw_key) else {
            continue;
        };

        match key.as_str() {
            START_DATE => patch.start_date = decode_date(raw_value),
            END_DATE => patch.end_date = decode_date(raw_value),
            SEARCH => {
                patch.search_term = decode_component(raw_value).filter(|s| !s.is_empty());
            }
            QUICK => {
                let mut flags = QuickFilters::default();
                let mut any = false;
                for name in split_values(raw_value) {
                    if let Some(q) = QuickFilter::parse(&name) {
                        flags.set(q, true);
                        any = true;
                    }
                }
                patch.quick_filters = any.then_some(flags);
            }
            other => {
                let Some(category) = category_for(other) else {
                    tracing::trace!(param = other, "Ignoring unknown filter parameter");
                    continue;
                };
                patch.selections.retain(|(c, _)| *c != category);
                let values = split_values(raw_value);
                if !values.is_empty() {
                    patch.selections.push((category, values));
                }
            }
        }
    }

    patch
}

fn split_values(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(decode_component)
        .filter(|v| !v.is_empty())
        .collect()
}

fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|s| s.into_owned())
}

fn decode_date(raw: &str) -> Option<NaiveDate> {
    let value = decode_component(raw)?;
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(&value).ok().map(|d| d.date_naive()))
}
