//! Schedule-page parser.
//!
//! Every sport page shares the same skeleton: a `.barre-top` date bar, a
//! `.col-heures` column of hour labels and one `.courts` block per court whose
//! cells run top to bottom in the same order as the hour labels. The sports
//! differ only in their marker-token prefixes (`tennis_int_`, `bad_`,
//! `padel_2_`, ...) and in padel using `.cases-et-demi` cells, which is what
//! [`SportProfile`] and the cell selector absorb.

pub mod cell;
pub mod status;

use cell::{extract_slot, CellContext};
use crate::config::{SiteConfig, SportProfile};
use crate::metrics::ParserMetrics;
use crate::types::{AvailabilityModel, DayNav, Slot, Sport};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use status::is_header_or_footer;
use std::time::Instant;
use tracing::{debug, info, warn};

static DAY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".barre-top .btn-bar").unwrap());
static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".col-heures span.heures").unwrap());
static COURT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".courts").unwrap());
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".cases, .cases-et-demi").unwrap());
static COURT_NAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".tableau_entetes").unwrap());

static DAY_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bd=([^'"&\s]+)"#).unwrap());
static HOUR_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\s*[hH:]\s*(\d{2})?$").unwrap());

const ACTIVE_DAY_CLASS: &str = "btn-bar-active";

pub struct ScheduleParser<'a> {
    sport: Sport,
    profile: &'a SportProfile,
    site: &'a SiteConfig,
}

impl<'a> ScheduleParser<'a> {
    pub fn new(sport: Sport, profile: &'a SportProfile, site: &'a SiteConfig) -> Self {
        Self { sport, profile, site }
    }

    /// Parse one schedule page. Never fails: a page without the expected
    /// structure produces an empty model.
    pub fn parse(&self, html: &str, display_name: Option<&str>) -> AvailabilityModel {
        let started = Instant::now();
        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());
        let document = Html::parse_document(html);

        let days = parse_days(&document);
        let display_date = days
            .iter()
            .find(|d| d.active)
            .map(|d| d.label.clone())
            .unwrap_or_default();
        // Cells pair with the raw axis; the model only lists each hour once
        let axis = parse_hour_axis(&document);
        let times = first_occurrences(&axis);

        let ctx = CellContext {
            profile: self.profile,
            base_url: &self.site.base_url,
            booking_action: &self.site.booking_action,
            display_name,
        };

        let mut courts: Vec<String> = Vec::new();
        let mut slots: Vec<Slot> = Vec::new();

        for (index, block) in document.select(&COURT_SELECTOR).enumerate() {
            let cells: Vec<ElementRef<'_>> = block.select(&CELL_SELECTOR).collect();
            let (headers, data): (Vec<_>, Vec<_>) = cells.into_iter().partition(|c| {
                let tokens: Vec<&str> = c.value().classes().collect();
                is_header_or_footer(&tokens, self.profile)
            });

            let Some(court) = court_name(&headers) else {
                warn!(sport = %self.sport, block = index, "Court block has no name, skipping");
                ParserMetrics::record_court_dropped("unnamed");
                continue;
            };

            // Cells carry no time of their own; the n-th cell is the n-th hour label
            if data.len() != axis.len() {
                warn!(
                    sport = %self.sport,
                    court = %court,
                    cells = data.len(),
                    times = axis.len(),
                    "Court cell count does not match the time axis, skipping"
                );
                ParserMetrics::record_court_dropped("axis_mismatch");
                continue;
            }

            for (cell, start_time) in data.into_iter().zip(axis.iter()) {
                slots.push(extract_slot(cell, &court, start_time, &ctx));
            }
            if !courts.contains(&court) {
                courts.push(court);
            }
        }

        let model = AvailabilityModel {
            display_date,
            days,
            times,
            courts,
            slots,
        };

        if model.is_empty() {
            warn!(sport = %self.sport, bytes = html.len(), "No schedule structure found in page");
            ParserMetrics::record_empty_page(self.sport.as_str());
        }
        ParserMetrics::record_parse(
            self.sport.as_str(),
            model.courts.len(),
            model.slots.len(),
            started.elapsed().as_secs_f64(),
        );
        info!(
            sport = %self.sport,
            day = %model.display_date,
            courts = model.courts.len(),
            slots = model.slots.len(),
            "Parsed schedule page"
        );
        model
    }
}

/// Convenience wrapper around [`ScheduleParser`].
pub fn parse_schedule(
    html: &str,
    sport: Sport,
    profile: &SportProfile,
    site: &SiteConfig,
    display_name: Option<&str>,
) -> AvailabilityModel {
    ScheduleParser::new(sport, profile, site).parse(html, display_name)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn parse_days(document: &Html) -> Vec<DayNav> {
    document
        .select(&DAY_SELECTOR)
        .map(|el| {
            let date_token = el
                .value()
                .attr("onclick")
                .and_then(|onclick| DAY_TOKEN.captures(onclick))
                .map(|c| c[1].to_string());
            DayNav {
                label: element_text(&el),
                active: el.value().classes().any(|c| c == ACTIVE_DAY_CLASS),
                date_token,
            }
        })
        .collect()
}

/// Hour labels in document order, one per row of cells
fn parse_hour_axis(document: &Html) -> Vec<String> {
    document
        .select(&TIME_SELECTOR)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
        .map(|text| normalize_hour_label(&text))
        .collect()
}

fn first_occurrences(axis: &[String]) -> Vec<String> {
    let mut times: Vec<String> = Vec::with_capacity(axis.len());
    for time in axis {
        if times.contains(time) {
            debug!("Duplicate hour label {} listed once", time);
            continue;
        }
        times.push(time.clone());
    }
    times
}

/// "08h30" -> "08:30", "8h" -> "08:00". Labels that don't look like hours
/// are kept with the `h` swapped for a colon.
pub fn normalize_hour_label(raw: &str) -> String {
    let raw = raw.trim();
    match HOUR_LABEL.captures(raw) {
        Some(c) => {
            let hour: u32 = c[1].parse().unwrap_or_default();
            let minutes = c.get(2).map_or("00", |m| m.as_str());
            format!("{:02}:{}", hour, minutes)
        }
        None => raw.replacen('h', ":", 1),
    }
}

/// Name of the court, read from the first header/footer cell that has one
fn court_name(headers: &[ElementRef<'_>]) -> Option<String> {
    headers.iter().find_map(|h| {
        h.select(&COURT_NAME_SELECTOR)
            .map(|n| element_text(&n))
            .find(|name| !name.is_empty())
    })
}
