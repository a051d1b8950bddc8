use crate::config::SportProfile;
use crate::constants::OCCUPANT_SEPARATOR;
use crate::ownership::any_name_matches;
use crate::parser::status::classify;
use crate::types::{Slot, SlotStatus};
use scraper::ElementRef;
use tracing::debug;

/// Everything a cell needs besides its own markup.
pub struct CellContext<'a> {
    pub profile: &'a SportProfile,
    pub base_url: &'a str,
    pub booking_action: &'a str,
    pub display_name: Option<&'a str>,
}

/// Build the slot for one data cell of `court`, starting at `start_time`.
pub fn extract_slot(
    cell: ElementRef<'_>,
    court: &str,
    start_time: &str,
    ctx: &CellContext<'_>,
) -> Slot {
    let tokens: Vec<&str> = cell.value().classes().collect();
    let mut status = classify(&tokens, ctx.profile);

    // Names come from the multi-line tooltip
    let names: Vec<&str> = cell
        .value()
        .attr("title")
        .map(|t| t.lines().map(str::trim).filter(|n| !n.is_empty()).collect())
        .unwrap_or_default();
    let occupants = (!names.is_empty()).then(|| names.join(OCCUPANT_SEPARATOR));

    if status == SlotStatus::Booked {
        if let Some(me) = ctx.display_name {
            if any_name_matches(&names[..], me) {
                status = SlotStatus::Mine;
            }
        }
    }

    let booking_url = if status == SlotStatus::Free {
        let url = cell
            .value()
            .attr("onclick")
            .and_then(|onclick| booking_path(onclick, ctx.booking_action))
            .map(|path| format!("{}/{}", ctx.base_url.trim_end_matches('/'), path));
        if url.is_none() {
            debug!("Free cell at {} {} has no booking action", court, start_time);
        }
        url
    } else {
        None
    };

    Slot {
        court: court.to_string(),
        start_time: start_time.to_string(),
        end_time: add_one_hour(start_time),
        status,
        occupants,
        booking_url,
    }
}

/// Pull `<action>?d=<token>` out of a click handler such as
/// `location.href='reservation1.php?d=MTIz'`.
fn booking_path<'h>(onclick: &'h str, action: &str) -> Option<&'h str> {
    let needle = format!("{}?d=", action);
    let start = onclick.find(&needle)?;
    let rest = &onclick[start..];
    let end = rest
        .find(|c: char| c == '\'' || c == '"' || c.is_whitespace())
        .unwrap_or(rest.len());
    (end > needle.len()).then(|| &rest[..end])
}

/// "08:30" -> "09:30". Every slot is modelled as one hour long, padel's
/// half-hour offsets included. Unparseable input yields an empty string.
pub fn add_one_hour(time: &str) -> String {
    let mut parts = time.splitn(2, ':');
    let hour = parts.next().and_then(|h| h.trim().parse::<u32>().ok());
    let minute = parts.next().map_or(Some(0), |m| m.trim().parse::<u32>().ok());
    match (hour, minute) {
        (Some(h), Some(m)) => format!("{:02}:{:02}", (h + 1) % 24, m),
        _ => String::new(),
    }
}
