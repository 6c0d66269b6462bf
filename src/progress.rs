//! "What's next" projection for a bill given its latest action and prior
//! history.
//!
//! The bill's lifecycle state is never stored; it is re-derived each run
//! from the action text. Prior history disambiguates the cases where the
//! same action text can mean different things, e.g. "passed House" is
//! "awaiting Senate" only until the Senate has passed its own version.

use crate::classify::ActionText;
use crate::types::{BillAction, BillType, Chamber};

/// Chamber a bill type originates in
fn origin_chamber(bill_type: BillType) -> Chamber {
    match bill_type {
        BillType::Hr | BillType::Hjres | BillType::Hconres | BillType::Hres => Chamber::House,
        BillType::S | BillType::Sjres | BillType::Sconres | BillType::Sres => Chamber::Senate,
    }
}

fn other_chamber(chamber: Chamber) -> Chamber {
    match chamber {
        Chamber::House => Chamber::Senate,
        Chamber::Senate => Chamber::House,
    }
}

/// Chamber named in an action text, if any
fn chamber_in_text(action: &ActionText) -> Option<Chamber> {
    if action.has("house") {
        Some(Chamber::House)
    } else if action.has("senate") {
        Some(Chamber::Senate)
    } else {
        None
    }
}

/// Did the given chamber pass the measure somewhere in the prior history?
fn chamber_passed(history: &[BillAction], chamber: Chamber) -> bool {
    history.iter().any(|action| {
        let text = ActionText::new(&action.text);
        text.has("passed") && text.has(&chamber.as_str().to_lowercase())
    })
}

/// Did the given chamber agree to the conference report in prior history?
fn chamber_agreed_conference(history: &[BillAction], chamber: Chamber) -> bool {
    history.iter().any(|action| {
        let text = ActionText::new(&action.text);
        text.has("conference report")
            && (text.has("agreed") || text.has("adopted"))
            && text.has(&chamber.as_str().to_lowercase())
    })
}

/// Project what happens next after the latest action. `history` holds the
/// prior actions, most recent first; terminal states project nothing.
pub fn whats_next(latest: &str, bill_type: BillType, history: &[BillAction]) -> Option<String> {
    let action = ActionText::new(latest);

    // Terminal: enacted
    if action.has("became public law") || action.has("signed by president") {
        return None;
    }
    // Terminal: pocket veto, no override possible
    if action.has("pocket veto") {
        return None;
    }
    // Terminal: veto sustained
    if action.has("veto")
        && (action.has("failed of passage")
            || (action.has("override") && (action.has("failed") || action.has("rejected"))))
    {
        return None;
    }
    // Veto override succeeded in one chamber; the other must follow
    if action.has("veto")
        && (action.has("passed over") || action.has("two-thirds") || (action.has("override") && action.has("agreed")))
    {
        return match chamber_in_text(&action) {
            Some(chamber) => Some(format!("Override vote in the {}", other_chamber(chamber).as_str())),
            None => Some("Override vote in the other chamber".to_string()),
        };
    }
    if action.has("veto") {
        return Some("Possible veto override vote in Congress".to_string());
    }

    // Procedural death
    if (action.has("motion to table") && action.has("agreed"))
        || action.has("indefinitely postponed")
        || action.has("failed of passage")
    {
        return None;
    }
    if action.has("motion to recommit") {
        if action.has("agreed") {
            // Recommittal kills the measure
            return None;
        }
        if action.has("failed") || action.has("rejected") {
            return Some("Final passage vote".to_string());
        }
    }

    if action.has("cloture") {
        if action.has("not invoked") || action.has("rejected") || action.has("failed") {
            return Some("Further debate or a renegotiated path in the Senate".to_string());
        }
        if action.has("invoked") || action.has("agreed") {
            return Some("Senate floor vote".to_string());
        }
        return Some("Cloture vote in the Senate".to_string());
    }

    if action.has("conference report") {
        if action.has("agreed") || action.has("adopted") {
            let named = chamber_in_text(&action);
            return match named {
                Some(chamber) if chamber_agreed_conference(history, other_chamber(chamber)) => {
                    presidential_step(bill_type)
                }
                Some(chamber) => Some(format!(
                    "Conference report vote in the {}",
                    other_chamber(chamber).as_str()
                )),
                None => Some("Conference report vote in the other chamber".to_string()),
            };
        }
        return Some("Conference report votes in both chambers".to_string());
    }

    if action.has("passed") {
        let chamber = chamber_in_text(&action).unwrap_or_else(|| origin_chamber(bill_type));
        let other = other_chamber(chamber);

        // Passage with an amendment always sends the measure back, even if
        // the other chamber already passed a differing version (ping-pong).
        if action.has("amendment") {
            return Some(format!(
                "Returns to the {} for agreement on changes",
                other.as_str()
            ));
        }

        if bill_type.is_simple_resolution() {
            // Simple resolutions terminate on own-chamber passage
            return None;
        }

        if chamber_passed(history, other) {
            return if bill_type.is_simple_or_concurrent() {
                // Concurrent resolutions finish with the second chamber
                None
            } else {
                presidential_step(bill_type)
            };
        }
        return Some(format!("{} vote", other.as_str()));
    }

    if action.has("presented to president") {
        return Some("President's signature or veto".to_string());
    }

    if action.has("ordered reported") || action.has("reported by") {
        let chamber = chamber_in_text(&action).unwrap_or_else(|| origin_chamber(bill_type));
        return Some(format!("Floor consideration in the {}", chamber.as_str()));
    }

    if action.has("placed on") && action.has("calendar") {
        return Some("Floor scheduling".to_string());
    }

    if action.has("discharged from") {
        return Some("Floor consideration".to_string());
    }

    if action.has("motion to proceed") {
        return Some("Senate floor debate".to_string());
    }

    if action.has("introduced") || action.has("referred to") {
        return Some("Committee review".to_string());
    }

    None
}

fn presidential_step(bill_type: BillType) -> Option<String> {
    if bill_type.is_simple_or_concurrent() {
        None
    } else {
        Some("President's signature".to_string())
    }
}
