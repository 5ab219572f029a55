//! Counselling report view: the student's profile followed by the
//! workflow's full text report.

use super::{bold, Tone};
use crate::counselling::{CounsellingResponse, FormRecord, LocationPreference};
use std::fmt::Write as _;

pub fn render_counselling(
    response: &CounsellingResponse,
    record: &FormRecord,
    colour: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", bold("🎓 Your JoSAA Choice Filling Strategy", colour));

    let label = |v: Option<String>| v.unwrap_or_else(|| "—".to_string());
    let _ = writeln!(out, "{}", bold("Student Profile", colour));
    let _ = writeln!(out, "  JEE Main AIR:     {}", record.main_rank);
    if !record.advanced_rank.trim().is_empty() {
        let _ = writeln!(out, "  JEE Advanced AIR: {}", record.advanced_rank.trim());
    }
    let _ = writeln!(
        out,
        "  Category:         {}",
        label(record.category.map(|c| c.to_string()))
    );
    let _ = writeln!(
        out,
        "  Gender:           {}",
        label(record.gender.map(|g| g.to_string()))
    );
    let _ = writeln!(out, "  Home state:       {}", record.home_state);
    let branches: Vec<&str> = record.branches.iter().map(|b| b.label()).collect();
    let _ = writeln!(out, "  Branches:         {}", branches.join(" → "));
    let location = match (record.location_preference, record.preferred_region) {
        (LocationPreference::Region, Some(r)) => format!("{r} India"),
        (LocationPreference::Home, _) => "Home state".to_string(),
        _ => "Anywhere".to_string(),
    };
    let _ = writeln!(out, "  Location:         {location}");
    let _ = writeln!(
        out,
        "  Strategy:         {}",
        label(record.strategy.map(|s| s.to_string()))
    );
    let _ = writeln!(out, "  Priorities:       {}", record.priorities.joined());
    if !response.timestamp.is_empty() {
        let _ = writeln!(
            out,
            "  {}",
            Tone::Muted.paint(&format!("Generated {}", response.timestamp), colour)
        );
    }
    out.push('\n');

    let report = response.reports.full_response.trim();
    if report.is_empty() {
        let _ = writeln!(out, "The counselling service returned an empty report.");
    } else {
        let _ = writeln!(out, "{report}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counselling::{Branch, CounsellingReports, Region};

    #[test]
    fn renders_profile_and_report() {
        let mut record = FormRecord::default();
        record.main_rank = "8000".into();
        record.home_state = "Assam".into();
        record.branches = vec![Branch::MechanicalEngineering, Branch::ComputerScience];
        record.location_preference = LocationPreference::Region;
        record.preferred_region = Some(Region::East);

        let response = CounsellingResponse {
            success: true,
            reports: CounsellingReports {
                full_response: "## Safe choices\n1. NIT Silchar".into(),
            },
            ..Default::default()
        };
        let text = render_counselling(&response, &record, false);
        assert!(text.contains("JEE Main AIR:     8000"));
        assert!(text.contains("Mechanical Engineering → Computer Science & Engineering"));
        assert!(text.contains("East India"));
        assert!(text.contains("Category:         —"));
        assert!(text.contains("1. NIT Silchar"));
        assert!(!text.contains("JEE Advanced"));
    }
}
