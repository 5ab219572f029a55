//! The counselling intake record and its wire body.
//!
//! The record serialises with camelCase keys and label strings (`"OBC-NCL"`,
//! `"Computer Science & Engineering"`), and unset single choices round-trip
//! as `""`, so a draft saved here has the same shape as one saved by the web
//! form and vice versa.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Defines a closed set of labelled choices.
///
/// Each variant serialises as its label; parsing is case-insensitive on the
/// label.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| format!("unknown {} '{}'", stringify!($name), wanted))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(d)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

labelled_enum! {
    /// Reservation category.
    Category {
        General => "General",
        ObcNcl => "OBC-NCL",
        Sc => "SC",
        St => "ST",
        Ews => "EWS",
        PwD => "PwD",
    }
}

labelled_enum! {
    Gender {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

labelled_enum! {
    /// Engineering branches offered in the preference step.
    Branch {
        ComputerScience => "Computer Science & Engineering",
        ElectronicsCommunication => "Electronics & Communication Engineering",
        ElectricalEngineering => "Electrical Engineering",
        MechanicalEngineering => "Mechanical Engineering",
        CivilEngineering => "Civil Engineering",
        ChemicalEngineering => "Chemical Engineering",
        AerospaceEngineering => "Aerospace Engineering",
        Biotechnology => "Biotechnology",
        MetallurgicalEngineering => "Metallurgical Engineering",
        OtherBranches => "Other branches",
    }
}

labelled_enum! {
    CollegeType {
        Iit => "IIT",
        Nit => "NIT",
        Iiit => "IIIT",
        Gfti => "GFTI",
    }
}

labelled_enum! {
    LocationPreference {
        Any => "any",
        Home => "home",
        Region => "region",
    }
}

labelled_enum! {
    Region {
        North => "North",
        South => "South",
        East => "East",
        West => "West",
    }
}

labelled_enum! {
    /// Risk posture the counselling service uses to rank choices.
    Strategy {
        Conservative => "Conservative",
        Balanced => "Balanced",
        Aggressive => "Aggressive",
    }
}

labelled_enum! {
    Priority {
        PlacementRecord => "Placement record",
        CollegeReputation => "College reputation/ranking",
        BranchPreference => "Branch preference",
        LocationProximity => "Location/proximity to home",
    }
}

impl CollegeType {
    pub fn description(self) -> &'static str {
        match self {
            CollegeType::Iit => "IITs (Indian Institutes of Technology)",
            CollegeType::Nit => "NITs (National Institutes of Technology)",
            CollegeType::Iiit => "IIITs (Indian Institutes of Information Technology)",
            CollegeType::Gfti => "GFTIs (Government Funded Technical Institutes)",
        }
    }
}

impl Strategy {
    pub fn description(self) -> &'static str {
        match self {
            Strategy::Conservative => "Safer choices, minimize risk",
            Strategy::Balanced => "Mix of ambitious and safe choices",
            Strategy::Aggressive => "Aim higher, willing to take risks",
        }
    }
}

impl Default for LocationPreference {
    fn default() -> Self {
        LocationPreference::Any
    }
}

/// States and union territories offered as home state.
pub const INDIAN_STATES: [&str; 29] = [
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Delhi",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
];

/// Canonical spelling of a listed state, matched case-insensitively.
pub fn canonical_state(name: &str) -> Option<&'static str> {
    let wanted = name.trim();
    INDIAN_STATES
        .iter()
        .copied()
        .find(|s| s.eq_ignore_ascii_case(wanted))
}

/// Direction of a priority swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// The four priority labels in the user's order.
///
/// Always a permutation of [`Priority::ALL`]. The only mutation is swapping
/// neighbours, so the invariant cannot be broken from outside, and
/// deserialisation rejects any list that is not a permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Priorities([Priority; 4]);

impl Default for Priorities {
    fn default() -> Self {
        Self([
            Priority::PlacementRecord,
            Priority::BranchPreference,
            Priority::CollegeReputation,
            Priority::LocationProximity,
        ])
    }
}

impl Priorities {
    pub fn as_slice(&self) -> &[Priority] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Swap item `index` with its neighbour; out-of-range moves do nothing.
    ///
    /// Returns whether anything moved.
    pub fn move_item(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1).filter(|&t| t < self.0.len()),
        };
        match target {
            Some(t) if index < self.0.len() => {
                self.0.swap(index, t);
                true
            }
            _ => false,
        }
    }

    pub fn move_up(&mut self, index: usize) -> bool {
        self.move_item(index, Direction::Up)
    }

    pub fn move_down(&mut self, index: usize) -> bool {
        self.move_item(index, Direction::Down)
    }

    /// `"a > b > c > d"`, the form the counselling workflow expects.
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(|p| p.label())
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

impl TryFrom<Vec<Priority>> for Priorities {
    type Error = String;

    fn try_from(items: Vec<Priority>) -> Result<Self, Self::Error> {
        let arr: [Priority; 4] = items
            .try_into()
            .map_err(|v: Vec<Priority>| format!("expected 4 priorities, got {}", v.len()))?;
        for p in Priority::ALL {
            if !arr.contains(p) {
                return Err(format!("priorities must include '{p}' exactly once"));
            }
        }
        Ok(Self(arr))
    }
}

impl<'de> Deserialize<'de> for Priorities {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let items = Vec::<Priority>::deserialize(d)?;
        Priorities::try_from(items).map_err(de::Error::custom)
    }
}

/// Everything the counselling wizard collects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormRecord {
    pub main_rank: String,
    pub advanced_rank: String,
    #[serde(serialize_with = "none_as_blank", deserialize_with = "blank_as_none")]
    pub category: Option<Category>,
    #[serde(serialize_with = "none_as_blank", deserialize_with = "blank_as_none")]
    pub gender: Option<Gender>,
    pub home_state: String,
    /// Selection order; the first branch ranks highest.
    pub branches: Vec<Branch>,
    pub college_types: Vec<CollegeType>,
    pub location_preference: LocationPreference,
    #[serde(serialize_with = "none_as_blank", deserialize_with = "blank_as_none")]
    pub preferred_region: Option<Region>,
    #[serde(serialize_with = "none_as_blank", deserialize_with = "blank_as_none")]
    pub strategy: Option<Strategy>,
    pub priorities: Priorities,
}

impl Default for FormRecord {
    fn default() -> Self {
        Self {
            main_rank: String::new(),
            advanced_rank: String::new(),
            category: None,
            gender: None,
            home_state: String::new(),
            branches: Vec::new(),
            college_types: CollegeType::ALL.to_vec(),
            location_preference: LocationPreference::Any,
            preferred_region: None,
            strategy: Some(Strategy::Balanced),
            priorities: Priorities::default(),
        }
    }
}

fn none_as_blank<S, T>(value: &Option<T>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: fmt::Display,
{
    match value {
        Some(v) => s.collect_str(v),
        None => s.serialize_str(""),
    }
}

fn blank_as_none<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(d)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Parse a rank the way the web form did: surrounding whitespace is ignored
/// and any finite number is accepted, including zero and negatives.
pub fn parse_rank(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// JSON body of the counselling request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounsellingRequest {
    pub main_rank: String,
    pub advanced_rank: String,
    pub category: String,
    pub home_state: String,
    pub gender: String,
    pub branches: Vec<String>,
    /// Region name in `region` mode, otherwise `any` / `home`.
    pub locations: String,
    pub priorities: String,
    pub strategy: String,
    pub college_types: Vec<String>,
}

impl From<&FormRecord> for CounsellingRequest {
    fn from(r: &FormRecord) -> Self {
        let label = |v: Option<&'static str>| v.unwrap_or_default().to_string();
        let locations = match (r.location_preference, r.preferred_region) {
            (LocationPreference::Region, Some(region)) => region.label().to_string(),
            (LocationPreference::Region, None) => String::new(),
            (mode, _) => mode.label().to_string(),
        };
        Self {
            main_rank: r.main_rank.clone(),
            advanced_rank: r.advanced_rank.trim().to_string(),
            category: label(r.category.map(Category::label)),
            home_state: r.home_state.clone(),
            gender: label(r.gender.map(Gender::label)),
            branches: r.branches.iter().map(|b| b.label().to_string()).collect(),
            locations,
            priorities: r.priorities.joined(),
            strategy: label(r.strategy.map(Strategy::label)),
            college_types: r.college_types.iter().map(|c| c.label().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("obc-ncl".parse::<Category>().unwrap(), Category::ObcNcl);
        assert_eq!(
            "computer science & engineering".parse::<Branch>().unwrap(),
            Branch::ComputerScience
        );
        assert!("Mining".parse::<Branch>().is_err());
        assert_eq!(canonical_state("tamil nadu"), Some("Tamil Nadu"));
        assert_eq!(canonical_state("Atlantis"), None);
    }

    #[test]
    fn priorities_boundary_moves_are_noops() {
        let mut p = Priorities::default();
        let before = p;
        assert!(!p.move_up(0));
        assert!(!p.move_down(3));
        assert!(!p.move_down(7));
        assert_eq!(p, before);

        assert!(p.move_down(0));
        assert_eq!(p.as_slice()[0], Priority::BranchPreference);
        assert_eq!(p.as_slice()[1], Priority::PlacementRecord);
    }

    #[test]
    fn priorities_reject_non_permutations() {
        let dup = r#"["Placement record","Placement record","Branch preference","Location/proximity to home"]"#;
        assert!(serde_json::from_str::<Priorities>(dup).is_err());
        let short = r#"["Placement record"]"#;
        assert!(serde_json::from_str::<Priorities>(short).is_err());
    }

    #[test]
    fn record_defaults_follow_the_web_form() {
        let r = FormRecord::default();
        assert_eq!(r.college_types.len(), 4);
        assert_eq!(r.strategy, Some(Strategy::Balanced));
        assert_eq!(r.location_preference, LocationPreference::Any);
        assert_eq!(
            r.priorities.joined(),
            "Placement record > Branch preference > College reputation/ranking > Location/proximity to home"
        );
    }

    #[test]
    fn record_accepts_web_draft_shape() {
        let json = r#"{
            "mainRank": "12000", "advancedRank": "", "category": "", "gender": "Female",
            "homeState": "Kerala", "branches": ["Civil Engineering"],
            "collegeTypes": ["NIT"], "locationPreference": "region",
            "preferredRegion": "South", "strategy": "Aggressive",
            "priorities": ["Branch preference","Placement record","College reputation/ranking","Location/proximity to home"]
        }"#;
        let r: FormRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.category, None);
        assert_eq!(r.gender, Some(Gender::Female));
        assert_eq!(r.preferred_region, Some(Region::South));

        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back["category"], "");
        assert_eq!(back["preferredRegion"], "South");
    }

    #[test]
    fn request_body_shape() {
        let mut r = FormRecord::default();
        r.main_rank = "14000".into();
        r.advanced_rank = "  ".into();
        r.category = Some(Category::General);
        r.gender = Some(Gender::Male);
        r.home_state = "Bihar".into();
        r.branches = vec![Branch::ElectricalEngineering];
        r.location_preference = LocationPreference::Region;
        r.preferred_region = Some(Region::East);

        let body = serde_json::to_value(CounsellingRequest::from(&r)).unwrap();
        assert_eq!(body["advancedRank"], "");
        assert_eq!(body["locations"], "East");
        assert_eq!(body["collegeTypes"][0], "IIT");
        assert_eq!(body["strategy"], "Balanced");

        r.location_preference = LocationPreference::Home;
        let body = CounsellingRequest::from(&r);
        assert_eq!(body.locations, "home");
    }

    #[test]
    fn rank_parsing_is_lenient() {
        assert_eq!(parse_rank(" 14000 "), Some(14000.0));
        assert_eq!(parse_rank("-5"), Some(-5.0));
        assert_eq!(parse_rank("0"), Some(0.0));
        assert_eq!(parse_rank(""), None);
        assert_eq!(parse_rank("abc"), None);
        assert_eq!(parse_rank("NaN"), None);
    }
}
