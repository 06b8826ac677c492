//! Core record types for palcharity.
//!
//! These mirror the records held by the record store: donor and association
//! profiles, fundable projects, and the append-only donation log. Field names
//! on the wire follow the collection layout (`uid`, `projectId`, `type`, ...).

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What a donation (or a project) is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Monetary contribution; the only category whose amount counts.
    Money,
    /// Food parcels.
    Food,
    /// Clothing.
    Clothes,
}

impl Category {
    /// All categories, in classifier output order.
    pub const ALL: [Category; 3] = [Category::Money, Category::Food, Category::Clothes];

    /// Label used in storage and on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Money => "money",
            Self::Food => "food",
            Self::Clothes => "clothes",
        }
    }

    /// Pick the category with the highest classifier score.
    ///
    /// Scores are in `[money, food, clothes]` order, as produced by the image
    /// classifier. Ties resolve to the earliest category. The `classify`
    /// command exposes this to operators.
    #[must_use]
    pub fn from_scores(scores: [f32; 3]) -> Self {
        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if score.total_cmp(&scores[best]).is_gt() {
                best = i;
            }
        }
        Self::ALL[best]
    }

    /// Whether donations of this category move a project's balance.
    #[must_use]
    pub fn is_monetary(&self) -> bool {
        matches!(self, Self::Money)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "money" => Ok(Self::Money),
            "food" => Ok(Self::Food),
            "clothes" => Ok(Self::Clothes),
            other => Err(Error::validation(
                "type",
                format!("unknown category '{other}' (expected money, food or clothes)"),
            )),
        }
    }
}

/// A latitude/longitude pair attached to a donation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Create a point, rejecting coordinates outside the valid ranges.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either coordinate is out of range or NaN.
    pub fn new(lat: f64, lng: f64) -> crate::Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::validation("location", format!("latitude {lat} out of range")));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(Error::validation("location", format!("longitude {lng} out of range")));
        }
        Ok(Self { lat, lng })
    }
}

/// An individual contributing to projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    /// Account identifier (storage key).
    #[serde(rename = "uid")]
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
}

impl Donor {
    /// Display name used for donation snapshots.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// An organization running fundable projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Account identifier (storage key).
    #[serde(rename = "uid")]
    pub id: String,
    /// Public name, copied into projects and donations.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Partial update of a donor profile. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorUpdate {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New contact email.
    pub email: Option<String>,
}

impl DonorUpdate {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }

    /// Merge the supplied fields into `donor`.
    pub fn apply(&self, donor: &mut Donor) {
        if let Some(first_name) = &self.first_name {
            donor.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &self.last_name {
            donor.last_name.clone_from(last_name);
        }
        if let Some(email) = &self.email {
            donor.email.clone_from(email);
        }
    }
}

/// Partial update of an association profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationUpdate {
    /// New public name.
    pub name: Option<String>,
    /// New contact email.
    pub email: Option<String>,
}

impl AssociationUpdate {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    /// Merge the supplied fields into `association`.
    pub fn apply(&self, association: &mut Association) {
        if let Some(name) = &self.name {
            association.name.clone_from(name);
        }
        if let Some(email) = &self.email {
            association.email.clone_from(email);
        }
    }
}

/// A funding target with a remaining balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Identifier; equal to the storage key.
    pub id: String,
    /// Short title, copied into donations.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Funding target, fixed at creation.
    pub amount_needed: u32,
    /// What is still missing. Floors at zero.
    pub amount_remaining: u32,
    /// Owning association, by name.
    pub association_name: String,
    /// What the project collects.
    #[serde(rename = "type")]
    pub category: Category,
    /// Reference to the project image.
    pub image_url: String,
}

impl Project {
    /// Amount collected so far, as reflected by the stored balance.
    #[must_use]
    pub fn amount_raised(&self) -> u32 {
        self.amount_needed.saturating_sub(self.amount_remaining)
    }

    /// True while the project still accepts money.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.amount_remaining > 0
    }
}

/// Payload for creating a project; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Funding target.
    pub amount_needed: u32,
    /// Owning association, by name.
    pub association_name: String,
    /// What the project collects.
    pub category: Category,
    /// Image reference; a default is used when absent.
    pub image_url: Option<String>,
}

/// One contribution event in the donation log.
///
/// The donor name, project title and association name are snapshots taken
/// when the donation was recorded. Renaming a project later does not touch
/// existing entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    /// Log identifier, assigned by the store on append.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Donor account identifier.
    #[serde(rename = "uid")]
    pub donor_id: String,
    /// Target project identifier.
    pub project_id: String,
    /// Donor given name at donation time.
    pub donor_first_name: String,
    /// Donor family name at donation time.
    pub donor_last_name: String,
    /// Kind of contribution.
    #[serde(rename = "type")]
    pub category: Category,
    /// Amount; zero for in-kind donations.
    pub amount: u32,
    /// Epoch milliseconds at write time.
    pub timestamp: i64,
    /// Project title at donation time.
    pub project_title: String,
    /// Association name at donation time.
    pub association_name: String,
    /// Where the donor was, if shared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl Donation {
    /// The timestamp as a UTC date-time.
    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or_default()
    }

    /// Amount that counts towards totals.
    #[must_use]
    pub fn counted_amount(&self) -> u64 {
        if self.category.is_monetary() {
            u64::from(self.amount)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_donation() -> Donation {
        Donation {
            id: None,
            donor_id: "donor-1".to_string(),
            project_id: "proj-1".to_string(),
            donor_first_name: "Amal".to_string(),
            donor_last_name: "Haddad".to_string(),
            category: Category::Money,
            amount: 100,
            timestamp: 1_700_000_000_000,
            project_title: "Water wells".to_string(),
            association_name: "Gaza Relief".to_string(),
            location: Some(GeoPoint { lat: 31.5, lng: 34.46 }),
        }
    }

    #[test]
    fn test_category_display_and_parse() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
            assert_eq!(category.to_string(), category.as_str());
        }
        assert_eq!(" Food ".parse::<Category>().unwrap(), Category::Food);
    }

    #[test]
    fn test_category_parse_unknown() {
        let err = "furniture".parse::<Category>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("furniture"));
    }

    #[test]
    fn test_category_from_scores() {
        assert_eq!(Category::from_scores([0.7, 0.2, 0.1]), Category::Money);
        assert_eq!(Category::from_scores([0.1, 0.8, 0.1]), Category::Food);
        assert_eq!(Category::from_scores([0.1, 0.2, 0.9]), Category::Clothes);
        assert_eq!(Category::from_scores([0.5, 0.5, 0.0]), Category::Money);
    }

    #[test]
    fn test_geo_point_bounds() {
        assert!(GeoPoint::new(31.5, 34.4).is_ok());
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_donor_display_name() {
        let donor = Donor {
            id: "u1".to_string(),
            first_name: "Amal".to_string(),
            last_name: String::new(),
            email: "amal@example.org".to_string(),
        };
        assert_eq!(donor.display_name(), "Amal");
    }

    #[test]
    fn test_donor_update_merges_only_supplied_fields() {
        let mut donor = Donor {
            id: "u1".to_string(),
            first_name: "Amal".to_string(),
            last_name: "Haddad".to_string(),
            email: "amal@example.org".to_string(),
        };
        let update = DonorUpdate {
            last_name: Some("Nasser".to_string()),
            ..DonorUpdate::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut donor);

        assert_eq!(donor.first_name, "Amal");
        assert_eq!(donor.last_name, "Nasser");
        assert_eq!(donor.email, "amal@example.org");
    }

    #[test]
    fn test_project_amount_raised() {
        let project = Project {
            id: "p".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            amount_needed: 500,
            amount_remaining: 120,
            association_name: "a".to_string(),
            category: Category::Money,
            image_url: "img".to_string(),
        };
        assert_eq!(project.amount_raised(), 380);
        assert!(project.is_open());
    }

    #[test]
    fn test_donation_wire_field_names() {
        let json = serde_json::to_value(sample_donation()).unwrap();
        assert_eq!(json["uid"], "donor-1");
        assert_eq!(json["projectId"], "proj-1");
        assert_eq!(json["type"], "money");
        assert_eq!(json["donorFirstName"], "Amal");
        assert_eq!(json["associationName"], "Gaza Relief");
        assert_eq!(json["location"]["lng"], 34.46);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_donation_without_location_omits_field() {
        let mut donation = sample_donation();
        donation.location = None;
        let json = serde_json::to_value(&donation).unwrap();
        assert!(json.get("location").is_none());

        let back: Donation = serde_json::from_value(json).unwrap();
        assert!(back.location.is_none());
    }

    #[test]
    fn test_donation_counted_amount() {
        let mut donation = sample_donation();
        assert_eq!(donation.counted_amount(), 100);
        donation.category = Category::Food;
        assert_eq!(donation.counted_amount(), 0);
    }

    #[test]
    fn test_donation_recorded_at() {
        let donation = sample_donation();
        assert_eq!(donation.recorded_at().timestamp_millis(), 1_700_000_000_000);
    }
}
