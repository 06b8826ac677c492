//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::{AssociationUpdate, Category, DonorUpdate};

/// Donor profile commands.
#[derive(Debug, Subcommand)]
pub enum DonorCommand {
    /// Create or overwrite a donor profile
    Create {
        /// Donor account id
        uid: String,

        /// Given name
        #[arg(long)]
        first_name: String,

        /// Family name
        #[arg(long)]
        last_name: String,

        /// Contact email
        #[arg(long)]
        email: String,
    },

    /// Show a donor profile
    Show {
        /// Donor account id
        uid: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Update some fields of a donor profile
    Update {
        /// Donor account id
        uid: String,

        /// Fields to change
        #[command(flatten)]
        fields: DonorFields,
    },

    /// Check whether a donor profile exists
    Exists {
        /// Donor account id
        uid: String,
    },
}

/// Optional donor fields for `donor update`.
#[derive(Debug, Default, Args)]
pub struct DonorFields {
    /// New given name
    #[arg(long)]
    pub first_name: Option<String>,

    /// New family name
    #[arg(long)]
    pub last_name: Option<String>,

    /// New contact email
    #[arg(long)]
    pub email: Option<String>,
}

impl From<DonorFields> for DonorUpdate {
    fn from(fields: DonorFields) -> Self {
        Self {
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
        }
    }
}

/// Association profile commands.
#[derive(Debug, Subcommand)]
pub enum AssociationCommand {
    /// Create or overwrite an association profile
    Create {
        /// Association account id
        uid: String,

        /// Public name
        #[arg(long)]
        name: String,

        /// Contact email
        #[arg(long)]
        email: String,
    },

    /// Show an association profile
    Show {
        /// Association account id
        uid: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Update some fields of an association profile
    Update {
        /// Association account id
        uid: String,

        /// New public name
        #[arg(long)]
        name: Option<String>,

        /// New contact email
        #[arg(long)]
        email: Option<String>,
    },

    /// Check whether an association profile exists
    Exists {
        /// Association account id
        uid: String,
    },
}

impl AssociationCommand {
    /// Build the partial update carried by `association update`.
    #[must_use]
    pub fn update_fields(name: Option<String>, email: Option<String>) -> AssociationUpdate {
        AssociationUpdate { name, email }
    }
}

/// Project catalog commands.
#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create a project
    Add(ProjectAddCommand),

    /// List projects
    List {
        /// Only projects of this association
        #[arg(short, long)]
        association: Option<String>,

        /// Only categories containing this text
        #[arg(long)]
        category: Option<String>,

        /// Include fully funded projects
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one project with its funding summary
    Show {
        /// Project id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete a project
    Delete {
        /// Project id
        id: String,
    },
}

/// Arguments for `project add`.
#[derive(Debug, Args)]
pub struct ProjectAddCommand {
    /// Short title
    #[arg(long)]
    pub title: String,

    /// Free-form description
    #[arg(long)]
    pub description: String,

    /// Funding target (positive whole number)
    #[arg(long)]
    pub amount_needed: String,

    /// Owning association name
    #[arg(long)]
    pub association: String,

    /// What the project collects
    #[arg(short = 't', long = "type", value_enum, default_value = "money")]
    pub category: CategoryArg,

    /// Image reference
    #[arg(long)]
    pub image: Option<String>,
}

/// Arguments for `donate`.
#[derive(Debug, Args)]
pub struct DonateCommand {
    /// Donor account id
    pub donor: String,

    /// Project id
    pub project: String,

    /// Kind of contribution
    #[arg(short = 't', long = "type", value_enum)]
    pub category: CategoryArg,

    /// Amount, required for money donations
    #[arg(short, long)]
    pub amount: Option<String>,

    /// Donor latitude
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Donor longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,
}

/// Statistics commands.
#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Summarize a donor's donations
    Donor {
        /// Donor account id
        uid: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Summarize the donations made to a project
    Project {
        /// Project id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Donor account id
    pub donor: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Classify command arguments.
///
/// Scores come from the on-device image classifier, one per category.
#[derive(Debug, Args)]
pub struct ClassifyCommand {
    /// Score for money
    #[arg(allow_negative_numbers = true)]
    pub money: f32,

    /// Score for food
    #[arg(allow_negative_numbers = true)]
    pub food: f32,

    /// Score for clothes
    #[arg(allow_negative_numbers = true)]
    pub clothes: f32,
}

impl ClassifyCommand {
    /// The donation category the scores select.
    #[must_use]
    pub fn category(&self) -> Category {
        Category::from_scores([self.money, self.food, self.clothes])
    }
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Donation category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// Money
    Money,
    /// Food parcels
    Food,
    /// Clothing
    Clothes,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Money => Self::Money,
            CategoryArg::Food => Self::Food,
            CategoryArg::Clothes => Self::Clothes,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_arg_conversion() {
        assert_eq!(Category::from(CategoryArg::Money), Category::Money);
        assert_eq!(Category::from(CategoryArg::Food), Category::Food);
        assert_eq!(Category::from(CategoryArg::Clothes), Category::Clothes);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_donor_fields_into_update() {
        let fields = DonorFields {
            email: Some("a@b.org".to_string()),
            ..DonorFields::default()
        };
        let update = DonorUpdate::from(fields);
        assert_eq!(update.email.as_deref(), Some("a@b.org"));
        assert!(update.first_name.is_none());
        assert!(!update.is_empty());

        assert!(DonorUpdate::from(DonorFields::default()).is_empty());
    }

    #[test]
    fn test_association_update_fields() {
        let update = AssociationCommand::update_fields(None, None);
        assert!(update.is_empty());

        let update = AssociationCommand::update_fields(Some("Relief".to_string()), None);
        assert_eq!(update.name.as_deref(), Some("Relief"));
    }

    #[test]
    fn test_classify_picks_highest_score() {
        let cmd = ClassifyCommand {
            money: 0.1,
            food: 0.2,
            clothes: 0.7,
        };
        assert_eq!(cmd.category(), Category::Clothes);

        let logits = ClassifyCommand {
            money: -1.5,
            food: -0.3,
            clothes: -2.0,
        };
        assert_eq!(logits.category(), Category::Food);
    }

    #[test]
    fn test_status_command_debug() {
        let cmd = StatusCommand { json: true };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("json"));
    }

    #[test]
    fn test_category_arg_debug() {
        assert_eq!(format!("{:?}", CategoryArg::Food), "Food");
    }
}
