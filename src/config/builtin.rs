//! Built-in catalogue of the dashboard's feature tables

use once_cell::sync::Lazy;

use crate::config::table::{ColumnConfig, DashboardConfig, TableConfig};
use crate::filter::{FilterType, SortConfig, TableRelationship};

static BUILTIN: Lazy<DashboardConfig> = Lazy::new(build);

/// The six feature tables shipped with the dashboard
pub fn builtin() -> &'static DashboardConfig {
    &BUILTIN
}

fn col(id: &str, label: &str, filter_type: FilterType) -> ColumnConfig {
    ColumnConfig::new(id, label, filter_type)
}

fn table(
    name: &str,
    columns: Vec<ColumnConfig>,
    search_columns: &[&str],
    relationships: &[(&str, TableRelationship)],
) -> TableConfig {
    let mut config = TableConfig::new(name);
    config.columns = columns;
    config.search_columns = search_columns.iter().map(|c| c.to_string()).collect();
    config.default_sort = vec![SortConfig::desc("created_at")];
    config.relationships = relationships.iter().cloned().collect();
    config
}

fn build() -> DashboardConfig {
    use FilterType::{Date, MultiOption, Number, Text};

    let tables = vec![
        table(
            "clients",
            vec![
                col("name", "Name", Text),
                col("email", "Email", Text),
                col("status", "Status", FilterType::Option).with_options(["active", "inactive", "prospect"]),
                col("type", "Entity type", FilterType::Option)
                    .with_options(["individual", "llc", "s_corp", "c_corp", "partnership"]),
                col("tags", "Tags", MultiOption),
                col("annual_revenue", "Annual revenue", Number),
                col("created_at", "Created", Date),
            ],
            &["name", "email", "company"],
            &[("owner", TableRelationship::single("team_members"))],
        ),
        table(
            "tax_returns",
            vec![
                col("tax_year", "Tax year", Number),
                col("form_type", "Form", FilterType::Option)
                    .with_options(["1040", "1065", "1120", "1120S", "990"]),
                col("status", "Status", FilterType::Option)
                    .with_options(["not_started", "in_progress", "review", "filed", "accepted"]),
                col("refund_amount", "Refund", Number),
                col("due_date", "Due date", Date),
                col("filed_at", "Filed", Date),
            ],
            &["form_type"],
            &[
                ("client", TableRelationship::single("clients")),
                ("preparer", TableRelationship::single("team_members")),
            ],
        ),
        table(
            "advisory_engagements",
            vec![
                col("title", "Title", Text),
                col("service_type", "Service", FilterType::Option)
                    .with_options(["tax_planning", "bookkeeping", "cfo", "audit_support"]),
                col("status", "Status", FilterType::Option)
                    .with_options(["proposed", "active", "completed", "cancelled"]),
                col("fee", "Fee", Number),
                col("start_date", "Start", Date),
            ],
            &["title"],
            &[
                ("client", TableRelationship::single("clients")),
                ("advisors", TableRelationship::many("team_members")),
            ],
        ),
        table(
            "business_formations",
            vec![
                col("business_name", "Business name", Text),
                col("entity_type", "Entity type", FilterType::Option)
                    .with_options(["llc", "s_corp", "c_corp", "nonprofit"]),
                col("state", "State", FilterType::Option),
                col("status", "Status", FilterType::Option)
                    .with_options(["draft", "submitted", "approved", "rejected"]),
                col("filing_fee", "Filing fee", Number),
                col("submitted_at", "Submitted", Date),
            ],
            &["business_name", "state"],
            &[("client", TableRelationship::single("clients"))],
        ),
        table(
            "subscriptions",
            vec![
                col("plan", "Plan", FilterType::Option).with_options(["starter", "growth", "enterprise"]),
                col("status", "Status", FilterType::Option)
                    .with_options(["trialing", "active", "past_due", "cancelled"]),
                col("features", "Features", MultiOption),
                col("monthly_price", "Monthly price", Number),
                col("renews_at", "Renews", Date),
            ],
            &["plan"],
            &[("client", TableRelationship::single("clients"))],
        ),
        table(
            "team_members",
            vec![
                col("full_name", "Name", Text),
                col("email", "Email", Text),
                col("role", "Role", FilterType::Option)
                    .with_options(["partner", "manager", "senior", "staff", "admin"]),
                col("skills", "Skills", MultiOption),
                col("hired_at", "Hired", Date),
            ],
            &["full_name", "email"],
            &[("clients", TableRelationship::many("clients"))],
        ),
    ];

    DashboardConfig { tables }
}
