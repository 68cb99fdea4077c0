use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Args, Subcommand};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::{
    api::{ApiClient, ApiConfig, FieldUpdate, NewField, NewFieldSet},
    reorder::{
        BatchReport, ConsistencyReport, FieldCatalog, InvalidMove, MoveOutcome, OrderedCollection,
        ReorderError, Reorderer,
    },
    settings::{Settings, TOKEN_ENV},
    types::{ApiError, CustomField, CustomFieldSet, FieldId, FieldSetId, ParentType, Position},
};

const SCHEMA_VERSION: &str = "cli.v1";

#[derive(Debug, Clone, Subcommand)]
pub enum RootCommand {
    /// Inspect, edit and reorder custom fields
    Field {
        #[command(subcommand)]
        command: FieldCommand,
    },
    /// Inspect and edit custom field sets
    FieldSet {
        #[command(subcommand)]
        command: FieldSetCommand,
    },
    /// Show or change the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum FieldCommand {
    /// List fields in display order
    List(FieldListArgs),
    /// Report gaps and duplicates in display orders
    Check(FieldCheckArgs),
    /// Move one or more fields next to a target field
    Move(FieldMoveArgs),
    /// Create a field, placed last unless an order is given
    Create(FieldCreateArgs),
    /// Rename a field or change its visibility and required flag
    Update(FieldUpdateArgs),
    /// Delete a field
    Delete(FieldDeleteArgs),
    /// Show how to repair inconsistent display orders
    FixOrder(FixOrderArgs),
}

#[derive(Debug, Clone, Args)]
pub struct FieldListArgs {
    #[arg(long)]
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum FieldSetCommand {
    /// List field sets and their members
    List,
    /// Create a field set
    Create(FieldSetCreateArgs),
    /// Change a field set's label
    Rename(FieldSetRenameArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings
    Show,
    /// Change settings and write them back
    Set(ConfigSetArgs),
}

#[derive(Debug, Clone, Args)]
pub struct FieldCheckArgs {
    /// Check every parent type instead of the selected one
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Clone, Args)]
#[group(id = "anchor", required = true, multiple = false)]
pub struct AnchorArgs {
    #[arg(long, value_name = "FIELD_ID", group = "anchor")]
    pub before: Option<FieldId>,

    #[arg(long, value_name = "FIELD_ID", group = "anchor")]
    pub after: Option<FieldId>,
}

impl AnchorArgs {
    fn resolve(&self) -> Option<(FieldId, Position)> {
        match (self.before, self.after) {
            (Some(id), None) => Some((id, Position::Before)),
            (None, Some(id)) => Some((id, Position::After)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct FieldMoveArgs {
    #[arg(long = "id", value_name = "FIELD_ID", required = true, value_delimiter = ',')]
    pub ids: Vec<FieldId>,

    #[command(flatten)]
    pub anchor: AnchorArgs,
}

#[derive(Debug, Clone, Args)]
pub struct FieldCreateArgs {
    #[arg(long, value_name = "TEXT")]
    pub name: String,

    #[arg(long, value_name = "TYPE", default_value = "text_line")]
    pub field_type: String,

    #[arg(long, value_name = "N")]
    pub display_order: Option<i64>,

    #[arg(long)]
    pub hidden: bool,

    #[arg(long)]
    pub required: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FieldUpdateArgs {
    #[arg(long, value_name = "FIELD_ID")]
    pub id: FieldId,

    #[arg(long, value_name = "TEXT")]
    pub name: Option<String>,

    #[arg(long, conflicts_with = "hide")]
    pub show: bool,

    #[arg(long)]
    pub hide: bool,

    #[arg(long, conflicts_with = "optional")]
    pub required: bool,

    #[arg(long)]
    pub optional: bool,
}

impl FieldUpdateArgs {
    fn to_update(&self) -> CliResult<FieldUpdate> {
        let name = match self.name.as_deref().map(str::trim) {
            Some("") => return Err(usage_error("NAME_REQUIRED", "field name cannot be empty")),
            other => other.map(str::to_string),
        };
        let update = FieldUpdate {
            name,
            displayed: flag_pair(self.show, self.hide),
            required: flag_pair(self.required, self.optional),
        };
        if update.is_empty() {
            return Err(usage_error(
                "NOTHING_TO_UPDATE",
                "pass --name, --show/--hide or --required/--optional",
            ));
        }
        Ok(update)
    }
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Args)]
pub struct FieldDeleteArgs {
    #[arg(long, value_name = "FIELD_ID")]
    pub id: FieldId,

    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FieldSetCreateArgs {
    #[arg(long, value_name = "TEXT")]
    pub name: String,

    #[arg(long = "field-id", value_name = "FIELD_ID", value_delimiter = ',')]
    pub field_ids: Vec<FieldId>,

    #[arg(long)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FieldSetRenameArgs {
    #[arg(long, value_name = "SET_ID")]
    pub id: FieldSetId,

    #[arg(long, value_name = "TEXT")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConfigSetArgs {
    #[arg(long, value_name = "URL")]
    pub api_base_url: Option<String>,

    #[arg(long, value_name = "URL")]
    pub web_base_url: Option<String>,

    #[arg(long, value_name = "MS")]
    pub request_timeout_ms: Option<u64>,

    #[arg(long, value_name = "matter|contact")]
    pub default_parent_type: Option<String>,

    #[arg(long, value_name = "TOKEN", conflicts_with = "clear_token")]
    pub access_token: Option<String>,

    #[arg(long)]
    pub clear_token: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FixOrderArgs {
    #[arg(long)]
    pub open: bool,
}

pub async fn run(
    settings: &Settings,
    parent_type: ParentType,
    command: RootCommand,
    json_output: bool,
    quiet: bool,
) -> i32 {
    match execute(settings, parent_type, command).await {
        Ok(output) => {
            print_success(output, json_output, quiet);
            0
        }
        Err(err) => {
            print_error(&err, parent_type, json_output);
            err.exit_code
        }
    }
}

struct CommandOutput {
    command: &'static str,
    parent_type: ParentType,
    data: Value,
    text: String,
}

#[derive(Debug)]
struct CliError {
    exit_code: i32,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

type CliResult<T> = Result<T, CliError>;

async fn execute(
    settings: &Settings,
    parent_type: ParentType,
    command: RootCommand,
) -> CliResult<CommandOutput> {
    match command {
        RootCommand::Field { command } => match command {
            FieldCommand::List(args) => field_list(&connect(settings)?, parent_type, args).await,
            FieldCommand::Check(args) => {
                field_check(&connect(settings)?, settings, parent_type, args).await
            }
            FieldCommand::Move(args) => {
                field_move(connect(settings)?, settings, parent_type, args).await
            }
            FieldCommand::Create(args) => {
                field_create(&connect(settings)?, parent_type, args).await
            }
            FieldCommand::Update(args) => {
                field_update(&connect(settings)?, parent_type, args).await
            }
            FieldCommand::Delete(args) => {
                field_delete(&connect(settings)?, parent_type, args).await
            }
            FieldCommand::FixOrder(args) => fix_order(settings, parent_type, args),
        },
        RootCommand::FieldSet { command } => match command {
            FieldSetCommand::List => field_set_list(&connect(settings)?, parent_type).await,
            FieldSetCommand::Create(args) => {
                field_set_create(&connect(settings)?, parent_type, args).await
            }
            FieldSetCommand::Rename(args) => {
                field_set_rename(&connect(settings)?, parent_type, args).await
            }
        },
        RootCommand::Config { command } => {
            let path = Settings::config_path()
                .ok_or_else(|| runtime_error("unable to determine config path"))?;
            match command {
                ConfigCommand::Show => Ok(config_output("config show", settings, &path)),
                ConfigCommand::Set(args) => config_set(settings, &path, args),
            }
        }
    }
}

fn connect(settings: &Settings) -> CliResult<ApiClient> {
    let access_token = settings.resolve_access_token().ok_or_else(|| {
        usage_error(
            "TOKEN_REQUIRED",
            format!("set {TOKEN_ENV} or access_token in the settings file"),
        )
    })?;

    ApiClient::new(ApiConfig {
        base_url: settings.api_base_url.clone(),
        access_token,
        request_timeout: settings.request_timeout(),
    })
    .map_err(api_error)
}

async fn load_collection(
    client: &ApiClient,
    parent_type: ParentType,
) -> CliResult<OrderedCollection> {
    let fields = client.list_fields(parent_type).await.map_err(api_error)?;
    Ok(FieldCatalog::from_fields(fields).take(parent_type))
}

async fn field_list(
    client: &ApiClient,
    parent_type: ParentType,
    args: FieldListArgs,
) -> CliResult<CommandOutput> {
    let collection = load_collection(client, parent_type).await?;
    let fields: Vec<&CustomField> = if args.include_deleted {
        collection.ordered().iter().collect()
    } else {
        collection.visible().collect()
    };

    let data = json!({
        "fields": fields.iter().map(|field| field_json(field)).collect::<Vec<_>>()
    });
    let text = render_field_list_text(&fields);

    Ok(CommandOutput {
        command: "field list",
        parent_type,
        data,
        text,
    })
}

async fn field_check(
    client: &ApiClient,
    settings: &Settings,
    parent_type: ParentType,
    args: FieldCheckArgs,
) -> CliResult<CommandOutput> {
    let scopes = if args.all {
        ParentType::ALL.to_vec()
    } else {
        vec![parent_type]
    };
    let mut fields = Vec::new();
    for scope in &scopes {
        fields.extend(client.list_fields(*scope).await.map_err(api_error)?);
    }
    let catalog = FieldCatalog::from_fields(fields);
    let reports = if args.all {
        catalog.reports()
    } else {
        vec![catalog.report(parent_type)]
    };

    let mut lines = Vec::new();
    for report in &reports {
        lines.push(report.to_string());
        if !report.is_consistent() {
            lines.push(format!(
                "  run `field fix-order -p {}` for repair steps: {}",
                report.parent_type,
                fix_order_url(&settings.web_base_url, report.parent_type)
            ));
        }
    }

    Ok(CommandOutput {
        command: "field check",
        parent_type,
        data: json!({
            "consistent": reports.iter().all(ConsistencyReport::is_consistent),
            "scopes": reports.iter().map(consistency_json).collect::<Vec<_>>()
        }),
        text: lines.join("\n"),
    })
}

async fn field_move(
    client: ApiClient,
    settings: &Settings,
    parent_type: ParentType,
    args: FieldMoveArgs,
) -> CliResult<CommandOutput> {
    let (target_id, position) = args.anchor.resolve().ok_or_else(|| {
        usage_error("ANCHOR_REQUIRED", "provide exactly one of --before or --after")
    })?;

    let mut collection = load_collection(&client, parent_type).await?;
    let stop = Arc::new(AtomicBool::new(false));
    let interrupt = {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; stopping after the current field");
                stop.store(true, Ordering::Relaxed);
            }
        })
    };

    let reorderer = Reorderer::new(client)
        .with_timeout(settings.request_timeout())
        .with_stop_flag(stop);
    let result = reorderer
        .move_many(&mut collection, &args.ids, target_id, position)
        .await;
    interrupt.abort();

    let report = result.map_err(|err| reorder_error(err, &settings.web_base_url))?;
    info!(
        batch_id = %report.batch_id,
        complete = report.is_complete(),
        "field move command finished"
    );

    let data = json!({
        "batch": batch_json(&report),
        "fields": collection.ordered().iter().map(field_json).collect::<Vec<_>>()
    });
    let text = render_batch_text(&report, &collection);

    Ok(CommandOutput {
        command: "field move",
        parent_type,
        data,
        text,
    })
}

async fn field_create(
    client: &ApiClient,
    parent_type: ParentType,
    args: FieldCreateArgs,
) -> CliResult<CommandOutput> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(usage_error("NAME_REQUIRED", "field name cannot be empty"));
    }
    if args.display_order.is_some_and(|order| order < 0) {
        return Err(usage_error(
            "INVALID_DISPLAY_ORDER",
            "display order cannot be negative",
        ));
    }

    let mut collection = load_collection(client, parent_type).await?;
    let new_field = NewField {
        name: name.to_string(),
        parent_type,
        field_type: args.field_type,
        displayed: !args.hidden,
        required: args.required,
        display_order: args.display_order,
    };
    let created = client
        .create_field(&new_field, collection.next_display_order())
        .await
        .map_err(api_error)?;
    let mut text = format!(
        "created field {} ({}) at order {}",
        created.name, created.id, created.display_order
    );
    let data = json!({ "field": field_json(&created) });

    // An explicit order can collide with an existing field.
    if collection.insert(created) {
        let report = collection.check_consistency();
        if !report.is_consistent() {
            warn!(%report, "display orders inconsistent after field creation");
            text.push_str(&format!("\nwarning: {report}; run `field fix-order`"));
        }
    }

    Ok(CommandOutput {
        command: "field create",
        parent_type,
        data,
        text,
    })
}

async fn field_update(
    client: &ApiClient,
    parent_type: ParentType,
    args: FieldUpdateArgs,
) -> CliResult<CommandOutput> {
    let update = args.to_update()?;
    let updated = client
        .update_field(args.id, &update)
        .await
        .map_err(api_error)?;
    let text = format!(
        "updated field {} ({}): {}",
        updated.name,
        updated.id,
        field_flags(&updated)
    );

    Ok(CommandOutput {
        command: "field update",
        parent_type,
        data: json!({ "field": field_json(&updated) }),
        text,
    })
}

async fn field_delete(
    client: &ApiClient,
    parent_type: ParentType,
    args: FieldDeleteArgs,
) -> CliResult<CommandOutput> {
    if !args.yes {
        return Err(usage_error(
            "CONFIRMATION_REQUIRED",
            format!("deleting field {} cannot be undone; pass --yes", args.id),
        ));
    }
    client.delete_field(args.id).await.map_err(api_error)?;

    Ok(CommandOutput {
        command: "field delete",
        parent_type,
        data: json!({ "deleted": args.id }),
        text: format!("deleted field {}", args.id),
    })
}

async fn field_set_list(client: &ApiClient, parent_type: ParentType) -> CliResult<CommandOutput> {
    let sets = client
        .list_field_sets(parent_type)
        .await
        .map_err(api_error)?;

    Ok(CommandOutput {
        command: "field-set list",
        parent_type,
        data: json!({ "field_sets": sets.iter().map(field_set_json).collect::<Vec<_>>() }),
        text: render_field_set_list_text(&sets),
    })
}

async fn field_set_create(
    client: &ApiClient,
    parent_type: ParentType,
    args: FieldSetCreateArgs,
) -> CliResult<CommandOutput> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(usage_error("NAME_REQUIRED", "field set name cannot be empty"));
    }
    if !args.field_ids.is_empty() {
        let collection = load_collection(client, parent_type).await?;
        let unknown: Vec<FieldId> = args
            .field_ids
            .iter()
            .copied()
            .filter(|id| collection.get(*id).is_none())
            .collect();
        if !unknown.is_empty() {
            return Err(CliError {
                details: Some(json!({ "unknown": unknown })),
                ..not_found_error(
                    "FIELD_NOT_FOUND",
                    format!("{} field(s) are not {parent_type} fields", unknown.len()),
                )
            });
        }
    }

    let created = client
        .create_field_set(&NewFieldSet {
            name: name.to_string(),
            parent_type,
            displayed: !args.hidden,
            field_ids: args.field_ids,
        })
        .await
        .map_err(api_error)?;

    Ok(CommandOutput {
        command: "field-set create",
        parent_type,
        text: format!(
            "created field set {} ({}) with {} field(s)",
            created.name,
            created.id,
            created.custom_fields.len()
        ),
        data: json!({ "field_set": field_set_json(&created) }),
    })
}

async fn field_set_rename(
    client: &ApiClient,
    parent_type: ParentType,
    args: FieldSetRenameArgs,
) -> CliResult<CommandOutput> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(usage_error("NAME_REQUIRED", "field set name cannot be empty"));
    }
    let renamed = client
        .rename_field_set(args.id, name)
        .await
        .map_err(api_error)?;

    Ok(CommandOutput {
        command: "field-set rename",
        parent_type,
        text: format!("renamed field set {} to {}", renamed.id, renamed.name),
        data: json!({ "field_set": field_set_json(&renamed) }),
    })
}

fn config_set(settings: &Settings, path: &Path, args: ConfigSetArgs) -> CliResult<CommandOutput> {
    let mut updated = settings.clone();
    let mut changed = false;
    if let Some(url) = args.api_base_url {
        updated.api_base_url = url;
        changed = true;
    }
    if let Some(url) = args.web_base_url {
        updated.web_base_url = url;
        changed = true;
    }
    if let Some(timeout) = args.request_timeout_ms {
        updated.request_timeout_ms = timeout;
        changed = true;
    }
    if let Some(raw) = args.default_parent_type {
        let parent_type = ParentType::from_str(&raw).map_err(|()| {
            usage_error(
                "INVALID_PARENT_TYPE",
                format!("unknown parent type '{raw}'; expected matter or contact"),
            )
        })?;
        updated.default_parent_type = parent_type.as_str().to_string();
        changed = true;
    }
    if let Some(token) = args.access_token {
        updated.access_token = Some(token);
        changed = true;
    }
    if args.clear_token {
        updated.access_token = None;
        changed = true;
    }
    if !changed {
        return Err(usage_error("NOTHING_TO_SET", "pass at least one setting to change"));
    }

    updated.save_to_path(path).map_err(|err| runtime_error(format!("{err:#}")))?;
    info!(path = %path.display(), "settings saved");
    let saved = Settings::load_from_path(path);
    Ok(config_output("config set", &saved, path))
}

fn config_output(command: &'static str, settings: &Settings, path: &Path) -> CommandOutput {
    let token = token_source(settings);
    let rows = vec![
        vec!["path".to_string(), path.display().to_string()],
        vec!["api_base_url".to_string(), settings.api_base_url.clone()],
        vec!["web_base_url".to_string(), settings.web_base_url.clone()],
        vec![
            "request_timeout_ms".to_string(),
            settings.request_timeout_ms.to_string(),
        ],
        vec![
            "default_parent_type".to_string(),
            settings.default_parent_type.clone(),
        ],
        vec!["access_token".to_string(), token.to_string()],
    ];

    CommandOutput {
        command,
        parent_type: settings.parent_type(),
        data: json!({
            "path": path.display().to_string(),
            "api_base_url": settings.api_base_url,
            "web_base_url": settings.web_base_url,
            "request_timeout_ms": settings.request_timeout_ms,
            "default_parent_type": settings.default_parent_type,
            "access_token": token
        }),
        text: render_text_table(&["Setting", "Value"], &rows),
    }
}

/// Where the token comes from. The token itself is never printed.
fn token_source(settings: &Settings) -> &'static str {
    let from_env = std::env::var(TOKEN_ENV).is_ok_and(|value| !value.trim().is_empty());
    match (from_env, settings.access_token.is_some()) {
        (true, _) => "environment",
        (false, true) => "settings file",
        (false, false) => "not set",
    }
}

fn fix_order(
    settings: &Settings,
    parent_type: ParentType,
    args: FixOrderArgs,
) -> CliResult<CommandOutput> {
    let url = fix_order_url(&settings.web_base_url, parent_type);
    if args.open {
        open::that(&url).map_err(|err| {
            runtime_error(format!("failed to open browser for {url}: {err}"))
        })?;
    }

    let steps = [
        "Open the custom field settings page below",
        "Click \"Modify Order\"",
        "Scroll to the bottom and click \"Save Order\"",
        "Re-run `field check` to confirm",
    ];
    let mut text = format!(
        "Display orders for {parent_type} fields must be sequential before reordering.\n"
    );
    for (index, step) in steps.iter().enumerate() {
        text.push_str(&format!("  {}) {step}\n", index + 1));
    }
    text.push_str(&url);

    Ok(CommandOutput {
        command: "field fix-order",
        parent_type,
        data: json!({ "url": url, "steps": steps, "opened": args.open }),
        text,
    })
}

fn fix_order_url(web_base_url: &str, parent_type: ParentType) -> String {
    let scope = parent_type.as_str();
    format!(
        "{}/nc/#/settings?path=settings/custom_fields%3Fparent_type={}&prefix={}",
        web_base_url.trim_end_matches('/'),
        urlencoding::encode(scope),
        urlencoding::encode(&format!("custom_{scope}_fields")),
    )
}

fn render_field_list_text(fields: &[&CustomField]) -> String {
    if fields.is_empty() {
        return "No fields found.".to_string();
    }

    let headers = ["Order", "ID", "Name", "Type", "Flags"];
    let rows = fields
        .iter()
        .map(|field| {
            vec![
                field.display_order.to_string(),
                field.id.to_string(),
                field.name.replace('\n', " "),
                field.field_type.clone().unwrap_or_else(|| "-".to_string()),
                field_flags(field),
            ]
        })
        .collect::<Vec<_>>();

    render_text_table(&headers, &rows)
}

fn field_flags(field: &CustomField) -> String {
    let mut flags = Vec::new();
    if field.required {
        flags.push("required");
    }
    if !field.displayed {
        flags.push("hidden");
    }
    if field.deleted {
        flags.push("deleted");
    }
    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(",")
    }
}

fn render_field_set_list_text(sets: &[CustomFieldSet]) -> String {
    if sets.is_empty() {
        return "No field sets found.".to_string();
    }

    let headers = ["ID", "Name", "Fields", "Flags"];
    let rows = sets
        .iter()
        .map(|set| {
            let members = set
                .field_ids()
                .map(|id| id.to_string())
                .collect::<Vec<_>>();
            vec![
                set.id.to_string(),
                set.name.replace('\n', " "),
                if members.is_empty() {
                    "-".to_string()
                } else {
                    members.join(",")
                },
                if set.displayed { "-" } else { "hidden" }.to_string(),
            ]
        })
        .collect::<Vec<_>>();

    render_text_table(&headers, &rows)
}

fn render_batch_text(report: &BatchReport, collection: &OrderedCollection) -> String {
    let headers = ["Field", "Anchor", "Result", "Detail"];
    let rows = report
        .moves
        .iter()
        .map(|mv| {
            let name = collection
                .get(mv.field_id)
                .map(|field| format!("{} ({})", field.name, field.id))
                .unwrap_or_else(|| mv.field_id.to_string());
            vec![
                name,
                format!("{} {}", mv.position.as_str(), mv.target_id),
                mv.outcome.as_str().to_string(),
                outcome_detail(&mv.outcome),
            ]
        })
        .collect::<Vec<_>>();

    let moved = report.succeeded().count();
    let summary = if report.is_complete() {
        format!("moved {moved} field(s) into place")
    } else {
        format!(
            "moved {moved} of {} field(s); the rest were left where they were",
            report.moves.len()
        )
    };

    format!("{}\n{summary}", render_text_table(&headers, &rows))
}

fn outcome_detail(outcome: &MoveOutcome) -> String {
    match outcome {
        MoveOutcome::Moved { from, to } => format!("{from} -> {to}"),
        MoveOutcome::Unchanged => "already in place".to_string(),
        MoveOutcome::Rejected(reason) => match reason {
            InvalidMove::UnknownItem(id) => format!("field {id} not found"),
            InvalidMove::UnknownTarget(id) => format!("target {id} not found"),
            InvalidMove::SameItem(id) => format!("field {id} is the target"),
        },
        MoveOutcome::Failed(err) => err.to_string(),
        MoveOutcome::Cancelled => "interrupted".to_string(),
    }
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|width| "-".repeat(*width + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let render_row = |cells: Vec<&str>| {
        format!(
            "| {} |",
            cells
                .iter()
                .enumerate()
                .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
                .collect::<Vec<_>>()
                .join(" | ")
        )
    };

    let mut lines = vec![border.clone(), render_row(headers.to_vec()), border.clone()];
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str).collect()));
    }
    lines.push(border);
    lines.join("\n")
}

fn field_json(field: &CustomField) -> Value {
    json!({
        "id": field.id,
        "name": field.name,
        "parent_type": field.parent_type.as_str(),
        "field_type": field.field_type,
        "displayed": field.displayed,
        "deleted": field.deleted,
        "required": field.required,
        "display_order": field.display_order
    })
}

fn field_set_json(set: &CustomFieldSet) -> Value {
    json!({
        "id": set.id,
        "name": set.name,
        "parent_type": set.parent_type.as_str(),
        "displayed": set.displayed,
        "field_ids": set.field_ids().collect::<Vec<_>>()
    })
}

fn consistency_json(report: &ConsistencyReport) -> Value {
    json!({
        "parent_type": report.parent_type.as_str(),
        "consistent": report.is_consistent(),
        "count": report.count,
        "min": report.min,
        "max": report.max,
        "duplicates": report.duplicates,
        "missing": report.missing,
        "missing_count": report.missing_count
    })
}

fn batch_json(report: &BatchReport) -> Value {
    json!({
        "batch_id": report.batch_id,
        "target_id": report.target_id,
        "position": report.position.as_str(),
        "complete": report.is_complete(),
        "moves": report.moves.iter().map(|mv| {
            let mut entry = json!({
                "field_id": mv.field_id,
                "target_id": mv.target_id,
                "position": mv.position.as_str(),
                "status": mv.outcome.as_str()
            });
            match &mv.outcome {
                MoveOutcome::Moved { from, to } => {
                    entry["from"] = json!(from);
                    entry["to"] = json!(to);
                }
                MoveOutcome::Rejected(reason) => entry["reason"] = json!(reason.code()),
                MoveOutcome::Failed(err) => {
                    entry["error"] = json!({ "code": err.code, "message": err.message });
                }
                MoveOutcome::Unchanged | MoveOutcome::Cancelled => {}
            }
            entry
        }).collect::<Vec<_>>()
    })
}

fn usage_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 2,
        code,
        message: message.into(),
        details: None,
    }
}

fn not_found_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 3,
        code,
        message: message.into(),
        details: None,
    }
}

fn conflict_error(
    code: &'static str,
    message: impl Into<String>,
    details: Option<Value>,
) -> CliError {
    CliError {
        exit_code: 4,
        code,
        message: message.into(),
        details,
    }
}

fn runtime_error(err: impl std::fmt::Display) -> CliError {
    CliError {
        exit_code: 5,
        code: "RUNTIME_ERROR",
        message: err.to_string(),
        details: None,
    }
}

fn api_error(err: ApiError) -> CliError {
    let details = Some(json!({ "api_code": err.code }));
    match err.code.as_str() {
        "AUTH_ERROR" | "FORBIDDEN" => CliError {
            exit_code: 5,
            code: "API_AUTH_ERROR",
            message: err.message,
            details,
        },
        "NOT_FOUND" => CliError {
            details,
            ..not_found_error("API_NOT_FOUND", err.message)
        },
        _ => CliError {
            exit_code: 5,
            code: "API_ERROR",
            message: err.message,
            details,
        },
    }
}

fn reorder_error(err: ReorderError, web_base_url: &str) -> CliError {
    match err {
        ReorderError::EmptySelection => usage_error("SELECTION_REQUIRED", err.to_string()),
        ReorderError::UnknownTarget(_) => not_found_error("FIELD_NOT_FOUND", err.to_string()),
        ReorderError::Inconsistent(ref report) => conflict_error(
            "ORDER_INCONSISTENT",
            err.to_string(),
            Some(json!({
                "consistency": consistency_json(report),
                "fix_url": fix_order_url(web_base_url, report.parent_type)
            })),
        ),
    }
}

fn print_success(output: CommandOutput, json_output: bool, quiet: bool) {
    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "ok": true,
            "command": output.command,
            "parent_type": output.parent_type.as_str(),
            "data": output.data
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => println!("{value}"),
            Err(_) => println!("{}", payload),
        }
        return;
    }

    if quiet {
        return;
    }

    if output.text.is_empty() {
        println!("ok");
    } else {
        println!("{}", output.text);
    }
}

fn print_error(err: &CliError, parent_type: ParentType, json_output: bool) {
    error!(
        code = err.code,
        message = %err.message,
        details = ?err.details,
        "cli command failed"
    );

    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "ok": false,
            "parent_type": parent_type.as_str(),
            "error": {
                "code": err.code,
                "message": err.message,
                "details": err.details
            }
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => eprintln!("{value}"),
            Err(_) => eprintln!("{}", payload),
        }
        return;
    }

    eprintln!("error[{}]: {}", err.code, err.message);
}
