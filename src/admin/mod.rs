//! Administrative back-office
//!
//! Every model is described by one static [`ModelAdmin`] entry: which columns
//! the changelist shows, which fields are searched, which sidebar filters
//! exist and how the add/change forms are laid out. The [`AdminSite`] turns
//! that table into changelist queries through the generic
//! [`AdminQueryRepository`] and into bound forms for the templates; each model
//! supplies its field values and its save/delete logic through [`AdminModel`].

mod newspaper;
mod redactor;
mod topic;

pub use newspaper::{NewspaperAdmin, NEWSPAPER_ADMIN};
pub use redactor::{RedactorAdmin, REDACTOR_ADMIN};
pub use topic::{TopicAdmin, TOPIC_ADMIN};

use crate::db::repositories::{AdminFilter, AdminQuery, AdminQueryRepository};
use crate::forms::{FormData, FormErrors};
use crate::models::{ListParams, PageInfo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Default page size of a changelist
pub const LIST_PER_PAGE: u32 = 100;

// ============================================================================
// Configuration table
// ============================================================================

/// Static admin description of one model
#[derive(Debug, Serialize)]
pub struct ModelAdmin {
    /// URL segment, e.g. `topic` in `/admin/topic/`
    pub name: &'static str,
    pub verbose_name: &'static str,
    pub verbose_name_plural: &'static str,
    pub table: &'static str,
    pub list_display: &'static [Column],
    pub search_fields: &'static [&'static str],
    pub list_filter: &'static [ListFilter],
    /// Relations loaded in one batch for the whole changelist page
    pub prefetch_related: &'static [&'static str],
    /// Column names, `-` prefix for descending
    pub ordering: &'static [&'static str],
    pub list_per_page: u32,
    pub fieldsets: &'static [Fieldset],
    pub add_fieldsets: &'static [Fieldset],
}

#[derive(Debug, Serialize)]
pub struct Column {
    pub field: &'static str,
    pub label: &'static str,
}

/// Changelist sidebar filter
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListFilter {
    /// By year of a date column; query parameter `<column>__year`
    Year {
        param: &'static str,
        title: &'static str,
        column: &'static str,
    },
    /// By a related row reached through a join table
    ManyToMany {
        param: &'static str,
        title: &'static str,
        join_table: &'static str,
        owner_column: &'static str,
        join_column: &'static str,
        target_table: &'static str,
        label_column: &'static str,
    },
    /// Yes/No on a flag column
    Boolean {
        param: &'static str,
        title: &'static str,
    },
}

impl ListFilter {
    pub fn param(&self) -> &'static str {
        match self {
            Self::Year { param, .. } | Self::ManyToMany { param, .. } | Self::Boolean { param, .. } => {
                *param
            }
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Year { title, .. } | Self::ManyToMany { title, .. } | Self::Boolean { title, .. } => {
                *title
            }
        }
    }

    /// The query clause for a raw parameter value; invalid values are ignored
    fn to_query_filter(&self, raw: &str) -> Option<AdminFilter> {
        let raw = raw.trim();
        match self {
            Self::Year { column, .. } => raw.parse::<i32>().ok().map(|year| AdminFilter::Year {
                column: *column,
                year,
            }),
            Self::ManyToMany {
                join_table,
                owner_column,
                join_column,
                ..
            } => raw.parse::<i64>().ok().map(|value| AdminFilter::Related {
                join_table: *join_table,
                owner_column: *owner_column,
                join_column: *join_column,
                value,
            }),
            Self::Boolean { param, .. } => parse_flag(raw).map(|value| AdminFilter::Boolean {
                column: *param,
                value,
            }),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" | "True" => Some(true),
        "0" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct Fieldset {
    pub title: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub help: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    Text,
    Textarea,
    Number,
    Date,
    Email,
    Password,
    Checkbox,
    /// Shown but never submitted
    ReadOnly,
    MultiSelect {
        table: &'static str,
        label_column: &'static str,
    },
}

impl Widget {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Date => "date",
            Self::Email => "email",
            Self::Password => "password",
            Self::Checkbox => "checkbox",
            Self::ReadOnly => "readonly",
            Self::MultiSelect { .. } => "multiselect",
        }
    }
}

// ============================================================================
// Per-model behaviour
// ============================================================================

/// One changelist cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Text(String),
    Bool(bool),
}

/// Shown for a `list_display` field the model did not supply
const EMPTY_VALUE: &str = "-";

/// Field values of one object, keyed by field name
#[derive(Debug, Clone)]
pub struct Record {
    pub id: i64,
    pub repr: String,
    values: HashMap<&'static str, Cell>,
}

impl Record {
    pub fn new(id: i64, repr: impl Into<String>) -> Self {
        Self {
            id,
            repr: repr.into(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, field: &'static str, value: Cell) -> Self {
        self.values.insert(field, value);
        self
    }

    pub fn value(&self, field: &str) -> Option<&Cell> {
        self.values.get(field)
    }

    /// The changelist row for the given columns
    pub fn into_row(mut self, columns: &[Column]) -> Row {
        let cells = columns
            .iter()
            .map(|column| {
                self.values
                    .remove(column.field)
                    .unwrap_or_else(|| Cell::Text(EMPTY_VALUE.to_string()))
            })
            .collect();
        Row {
            id: self.id,
            repr: self.repr,
            cells,
        }
    }
}

/// One changelist row, cells in `list_display` order
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub id: i64,
    pub repr: String,
    pub cells: Vec<Cell>,
}

/// Failure of an admin save
#[derive(Debug, thiserror::Error)]
pub enum AdminSaveError {
    #[error("Invalid form: {0}")]
    Invalid(FormErrors),

    #[error("Object not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[async_trait]
pub trait AdminModel: Send + Sync {
    fn config(&self) -> &'static ModelAdmin;

    async fn count(&self) -> Result<i64>;

    /// Field values of the given ids, any order. Relations named in
    /// `prefetch` are loaded for the whole batch.
    async fn records(&self, ids: &[i64], prefetch: &[&'static str]) -> Result<Vec<Record>>;

    /// String form and change-form values of one object
    async fn initial(&self, id: i64) -> Result<Option<(String, FormData)>>;

    /// Values of an empty add form
    fn add_initial(&self) -> FormData {
        FormData::new()
    }

    /// Create (`id` is `None`) or update an object, returning its id
    async fn save(&self, id: Option<i64>, data: &FormData) -> Result<i64, AdminSaveError>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

// ============================================================================
// Site
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub name: &'static str,
    pub verbose_name_plural: &'static str,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterChoice {
    pub label: String,
    pub query: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterView {
    pub title: &'static str,
    pub param: &'static str,
    /// Raw value of the parameter in the current query
    pub current: Option<String>,
    pub choices: Vec<FilterChoice>,
}

/// A rendered-ready changelist page
#[derive(Debug, Clone, Serialize)]
pub struct ChangeList {
    pub rows: Vec<Row>,
    pub page: PageInfo,
    pub search: String,
    pub filters: Vec<FilterView>,
    /// Rows in the table before search and filters
    pub full_count: i64,
    /// Current query without the page parameter, for paging links
    pub base_query: String,
    #[serde(skip)]
    pub out_of_range: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundField {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: &'static str,
    pub help: &'static str,
    pub value: String,
    pub checked: bool,
    pub choices: Vec<Choice>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundFieldset {
    pub title: Option<&'static str>,
    pub fields: Vec<BoundField>,
}

/// Registry of admin models plus the generic changelist machinery
pub struct AdminSite {
    models: Vec<Arc<dyn AdminModel>>,
    queries: Arc<dyn AdminQueryRepository>,
}

impl AdminSite {
    pub fn new(queries: Arc<dyn AdminQueryRepository>) -> Self {
        Self {
            models: Vec::new(),
            queries,
        }
    }

    pub fn register(&mut self, model: Arc<dyn AdminModel>) {
        self.models.push(model);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AdminModel>> {
        self.models
            .iter()
            .find(|m| m.config().name == name)
            .cloned()
    }

    /// Registered models with their row counts
    pub async fn index(&self) -> Result<Vec<IndexEntry>> {
        let mut entries = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let config = model.config();
            entries.push(IndexEntry {
                name: config.name,
                verbose_name_plural: config.verbose_name_plural,
                count: model.count().await?,
            });
        }
        Ok(entries)
    }

    /// Search, filter and page one model's rows from the changelist query string
    pub async fn changelist(&self, model: &dyn AdminModel, query: &FormData) -> Result<ChangeList> {
        let config = model.config();
        let search = query.get("q").unwrap_or("").trim().to_string();
        let params = ListParams::from_query(query.get("p"), config.list_per_page);

        let mut admin_query = AdminQuery::new(config.table, params);
        admin_query.search_fields = config.search_fields;
        admin_query.ordering = config.ordering;
        admin_query.search = Some(search.clone()).filter(|s| !s.is_empty());
        for filter in config.list_filter {
            if let Some(clause) = query
                .get(filter.param())
                .and_then(|raw| filter.to_query_filter(raw))
            {
                admin_query.filters.push(clause);
            }
        }

        let page = self.queries.search_ids(&admin_query).await?;
        let mut rows: Vec<Row> = model
            .records(&page.items, config.prefetch_related)
            .await?
            .into_iter()
            .map(|record| record.into_row(config.list_display))
            .collect();
        let position: HashMap<i64, usize> =
            page.items.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        rows.sort_by_key(|row| position.get(&row.id).copied().unwrap_or(usize::MAX));

        let mut base = query.clone();
        base.remove("p");

        Ok(ChangeList {
            rows,
            page: page.page_info(),
            search,
            filters: self.filter_views(config, query).await?,
            full_count: model.count().await?,
            base_query: base
                .to_query_string()
                .context("Failed to encode the changelist query")?,
            out_of_range: page.is_out_of_range(),
        })
    }

    async fn filter_views(&self, config: &ModelAdmin, query: &FormData) -> Result<Vec<FilterView>> {
        let mut views = Vec::with_capacity(config.list_filter.len());
        for filter in config.list_filter {
            let options: Vec<(String, String)> = match filter {
                ListFilter::Year { column, .. } => self
                    .queries
                    .distinct_years(config.table, *column)
                    .await?
                    .into_iter()
                    .map(|y| (y.to_string(), y.to_string()))
                    .collect(),
                ListFilter::ManyToMany {
                    target_table,
                    label_column,
                    ..
                } => self
                    .queries
                    .choices(*target_table, *label_column)
                    .await?
                    .into_iter()
                    .map(|(id, label)| (id.to_string(), label))
                    .collect(),
                ListFilter::Boolean { .. } => vec![
                    ("1".to_string(), "Yes".to_string()),
                    ("0".to_string(), "No".to_string()),
                ],
            };

            let param = filter.param();
            let current = query.get(param);
            let mut choices = vec![FilterChoice {
                label: "All".to_string(),
                query: link_with(query, param, None)?,
                selected: current.is_none(),
            }];
            for (value, label) in options {
                choices.push(FilterChoice {
                    selected: current == Some(value.as_str()),
                    query: link_with(query, param, Some(&value))?,
                    label,
                });
            }

            views.push(FilterView {
                title: filter.title(),
                param,
                current: current.map(str::to_string),
                choices,
            });
        }
        Ok(views)
    }

    /// Pair form layout with submitted values, errors and multi-select choices
    pub async fn bind(
        &self,
        fieldsets: &'static [Fieldset],
        data: &FormData,
        errors: &FormErrors,
    ) -> Result<Vec<BoundFieldset>> {
        let mut bound = Vec::with_capacity(fieldsets.len());
        for fieldset in fieldsets {
            let mut fields = Vec::with_capacity(fieldset.fields.len());
            for spec in fieldset.fields {
                let choices = match spec.widget {
                    Widget::MultiSelect {
                        table,
                        label_column,
                    } => {
                        let selected = data.get_all(spec.name);
                        self.queries
                            .choices(table, label_column)
                            .await?
                            .into_iter()
                            .map(|(id, label)| {
                                let id = id.to_string();
                                Choice {
                                    selected: selected.contains(&id),
                                    id,
                                    label,
                                }
                            })
                            .collect()
                    }
                    _ => Vec::new(),
                };
                let value = match spec.widget {
                    Widget::Password => String::new(),
                    _ => data.get(spec.name).unwrap_or("").to_string(),
                };
                fields.push(BoundField {
                    name: spec.name,
                    label: spec.label,
                    widget: spec.widget.kind(),
                    help: spec.help,
                    checked: matches!(spec.widget, Widget::Checkbox) && !value.is_empty(),
                    value,
                    choices,
                    errors: errors.field(spec.name).to_vec(),
                });
            }
            bound.push(BoundFieldset {
                title: fieldset.title,
                fields,
            });
        }
        Ok(bound)
    }
}

/// The current changelist query with one parameter replaced, paging reset
fn link_with(query: &FormData, param: &str, value: Option<&str>) -> Result<String> {
    let mut next = query.clone();
    next.remove("p");
    match value {
        Some(value) => next.set(param, value),
        None => next.remove(param),
    }
    let encoded = next
        .to_query_string()
        .context("Failed to encode a filter link")?;
    Ok(format!("?{}", encoded))
}
