//! Query shapes for search analytics requests.

use serde::{Deserialize, Serialize};

use super::period::Period;
use super::row::Dimension;

/// Which search surface the rows come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchType {
    #[default]
    Web,
    Image,
    Video,
    News,
    Discover,
    GoogleNews,
}

impl SearchType {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SearchType::Web => "web",
            SearchType::Image => "image",
            SearchType::Video => "video",
            SearchType::News => "news",
            SearchType::Discover => "discover",
            SearchType::GoogleNews => "googleNews",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IncludingRegex,
    ExcludingRegex,
}

impl FilterOperator {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "notEquals",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "notContains",
            FilterOperator::IncludingRegex => "includingRegex",
            FilterOperator::ExcludingRegex => "excludingRegex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFilter {
    pub dimension: Dimension,
    pub operator: FilterOperator,
    pub expression: String,
}

/// `Final` excludes the most recent, still-settling days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataState {
    #[default]
    Final,
    All,
}

impl DataState {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            DataState::Final => "final",
            DataState::All => "all",
        }
    }
}

/// Shape of one analytics dataset request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Period,

    pub dimensions: Vec<Dimension>,

    #[serde(default)]
    pub search_type: SearchType,

    /// All filters are ANDed.
    #[serde(default)]
    pub filters: Vec<DimensionFilter>,

    #[serde(default)]
    pub data_state: DataState,

    /// Overrides the configured row cap for this query.
    pub max_rows: Option<usize>,
}

impl AnalyticsQuery {
    pub fn new(period: Period, dimensions: impl IntoIterator<Item = Dimension>) -> Self {
        Self {
            period,
            dimensions: dimensions.into_iter().collect(),
            search_type: SearchType::default(),
            filters: vec![],
            data_state: DataState::default(),
            max_rows: None,
        }
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    pub fn with_filter(
        mut self,
        dimension: Dimension,
        operator: FilterOperator,
        expression: impl Into<String>,
    ) -> Self {
        self.filters.push(DimensionFilter {
            dimension,
            operator,
            expression: expression.into(),
        });
        self
    }

    pub fn with_data_state(mut self, data_state: DataState) -> Self {
        self.data_state = data_state;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Same shape over a different period.
    pub fn for_period(&self, period: Period) -> Self {
        Self {
            period,
            ..self.clone()
        }
    }
}

/// One physical page request: `row_limit` rows starting at `start_row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub row_limit: usize,
    pub start_row: usize,
}
