//! The tool catalog: every tool the model can call, with its parameters.

use serde_json::json;
use std::collections::HashSet;
use thiserror::Error;

use crate::schema::{Bounds, ParamSpec, ToolSpec};

/// Listing page size.
pub const LIST_LIMIT: Bounds = Bounds::new(1, 100);
/// Listing offset.
pub const LIST_OFFSET: Bounds = Bounds::new(0, i64::MAX);
/// Rows returned from a downloaded result table.
pub const MAX_ROWS: Bounds = Bounds::new(1, 10_000);
/// Suggestion parser iterations.
pub const ITERATIONS: Bounds = Bounds::new(1, 3);
/// Marker distributor and semantics expander grouping strength.
pub const MIN_POWER: Bounds = Bounds::new(3, 9);
/// Semantics expander search depth.
pub const DEPTH: Bounds = Bounds::new(0, 9);

const SEARCH_ENGINES: &[&str] = &["yandex", "google"];
const LANGUAGES: &[&str] = &["ru", "en"];
const DEVICES: &[&str] = &["all", "desktop", "tablet_phone"];
const MARKER_MODES: &[&str] = &["hard", "soft"];
const TASK_MODES: &[&str] = &["info", "xlsx", "csv"];

/// Every tool the agent exposes. Dispatch is a match on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    AccountInfo,
    ListTasks,
    GetTask,
    DownloadResult,
    Cluster,
    TextAnalyzer,
    LsiAnalyzer,
    LsiGenerator,
    FrequencyCollector,
    SuggestionParser,
    ThematicClassifier,
    MarkerDistributor,
    SemanticsExpander,
    RegexSearch,
}

impl ToolKind {
    pub const ALL: [ToolKind; 14] = [
        Self::AccountInfo,
        Self::ListTasks,
        Self::GetTask,
        Self::DownloadResult,
        Self::Cluster,
        Self::TextAnalyzer,
        Self::LsiAnalyzer,
        Self::LsiGenerator,
        Self::FrequencyCollector,
        Self::SuggestionParser,
        Self::ThematicClassifier,
        Self::MarkerDistributor,
        Self::SemanticsExpander,
        Self::RegexSearch,
    ];

    /// The name the model calls the tool by.
    pub fn name(self) -> &'static str {
        match self {
            Self::AccountInfo => "justmagic_info",
            Self::ListTasks => "justmagic_list_tasks",
            Self::GetTask => "justmagic_get_task",
            Self::DownloadResult => "justmagic_download_result",
            Self::Cluster => "justmagic_cluster",
            Self::TextAnalyzer => "justmagic_text_analyzer",
            Self::LsiAnalyzer => "justmagic_aquarelle",
            Self::LsiGenerator => "justmagic_aquarelle_generator",
            Self::FrequencyCollector => "justmagic_wordstat_frequency",
            Self::SuggestionParser => "justmagic_suggestions_parser",
            Self::ThematicClassifier => "justmagic_thematic_classifier",
            Self::MarkerDistributor => "justmagic_markers_online",
            Self::SemanticsExpander => "justmagic_expand_semantics",
            Self::RegexSearch => "justmagic_regex_search",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether calling this tool queues a billable remote task.
    pub fn submits_task(self) -> bool {
        !matches!(
            self,
            Self::AccountInfo | Self::ListTasks | Self::GetTask | Self::DownloadResult
        )
    }

    /// The parameter schema for this tool.
    pub fn spec(self) -> ToolSpec {
        let (description, params) = match self {
            Self::AccountInfo => (
                "Get Just-Magic account information: balance and limits.",
                vec![],
            ),
            Self::ListTasks => (
                "List recent Just-Magic tasks with their status.",
                vec![
                    (
                        "limit",
                        ParamSpec::integer("Number of tasks to return")
                            .bounded(LIST_LIMIT)
                            .default_value(json!(10)),
                    ),
                    (
                        "offset",
                        ParamSpec::integer("Offset for pagination")
                            .bounded(LIST_OFFSET)
                            .default_value(json!(0)),
                    ),
                ],
            ),
            Self::GetTask => (
                "Get information about a task or its result by task ID.",
                vec![
                    ("tid", ParamSpec::integer("Task ID").required()),
                    (
                        "mode",
                        ParamSpec::string("info for status, xlsx/csv for the result")
                            .one_of(TASK_MODES)
                            .default_value(json!("info")),
                    ),
                ],
            ),
            Self::DownloadResult => (
                "Download a finished task's result as a table. Use this once the task status is 'done'.",
                vec![
                    ("tid", ParamSpec::integer("Task ID").required()),
                    (
                        "max_rows",
                        ParamSpec::integer("Maximum rows to return")
                            .bounded(MAX_ROWS)
                            .default_value(json!(100)),
                    ),
                ],
            ),
            Self::Cluster => (
                "Cluster search queries by SERP similarity in Yandex or Google. \
                 Groups semantically related queries.",
                vec![
                    queries_param("Queries to cluster"),
                    search_engine_param(),
                    (
                        "region",
                        ParamSpec::integer("Yandex region code (213 = Moscow, 2 = Saint Petersburg)")
                            .default_value(json!(213)),
                    ),
                    (
                        "google_lr",
                        ParamSpec::string("Google region code (for google only)"),
                    ),
                    lang_param(),
                    (
                        "collect_frequency",
                        ParamSpec::boolean("Also collect base Wordstat frequency")
                            .default_value(json!(false)),
                    ),
                    label_param(),
                    ("domain", ParamSpec::string("Site domain for relevance analysis")),
                    just_ask_param(),
                ],
            ),
            Self::TextAnalyzer => (
                "Analyze on-page text optimization of pages against their queries.",
                vec![
                    (
                        "pages",
                        ParamSpec::objects(
                            "Pages to analyze",
                            vec![
                                ("url", ParamSpec::string("Page URL").required()),
                                (
                                    "queries",
                                    ParamSpec::strings("Queries for this page").required(),
                                ),
                            ],
                        )
                        .required()
                        .non_empty(),
                    ),
                    search_engine_param(),
                    region_param(),
                    just_ask_param(),
                ],
            ),
            Self::LsiAnalyzer => (
                "LSI analysis of a text: finds LSI words for a query and checks their presence in the text.",
                vec![
                    ("keyword", ParamSpec::string("Key phrase").required()),
                    ("text", ParamSpec::string("Text to analyze").required()),
                    search_engine_param(),
                    lang_param(),
                    just_ask_param(),
                ],
            ),
            Self::LsiGenerator => (
                "Generate LSI words for queries to use when writing texts.",
                vec![
                    queries_param("Queries to generate LSI words for"),
                    search_engine_param(),
                    lang_param(),
                    just_ask_param(),
                ],
            ),
            Self::FrequencyCollector => (
                "Collect Yandex Wordstat frequencies for queries.",
                vec![
                    queries_param("Queries to collect frequency for"),
                    (
                        "device",
                        ParamSpec::string("Device: all, desktop, tablet_phone")
                            .one_of(DEVICES)
                            .default_value(json!("all")),
                    ),
                    ("region", ParamSpec::integer("Region code (empty for all regions)")),
                    label_param(),
                    (
                        "s_std",
                        ParamSpec::boolean("Collect base frequency").default_value(json!(true)),
                    ),
                    (
                        "s_q",
                        ParamSpec::boolean("Collect \"quoted\" frequency")
                            .default_value(json!(false)),
                    ),
                    just_ask_param(),
                ],
            ),
            Self::SuggestionParser => (
                "Parse Yandex search suggestions for queries.",
                vec![
                    queries_param("Seed queries to expand"),
                    region_param(),
                    lang_param(),
                    (
                        "iterations",
                        ParamSpec::integer("Number of parsing iterations (1-3)")
                            .bounded(ITERATIONS)
                            .default_value(json!(1)),
                    ),
                    (
                        "add_russian_letters",
                        ParamSpec::boolean("Append Russian letters to the queries")
                            .default_value(json!(false)),
                    ),
                    just_ask_param(),
                ],
            ),
            Self::ThematicClassifier => (
                "Determine the topic of queries (classify by thematic categories).",
                vec![
                    queries_param("Queries to classify"),
                    (
                        "show_all_categories",
                        ParamSpec::boolean("Show all categories").default_value(json!(false)),
                    ),
                    just_ask_param(),
                ],
            ),
            Self::MarkerDistributor => (
                "Distribute queries across site pages based on search results. \
                 Every page has a URL and optional marker queries.",
                vec![
                    (
                        "pages",
                        ParamSpec::objects(
                            "Pages with their marker queries",
                            vec![
                                ("url", ParamSpec::string("Page URL").required()),
                                ("queries", ParamSpec::strings("Marker queries")),
                            ],
                        )
                        .required()
                        .non_empty(),
                    ),
                    (
                        "base_queries",
                        ParamSpec::strings("Queries to distribute").required().non_empty(),
                    ),
                    region_param(),
                    (
                        "mode",
                        ParamSpec::string("Grouping mode")
                            .one_of(MARKER_MODES)
                            .default_value(json!("hard")),
                    ),
                    (
                        "min_power",
                        ParamSpec::integer("Grouping strength (3-9)")
                            .bounded(MIN_POWER)
                            .default_value(json!(3)),
                    ),
                    just_ask_param(),
                ],
            ),
            Self::SemanticsExpander => (
                "Expand semantics: find additional related queries from the base.",
                vec![
                    queries_param("Seed queries"),
                    (
                        "base",
                        ParamSpec::integer("Base number (3 = Moscow)").default_value(json!(3)),
                    ),
                    (
                        "depth",
                        ParamSpec::integer("Search depth (0-9)")
                            .bounded(DEPTH)
                            .default_value(json!(1)),
                    ),
                    (
                        "min_power",
                        ParamSpec::integer("Minimum link strength (3-9)")
                            .bounded(MIN_POWER)
                            .default_value(json!(3)),
                    ),
                    just_ask_param(),
                ],
            ),
            Self::RegexSearch => (
                "Search queries in the base by regular expression.",
                vec![
                    (
                        "pattern",
                        ParamSpec::string("POSIX regular expression to match").required(),
                    ),
                    (
                        "exclude_pattern",
                        ParamSpec::string("Regular expression to exclude"),
                    ),
                    (
                        "base",
                        ParamSpec::integer("Base number (3 = Moscow)").default_value(json!(3)),
                    ),
                    just_ask_param(),
                ],
            ),
        };

        ToolSpec {
            kind: self,
            name: self.name(),
            description,
            params,
        }
    }
}

fn queries_param(description: &'static str) -> (&'static str, ParamSpec) {
    ("queries", ParamSpec::strings(description).required().non_empty())
}

fn search_engine_param() -> (&'static str, ParamSpec) {
    (
        "search_engine",
        ParamSpec::string("Search engine")
            .one_of(SEARCH_ENGINES)
            .default_value(json!("yandex")),
    )
}

fn region_param() -> (&'static str, ParamSpec) {
    (
        "region",
        ParamSpec::integer("Yandex region code").default_value(json!(213)),
    )
}

fn lang_param() -> (&'static str, ParamSpec) {
    (
        "lang",
        ParamSpec::string("Language")
            .one_of(LANGUAGES)
            .default_value(json!("ru")),
    )
}

fn label_param() -> (&'static str, ParamSpec) {
    ("label", ParamSpec::string("Task label"))
}

fn just_ask_param() -> (&'static str, ParamSpec) {
    (
        "just_ask",
        ParamSpec::boolean("Only estimate the cost without running the task")
            .default_value(json!(false)),
    )
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(&'static str),

    #[error("tool name does not resolve back to its kind: {0}")]
    Unresolvable(&'static str),
}

/// The validated set of tool specs, built once at startup.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    specs: Vec<ToolSpec>,
}

impl ToolCatalog {
    /// Build the catalog, checking that names are unique and resolvable.
    pub fn new() -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(ToolKind::ALL.len());
        for kind in ToolKind::ALL {
            let name = kind.name();
            if !seen.insert(name) {
                return Err(CatalogError::DuplicateName(name));
            }
            if ToolKind::from_name(name) != Some(kind) {
                return Err(CatalogError::Unresolvable(name));
            }
            specs.push(kind.spec());
        }
        Ok(Self { specs })
    }

    pub fn get(&self, kind: ToolKind) -> Option<&ToolSpec> {
        self.specs.iter().find(|spec| spec.kind == kind)
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
