//! Maps validated tool arguments to remote calls.
//!
//! Builders are pure: they never touch the network. Every numeric bound is
//! applied again here so a call is always in range whatever produced it.

use crate::catalog::{DEPTH, ITERATIONS, LIST_LIMIT, LIST_OFFSET, MAX_ROWS, MIN_POWER, ToolKind};
use crate::schema::{ValidatedArgs, string_list};

const DEFAULT_REGION: i64 = 213;
const DEFAULT_BASE: i64 = 3;

/// A task submission: the remote mnemonic plus its ordered form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTask {
    pub mnemonic: &'static str,
    pub fields: Vec<(&'static str, String)>,
    /// Estimate the cost only; the remote side queues nothing.
    pub dry_run: bool,
}

impl RemoteTask {
    fn new(mnemonic: &'static str, dry_run: bool) -> Self {
        Self {
            mnemonic,
            fields: Vec::new(),
            dry_run,
        }
    }

    fn push(&mut self, name: &'static str, value: impl ToString) -> &mut Self {
        self.fields.push((name, value.to_string()));
        self
    }

    fn push_opt(&mut self, name: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.push(name, value);
        }
        self
    }

    fn push_flag(&mut self, name: &'static str, on: bool) -> &mut Self {
        if on {
            self.push(name, 1);
        }
        self
    }

    /// The value of a field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// What a tool invocation asks of the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    AccountInfo,
    ListTasks { limit: i64, offset: i64 },
    GetTask { tid: i64, mode: String },
    FetchTable { tid: i64, max_rows: usize },
    Submit(RemoteTask),
}

/// Build the remote call for a validated invocation.
pub fn build(kind: ToolKind, args: &ValidatedArgs) -> RemoteCall {
    let dry_run = args.flag("just_ask");
    match kind {
        ToolKind::AccountInfo => RemoteCall::AccountInfo,
        ToolKind::ListTasks => RemoteCall::ListTasks {
            limit: LIST_LIMIT.clamp(args.int("limit").unwrap_or(10)),
            offset: LIST_OFFSET.clamp(args.int("offset").unwrap_or(0)),
        },
        ToolKind::GetTask => RemoteCall::GetTask {
            tid: args.int("tid").unwrap_or_default(),
            mode: args.str("mode").unwrap_or("info").to_string(),
        },
        ToolKind::DownloadResult => RemoteCall::FetchTable {
            tid: args.int("tid").unwrap_or_default(),
            max_rows: MAX_ROWS.clamp(args.int("max_rows").unwrap_or(100)) as usize,
        },
        ToolKind::Cluster => RemoteCall::Submit(cluster(args, dry_run)),
        ToolKind::TextAnalyzer => RemoteCall::Submit(text_analyzer(args, dry_run)),
        ToolKind::LsiAnalyzer => {
            let mut task = RemoteTask::new("aqua", dry_run);
            task.push("key", args.str("keyword").unwrap_or_default())
                .push("data", args.str("text").unwrap_or_default())
                .push("search_engine", search_engine(args))
                .push("lang", lang(args));
            RemoteCall::Submit(task)
        }
        ToolKind::LsiGenerator => {
            let mut task = RemoteTask::new("aqua_gen", dry_run);
            task.push("data", lines(args, "queries"))
                .push("search_engine", search_engine(args))
                .push("lang", lang(args));
            RemoteCall::Submit(task)
        }
        ToolKind::FrequencyCollector => RemoteCall::Submit(frequency(args, dry_run)),
        ToolKind::SuggestionParser => {
            let mut task = RemoteTask::new("sug_par", dry_run);
            task.push("data", lines(args, "queries"))
                .push("ya_lr", region(args))
                .push("lang", lang(args))
                .push("iter", ITERATIONS.clamp(args.int("iterations").unwrap_or(1)))
                .push_flag("f_rus", args.flag("add_russian_letters"));
            RemoteCall::Submit(task)
        }
        ToolKind::ThematicClassifier => {
            let mut task = RemoteTask::new("temakl", dry_run);
            task.push("data", lines(args, "queries"))
                .push_flag("f_gall", args.flag("show_all_categories"));
            RemoteCall::Submit(task)
        }
        ToolKind::MarkerDistributor => RemoteCall::Submit(markers(args, dry_run)),
        ToolKind::SemanticsExpander => {
            let mut task = RemoteTask::new("grp_deep", dry_run);
            task.push("data", lines(args, "queries"))
                .push("base", args.int("base").unwrap_or(DEFAULT_BASE))
                .push("deep", DEPTH.clamp(args.int("depth").unwrap_or(1)))
                .push("min_pwr", MIN_POWER.clamp(args.int("min_power").unwrap_or(3)));
            RemoteCall::Submit(task)
        }
        ToolKind::RegexSearch => {
            let mut task = RemoteTask::new("rexp", dry_run);
            task.push("base", args.int("base").unwrap_or(DEFAULT_BASE))
                .push("rexpa", args.str("pattern").unwrap_or_default())
                .push_opt("rexpd", args.str("exclude_pattern"));
            RemoteCall::Submit(task)
        }
    }
}

fn cluster(args: &ValidatedArgs, dry_run: bool) -> RemoteTask {
    let mut task = RemoteTask::new("grp_onl", dry_run);
    let engine = search_engine(args);
    task.push("data", lines(args, "queries"))
        .push("search_engine", engine)
        .push("lang", lang(args));

    match args.str("google_lr") {
        Some(google_lr) if engine == "google" => task.push("google_lr", google_lr),
        _ => task.push("ya_lr", region(args)),
    };

    task.push_flag("s_std", args.flag("collect_frequency"))
        .push_opt("label", args.str("label"))
        .push_opt("domain", args.str("domain"));
    task
}

/// One `url<TAB>query` line per (page, query) pair.
fn text_analyzer(args: &ValidatedArgs, dry_run: bool) -> RemoteTask {
    let data = args
        .objects("pages")
        .iter()
        .flat_map(|page| {
            let url = page["url"].as_str().unwrap_or_default();
            string_list(page.get("queries"))
                .into_iter()
                .map(move |query| format!("{url}\t{query}"))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut task = RemoteTask::new("txt_anlz", dry_run);
    task.push("data", data)
        .push("search_engine", search_engine(args))
        .push("ya_lr", region(args));
    task
}

fn frequency(args: &ValidatedArgs, dry_run: bool) -> RemoteTask {
    let mut task = RemoteTask::new("wsfreq", dry_run);
    task.push("data", lines(args, "queries"))
        .push("device", args.str("device").unwrap_or("all"));
    if let Some(region) = args.int("region").filter(|r| *r != 0) {
        task.push("ya_lrws", region);
    }
    task.push_opt("label", args.str("label"))
        .push_flag("s_std", args.get("s_std").is_none() || args.flag("s_std"))
        .push_flag("s_q", args.flag("s_q"));
    task
}

/// One line per page: the URL, then its marker queries, tab-separated.
fn markers(args: &ValidatedArgs, dry_run: bool) -> RemoteTask {
    let data = args
        .objects("pages")
        .iter()
        .map(|page| {
            let mut cells = vec![page["url"].as_str().unwrap_or_default().to_string()];
            cells.extend(string_list(page.get("queries")));
            cells.join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut task = RemoteTask::new("mark_onl", dry_run);
    task.push("data", data)
        .push("data_base", lines(args, "base_queries"))
        .push("ya_lr", region(args))
        .push("mode", args.str("mode").unwrap_or("hard"))
        .push("min_pwr", MIN_POWER.clamp(args.int("min_power").unwrap_or(3)));
    task
}

fn lines(args: &ValidatedArgs, name: &str) -> String {
    args.strings(name).join("\n")
}

fn search_engine(args: &ValidatedArgs) -> &str {
    args.str("search_engine").unwrap_or("yandex")
}

fn lang(args: &ValidatedArgs) -> &str {
    args.str("lang").unwrap_or("ru")
}

fn region(args: &ValidatedArgs) -> i64 {
    args.int("region").unwrap_or(DEFAULT_REGION)
}
