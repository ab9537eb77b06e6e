//! The operations behind each CLI subcommand.
//!
//! Everything here takes explicit paths and a [`JsonItemStore`]; resolving
//! defaults and printing is left to `main.rs`, which keeps these functions
//! testable against a temp directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::config;
use crate::item::Item;
use crate::recommend::{
    recommend_from_store, KeywordFromSeenRecommender, LatestRecommender, Recommender,
};
use crate::render::render_multi_recommendation_markdown;
use crate::source::{self, DataSource};
use crate::store::{diff_new_items, JsonItemStore};
use crate::yt_dlp;

// ---------------------------------------------------------------------------
// fetch
// ---------------------------------------------------------------------------

/// Create an empty config file at `path` if none exists.
///
/// Returns `true` when a file was created.
pub fn ensure_config_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, "").with_context(|| format!("failed to create {}", path.display()))?;
    tracing::info!(path = %path.display(), "created empty config");
    Ok(true)
}

/// Build a fetcher for every configured source that has one.
pub fn sources_from_config(path: &Path) -> Result<Vec<Box<dyn DataSource>>> {
    let configs = config::load_sources(path)?;

    let mut sources = Vec::with_capacity(configs.len());
    for (index, config) in configs.iter().enumerate() {
        match source::from_config(config).with_context(|| format!("source at index {index}"))? {
            Some(source) => sources.push(source),
            None => tracing::warn!(
                kind = %config.kind,
                url = %config.url,
                "no fetcher for this source type yet; skipping"
            ),
        }
    }
    Ok(sources)
}

/// Fetch every source, persist entries not already stored, and return them.
///
/// A source that fails to fetch is logged and skipped, as is any entry that
/// does not convert into a valid item.  Stored items are never rewritten, so
/// their `seen` flags survive a refetch.
pub fn fetch_new_items(sources: &[Box<dyn DataSource>], store: &JsonItemStore) -> Result<Vec<Item>> {
    let mut incoming = Vec::new();

    for source in sources {
        let entries = match source.fetch() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(source = source.name(), "fetch failed: {e:#}");
                continue;
            }
        };
        tracing::info!(source = source.name(), count = entries.len(), "fetched entries");

        for entry in entries {
            let id = entry.source_item_id.clone();
            match Item::from_raw(entry) {
                Ok(item) => incoming.push(item),
                Err(e) => tracing::warn!(source = source.name(), id = %id, "skipping entry: {e}"),
            }
        }
    }

    let existing = store.load_all()?;
    let new_items = diff_new_items(&existing, &incoming);
    if !new_items.is_empty() {
        store.save_many(&new_items)?;
    }
    tracing::info!(new = new_items.len(), "fetch complete");
    Ok(new_items)
}

/// Items grouped by `source_url`, in the order each source first appears.
///
/// Serializes as a JSON object `{url: [item, ...]}` with keys in that order.
#[derive(Debug, Default)]
pub struct SourceGroups<'a> {
    groups: Vec<(&'a str, Vec<&'a Item>)>,
}

impl<'a> SourceGroups<'a> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, source_url: &str) -> Option<&[&'a Item]> {
        self.groups
            .iter()
            .find(|(url, _)| *url == source_url)
            .map(|(_, items)| items.as_slice())
    }

    pub fn source_urls(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.groups.iter().map(|(url, _)| *url)
    }
}

impl Serialize for SourceGroups<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.groups.iter().map(|(url, items)| (url, items)))
    }
}

/// Group items by `source_url`, keeping each group's relative order.
pub fn group_by_source(items: &[Item]) -> SourceGroups<'_> {
    let mut groups: Vec<(&str, Vec<&Item>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(url, _)| *url == item.source_url()) {
            Some((_, members)) => members.push(item),
            None => groups.push((item.source_url(), vec![item])),
        }
    }
    SourceGroups { groups }
}

// ---------------------------------------------------------------------------
// recommend
// ---------------------------------------------------------------------------

/// Run every strategy against the store and render the combined report.
pub fn recommend_report(store: &JsonItemStore, limit: usize) -> Result<String> {
    let strategies: [(&str, &dyn Recommender); 2] = [
        ("Latest", &LatestRecommender),
        ("Keyword from Seen", &KeywordFromSeenRecommender),
    ];

    let mut sections = Vec::with_capacity(strategies.len());
    for (heading, recommender) in strategies {
        let result = recommend_from_store(store, recommender, limit, BTreeMap::new())?;
        sections.push((heading, result));
    }
    Ok(render_multi_recommendation_markdown(&sections))
}

/// Render the report and write it to `output`, replacing any existing file.
pub fn write_recommend_report(store: &JsonItemStore, limit: usize, output: &Path) -> Result<()> {
    let markdown = recommend_report(store, limit)?;
    fs::write(output, markdown).with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(path = %output.display(), "wrote report");
    Ok(())
}

// ---------------------------------------------------------------------------
// modify
// ---------------------------------------------------------------------------

/// Set the `seen` flag of one stored item and return the updated item.
///
/// An unknown id is an error and leaves the store untouched.
pub fn set_seen(store: &JsonItemStore, item_id: &str, seen: bool) -> Result<Item> {
    let items = store.load_all()?;
    let target = items
        .iter()
        .find(|item| item.item_id() == item_id)
        .ok_or_else(|| anyhow!("Item with ID '{item_id}' not found"))?;

    let updated = target.with_seen(seen);
    store.save_many([&updated])?;
    Ok(updated)
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Items read from the input file.
    pub read: usize,
    /// Items that were not yet stored and have been added.
    pub added: usize,
}

/// Add the items of a JSON file to the store.
///
/// The file holds either `{"items": [...]}` or a single item object.  Every
/// item is validated before anything is written; ids already stored are
/// left alone.
pub fn import_items(store: &JsonItemStore, input: &Path) -> Result<ImportSummary> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let document: Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid JSON in {}", input.display()))?;

    let items = parse_import_document(document)?;
    let existing = store.load_all()?;
    let new_items = diff_new_items(&existing, &items);
    if !new_items.is_empty() {
        store.save_many(&new_items)?;
    }

    tracing::info!(read = items.len(), added = new_items.len(), "import complete");
    Ok(ImportSummary {
        read: items.len(),
        added: new_items.len(),
    })
}

/// Add the videos of a yt-dlp `videos.jsonl` dump to the store.
///
/// Malformed lines are skipped (see [`yt_dlp::parse_videos_jsonl`]); `read`
/// counts the lines that converted.  Ids already stored are left alone.
pub fn import_yt_dlp(store: &JsonItemStore, input: &Path) -> Result<ImportSummary> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let items = yt_dlp::parse_videos_jsonl(&text);
    let existing = store.load_all()?;
    let new_items = diff_new_items(&existing, &items);
    if !new_items.is_empty() {
        store.save_many(&new_items)?;
    }

    tracing::info!(read = items.len(), added = new_items.len(), "yt-dlp import complete");
    Ok(ImportSummary {
        read: items.len(),
        added: new_items.len(),
    })
}

fn parse_import_document(document: Value) -> Result<Vec<Item>> {
    let entries = match document {
        Value::Object(mut map) if map.contains_key("items") => match map.remove("items") {
            Some(Value::Array(entries)) => entries,
            _ => bail!("'items' must be a list"),
        },
        object @ Value::Object(_) => vec![object],
        _ => bail!("expected an object with an 'items' list, or a single item object"),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<Item>(entry).with_context(|| format!("invalid item at index {index}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::RawEntry;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn make_item(id: &str, title: &str, hour: u32, seen: bool) -> Item {
        let published = Utc.with_ymd_and_hms(2023, 12, 20, hour, 0, 0).unwrap();
        Item::new(
            id,
            "youtube",
            "https://youtube.com/channel/UC1",
            title,
            format!("https://youtube.com/watch?v={id}"),
            published,
            seen,
        )
        .unwrap()
    }

    fn find<'a>(items: &'a [Item], id: &str) -> &'a Item {
        items.iter().find(|item| item.item_id() == id).unwrap()
    }

    fn temp_store() -> (TempDir, JsonItemStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonItemStore::new(dir.path().join(".tech-tracker").join("items.json"));
        (dir, store)
    }

    /// A source that returns canned entries, or fails.
    struct FakeSource {
        url: String,
        entries: Option<Vec<RawEntry>>,
    }

    impl FakeSource {
        fn ok(url: &str, ids: &[&str]) -> Box<dyn DataSource> {
            let entries = ids
                .iter()
                .map(|id| RawEntry {
                    source_item_id: id.to_string(),
                    source_type: "youtube".into(),
                    source_url: url.into(),
                    title: format!("Video {id}"),
                    link: format!("https://www.youtube.com/watch?v={id}"),
                    published: "2023-12-20T09:00:00Z".into(),
                })
                .collect();
            Box::new(Self {
                url: url.into(),
                entries: Some(entries),
            })
        }

        fn failing(url: &str) -> Box<dyn DataSource> {
            Box::new(Self {
                url: url.into(),
                entries: None,
            })
        }
    }

    impl DataSource for FakeSource {
        fn name(&self) -> &str {
            &self.url
        }

        fn url(&self) -> &str {
            &self.url
        }

        fn fetch(&self) -> Result<Vec<RawEntry>> {
            self.entries.clone().ok_or_else(|| anyhow!("network down"))
        }
    }

    // -- fetch ---------------------------------------------------------------

    #[test]
    fn fetch_persists_and_returns_only_new_items() {
        let (_dir, store) = temp_store();
        let sources = vec![FakeSource::ok("https://a", &["v1", "v2"])];

        let first = fetch_new_items(&sources, &store).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(store.load_all().unwrap().len(), 2);

        let sources = vec![FakeSource::ok("https://a", &["v2", "v3"])];
        let second = fetch_new_items(&sources, &store).unwrap();
        let ids: Vec<&str> = second.iter().map(Item::item_id).collect();
        assert_eq!(ids, ["youtube:v3"]);
        assert_eq!(store.load_all().unwrap().len(), 3);
    }

    #[test]
    fn refetch_keeps_seen_flags() {
        let (_dir, store) = temp_store();
        let sources = vec![FakeSource::ok("https://a", &["v1"])];
        fetch_new_items(&sources, &store).unwrap();
        set_seen(&store, "youtube:v1", true).unwrap();

        assert!(fetch_new_items(&sources, &store).unwrap().is_empty());
        assert!(store.load_all().unwrap()[0].seen());
    }

    #[test]
    fn failing_source_does_not_stop_others() {
        let (_dir, store) = temp_store();
        let sources = vec![FakeSource::failing("https://down"), FakeSource::ok("https://b", &["v9"])];

        let new_items = fetch_new_items(&sources, &store).unwrap();
        assert_eq!(new_items.len(), 1);
        assert_eq!(new_items[0].source_url(), "https://b");
    }

    #[test]
    fn fetch_with_nothing_new_does_not_create_store() {
        let (_dir, store) = temp_store();
        assert!(fetch_new_items(&[], &store).unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn groups_by_source_url() {
        let items = vec![
            make_item("a", "A", 10, false),
            Item::new("b", "rss", "https://feed", "B", "l", Utc::now(), false).unwrap(),
            make_item("c", "C", 11, false),
        ];
        let groups = group_by_source(&items);

        assert_eq!(groups.len(), 2);
        let channel: Vec<&str> = groups
            .get("https://youtube.com/channel/UC1")
            .unwrap()
            .iter()
            .map(|i| i.item_id())
            .collect();
        assert_eq!(channel, ["a", "c"]);
        assert_eq!(groups.get("https://feed").unwrap().len(), 1);
    }

    #[test]
    fn groups_keep_first_seen_source_order() {
        let items = vec![
            Item::new("z1", "rss", "https://z.example", "Z", "l", Utc::now(), false).unwrap(),
            Item::new("a1", "rss", "https://a.example", "A", "l", Utc::now(), false).unwrap(),
            Item::new("z2", "rss", "https://z.example", "Z2", "l", Utc::now(), false).unwrap(),
        ];
        let groups = group_by_source(&items);

        let urls: Vec<&str> = groups.source_urls().collect();
        assert_eq!(urls, ["https://z.example", "https://a.example"]);

        let json = serde_json::to_string(&groups).unwrap();
        assert!(json.find("https://z.example") < json.find("https://a.example"));
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["https://z.example"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn ensure_config_file_creates_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".config").join("tech-tracker").join("config.toml");

        assert!(ensure_config_file(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert!(!ensure_config_file(&path).unwrap());
        assert!(sources_from_config(&path).unwrap().is_empty());
    }

    #[test]
    fn sources_from_config_skips_kinds_without_fetcher() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[[sources]]
type = "youtube"
url = "https://www.youtube.com/channel/UC123"

[[sources]]
type = "bilibili"
url = "https://space.bilibili.com/1"

[[sources]]
type = "rss"
url = "https://example.com/rss.xml"
"#,
        )
        .unwrap();

        let sources = sources_from_config(&path).unwrap();
        let urls: Vec<&str> = sources.iter().map(|s| s.url()).collect();
        assert_eq!(urls, ["https://www.youtube.com/channel/UC123", "https://example.com/rss.xml"]);
    }

    #[test]
    fn sources_from_config_propagates_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(sources_from_config(&dir.path().join("missing.toml")).is_err());
    }

    // -- recommend -----------------------------------------------------------

    #[test]
    fn report_on_empty_store_has_both_sections_and_no_items() {
        let (dir, store) = temp_store();
        let output = dir.path().join("recommend.md");

        write_recommend_report(&store, 20, &output).unwrap();
        let markdown = fs::read_to_string(&output).unwrap();

        assert!(markdown.starts_with("# Recommended Items\n"));
        assert!(markdown.find("## Latest") < markdown.find("## Keyword from Seen"));
        assert!(markdown.contains("_Strategy_: latest\n_Limit_: 20\n"));
        assert!(markdown.contains("_Strategy_: keyword_from_seen\n"));
        assert!(!markdown.lines().any(|l| l.starts_with("## 1.")));
    }

    #[test]
    fn report_overwrites_and_lists_items_in_both_sections() {
        let (dir, store) = temp_store();
        store
            .save_many(&[
                make_item("seen:python", "Python Programming Tutorial", 10, true),
                make_item("unseen:python", "Advanced Python Guide", 12, false),
                make_item("unseen:javascript", "JavaScript Basics", 11, false),
            ])
            .unwrap();
        let output = dir.path().join("recommend.md");
        fs::write(&output, "Existing content that should be overwritten").unwrap();

        write_recommend_report(&store, 20, &output).unwrap();
        let markdown = fs::read_to_string(&output).unwrap();
        assert!(!markdown.contains("Existing content"));

        let split = markdown.find("## Keyword from Seen").unwrap();
        let (latest, keyword) = markdown.split_at(split);
        assert!(latest.contains("## 1. Advanced Python Guide\n- ID: `unseen:python`"));
        assert!(keyword.contains("## 1. Advanced Python Guide\n- ID: `unseen:python`"));
        assert!(!latest.contains("`seen:python`"));
        assert!(keyword.contains("_Top keywords_: programming(1), python(1), tutorial(1)"));
    }

    #[test]
    fn report_fails_on_corrupt_store() {
        let (dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ nope").unwrap();
        assert!(write_recommend_report(&store, 20, &dir.path().join("r.md")).is_err());
    }

    // -- modify --------------------------------------------------------------

    #[test]
    fn set_seen_toggles_only_the_target() {
        let (_dir, store) = temp_store();
        store
            .save_many(&[make_item("youtube:a", "A", 10, false), make_item("youtube:b", "B", 11, false)])
            .unwrap();

        let updated = set_seen(&store, "youtube:a", true).unwrap();
        assert!(updated.seen());

        let items = store.load_all().unwrap();
        assert!(find(&items, "youtube:a").seen());
        assert!(!find(&items, "youtube:b").seen());

        set_seen(&store, "youtube:a", false).unwrap();
        assert!(!store.load_all().unwrap().iter().any(Item::seen));
    }

    #[test]
    fn set_seen_on_unknown_id_is_an_error_and_creates_nothing() {
        let (_dir, store) = temp_store();
        let err = set_seen(&store, "youtube:missing", true).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(!store.path().exists());
    }

    // -- import --------------------------------------------------------------

    fn write_input(dir: &TempDir, value: &Value) -> std::path::PathBuf {
        let path = dir.path().join("input.json");
        fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn item_json(id: &str) -> Value {
        serde_json::json!({
            "item_id": id,
            "source_type": "test",
            "source_url": "https://example.com",
            "title": format!("Title {id}"),
            "link": format!("https://example.com/{id}"),
            "published": "2023-12-20T10:00:00Z",
        })
    }

    #[test]
    fn import_adds_items_from_list() {
        let (dir, store) = temp_store();
        let input = write_input(&dir, &serde_json::json!({"items": [item_json("test:item1"), item_json("test:item2")]}));

        let summary = import_items(&store, &input).unwrap();
        assert_eq!(summary, ImportSummary { read: 2, added: 2 });
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn import_leaves_existing_items_alone() {
        let (dir, store) = temp_store();
        let existing = Item::new(
            "test:existing",
            "test",
            "https://example.com",
            "Original",
            "https://example.com/existing",
            Utc.with_ymd_and_hms(2023, 12, 20, 9, 0, 0).unwrap(),
            true,
        )
        .unwrap();
        store.save_many([&existing]).unwrap();

        let input = write_input(&dir, &serde_json::json!({"items": [item_json("test:existing"), item_json("test:new")]}));
        let summary = import_items(&store, &input).unwrap();
        assert_eq!(summary.added, 1);

        let items = store.load_all().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(find(&items, "test:existing").title(), "Original");
        assert!(find(&items, "test:existing").seen());
    }

    #[test]
    fn import_accepts_single_object() {
        let (dir, store) = temp_store();
        let input = write_input(&dir, &item_json("test:single"));

        import_items(&store, &input).unwrap();
        assert_eq!(store.load_all().unwrap()[0].item_id(), "test:single");
    }

    #[test]
    fn import_empty_list_is_fine() {
        let (dir, store) = temp_store();
        let input = write_input(&dir, &serde_json::json!({"items": []}));
        assert_eq!(import_items(&store, &input).unwrap(), ImportSummary { read: 0, added: 0 });
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn import_rejects_bad_input_without_writing() {
        let (dir, store) = temp_store();

        let path = dir.path().join("bad.json");
        fs::write(&path, "{ invalid json").unwrap();
        assert!(import_items(&store, &path).is_err());

        assert!(import_items(&store, &write_input(&dir, &Value::from("invalid structure"))).is_err());

        let mut broken = item_json("test:broken");
        broken["published"] = Value::from("2023-12-20T10:00:00");
        let input = write_input(&dir, &serde_json::json!({"items": [item_json("test:ok"), broken]}));
        assert!(import_items(&store, &input).is_err());

        assert!(import_items(&store, &dir.path().join("nonexistent.json")).is_err());
        assert!(!store.path().exists());
    }

    fn yt_dlp_line(id: &str, timestamp: i64) -> String {
        serde_json::json!({
            "id": id,
            "channel_url": "https://www.youtube.com/channel/UC1",
            "title": format!("Video {id}"),
            "original_url": format!("https://www.youtube.com/watch?v={id}"),
            "timestamp": timestamp,
        })
        .to_string()
    }

    #[test]
    fn yt_dlp_import_skips_bad_lines_and_known_ids() {
        let (dir, store) = temp_store();
        store.save_many([&make_item("youtube:old", "Kept title", 9, true)]).unwrap();

        let path = dir.path().join("videos.jsonl");
        let lines = [
            yt_dlp_line("old", 1_703_066_400),
            "{ broken".to_string(),
            yt_dlp_line("new", 1_703_070_000),
        ];
        fs::write(&path, lines.join("\n")).unwrap();

        let summary = import_yt_dlp(&store, &path).unwrap();
        assert_eq!(summary, ImportSummary { read: 2, added: 1 });

        let items = store.load_all().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(find(&items, "youtube:old").title(), "Kept title");
        assert!(find(&items, "youtube:old").seen());
        let new = find(&items, "youtube:new");
        assert!(!new.seen());
        assert_eq!(new.published(), Utc.with_ymd_and_hms(2023, 12, 20, 11, 0, 0).unwrap());
    }

    #[test]
    fn yt_dlp_import_of_missing_file_is_an_error() {
        let (dir, store) = temp_store();
        assert!(import_yt_dlp(&store, &dir.path().join("videos.jsonl")).is_err());
        assert!(!store.path().exists());
    }
}
