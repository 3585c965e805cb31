//! Score Tracker セーブ/ロードとインポート/エクスポート。
//!
//! ## 保存形式
//!
//! - `scoreTrackerData`: スコア・ボタン・購入済みID・進捗をまとめた主ドキュメント。
//! - `storeItems`: ストアのカタログ。主ドキュメントとは別キーで保存する。
//!
//! どちらも変更のたびに丸ごと上書きする (last-write-wins)。
//!
//! ## バージョニング方針
//!
//! - `FORMAT_VERSION`: エクスポートに書き込む形式バージョン ("major.minor")。
//!   フィールド追加のみなら minor を上げる。未知のフィールドは読み込み時に無視する。
//! - 読み込み時に major が新しい場合も読み込みは続行し、レポートで知らせるだけにする。
//!
//! 不足フィールドはデフォルト値で補完する。インポートの検証はすべて状態変更の前に行い、
//! 失敗したインポートは現在の状態を一切変更しない。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::buttons::{magnitude_from_f64, ButtonRegistry, Polarity, Position, ScoreAction};
use super::progress::{ProgressEngine, MAX_LEVEL};
use super::state::Model;
use super::store::{ItemCatalog, StoreItem};
use crate::error::{Result, TrackerError};

/// エクスポートに書き込む形式バージョン。
pub const FORMAT_VERSION: &str = "2.0";

/// 読み込みを許す XP の上限。これを超える値は手書きか破損とみなす。
pub const MAX_STORED_XP: u64 = 1_000_000_000_000_000;

/// 主ドキュメントの localStorage キー。
#[cfg(target_arch = "wasm32")]
const STORAGE_KEY: &str = "scoreTrackerData";

/// カタログの localStorage キー。
#[cfg(target_arch = "wasm32")]
const CATALOG_KEY: &str = "storeItems";

/// 保存・インポート・エクスポート共通のドキュメント。
/// localStorage 用には `store_items` / `export_date` / `version` を空にして使う。
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerDocument {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub buttons: Vec<ButtonRecord>,
    #[serde(default)]
    pub purchased_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_items: Option<Vec<StoreItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// 進捗のシリアライズ形式。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    #[serde(rename = "currentXP")]
    pub current_xp: u64,
    pub current_level: u32,
    pub current_streak: u32,
    #[serde(with = "activity_date")]
    pub last_activity_date: Option<chrono::NaiveDate>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        ProgressRecord::from(&ProgressEngine::new())
    }
}

impl From<&ProgressEngine> for ProgressRecord {
    fn from(p: &ProgressEngine) -> Self {
        ProgressRecord {
            current_xp: p.current_xp,
            current_level: p.current_level,
            current_streak: p.current_streak,
            last_activity_date: p.last_activity_date,
        }
    }
}

/// 日付は "YYYY-MM-DD" で書き出す。旧形式 ("Mon Mar 04 2024") も読める。
/// 解釈できない値は「記録なし」として扱う。
mod activity_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const ISO: &str = "%Y-%m-%d";
    const LEGACY: &str = "%a %b %d %Y";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(ISO).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.and_then(|s| parse(&s)))
    }

    pub fn parse(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, ISO)
            .or_else(|_| NaiveDate::parse_from_str(s, LEGACY))
            .ok()
    }
}

/// ボタン1件。インポートでは欠けたフィールドを許容し、採用可否は `accept` で判定する。
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct ButtonRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
}

impl ButtonRecord {
    /// type・name・value が揃っていれば (極性, ラベル, 符号付きの値) を返す。
    pub fn accept(&self) -> Option<(Polarity, String, i64)> {
        let polarity = Polarity::from_marker(self.kind.as_deref()?)?;
        let name = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        let raw = match self.value.as_ref()? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        let magnitude = magnitude_from_f64(raw).ok()?;
        Some((polarity, name.to_string(), polarity.normalize(magnitude)))
    }

    fn position(&self) -> Option<Position> {
        Some(Position::new(self.left?, self.top?))
    }
}

impl From<&ScoreAction> for ButtonRecord {
    fn from(a: &ScoreAction) -> Self {
        ButtonRecord {
            id: Some(a.id.clone()),
            kind: Some(a.polarity.marker().to_string()),
            name: Some(a.label.clone()),
            value: Some(Value::from(a.magnitude)),
            left: Some(a.position.x),
            top: Some(a.position.y),
        }
    }
}

/// ボタンの追加インポート結果。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub imported: usize,
    pub skipped: usize,
}

/// フルバックアップ読み込み後のサマリー (表示用)。
#[derive(Clone, Debug, PartialEq)]
pub struct BackupReport {
    pub score: i64,
    pub level: u32,
    pub streak: u32,
    pub buttons: usize,
    pub store_items: usize,
    /// 自分より新しい major バージョンで書かれていた。
    pub newer_format: bool,
}

// ── スナップショット / 復元 ───────────────────────────────────────

/// 現在の状態からドキュメントを組み立てる (読み取りのみ)。
pub fn snapshot(model: &Model, export_date: Option<String>) -> TrackerDocument {
    TrackerDocument {
        score: model.progress.score,
        buttons: model.buttons.list().iter().map(ButtonRecord::from).collect(),
        purchased_items: model.catalog.purchased_ids().iter().cloned().collect(),
        store_items: Some(model.catalog.items().to_vec()),
        progress: Some(ProgressRecord::from(&model.progress)),
        export_date,
        version: Some(FORMAT_VERSION.to_string()),
    }
}

/// localStorage 用の主ドキュメント (カタログ・日付・バージョンなし)。
#[cfg(any(target_arch = "wasm32", test))]
fn primary_document(model: &Model) -> TrackerDocument {
    TrackerDocument {
        store_items: None,
        version: None,
        ..snapshot(model, None)
    }
}

/// ドキュメントを各コンポーネントへ配る。
/// 欠けたフィールドは初期値になる。`storeItems` が無ければカタログは変更しない。
pub fn restore(model: &mut Model, doc: TrackerDocument) {
    model.progress.score = doc.score;
    model.catalog.set_purchased(doc.purchased_items);
    apply_progress(&mut model.progress, &doc.progress.unwrap_or_default());
    model.buttons.clear();
    recreate_buttons(&mut model.buttons, &doc.buttons);
    if let Some(items) = doc.store_items {
        replace_store_items(&mut model.catalog, items);
    }
}

/// 災害復旧用の全置換。ボタンは必ず消してから作り直す。
/// `progress` / `storeItems` はドキュメントにある場合のみ置き換え、無ければ現状を維持する。
pub fn load_full_backup(model: &mut Model, doc: TrackerDocument) -> BackupReport {
    let newer_format = is_newer_format(doc.version.as_deref());

    model.buttons.clear();
    model.progress.score = doc.score;
    model.catalog.set_purchased(doc.purchased_items);
    if let Some(items) = doc.store_items {
        replace_store_items(&mut model.catalog, items);
    }
    if let Some(progress) = &doc.progress {
        apply_progress(&mut model.progress, progress);
    }
    recreate_buttons(&mut model.buttons, &doc.buttons);

    BackupReport {
        score: model.progress.score,
        level: model.progress.current_level,
        streak: model.progress.current_streak,
        buttons: model.buttons.len(),
        store_items: model.catalog.items().len(),
        newer_format,
    }
}

/// 既存のボタンを残したまま追加する。条件を満たさないエントリはスキップ数に数える。
pub fn merge_buttons(buttons: &mut ButtonRegistry, records: &[ButtonRecord]) -> MergeReport {
    let mut report = MergeReport::default();
    for record in records {
        match record.accept() {
            Some((polarity, name, magnitude)) => {
                buttons.create(polarity, &name, magnitude, None, None);
                report.imported += 1;
            }
            None => report.skipped += 1,
        }
    }
    report
}

/// カタログを丸ごと置き換える (マージしない)。
/// 整合性チェックとして価格0の項目と重複IDの2件目以降を落とす。購入済みIDは保持する。
/// 残った件数を返す。
pub fn replace_store_items(catalog: &mut ItemCatalog, items: Vec<StoreItem>) -> usize {
    let mut kept: Vec<StoreItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.price == 0 || kept.iter().any(|k| k.id == item.id) {
            continue;
        }
        kept.push(item);
    }
    let count = kept.len();
    catalog.set_items(kept);
    count
}

fn apply_progress(engine: &mut ProgressEngine, record: &ProgressRecord) {
    engine.current_xp = record.current_xp;
    engine.current_level = record.current_level.max(1);
    engine.current_streak = record.current_streak;
    engine.last_activity_date = record.last_activity_date;
    // 手書きのバックアップで閾値を超えていてもレベルに畳み込む
    engine.settle_xp();
}

fn recreate_buttons(buttons: &mut ButtonRegistry, records: &[ButtonRecord]) {
    for record in records {
        if let Some((polarity, name, magnitude)) = record.accept() {
            buttons.create(polarity, &name, magnitude, record.id.clone(), record.position());
        }
    }
}

fn major_version(v: &str) -> Option<u32> {
    v.split('.').next()?.trim().parse().ok()
}

fn is_newer_format(version: Option<&str>) -> bool {
    match (version.and_then(major_version), major_version(FORMAT_VERSION)) {
        (Some(theirs), Some(ours)) => theirs > ours,
        _ => false,
    }
}

// ── パース (状態は変更しない) ─────────────────────────────────────

fn parse_object(json: &str) -> Result<serde_json::Map<String, Value>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::MalformedDocument("please paste JSON first".into()));
    }
    match serde_json::from_str::<Value>(trimmed)? {
        Value::Object(map) => Ok(map),
        _ => Err(TrackerError::MalformedDocument(
            "top level must be a JSON object".into(),
        )),
    }
}

fn required_array(map: &mut serde_json::Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match map.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(TrackerError::MalformedDocument(format!(
            "JSON should have a \"{key}\" array"
        ))),
    }
}

/// フルバックアップ / 保存データのパース。
pub fn parse_document(json: &str) -> Result<TrackerDocument> {
    let map = parse_object(json)?;
    let doc: TrackerDocument = serde_json::from_value(Value::Object(map))?;
    if let Some(items) = &doc.store_items {
        check_store_items(items)?;
    }
    if let Some(progress) = &doc.progress {
        check_progress(progress)?;
    }
    Ok(doc)
}

fn check_progress(progress: &ProgressRecord) -> Result<()> {
    if progress.current_level > MAX_LEVEL {
        return Err(TrackerError::MalformedDocument(format!(
            "currentLevel {} is out of range (max {MAX_LEVEL})",
            progress.current_level
        )));
    }
    if progress.current_xp > MAX_STORED_XP {
        return Err(TrackerError::MalformedDocument(format!(
            "currentXP {} is out of range",
            progress.current_xp
        )));
    }
    Ok(())
}

/// `{ "buttons": [...] }` のパース。要素単位の不備はここでは落とさず、マージ時にスキップする。
pub fn parse_buttons_import(json: &str) -> Result<Vec<ButtonRecord>> {
    let mut map = parse_object(json)?;
    let records = required_array(&mut map, "buttons")?
        .into_iter()
        .map(|v| serde_json::from_value::<ButtonRecord>(v).unwrap_or_default())
        .collect();
    Ok(records)
}

/// `{ "storeItems": [...] }` のパース。1件でも不正なら全体を拒否する。
pub fn parse_store_import(json: &str) -> Result<Vec<StoreItem>> {
    let mut map = parse_object(json)?;
    let raw = required_array(&mut map, "storeItems")?;
    let items: Vec<StoreItem> = serde_json::from_value(Value::Array(raw))?;
    check_store_items(&items)?;
    Ok(items)
}

fn check_store_items(items: &[StoreItem]) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        if item.id.trim().is_empty() || item.name.trim().is_empty() {
            return Err(TrackerError::MalformedDocument(format!(
                "store item #{} needs an id and a name",
                i + 1
            )));
        }
        if item.price == 0 {
            return Err(TrackerError::MalformedDocument(format!(
                "store item {:?} must have a positive price",
                item.id
            )));
        }
        if items[..i].iter().any(|prev| prev.id == item.id) {
            return Err(TrackerError::MalformedDocument(format!(
                "duplicate store item id {:?}",
                item.id
            )));
        }
    }
    Ok(())
}

// ── エクスポート ─────────────────────────────────────────────────

/// フルバックアップの JSON (整形済み)。
pub fn export_backup_json(model: &Model, export_date: &str) -> Result<String> {
    let doc = snapshot(model, Some(export_date.to_string()));
    Ok(serde_json::to_string_pretty(&doc)?)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreExport<'a> {
    store_items: &'a [StoreItem],
    purchased_items: Vec<&'a String>,
    export_date: &'a str,
}

/// ストアだけのバックアップ JSON。`parse_store_import` でそのまま読める。
pub fn export_store_json(catalog: &ItemCatalog, export_date: &str) -> Result<String> {
    let export = StoreExport {
        store_items: catalog.items(),
        purchased_items: catalog.purchased_ids().iter().collect(),
        export_date,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

// ── localStorage ────────────────────────────────────────────────

/// 旧形式ではカタログが配列のまま保存されていた。
#[cfg(any(target_arch = "wasm32", test))]
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCatalog {
    Wrapped {
        #[serde(rename = "storeItems")]
        store_items: Vec<StoreItem>,
    },
    Bare(Vec<StoreItem>),
}

#[cfg(any(target_arch = "wasm32", test))]
impl StoredCatalog {
    fn into_items(self) -> Vec<StoreItem> {
        match self {
            StoredCatalog::Wrapped { store_items } => store_items,
            StoredCatalog::Bare(items) => items,
        }
    }
}

#[cfg(any(target_arch = "wasm32", test))]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogSave<'a> {
    store_items: &'a [StoreItem],
}

/// localStorage にアクセスする。WASM 環境でのみ動作。
#[cfg(target_arch = "wasm32")]
fn get_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

#[cfg(target_arch = "wasm32")]
fn write_key(storage: &web_sys::Storage, key: &str, json: serde_json::Result<String>) {
    let json = match json {
        Ok(j) => j,
        Err(e) => {
            web_sys::console::warn_1(
                &format!("Score Tracker: {key} のシリアライズに失敗: {e}").into(),
            );
            return;
        }
    };
    if let Err(e) = storage.set_item(key, &json) {
        web_sys::console::warn_1(
            &format!("Score Tracker: localStorage への保存に失敗 ({key}): {e:?}").into(),
        );
    }
}

/// 状態を localStorage に保存する。変更のたびに呼ばれる。
/// 失敗時はサイレントに無視（コンソールにログ出力）。
#[cfg(target_arch = "wasm32")]
pub fn save_state(model: &Model) {
    let Some(storage) = get_storage() else {
        return;
    };
    write_key(
        &storage,
        STORAGE_KEY,
        serde_json::to_string(&primary_document(model)),
    );
    write_key(
        &storage,
        CATALOG_KEY,
        serde_json::to_string(&CatalogSave {
            store_items: model.catalog.items(),
        }),
    );
}

/// localStorage から状態を復元する。主ドキュメントを読めた場合に true。
/// 壊れたデータは削除して新規扱いにする。
#[cfg(target_arch = "wasm32")]
pub fn load_state(model: &mut Model) -> bool {
    let Some(storage) = get_storage() else {
        return false;
    };

    if let Ok(Some(json)) = storage.get_item(CATALOG_KEY) {
        match serde_json::from_str::<StoredCatalog>(&json) {
            Ok(stored) => {
                replace_store_items(&mut model.catalog, stored.into_items());
            }
            Err(e) => {
                web_sys::console::warn_1(
                    &format!("Score Tracker: カタログのパースに失敗（破棄します）: {e}").into(),
                );
                let _ = storage.remove_item(CATALOG_KEY);
            }
        }
    }

    let json = match storage.get_item(STORAGE_KEY) {
        Ok(Some(j)) => j,
        _ => return false,
    };
    match parse_document(&json) {
        Ok(doc) => {
            restore(model, doc);
            true
        }
        Err(e) => {
            web_sys::console::warn_1(
                &format!("Score Tracker: セーブデータのパースに失敗（破棄します）: {e}").into(),
            );
            let _ = storage.remove_item(STORAGE_KEY);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::store::Effect;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn sample_model() -> Model {
        let mut m = Model::new();
        m.catalog.seed_defaults_if_empty();
        m.buttons
            .create(Polarity::Positive, "Run", 5, None, Some(Position::new(120.0, 80.0)));
        m.buttons.create(Polarity::Negative, "Snack", 3, None, None);
        m.progress.apply_score_delta(600, today());
        m.catalog.purchase("theme1", &mut m.progress, today()).unwrap();
        m
    }

    fn assert_same_state(a: &Model, b: &Model) {
        assert_eq!(a.progress, b.progress);
        assert_eq!(a.buttons.list(), b.buttons.list());
        assert_eq!(a.catalog.purchased_ids(), b.catalog.purchased_ids());
        assert_eq!(a.catalog.items(), b.catalog.items());
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let original = sample_model();
        let doc = snapshot(&original, Some("2024-06-10T00:00:00Z".into()));
        let json = serde_json::to_string(&doc).unwrap();

        let mut restored = Model::new();
        restore(&mut restored, parse_document(&json).unwrap());
        assert_same_state(&original, &restored);
    }

    #[test]
    fn primary_document_roundtrip_keeps_catalog() {
        let original = sample_model();
        let json = serde_json::to_string(&primary_document(&original)).unwrap();
        assert!(!json.contains("storeItems"));

        let mut restored = Model::new();
        restored.catalog.seed_defaults_if_empty();
        restore(&mut restored, parse_document(&json).unwrap());
        assert_same_state(&original, &restored);
    }

    #[test]
    fn snapshot_uses_wire_names() {
        let doc = snapshot(&sample_model(), None);
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["buttons"][0]["type"], "good");
        assert_eq!(v["buttons"][0]["name"], "Run");
        assert_eq!(v["buttons"][0]["value"], 5);
        assert_eq!(v["buttons"][0]["left"], 120.0);
        assert_eq!(v["buttons"][1]["value"], -3);
        assert_eq!(v["purchasedItems"][0], "theme1");
        assert_eq!(v["progress"]["currentXP"], 100);
        assert_eq!(v["progress"]["currentLevel"], 2);
        assert_eq!(v["progress"]["lastActivityDate"], "2024-06-10");
        assert_eq!(v["version"], FORMAT_VERSION);
    }

    #[test]
    fn restore_defaults_missing_fields() {
        let mut m = sample_model();
        restore(&mut m, parse_document("{}").unwrap());
        assert_eq!(m.progress, ProgressEngine::new());
        assert!(m.buttons.is_empty());
        assert!(m.catalog.purchased_ids().is_empty());
        // Catalog untouched when storeItems is absent.
        assert_eq!(m.catalog.items().len(), 4);
    }

    #[test]
    fn restore_ignores_unknown_fields() {
        let json = r#"{"score": 12, "futureThing": {"a": 1}, "progress": {"currentLevel": 3, "mood": "happy"}}"#;
        let mut m = Model::new();
        restore(&mut m, parse_document(json).unwrap());
        assert_eq!(m.progress.score, 12);
        assert_eq!(m.progress.current_level, 3);
    }

    #[test]
    fn restore_reads_legacy_date_and_folds_excess_xp() {
        let json = r#"{"progress": {"currentXP": 250, "currentLevel": 1, "currentStreak": 4, "lastActivityDate": "Mon Mar 04 2024"}}"#;
        let mut m = Model::new();
        restore(&mut m, parse_document(json).unwrap());
        assert_eq!(
            m.progress.last_activity_date,
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
        assert_eq!(m.progress.current_level, 2);
        assert_eq!(m.progress.current_xp, 50);
        assert_eq!(m.progress.current_streak, 4);
    }

    #[test]
    fn restore_level_zero_becomes_one() {
        let json = r#"{"progress": {"currentLevel": 0, "lastActivityDate": null}}"#;
        let mut m = Model::new();
        restore(&mut m, parse_document(json).unwrap());
        assert_eq!(m.progress.current_level, 1);
        assert_eq!(m.progress.last_activity_date, None);
    }

    #[test]
    fn merge_buttons_imports_valid_skips_incomplete() {
        let json = r#"{"buttons": [{"type":"good","name":"Run","value":5}, {"type":"bad","name":"X"}]}"#;
        let records = parse_buttons_import(json).unwrap();
        let mut reg = ButtonRegistry::new();
        let report = merge_buttons(&mut reg, &records);
        assert_eq!(report, MergeReport { imported: 1, skipped: 1 });
        assert_eq!(reg.list()[0].label, "Run");
        assert_eq!(reg.list()[0].magnitude, 5);
    }

    #[test]
    fn merge_buttons_is_additive_and_normalizes_sign() {
        let mut reg = ButtonRegistry::new();
        reg.create(Polarity::Positive, "Existing", 1, None, None);
        let json = r#"{"buttons": [
            {"type":"bad","name":"Fast Food","value":3},
            {"type":"good","name":"Read","value":-4},
            {"type":"meh","name":"Odd","value":1},
            {"type":"good","name":"","value":1},
            {"type":"good","name":"Text","value":"2"},
            {"type":"good","name":"Obj","value":{}},
            42
        ]}"#;
        let report = merge_buttons(&mut reg, &parse_buttons_import(json).unwrap());
        assert_eq!(report, MergeReport { imported: 3, skipped: 4 });
        let values: Vec<i64> = reg.list().iter().map(|a| a.magnitude).collect();
        assert_eq!(values, vec![1, -3, 4, 2]);
    }

    #[test]
    fn buttons_import_requires_array() {
        assert!(matches!(
            parse_buttons_import(r#"{"buttons": {}}"#),
            Err(TrackerError::MalformedDocument(_))
        ));
        assert!(matches!(
            parse_buttons_import(r#"{"items": []}"#),
            Err(TrackerError::MalformedDocument(_))
        ));
        assert!(matches!(
            parse_buttons_import("not json"),
            Err(TrackerError::MalformedDocument(_))
        ));
        assert!(matches!(
            parse_buttons_import("   "),
            Err(TrackerError::MalformedDocument(_))
        ));
    }

    #[test]
    fn store_import_replaces_wholesale() {
        let mut m = sample_model();
        let json = r##"{"storeItems": [
            {"id":"custom_1","name":"🎨 Rainbow Theme","description":"Colorful","price":200,"color":"#FF6B6B","type":"theme","effect":"theme"}
        ]}"##;
        let items = parse_store_import(json).unwrap();
        assert_eq!(replace_store_items(&mut m.catalog, items), 1);
        assert_eq!(m.catalog.items().len(), 1);
        assert_eq!(m.catalog.items()[0].effect, Effect::Theme(None));
        // Ownership is not part of the catalog.
        assert!(m.catalog.is_owned("theme1"));
    }

    #[test]
    fn store_import_rejects_bad_items_without_mutation() {
        let mut m = sample_model();
        let before = m.catalog.items().to_vec();
        for json in [
            r#"{"storeItems": [{"id":"a","name":"A","price":0}]}"#,
            r#"{"storeItems": [{"id":"a","name":"A","price":5},{"id":"a","name":"B","price":5}]}"#,
            r#"{"storeItems": [{"id":"a","name":"A","price":-5}]}"#,
            r#"{"storeItems": [{"name":"A","price":5}]}"#,
            r#"{"storeItems": "nope"}"#,
        ] {
            assert!(
                matches!(parse_store_import(json), Err(TrackerError::MalformedDocument(_))),
                "accepted: {json}"
            );
        }
        assert_eq!(m.catalog.items(), before.as_slice());
        // Direct replacement applies the consistency pass instead.
        let mut dup = default_items_pair();
        dup.push(dup[0].clone());
        assert_eq!(replace_store_items(&mut m.catalog, dup), 2);
    }

    fn default_items_pair() -> Vec<StoreItem> {
        crate::tracker::store::default_items().into_iter().take(2).collect()
    }

    #[test]
    fn full_backup_clears_buttons_and_keeps_absent_sections() {
        let mut m = sample_model();
        m.progress.current_streak = 9;
        let json = r#"{"score": 42, "buttons": [{"id":"btn-5","type":"good","name":"Walk","value":2,"left":10,"top":20}], "purchasedItems": ["theme2"]}"#;
        let report = load_full_backup(&mut m, parse_document(json).unwrap());

        assert_eq!(m.progress.score, 42);
        assert_eq!(m.buttons.len(), 1);
        assert_eq!(m.buttons.list()[0].id, "btn-5");
        assert_eq!(m.buttons.list()[0].position, Position::new(10.0, 20.0));
        assert!(m.catalog.is_owned("theme2"));
        assert!(!m.catalog.is_owned("theme1"));
        // No progress / storeItems in the document: current values kept.
        assert_eq!(m.progress.current_streak, 9);
        assert_eq!(m.progress.current_level, 2);
        assert_eq!(m.catalog.items().len(), 4);
        assert_eq!(report.buttons, 1);
        assert!(!report.newer_format);
    }

    #[test]
    fn full_backup_replaces_present_sections() {
        let mut m = sample_model();
        let exported = export_backup_json(&sample_model(), "2024-06-10T00:00:00Z").unwrap();
        m.buttons.create(Polarity::Positive, "Extra", 1, None, None);
        m.progress.reset_progress();
        m.catalog.set_items(Vec::new());

        load_full_backup(&mut m, parse_document(&exported).unwrap());
        assert_same_state(&sample_model(), &m);
    }

    #[test]
    fn full_backup_flags_newer_major_version() {
        let mut m = Model::new();
        let report = load_full_backup(&mut m, parse_document(r#"{"version": "3.1"}"#).unwrap());
        assert!(report.newer_format);
        let report = load_full_backup(&mut m, parse_document(r#"{"version": "2.4"}"#).unwrap());
        assert!(!report.newer_format);
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(parse_document("[1,2]").is_err());
        assert!(parse_document(r#"{"score": "lots"}"#).is_err());
        assert!(parse_document(r#"{"buttons": 3}"#).is_err());
        assert!(parse_document(r#"{"storeItems": [{"id":"x","name":"X","price":0}]}"#).is_err());
    }

    #[test]
    fn out_of_range_progress_is_rejected() {
        for json in [
            r#"{"progress": {"currentLevel": 4294967295}}"#,
            r#"{"progress": {"currentLevel": 1000001}}"#,
            r#"{"progress": {"currentXP": 18446744073709551615}}"#,
        ] {
            assert!(
                matches!(parse_document(json), Err(TrackerError::MalformedDocument(_))),
                "accepted: {json}"
            );
        }
        let mut m = Model::new();
        let doc = parse_document(r#"{"progress": {"currentLevel": 1000000, "currentXP": 5}}"#).unwrap();
        load_full_backup(&mut m, doc);
        assert_eq!(m.progress.current_level, MAX_LEVEL);
    }

    #[test]
    fn oversized_button_values_are_skipped() {
        let json = r#"{"buttons": [
            {"type":"good","name":"Huge","value":1e19},
            {"type":"bad","name":"Huge text","value":"-5e12"},
            {"type":"good","name":"Fine","value":1000000000}
        ]}"#;
        let mut reg = ButtonRegistry::new();
        let report = merge_buttons(&mut reg, &parse_buttons_import(json).unwrap());
        assert_eq!(report, MergeReport { imported: 1, skipped: 2 });
        assert_eq!(reg.list()[0].label, "Fine");
    }

    #[test]
    fn export_store_reimports() {
        let m = sample_model();
        let json = export_store_json(&m.catalog, "2024-06-10T00:00:00Z").unwrap();
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["purchasedItems"][0], "theme1");
        let items = parse_store_import(&json).unwrap();
        assert_eq!(items.as_slice(), m.catalog.items());
    }

    #[test]
    fn stored_catalog_accepts_both_shapes() {
        let items = crate::tracker::store::default_items();
        let wrapped = serde_json::to_string(&CatalogSave { store_items: &items }).unwrap();
        let bare = serde_json::to_string(&items).unwrap();
        for json in [wrapped, bare] {
            let stored: StoredCatalog = serde_json::from_str(&json).unwrap();
            assert_eq!(stored.into_items(), items);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Create(bool, String, i64),
        Edit(usize, String, i64),
        Delta(i64, u32),
        Purchase(usize),
        Remove(usize),
    }

    fn label() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9]{0,10}"
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<bool>(), label(), 1i64..1000).prop_map(|(g, l, m)| Op::Create(g, l, m)),
            (0usize..8, label(), -1000i64..1000).prop_map(|(i, l, m)| Op::Edit(i, l, m)),
            (-300i64..1500, 1u32..29).prop_map(|(d, day)| Op::Delta(d, day)),
            (0usize..4).prop_map(Op::Purchase),
            (0usize..8).prop_map(Op::Remove),
        ]
    }

    fn play(ops: &[Op]) -> Model {
        let mut m = Model::new();
        m.catalog.seed_defaults_if_empty();
        let mut today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        for op in ops {
            match op {
                Op::Create(good, name, magnitude) => {
                    let polarity = if *good { Polarity::Positive } else { Polarity::Negative };
                    m.buttons.create(polarity, name, *magnitude, None, None);
                }
                Op::Edit(i, name, magnitude) => {
                    if let Some(id) = m.buttons.list().get(*i).map(|a| a.id.clone()) {
                        m.buttons.edit(&id, name, *magnitude as f64).unwrap();
                    }
                }
                Op::Delta(delta, day) => {
                    today = NaiveDate::from_ymd_opt(2024, 6, *day).unwrap();
                    m.progress.apply_score_delta(*delta, today);
                }
                Op::Purchase(i) => {
                    if let Some(id) = m.catalog.items().get(*i).map(|it| it.id.clone()) {
                        let _ = m.catalog.purchase(&id, &mut m.progress, today);
                    }
                }
                Op::Remove(i) => {
                    if let Some(id) = m.buttons.list().get(*i).map(|a| a.id.clone()) {
                        m.buttons.remove(&id);
                    }
                }
            }
        }
        m
    }

    proptest! {
        #[test]
        fn prop_snapshot_restores_any_reachable_state(
            ops in prop::collection::vec(op(), 0..40),
        ) {
            let original = play(&ops);
            let json = serde_json::to_string(&snapshot(&original, None)).unwrap();
            let mut restored = Model::new();
            restore(&mut restored, parse_document(&json).unwrap());

            prop_assert_eq!(&original.progress, &restored.progress);
            prop_assert_eq!(original.buttons.list(), restored.buttons.list());
            prop_assert_eq!(original.catalog.purchased_ids(), restored.catalog.purchased_ids());
            prop_assert_eq!(original.catalog.items(), restored.catalog.items());
        }
    }
}
