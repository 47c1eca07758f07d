// ==========================================
// DLVery 库存配送协同系统 - 文档字段归一化
// ==========================================
// 红线: 存储层不约束结构，每次读取都必须做缺省/类型校正
// 规则:
// - 字符串: 缺失/null → ""；数字/布尔按字面转字符串
// - 整数: 整数原值；小数截断；其他 → 0
// - 布尔: 真值语义（true / 非零数字 / 非空字符串）
// - 日期: YYYY-MM-DD 或 RFC3339 的日期部分；其他 → None
// - 时间戳: RFC3339；缺失/非法 → 当前时间
// ==========================================

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

use crate::store::document::Document;

/// 读取字符串字段
pub fn str_field(doc: &Document, key: &str) -> String {
    match doc.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// 读取整数字段
pub fn int_field(doc: &Document, key: &str) -> i64 {
    match doc.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// 读取布尔字段（真值语义）
pub fn bool_field(doc: &Document, key: &str) -> bool {
    match doc.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        _ => false,
    }
}

/// 解析日期文本（只取日期部分）
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    // 形如 2024-05-01T10:00 的无时区时间
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// 读取日期字段
pub fn date_field(doc: &Document, key: &str) -> Option<NaiveDate> {
    match doc.get(key) {
        Some(Value::String(s)) => parse_date(s),
        _ => None,
    }
}

/// 读取可选时间戳字段
pub fn opt_timestamp_field(doc: &Document, key: &str) -> Option<DateTime<Utc>> {
    match doc.get(key) {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        _ => None,
    }
}

/// 读取时间戳字段（缺失按当前时间）
pub fn timestamp_field(doc: &Document, key: &str) -> DateTime<Utc> {
    opt_timestamp_field(doc, key).unwrap_or_else(Utc::now)
}

// ==========================================
// 写入侧格式
// ==========================================

/// 时间戳存储格式（毫秒精度 ISO-8601）
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 日期存储格式
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_missing_fields_default() {
        let d = doc(json!({}));
        assert_eq!(str_field(&d, "sku"), "");
        assert_eq!(int_field(&d, "quantity"), 0);
        assert!(!bool_field(&d, "perishable"));
        assert_eq!(date_field(&d, "deliveryDate"), None);
    }

    #[test]
    fn test_mistyped_fields_coerced() {
        let d = doc(json!({
            "sku": 1001,
            "agent": true,
            "quantity": "12",
            "ratio": 3.9,
            "perishable": "yes",
            "damaged": 0,
            "flag": ""
        }));
        assert_eq!(str_field(&d, "sku"), "1001");
        assert_eq!(str_field(&d, "agent"), "true");
        assert_eq!(int_field(&d, "quantity"), 0, "字符串数量不被当作数字");
        assert_eq!(int_field(&d, "ratio"), 3);
        assert!(bool_field(&d, "perishable"));
        assert!(!bool_field(&d, "damaged"));
        assert!(!bool_field(&d, "flag"));
    }

    #[test]
    fn test_date_parsing_strips_time() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(parse_date("2024-05-01"), expected);
        assert_eq!(parse_date("2024-05-01T23:10:00.000Z"), expected);
        assert_eq!(parse_date("2024-05-01T23:10"), expected);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("tomorrow"), None);
    }

    #[test]
    fn test_timestamp_roundtrip_format() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T08:00:00.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let d = doc(json!({"createdAt": format_timestamp(&ts)}));
        assert_eq!(opt_timestamp_field(&d, "createdAt"), Some(ts));
    }
}
