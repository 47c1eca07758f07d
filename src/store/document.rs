// ==========================================
// DLVery 库存配送协同系统 - 文档与查询模型
// ==========================================
// 职责: 集合枚举、原始文档、查询条件（过滤 + 排序）、批量写操作
// 红线: 存储层不约束文档结构，结构校正由仓储层读取时完成
// ==========================================

use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// 原始文档（顶层字段映射）
pub type Document = Map<String, Value>;

/// 将 JSON 对象转换为文档；非对象值得到空文档
pub fn into_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

// ==========================================
// Collection - 集合
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Inventory,     // 库存
    Deliveries,    // 配送单
    Verifications, // 签收凭证
    Users,         // 用户
}

impl Collection {
    /// 集合名（数据库存储值）
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Inventory => "inventory",
            Collection::Deliveries => "deliveries",
            Collection::Verifications => "verifications",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 带 ID 的存储文档
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, data: Document) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// 读取顶层字段
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

// ==========================================
// 查询条件
// ==========================================

/// 顶层字段等值过滤
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

/// 顶层字段排序
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// 集合查询
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub collection: Collection,
    pub filter: Option<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl DocumentQuery {
    /// 查询整个集合
    pub fn all(collection: Collection) -> Self {
        Self {
            collection,
            filter: None,
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// 对已按写入序排列的文档应用过滤与排序
    ///
    /// 排序为稳定排序；缺失字段无论升降序都排在最后。
    pub fn apply(&self, docs: Vec<StoredDocument>) -> Vec<StoredDocument> {
        let mut result: Vec<StoredDocument> = match &self.filter {
            Some(filter) => docs.into_iter().filter(|d| filter.matches(&d.data)).collect(),
            None => docs,
        };

        if let Some(order) = &self.order_by {
            result.sort_by(|a, b| {
                compare_optional_values(
                    a.data.get(&order.field),
                    b.data.get(&order.field),
                    order.descending,
                )
            });
        }
        result
    }
}

/// 比较两个可能缺失的字段值（缺失/null 恒排在最后）
fn compare_optional_values(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

/// 同类型值比较；不同类型按类型序（bool < number < string < 其他）
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// ==========================================
// WriteOp - 批量写操作
// ==========================================
// 一个逻辑操作映射为一个 WriteOp 批次，由存储在单个事务内提交
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// 新建文档（ID 由存储生成）
    Create { collection: Collection, doc: Document },
    /// 顶层字段浅合并；目标不存在时整个批次失败
    Update {
        collection: Collection,
        id: String,
        patch: Document,
    },
    /// 删除文档；目标不存在时整个批次失败
    Delete { collection: Collection, id: String },
}

impl WriteOp {
    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::Create { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Delete { collection, .. } => *collection,
        }
    }
}
