// ==========================================
// BI 管理后台 - 导入格式领域模型
// ==========================================
// 职责: 描述一个导入格式（目标实体 + 字段 + 别名 + 类型）
// 约束: 同一格式内字段名唯一，别名集合互不重叠
// ==========================================

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

// ==========================================
// ValueKind - 字段值类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    Number,
    Date,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
            ValueKind::Date => "date",
            ValueKind::Boolean => "boolean",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// FieldSpec - 字段描述
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,               // 标准字段名（同时也是目标表列名）
    pub aliases: &'static [&'static str], // 可接受的列名别名（大小写/空白不敏感）
    pub kind: ValueKind,
    pub required: bool,
}

impl FieldSpec {
    /// 标准字段名 + 全部别名（标准化后）
    pub fn normalized_aliases(&self) -> Vec<String> {
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .map(normalize_label)
            .collect()
    }
}

// ==========================================
// ImportFormat - 导入格式
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ImportFormat {
    pub id: &'static str,
    pub target_entity: &'static str, // 目标表
    pub fields: &'static [FieldSpec],
}

impl ImportFormat {
    /// 按标准字段名查找字段
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 校验格式不变量
    ///
    /// # 返回
    /// - Ok(()): 字段名唯一，且别名集合不重叠
    /// - Err(String): 第一个违反项的描述
    pub fn validate(&self) -> Result<(), String> {
        let mut owners: HashMap<String, &str> = HashMap::new();
        let mut names: Vec<&str> = Vec::with_capacity(self.fields.len());

        for field in self.fields {
            if names.contains(&field.name) {
                return Err(format!(
                    "format '{}': duplicate field name '{}'",
                    self.id, field.name
                ));
            }
            names.push(field.name);

            for alias in field.normalized_aliases() {
                match owners.get(&alias) {
                    // 同一字段内的重复别名无害
                    Some(owner) if *owner == field.name => {}
                    Some(owner) => {
                        return Err(format!(
                            "format '{}': alias '{}' shared by '{}' and '{}'",
                            self.id, alias, owner, field.name
                        ));
                    }
                    None => {
                        owners.insert(alias, field.name);
                    }
                }
            }
        }

        Ok(())
    }

    /// 按字段顺序解析每个字段命中的列下标
    ///
    /// # 参数
    /// - normalized_labels: 已标准化的表头（表头顺序）
    ///
    /// # 说明
    /// - 每个字段的别名集合只标准化一次
    /// - 多列命中同一字段时取表头顺序中的第一列
    pub fn resolve_columns(&self, normalized_labels: &[String]) -> Vec<Option<usize>> {
        self.fields
            .iter()
            .map(|field| {
                let aliases = field.normalized_aliases();
                normalized_labels
                    .iter()
                    .position(|label| aliases.iter().any(|alias| alias == label))
            })
            .collect()
    }
}

/// 列名标准化：去首尾空白、合并内部空白、转小写
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
