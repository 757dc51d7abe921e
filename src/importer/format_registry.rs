// ==========================================
// BI 管理后台 - 导入格式注册表
// ==========================================
// 职责: 进程级只读格式目录（静态数据，无运行时注册）
// 对齐: db::ensure_schema 中的 customers / employees / meetings 表
// ==========================================

use crate::domain::{FieldSpec, ImportFormat, ValueKind};

const fn field(
    name: &'static str,
    aliases: &'static [&'static str],
    kind: ValueKind,
    required: bool,
) -> FieldSpec {
    FieldSpec {
        name,
        aliases,
        kind,
        required,
    }
}

// ===== 客户 =====
static CUSTOMER_FIELDS: [FieldSpec; 5] = [
    field("name", &["Name", "Customer", "Customer Name", "客户名称"], ValueKind::Text, true),
    field("email", &["Email", "E-mail", "Email Address", "邮箱"], ValueKind::Text, false),
    field("phone", &["Phone", "Telephone", "Mobile", "Phone Number", "电话"], ValueKind::Text, false),
    field("company", &["Company", "Organization", "Company Name", "公司"], ValueKind::Text, false),
    field("address", &["Address", "Street Address", "地址"], ValueKind::Text, false),
];

// ===== 员工 =====
static EMPLOYEE_FIELDS: [FieldSpec; 7] = [
    field("name", &["Name", "Employee", "Full Name", "姓名"], ValueKind::Text, true),
    field("email", &["Email", "E-mail", "Work Email", "邮箱"], ValueKind::Text, true),
    field("position", &["Position", "Title", "Job Title", "职位"], ValueKind::Text, false),
    field("department", &["Department", "Dept", "部门"], ValueKind::Text, false),
    field("hire_date", &["Hire Date", "Start Date", "入职日期"], ValueKind::Date, false),
    field("salary", &["Salary", "Monthly Salary", "薪资"], ValueKind::Number, false),
    field("active", &["Active", "Is Active", "Employed", "在职"], ValueKind::Boolean, false),
];

// ===== 会议 =====
static MEETING_FIELDS: [FieldSpec; 6] = [
    field("title", &["Title", "Subject", "Meeting", "主题"], ValueKind::Text, true),
    field("meeting_date", &["Date", "Meeting Date", "会议日期"], ValueKind::Date, true),
    field("duration_minutes", &["Duration", "Duration (min)", "Minutes", "时长"], ValueKind::Number, false),
    field("customer_name", &["Customer", "Client", "Customer Name", "客户"], ValueKind::Text, false),
    field("location", &["Location", "Place", "Room", "地点"], ValueKind::Text, false),
    field("notes", &["Notes", "Description", "Remarks", "备注"], ValueKind::Text, false),
];

static FORMATS: [ImportFormat; 3] = [
    ImportFormat {
        id: "customers",
        target_entity: "customers",
        fields: &CUSTOMER_FIELDS,
    },
    ImportFormat {
        id: "employees",
        target_entity: "employees",
        fields: &EMPLOYEE_FIELDS,
    },
    ImportFormat {
        id: "meetings",
        target_entity: "meetings",
        fields: &MEETING_FIELDS,
    },
];

static BUILTIN: FormatRegistry = FormatRegistry { formats: &FORMATS };

// ==========================================
// FormatRegistry - 格式注册表
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct FormatRegistry {
    formats: &'static [ImportFormat],
}

impl FormatRegistry {
    /// 内置格式目录
    pub fn builtin() -> &'static FormatRegistry {
        &BUILTIN
    }

    /// 全部格式（顺序固定）
    pub fn list_formats(&self) -> &'static [ImportFormat] {
        self.formats
    }

    /// 按 ID 查找；未知 ID 返回 None，由调用方在映射前分支处理
    pub fn find_format(&self, id: &str) -> Option<&'static ImportFormat> {
        let id = id.trim();
        self.formats.iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_formats_are_valid() {
        for format in FormatRegistry::builtin().list_formats() {
            assert_eq!(format.validate(), Ok(()), "format {}", format.id);
        }
    }

    #[test]
    fn test_list_formats_order() {
        let ids: Vec<_> = FormatRegistry::builtin()
            .list_formats()
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["customers", "employees", "meetings"]);
    }

    #[test]
    fn test_find_format() {
        let registry = FormatRegistry::builtin();

        let customers = registry.find_format("customers").unwrap();
        assert_eq!(customers.target_entity, "customers");
        assert!(customers.field("name").unwrap().required);

        assert!(registry.find_format(" employees ").is_some());
        assert!(registry.find_format("invoices").is_none());
        assert!(registry.find_format("").is_none());
    }

    #[test]
    fn test_every_format_has_a_required_field() {
        for format in FormatRegistry::builtin().list_formats() {
            assert!(format.fields.iter().any(|f| f.required), "format {}", format.id);
        }
    }
}
