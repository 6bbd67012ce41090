// ==========================================
// 月度绩效评优系统 - 数据导入层
// ==========================================
// 职责: 来源文件解析、列映射、标识符规范化
// 红线: 不含业务规则判断 (行过滤属引擎层)
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;

pub use error::{ImportError, ImportResult};
pub use field_mapper::{
    normalize_identifier, parse_metric, FieldMapper, CLIENT_ID_WIDTH, EMPLOYEE_ID_WIDTH,
};
pub use file_parser::{CsvParser, ExcelParser, ParseOptions, UniversalFileParser};
