//! SQL 模板标记解析
//!
//! 从左到右扫描模板：普通文本原样复制；遇到开始标记后收集到结束标记为止的内容，
//! 交给 `TokenHandler` 处理并用其返回值替换整个占位符。
//!
//! - 以转义字符开头的开始/结束标记按字面量输出，不作为占位符边界
//! - 开始标记之后找不到结束标记时，从开始标记起的剩余文本原样输出（宽松处理，不报错）
//! - 不支持嵌套占位符

use crate::models::bound_sql::{BoundSql, ParameterMapping};

/// 默认转义字符
pub const DEFAULT_ESCAPE: char = '\\';

/// 占位符内容处理器
pub trait TokenHandler {
    /// 处理一个占位符的内容，返回替换文本
    fn handle_token(&mut self, content: &str) -> String;
}

/// 通用标记解析器
#[derive(Debug, Clone)]
pub struct GenericTokenParser {
    open_token: String,
    close_token: String,
    escape: char,
}

impl GenericTokenParser {
    pub fn new(open_token: impl Into<String>, close_token: impl Into<String>) -> Self {
        Self {
            open_token: open_token.into(),
            close_token: close_token.into(),
            escape: DEFAULT_ESCAPE,
        }
    }

    /// 使用 `#{` / `}` 作为标记的解析器
    pub fn parameter_parser() -> Self {
        Self::new("#{", "}")
    }

    pub fn with_escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }

    /// 解析模板
    ///
    /// # 参数
    ///
    /// - `text`: SQL 模板
    /// - `handler`: 占位符处理器
    pub fn parse(&self, text: &str, handler: &mut dyn TokenHandler) -> String {
        if text.is_empty() || self.open_token.is_empty() || self.close_token.is_empty() {
            return text.to_string();
        }

        let mut start = match text.find(&self.open_token) {
            Some(start) => start,
            None => return text.to_string(),
        };

        let mut builder = String::with_capacity(text.len());
        let mut offset = 0;

        loop {
            if start > offset && text[offset..start].ends_with(self.escape) {
                // 转义的开始标记，去掉转义字符后按字面量输出
                builder.push_str(&text[offset..start - self.escape.len_utf8()]);
                builder.push_str(&self.open_token);
                offset = start + self.open_token.len();
            } else {
                builder.push_str(&text[offset..start]);
                let body_start = start + self.open_token.len();
                match self.find_close(text, body_start) {
                    Some((expression, end)) => {
                        builder.push_str(&handler.handle_token(expression.trim()));
                        offset = end + self.close_token.len();
                    }
                    None => {
                        builder.push_str(&text[start..]);
                        offset = text.len();
                    }
                }
            }

            match text[offset..].find(&self.open_token) {
                Some(next) => start = offset + next,
                None => break,
            }
        }

        if offset < text.len() {
            builder.push_str(&text[offset..]);
        }
        builder
    }

    /// 从 `from` 开始查找未转义的结束标记，返回占位符内容和结束标记位置
    fn find_close(&self, text: &str, from: usize) -> Option<(String, usize)> {
        let mut expression = String::new();
        let mut offset = from;

        while let Some(pos) = text[offset..].find(&self.close_token) {
            let end = offset + pos;
            if end > offset && text[offset..end].ends_with(self.escape) {
                expression.push_str(&text[offset..end - self.escape.len_utf8()]);
                expression.push_str(&self.close_token);
                offset = end + self.close_token.len();
            } else {
                expression.push_str(&text[offset..end]);
                return Some((expression, end));
            }
        }
        None
    }
}

/// 将 `#{name}` 替换为 `?` 并按顺序记录参数名
#[derive(Debug, Default)]
pub struct ParameterMappingTokenHandler {
    parameter_mappings: Vec<ParameterMapping>,
}

impl ParameterMappingTokenHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_parameter_mappings(self) -> Vec<ParameterMapping> {
        self.parameter_mappings
    }
}

impl TokenHandler for ParameterMappingTokenHandler {
    fn handle_token(&mut self, content: &str) -> String {
        self.parameter_mappings.push(ParameterMapping::new(content));
        "?".to_string()
    }
}

/// 将 SQL 模板改写为 `BoundSql`
pub fn bind_sql(template: &str) -> BoundSql {
    let mut handler = ParameterMappingTokenHandler::new();
    let sql = GenericTokenParser::parameter_parser().parse(template, &mut handler);
    BoundSql::new(sql, handler.into_parameter_mappings())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_placeholders() {
        let bound = bind_sql("select * from t where id = #{id} and name = #{name}");
        assert_eq!(bound.sql, "select * from t where id = ? and name = ?");
        assert_eq!(bound.parameter_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_no_placeholders() {
        let bound = bind_sql("select * from person");
        assert_eq!(bound.sql, "select * from person");
        assert!(bound.parameter_mappings.is_empty());
    }

    #[test]
    fn test_empty_template() {
        let bound = bind_sql("");
        assert_eq!(bound.sql, "");
        assert!(bound.parameter_mappings.is_empty());
    }

    #[test]
    fn test_duplicates_and_order_preserved() {
        let bound = bind_sql("update t set a = #{b}, c = #{a} where x = #{b} or y = #{a}");
        assert_eq!(bound.sql, "update t set a = ?, c = ? where x = ? or y = ?");
        assert_eq!(bound.parameter_names(), vec!["b", "a", "b", "a"]);
    }

    #[test]
    fn test_placeholder_count_matches_markers() {
        let templates = [
            "insert into person (id, name, age) values (#{id}, #{name}, #{age})",
            "#{a}#{b}#{c}",
            "select #{x} from t where y = #{x}",
        ];
        for template in templates {
            let bound = bind_sql(template);
            let markers = bound.sql.matches('?').count();
            assert_eq!(markers, bound.parameter_mappings.len(), "{}", template);
            assert_eq!(markers, template.matches("#{").count(), "{}", template);
        }
    }

    #[test]
    fn test_body_is_trimmed() {
        let bound = bind_sql("select * from t where id = #{  id }");
        assert_eq!(bound.sql, "select * from t where id = ?");
        assert_eq!(bound.parameter_names(), vec!["id"]);
    }

    #[test]
    fn test_escaped_open_token_is_literal() {
        let bound = bind_sql(r"select '\#{not_a_param}' from t where id = #{id}");
        assert_eq!(bound.sql, "select '#{not_a_param}' from t where id = ?");
        assert_eq!(bound.parameter_names(), vec!["id"]);
    }

    #[test]
    fn test_escaped_close_token_inside_body() {
        let bound = bind_sql(r"select #{a\}b} from t");
        assert_eq!(bound.sql, "select ? from t");
        assert_eq!(bound.parameter_names(), vec!["a}b"]);
    }

    #[test]
    fn test_unclosed_placeholder_is_kept_literally() {
        let bound = bind_sql("select * from t where id = #{id and name = 'x'");
        assert_eq!(bound.sql, "select * from t where id = #{id and name = 'x'");
        assert!(bound.parameter_mappings.is_empty());

        let bound = bind_sql("select #{a} from t where b = #{b");
        assert_eq!(bound.sql, "select ? from t where b = #{b");
        assert_eq!(bound.parameter_names(), vec!["a"]);
    }

    #[test]
    fn test_custom_tokens() {
        let mut handler = ParameterMappingTokenHandler::new();
        let parser = GenericTokenParser::new("${", "}").with_escape('!');
        let sql = parser.parse("select ${col} from t where note = '!${raw}'", &mut handler);
        assert_eq!(sql, "select ? from t where note = '${raw}'");
        assert_eq!(
            handler.into_parameter_mappings(),
            vec![ParameterMapping::new("col")]
        );
    }

    #[test]
    fn test_multibyte_text() {
        let bound = bind_sql("select * from 用户 where 名字 = #{名字}");
        assert_eq!(bound.sql, "select * from 用户 where 名字 = ?");
        assert_eq!(bound.parameter_names(), vec!["名字"]);
    }
}
