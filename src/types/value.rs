//! JSON 值与 SQLite 值之间的转换
//!
//! 参数对象和结果对象都经由 `serde_json::Value` 中转：参数对象序列化后按成员名取值，
//! 结果行先组装为 JSON 对象再经 [`RowDeserializer`] 反序列化为声明的结果类型。
//! 唯一的强转是整数列 0/1 还原为 `bool` 成员，其余交给 SQLite 自身处理。

use crate::data::{PersistenceError, Result};
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde::de::value::MapDeserializer;
use serde::de::{Deserializer, IntoDeserializer, Visitor};
use serde_json::{Map, Value as JsonValue};

/// 将参数成员值转换为可绑定的 SQL 值
///
/// # 参数
///
/// - `name`: 参数名（用于错误报告）
/// - `value`: 从参数对象中取出的成员值
pub fn json_to_sql(name: &str, value: &JsonValue) -> Result<SqlValue> {
    match value {
        JsonValue::Null => Ok(SqlValue::Null),
        JsonValue::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        JsonValue::Number(n) => {
            // 超出 i64 的无符号整数不能退化为浮点数
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
                Ok(SqlValue::Real(f))
            } else {
                Err(PersistenceError::binding(format!(
                    "参数 `{}` 的数值超出范围: {}",
                    name, n
                )))
            }
        }
        JsonValue::String(s) => Ok(SqlValue::Text(s.clone())),
        // `Vec<u8>` 经 serde 序列化后是数字数组
        JsonValue::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(SqlValue::Blob)
            .ok_or_else(|| {
                PersistenceError::binding(format!("参数 `{}` 不是可绑定的字节序列", name))
            }),
        JsonValue::Object(_) => Err(PersistenceError::binding(format!(
            "参数 `{}` 是嵌套对象，无法绑定",
            name
        ))),
    }
}

/// 从结果行中读取一列为 JSON 值
pub fn sql_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::Number(i.into()),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(s) => JsonValue::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => JsonValue::Array(b.iter().map(|byte| (*byte).into()).collect()),
    }
}

/// 一行结果的反序列化器，列名作为成员名
pub struct RowDeserializer {
    columns: Map<String, JsonValue>,
}

impl RowDeserializer {
    pub fn new(columns: Map<String, JsonValue>) -> Self {
        Self { columns }
    }
}

impl<'de> Deserializer<'de> for RowDeserializer {
    type Error = serde_json::Error;

    fn deserialize_any<V>(self, visitor: V) -> std::result::Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let columns = self
            .columns
            .into_iter()
            .map(|(name, value)| (name, ColumnValue(value)));
        let mut access = MapDeserializer::<_, serde_json::Error>::new(columns);
        let value = visitor.visit_map(&mut access)?;
        access.end()?;
        Ok(value)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

/// 单列的值
///
/// SQLite 没有布尔类型，布尔值以整数 0/1 存储；目标成员是 `bool` 时按整数还原，
/// 其余类型交给 `serde_json::Value` 处理。
struct ColumnValue(JsonValue);

impl<'de> IntoDeserializer<'de, serde_json::Error> for ColumnValue {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! forward_to_json {
    ($($method:ident)*) => {
        $(
            fn $method<V>(self, visitor: V) -> std::result::Result<V::Value, Self::Error>
            where
                V: Visitor<'de>,
            {
                self.0.$method(visitor)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ColumnValue {
    type Error = serde_json::Error;

    fn deserialize_bool<V>(self, visitor: V) -> std::result::Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0.as_i64() {
            Some(0) => visitor.visit_bool(false),
            Some(1) => visitor.visit_bool(true),
            _ => self.0.deserialize_bool(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> std::result::Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            JsonValue::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_unit_struct<V>(
        self,
        name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_unit_struct(name, visitor)
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> std::result::Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_tuple(len, visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_tuple_struct(name, len, visitor)
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_struct(name, fields, visitor)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.0.deserialize_enum(name, variants, visitor)
    }

    forward_to_json! {
        deserialize_any deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_i128 deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_u128 deserialize_f32 deserialize_f64 deserialize_char deserialize_str
        deserialize_string deserialize_bytes deserialize_byte_buf deserialize_unit
        deserialize_seq deserialize_map deserialize_identifier deserialize_ignored_any
    }
}
