//! serde 类型成员探测
//!
//! 派生的 `Deserialize` 实现会在 `deserialize_struct` 中带上全部字段名，
//! 这里用一个只记录字段名、随即返回错误的反序列化器把它们取出来。
//! 字段名在类型注册时探测一次，之后由 `TypeDescriptor` 缓存。

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};

struct MemberProbe<'a> {
    members: &'a mut Option<&'static [&'static str]>,
}

impl<'de, 'a> Deserializer<'de> for MemberProbe<'a> {
    type Error = de::value::Error;

    fn deserialize_any<V>(self, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(de::Error::custom("not a struct"))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        *self.members = Some(fields);
        Err(de::Error::custom("member probe"))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

/// 获取结构体类型的成员名（按声明顺序，已应用 `#[serde(rename)]`）
///
/// 非结构体类型（标量、序列、`flatten` 后的 map 等）返回 `None`。
pub fn struct_members<T: DeserializeOwned>() -> Option<&'static [&'static str]> {
    let mut members = None;
    let _ = T::deserialize(MemberProbe {
        members: &mut members,
    });
    members
}
