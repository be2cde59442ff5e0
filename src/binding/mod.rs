//! Mapper 接口绑定
//!
//! 一个 mapper 接口由命名空间和一组方法签名描述，方法名即命名空间内的语句 ID。
//! 注册时为每个方法解析出语句类型并生成调度表，调用时只查表，不再做任何反射式查找。
//!
//! ```ignore
//! mapper_interface!(pub PersonMapper = "mapper.PersonMapper" {
//!     selectOne => One,
//!     findAll => List,
//!     insertPerson => RowCount,
//! });
//!
//! configuration.add_mapper::<PersonMapper>()?;
//! let mut mapper = session.get_mapper::<PersonMapper>()?;
//! let people: Vec<Person> = mapper.fetch_list("findAll", &())?;
//! ```

pub mod proxy;

pub use proxy::{MapperMethod, MapperProxy, MapperProxyFactory, MapperResult};

/// 方法的返回形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// 至多一个结果对象
    One,
    /// 结果列表
    List,
    /// 影响行数
    RowCount,
}

/// mapper 方法签名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: &'static str,
    pub returns: ReturnKind,
}

/// mapper 接口
///
/// 通常由 [`mapper_interface!`](crate::mapper_interface) 生成。
pub trait Mapper: 'static {
    /// 命名空间，与注册语句时使用的命名空间一致
    const NAMESPACE: &'static str;
    /// 接口声明的方法
    const METHODS: &'static [MethodSignature];
}

/// 声明一个 mapper 接口类型
///
/// # 示例
///
/// ```ignore
/// mapper_interface!(pub PersonMapper = "mapper.PersonMapper" {
///     selectOne => One,
///     deletePerson => RowCount,
/// });
/// ```
#[macro_export]
macro_rules! mapper_interface {
    ($vis:vis $name:ident = $namespace:literal { $($method:ident => $returns:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::binding::Mapper for $name {
            const NAMESPACE: &'static str = $namespace;
            const METHODS: &'static [$crate::binding::MethodSignature] = &[
                $(
                    $crate::binding::MethodSignature {
                        name: stringify!($method),
                        returns: $crate::binding::ReturnKind::$returns,
                    },
                )*
            ];
        }
    };
}
