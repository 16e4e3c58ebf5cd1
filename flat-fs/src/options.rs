//! 挂载参数与时间来源

/// 时间来源，以Unix纪元以来的秒数计。
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// 何时刷新`atime`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtimePolicy {
    /// 从不刷新
    Never,
    /// 打开文件时刷新
    #[default]
    OnOpen,
    /// 打开、读取与查询属性时都刷新
    OnAccess,
}

impl AtimePolicy {
    #[inline]
    pub fn on_open(self) -> bool {
        self != Self::Never
    }

    #[inline]
    pub fn on_access(self) -> bool {
        self == Self::OnAccess
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountOptions {
    /// 新文件的属主
    pub uid: u32,
    /// 新文件的属组
    pub gid: u32,
    pub atime: AtimePolicy,
}
