//! 块设备上的绝对块号

use derive_more::{Add, Display, From, Into};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Add, Display, From, Into)]
#[repr(transparent)]
pub struct BlockId(usize);

impl core::ops::Add<usize> for BlockId {
    type Output = Self;

    fn add(self, rhs: usize) -> Self::Output {
        self + Self(rhs)
    }
}

impl BlockId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}
