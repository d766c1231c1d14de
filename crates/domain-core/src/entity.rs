//! 实体基础 trait 与标识

use serde::{Deserialize, Serialize};

/// 实体标识：尚未持久化，或已由存储分配主键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum Identity<Id> {
    #[default]
    New,
    Existing(Id),
}

impl<Id> Identity<Id> {
    pub fn is_new(&self) -> bool {
        matches!(self, Identity::New)
    }

    pub fn as_option(&self) -> Option<&Id> {
        match self {
            Identity::New => None,
            Identity::Existing(id) => Some(id),
        }
    }

    pub fn into_option(self) -> Option<Id> {
        match self {
            Identity::New => None,
            Identity::Existing(id) => Some(id),
        }
    }
}

impl<Id: From<i64>> Identity<Id> {
    /// 把存储层的原始主键转为标识，0 与负数视为未持久化
    pub fn from_raw(raw: i64) -> Self {
        if raw > 0 {
            Identity::Existing(Id::from(raw))
        } else {
            Identity::New
        }
    }
}

impl<Id> From<Option<Id>> for Identity<Id> {
    fn from(value: Option<Id>) -> Self {
        value.map_or(Identity::New, Identity::Existing)
    }
}

/// 实体 trait
pub trait Entity {
    type Id: Copy;

    fn identity(&self) -> Identity<Self::Id>;

    fn id(&self) -> Option<Self::Id> {
        self.identity().into_option()
    }

    fn is_persisted(&self) -> bool {
        !self.identity().is_new()
    }
}
