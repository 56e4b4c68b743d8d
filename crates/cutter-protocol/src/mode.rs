//! 功率模式定义
//!
//! 决定功率变化是立即生效（Standard）还是跟随运动队列同步生效（Inline）。

/// 刀具功率模式
///
/// # 模式说明
///
/// - **Standard**: 标准模式，功率变化前等待运动队列排空，然后立即写硬件输出
/// - **ContinuousInline**: 连续内联模式（正转指令 + 内联标志），
///   功率值随后续运动块一起执行，整个运动块保持恒定功率
/// - **DynamicInline**: 动态内联模式（反转指令 + 内联标志），
///   功率值随运动块执行，并按进给速度缩放
///
/// # 状态转换
///
/// ```text
/// Standard --(activate, inline, fwd)--> ContinuousInline
/// Standard --(activate, inline, rev)--> DynamicInline
/// Continuous/Dynamic --(deactivate, clear_inline)--> Standard
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PowerMode {
    /// 标准模式（默认）
    #[default]
    Standard,

    /// 连续内联模式
    ContinuousInline,

    /// 动态内联模式
    DynamicInline,
}

impl PowerMode {
    /// 根据指令方向选择内联模式变体
    ///
    /// 正转指令进入 `ContinuousInline`，反转指令进入 `DynamicInline`。
    pub fn inline_for(reverse: bool) -> Self {
        if reverse {
            Self::DynamicInline
        } else {
            Self::ContinuousInline
        }
    }

    /// 是否为内联模式（Continuous 或 Dynamic）
    pub fn is_inline(self) -> bool {
        !self.is_standard()
    }

    /// 是否为标准模式
    pub fn is_standard(self) -> bool {
        self == Self::Standard
    }

    /// 是否为动态内联模式
    pub fn is_dynamic(self) -> bool {
        self == Self::DynamicInline
    }
}

/// 刀具转向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// 正转（顺时针）
    #[default]
    Forward,
    /// 反转（逆时针）
    Reverse,
}

impl Direction {
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse { Self::Reverse } else { Self::Forward }
    }

    pub fn is_reverse(self) -> bool {
        self == Self::Reverse
    }
}
