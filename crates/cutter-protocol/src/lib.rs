//! # Cutter Protocol
//!
//! 主轴/激光刀具功率控制的纯数据层（无硬件依赖）
//!
//! ## 模块
//!
//! - `mode`: 功率模式（Standard / ContinuousInline / DynamicInline）与转向
//! - `config`: 刀具配置（输出类型、功率单位、内联策略）
//! - `units`: 用户功率单位 → 硬件占空比/舵机位置的换算
//!
//! ## 在架构中的位置
//!
//! ```text
//! cutter-protocol (此 crate，纯函数 + 配置)
//!     ↓
//! cutter-hal (PowerOutput trait，PWM/舵机/开关输出)
//!     ↓
//! cutter-driver (模式状态机 + 运动队列同步)
//! ```

pub mod config;
pub mod mode;
pub mod units;

// 重新导出常用类型
pub use config::*;
pub use mode::*;
pub use units::*;

use thiserror::Error;

/// 配置校验错误
///
/// 配置不匹配在构建期（`CutterBuilder::build()`）暴露，
/// 运行时的功率值一律钳位，不会产生错误。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid unit power range: min {min} must be within [0, max {max}] and max > 0")]
    InvalidUnitRange { min: f32, max: f32 },

    #[error("Startup power {startup} outside unit range [{min}, {max}]")]
    StartupOutOfRange { startup: f32, min: f32, max: f32 },

    #[error("Servo max position must be non-zero")]
    ZeroServoRange,

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: f32 },
}
