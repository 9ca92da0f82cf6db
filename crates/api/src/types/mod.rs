//! 请求体类型
//!
//! `simulate` 的线上格式在这里解析为 [`SimulationOptions`]，引擎只接触解析后的显式选项。

pub mod simulate;

pub use simulate::{DispatchRequest, LogicOverride, SimulateParam};
