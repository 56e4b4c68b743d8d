//! 脚本系统
//!
//! 逐行解析的最小指令脚本，用于在没有上位机时回放一段刀具操作：
//!
//! ```text
//! ; 注释
//! M3 S128        ; 正转开启，标准模式
//! M4 S200 I      ; 反转开启，动态内联模式
//! G1 T20 F25     ; 运动块：20ms，进给 25mm/s
//! G1 T20 F25 A0.25 D0.25  ; 前后各 25% 加减速
//! M400           ; 等待运动队列排空
//! M5 I           ; 关闭并回到标准模式
//! ```

use anyhow::{Context, Result};
use cutter_driver::{Cutter, CutterCommand, MoveRequest};
use cutter_hal::PowerOutput;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// 脚本行
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptLine {
    /// 刀具命令（M3/M4/M5）
    Cutter(CutterCommand),
    /// 运动块（G1）
    Move(MoveRequest),
    /// 等待运动队列排空（M400）
    Sync,
}

/// 脚本解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: unknown command '{word}'")]
    UnknownCommand { line: usize, word: String },

    #[error("line {line}: invalid parameter '{param}'")]
    InvalidParameter { line: usize, param: String },

    #[error("line {line}: G1 requires a T<ms> duration")]
    MissingDuration { line: usize },
}

/// 单个参数：字母 + 可选数值（`I` 这类标志没有数值）
#[derive(Debug, Default)]
struct Params {
    s: Option<f32>,
    t: Option<f32>,
    f: Option<f32>,
    a: Option<f32>,
    d: Option<f32>,
    inline: bool,
}

fn parse_params<'a>(line: usize, words: impl Iterator<Item = &'a str>) -> Result<Params, ParseError> {
    let mut params = Params::default();
    for word in words {
        let invalid = || ParseError::InvalidParameter {
            line,
            param: word.to_string(),
        };
        let mut chars = word.chars();
        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        let rest = chars.as_str();

        if letter == 'I' {
            params.inline = true;
            continue;
        }

        let value: f32 = rest.parse().map_err(|_| invalid())?;
        match letter {
            'S' => params.s = Some(value),
            'T' => params.t = Some(value),
            'F' => params.f = Some(value),
            'A' => params.a = Some(value),
            'D' => params.d = Some(value),
            _ => return Err(invalid()),
        }
    }
    Ok(params)
}

/// 解析一行（空行和纯注释返回 `None`）
pub fn parse_line(line: usize, text: &str) -> Result<Option<ScriptLine>, ParseError> {
    let code = text.split(';').next().unwrap_or_default().trim();
    let mut words = code.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let parsed = match command.to_ascii_uppercase().as_str() {
        "M3" | "M4" => {
            let params = parse_params(line, words)?;
            let reverse = command.eq_ignore_ascii_case("M4");
            ScriptLine::Cutter(CutterCommand::on(reverse, params.inline, params.s))
        },
        "M5" => {
            let params = parse_params(line, words)?;
            ScriptLine::Cutter(CutterCommand::off(params.inline))
        },
        "G1" => {
            let params = parse_params(line, words)?;
            let ms = params.t.ok_or(ParseError::MissingDuration { line })?;
            let duration = Duration::from_micros((ms.max(0.0) * 1000.0).round() as u64);
            let request = MoveRequest::new(duration, params.f.unwrap_or(0.0))
                .with_ramps(params.a.unwrap_or(0.0), params.d.unwrap_or(0.0));
            ScriptLine::Move(request)
        },
        "M400" => ScriptLine::Sync,
        _ => {
            return Err(ParseError::UnknownCommand {
                line,
                word: command.to_string(),
            });
        },
    };
    Ok(Some(parsed))
}

/// 解析整个脚本
pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>, ParseError> {
    let mut lines = Vec::new();
    for (idx, text) in text.lines().enumerate() {
        if let Some(line) = parse_line(idx + 1, text)? {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// 加载脚本文件
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<ScriptLine>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("读取脚本文件失败: {}", path.display()))?;
    let lines = parse_script(&content).context("解析脚本失败")?;
    Ok(lines)
}

/// 脚本执行结果
#[derive(Debug, Clone, Default)]
pub struct ScriptResult {
    /// 总命令数
    pub total_commands: usize,
    /// 运动块数
    pub moves: usize,
    /// 刀具命令数
    pub cutter_commands: usize,
    /// 耗时（秒）
    pub duration_secs: f64,
}

/// 在 cutter 上执行脚本，结束时等待运动队列排空
pub fn execute<O: PowerOutput + 'static>(
    cutter: &Cutter<O>,
    lines: &[ScriptLine],
) -> Result<ScriptResult> {
    let start = Instant::now();
    let mut result = ScriptResult {
        total_commands: lines.len(),
        ..Default::default()
    };

    for (idx, line) in lines.iter().enumerate() {
        debug!("script command {}: {:?}", idx + 1, line);
        match line {
            ScriptLine::Cutter(command) => {
                cutter
                    .execute(*command)
                    .with_context(|| format!("命令 {} 执行失败", idx + 1))?;
                result.cutter_commands += 1;
            },
            ScriptLine::Move(request) => {
                cutter
                    .buffer_move(*request)
                    .with_context(|| format!("命令 {} 入队失败", idx + 1))?;
                result.moves += 1;
            },
            ScriptLine::Sync => cutter.synchronize()?,
        }
    }

    cutter.synchronize().context("等待运动队列排空失败")?;
    result.duration_secs = start.elapsed().as_secs_f64();
    Ok(result)
}
