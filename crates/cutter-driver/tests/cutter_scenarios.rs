//! 端到端场景测试
//!
//! 使用真实的步进线程和 MockOutput，验证命令上下文与执行上下文之间的同步。

use cutter_driver::{CutterBuilder, CutterCommand, MoveRequest, StepperConfig};
use cutter_hal::MockOutput;
use cutter_protocol::{CutterConfig, InlineStrategy, PowerMode};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn short_move() -> MoveRequest {
    MoveRequest::new(Duration::from_millis(2), 20.0)
}

#[test]
fn test_standard_activation_waits_for_queued_moves() {
    let output = Arc::new(MockOutput::new());
    let cutter = CutterBuilder::new().build(output.clone()).unwrap();

    for _ in 0..3 {
        cutter.buffer_move(MoveRequest::new(Duration::from_millis(5), 20.0)).unwrap();
    }

    let state = cutter.activate(false, false, Some(128.0)).unwrap();

    // 写输出之前所有运动块都已执行完
    assert_eq!(cutter.metrics().blocks_executed, 3);
    assert!(cutter.planner().is_empty());
    assert_eq!(state.mode, PowerMode::Standard);
    assert_eq!(state.hardware_value, 128);
    assert_eq!(output.writes(), vec![128]);
}

#[test]
fn test_inline_power_rides_with_blocks() {
    let output = Arc::new(MockOutput::new());
    let cutter = CutterBuilder::new().build(output.clone()).unwrap();

    cutter.activate(false, true, Some(255.0)).unwrap();
    assert_eq!(cutter.mode(), PowerMode::ContinuousInline);
    // 内联模式：开启本身不写输出
    assert!(output.writes().is_empty());

    cutter.buffer_move(short_move()).unwrap();
    cutter.buffer_move(short_move()).unwrap();

    let state = cutter.deactivate(true).unwrap();

    // 两个块都以 255 执行，之后关闭立即写 0
    assert_eq!(output.writes(), vec![255, 255, 0]);
    assert_eq!(state.mode, PowerMode::Standard);
    assert_eq!(state.hardware_value, 0);
    assert!(!state.enabled);

    // 回到标准模式后，新块不携带功率
    cutter.buffer_move(short_move()).unwrap();
    cutter.synchronize().unwrap();
    assert_eq!(output.writes(), vec![255, 255, 0]);
}

#[test]
fn test_deactivate_without_clear_zeroes_next_blocks() {
    let output = Arc::new(MockOutput::new());
    let cutter = CutterBuilder::new().build(output.clone()).unwrap();

    cutter.execute(CutterCommand::on(false, true, Some(200.0))).unwrap();
    cutter.buffer_move(short_move()).unwrap();

    let state = cutter.execute(CutterCommand::off(false)).unwrap();
    assert_eq!(state.mode, PowerMode::ContinuousInline);
    assert_eq!(state.hardware_value, 0);

    cutter.buffer_move(short_move()).unwrap();
    cutter.synchronize().unwrap();
    assert_eq!(output.writes(), vec![200, 0]);
}

#[test]
fn test_power_sync_marker() {
    let output = Arc::new(MockOutput::new());
    let config = CutterConfig::default().with_inline_strategy(InlineStrategy::PowerSync);
    let cutter = CutterBuilder::new().config(config).build(output.clone()).unwrap();

    cutter.activate(false, true, Some(200.0)).unwrap();
    cutter.buffer_move(short_move()).unwrap();
    cutter.deactivate(false).unwrap();
    cutter.synchronize().unwrap();

    // 标记块 (200) → 运动块 (不写) → 标记块 (0)
    assert_eq!(output.writes(), vec![200, 0]);
    let metrics = cutter.metrics();
    assert_eq!(metrics.sync_markers_applied, 2);
    assert_eq!(metrics.blocks_executed, 3);
    assert_eq!(metrics.inline_power_writes, 2);
    assert_eq!(metrics.output_errors, 0);
}

#[test]
fn test_dynamic_inline_scales_with_feedrate() {
    let output = Arc::new(MockOutput::new());
    let mut config = CutterConfig::default();
    config.dynamic_feedrate_max = 100.0;
    let cutter = CutterBuilder::new().config(config).build(output.clone()).unwrap();

    cutter.activate(true, true, Some(200.0)).unwrap();
    assert_eq!(cutter.mode(), PowerMode::DynamicInline);

    // 半速：功率减半；恒速块内只写一次
    cutter.buffer_move(MoveRequest::new(Duration::from_millis(5), 50.0)).unwrap();
    cutter.synchronize().unwrap();

    assert_eq!(output.writes(), vec![100]);
    assert_eq!(cutter.metrics().ramp_ticks, 5);
}

#[test]
fn test_binary_output() {
    let output = Arc::new(MockOutput::new());
    let cutter = CutterBuilder::new()
        .config(CutterConfig::binary())
        .build(output.clone())
        .unwrap();

    assert_eq!(cutter.activate(false, false, Some(1.0)).unwrap().hardware_value, 255);
    assert_eq!(cutter.activate(false, false, Some(0.0)).unwrap().hardware_value, 0);
    assert_eq!(output.writes(), vec![255, 0]);
}

#[test]
fn test_stepper_output_failure_does_not_block_sync() {
    let output = Arc::new(MockOutput::new());
    let cutter = CutterBuilder::new().build(output.clone()).unwrap();

    cutter.activate(false, true, Some(50.0)).unwrap();
    output.set_should_fail(true);
    cutter.buffer_move(short_move()).unwrap();
    cutter.synchronize().unwrap();

    assert_eq!(cutter.metrics().output_errors, 1);
    assert!(cutter.planner().is_empty());
}

#[test]
fn test_observer_across_threads() {
    let cutter = CutterBuilder::new()
        .stepper_config(StepperConfig {
            queue_capacity: 4,
            ..Default::default()
        })
        .build(MockOutput::new())
        .unwrap();
    let observer = cutter.observer();

    cutter.activate(false, true, Some(42.0)).unwrap();

    let seen = std::thread::spawn(move || observer.get()).join().unwrap();
    assert_eq!(seen.mode, PowerMode::ContinuousInline);
    assert_eq!(seen.menu_power, 42.0);
}

#[test]
fn test_not_stalled_after_drain() {
    let cutter = CutterBuilder::new().build(MockOutput::new()).unwrap();
    for _ in 0..4 {
        cutter.buffer_move(short_move()).unwrap();
    }
    cutter.synchronize().unwrap();

    assert!(!cutter.is_stalled());
    assert!(cutter.is_stepper_alive());
    assert_eq!(cutter.metrics().blocks_executed, 4);
}

#[test]
fn test_drop_stops_stepper() {
    let output = Arc::new(MockOutput::new());
    let cutter = CutterBuilder::new().build(output.clone()).unwrap();
    cutter.buffer_move(short_move()).unwrap();
    drop(cutter);

    // 步进线程退出后只剩测试持有的引用
    assert_eq!(Arc::strong_count(&output), 1);
}

#[test]
fn test_config_readable_while_command_waits_for_queue() {
    let config = CutterConfig::binary();
    let cutter = CutterBuilder::new().config(config.clone()).build(MockOutput::new()).unwrap();
    cutter.buffer_move(MoveRequest::new(Duration::from_millis(300), 20.0)).unwrap();

    std::thread::scope(|s| {
        // 关闭命令持有控制器锁，等待 300ms 的运动块
        let off = s.spawn(|| cutter.deactivate(false));
        std::thread::sleep(Duration::from_millis(30));

        let start = Instant::now();
        assert_eq!(cutter.config(), &config);
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(!off.is_finished());

        off.join().unwrap().unwrap();
    });
}
