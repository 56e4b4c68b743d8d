//! 运动块功率顺序测试
//!
//! 已入队的块在执行时使用入队时刻的功率快照，之后的修改不影响它们。

use cutter_driver::{
    BlockFlags, InlinePower, MotionQueue, MoveRequest, PendingPower, Stepper, StepperConfig,
    StepperMetrics, planner_channel,
};
use cutter_hal::MockOutput;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn instant_move() -> MoveRequest {
    MoveRequest::new(Duration::ZERO, 10.0)
}

fn manual_stepper(
    capacity: usize,
) -> (
    cutter_driver::PlannerQueue,
    Stepper<MockOutput>,
    Arc<MockOutput>,
    Arc<PendingPower>,
) {
    let (queue, receiver) = planner_channel(capacity, Duration::from_millis(500));
    let output = Arc::new(MockOutput::new());
    let pending = Arc::new(PendingPower::default());
    let stepper = Stepper::new(
        receiver,
        output.clone(),
        pending.clone(),
        Arc::new(StepperMetrics::new()),
        &StepperConfig::default(),
        50.0,
    );
    (queue, stepper, output, pending)
}

#[test]
fn test_later_power_does_not_alter_queued_block() {
    let (queue, stepper, output, _) = manual_stepper(8);

    queue.set_next_block_power(Some(InlinePower::constant(100)));
    queue.buffer_move(instant_move()).unwrap();

    // B1 已入队，之后再改下一块功率
    queue.set_next_block_power(Some(InlinePower::constant(7)));
    queue.buffer_move(instant_move()).unwrap();

    while stepper.poll() {}
    assert_eq!(output.writes(), vec![100, 7]);
}

#[test]
fn test_pending_slot_latest_value_wins() {
    let (queue, stepper, output, pending) = manual_stepper(8);

    // 两次交付都在步进线程到达标记块之前：单插槽，后写覆盖先写
    pending.store(10);
    queue.enqueue_sync_marker(BlockFlags::SYNC_POWER).unwrap();
    pending.store(20);
    queue.enqueue_sync_marker(BlockFlags::SYNC_POWER).unwrap();

    while stepper.poll() {}
    assert_eq!(output.writes(), vec![20, 20]);
}

#[test]
fn test_marker_applies_only_when_reached() {
    let (queue, stepper, output, pending) = manual_stepper(8);

    queue.buffer_move(instant_move()).unwrap();
    pending.store(99);
    queue.enqueue_sync_marker(BlockFlags::SYNC_POWER).unwrap();

    // 第一个块不携带功率
    assert!(stepper.poll());
    assert!(output.writes().is_empty());

    assert!(stepper.poll());
    assert_eq!(output.writes(), vec![99]);
}

#[derive(Debug, Clone)]
enum Op {
    Produce,
    Set(u8),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Produce),
        2 => any::<u8>().prop_map(Op::Set),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    /// 每个块执行时的功率等于它入队时刻的“下一块功率”
    #[test]
    fn prop_block_power_is_snapshot_at_production(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let (queue, stepper, output, _) = manual_stepper(128);

        let mut current = None;
        let mut expected = Vec::new();
        for op in ops {
            match op {
                Op::Produce => {
                    queue.buffer_move(instant_move()).unwrap();
                    if let Some(value) = current {
                        expected.push(value);
                    }
                },
                Op::Set(value) => {
                    current = Some(value);
                    queue.set_next_block_power(Some(InlinePower::constant(value)));
                },
                Op::Clear => {
                    current = None;
                    queue.set_next_block_power(None);
                },
            }
        }

        while stepper.poll() {}
        prop_assert_eq!(output.writes(), expected);
        prop_assert!(queue.is_empty());
    }
}
