//! Property-based tests for the output port pipeline

use portflow::framework::PostQueue;
use portflow::{BufferChunk, DType, Label, OutputPort, TypedValue};
use proptest::prelude::*;

fn dtype_strategy() -> impl Strategy<Value = DType> {
    prop_oneof![
        Just(DType::U8),
        Just(DType::I16),
        Just(DType::F32),
        Just(DType::F64),
        Just(DType::Complex64),
        (1usize..24).prop_map(DType::Raw),
    ]
}

proptest! {
    #[test]
    fn test_posted_buffers_fifo_and_totals(
        dtype in dtype_strategy(),
        sizes in prop::collection::vec(0usize..512, 0..64),
    ) {
        let mut port = OutputPort::new(0, "out", dtype);
        for &n in &sizes {
            port.post_buffer(BufferChunk::alloc(dtype, n));
        }

        // Property: totals match what was posted, one activity per post
        prop_assert_eq!(port.total_buffers(), sizes.len() as u64);
        prop_assert_eq!(port.total_elements(), sizes.iter().sum::<usize>() as u64);
        prop_assert_eq!(port.activity(), sizes.len() as u64);

        // Property: buffers come out in posting order
        let drained: Vec<usize> = port.drain_buffers().iter().map(|c| c.elements()).collect();
        prop_assert_eq!(drained, sizes);
    }

    #[test]
    fn test_reserve_bumps_activity_only_on_increase(
        reserves in prop::collection::vec(0usize..100, 0..50)
    ) {
        let mut port = OutputPort::new(0, "out", DType::F32);
        let mut previous = port.reserve_elements();
        let mut expected = 0u64;
        for &n in &reserves {
            if n > previous {
                expected += 1;
            }
            previous = n;
            port.set_reserve(n);
        }
        prop_assert_eq!(port.activity(), expected);
        prop_assert_eq!(port.reserve_elements(), previous);
    }

    #[test]
    fn test_byte_labels_land_on_element_index(
        dtype in dtype_strategy(),
        element in 0u64..10_000,
        offset in 0usize..64,
    ) {
        let size = dtype.size();
        let byte = element * size as u64 + (offset % size) as u64;

        let mut port = OutputPort::new(0, "out", dtype);
        port.post_label(Label::at_byte("tag", TypedValue::null(), byte));

        let label = port.drain_labels().pop().unwrap();
        prop_assert_eq!(label.index, element);
        prop_assert!(label.width >= 1);
    }

    #[test]
    fn test_queue_capacity_is_power_of_two_growth(
        initial in 1usize..16,
        pushes in 0usize..300,
    ) {
        let mut queue = PostQueue::with_capacity(initial);
        for i in 0..pushes {
            queue.push(i);
        }

        // Property: capacity covers the contents and only ever doubled
        prop_assert!(queue.capacity() >= queue.len());
        prop_assert_eq!(queue.capacity() % initial, 0);
        prop_assert!((queue.capacity() / initial).is_power_of_two());
        prop_assert_eq!(queue.drain(), (0..pushes).collect::<Vec<_>>());
    }
}
