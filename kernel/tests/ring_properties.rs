use kmsg_kernel::dmesg::{Arg, KernelLog, LogConfig, Snapshot};
use kmsg_kernel::time::Ticks;
use kmsg_kernel::LogError;
use proptest::prelude::*;

fn plain_log(capacity: usize, ticks: &Ticks) -> KernelLog<&Ticks> {
    KernelLog::new(LogConfig::new(capacity).without_timestamps(), ticks).unwrap()
}

fn decode(log: &KernelLog<&Ticks>) -> Vec<String> {
    log.snapshot()
        .messages()
        .map(|m| m.expect("decodable").to_string())
        .collect()
}

/// Longest suffix of `history` whose messages, terminators included, fit in `capacity`
fn expected_suffix(history: &[String], capacity: usize) -> Vec<String> {
    let mut used = 0;
    let mut keep = 0;
    for msg in history.iter().rev() {
        if used + msg.len() + 1 > capacity {
            break;
        }
        used += msg.len() + 1;
        keep += 1;
    }
    history[history.len() - keep..].to_vec()
}

/// Every exported ring byte outside a stored message must be NUL.
fn assert_cleared_means_free(log: &KernelLog<&Ticks>) {
    let mut raw = vec![0u8; log.export_len()];
    log.export(&mut raw).unwrap();
    let capacity = log.capacity();
    let snap = Snapshot::from_bytes(&raw, capacity).unwrap();

    let mut occupied = vec![false; capacity];
    for msg in snap.messages() {
        let msg = msg.unwrap();
        for i in 0..=msg.len() {
            occupied[(msg.start() + i) % capacity] = true;
        }
    }
    for (pos, used) in occupied.iter().enumerate() {
        if !used {
            assert_eq!(raw[pos], 0, "free byte {} not cleared", pos);
        }
    }
    assert_eq!(raw[capacity], 0, "spare slot must stay NUL");
}

fn message() -> impl Strategy<Value = String> {
    "[ -~]{1,40}"
}

#[test]
fn test_scenario_second_message_evicts_first() {
    let ticks = Ticks::new();
    let log = plain_log(32, &ticks);
    log.append("AAAA", &[]).unwrap();
    log.append("BBBBBBBBBBBBBBBBBBBBBBBBBBBB", &[]).unwrap();
    assert_eq!(decode(&log), ["BBBBBBBBBBBBBBBBBBBBBBBBBBBB"]);
}

#[test]
fn test_scenario_empty_export_decodes_to_nothing() {
    let ticks = Ticks::new();
    let log = plain_log(32, &ticks);
    let mut raw = vec![0u8; log.export_len()];
    assert_eq!(log.export(&mut raw), Ok(raw.len()));

    let snap = Snapshot::from_bytes(&raw, 32).unwrap();
    assert_eq!(snap.count(), 0);
    assert!(snap.messages().next().is_none());
}

#[test]
fn test_timestamped_round_trip_through_bytes() {
    let ticks = Ticks::new();
    let log = KernelLog::new(LogConfig::new(256), &ticks).unwrap();
    for pid in 1..=3 {
        ticks.tick();
        log.append("spawn pid %d at %p", &[Arg::Int(pid), Arg::Ptr(0x1000)]).unwrap();
    }

    let mut raw = vec![0u8; log.export_len()];
    log.export(&mut raw).unwrap();
    let mut out = String::new();
    Snapshot::from_bytes(&raw, 256).unwrap().render(&mut out).unwrap();

    let ptr = format!("0x{:0width$x}", 0x1000, width = 2 * std::mem::size_of::<usize>());
    let expected: String = (1..=3)
        .map(|pid| format!("[{}] spawn pid {} at {}\n", pid, pid, ptr))
        .collect();
    assert_eq!(out, expected);
}

proptest! {
    #[test]
    fn test_round_trip_when_everything_fits(msgs in prop::collection::vec(message(), 0..20)) {
        let capacity = msgs.iter().map(|m| m.len() + 1).sum::<usize>().max(2);
        let ticks = Ticks::new();
        let log = plain_log(capacity, &ticks);
        for m in &msgs {
            log.append("%s", &[Arg::from(m.as_str())]).unwrap();
        }
        prop_assert_eq!(decode(&log), msgs);
    }

    #[test]
    fn test_eviction_keeps_longest_fitting_suffix(
        capacity in 41usize..200,
        msgs in prop::collection::vec(message(), 1..60),
    ) {
        let ticks = Ticks::new();
        let log = plain_log(capacity, &ticks);
        for (i, m) in msgs.iter().enumerate() {
            log.append("%s", &[Arg::from(m.as_str())]).unwrap();

            let stored = decode(&log);
            prop_assert_eq!(&stored, &expected_suffix(&msgs[..=i], capacity));
            prop_assert_eq!(stored.len(), log.len());
            let used: usize = stored.iter().map(|s| s.len() + 1).sum();
            prop_assert!(used <= capacity);
        }
        assert_cleared_means_free(&log);
    }

    #[test]
    fn test_oversized_never_written(
        capacity in 8usize..64,
        prefix in prop::collection::vec(message(), 0..10),
        extra in 0usize..16,
    ) {
        let ticks = Ticks::new();
        let log = plain_log(capacity, &ticks);
        for m in &prefix {
            let _ = log.append("%s", &[Arg::from(m.as_str())]);
        }
        let before = log.snapshot();

        let big = "x".repeat(capacity + extra);
        let err = log.append("%s", &[Arg::from(big.as_str())]).unwrap_err();
        prop_assert_eq!(err, LogError::Oversized { len: capacity + extra + 1, capacity });
        prop_assert_eq!(log.snapshot(), before);
        prop_assert!(!log.is_poisoned());
    }
}
