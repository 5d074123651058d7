use std::thread;

use kmsg_kernel::dmesg::{Arg, KernelLog, LogConfig};
use kmsg_kernel::time::Ticks;

const THREADS: usize = 4;
const PER_THREAD: i64 = 250;

static TICKS: Ticks = Ticks::new();

#[test]
fn test_concurrent_appends_never_interleave() {
    let log: KernelLog = KernelLog::new(LogConfig::new(64 * 1024), &TICKS).unwrap();

    thread::scope(|s| {
        for t in 0..THREADS {
            let log = &log;
            s.spawn(move || {
                let name = format!("task{}", t);
                for i in 0..PER_THREAD {
                    TICKS.tick();
                    log.append("%s seq %d", &[Arg::from(name.as_str()), Arg::Int(i)])
                        .unwrap();
                }
            });
        }
    });

    let snap = log.snapshot();
    let mut next = [0i64; THREADS];
    let mut last_tick = 0u64;
    let mut total = 0;

    for msg in snap.messages() {
        let line = msg.unwrap().to_string();
        // "[tick] taskN seq I"
        let (tick, body) = line
            .strip_prefix('[')
            .and_then(|l| l.split_once("] "))
            .unwrap_or_else(|| panic!("malformed line {:?}", line));
        let tick: u64 = tick.parse().unwrap();
        let (task, seq) = body
            .strip_prefix("task")
            .and_then(|b| b.split_once(" seq "))
            .unwrap_or_else(|| panic!("malformed body {:?}", body));
        let task: usize = task.parse().unwrap();
        let seq: i64 = seq.parse().unwrap();

        assert_eq!(seq, next[task], "task {} out of order", task);
        next[task] += 1;
        // ticks are read under the lock, so they never go backwards
        assert!(tick >= last_tick);
        last_tick = tick;
        total += 1;
    }

    assert_eq!(total, THREADS * PER_THREAD as usize);
    assert_eq!(next, [PER_THREAD; THREADS]);
}

#[test]
fn test_export_during_appends_sees_whole_messages() {
    let ticks = Ticks::new();
    let log = KernelLog::new(LogConfig::new(512).without_timestamps(), &ticks).unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..2000 {
                log.append("message number %d", &[Arg::Int(i)]).unwrap();
            }
        });
        s.spawn(|| {
            let mut raw = vec![0u8; log.export_len()];
            for _ in 0..200 {
                log.export(&mut raw).unwrap();
                let snap = kmsg_kernel::Snapshot::from_bytes(&raw, 512).unwrap();
                let mut prev: Option<i64> = None;
                for msg in snap.messages() {
                    let line = msg.unwrap().to_string();
                    let n: i64 = line
                        .strip_prefix("message number ")
                        .unwrap_or_else(|| panic!("torn message {:?}", line))
                        .parse()
                        .unwrap();
                    if let Some(p) = prev {
                        assert_eq!(n, p + 1);
                    }
                    prev = Some(n);
                }
            }
        });
    });
}
