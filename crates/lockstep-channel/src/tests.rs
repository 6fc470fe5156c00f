//! Tests for the rendezvous channel.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::Channel;

// ── Handoff semantics ─────────────────────────────────────────────────────────

mod handoff_tests {
    use super::*;

    #[test]
    fn get_returns_the_put_value() {
        let chan = Channel::new();
        let sender = {
            let chan = chan.clone();
            thread::spawn(move || chan.put(42_u64))
        };
        assert_eq!(chan.get(), 42);
        sender.join().unwrap();
    }

    #[test]
    fn put_blocks_until_a_getter_registers() {
        let chan = Channel::new();
        let put_done = Arc::new(AtomicBool::new(false));

        let sender = {
            let chan = chan.clone();
            let put_done = Arc::clone(&put_done);
            thread::spawn(move || {
                chan.put("hello");
                put_done.store(true, Ordering::SeqCst);
            })
        };

        // Give the putter ample time to (incorrectly) complete early.
        thread::sleep(Duration::from_millis(100));
        assert!(
            !put_done.load(Ordering::SeqCst),
            "put must not return before a get is registered"
        );

        let get_started = Instant::now();
        assert_eq!(chan.get(), "hello");
        sender.join().unwrap();
        assert!(put_done.load(Ordering::SeqCst));
        // Sanity: the get did not itself block for long once the value was there.
        assert!(get_started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn no_buffering_extra_put_stays_blocked() {
        // Three puts, two gets: exactly one putter must remain parked.
        let chan = Channel::new();
        let completed = Arc::new(AtomicUsize::new(0));

        let senders: Vec<_> = (0..3)
            .map(|i| {
                let chan = chan.clone();
                let completed = Arc::clone(&completed);
                thread::spawn(move || {
                    chan.put(i);
                    completed.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        let mut got = vec![chan.get(), chan.get()];
        got.sort_unstable();

        // Timeout-based non-completion check: the third put never finishes.
        thread::sleep(Duration::from_millis(200));
        assert_eq!(completed.load(Ordering::SeqCst), 2);

        // Unblock the straggler so the test can join all threads.
        got.push(chan.get());
        got.sort_unstable();
        assert_eq!(got, vec![0, 1, 2]);
        for s in senders {
            s.join().unwrap();
        }
        assert_eq!(completed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn multiple_getters_matched_in_fifo_order() {
        let chan = Channel::new();

        // Register two getters, in a known order, before any put happens.
        let first = {
            let chan = chan.clone();
            thread::spawn(move || chan.get())
        };
        thread::sleep(Duration::from_millis(50));
        let second = {
            let chan = chan.clone();
            thread::spawn(move || chan.get())
        };
        thread::sleep(Duration::from_millis(50));

        chan.put(1);
        chan.put(2);
        assert_eq!(first.join().unwrap(), 1);
        assert_eq!(second.join().unwrap(), 2);
    }
}

// ── Lock-step alternation ─────────────────────────────────────────────────────

mod lockstep_tests {
    use super::*;

    /// Two threads ping-pong a counter through a channel pair.  Each thread
    /// marks itself "active" while computing and "blocked" around channel
    /// calls; at no sampled instant may both be active at once.
    #[test]
    fn ping_pong_threads_are_never_simultaneously_active() {
        let ping: Channel<u32> = Channel::new();
        let pong: Channel<u32> = Channel::new();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        fn enter(active: &AtomicUsize, max_active: &AtomicUsize) {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            max_active.fetch_max(now, Ordering::SeqCst);
        }
        fn exit(active: &AtomicUsize) {
            active.fetch_sub(1, Ordering::SeqCst);
        }

        let responder = {
            let (ping, pong) = (ping.clone(), pong.clone());
            let (active, max_active) = (Arc::clone(&active), Arc::clone(&max_active));
            thread::spawn(move || {
                for _ in 0..100 {
                    let v = ping.get();
                    enter(&active, &max_active);
                    let reply = v + 1;
                    exit(&active);
                    pong.put(reply);
                }
            })
        };

        let mut v = 0;
        for _ in 0..100 {
            enter(&active, &max_active);
            // Caller-side "compute an action" stand-in.
            v += 1;
            exit(&active);
            ping.put(v);
            v = pong.get();
        }
        responder.join().unwrap();

        assert_eq!(v, 200);
        assert_eq!(
            max_active.load(Ordering::SeqCst),
            1,
            "both parties were computing at the same instant"
        );
    }
}

// ── Close contract ────────────────────────────────────────────────────────────

mod close_tests {
    use super::*;

    #[test]
    fn close_marks_the_channel_closed() {
        let chan: Channel<()> = Channel::new();
        assert!(!chan.is_closed());
        chan.close();
        assert!(chan.is_closed());
    }

    #[test]
    #[should_panic(expected = "closed twice")]
    fn double_close_panics() {
        let chan: Channel<()> = Channel::new();
        chan.close();
        chan.close();
    }

    #[test]
    #[should_panic(expected = "get on a closed rendezvous channel")]
    fn get_after_close_panics() {
        let chan: Channel<u8> = Channel::new();
        chan.close();
        let _ = chan.get();
    }

    #[test]
    #[should_panic(expected = "put on a closed rendezvous channel")]
    fn put_after_close_panics() {
        let chan: Channel<u8> = Channel::new();
        chan.close();
        chan.put(7);
    }

    #[test]
    fn clones_share_the_closed_flag() {
        let chan: Channel<u8> = Channel::new();
        let other = chan.clone();
        chan.close();
        assert!(other.is_closed());
    }
}
