//! Host-side "Hello Node" example
//!
//! This example drives a node from a desktop loop:
//! - A std-backed tick source (Instant as the microsecond timer)
//! - A toy engine that joins, then completes every transmission and
//!   answers every third one with a downlink on port 2
//! - Handlers for join, transmit complete and downlink
//!
//! The node sends "Hello, node! #<counter>" once a second, ten times.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::time::Instant;

use simple_lorawan::{
    config::hal::ms_to_ticks,
    hal::{FoldTicker, Hal, InterruptMask, MicrosTimer, TickSource},
    mac::{DataRate, EventCode, EventKind, FrameView, MacEngine, TxRxFlags},
    node::{Node, Registry},
};

thread_local! {
    static JOINED: Cell<bool> = Cell::new(false);
}

/// Single-threaded host: nothing to mask
///
/// Not `Sync`, so the tick source stays on the main thread.
struct NoMask(PhantomData<*const ()>);

// SAFETY: `NoMask` is not `Sync`.
unsafe impl InterruptMask for NoMask {
    fn disable(&self) {}
    fn enable(&self) {}
}

struct StdTimer {
    origin: Instant,
}

impl MicrosTimer for StdTimer {
    fn start(&mut self) {
        self.origin = Instant::now();
    }

    fn read_us(&self) -> u32 {
        self.origin.elapsed().as_micros() as u32
    }

    fn reset(&mut self) {
        self.origin = Instant::now();
    }
}

/// Fold-back period, folded by the main loop instead of an interrupt
#[derive(Default)]
struct LoopTicker {
    period_us: u32,
}

impl FoldTicker for LoopTicker {
    fn attach_us(&mut self, period_us: u32) {
        self.period_us = period_us;
    }
}

#[derive(Default)]
struct ToyEngine {
    joined: bool,
    sent: u32,
    in_flight: bool,
    data_rate: Option<DataRate>,
    link_check: bool,
    flags: TxRxFlags,
    frame: Vec<u8>,
    data_beg: usize,
    data_len: usize,
}

impl MacEngine for ToyEngine {
    type Error = ();

    fn reset(&mut self) {
        *self = Self::default();
        self.link_check = true;
    }

    fn transmit(&mut self, _port: u8, _payload: &[u8], _confirmed: bool) -> Result<(), ()> {
        if self.in_flight {
            return Err(());
        }
        self.in_flight = true;
        Ok(())
    }

    fn set_data_rate(&mut self, data_rate: DataRate, _tx_power: i8) {
        self.data_rate = Some(data_rate);
    }

    fn data_rate(&self) -> DataRate {
        self.data_rate.unwrap_or(DataRate::SF12)
    }

    fn set_link_check(&mut self, enabled: bool) {
        self.link_check = enabled;
    }

    fn link_check_enabled(&self) -> bool {
        self.link_check
    }

    fn run_once(&mut self, emit: &mut dyn FnMut(EventCode, FrameView<'_>)) {
        if !self.joined {
            self.joined = true;
            emit(EventKind::Joining.into(), self.frame());
            emit(EventKind::Joined.into(), self.frame());
            return;
        }
        if !self.in_flight {
            return;
        }

        self.in_flight = false;
        self.sent += 1;
        if self.sent % 3 == 0 {
            // MHDR + FHDR, port, payload
            self.frame = vec![0x60, 0, 0, 0, 0, 0, 0, 0, 2, b'o', b'k'];
            self.data_beg = 9;
            self.data_len = 2;
            self.flags = TxRxFlags(TxRxFlags::PORT | TxRxFlags::DNW1);
        } else {
            self.data_len = 0;
            self.flags = TxRxFlags(TxRxFlags::NOPORT);
        }
        emit(EventKind::TxComplete.into(), self.frame());

        // The buffer is reused for the next uplink once the event is out.
        self.data_len = 0;
        self.flags = TxRxFlags(0);
    }

    fn duty_cycle_wait(&self) -> u32 {
        0
    }

    fn frame(&self) -> FrameView<'_> {
        FrameView {
            flags: self.flags,
            frame: &self.frame,
            data_beg: self.data_beg,
            data_len: self.data_len,
        }
    }
}

fn main() {
    let hal = TickSource::new(
        NoMask(PhantomData),
        StdTimer {
            origin: Instant::now(),
        },
    );
    let mut ticker = LoopTicker::default();
    hal.init(&mut ticker);

    let engine = RefCell::new(ToyEngine::default());
    let registry: Registry<1> = Registry::new();
    let node = match Node::new(&engine, &registry) {
        Ok(node) => node,
        Err(e) => {
            println!("Node creation failed: {:?}", e);
            return;
        }
    };

    node.set_joined_handler(|| {
        println!("Joined");
        JOINED.with(|joined| joined.set(true));
    });
    node.set_tx_complete_handler(|| println!("Transmit complete"));
    node.set_receive_handler(|port, payload| {
        println!("Downlink on port {}: {:?}", port, payload);
    });

    let mut counter = 0u32;
    let mut next_send = hal.ticks();
    let mut next_fold = hal.ticks().wrapping_add(ms_to_ticks(ticker.period_us / 1000));

    while counter < 10 {
        if let Err(e) = node.process() {
            println!("Process error: {:?}", e);
            return;
        }

        if JOINED.with(|joined| joined.get()) && hal.check_timer_due(next_send) {
            let message = format!("Hello, node! #{}", counter);
            match node.send(message.as_bytes()) {
                Ok(()) => println!("Sent {}", message),
                Err(e) => println!("Send error: {:?}", e),
            }
            counter += 1;
            next_send = next_send.wrapping_add(ms_to_ticks(1000));
        }

        if hal.check_timer_due(next_fold) {
            hal.fold();
            next_fold = hal.ticks().wrapping_add(ms_to_ticks(ticker.period_us / 1000));
        }

        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    node.process().ok();
}
